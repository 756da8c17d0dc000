use image::RgbImage;

use crate::{utils::time_label::effective_fps, Error, FrameError};

/// Frames of a video in decode order, starting from frame 0. A frame that cannot be decoded is
/// yielded as an error and the iterator continues with the next frame.
pub type FrameIter<'a> = Box<dyn Iterator<Item = Result<RgbImage, FrameError>> + 'a>;

/// A decodable video: the input to every analysis.
///
/// The engines read frames either sequentially (via [`FrameSource::frames`]) or by index (via
/// [`FrameSource::read_frame_at`]). A source is used by one analysis at a time; run independent
/// analyses on independent sources.
pub trait FrameSource {
    /// The number of frames the video reports. This may be an estimate.
    fn frame_count(&self) -> u64;

    /// The frame rate the video reports. This may be zero or nonsense for broken files.
    fn frame_rate(&self) -> f64;

    /// The frame rate to use for timestamps.
    fn fps(&self) -> f64 {
        effective_fps(self.frame_rate())
    }

    fn read_frame_at(&mut self, index: u64) -> Result<RgbImage, FrameError>;

    fn frames(&mut self) -> Result<FrameIter<'_>, Error>;
}

/// An in-memory video. Missing frames (`None`) behave like frames that fail to decode.
///
/// ```
/// use image::{Rgb, RgbImage};
/// use vid_loop_finder_lib::{FrameSource, FrameVec};
///
/// let frames = vec![RgbImage::from_pixel(8, 8, Rgb([0, 0, 0])); 3];
/// let mut video = FrameVec::new(frames, 25.0);
/// assert_eq!(video.frame_count(), 3);
/// assert!(video.read_frame_at(3).is_err());
/// ```
#[derive(Debug, Clone, Default)]
pub struct FrameVec {
    frames: Vec<Option<RgbImage>>,
    frame_rate: f64,
}

impl FrameVec {
    pub fn new(frames: Vec<RgbImage>, frame_rate: f64) -> Self {
        Self {
            frames: frames.into_iter().map(Some).collect(),
            frame_rate,
        }
    }

    pub fn with_gaps(frames: Vec<Option<RgbImage>>, frame_rate: f64) -> Self {
        Self { frames, frame_rate }
    }
}

impl FrameSource for FrameVec {
    fn frame_count(&self) -> u64 {
        self.frames.len() as u64
    }

    fn frame_rate(&self) -> f64 {
        self.frame_rate
    }

    fn read_frame_at(&mut self, index: u64) -> Result<RgbImage, FrameError> {
        match self.frames.get(index as usize) {
            Some(Some(frame)) => Ok(frame.clone()),
            Some(None) => Err(FrameError::Decode {
                index,
                reason: "frame is missing".to_string(),
            }),
            None => Err(FrameError::OutOfRange { index }),
        }
    }

    fn frames(&mut self) -> Result<FrameIter<'_>, Error> {
        let iter = self.frames.iter().enumerate().map(|(index, frame)| {
            frame.clone().ok_or_else(|| FrameError::Decode {
                index: index as u64,
                reason: "frame is missing".to_string(),
            })
        });
        Ok(Box::new(iter))
    }
}

#[cfg(test)]
mod test {
    use image::Rgb;

    use super::*;

    #[test]
    fn test_gaps_are_errors() {
        let frame = RgbImage::from_pixel(4, 4, Rgb([1, 1, 1]));
        let mut video = FrameVec::with_gaps(vec![Some(frame.clone()), None, Some(frame)], 0.0);

        assert_eq!(video.fps(), crate::definitions::DEFAULT_FPS);
        assert!(video.read_frame_at(0).is_ok());
        assert_eq!(video.read_frame_at(1).unwrap_err().index(), 1);
        assert_eq!(video.read_frame_at(9), Err(FrameError::OutOfRange { index: 9 }));

        let results = video.frames().unwrap().map(|f| f.is_ok()).collect::<Vec<_>>();
        assert_eq!(results, vec![true, false, true]);
    }
}
