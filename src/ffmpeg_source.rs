use std::path::{Path, PathBuf};

use ffmpeg_cmdline_utils::{FfmpegError, FfmpegFrameIter, FfmpegFrameReaderBuilder, VideoInfo};
use image::RgbImage;
use log::debug;

use crate::{
    definitions::{FRAME_READ_TIMEOUT_SECS, MAX_FORWARD_DECODE_FRAMES},
    Error, FrameError, FrameIter, FrameSource,
};

/// A video file decoded by the `ffmpeg` command line tool.
///
/// Each source owns its own ffmpeg processes, so independent analyses of the same file should
/// each open their own source. A decoder that produces no frame for 30 seconds is treated as
/// the end of the video.
#[derive(Debug)]
pub struct FfmpegFrameSource {
    path: PathBuf,
    info: VideoInfo,
    cursor: Option<Cursor>,
}

//An open decoder positioned just before frame `next_index`.
#[derive(Debug)]
struct Cursor {
    frames: FfmpegFrameIter,
    next_index: u64,
}

impl FfmpegFrameSource {
    /// Probe the file at `path` with ffprobe. Fails with [`Error::SourceUnavailable`] if it is
    /// not a readable video.
    pub fn open(path: impl AsRef<Path>) -> Result<Self, Error> {
        let path = path.as_ref();
        let unavailable = |reason: String| Error::SourceUnavailable(format!("{}: {reason}", path.display()));

        match ffmpeg_cmdline_utils::is_video_file(path) {
            Ok(true) => (),
            Ok(false) => return Err(unavailable("no video stream found".to_string())),
            Err(e) => return Err(unavailable(e.to_string())),
        }

        let info = VideoInfo::new(path).map_err(|e| unavailable(e.to_string()))?;
        let (x, y) = info.resolution();
        if x == 0 || y == 0 {
            return Err(unavailable(FfmpegError::InvalidResolution.to_string()));
        }

        debug!(
            target: "frame_scan",
            "Opened {}: {}x{}, {} frames at {:.3} fps",
            path.display(),
            x,
            y,
            info.frame_count(),
            info.frame_rate()
        );

        Ok(Self {
            path: path.to_path_buf(),
            info,
            cursor: None,
        })
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    pub fn info(&self) -> &VideoInfo {
        &self.info
    }

    fn spawn_at(&self, start_index: u64) -> Result<FfmpegFrameIter, FfmpegError> {
        let mut builder = FfmpegFrameReaderBuilder::new(&self.path);
        builder.video_info(self.info.clone()).timeout_secs(FRAME_READ_TIMEOUT_SECS);
        if start_index > 0 {
            builder.start_secs(start_index as f64 / self.fps());
        }
        builder.spawn_rgb().map(|(frames, _info)| frames)
    }

    fn cursor_can_reach(&self, index: u64) -> bool {
        match &self.cursor {
            Some(cursor) => index >= cursor.next_index && index - cursor.next_index <= MAX_FORWARD_DECODE_FRAMES,
            None => false,
        }
    }
}

impl FrameSource for FfmpegFrameSource {
    fn frame_count(&self) -> u64 {
        self.info.frame_count()
    }

    fn frame_rate(&self) -> f64 {
        self.info.frame_rate()
    }

    fn read_frame_at(&mut self, index: u64) -> Result<RgbImage, FrameError> {
        if !self.cursor_can_reach(index) {
            debug!(target: "frame_scan", "Seeking {} to frame {index}", self.path.display());
            let frames = self.spawn_at(index).map_err(|e| FrameError::Decode {
                index,
                reason: e.to_string(),
            })?;
            self.cursor = Some(Cursor {
                frames,
                next_index: index,
            });
        }

        let frame_count = self.frame_count();
        let Some(cursor) = self.cursor.as_mut() else {
            return Err(FrameError::OutOfRange { index });
        };

        //decode and discard frames up to the requested one.
        while cursor.next_index <= index {
            match cursor.frames.next() {
                Some(frame) if cursor.next_index == index => {
                    cursor.next_index += 1;
                    return Ok(frame);
                }
                Some(_) => cursor.next_index += 1,
                None => break,
            }
        }

        self.cursor = None;
        if index >= frame_count {
            Err(FrameError::OutOfRange { index })
        } else {
            Err(FrameError::Decode {
                index,
                reason: "ffmpeg produced no frame".to_string(),
            })
        }
    }

    fn frames(&mut self) -> Result<FrameIter<'_>, Error> {
        let frames = self
            .spawn_at(0)
            .map_err(|e| Error::SourceUnavailable(format!("{}: {e}", self.path.display())))?;
        Ok(Box::new(frames.map(Ok)))
    }
}

#[cfg(test)]
mod test {
    use super::*;

    #[test]
    fn test_missing_file_is_unavailable() {
        let result = FfmpegFrameSource::open("/this/file/does/not/exist.mp4");
        assert!(matches!(result, Err(Error::SourceUnavailable(_))));
    }
}
