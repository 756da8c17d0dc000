use std::{path::Path, time::Duration};

use serde::{Deserialize, Serialize};
use serde_json::Value;
use thiserror::Error;

use crate::*;

#[derive(Debug, Deserialize, Serialize, Clone, PartialEq, Eq, Error)]
pub enum VideoInfoError {
    #[error("Error parsing stats: {0}")]
    JsonError(String),
    #[error("Error parsing stats: {0}")]
    ParseIntError(String),
    #[error("Error parsing stats: {0}")]
    ParseFloatError(String),
    #[error("Unexpected rotation: {0}")]
    InvalidRotation(String),
}

impl From<serde_json::Error> for VideoInfoError {
    fn from(e: serde_json::Error) -> Self {
        //limit maximum number of characters
        let error_string = format!("{e}").chars().take(500).collect::<String>();
        VideoInfoError::JsonError(error_string)
    }
}

impl From<std::num::ParseIntError> for VideoInfoError {
    fn from(e: std::num::ParseIntError) -> Self {
        VideoInfoError::ParseIntError(format!("{e}"))
    }
}

impl From<std::num::ParseFloatError> for VideoInfoError {
    fn from(e: std::num::ParseFloatError) -> Self {
        VideoInfoError::ParseFloatError(format!("{e}"))
    }
}

// There is a slighty gotcha in ffmpeg where if the video metadata declares a rotation,
// raw (x, y) resolution in that metadata refers to the "unrotated" resolution. we must
// therefore swap the x and y values if the rotation is 90 or 270
#[derive(PartialEq, Eq, Clone, Debug, Copy, Default)]
enum FfmpegVideoRotation {
    #[default]
    Rot0,
    Rot90,
    Rot180,
    Rot270,
}
use FfmpegVideoRotation::*;

/// Some of the video metadata that can be obtained by using ffprobe.
#[derive(PartialEq, Clone, Debug, Serialize, Deserialize, Default)]
pub struct VideoInfo {
    duration: Duration,
    file_size: u64,
    resolution: (u32, u32),
    frame_rate: f64,
    frame_count: u64,
}

impl VideoInfo {
    /// Use ffprobe to get the duration, resolution, frame rate and frame count of a video. If the video
    /// contains multiple streams then only information about the first video stream will be returned.
    ///
    /// # errors
    /// * The file cannot be read or is not recognized as a video by ffprobe
    /// * The output from ffprobe could not be parsed as JSON
    /// * The output from ffprobe contained malformed fields.
    pub fn new<P>(src_path: P) -> Result<Self, FfmpegError>
    where
        P: AsRef<Path>,
    {
        let stats_string = get_video_stats(&src_path)?;
        Ok(Self::from_ffprobe_json(&stats_string)?)
    }

    /// Parse the output of `ffprobe -show_format -show_streams -print_format json`.
    pub fn from_ffprobe_json(stats_string: &str) -> Result<Self, VideoInfoError> {
        let stats_parsed: Value = serde_json::from_str(stats_string)?;

        let duration = if let Value::String(d) = &stats_parsed["format"]["duration"] {
            Duration::try_from_secs_f64(d.parse::<f64>()?).unwrap_or_default()
        } else {
            Duration::ZERO
        };

        let file_size = if let Value::String(s) = &stats_parsed["format"]["size"] {
            s.parse()?
        } else {
            0
        };

        let first_video = Self::first_video(&stats_parsed);

        // If the video metadata declares that a video is rotated, then FFMPEG will conveniently autorotate
        // each frame for us, however we will have to remember to swap around x and y axis if the rotation is
        // 90 or 270
        let rotation = {
            //extract the rotation from the JSON
            let rotation = first_video.and_then(|video_stream| {
                video_stream
                    .get("side_data_list")
                    .and_then(|y| y.get(0).and_then(|x| x.get("rotation").cloned()))
            });

            //if the rotation is found, it may either be a JSON String or JSON number, so unify
            //them here.
            let rotation = match rotation {
                None => None,
                Some(Value::Number(val)) => val.as_i64(),
                Some(Value::String(val)) => Some(val.trim().parse::<i64>()?),
                Some(other) => return Err(VideoInfoError::InvalidRotation(other.to_string())),
            };

            //now make sure that the value is one of the four cardinal directions and return it
            //(or if no rotation is specified, return 0/360)
            match rotation {
                None | Some(0) => Rot0,
                Some(90) | Some(-270) => Rot90,
                Some(180) | Some(-180) => Rot180,
                Some(-90) | Some(270) => Rot270,
                Some(other) => return Err(VideoInfoError::InvalidRotation(other.to_string())),
            }
        };

        let resolution = {
            let first_width = first_video.and_then(|v| Self::u32_field(v, "width")).unwrap_or(0);
            let first_height = first_video.and_then(|v| Self::u32_field(v, "height")).unwrap_or(0);

            if matches!(rotation, Rot0 | Rot180) {
                (first_width, first_height)
            } else {
                (first_height, first_width)
            }
        };

        //avg_frame_rate is the true rate for variable frame rate videos. It is "0/0" for some
        //containers, in which case fall back to r_frame_rate.
        let frame_rate = ["avg_frame_rate", "r_frame_rate"]
            .iter()
            .filter_map(|field| first_video.and_then(|v| v[*field].as_str()))
            .map(parse_frame_rate)
            .find(|fps| *fps > 0.0)
            .unwrap_or(0.0);

        let frame_count = match first_video.and_then(|v| v["nb_frames"].as_str()) {
            Some(nb_frames) => nb_frames.trim().parse()?,
            None => (duration.as_secs_f64() * frame_rate).round() as u64,
        };

        Ok(VideoInfo {
            duration,
            file_size,
            resolution,
            frame_rate,
            frame_count,
        })
    }

    /// The duration of the video in seconds
    pub fn duration(&self) -> Duration {
        self.duration
    }

    /// The size of the video in bytes
    pub fn file_size(&self) -> u64 {
        self.file_size
    }

    /// The resolution of the video in pixels.
    /// Note the returned value is correct for the orientation that the video is intended
    /// to be viewed. (Ffprobe returns a surprising value by default if the video is stored rotated)
    pub fn resolution(&self) -> (u32, u32) {
        self.resolution
    }

    /// Frames per second, or 0 if ffprobe does not know.
    pub fn frame_rate(&self) -> f64 {
        self.frame_rate
    }

    /// The number of frames in the video. Taken from the container if it records it, otherwise
    /// estimated from the duration and frame rate.
    pub fn frame_count(&self) -> u64 {
        self.frame_count
    }

    fn first_video(stats_parsed: &Value) -> Option<&Value> {
        match &stats_parsed["streams"] {
            Value::Array(streams) => streams.iter().find(|s| s["codec_type"].as_str() == Some("video")),
            _ => None,
        }
    }

    fn u32_field(stream: &Value, field_name: &str) -> Option<u32> {
        stream[field_name].as_u64().and_then(|v| u32::try_from(v).ok())
    }
}

// ffprobe reports frame rates as fractions, e.g. "30000/1001". A zero denominator means unknown.
fn parse_frame_rate(rate: &str) -> f64 {
    let parsed = match rate.split_once('/') {
        Some((num, den)) => match (num.trim().parse::<f64>(), den.trim().parse::<f64>()) {
            (Ok(num), Ok(den)) if den != 0.0 => num / den,
            _ => 0.0,
        },
        None => rate.trim().parse::<f64>().unwrap_or(0.0),
    };

    if parsed.is_finite() {
        parsed
    } else {
        0.0
    }
}
