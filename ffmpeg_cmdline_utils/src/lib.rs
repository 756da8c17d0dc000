//! Thin wrappers around the `ffmpeg` and `ffprobe` command line tools: video metadata via
//! ffprobe's JSON output, and decoded RGB frames read from an ffmpeg rawvideo pipe.
//!
//! Ffmpeg and Ffprobe must be installed and visible on the command line.

#![warn(clippy::unwrap_used)]

mod ffmpeg_error_kind;
mod ffmpeg_ops;
mod ffmpeg_stats;

pub use ffmpeg_error_kind::FfmpegError;
pub use ffmpeg_ops::{
    ffmpeg_and_ffprobe_are_callable, get_video_stats, is_video_file, FfmpegFrameIter, FfmpegFrameReaderBuilder,
};
pub use ffmpeg_stats::{VideoInfo, VideoInfoError};
