#![allow(clippy::len_without_is_empty)]
#![warn(clippy::unwrap_used)]
#![warn(clippy::print_stdout)]
#![warn(clippy::print_stderr)]

//! # Overview
//! vid_loop_finder_lib is a library for finding repetition inside a single video. It can find
//! * Pairs of frames anywhere in the video that look alike ([`find_similar_frames`]),
//! * Frames that look like the first frame ([`find_first_frame_echoes`]),
//! * Seamless loop points: pairs of nearby frames that are structurally near-identical, so that
//!   playback could jump from the later frame back to the earlier one without a visible seam
//!   ([`find_loop_candidates`]).
//!
//! # How it works
//! Similar frames are found with perceptual hashes. Each sampled frame is shrunk to a tiny
//! grayscale thumbnail and turned into a [`Fingerprint`] of a few dozen bits. Two frames are
//! similar when their fingerprints differ in few enough bits, as governed by a [`Threshold`].
//!
//! Loop points are found with the structural similarity index (SSIM), which is much more
//! discriminating than a hash but too expensive to compute for every pair of frames. Instead a
//! single pass over the video compares each sampled frame with the frames shortly before it.
//!
//! # High Level API
//! Every analysis reads frames from a [`FrameSource`]. With the default `ffmpeg_backend` feature,
//! [`FfmpegFrameSource`] decodes video files; [`FrameVec`] holds frames already in memory.
//! ```rust
//! use image::{Rgb, RgbImage};
//! use vid_loop_finder_lib::{find_similar_frames, FrameHasher, FrameVec, ScanControl, SimilarFrameOptions};
//!
//! // Ten red frames followed by ten blue frames.
//! let red = RgbImage::from_pixel(32, 32, Rgb([255, 0, 0]));
//! let blue = RgbImage::from_pixel(32, 32, Rgb([0, 0, 255]));
//! let frames = [vec![red; 10], vec![blue; 10]].concat();
//! let mut video = FrameVec::new(frames, 30.0);
//!
//! let opts = SimilarFrameOptions { threshold: 0.15, frame_skip: 5 };
//! let scan = find_similar_frames(&mut video, &opts, &FrameHasher::default(), &ScanControl::new()).unwrap();
//!
//! // frames 0 and 5 are red, frames 10 and 15 are blue.
//! let pairs = scan.results.iter().map(|p| (p.first, p.second)).collect::<Vec<_>>();
//! assert_eq!(pairs, vec![(0, 5), (10, 15)]);
//! ```
//!
//! ## Search functions
//! The following search functions are available:
//! * All similar pairs within a set of frames: [`find_similar_pairs`], or sampled from a video: [`find_similar_frames`]
//! * All frames similar to a reference frame: [`find_matches_to_reference`], or to the first frame: [`find_first_frame_echoes`]
//! * Loop points: [`find_loop_candidates`], or frame-by-frame with [`LoopSearch`]
//!
//! Each returns a [`Scan`]: the ordered results plus a [`ScanSummary`] of what was done. Analyses
//! can be cancelled and observed through a [`ScanControl`].
//!
//! # Prerequisites
//! The `ffmpeg_backend` feature calls Ffmpeg from the command line. You must make Ffmpeg and Ffprobe
//! available on the command line, for example:
//!
//! * Debian-based systems: ```# apt-get install ffmpeg```
//! * Yum-based systems: ```# yum install ffmpeg```
//! * Windows:
//!     1) Download the correct installer from <https://ffmpeg.org/download.html>
//!     2) Run the installer and install ffmpeg to any directory
//!     3) Add the directory into the PATH environment variable

pub(crate) mod config;
pub(crate) mod definitions;
pub(crate) mod error;
#[cfg(feature = "ffmpeg_backend")]
pub(crate) mod ffmpeg_source;
pub(crate) mod frame_hashing;
pub(crate) mod frame_source;
pub(crate) mod search;
pub(crate) mod ssim;
pub(crate) mod utils;

pub use config::{AnalysisConfig, FirstFrameOptions, HashAlg, HashConfig, LoopOptions, SimilarFrameOptions};
pub use definitions::DEFAULT_FPS;
pub use error::{Error, FrameError};
#[cfg(feature = "ffmpeg_backend")]
pub use ffmpeg_source::FfmpegFrameSource;
pub use frame_hashing::{fingerprint::Fingerprint, frame_hasher::FrameHasher, threshold::Threshold};
pub use frame_source::{FrameIter, FrameSource, FrameVec};
pub use search::{
    control::{CancelToken, Progress, ScanControl},
    frame_cache::{BestMatch, CacheSearch, FrameCache},
    loop_points::{find_loop_candidates, LoopSearch},
    matches::{LoopCandidate, ReferenceMatch, Scan, ScanSummary, SimilarPair},
    pairwise::{find_similar_frames, find_similar_pairs, sample_frames},
    reference::{find_first_frame_echoes, find_matches_to_reference},
};
pub use ssim::structural_similarity;
pub use utils::time_label::{effective_fps, time_label};
