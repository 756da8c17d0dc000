use std::fmt;

use serde::{Deserialize, Serialize};

use crate::{definitions::*, Error, Threshold};

/// The algorithm used to turn a frame into a [`Fingerprint`][crate::Fingerprint].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum HashAlg {
    /// Average hash: each cell of a grayscale thumbnail is compared against the thumbnail's mean.
    Mean,
    /// Perceptual hash: the low-frequency DCT coefficients of a grayscale thumbnail are compared
    /// against their median.
    Dct,
    /// Average hash followed by a coarse per-channel colour block, so that flat frames of
    /// different colours do not collide.
    #[default]
    MeanColor,
}

impl fmt::Display for HashAlg {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Self::Mean => "mean",
            Self::Dct => "dct",
            Self::MeanColor => "mean_color",
        };
        write!(f, "{name}")
    }
}

/// The parameters of a frame hash. Only fingerprints created with equal configurations can be compared.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(default)]
pub struct HashConfig {
    pub alg: HashAlg,
    /// Side length of the square hash grid.
    pub hash_size: u32,
}

impl Default for HashConfig {
    fn default() -> Self {
        Self {
            alg: HashAlg::default(),
            hash_size: DEFAULT_HASH_SIZE,
        }
    }
}

impl fmt::Display for HashConfig {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}/{}x{}", self.alg, self.hash_size, self.hash_size)
    }
}

impl HashConfig {
    /// The number of bits in a fingerprint created with this configuration.
    #[must_use]
    pub fn hash_bits(&self) -> usize {
        let grid = (self.hash_size * self.hash_size) as usize;
        match self.alg {
            HashAlg::Mean | HashAlg::Dct => grid,
            HashAlg::MeanColor => grid + (COLOR_LEVELS * COLOR_CHANNELS) as usize,
        }
    }

    pub fn validate(&self) -> Result<(), Error> {
        check_range("hash_size", self.hash_size, 2, 32)
    }
}

/// Options for finding pairs of similar frames anywhere in a video.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct SimilarFrameOptions {
    /// Maximum tolerated dissimilarity of a pair.
    pub threshold: f64,
    /// Only every `frame_skip`th frame is sampled.
    pub frame_skip: u64,
}

impl Default for SimilarFrameOptions {
    fn default() -> Self {
        Self {
            threshold: DEFAULT_SIMILAR_THRESHOLD,
            frame_skip: DEFAULT_SIMILAR_FRAME_SKIP,
        }
    }
}

impl SimilarFrameOptions {
    pub fn validate(&self) -> Result<(), Error> {
        check_range("threshold", self.threshold, MIN_SIMILAR_THRESHOLD, MAX_SIMILAR_THRESHOLD)?;
        check_range("frame_skip", self.frame_skip, 1, MAX_SIMILAR_FRAME_SKIP)
    }

    pub fn threshold(&self) -> Result<Threshold, Error> {
        Threshold::new(self.threshold)
    }
}

/// Options for finding frames that resemble the first frame of a video.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct FirstFrameOptions {
    /// Maximum tolerated dissimilarity from the first frame.
    pub threshold: f64,
    /// Only frames whose index is a multiple of `frame_skip` are compared.
    pub frame_skip: u64,
}

impl Default for FirstFrameOptions {
    fn default() -> Self {
        Self {
            threshold: DEFAULT_FIRST_FRAME_THRESHOLD,
            frame_skip: DEFAULT_FIRST_FRAME_SKIP,
        }
    }
}

impl FirstFrameOptions {
    pub fn validate(&self) -> Result<(), Error> {
        check_range(
            "threshold",
            self.threshold,
            MIN_FIRST_FRAME_THRESHOLD,
            MAX_FIRST_FRAME_THRESHOLD,
        )?;
        check_range("frame_skip", self.frame_skip, 1, MAX_FIRST_FRAME_SKIP)
    }

    pub fn threshold(&self) -> Result<Threshold, Error> {
        Threshold::new(self.threshold)
    }
}

/// Options for finding seamless loop points.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct LoopOptions {
    /// Minimum SSIM score for a pair of frames to be a loop candidate.
    pub ssim_threshold: f64,
    /// Only every `frame_skip`th frame is examined.
    pub frame_skip: u64,
    /// How far back, in frames, a matching frame may lie.
    pub search_range: u64,
    /// Maximum number of frames held for comparison.
    pub cache_capacity: usize,
}

impl Default for LoopOptions {
    fn default() -> Self {
        Self {
            ssim_threshold: DEFAULT_LOOP_SSIM_THRESHOLD,
            frame_skip: DEFAULT_LOOP_FRAME_SKIP,
            search_range: DEFAULT_LOOP_SEARCH_RANGE,
            cache_capacity: DEFAULT_LOOP_CACHE_CAPACITY,
        }
    }
}

impl LoopOptions {
    pub fn validate(&self) -> Result<(), Error> {
        check_range(
            "ssim_threshold",
            self.ssim_threshold,
            MIN_LOOP_SSIM_THRESHOLD,
            MAX_LOOP_SSIM_THRESHOLD,
        )?;
        check_range("frame_skip", self.frame_skip, 1, MAX_LOOP_FRAME_SKIP)?;
        check_range(
            "search_range",
            self.search_range,
            MIN_LOOP_SEARCH_RANGE,
            MAX_LOOP_SEARCH_RANGE,
        )?;
        check_range("cache_capacity", self.cache_capacity, 1, MAX_LOOP_CACHE_CAPACITY)
    }

    //The loop engine can run with any options that satisfy these, even outside the validated ranges.
    pub(crate) fn check_preconditions(&self) -> Result<(), Error> {
        if self.frame_skip == 0 {
            return Err(Error::InvalidConfig("frame_skip must be at least 1".to_string()));
        }
        if self.search_range == 0 {
            return Err(Error::InvalidConfig("search_range must be at least 1".to_string()));
        }
        if self.cache_capacity == 0 {
            return Err(Error::InvalidConfig("cache_capacity must be at least 1".to_string()));
        }
        if !(0.0..=1.0).contains(&self.ssim_threshold) {
            return Err(Error::InvalidConfig(format!(
                "ssim_threshold must be between 0 and 1, got {}",
                self.ssim_threshold
            )));
        }
        Ok(())
    }
}

/// Every option of every analysis, as read from a configuration file.
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct AnalysisConfig {
    pub hash: HashConfig,
    pub similar: SimilarFrameOptions,
    pub first_frame: FirstFrameOptions,
    #[serde(rename = "loop")]
    pub looping: LoopOptions,
}

impl AnalysisConfig {
    pub fn validate(&self) -> Result<(), Error> {
        self.hash.validate()?;
        self.similar.validate()?;
        self.first_frame.validate()?;
        self.looping.validate()
    }
}

fn check_range<T>(name: &str, value: T, min: T, max: T) -> Result<(), Error>
where
    T: PartialOrd + fmt::Display,
{
    if value >= min && value <= max {
        Ok(())
    } else {
        Err(Error::InvalidConfig(format!(
            "{name} must be between {min} and {max}, got {value}"
        )))
    }
}

#[cfg(test)]
mod test {
    use super::*;

    #[test]
    fn test_defaults_are_valid() {
        AnalysisConfig::default().validate().unwrap();
    }

    #[test]
    fn test_out_of_range_options_are_named() {
        let opts = SimilarFrameOptions {
            threshold: 0.5,
            ..Default::default()
        };
        match opts.validate() {
            Err(Error::InvalidConfig(msg)) => assert!(msg.contains("threshold"), "{msg}"),
            other => panic!("expected InvalidConfig, got {other:?}"),
        }

        let opts = LoopOptions {
            search_range: 5,
            ..Default::default()
        };
        match opts.validate() {
            Err(Error::InvalidConfig(msg)) => assert!(msg.contains("search_range"), "{msg}"),
            other => panic!("expected InvalidConfig, got {other:?}"),
        }

        let opts = FirstFrameOptions {
            frame_skip: 0,
            ..Default::default()
        };
        assert!(opts.validate().is_err());
    }

    #[test]
    fn test_bounds_are_inclusive() {
        let opts = LoopOptions {
            ssim_threshold: 0.99,
            frame_skip: 100,
            search_range: 10,
            cache_capacity: 1,
        };
        opts.validate().unwrap();
    }

    #[test]
    fn test_engine_preconditions_are_looser_than_validation() {
        let opts = LoopOptions {
            search_range: 1,
            ..Default::default()
        };
        assert!(opts.validate().is_err());
        opts.check_preconditions().unwrap();

        let opts = LoopOptions {
            cache_capacity: 0,
            ..Default::default()
        };
        assert!(opts.check_preconditions().is_err());
    }

    #[test]
    fn test_hash_bits() {
        let mean = HashConfig {
            alg: HashAlg::Mean,
            hash_size: 8,
        };
        assert_eq!(mean.hash_bits(), 64);
        assert_eq!(HashConfig::default().hash_bits(), 112);
    }
}
