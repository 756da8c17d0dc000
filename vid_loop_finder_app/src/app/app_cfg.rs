use std::path::PathBuf;

use vid_loop_finder_lib::{AnalysisConfig, HashAlg};

#[derive(Debug, Copy, Clone, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum ReportVerbosity {
    Quiet,
    Default,
    Verbose,
}

// How are the outputs sorted?
#[derive(clap::ValueEnum, Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum Sorting {
    /// In order of frame index
    Index,
    /// Most similar first
    Similarity,
    /// Least similar first
    RevSimilarity,
}

#[derive(clap::ValueEnum, Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum OutputFormat {
    Normal,
    Json,
}

#[derive(clap::ValueEnum, Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum AnalysisKind {
    /// Pairs of similar frames anywhere in the video
    Similar,
    /// Frames that resemble the first frame
    FirstFrame,
    /// Seamless loop points
    Loop,
    /// All of the above, run concurrently
    All,
}

impl AnalysisKind {
    pub fn includes(&self, other: AnalysisKind) -> bool {
        *self == AnalysisKind::All || *self == other
    }
}

#[derive(clap::ValueEnum, Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum HashAlgArg {
    Mean,
    Dct,
    MeanColor,
}

impl From<HashAlgArg> for HashAlg {
    fn from(arg: HashAlgArg) -> Self {
        match arg {
            HashAlgArg::Mean => HashAlg::Mean,
            HashAlgArg::Dct => HashAlg::Dct,
            HashAlgArg::MeanColor => HashAlg::MeanColor,
        }
    }
}

/// Values given on the command line, which take precedence over the config file.
#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct CfgOverrides {
    pub threshold: Option<f64>,
    pub frame_skip: Option<u64>,
    pub ssim_threshold: Option<f64>,
    pub search_range: Option<u64>,
    pub cache_capacity: Option<usize>,
    pub hash_alg: Option<HashAlg>,
}

impl CfgOverrides {
    // --threshold applies to both hash based analyses, --frame-skip to every analysis.
    pub fn apply(&self, cfg: &mut AnalysisConfig) {
        if let Some(threshold) = self.threshold {
            cfg.similar.threshold = threshold;
            cfg.first_frame.threshold = threshold;
        }
        if let Some(frame_skip) = self.frame_skip {
            cfg.similar.frame_skip = frame_skip;
            cfg.first_frame.frame_skip = frame_skip;
            cfg.looping.frame_skip = frame_skip;
        }
        if let Some(ssim_threshold) = self.ssim_threshold {
            cfg.looping.ssim_threshold = ssim_threshold;
        }
        if let Some(search_range) = self.search_range {
            cfg.looping.search_range = search_range;
        }
        if let Some(cache_capacity) = self.cache_capacity {
            cfg.looping.cache_capacity = cache_capacity;
        }
        if let Some(hash_alg) = self.hash_alg {
            cfg.hash.alg = hash_alg;
        }
    }
}

#[derive(Debug, Clone)]
pub struct OutputCfg {
    pub format: OutputFormat,
    pub sorting: Sorting,
    pub search: Option<String>,
    pub verbosity: ReportVerbosity,
}

#[derive(Debug, Clone)]
pub struct AppCfg {
    pub video_path: PathBuf,
    pub analysis: AnalysisKind,
    pub analysis_cfg: AnalysisConfig,
    pub output_cfg: OutputCfg,
}
