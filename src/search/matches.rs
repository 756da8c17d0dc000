use serde::{Deserialize, Serialize};

use crate::utils::time_label::time_label;

/// Two frames anywhere in a video whose fingerprints are similar. `first < second`.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct SimilarPair {
    pub first: u64,
    pub second: u64,
    pub similarity: f64,
}

impl SimilarPair {
    pub fn first_time_label(&self, fps: f64) -> String {
        time_label(self.first, fps)
    }

    pub fn second_time_label(&self, fps: f64) -> String {
        time_label(self.second, fps)
    }
}

/// A frame whose fingerprint is similar to that of a reference frame.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct ReferenceMatch {
    pub reference: u64,
    pub index: u64,
    pub similarity: f64,
}

impl ReferenceMatch {
    pub fn time_label(&self, fps: f64) -> String {
        time_label(self.index, fps)
    }
}

/// A pair of frames that are structurally near-identical, so that playback could jump from
/// `end` back to `start` without a visible seam. `start < end`.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct LoopCandidate {
    pub start: u64,
    pub end: u64,
    pub ssim: f64,
}

impl LoopCandidate {
    pub fn start_time_label(&self, fps: f64) -> String {
        time_label(self.start, fps)
    }

    pub fn end_time_label(&self, fps: f64) -> String {
        time_label(self.end, fps)
    }

    /// Length of the loop in frames.
    pub fn len_frames(&self) -> u64 {
        self.end - self.start
    }
}

/// Counters describing what an analysis did.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct ScanSummary {
    /// Frames successfully decoded.
    pub frames_decoded: u64,
    /// Sampled frames that took part in comparisons.
    pub frames_evaluated: u64,
    /// Fingerprint or SSIM comparisons performed.
    pub comparisons: u64,
    /// Sampled frames that could not be decoded and were skipped.
    pub decode_gaps: u64,
    /// SSIM comparisons that could not be computed and were treated as non-matching.
    pub comparison_failures: u64,
    /// The analysis was cancelled before reaching the end of the video.
    pub cancelled: bool,
}

/// The ordered results of one analysis.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Scan<T> {
    pub results: Vec<T>,
    pub summary: ScanSummary,
}

impl<T> Scan<T> {
    pub fn len(&self) -> usize {
        self.results.len()
    }

    pub fn is_empty(&self) -> bool {
        self.results.is_empty()
    }

    pub fn into_results(self) -> Vec<T> {
        self.results
    }
}

#[cfg(test)]
mod test {
    use super::*;

    #[test]
    fn test_time_labels() {
        let pair = SimilarPair {
            first: 30,
            second: 3600,
            similarity: 0.9,
        };
        assert_eq!(pair.first_time_label(30.0), "0:00:01");
        assert_eq!(pair.second_time_label(30.0), "0:02:00");

        let candidate = LoopCandidate {
            start: 0,
            end: 210,
            ssim: 1.0,
        };
        assert_eq!(candidate.end_time_label(0.0), "0:00:07");
        assert_eq!(candidate.len_frames(), 210);
    }
}
