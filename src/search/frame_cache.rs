use std::collections::BTreeMap;

use image::GrayImage;
use log::trace;

use crate::{ssim::structural_similarity, utils::gray_ops::match_shapes};

/// The best scoring cached frame for a candidate.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct BestMatch {
    pub index: u64,
    pub score: f64,
}

/// The outcome of comparing a candidate frame against the cache.
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct CacheSearch {
    pub best: Option<BestMatch>,
    pub comparisons: u64,
    pub failures: u64,
}

/// Downsampled grayscale frames held for loop detection, keyed by frame index.
#[derive(Debug, Clone)]
pub struct FrameCache {
    entries: BTreeMap<u64, GrayImage>,
    capacity: usize,
}

impl FrameCache {
    pub fn new(capacity: usize) -> Self {
        Self {
            entries: BTreeMap::new(),
            capacity,
        }
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn capacity(&self) -> usize {
        self.capacity
    }

    /// Cached frame indices, in ascending order.
    pub fn indices(&self) -> impl Iterator<Item = u64> + '_ {
        self.entries.keys().copied()
    }

    /// Drop every entry whose index is below `window_start`.
    pub fn evict_before(&mut self, window_start: u64) {
        self.entries = self.entries.split_off(&window_start);
    }

    /// Drop the oldest entries until the cache is within capacity.
    pub fn enforce_capacity(&mut self) {
        while self.entries.len() > self.capacity {
            self.entries.pop_first();
        }
    }

    pub fn insert(&mut self, index: u64, frame: GrayImage) {
        self.entries.insert(index, frame);
        self.enforce_capacity();
    }

    /// Score `candidate` against every cached frame with an index in `window_start..before`,
    /// returning the highest score that is at least `min_score`. Equal scores go to the
    /// earliest frame. Pairs whose score cannot be computed are counted as failures and skipped.
    pub fn best_match(&self, candidate: &GrayImage, window_start: u64, before: u64, min_score: f64) -> CacheSearch {
        let mut ret = CacheSearch::default();
        if window_start >= before {
            return ret;
        }

        for (index, cached) in self.entries.range(window_start..before) {
            let (cached, candidate) = match_shapes(cached, candidate);
            ret.comparisons += 1;

            let score = match structural_similarity(&cached, &candidate) {
                Ok(score) => score,
                Err(e) => {
                    trace!(target: "ssim", "Frames {index} and {before} not compared: {e}");
                    ret.failures += 1;
                    continue;
                }
            };
            trace!(target: "ssim", "Frames {index} and {before}: {score:.4}");

            let is_better = ret.best.map_or(true, |best| score > best.score);
            if score >= min_score && is_better {
                ret.best = Some(BestMatch { index: *index, score });
            }
        }

        ret
    }
}
