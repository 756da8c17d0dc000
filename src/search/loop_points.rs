use image::RgbImage;
use log::{debug, info};

use crate::{
    search::{frame_cache::FrameCache, pairwise::record_decode_gap},
    utils::gray_ops::downscale_gray,
    Error, FrameError, FrameSource, LoopCandidate, LoopOptions, Scan, ScanControl, ScanSummary,
};

/// Incremental loop point detection over a stream of frames in increasing index order.
///
/// Every `frame_skip`th frame is downscaled to grayscale and compared by SSIM against cached
/// frames no more than `search_range` frames earlier. If the best score reaches the threshold
/// a [`LoopCandidate`] is produced and the frame is not cached; otherwise the frame is cached.
#[derive(Debug, Clone)]
pub struct LoopSearch {
    options: LoopOptions,
    cache: FrameCache,
    summary: ScanSummary,
}

impl LoopSearch {
    pub fn new(options: &LoopOptions) -> Result<Self, Error> {
        options.check_preconditions()?;
        Ok(Self {
            options: *options,
            cache: FrameCache::new(options.cache_capacity),
            summary: ScanSummary::default(),
        })
    }

    pub fn cache(&self) -> &FrameCache {
        &self.cache
    }

    pub fn summary(&self) -> &ScanSummary {
        &self.summary
    }

    pub fn into_summary(self) -> ScanSummary {
        self.summary
    }

    pub fn is_sampled(&self, index: u64) -> bool {
        index % self.options.frame_skip == 0
    }

    /// Feed the next decoded frame. Indices must be strictly increasing.
    pub fn process_frame(&mut self, index: u64, frame: &RgbImage) -> Option<LoopCandidate> {
        self.summary.frames_decoded += 1;
        if !self.is_sampled(index) {
            return None;
        }
        self.summary.frames_evaluated += 1;

        let gray = downscale_gray(frame);

        let window_start = index.saturating_sub(self.options.search_range);
        self.cache.evict_before(window_start);

        let search = self
            .cache
            .best_match(&gray, window_start, index, self.options.ssim_threshold);
        self.summary.comparisons += search.comparisons;
        self.summary.comparison_failures += search.failures;

        match search.best {
            Some(best) => {
                self.cache.enforce_capacity();
                Some(LoopCandidate {
                    start: best.index,
                    end: index,
                    ssim: best.score,
                })
            }
            None => {
                self.cache.insert(index, gray);
                None
            }
        }
    }

    /// Record a frame that could not be decoded. Only sampled frames count as gaps.
    pub fn skip_frame(&mut self, e: &FrameError) {
        if self.is_sampled(e.index()) {
            record_decode_gap(&mut self.summary, e);
        }
    }
}

/// Scan a whole video for loop points in a single forward pass.
///
/// Frames past the reported frame count are processed for as long as the decoder yields them.
/// Candidates are returned in ascending order of their end frame.
pub fn find_loop_candidates<S>(
    source: &mut S,
    opts: &LoopOptions,
    control: &ScanControl,
) -> Result<Scan<LoopCandidate>, Error>
where
    S: FrameSource + ?Sized,
{
    let mut search = LoopSearch::new(opts)?;
    let total = source.frame_count();

    info!(
        target: "frame_scan",
        "Searching for loop points every {} frames of {} within {} frames",
        opts.frame_skip,
        total,
        opts.search_range
    );

    let mut results = vec![];
    let mut cancelled = false;

    for (index, frame) in source.frames()?.enumerate() {
        let index = index as u64;
        if control.is_cancelled() {
            cancelled = true;
            break;
        }
        control.tick(index, index, total);

        match frame {
            Ok(frame) => results.extend(search.process_frame(index, &frame)),
            Err(e) => search.skip_frame(&e),
        }
    }

    let mut summary = search.into_summary();
    summary.cancelled = cancelled;

    info!(target: "frame_scan", "Found {} loop candidates", results.len());
    debug!(target: "frame_scan", "{:?}", summary);

    Ok(Scan { results, summary })
}

#[cfg(test)]
mod test {
    use image::Rgb;

    use super::*;

    #[test]
    fn test_invalid_options() {
        for opts in [
            LoopOptions {
                frame_skip: 0,
                ..Default::default()
            },
            LoopOptions {
                search_range: 0,
                ..Default::default()
            },
            LoopOptions {
                cache_capacity: 0,
                ..Default::default()
            },
        ] {
            assert!(matches!(LoopSearch::new(&opts), Err(Error::InvalidConfig(_))));
        }
    }

    #[test]
    fn test_matched_frames_are_not_cached() {
        let opts = LoopOptions {
            frame_skip: 1,
            ..Default::default()
        };
        let mut search = LoopSearch::new(&opts).unwrap();
        let frame = RgbImage::from_fn(32, 32, |x, y| Rgb([(x * 7) as u8, (y * 5) as u8, 0]));

        assert_eq!(search.process_frame(0, &frame), None);
        let candidate = search.process_frame(1, &frame).unwrap();
        assert_eq!((candidate.start, candidate.end), (0, 1));

        //frame 1 matched, so only frame 0 is cached and frame 2 also loops back to it.
        assert_eq!(search.cache().indices().collect::<Vec<_>>(), vec![0]);
        let candidate = search.process_frame(2, &frame).unwrap();
        assert_eq!(candidate.start, 0);
    }

    #[test]
    fn test_unsampled_frames_are_ignored() {
        let opts = LoopOptions {
            frame_skip: 3,
            ..Default::default()
        };
        let mut search = LoopSearch::new(&opts).unwrap();
        let frame = RgbImage::new(16, 16);

        for i in 0..3 {
            assert_eq!(search.process_frame(i, &frame), None);
        }
        assert_eq!(search.cache().len(), 1);
        assert_eq!(search.summary().frames_evaluated, 1);
        assert_eq!(search.summary().frames_decoded, 3);
    }
}
