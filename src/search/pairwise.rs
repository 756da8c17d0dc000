use image::RgbImage;
use log::{debug, info};

use crate::{
    Error, Fingerprint, FrameError, FrameHasher, FrameSource, Scan, ScanControl, ScanSummary, SimilarFrameOptions,
    SimilarPair, Threshold,
};

/// Find every pair of frames whose fingerprints are similar within `threshold`.
///
/// Each frame is hashed exactly once and every unordered pair is compared. Pairs are returned
/// ordered by their first index and then their second index, whatever the order of the input.
/// Fewer than two frames produce no pairs.
pub fn find_similar_pairs<I>(
    frames: I,
    threshold: Threshold,
    hasher: &FrameHasher,
    control: &ScanControl,
) -> Result<Scan<SimilarPair>, Error>
where
    I: IntoIterator<Item = (u64, RgbImage)>,
{
    let mut summary = ScanSummary::default();
    let mut fingerprints = vec![];

    for (index, frame) in frames {
        if control.is_cancelled() {
            summary.cancelled = true;
            break;
        }
        fingerprints.push((index, hasher.hash(&frame)));
    }

    summary.frames_evaluated = fingerprints.len() as u64;
    pairs_from_fingerprints(fingerprints, threshold, control, summary)
}

/// Decode every `frame_skip`th frame of a video, starting from frame 0. Frames that fail to
/// decode are skipped.
pub fn sample_frames<S>(
    source: &mut S,
    frame_skip: u64,
    control: &ScanControl,
) -> Result<Scan<(u64, RgbImage)>, Error>
where
    S: FrameSource + ?Sized,
{
    let mut results = vec![];
    let summary = for_each_sample(source, frame_skip, control, |index, frame| results.push((index, frame)))?;
    Ok(Scan { results, summary })
}

/// Sample a video every `opts.frame_skip` frames and find every pair of similar samples.
///
/// Equivalent to [`sample_frames`] followed by [`find_similar_pairs`], except that samples are
/// hashed as they are decoded rather than held in memory.
pub fn find_similar_frames<S>(
    source: &mut S,
    opts: &SimilarFrameOptions,
    hasher: &FrameHasher,
    control: &ScanControl,
) -> Result<Scan<SimilarPair>, Error>
where
    S: FrameSource + ?Sized,
{
    let threshold = opts.threshold()?;

    info!(target: "frame_scan", "Searching for similar frames every {} frames of {}", opts.frame_skip, source.frame_count());

    let mut fingerprints = vec![];
    let mut summary = for_each_sample(source, opts.frame_skip, control, |index, frame| {
        fingerprints.push((index, hasher.hash(&frame)));
    })?;
    summary.frames_evaluated = fingerprints.len() as u64;

    let scan = pairs_from_fingerprints(fingerprints, threshold, control, summary)?;

    info!(target: "frame_scan", "Found {} similar frame pairs", scan.len());
    debug!(target: "frame_scan", "{:?}", scan.summary);

    Ok(scan)
}

//Sequentially decode the source, calling `on_sample` for every sampled frame.
fn for_each_sample<S, F>(
    source: &mut S,
    frame_skip: u64,
    control: &ScanControl,
    mut on_sample: F,
) -> Result<ScanSummary, Error>
where
    S: FrameSource + ?Sized,
    F: FnMut(u64, RgbImage),
{
    if frame_skip == 0 {
        return Err(Error::InvalidConfig("frame_skip must be at least 1".to_string()));
    }

    let total = source.frame_count();
    let mut summary = ScanSummary::default();

    for (index, frame) in source.frames()?.enumerate() {
        let index = index as u64;
        if control.is_cancelled() {
            summary.cancelled = true;
            break;
        }
        control.tick(index, index, total);

        let sampled = index % frame_skip == 0;
        match frame {
            Ok(frame) => {
                summary.frames_decoded += 1;
                if sampled {
                    on_sample(index, frame);
                }
            }
            Err(e) if sampled => record_decode_gap(&mut summary, &e),
            Err(_) => (),
        }
    }

    Ok(summary)
}

pub(crate) fn record_decode_gap(summary: &mut ScanSummary, e: &FrameError) {
    debug!(target: "decode_gap", "Skipping frame {}: {e}", e.index());
    summary.decode_gaps += 1;
}

//Compare every unordered pair of fingerprints. Cancellation is checked once per outer fingerprint.
fn pairs_from_fingerprints(
    mut fingerprints: Vec<(u64, Fingerprint)>,
    threshold: Threshold,
    control: &ScanControl,
    mut summary: ScanSummary,
) -> Result<Scan<SimilarPair>, Error> {
    let mut results = vec![];
    if summary.cancelled {
        return Ok(Scan { results, summary });
    }

    fingerprints.sort_by_key(|(index, _)| *index);
    let total = fingerprints.len() as u64;

    for (i, (first, first_hash)) in fingerprints.iter().enumerate() {
        if control.is_cancelled() {
            summary.cancelled = true;
            break;
        }
        control.tick(i as u64, i as u64, total);

        for (second, second_hash) in &fingerprints[i + 1..] {
            let similarity = first_hash.similarity(second_hash)?;
            summary.comparisons += 1;

            if threshold.admits(similarity) {
                results.push(SimilarPair {
                    first: *first,
                    second: *second,
                    similarity,
                });
            }
        }
    }

    Ok(Scan { results, summary })
}

#[cfg(test)]
mod test {
    use image::Rgb;

    use super::*;
    use crate::{CancelToken, FrameVec};

    fn flat(value: u8) -> RgbImage {
        RgbImage::from_pixel(16, 16, Rgb([value, value, value]))
    }

    #[test]
    fn test_too_few_frames() {
        let hasher = FrameHasher::default();
        let threshold = Threshold::new(0.15).unwrap();
        let control = ScanControl::new();

        let scan = find_similar_pairs(Vec::<(u64, RgbImage)>::new(), threshold, &hasher, &control).unwrap();
        assert!(scan.is_empty());
        assert_eq!(scan.summary.comparisons, 0);

        let scan = find_similar_pairs(vec![(0, flat(3))], threshold, &hasher, &control).unwrap();
        assert!(scan.is_empty());
        assert_eq!(scan.summary.comparisons, 0);
    }

    #[test]
    fn test_cancelled_before_start() {
        let token = CancelToken::new();
        token.cancel();
        let control = ScanControl::new().with_cancel_token(token);

        let frames = (0..5).map(|i| (i, flat(0))).collect::<Vec<_>>();
        let scan = find_similar_pairs(frames, Threshold::new(0.15).unwrap(), &FrameHasher::default(), &control).unwrap();
        assert!(scan.is_empty());
        assert!(scan.summary.cancelled);
    }

    #[test]
    fn test_zero_skip_is_rejected() {
        let mut video = FrameVec::new(vec![flat(0)], 30.0);
        assert!(matches!(
            sample_frames(&mut video, 0, &ScanControl::new()),
            Err(Error::InvalidConfig(_))
        ));
    }

    #[test]
    fn test_sample_frames() {
        let frames = (0..25u8).map(flat).collect::<Vec<_>>();
        let mut video = FrameVec::new(frames, 30.0);

        let scan = sample_frames(&mut video, 10, &ScanControl::new()).unwrap();
        let indices = scan.results.iter().map(|(i, _)| *i).collect::<Vec<_>>();
        assert_eq!(indices, vec![0, 10, 20]);
        assert_eq!(scan.results[1].1, flat(10));
        assert_eq!(scan.summary.frames_decoded, 25);
    }
}
