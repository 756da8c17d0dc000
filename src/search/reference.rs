use image::RgbImage;
use log::{debug, info};

use crate::{
    search::pairwise::record_decode_gap, Error, FirstFrameOptions, FrameHasher, FrameSource, ReferenceMatch, Scan,
    ScanControl, ScanSummary, Threshold,
};

/// Find every sampled frame whose fingerprint is similar to that of `reference`.
///
/// Frames `frame_skip, 2 * frame_skip, ...` below the reported frame count are read by index and
/// compared. Frame 0 is never compared. Frames that cannot be read are skipped. Matches are
/// returned in ascending frame order.
pub fn find_matches_to_reference<S>(
    reference: &RgbImage,
    source: &mut S,
    frame_skip: u64,
    threshold: Threshold,
    hasher: &FrameHasher,
    control: &ScanControl,
) -> Result<Scan<ReferenceMatch>, Error>
where
    S: FrameSource + ?Sized,
{
    if frame_skip == 0 {
        return Err(Error::InvalidConfig("frame_skip must be at least 1".to_string()));
    }

    let reference_hash = hasher.hash(reference);
    let total = source.frame_count();

    let mut results = vec![];
    let mut summary = ScanSummary::default();

    for (iteration, index) in (frame_skip..total).step_by(frame_skip as usize).enumerate() {
        if control.is_cancelled() {
            summary.cancelled = true;
            break;
        }
        control.tick(iteration as u64, index, total);

        let frame = match source.read_frame_at(index) {
            Ok(frame) => frame,
            Err(e) => {
                record_decode_gap(&mut summary, &e);
                continue;
            }
        };
        summary.frames_decoded += 1;
        summary.frames_evaluated += 1;

        let similarity = reference_hash.similarity(&hasher.hash(&frame))?;
        summary.comparisons += 1;

        if threshold.admits(similarity) {
            results.push(ReferenceMatch {
                reference: 0,
                index,
                similarity,
            });
        }
    }

    Ok(Scan { results, summary })
}

/// Find every sampled frame that resembles the first frame of the video.
///
/// Fails with [`Error::SourceUnavailable`] if the first frame cannot be read.
pub fn find_first_frame_echoes<S>(
    source: &mut S,
    opts: &FirstFrameOptions,
    hasher: &FrameHasher,
    control: &ScanControl,
) -> Result<Scan<ReferenceMatch>, Error>
where
    S: FrameSource + ?Sized,
{
    let threshold = opts.threshold()?;

    let first_frame = source
        .read_frame_at(0)
        .map_err(|e| Error::SourceUnavailable(format!("cannot read the first frame: {e}")))?;

    info!(target: "frame_scan", "Comparing every {} frames of {} with the first frame", opts.frame_skip, source.frame_count());

    let mut scan = find_matches_to_reference(&first_frame, source, opts.frame_skip, threshold, hasher, control)?;
    scan.summary.frames_decoded += 1;

    info!(target: "frame_scan", "Found {} frames similar to the first frame", scan.len());
    debug!(target: "frame_scan", "{:?}", scan.summary);

    Ok(scan)
}
