use image::{Rgb, RgbImage};
use itertools::Itertools;
use rand::prelude::*;
use vid_loop_finder_lib::*;

fn flat(color: [u8; 3]) -> RgbImage {
    RgbImage::from_pixel(32, 24, Rgb(color))
}

fn noise_frame(rng: &mut StdRng) -> RgbImage {
    RgbImage::from_fn(32, 24, |_, _| Rgb([rng.gen(), rng.gen(), rng.gen()]))
}

//a copy of `frame` with a handful of pixels changed.
fn perturbed(frame: &RgbImage, rng: &mut StdRng) -> RgbImage {
    let mut ret = frame.clone();
    for _ in 0..5 {
        let x = rng.gen_range(0..ret.width());
        let y = rng.gen_range(0..ret.height());
        ret.put_pixel(x, y, Rgb([rng.gen(), rng.gen(), rng.gen()]));
    }
    ret
}

fn red_then_blue() -> FrameVec {
    let frames = (0..100)
        .map(|i| if i < 50 { flat([255, 0, 0]) } else { flat([0, 0, 255]) })
        .collect::<Vec<_>>();
    FrameVec::new(frames, 30.0)
}

/// Wraps a source, remembering every index read by `read_frame_at`.
struct RecordingSource {
    inner: FrameVec,
    reads: Vec<u64>,
}

impl FrameSource for RecordingSource {
    fn frame_count(&self) -> u64 {
        self.inner.frame_count()
    }

    fn frame_rate(&self) -> f64 {
        self.inner.frame_rate()
    }

    fn read_frame_at(&mut self, index: u64) -> Result<RgbImage, FrameError> {
        self.reads.push(index);
        self.inner.read_frame_at(index)
    }

    fn frames(&mut self) -> Result<FrameIter<'_>, Error> {
        self.inner.frames()
    }
}

#[test]
fn test_red_then_blue() {
    let mut video = red_then_blue();
    let opts = SimilarFrameOptions {
        threshold: 0.15,
        frame_skip: 10,
    };

    let scan = find_similar_frames(&mut video, &opts, &FrameHasher::default(), &ScanControl::new()).unwrap();

    let red = [0, 10, 20, 30, 40];
    let blue = [50, 60, 70, 80, 90];
    let expected = red
        .iter()
        .tuple_combinations()
        .chain(blue.iter().tuple_combinations())
        .map(|(a, b)| (*a, *b))
        .collect::<Vec<(u64, u64)>>();
    let actual = scan.results.iter().map(|p| (p.first, p.second)).collect::<Vec<_>>();

    assert_eq!(actual, expected);
    assert!(scan.results.iter().all(|p| p.similarity == 1.0));
    assert_eq!(scan.summary.frames_evaluated, 10);
    assert_eq!(scan.summary.comparisons, 45);
    assert_eq!(scan.summary.frames_decoded, 100);
    assert!(!scan.summary.cancelled);
}

#[test]
fn test_comparison_count() {
    let mut rng = StdRng::seed_from_u64(11);
    let threshold = Threshold::new(0.15).unwrap();
    let hasher = FrameHasher::default();

    for n in [0u64, 1, 2, 3, 7, 12] {
        let frames = (0..n).map(|i| (i, noise_frame(&mut rng))).collect::<Vec<_>>();
        let scan = find_similar_pairs(frames, threshold, &hasher, &ScanControl::new()).unwrap();
        assert_eq!(scan.summary.comparisons, n * n.saturating_sub(1) / 2, "n = {n}");
        if n < 2 {
            assert!(scan.is_empty());
        }
    }
}

#[test]
fn test_input_order_does_not_matter() {
    let mut rng = StdRng::seed_from_u64(12);
    let threshold = Threshold::new(0.2).unwrap();
    let hasher = FrameHasher::default();

    let base = (0..4).map(|_| noise_frame(&mut rng)).collect::<Vec<_>>();
    let frames = (0..20u64)
        .map(|i| (i * 3, perturbed(&base[i as usize % 4], &mut rng)))
        .collect::<Vec<_>>();

    let ordered = find_similar_pairs(frames.clone(), threshold, &hasher, &ScanControl::new()).unwrap();
    assert!(!ordered.is_empty());
    assert!(ordered.results.iter().all(|p| p.first < p.second));

    for _ in 0..5 {
        let mut shuffled = frames.clone();
        shuffled.shuffle(&mut rng);
        let scan = find_similar_pairs(shuffled, threshold, &hasher, &ScanControl::new()).unwrap();
        assert_eq!(scan.results, ordered.results);
    }
}

#[test]
fn test_hashing_once_matches_hashing_every_pair() {
    let mut rng = StdRng::seed_from_u64(13);
    let threshold = Threshold::new(0.25).unwrap();

    let base = (0..3).map(|_| noise_frame(&mut rng)).collect::<Vec<_>>();
    let frames = (0..15u64)
        .map(|i| (i, perturbed(&base[i as usize % 3], &mut rng)))
        .collect::<Vec<_>>();

    for alg in [HashAlg::Mean, HashAlg::Dct, HashAlg::MeanColor] {
        let hasher = FrameHasher::new(HashConfig { alg, hash_size: 8 }).unwrap();

        //rehash both frames for every single comparison.
        let reference = frames
            .iter()
            .tuple_combinations()
            .filter_map(|((i, a), (j, b))| {
                let similarity = hasher.hash(a).similarity(&hasher.hash(b)).unwrap();
                threshold.admits(similarity).then_some(SimilarPair {
                    first: *i,
                    second: *j,
                    similarity,
                })
            })
            .collect::<Vec<_>>();

        let scan = find_similar_pairs(frames.clone(), threshold, &hasher, &ScanControl::new()).unwrap();
        assert_eq!(scan.results, reference, "{alg}");
    }
}

#[test]
fn test_decode_gaps_are_skipped() {
    let frames = (0..30)
        .map(|i| if i == 10 { None } else { Some(flat([0, 200, 0])) })
        .collect::<Vec<_>>();
    let mut video = FrameVec::with_gaps(frames, 30.0);
    let opts = SimilarFrameOptions {
        threshold: 0.15,
        frame_skip: 10,
    };

    let scan = find_similar_frames(&mut video, &opts, &FrameHasher::default(), &ScanControl::new()).unwrap();

    let pairs = scan.results.iter().map(|p| (p.first, p.second)).collect::<Vec<_>>();
    assert_eq!(pairs, vec![(0, 20)]);
    assert_eq!(scan.summary.decode_gaps, 1);
    assert_eq!(scan.summary.frames_decoded, 29);
}

#[test]
fn test_cancel_from_progress_callback() {
    let token = CancelToken::new();
    let token_clone = token.clone();
    let control = ScanControl::new()
        .with_cancel_token(token)
        .with_progress(move |_progress| token_clone.cancel());

    let mut video = red_then_blue();
    let opts = SimilarFrameOptions {
        threshold: 0.15,
        frame_skip: 1,
    };
    let scan = find_similar_frames(&mut video, &opts, &FrameHasher::default(), &control).unwrap();

    assert!(scan.summary.cancelled);
    assert!(scan.summary.frames_decoded < 100);
    assert!(scan.is_empty());
}

#[test]
fn test_reference_indices() {
    let frames = vec![flat([9, 9, 9]); 23];
    let mut video = RecordingSource {
        inner: FrameVec::new(frames, 30.0),
        reads: vec![],
    };

    let scan = find_matches_to_reference(
        &flat([9, 9, 9]),
        &mut video,
        5,
        Threshold::new(0.2).unwrap(),
        &FrameHasher::default(),
        &ScanControl::new(),
    )
    .unwrap();

    assert_eq!(video.reads, vec![5, 10, 15, 20]);
    let indices = scan.results.iter().map(|m| m.index).collect::<Vec<_>>();
    assert_eq!(indices, vec![5, 10, 15, 20]);
    assert_eq!(scan.summary.comparisons, 4);
}

#[test]
fn test_first_frame_echoes() {
    let first = flat([250, 250, 0]);
    let frames = (0..40)
        .map(|i| if i % 20 == 0 { first.clone() } else { flat([0, 0, 80]) })
        .collect::<Vec<_>>();
    let mut video = RecordingSource {
        inner: FrameVec::new(frames, 30.0),
        reads: vec![],
    };

    let opts = FirstFrameOptions {
        threshold: 0.2,
        frame_skip: 5,
    };
    let scan = find_first_frame_echoes(&mut video, &opts, &FrameHasher::default(), &ScanControl::new()).unwrap();

    assert_eq!(video.reads, vec![0, 5, 10, 15, 20, 25, 30, 35]);
    assert_eq!(scan.results.len(), 1);
    assert_eq!(scan.results[0].index, 20);
    assert_eq!(scan.results[0].reference, 0);
    assert_eq!(scan.results[0].time_label(video.fps()), "0:00:00");
}
