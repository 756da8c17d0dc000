use image::GrayImage;
use image_compare::Algorithm;

use crate::{definitions::SSIM_WINDOW, Error};

/// Mean structural similarity of two equally sized grayscale images, in the range 0..=1.
///
/// Local statistics are taken over 8x8 windows tiling the image and averaged over all windows.
/// Negative scores (anticorrelated images) are reported as 0.
pub fn structural_similarity(a: &GrayImage, b: &GrayImage) -> Result<f64, Error> {
    let (width, height) = a.dimensions();
    if a.dimensions() == b.dimensions() && (width < SSIM_WINDOW || height < SSIM_WINDOW) {
        return Err(Error::ComparisonFailure(format!(
            "images of {width}x{height} are smaller than the {SSIM_WINDOW}x{SSIM_WINDOW} window"
        )));
    }

    let similarity = image_compare::gray_similarity_structure(&Algorithm::MSSIMSimple, a, b).map_err(|e| {
        Error::ComparisonFailure(format!(
            "{e} ({:?} vs {:?})",
            a.dimensions(),
            b.dimensions()
        ))
    })?;

    if similarity.score.is_nan() {
        return Err(Error::ComparisonFailure("score is not a number".to_string()));
    }

    Ok(similarity.score.clamp(0.0, 1.0))
}

#[cfg(test)]
mod test {
    use image::Luma;
    use rand::{rngs::StdRng, Rng, SeedableRng};

    use super::*;

    fn noise(rng: &mut StdRng, width: u32, height: u32) -> GrayImage {
        GrayImage::from_fn(width, height, |_, _| Luma([rng.gen()]))
    }

    #[test]
    fn test_identical_images_score_one() {
        let mut rng = StdRng::seed_from_u64(7);
        let img = noise(&mut rng, 32, 24);
        let score = structural_similarity(&img, &img).unwrap();
        assert!((score - 1.0).abs() < 1e-6, "{score}");

        let flat = GrayImage::from_pixel(10, 10, Luma([90]));
        assert!((structural_similarity(&flat, &flat).unwrap() - 1.0).abs() < 1e-6);
    }

    #[test]
    fn test_small_changes_score_between() {
        let mut rng = StdRng::seed_from_u64(8);
        let a = noise(&mut rng, 40, 32);
        let b = GrayImage::from_fn(40, 32, |x, y| {
            let p = a.get_pixel(x, y).0[0];
            Luma([p.saturating_add(rng.gen_range(0..40))])
        });
        let c = noise(&mut rng, 40, 32);

        let close = structural_similarity(&a, &b).unwrap();
        let far = structural_similarity(&a, &c).unwrap();
        assert!(close > 0.5 && close < 1.0, "{close}");
        assert!(far < close, "far: {far}, close: {close}");
    }

    #[test]
    fn test_unrelated_noise_scores_low() {
        let mut rng = StdRng::seed_from_u64(9);
        let a = noise(&mut rng, 64, 48);
        let b = noise(&mut rng, 64, 48);
        let score = structural_similarity(&a, &b).unwrap();
        assert!(score < 0.1, "{score}");
    }

    #[test]
    fn test_inverted_image_is_clamped_to_zero() {
        let a = GrayImage::from_fn(32, 32, |x, y| Luma([((x + y) * 4) as u8]));
        let b = GrayImage::from_fn(32, 32, |x, y| Luma([255 - ((x + y) * 4) as u8]));
        assert_eq!(structural_similarity(&a, &b).unwrap(), 0.0);
    }

    #[test]
    fn test_shape_mismatch_fails() {
        let a = GrayImage::new(10, 10);
        let b = GrayImage::new(10, 11);
        assert!(matches!(
            structural_similarity(&a, &b),
            Err(Error::ComparisonFailure(_))
        ));
    }

    #[test]
    fn test_tiny_images_fail() {
        let a = GrayImage::new(6, 20);
        assert!(matches!(
            structural_similarity(&a, &a),
            Err(Error::ComparisonFailure(_))
        ));
    }
}
