use bitvec::prelude::*;
use image::{imageops::FilterType, GrayImage, RgbImage};

use crate::{
    definitions::{COLOR_LEVELS, DCT_OVERSAMPLE},
    utils::{dct_ops, gray_ops},
    Error, Fingerprint, HashAlg, HashConfig,
};

/// Turns frames into [`Fingerprint`]s. Hashing is deterministic: the same frame always
/// produces the same fingerprint.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct FrameHasher {
    config: HashConfig,
}

impl FrameHasher {
    pub fn new(config: HashConfig) -> Result<Self, Error> {
        config.validate()?;
        Ok(Self { config })
    }

    pub fn config(&self) -> HashConfig {
        self.config
    }

    pub fn hash(&self, frame: &RgbImage) -> Fingerprint {
        let size = self.config.hash_size;

        let mut bits = BitVec::<u64, Lsb0>::with_capacity(self.config.hash_bits());
        match self.config.alg {
            HashAlg::Mean => mean_bits(frame, size, &mut bits),
            HashAlg::Dct => dct_bits(frame, size, &mut bits),
            HashAlg::MeanColor => {
                mean_bits(frame, size, &mut bits);
                color_bits(frame, &mut bits);
            }
        }

        Fingerprint::from_bits(bits, self.config)
    }
}

fn thumbnail(frame: &RgbImage, size: u32) -> GrayImage {
    let gray = gray_ops::to_gray(frame);
    image::imageops::resize(&gray, size, size, FilterType::Lanczos3)
}

//Set a bit for every thumbnail cell brighter than the thumbnail's mean.
fn mean_bits(frame: &RgbImage, size: u32, bits: &mut BitVec<u64, Lsb0>) {
    let thumb = thumbnail(frame, size);
    let pixels = thumb.as_raw();

    let mean = pixels.iter().map(|p| f64::from(*p)).sum::<f64>() / pixels.len() as f64;
    bits.extend(pixels.iter().map(|p| f64::from(*p) > mean));
}

//Set a bit for every low frequency DCT coefficient above the median of those coefficients.
//The DC term is hashed but does not take part in the median.
fn dct_bits(frame: &RgbImage, size: u32, bits: &mut BitVec<u64, Lsb0>) {
    let dimension = size * DCT_OVERSAMPLE;
    let thumb = thumbnail(frame, dimension);

    let dct = dct_ops::perform_dct(&thumb);
    let window = dct_ops::low_frequency_window(&dct, dimension as usize, size as usize);

    let mut ac = window[1..].to_vec();
    ac.sort_by(f64::total_cmp);
    let median = if ac.len() % 2 == 0 {
        (ac[ac.len() / 2 - 1] + ac[ac.len() / 2]) / 2.0
    } else {
        ac[ac.len() / 2]
    };

    bits.extend(window.iter().map(|c| *c > median));
}

//Thermometer-encode the mean of each colour channel, so that the number of differing bits
//grows with the difference in average colour.
fn color_bits(frame: &RgbImage, bits: &mut BitVec<u64, Lsb0>) {
    let num_pixels = (u64::from(frame.width()) * u64::from(frame.height())).max(1) as f64;

    let mut sums = [0u64; 3];
    for pixel in frame.pixels() {
        for (sum, channel) in sums.iter_mut().zip(pixel.0) {
            *sum += u64::from(channel);
        }
    }

    for sum in sums {
        let mean = sum as f64 / num_pixels;
        let level = (mean / 255.0 * f64::from(COLOR_LEVELS)).round() as u32;
        bits.extend((0..COLOR_LEVELS).map(|k| k < level));
    }
}

#[cfg(test)]
mod test {
    use image::Rgb;
    use rand::{rngs::StdRng, Rng, SeedableRng};

    use super::*;

    fn noise_frame(rng: &mut StdRng, width: u32, height: u32) -> RgbImage {
        RgbImage::from_fn(width, height, |_, _| Rgb([rng.gen(), rng.gen(), rng.gen()]))
    }

    fn hasher(alg: HashAlg) -> FrameHasher {
        FrameHasher::new(HashConfig { alg, hash_size: 8 }).unwrap()
    }

    #[test]
    fn test_hashes_are_deterministic() {
        let mut rng = StdRng::seed_from_u64(1);
        let frame = noise_frame(&mut rng, 64, 48);

        for alg in [HashAlg::Mean, HashAlg::Dct, HashAlg::MeanColor] {
            let hasher = hasher(alg);
            let a = hasher.hash(&frame);
            let b = hasher.hash(&frame.clone());
            assert_eq!(a, b, "{alg} is not deterministic");
            assert_eq!(a.len(), hasher.config().hash_bits());
            assert_eq!(a.similarity(&b).unwrap(), 1.0);
        }
    }

    #[test]
    fn test_similarity_is_symmetric() {
        let mut rng = StdRng::seed_from_u64(2);
        let hasher = hasher(HashAlg::MeanColor);
        let a = hasher.hash(&noise_frame(&mut rng, 64, 48));
        let b = hasher.hash(&noise_frame(&mut rng, 64, 48));

        assert_eq!(a.similarity(&b).unwrap(), b.similarity(&a).unwrap());
        assert_eq!(a.distance(&b).unwrap(), b.distance(&a).unwrap());
    }

    #[test]
    fn test_flat_colours_are_separated() {
        let red = RgbImage::from_pixel(32, 32, Rgb([255, 0, 0]));
        let blue = RgbImage::from_pixel(32, 32, Rgb([0, 0, 255]));

        //the average hash alone cannot tell flat frames apart.
        let mean = hasher(HashAlg::Mean);
        assert_eq!(mean.hash(&red).similarity(&mean.hash(&blue)).unwrap(), 1.0);

        let color = hasher(HashAlg::MeanColor);
        let similarity = color.hash(&red).similarity(&color.hash(&blue)).unwrap();
        assert!((similarity - (1.0 - 32.0 / 112.0)).abs() < 1e-9, "{similarity}");
    }

    #[test]
    fn test_different_algs_do_not_compare() {
        let frame = RgbImage::from_pixel(16, 16, Rgb([1, 2, 3]));
        let a = hasher(HashAlg::Mean).hash(&frame);
        let b = hasher(HashAlg::Dct).hash(&frame);
        assert!(matches!(a.distance(&b), Err(Error::ConfigurationMismatch { .. })));
    }

    #[test]
    fn test_invalid_hash_size() {
        let config = HashConfig {
            alg: HashAlg::Dct,
            hash_size: 1,
        };
        assert!(FrameHasher::new(config).is_err());
    }
}
