use image::GrayImage;
use rustdct::DctPlanner;
use transpose::transpose_inplace;

/// Perform a 2-D DCT-II on a square grayscale image. The coefficients are returned in row-major order.
pub fn perform_dct(image: &GrayImage) -> Vec<f64> {
    let (width, height) = image.dimensions();
    debug_assert_eq!(width, height, "DCT input must be square");
    let dimension = width as usize;

    let mut raw_bytes = bytify(image);

    //setup the DCT.....
    let mut planner = DctPlanner::new();
    let dct = planner.plan_dct2(dimension);

    //perform round 1 of the DCT (on rows):
    raw_bytes.chunks_exact_mut(dimension).for_each(|row| {
        dct.process_dct2(row);
    });

    //now tranpose...
    let mut scratch = vec![0f64; dimension];
    transpose_inplace(&mut raw_bytes, &mut scratch, dimension, dimension);

    //perform round 2 of the DCT (on cols):
    raw_bytes.chunks_exact_mut(dimension).for_each(|col| {
        dct.process_dct2(col);
    });

    //and transpose back so that the coefficients are indexed as [row][col]
    transpose_inplace(&mut raw_bytes, &mut scratch, dimension, dimension);

    raw_bytes
}

/// Extract the top-left (lowest frequency) `window_size` x `window_size` square from a row-major DCT.
pub fn low_frequency_window(dct: &[f64], dimension: usize, window_size: usize) -> Vec<f64> {
    dct.chunks_exact(dimension)
        .take(window_size)
        .flat_map(|row| row.iter().copied().take(window_size))
        .collect()
}

fn bytify(image: &GrayImage) -> Vec<f64> {
    //Now extract the raw data, convert and scale into f64, in preparation for DCT.
    image.as_raw().iter().map(|x| f64::from(*x) - 128.0).collect()
}

#[cfg(test)]
mod test {
    use image::Luma;

    use super::*;

    #[test]
    fn test_flat_image_has_only_dc() {
        let img = GrayImage::from_pixel(16, 16, Luma([200]));
        let dct = perform_dct(&img);

        assert_eq!(dct.len(), 256);
        assert!(dct[0].abs() > 1.0);
        assert!(dct.iter().skip(1).all(|c| c.abs() < 1e-6));
    }

    #[test]
    fn test_low_frequency_window() {
        let dct = (0..16).map(f64::from).collect::<Vec<_>>();
        let window = low_frequency_window(&dct, 4, 2);
        assert_eq!(window, vec![0.0, 1.0, 4.0, 5.0]);
    }
}
