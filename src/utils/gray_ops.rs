use std::borrow::Cow;

use image::{imageops::FilterType, GrayImage, RgbImage};

use crate::definitions::LOOP_MAX_GRAY_WIDTH;

pub fn to_gray(frame: &RgbImage) -> GrayImage {
    image::imageops::grayscale(frame)
}

/// Convert a frame to grayscale, shrinking it to at most [`LOOP_MAX_GRAY_WIDTH`] pixels wide.
/// The height is scaled by the same factor (rounded down).
pub fn downscale_gray(frame: &RgbImage) -> GrayImage {
    let gray = to_gray(frame);
    let (width, height) = gray.dimensions();

    if width <= LOOP_MAX_GRAY_WIDTH {
        return gray;
    }

    let new_height = (u64::from(height) * u64::from(LOOP_MAX_GRAY_WIDTH) / u64::from(width)).max(1) as u32;
    image::imageops::resize(&gray, LOOP_MAX_GRAY_WIDTH, new_height, FilterType::Triangle)
}

/// Bring two images to the same shape by resizing whichever has the smaller area to the
/// dimensions of the other. Equal-shaped images are borrowed unchanged.
pub fn match_shapes<'a>(a: &'a GrayImage, b: &'a GrayImage) -> (Cow<'a, GrayImage>, Cow<'a, GrayImage>) {
    if a.dimensions() == b.dimensions() {
        return (Cow::Borrowed(a), Cow::Borrowed(b));
    }

    let area = |img: &GrayImage| u64::from(img.width()) * u64::from(img.height());

    if area(a) > area(b) {
        let b = image::imageops::resize(b, a.width(), a.height(), FilterType::Triangle);
        (Cow::Borrowed(a), Cow::Owned(b))
    } else {
        let a = image::imageops::resize(a, b.width(), b.height(), FilterType::Triangle);
        (Cow::Owned(a), Cow::Borrowed(b))
    }
}
