use image::{DynamicImage, GrayImage, ImageBuffer, Luma, Pixel};
use imageproc::contrast::otsu_level;
use tracing::debug;

use crate::config::{Binarization, RelativeRect};

/// Collapses any loaded image to a single intensity channel.
pub fn to_grayscale(img: &DynamicImage) -> GrayImage {
    img.to_luma8()
}

/// Converts a grayscale image to pure two-tone according to `mode`.
///
/// Fixed mode: pixels below `low` become 0, all others become `high`.
/// Otsu mode: the cut point is computed from the image histogram, so dark
/// and bright album art both end up with a usable split.
pub fn binarize(img: &GrayImage, mode: Binarization) -> GrayImage {
    match mode {
        Binarization::Fixed { low, high } => threshold_two_tone(img, |v| v < low, high),
        Binarization::Otsu { high } => {
            let level = otsu_level(img);
            debug!("Otsu cut point: {}", level);
            split_at_level(img, level, high)
        }
    }
}

/// Pixels at or below `level` go to 0, the rest to `high`.
fn split_at_level(img: &GrayImage, level: u8, high: u8) -> GrayImage {
    threshold_two_tone(img, |v| v <= level, high)
}

fn threshold_two_tone(img: &GrayImage, is_dark: impl Fn(u8) -> bool, high: u8) -> GrayImage {
    let (width, height) = img.dimensions();
    let mut output = ImageBuffer::new(width, height);

    for (x, y, pixel) in img.enumerate_pixels() {
        let value = if is_dark(pixel[0]) { 0u8 } else { high };
        output.put_pixel(x, y, Luma([value]));
    }

    output
}

/// Crops a sub-region from an image using relative coordinates.
///
/// Converts the relative rect (0.0–1.0) to absolute pixel coordinates,
/// clamps to image bounds, and returns the cropped sub-image.
pub fn crop_region<P>(
    img: &ImageBuffer<P, Vec<P::Subpixel>>,
    region: &RelativeRect,
) -> ImageBuffer<P, Vec<P::Subpixel>>
where
    P: Pixel + 'static,
{
    let (w, h) = img.dimensions();
    let (x0, y0, rw, rh) = region.to_pixels(w, h);

    image::imageops::crop_imm(img, x0, y0, rw, rh).to_image()
}
