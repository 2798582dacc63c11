use image::imageops::{self, FilterType};
use image::GrayImage;

/// Enlarge the raster by an integer factor using linear interpolation.
/// More pixels per stroke improves downstream OCR on small text.
pub fn apply(image: &GrayImage, factor: u32) -> GrayImage {
    if factor == 1 {
        return image.clone();
    }
    imageops::resize(
        image,
        image.width() * factor,
        image.height() * factor,
        FilterType::Triangle,
    )
}
