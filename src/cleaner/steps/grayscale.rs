use image::{GrayImage, Luma, RgbImage};

/// ITU-R BT.601 luma weights in 8-bit fixed point (sum = 256).
const LUMA_R: u32 = 77;
const LUMA_G: u32 = 150;
const LUMA_B: u32 = 29;

/// Collapse a color raster to a single luminance channel.
pub fn apply(image: &RgbImage) -> GrayImage {
    GrayImage::from_fn(image.width(), image.height(), |x, y| {
        let [r, g, b] = image.get_pixel(x, y).0;
        let luma = (LUMA_R * r as u32 + LUMA_G * g as u32 + LUMA_B * b as u32 + 128) >> 8;
        Luma([luma as u8])
    })
}
