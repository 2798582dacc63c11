use crate::error::CleanError;
use image::codecs::jpeg::JpegEncoder;
use image::{GrayImage, RgbImage};
use std::io::Cursor;

/// Decode encoded image bytes into a 3-channel raster.
///
/// Grayscale and indexed sources are expanded to RGB too, so every
/// downstream stage sees the same channel layout regardless of the
/// container format.
pub fn decode(bytes: &[u8]) -> Result<RgbImage, CleanError> {
    let img = image::load_from_memory(bytes).map_err(|e| CleanError::Decode(e.to_string()))?;
    Ok(img.to_rgb8())
}

/// Encode a grayscale raster as JPEG at the given quality.
pub fn encode_jpeg(image: &GrayImage, quality: u8) -> Result<Vec<u8>, CleanError> {
    let mut cursor = Cursor::new(Vec::new());
    let encoder = JpegEncoder::new_with_quality(&mut cursor, quality);
    image
        .write_with_encoder(encoder)
        .map_err(|e| CleanError::Encode(e.to_string()))?;
    Ok(cursor.into_inner())
}

#[cfg(test)]
mod tests {
    use super::*;
    use image::{DynamicImage, ImageFormat, Luma};

    fn png_bytes(img: DynamicImage) -> Vec<u8> {
        let mut cursor = Cursor::new(Vec::new());
        img.write_to(&mut cursor, ImageFormat::Png).unwrap();
        cursor.into_inner()
    }

    #[test]
    fn test_decode_rejects_empty_input() {
        let result = decode(&[]);
        assert!(matches!(result, Err(CleanError::Decode(_))));
    }

    #[test]
    fn test_decode_rejects_garbage() {
        let result = decode(b"definitely not an image container");
        assert!(matches!(result, Err(CleanError::Decode(_))));
    }

    #[test]
    fn test_decode_rejects_truncated_png() {
        let img = DynamicImage::ImageRgb8(image::RgbImage::new(32, 32));
        let bytes = png_bytes(img);
        let result = decode(&bytes[..bytes.len() / 2]);
        assert!(matches!(result, Err(CleanError::Decode(_))));
    }

    #[test]
    fn test_decode_expands_gray_source_to_rgb() {
        let gray = GrayImage::from_pixel(8, 8, Luma([77]));
        let bytes = png_bytes(DynamicImage::ImageLuma8(gray));

        let rgb = decode(&bytes).unwrap();
        assert_eq!(rgb.dimensions(), (8, 8));
        assert_eq!(rgb.get_pixel(3, 3).0, [77, 77, 77]);
    }

    #[test]
    fn test_encode_produces_valid_jpeg() {
        let img = GrayImage::from_pixel(16, 16, Luma([200]));
        let bytes = encode_jpeg(&img, 95).unwrap();

        let format = image::guess_format(&bytes).unwrap();
        assert_eq!(format, ImageFormat::Jpeg);

        let decoded = image::load_from_memory(&bytes).unwrap();
        assert_eq!(decoded.width(), 16);
        assert_eq!(decoded.height(), 16);
    }
}
