use image::{GrayImage, Luma};

/// Adaptive mean binarization.
///
/// Each pixel's threshold is the mean of its `block_size` x
/// `block_size` neighborhood minus `constant`; pixels above the
/// threshold become background white (255), the rest foreground black
/// (0). The local mean tracks illumination drift across the page,
/// which a single global threshold cannot.
///
/// `block_size` must be odd and greater than 1; the pipeline validates
/// this at construction.
pub fn apply(image: &GrayImage, block_size: u32, constant: f32) -> GrayImage {
    let (width, height) = image.dimensions();
    if width == 0 || height == 0 {
        return image.clone();
    }

    let radius = (block_size / 2) as i64;
    let w = width as i64;
    let h = height as i64;
    let stride = (w + 1) as usize;
    let integral = compute_integral(image);

    GrayImage::from_fn(width, height, |x, y| {
        let x = x as i64;
        let y = y as i64;
        let x1 = (x - radius).max(0) as usize;
        let y1 = (y - radius).max(0) as usize;
        let x2 = (x + radius).min(w - 1) as usize + 1;
        let y2 = (y + radius).min(h - 1) as usize + 1;
        let area = ((x2 - x1) * (y2 - y1)) as f64;

        let sum = integral[y2 * stride + x2] - integral[y1 * stride + x2]
            - integral[y2 * stride + x1]
            + integral[y1 * stride + x1];
        let threshold = sum / area - constant as f64;

        let pixel = image.get_pixel(x as u32, y as u32).0[0] as f64;
        if pixel > threshold {
            Luma([255u8])
        } else {
            Luma([0u8])
        }
    })
}

/// Summed-area table with a zero top row and left column, so any box
/// sum is a four-corner lookup.
fn compute_integral(img: &GrayImage) -> Vec<f64> {
    let (width, height) = img.dimensions();
    let stride = width as usize + 1;
    let mut integral = vec![0.0f64; stride * (height as usize + 1)];

    for y in 0..height as usize {
        for x in 0..width as usize {
            let val = img.get_pixel(x as u32, y as u32).0[0] as f64;
            let idx = (y + 1) * stride + x + 1;
            integral[idx] =
                val + integral[idx - stride] + integral[idx - 1] - integral[idx - stride - 1];
        }
    }

    integral
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_threshold_output_is_binary() {
        let img = GrayImage::from_fn(50, 50, |x, y| Luma([((x * 5 + y * 3) % 256) as u8]));

        let result = apply(&img, 35, 15.0);

        for pixel in result.pixels() {
            assert!(
                pixel.0[0] == 0 || pixel.0[0] == 255,
                "Expected binary pixel, got {}",
                pixel.0[0]
            );
        }
    }

    #[test]
    fn test_threshold_uniform_page_is_background() {
        // Every pixel equals its local mean, which is above mean - C.
        let img = GrayImage::from_pixel(40, 40, Luma([128]));

        let result = apply(&img, 35, 15.0);

        assert!(result.pixels().all(|p| p.0[0] == 255));
    }

    #[test]
    fn test_threshold_separates_text_from_background() {
        // Dark stroke on a light page.
        let mut img = GrayImage::from_pixel(50, 20, Luma([240]));
        for x in 10..40 {
            img.put_pixel(x, 10, Luma([20]));
        }

        let result = apply(&img, 35, 15.0);

        assert_eq!(result.get_pixel(25, 10).0[0], 0);
        assert_eq!(result.get_pixel(25, 5).0[0], 255);
    }

    #[test]
    fn test_threshold_compensates_for_uneven_lighting() {
        // Background ramps from 100 to 228 left to right; dark strokes
        // every 20 columns. A global cutoff would misclassify one side
        // of the page, the local mean keeps both sides correct.
        let img = GrayImage::from_fn(128, 40, |x, _| {
            if x % 20 == 10 {
                Luma([20])
            } else {
                Luma([(100 + x) as u8])
            }
        });

        let result = apply(&img, 35, 15.0);

        for x in (10..128).step_by(20) {
            assert_eq!(result.get_pixel(x, 20).0[0], 0, "stroke at x={}", x);
        }
        for x in [5u32, 45, 85, 125] {
            assert_eq!(result.get_pixel(x, 20).0[0], 255, "background at x={}", x);
        }
    }

    #[test]
    fn test_threshold_small_block_size() {
        let img = GrayImage::from_pixel(10, 10, Luma([200]));
        let result = apply(&img, 3, 15.0);
        assert!(result.pixels().all(|p| p.0[0] == 255));
    }
}
