use image::{GrayImage, Luma};

/// Patch ("template window") radius: patches are 7x7.
const PATCH_RADIUS: i64 = 3;
/// Search window radius: candidates come from a 21x21 area.
const SEARCH_RADIUS: i64 = 10;

/// Non-local-means denoising with filter strength `h`.
///
/// Each output pixel is a weighted average of the candidates in its
/// search window, weighted by how similar the patch around each
/// candidate is to the patch around the pixel itself. Averaging
/// similar neighborhoods from across the image suppresses scan grain
/// without flattening thin text strokes the way a plain local blur
/// would.
///
/// Patch distances are computed in O(1) per pixel from an integral
/// image of squared differences between the raster and its shifted
/// self, rebuilt once per search offset.
pub fn apply(image: &GrayImage, strength: f32) -> GrayImage {
    let (width, height) = image.dimensions();
    if width == 0 || height == 0 {
        return image.clone();
    }

    let w = width as i64;
    let h = height as i64;
    let n = (width * height) as usize;

    let weights = weight_table(strength);

    let mut value_sum = vec![0.0f32; n];
    let mut weight_sum = vec![0.0f32; n];
    // Reused across offsets; row 0 and column 0 stay zero.
    let mut integral = vec![0.0f64; ((w + 1) * (h + 1)) as usize];

    for dy in -SEARCH_RADIUS..=SEARCH_RADIUS {
        for dx in -SEARCH_RADIUS..=SEARCH_RADIUS {
            accumulate_offset(
                image,
                dx,
                dy,
                &weights,
                &mut integral,
                &mut value_sum,
                &mut weight_sum,
            );
        }
    }

    GrayImage::from_fn(width, height, |x, y| {
        let i = (y as i64 * w + x as i64) as usize;
        let averaged = value_sum[i] / weight_sum[i];
        Luma([averaged.round().clamp(0.0, 255.0) as u8])
    })
}

/// exp(-d / h^2) tabulated over every possible mean squared patch
/// difference d in 0..=255^2.
fn weight_table(strength: f32) -> Vec<f32> {
    let h2 = strength * strength;
    (0..=255u32 * 255)
        .map(|d| (-(d as f32) / h2).exp())
        .collect()
}

/// Fold one search-window offset into the running weighted averages.
fn accumulate_offset(
    image: &GrayImage,
    dx: i64,
    dy: i64,
    weights: &[f32],
    integral: &mut [f64],
    value_sum: &mut [f32],
    weight_sum: &mut [f32],
) {
    let w = image.width() as i64;
    let h = image.height() as i64;
    let stride = (w + 1) as usize;

    // Integral image of (I(p) - I(p + offset))^2. The shifted
    // coordinate is clamped to the raster, so border patches compare
    // against replicated edge pixels.
    for y in 0..h {
        let sy = (y + dy).clamp(0, h - 1) as u32;
        for x in 0..w {
            let sx = (x + dx).clamp(0, w - 1) as u32;
            let a = image.get_pixel(x as u32, y as u32).0[0] as f64;
            let b = image.get_pixel(sx, sy).0[0] as f64;
            let d = a - b;
            let idx = (y as usize + 1) * stride + x as usize + 1;
            integral[idx] =
                d * d + integral[idx - stride] + integral[idx - 1] - integral[idx - stride - 1];
        }
    }

    for y in 0..h {
        let sy = (y + dy).clamp(0, h - 1) as u32;
        for x in 0..w {
            let x1 = (x - PATCH_RADIUS).max(0) as usize;
            let y1 = (y - PATCH_RADIUS).max(0) as usize;
            let x2 = (x + PATCH_RADIUS).min(w - 1) as usize + 1;
            let y2 = (y + PATCH_RADIUS).min(h - 1) as usize + 1;
            let area = ((x2 - x1) * (y2 - y1)) as f64;

            let sum = integral[y2 * stride + x2] - integral[y1 * stride + x2]
                - integral[y2 * stride + x1]
                + integral[y1 * stride + x1];
            let mean_sq_diff = (sum / area).round() as usize;
            let weight = weights[mean_sq_diff.min(weights.len() - 1)];

            let sx = (x + dx).clamp(0, w - 1) as u32;
            let i = (y * w + x) as usize;
            weight_sum[i] += weight;
            value_sum[i] += weight * image.get_pixel(sx, sy).0[0] as f32;
        }
    }
}
