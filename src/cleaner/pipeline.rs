use crate::error::CleanError;
use std::time::Instant;

use super::codec;
use super::steps;

/// Numeric constants governing each pipeline stage.
///
/// Fixed for the lifetime of the server; requests cannot override them.
#[derive(Debug, Clone, Copy)]
pub struct PipelineParameters {
    /// Non-local-means filter strength (`h`). Higher removes more noise.
    pub denoise_strength: f32,
    /// Side length of the adaptive threshold neighborhood. Odd, > 1.
    pub block_size: u32,
    /// Subtracted from the local mean to form each pixel's threshold.
    pub threshold_constant: f32,
    /// Multiplier applied to both output dimensions.
    pub scale_factor: u32,
    /// Quality of the re-encoded JPEG (1-100).
    pub jpeg_quality: u8,
}

impl Default for PipelineParameters {
    fn default() -> Self {
        Self {
            denoise_strength: 30.0,
            block_size: 35,
            threshold_constant: 15.0,
            scale_factor: 2,
            jpeg_quality: 95,
        }
    }
}

impl PipelineParameters {
    /// Reject parameter values the stages cannot honor.
    pub fn validate(&self) -> Result<(), CleanError> {
        if self.block_size < 3 || self.block_size % 2 == 0 {
            return Err(CleanError::InvalidParameters(format!(
                "threshold block size must be odd and greater than 1, got {}",
                self.block_size
            )));
        }
        if !self.denoise_strength.is_finite() || self.denoise_strength <= 0.0 {
            return Err(CleanError::InvalidParameters(format!(
                "denoise strength must be positive, got {}",
                self.denoise_strength
            )));
        }
        if self.scale_factor == 0 {
            return Err(CleanError::InvalidParameters(
                "scale factor must be at least 1".to_string(),
            ));
        }
        if self.jpeg_quality == 0 || self.jpeg_quality > 100 {
            return Err(CleanError::InvalidParameters(format!(
                "JPEG quality must be in 1-100, got {}",
                self.jpeg_quality
            )));
        }
        Ok(())
    }
}

/// The scan-cleaning pipeline.
///
/// Holds no state between invocations: `clean_scan` is a pure function
/// of the input bytes and the parameters fixed at construction, so
/// concurrent invocations need no locking.
pub struct Pipeline {
    params: PipelineParameters,
}

impl Pipeline {
    /// Create a pipeline, validating parameters up front so the stages
    /// never re-check them.
    pub fn new(params: PipelineParameters) -> Result<Self, CleanError> {
        params.validate()?;
        Ok(Self { params })
    }

    /// Clean one scanned image: decode, grayscale, denoise, binarize,
    /// upscale, re-encode as JPEG. Any stage failure aborts the whole
    /// invocation.
    pub fn clean_scan(&self, bytes: &[u8]) -> Result<Vec<u8>, CleanError> {
        let start = Instant::now();

        let rgb = timed("decode", || codec::decode(bytes))?;
        let gray = timed("grayscale", || steps::grayscale::apply(&rgb));
        let denoised = timed("denoise", || {
            steps::denoise::apply(&gray, self.params.denoise_strength)
        });
        let binary = timed("threshold", || {
            steps::threshold::apply(
                &denoised,
                self.params.block_size,
                self.params.threshold_constant,
            )
        });
        let upscaled = timed("upscale", || {
            steps::upscale::apply(&binary, self.params.scale_factor)
        });
        let encoded = timed("encode", || {
            codec::encode_jpeg(&upscaled, self.params.jpeg_quality)
        })?;

        tracing::debug!(
            "Cleaned scan in {}ms: {} bytes in, {} bytes out",
            start.elapsed().as_millis(),
            bytes.len(),
            encoded.len()
        );

        Ok(encoded)
    }
}

fn timed<T, F: FnOnce() -> T>(name: &str, f: F) -> T {
    let step_start = Instant::now();
    let result = f();
    tracing::debug!(
        "Stage {} completed in {}ms",
        name,
        step_start.elapsed().as_millis()
    );
    result
}
