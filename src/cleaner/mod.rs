//! Scan-cleaning pipeline
//!
//! Turns raw encoded image bytes into a binarized, upscaled JPEG
//! suitable for downstream OCR.

pub mod codec;
pub mod pipeline;
pub mod steps;

pub use pipeline::{Pipeline, PipelineParameters};
