use crate::cleaner::PipelineParameters;
use crate::Args;

/// Server configuration
#[derive(Debug, Clone)]
pub struct Config {
    pub host: String,
    pub port: u16,
    pub max_file_size: usize,
    pub pipeline: PipelineParameters,
}

impl From<Args> for Config {
    fn from(args: Args) -> Self {
        Self {
            host: args.host,
            port: args.port,
            max_file_size: args.max_file_size,
            pipeline: PipelineParameters {
                denoise_strength: args.denoise_strength,
                block_size: args.block_size,
                threshold_constant: args.threshold_constant,
                scale_factor: args.scale_factor,
                jpeg_quality: args.jpeg_quality,
            },
        }
    }
}
