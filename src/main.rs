use clap::Parser;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

mod cleaner;
mod config;
mod error;
mod server;

#[derive(Parser, Debug)]
#[command(name = "scanclean-server")]
#[command(about = "Web service that cleans noisy document scans for OCR")]
#[command(version)]
pub struct Args {
    /// Host address to bind to
    #[arg(long, env = "SCANCLEAN_HOST", default_value = "127.0.0.1")]
    pub host: String,

    /// Port to listen on
    #[arg(long, env = "SCANCLEAN_PORT", default_value = "8350")]
    pub port: u16,

    /// Maximum upload size in bytes (default: 50MB)
    #[arg(long, env = "SCANCLEAN_MAX_FILE_SIZE", default_value = "52428800")]
    pub max_file_size: usize,

    /// Non-local-means filter strength (higher removes more noise)
    #[arg(long, env = "SCANCLEAN_DENOISE_STRENGTH", default_value = "30.0")]
    pub denoise_strength: f32,

    /// Adaptive threshold neighborhood size in pixels (odd, > 1)
    #[arg(long, env = "SCANCLEAN_BLOCK_SIZE", default_value = "35")]
    pub block_size: u32,

    /// Constant subtracted from the local mean when thresholding
    #[arg(long, env = "SCANCLEAN_THRESHOLD_CONSTANT", default_value = "15.0")]
    pub threshold_constant: f32,

    /// Output upscale factor applied to both dimensions
    #[arg(long, env = "SCANCLEAN_SCALE_FACTOR", default_value = "2")]
    pub scale_factor: u32,

    /// JPEG quality of the processed image (1-100)
    #[arg(long, env = "SCANCLEAN_JPEG_QUALITY", default_value = "95")]
    pub jpeg_quality: u8,

    /// Log level (trace, debug, info, warn, error)
    #[arg(long, env = "RUST_LOG", default_value = "info")]
    pub log_level: String,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let args = Args::parse();

    // Initialize tracing
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| args.log_level.clone().into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    let config = config::Config::from(args);

    tracing::info!("Starting scanclean-server v{}", env!("CARGO_PKG_VERSION"));
    tracing::info!("Binding to {}:{}", config.host, config.port);

    server::run(config).await
}
