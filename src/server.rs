use crate::cleaner::Pipeline;
use crate::config::Config;
use crate::error::CleanError;
use axum::{
    body::Bytes,
    extract::{DefaultBodyLimit, Multipart, State},
    http::{header, StatusCode},
    response::{Html, IntoResponse, Json, Response},
    routing::get,
    Router,
};
use serde::Serialize;
use std::sync::Arc;
use std::time::Instant;
use tower_http::trace::TraceLayer;

/// Input extensions accepted at the upload boundary (case-insensitive)
const ALLOWED_EXTENSIONS: [&str; 7] = ["png", "jpg", "jpeg", "webp", "bmp", "tiff", "gif"];

/// Suffix replacing the original extension in the download name
const OUTPUT_SUFFIX: &str = "_clean.jpg";

/// Shared application state
#[derive(Clone)]
pub struct AppState {
    pub pipeline: Arc<Pipeline>,
    pub config: Arc<Config>,
}

/// Health check response
#[derive(Serialize)]
pub struct HealthResponse {
    pub status: String,
    pub version: String,
}

/// Server info response
#[derive(Serialize)]
pub struct InfoResponse {
    pub version: String,
    pub allowed_extensions: Vec<String>,
    pub max_file_size_bytes: usize,
}

/// Run the HTTP server
pub async fn run(config: Config) -> anyhow::Result<()> {
    let pipeline = Pipeline::new(config.pipeline)?;
    let addr = format!("{}:{}", config.host, config.port);
    let max_file_size = config.max_file_size;

    let state = AppState {
        pipeline: Arc::new(pipeline),
        config: Arc::new(config),
    };

    let app = Router::new()
        .route("/", get(handle_form).post(handle_upload))
        .route("/health", get(handle_health))
        .route("/info", get(handle_info))
        .layer(DefaultBodyLimit::max(max_file_size))
        .layer(TraceLayer::new_for_http())
        .with_state(state);

    let listener = tokio::net::TcpListener::bind(&addr).await?;
    tracing::info!("Server listening on http://{}", addr);

    axum::serve(listener, app).await?;

    Ok(())
}

const UPLOAD_TEMPLATE: &str = r#"<!doctype html>
<html lang="en">
<head>
  <meta charset="utf-8">
  <title>Clean Noisy Scan</title>
  <link href="https://cdn.jsdelivr.net/npm/bootstrap@5.3.3/dist/css/bootstrap.min.css"
        rel="stylesheet">
</head>
<body class="bg-light py-5">
  <div class="container">
    <h1 class="mb-4 text-center">Clean Noisy Scan for OCR</h1>
{alert}
    <form method="POST" enctype="multipart/form-data" class="card p-4 shadow-sm">
      <div class="mb-3">
        <input class="form-control" type="file" name="image" required>
      </div>
      <button class="btn btn-primary">Process &amp; Download</button>
    </form>
  </div>
</body>
</html>
"#;

/// Render the upload page, with an optional one-shot warning alert.
pub fn upload_page(warning: Option<&str>) -> String {
    let alert = warning
        .map(|msg| format!(r#"    <div class="alert alert-warning">{msg}</div>"#))
        .unwrap_or_default();
    UPLOAD_TEMPLATE.replace("{alert}", &alert)
}

/// Processed image, served as a file download
struct ImageDownload {
    data: Vec<u8>,
    filename: String,
}

impl IntoResponse for ImageDownload {
    fn into_response(self) -> Response {
        (
            StatusCode::OK,
            [
                (header::CONTENT_TYPE, "image/jpeg".to_string()),
                (
                    header::CONTENT_DISPOSITION,
                    format!("attachment; filename=\"{}\"", self.filename),
                ),
            ],
            self.data,
        )
            .into_response()
    }
}

/// Serve the upload form
async fn handle_form() -> impl IntoResponse {
    Html(upload_page(None))
}

/// Accept an uploaded scan, clean it, return it as a download
async fn handle_upload(
    State(state): State<AppState>,
    mut multipart: Multipart,
) -> Result<ImageDownload, CleanError> {
    let start = Instant::now();

    let mut file_name: Option<String> = None;
    let mut file_data: Option<Bytes> = None;

    // Parse multipart form
    while let Some(field) = multipart
        .next_field()
        .await
        .map_err(|e| CleanError::InvalidRequest(format!("Failed to parse multipart: {}", e)))?
    {
        let name = field.name().unwrap_or_default().to_string();

        match name.as_str() {
            "image" => {
                file_name = field.file_name().map(|s| s.to_string());
                file_data = Some(field.bytes().await.map_err(|e| {
                    CleanError::InvalidRequest(format!("Failed to read file data: {}", e))
                })?);
            }
            _ => {
                // Ignore unknown fields
            }
        }
    }

    let original_name = file_name
        .filter(|n| !n.is_empty())
        .ok_or(CleanError::MissingFile)?;
    let data = file_data.ok_or(CleanError::MissingFile)?;

    if !has_allowed_extension(&original_name) {
        return Err(CleanError::UnsupportedFileType(original_name));
    }

    if data.len() > state.config.max_file_size {
        return Err(CleanError::ImageTooLarge {
            size: data.len(),
            max: state.config.max_file_size,
        });
    }

    let download_name = output_name(&sanitize_filename(&original_name));
    let input_len = data.len();

    // The pipeline is CPU-bound; run it on the blocking pool so
    // concurrent uploads do not stall the async workers.
    let pipeline = state.pipeline.clone();
    let cleaned = tokio::task::spawn_blocking(move || pipeline.clean_scan(&data))
        .await
        .map_err(|e| CleanError::Internal(format!("Pipeline task failed: {}", e)))??;

    tracing::info!(
        "Cleaned {} in {}ms: {} bytes in, {} bytes out",
        download_name,
        start.elapsed().as_millis(),
        input_len,
        cleaned.len()
    );

    Ok(ImageDownload {
        data: cleaned,
        filename: download_name,
    })
}

/// Handle health check requests
async fn handle_health() -> impl IntoResponse {
    Json(HealthResponse {
        status: "ok".to_string(),
        version: env!("CARGO_PKG_VERSION").to_string(),
    })
}

/// Handle info requests
async fn handle_info(State(state): State<AppState>) -> impl IntoResponse {
    Json(InfoResponse {
        version: env!("CARGO_PKG_VERSION").to_string(),
        allowed_extensions: ALLOWED_EXTENSIONS.iter().map(|e| e.to_string()).collect(),
        max_file_size_bytes: state.config.max_file_size,
    })
}

fn has_allowed_extension(filename: &str) -> bool {
    std::path::Path::new(filename)
        .extension()
        .and_then(|e| e.to_str())
        .map(|e| ALLOWED_EXTENSIONS.contains(&e.to_ascii_lowercase().as_str()))
        .unwrap_or(false)
}

/// Strip path components and anything outside [A-Za-z0-9._-] from a
/// client-supplied filename.
fn sanitize_filename(filename: &str) -> String {
    let base = filename.rsplit(['/', '\\']).next().unwrap_or(filename);
    let cleaned: String = base
        .chars()
        .filter(|c| c.is_ascii_alphanumeric() || matches!(c, '.' | '_' | '-'))
        .collect();

    if cleaned.trim_matches('.').is_empty() {
        "scan".to_string()
    } else {
        cleaned
    }
}

/// Replace the original extension with the fixed output suffix.
fn output_name(filename: &str) -> String {
    let stem = filename
        .rsplit_once('.')
        .map(|(stem, _)| stem)
        .unwrap_or(filename);
    format!("{stem}{OUTPUT_SUFFIX}")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_allowed_extensions_case_insensitive() {
        assert!(has_allowed_extension("scan.png"));
        assert!(has_allowed_extension("scan.JPG"));
        assert!(has_allowed_extension("scan.TiFf"));
    }

    #[test]
    fn test_disallowed_extensions_rejected() {
        assert!(!has_allowed_extension("notes.txt"));
        assert!(!has_allowed_extension("archive.pdf"));
        assert!(!has_allowed_extension("no_extension"));
        assert!(!has_allowed_extension(""));
    }

    #[test]
    fn test_sanitize_strips_path_components() {
        assert_eq!(sanitize_filename("../../etc/passwd"), "passwd");
        assert_eq!(sanitize_filename("C:\\Users\\me\\scan.png"), "scan.png");
    }

    #[test]
    fn test_sanitize_strips_unsafe_characters() {
        assert_eq!(sanitize_filename("my scan (1).png"), "myscan1.png");
    }

    #[test]
    fn test_sanitize_empty_falls_back() {
        assert_eq!(sanitize_filename("..."), "scan");
        assert_eq!(sanitize_filename("???"), "scan");
    }

    #[test]
    fn test_output_name_replaces_extension() {
        assert_eq!(output_name("scan.png"), "scan_clean.jpg");
        assert_eq!(output_name("page.tar.gif"), "page.tar_clean.jpg");
        assert_eq!(output_name("noext"), "noext_clean.jpg");
    }

    #[test]
    fn test_upload_page_includes_warning() {
        let page = upload_page(Some("No file selected."));
        assert!(page.contains("alert-warning"));
        assert!(page.contains("No file selected."));

        let clean = upload_page(None);
        assert!(!clean.contains("alert-warning"));
        assert!(clean.contains("<form"));
    }
}
