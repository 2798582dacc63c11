use axum::{
    http::StatusCode,
    response::{Html, IntoResponse, Response},
};
use thiserror::Error;

#[derive(Error, Debug)]
pub enum CleanError {
    #[error("Failed to decode image: {0}")]
    Decode(String),

    #[error("Failed to encode image: {0}")]
    Encode(String),

    #[error("Invalid pipeline parameters: {0}")]
    InvalidParameters(String),

    #[error("Image too large: {size} bytes (max: {max} bytes)")]
    ImageTooLarge { size: usize, max: usize },

    #[error("Missing file in request")]
    MissingFile,

    #[error("Unsupported file type: {0}")]
    UnsupportedFileType(String),

    #[error("Invalid request: {0}")]
    InvalidRequest(String),

    #[error("Internal error: {0}")]
    Internal(String),
}

impl IntoResponse for CleanError {
    fn into_response(self) -> Response {
        // Validation failures the user can act on re-render the upload
        // form with a one-shot warning; everything else is a plain
        // status response.
        match &self {
            CleanError::MissingFile => warning_page("No file selected."),
            CleanError::UnsupportedFileType(_) => warning_page("Unsupported file type."),
            CleanError::Decode(_) => warning_page("Could not read that file as an image."),
            CleanError::ImageTooLarge { .. } => {
                (StatusCode::PAYLOAD_TOO_LARGE, self.to_string()).into_response()
            }
            CleanError::InvalidRequest(_) => {
                (StatusCode::BAD_REQUEST, self.to_string()).into_response()
            }
            CleanError::Encode(_)
            | CleanError::InvalidParameters(_)
            | CleanError::Internal(_) => {
                tracing::error!("request failed: {}", self);
                (
                    StatusCode::INTERNAL_SERVER_ERROR,
                    "Internal server error".to_string(),
                )
                    .into_response()
            }
        }
    }
}

fn warning_page(message: &str) -> Response {
    (
        StatusCode::BAD_REQUEST,
        Html(crate::server::upload_page(Some(message))),
    )
        .into_response()
}
