use serde::{Deserialize, Serialize};

/// Multipart field carrying the image on `POST /remove`.
pub const IMAGE_FIELD: &str = "image";
pub const PROCESSED_FILENAME: &str = "no_bg.png";

pub const INVALID_FILE_ALERT: &str = "Please select an image file.";
pub const PROCESSING_STATUS: &str = "Processing...";
pub const FALLBACK_PROCESSING_ERROR: &str = "Failed to process image";
pub const NO_FILE_ERROR: &str = "No file uploaded";
pub const INVALID_TYPE_ERROR: &str = "Invalid file type";
pub const RATE_LIMITED_ERROR: &str = "Too many requests";

pub fn remove_route() -> &'static str {
    "/remove"
}

pub fn health_route() -> &'static str {
    "/healthz"
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct HealthResponse {
    pub status: String,
}

impl HealthResponse {
    pub fn ok() -> Self {
        Self {
            status: "ok".to_string(),
        }
    }
}
