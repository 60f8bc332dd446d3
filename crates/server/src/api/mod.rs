use std::{net::IpAddr, sync::Arc};

use axum::http::StatusCode;
use bytes::Bytes;
use shared::{
    error::ErrorBody,
    protocol::{FALLBACK_PROCESSING_ERROR, INVALID_TYPE_ERROR, NO_FILE_ERROR, RATE_LIMITED_ERROR},
};
use thiserror::Error;
use tracing::{error, info, warn};
use uuid::Uuid;

use crate::{processor::ImageProcessor, rate_limit::RateLimiter};

#[derive(Clone)]
pub struct ApiContext {
    pub processor: Arc<dyn ImageProcessor>,
    pub limiter: Arc<RateLimiter>,
    pub allowed_extensions: Arc<[String]>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct UploadedImage {
    pub filename: Option<String>,
    pub bytes: Bytes,
}

#[derive(Debug, Clone, Copy, Error, PartialEq, Eq)]
pub enum RemoveError {
    #[error("{}", NO_FILE_ERROR)]
    NoFile,
    #[error("{}", INVALID_TYPE_ERROR)]
    InvalidType,
    #[error("{}", RATE_LIMITED_ERROR)]
    RateLimited,
    #[error("{}", FALLBACK_PROCESSING_ERROR)]
    ProcessingFailed,
}

impl RemoveError {
    pub fn status(self) -> StatusCode {
        match self {
            RemoveError::NoFile | RemoveError::InvalidType => StatusCode::BAD_REQUEST,
            RemoveError::RateLimited => StatusCode::TOO_MANY_REQUESTS,
            RemoveError::ProcessingFailed => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }

    pub fn body(self) -> ErrorBody {
        ErrorBody::new(self.to_string())
    }
}

/// Requires a dotted name whose last extension is allow-listed (case-insensitive).
pub fn allowed_file(filename: &str, allowed_extensions: &[String]) -> bool {
    let Some((_, ext)) = filename.rsplit_once('.') else {
        return false;
    };
    let ext = ext.to_ascii_lowercase();
    allowed_extensions.iter().any(|allowed| *allowed == ext)
}

pub async fn admit(ctx: &ApiContext, peer: Option<IpAddr>) -> Result<(), RemoveError> {
    if ctx.limiter.try_acquire(peer).await {
        Ok(())
    } else {
        warn!(?peer, "remove: rate limit exceeded");
        Err(RemoveError::RateLimited)
    }
}

pub async fn remove_background(
    ctx: &ApiContext,
    request_id: Uuid,
    upload: Option<UploadedImage>,
) -> Result<Vec<u8>, RemoveError> {
    let upload = upload.ok_or(RemoveError::NoFile)?;
    let filename = upload
        .filename
        .as_deref()
        .map(str::trim)
        .filter(|name| !name.is_empty())
        .ok_or(RemoveError::InvalidType)?;
    if !allowed_file(filename, &ctx.allowed_extensions) {
        info!(%request_id, filename, "remove: rejected file type");
        return Err(RemoveError::InvalidType);
    }

    info!(
        %request_id,
        filename,
        size_bytes = upload.bytes.len(),
        "remove: processing image"
    );
    ctx.processor.process(upload.bytes).await.map_err(|error| {
        error!(%request_id, filename, error = %format!("{error:#}"), "remove: processing failed");
        RemoveError::ProcessingFailed
    })
}

#[cfg(test)]
#[path = "tests/mod_tests.rs"]
mod tests;
