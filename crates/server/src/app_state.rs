use std::sync::Arc;

use crate::{
    api::ApiContext, config::Settings, processor::ImageProcessor, rate_limit::RateLimiter,
};

#[derive(Clone)]
pub(crate) struct AppState {
    pub(crate) api: ApiContext,
    pub(crate) max_upload_bytes: usize,
    pub(crate) static_dir: String,
}

impl AppState {
    pub(crate) fn new(settings: &Settings, processor: Arc<dyn ImageProcessor>) -> Self {
        Self {
            api: ApiContext {
                processor,
                limiter: Arc::new(RateLimiter::new(
                    settings.rate_limit_per_minute,
                    settings.rate_limit_per_hour,
                )),
                allowed_extensions: settings.allowed_extensions.iter().cloned().collect(),
            },
            max_upload_bytes: settings.max_upload_bytes,
            static_dir: settings.static_dir.clone(),
        }
    }
}
