//! Native remote processor: multipart `POST` over reqwest.

use async_trait::async_trait;
use reqwest::{
    header::CONTENT_TYPE,
    multipart::{Form, Part},
    Client,
};
use shared::{
    domain::{ProcessedImage, SelectedFile},
    error::error_message_from_body,
    protocol::IMAGE_FIELD,
};
use tracing::debug;
use url::Url;

use crate::{settings::ClientSettings, ProcessError, RemoteProcessor};

pub struct HttpProcessor {
    http: Client,
    endpoint: Url,
}

impl HttpProcessor {
    pub fn new(endpoint: Url) -> Self {
        Self {
            http: Client::new(),
            endpoint,
        }
    }

    pub fn from_settings(settings: &ClientSettings) -> Self {
        Self::new(settings.endpoint_url.clone())
    }

    pub fn endpoint(&self) -> &Url {
        &self.endpoint
    }
}

fn transport(error: impl std::fmt::Display) -> ProcessError {
    ProcessError::Transport(error.to_string())
}

#[async_trait(?Send)]
impl RemoteProcessor for HttpProcessor {
    async fn process(&self, file: &SelectedFile) -> Result<ProcessedImage, ProcessError> {
        let part = Part::bytes(file.bytes.to_vec())
            .file_name(file.name.clone())
            .mime_str(&file.media_type)
            .map_err(transport)?;
        let form = Form::new().part(IMAGE_FIELD, part);

        let response = self
            .http
            .post(self.endpoint.clone())
            .multipart(form)
            .send()
            .await
            .map_err(transport)?;

        let status = response.status();
        debug!(%status, endpoint = %self.endpoint, "processor responded");
        if !status.is_success() {
            let body = response.bytes().await.unwrap_or_default();
            return Err(ProcessError::Rejected {
                status: status.as_u16(),
                message: error_message_from_body(&body),
            });
        }

        let content_type = response
            .headers()
            .get(CONTENT_TYPE)
            .and_then(|value| value.to_str().ok())
            .map(str::to_owned);
        let bytes = response.bytes().await.map_err(transport)?;
        Ok(ProcessedImage::new(bytes, content_type.as_deref()))
    }
}

#[cfg(test)]
#[path = "tests/http_tests.rs"]
mod tests;
