use std::{fmt, future::Future, rc::Rc};

use anyhow::Result;
use async_trait::async_trait;
use bytes::Bytes;
use shared::{
    domain::{is_image_media_type, Phase, ProcessedImage, SelectedFile},
    error::{ClassifiedError, ErrorKind},
    protocol::INVALID_FILE_ALERT,
};
use thiserror::Error;
use tokio::sync::Mutex;
use tracing::{debug, info, warn};

pub mod dispatch;
#[cfg(not(target_arch = "wasm32"))]
pub mod http;
pub mod memory;
pub mod settings;

pub use dispatch::{dispatch, ActivationControl, DispatchAction, InputGesture, DROP_ZONE_CONTROL};
#[cfg(not(target_arch = "wasm32"))]
pub use http::HttpProcessor;
pub use memory::MemoryUrlStore;
pub use settings::ClientSettings;

/// Revocable local reference to in-memory bytes backing a preview or download.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct ObjectUrl(String);

impl ObjectUrl {
    pub fn new(url: impl Into<String>) -> Self {
        Self(url.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for ObjectUrl {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum ProcessError {
    #[error("server rejected image ({status}): {message}")]
    Rejected { status: u16, message: String },
    #[error("{0}")]
    Transport(String),
}

#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum SubmitError {
    #[error("not an image file (media type {media_type:?})")]
    Validation { media_type: String },
    #[error("an upload is already in progress")]
    Busy,
    #[error("processing failed: {message}")]
    Processing { status: u16, message: String },
    #[error("transport failed: {0}")]
    Transport(String),
    #[error("response arrived for a superseded session")]
    Superseded,
}

impl SubmitError {
    /// Maps onto the user-facing taxonomy; `Busy` and `Superseded` never reach the user.
    pub fn classified(&self) -> Option<ClassifiedError> {
        match self {
            SubmitError::Validation { .. } => Some(ClassifiedError::new(
                ErrorKind::Validation,
                INVALID_FILE_ALERT,
            )),
            SubmitError::Processing { message, .. } => {
                Some(ClassifiedError::new(ErrorKind::Processing, message.clone()))
            }
            SubmitError::Transport(message) => {
                Some(ClassifiedError::new(ErrorKind::Transport, message.clone()))
            }
            SubmitError::Busy | SubmitError::Superseded => None,
        }
    }
}

/// The opaque service that transforms an image.
#[async_trait(?Send)]
pub trait RemoteProcessor {
    async fn process(&self, file: &SelectedFile) -> Result<ProcessedImage, ProcessError>;
}

/// Passive views the controller writes to. Implementations never call back into the controller.
pub trait PresentationSurface {
    /// Clears preview, file info, progress and download affordances.
    fn reset(&self);
    fn alert(&self, message: &str);
    fn show_file_info(&self, label: &str);
    fn show_preview(&self, url: &ObjectUrl);
    fn show_processing(&self);
    /// Disables the file input and drop surface while `busy` is true.
    fn set_busy(&self, busy: bool);
    /// Renders the result in place of the preview, points the download at it and hides progress.
    fn show_result(&self, url: &ObjectUrl);
    fn show_error(&self, status: &str);
}

pub trait ObjectUrlStore {
    fn create(&self, bytes: &Bytes, content_type: &str) -> Result<ObjectUrl>;
    fn revoke(&self, url: &ObjectUrl);
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct UploadSession {
    pub phase: Phase,
    pub generation: u64,
    pub file_label: Option<String>,
    pub preview_url: Option<ObjectUrl>,
    pub result_url: Option<ObjectUrl>,
    pub error_message: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SessionOutcome {
    pub result_url: ObjectUrl,
    pub content_type: String,
    pub size_bytes: u64,
}

/// Owns the single upload session and sequences submit → request → resolution.
pub struct UploadController {
    processor: Rc<dyn RemoteProcessor>,
    surface: Rc<dyn PresentationSurface>,
    urls: Rc<dyn ObjectUrlStore>,
    inner: Mutex<UploadSession>,
}

impl UploadController {
    pub fn new(
        processor: Rc<dyn RemoteProcessor>,
        surface: Rc<dyn PresentationSurface>,
        urls: Rc<dyn ObjectUrlStore>,
    ) -> Self {
        Self {
            processor,
            surface,
            urls,
            inner: Mutex::new(UploadSession::default()),
        }
    }

    pub async fn phase(&self) -> Phase {
        self.inner.lock().await.phase
    }

    pub async fn snapshot(&self) -> UploadSession {
        self.inner.lock().await.clone()
    }

    /// Runs one submission to completion. The only suspension point is the processor call.
    pub async fn submit(&self, file: SelectedFile) -> Result<SessionOutcome, SubmitError> {
        if !file.is_image() {
            return Err(self.reject_non_image(&file.name, file.media_type));
        }

        let generation = self.begin_session(&file).await?;
        info!(
            generation,
            name = %file.name,
            size_bytes = file.size(),
            "upload: request sent"
        );
        let response = self.processor.process(&file).await;
        self.finish_session(generation, response).await
    }

    /// Like [`submit`](Self::submit) for files whose bytes still have to be loaded.
    ///
    /// The declared media type and the busy state are checked before `read`
    /// runs. A failed read is reported on the surface as a transport error and
    /// leaves the session untouched.
    pub async fn submit_deferred<R>(
        &self,
        name: &str,
        media_type: &str,
        read: R,
    ) -> Result<SessionOutcome, SubmitError>
    where
        R: Future<Output = Result<Bytes>>,
    {
        if !is_image_media_type(media_type) {
            return Err(self.reject_non_image(name, media_type.to_string()));
        }
        if self.phase().await == Phase::Uploading {
            warn!(name, "upload: submission ignored while a request is outstanding");
            return Err(SubmitError::Busy);
        }

        match read.await {
            Ok(bytes) => self.submit(SelectedFile::new(name, media_type, bytes)).await,
            Err(error) => {
                let message = format!("could not read {name}: {error:#}");
                let classified = ClassifiedError::new(ErrorKind::Transport, &message);
                warn!(%classified, "upload: selected file unreadable");
                self.surface.show_error(&classified.status_text());
                Err(SubmitError::Transport(message))
            }
        }
    }

    fn reject_non_image(&self, name: &str, media_type: String) -> SubmitError {
        warn!(name, %media_type, "upload: rejected non-image file");
        self.surface.alert(INVALID_FILE_ALERT);
        SubmitError::Validation { media_type }
    }

    async fn begin_session(&self, file: &SelectedFile) -> Result<u64, SubmitError> {
        let mut guard = self.inner.lock().await;
        if guard.phase == Phase::Uploading {
            warn!(
                generation = guard.generation,
                name = %file.name,
                "upload: submission ignored while a request is outstanding"
            );
            return Err(SubmitError::Busy);
        }

        self.release_urls(&mut guard);
        self.surface.reset();
        guard.generation += 1;
        guard.error_message = None;
        guard.phase = Phase::Previewing;

        let label = file.label();
        self.surface.show_file_info(&label);
        guard.file_label = Some(label);
        match self.urls.create(&file.bytes, &file.media_type) {
            Ok(url) => {
                self.surface.show_preview(&url);
                guard.preview_url = Some(url);
            }
            Err(error) => warn!(%error, "upload: preview unavailable"),
        }

        guard.phase = Phase::Uploading;
        self.surface.show_processing();
        self.surface.set_busy(true);
        Ok(guard.generation)
    }

    async fn finish_session(
        &self,
        generation: u64,
        response: Result<ProcessedImage, ProcessError>,
    ) -> Result<SessionOutcome, SubmitError> {
        let mut guard = self.inner.lock().await;
        if guard.generation != generation {
            debug!(
                generation,
                current = guard.generation,
                "upload: dropping response for superseded session"
            );
            return Err(SubmitError::Superseded);
        }

        self.surface.set_busy(false);
        let image = match response {
            Ok(image) => image,
            Err(ProcessError::Rejected { status, message }) => {
                self.enter_error(&mut guard, ErrorKind::Processing, &message);
                return Err(SubmitError::Processing { status, message });
            }
            Err(ProcessError::Transport(message)) => {
                self.enter_error(&mut guard, ErrorKind::Transport, &message);
                return Err(SubmitError::Transport(message));
            }
        };

        let result_url = match self.urls.create(&image.bytes, &image.content_type) {
            Ok(url) => url,
            Err(error) => {
                let message = format!("could not store processed image: {error}");
                self.enter_error(&mut guard, ErrorKind::Transport, &message);
                return Err(SubmitError::Transport(message));
            }
        };

        self.surface.show_result(&result_url);
        guard.result_url = Some(result_url.clone());
        guard.phase = Phase::Success;
        info!(
            generation,
            content_type = %image.content_type,
            size_bytes = image.bytes.len(),
            "upload: processed image ready"
        );
        Ok(SessionOutcome {
            result_url,
            content_type: image.content_type,
            size_bytes: image.bytes.len() as u64,
        })
    }

    fn enter_error(&self, session: &mut UploadSession, kind: ErrorKind, message: &str) {
        let error = ClassifiedError::new(kind, message);
        warn!(generation = session.generation, %error, "upload: session failed");
        self.surface.show_error(&error.status_text());
        session.error_message = Some(error.message);
        session.phase = Phase::Error;
    }

    fn release_urls(&self, session: &mut UploadSession) {
        for url in [session.preview_url.take(), session.result_url.take()]
            .into_iter()
            .flatten()
        {
            self.urls.revoke(&url);
        }
        session.file_label = None;
    }
}

#[cfg(test)]
#[path = "tests/lib_tests.rs"]
mod tests;
