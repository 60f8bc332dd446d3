use bytes::Bytes;
use serde::{Deserialize, Serialize};

const IMAGE_MEDIA_PREFIX: &str = "image/";
pub const DEFAULT_RESULT_CONTENT_TYPE: &str = "application/octet-stream";

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Phase {
    #[default]
    Idle,
    Previewing,
    Uploading,
    Success,
    Error,
}

impl Phase {
    /// `Success` and `Error` end a submission; the next submit starts over.
    pub fn is_terminal(self) -> bool {
        matches!(self, Phase::Success | Phase::Error)
    }
}

/// A user-supplied file: declared media type plus its full contents.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SelectedFile {
    pub name: String,
    pub media_type: String,
    pub bytes: Bytes,
}

impl SelectedFile {
    pub fn new(
        name: impl Into<String>,
        media_type: impl Into<String>,
        bytes: impl Into<Bytes>,
    ) -> Self {
        Self {
            name: name.into(),
            media_type: media_type.into(),
            bytes: bytes.into(),
        }
    }

    pub fn size(&self) -> u64 {
        self.bytes.len() as u64
    }

    pub fn is_image(&self) -> bool {
        is_image_media_type(&self.media_type)
    }

    pub fn label(&self) -> String {
        format_file_label(&self.name, self.size())
    }
}

/// Bytes returned by the remote processor on success.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ProcessedImage {
    pub bytes: Bytes,
    pub content_type: String,
}

impl ProcessedImage {
    pub fn new(bytes: impl Into<Bytes>, content_type: Option<&str>) -> Self {
        let content_type = content_type
            .map(str::trim)
            .filter(|value| !value.is_empty())
            .unwrap_or(DEFAULT_RESULT_CONTENT_TYPE);
        Self {
            bytes: bytes.into(),
            content_type: content_type.to_string(),
        }
    }
}

pub fn is_image_media_type(media_type: &str) -> bool {
    media_type.starts_with(IMAGE_MEDIA_PREFIX)
}

/// `"cat.png (50.0 KB)"`: size in kibibytes with one decimal place.
pub fn format_file_label(name: &str, size_bytes: u64) -> String {
    format!("{name} ({:.1} KB)", size_bytes as f64 / 1024.0)
}
