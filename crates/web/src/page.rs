//! Element ids, class names and inline styles the upload page is built from.

pub const DROP_ID: &str = "drop";
pub const FILE_INPUT_ID: &str = "file";
pub const PREVIEW_ID: &str = "preview";
pub const PROGRESS_ID: &str = "progress";
pub const DOWNLOAD_ID: &str = "downloadBtn";
pub const FILE_INFO_ID: &str = "fileInfo";
pub const BROWSE_SELECTOR: &str = ".browse-btn";

pub const HIDDEN_CLASS: &str = "hidden";
pub const PROCESSING_CLASS: &str = "processing";
pub const DRAGOVER_CLASS: &str = "dragover";

/// `href` the download link falls back to when there is nothing to download.
pub const EMPTY_HREF: &str = "#";

/// Inline styles applied to the drop zone while a request is (or is not) outstanding.
pub fn drop_zone_style(busy: bool) -> [(&'static str, &'static str); 2] {
    if busy {
        [("pointer-events", "none"), ("opacity", "0.6")]
    } else {
        [("pointer-events", "auto"), ("opacity", "1")]
    }
}

pub fn preview_display(visible: bool) -> &'static str {
    if visible {
        "block"
    } else {
        "none"
    }
}
