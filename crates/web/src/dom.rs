use client_core::{ObjectUrl, PresentationSurface};
use shared::protocol::PROCESSING_STATUS;
use wasm_bindgen::{JsCast, JsValue};
use web_sys::{Document, HtmlAnchorElement, HtmlElement, HtmlImageElement, HtmlInputElement};

use crate::page::{
    drop_zone_style, preview_display, DOWNLOAD_ID, DRAGOVER_CLASS, DROP_ID, EMPTY_HREF,
    FILE_INFO_ID, FILE_INPUT_ID, HIDDEN_CLASS, PREVIEW_ID, PROCESSING_CLASS, PROGRESS_ID,
};

/// The upload page's elements, written to by the controller.
pub struct DomSurface {
    pub drop: HtmlElement,
    pub input: HtmlInputElement,
    preview: HtmlImageElement,
    progress: HtmlElement,
    download: HtmlAnchorElement,
    file_info: HtmlElement,
}

fn element<T: JsCast>(document: &Document, id: &str) -> Result<T, JsValue> {
    document
        .get_element_by_id(id)
        .ok_or_else(|| JsValue::from_str(&format!("missing #{id}")))?
        .dyn_into::<T>()
        .map_err(|_| JsValue::from_str(&format!("#{id} is not the expected element type")))
}

/// DOM writes only fail on detached or malformed nodes; the page keeps going.
fn report(result: Result<(), JsValue>, action: &str) {
    if let Err(err) = result {
        web_sys::console::warn_2(&format!("dom: {action} failed").into(), &err);
    }
}

fn set_class(element: &HtmlElement, class: &str, on: bool) {
    let classes = element.class_list();
    let result = if on {
        classes.add_1(class)
    } else {
        classes.remove_1(class)
    };
    report(result, "class update");
}

impl DomSurface {
    pub fn from_document(document: &Document) -> Result<Self, JsValue> {
        Ok(Self {
            drop: element(document, DROP_ID)?,
            input: element(document, FILE_INPUT_ID)?,
            preview: element(document, PREVIEW_ID)?,
            progress: element(document, PROGRESS_ID)?,
            download: element(document, DOWNLOAD_ID)?,
            file_info: element(document, FILE_INFO_ID)?,
        })
    }

    pub fn set_drag_affordance(&self, active: bool) {
        set_class(&self.drop, DRAGOVER_CLASS, active);
    }

    fn set_preview(&self, src: &str, visible: bool) {
        self.preview.set_src(src);
        report(
            self.preview
                .style()
                .set_property("display", preview_display(visible)),
            "preview display",
        );
    }
}

impl PresentationSurface for DomSurface {
    fn reset(&self) {
        self.set_preview("", false);
        set_class(&self.progress, HIDDEN_CLASS, true);
        set_class(&self.progress, PROCESSING_CLASS, false);
        set_class(&self.download, HIDDEN_CLASS, true);
        self.download.set_href(EMPTY_HREF);
        self.file_info.set_text_content(Some(""));
        set_class(&self.file_info, HIDDEN_CLASS, true);
    }

    fn alert(&self, message: &str) {
        if let Some(window) = web_sys::window() {
            report(window.alert_with_message(message), "alert");
        }
    }

    fn show_file_info(&self, label: &str) {
        self.file_info.set_text_content(Some(label));
        set_class(&self.file_info, HIDDEN_CLASS, false);
    }

    fn show_preview(&self, url: &ObjectUrl) {
        self.set_preview(url.as_str(), true);
    }

    fn show_processing(&self) {
        set_class(&self.progress, HIDDEN_CLASS, false);
        self.progress.set_text_content(Some(PROCESSING_STATUS));
        set_class(&self.progress, PROCESSING_CLASS, true);
    }

    fn set_busy(&self, busy: bool) {
        self.input.set_disabled(busy);
        let style = self.drop.style();
        for (property, value) in drop_zone_style(busy) {
            report(style.set_property(property, value), "drop zone style");
        }
        if !busy {
            set_class(&self.progress, PROCESSING_CLASS, false);
        }
    }

    fn show_result(&self, url: &ObjectUrl) {
        self.set_preview(url.as_str(), true);
        self.download.set_href(url.as_str());
        set_class(&self.download, HIDDEN_CLASS, false);
        set_class(&self.progress, HIDDEN_CLASS, true);
    }

    fn show_error(&self, status: &str) {
        self.progress.set_text_content(Some(status));
    }
}
