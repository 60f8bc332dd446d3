//! Browser remote processor: multipart `POST` through `window.fetch`.

use async_trait::async_trait;
use client_core::{ProcessError, RemoteProcessor};
use js_sys::Uint8Array;
use shared::{
    domain::{ProcessedImage, SelectedFile},
    error::error_message_from_body,
    protocol::IMAGE_FIELD,
};
use wasm_bindgen::{JsCast, JsValue};
use wasm_bindgen_futures::JsFuture;
use web_sys::{FormData, Request, RequestInit, Response};

use crate::blob::{js_message, to_blob};

pub struct FetchProcessor {
    endpoint: String,
}

impl FetchProcessor {
    /// `endpoint` may be relative to the page origin.
    pub fn new(endpoint: impl Into<String>) -> Self {
        Self {
            endpoint: endpoint.into(),
        }
    }

    async fn send(&self, file: &SelectedFile) -> Result<Response, JsValue> {
        let form = FormData::new()?;
        let blob = to_blob(&file.bytes, &file.media_type)?;
        form.append_with_blob_and_filename(IMAGE_FIELD, &blob, &file.name)?;

        let init = RequestInit::new();
        init.set_method("POST");
        init.set_body(&form);
        let request = Request::new_with_str_and_init(&self.endpoint, &init)?;

        let window = web_sys::window().ok_or_else(|| JsValue::from_str("no window"))?;
        let response = JsFuture::from(window.fetch_with_request(&request)).await?;
        response.dyn_into::<Response>()
    }
}

async fn body_bytes(response: &Response) -> Result<Vec<u8>, JsValue> {
    let buffer = JsFuture::from(response.array_buffer()?).await?;
    Ok(Uint8Array::new(&buffer).to_vec())
}

fn transport(error: JsValue) -> ProcessError {
    ProcessError::Transport(js_message(&error))
}

#[async_trait(?Send)]
impl RemoteProcessor for FetchProcessor {
    async fn process(&self, file: &SelectedFile) -> Result<ProcessedImage, ProcessError> {
        let response = self.send(file).await.map_err(transport)?;

        if !response.ok() {
            let body = body_bytes(&response).await.unwrap_or_default();
            return Err(ProcessError::Rejected {
                status: response.status(),
                message: error_message_from_body(&body),
            });
        }

        let content_type = response.headers().get("content-type").ok().flatten();
        let bytes = body_bytes(&response).await.map_err(transport)?;
        Ok(ProcessedImage::new(bytes, content_type.as_deref()))
    }
}
