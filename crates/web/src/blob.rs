use anyhow::{anyhow, Result};
use bytes::Bytes;
use client_core::{ObjectUrl, ObjectUrlStore};
use js_sys::{Array, Uint8Array};
use wasm_bindgen::{JsCast, JsValue};
use wasm_bindgen_futures::JsFuture;
use web_sys::{Blob, BlobPropertyBag, File, Url};

/// Object URLs backed by browser `Blob`s.
pub struct BlobUrlStore;

impl ObjectUrlStore for BlobUrlStore {
    fn create(&self, bytes: &Bytes, content_type: &str) -> Result<ObjectUrl> {
        let blob = to_blob(bytes, content_type).map_err(|err| anyhow!(js_message(&err)))?;
        let url = Url::create_object_url_with_blob(&blob).map_err(|err| anyhow!(js_message(&err)))?;
        Ok(ObjectUrl::new(url))
    }

    fn revoke(&self, url: &ObjectUrl) {
        if let Err(err) = Url::revoke_object_url(url.as_str()) {
            web_sys::console::warn_2(&"failed to revoke object url".into(), &err);
        }
    }
}

pub fn to_blob(bytes: &[u8], content_type: &str) -> Result<Blob, JsValue> {
    let parts = Array::of1(&Uint8Array::from(bytes));
    let options = BlobPropertyBag::new();
    options.set_type(content_type);
    Blob::new_with_u8_array_sequence_and_options(&parts, &options)
}

/// Copies a picked or dropped file into memory.
pub async fn read_file_bytes(file: &File) -> Result<Bytes, JsValue> {
    let buffer = JsFuture::from(file.array_buffer()).await?;
    Ok(Bytes::from(Uint8Array::new(&buffer).to_vec()))
}

/// Best-effort text for a thrown JS value.
pub fn js_message(value: &JsValue) -> String {
    if let Some(text) = value.as_string() {
        return text;
    }
    match value.dyn_ref::<js_sys::Error>() {
        Some(error) => String::from(error.message()),
        None => format!("{value:?}"),
    }
}
