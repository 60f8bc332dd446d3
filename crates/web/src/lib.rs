//! Browser front-end for the uploader.
//!
//! Binds the upload page's DOM to `client_core::UploadController`: the drop
//! zone, file input and browse link feed the input dispatcher, the page's
//! elements render the session, and requests go out through `fetch`.
//! Only the element ids and styles compile on native targets.

pub mod page;

#[cfg(target_arch = "wasm32")]
mod blob;
#[cfg(target_arch = "wasm32")]
mod dom;
#[cfg(target_arch = "wasm32")]
mod events;
#[cfg(target_arch = "wasm32")]
mod fetch;

#[cfg(target_arch = "wasm32")]
use wasm_bindgen::prelude::*;

#[cfg(target_arch = "wasm32")]
#[wasm_bindgen(start)]
pub fn start() -> Result<(), JsValue> {
    use std::rc::Rc;

    use client_core::UploadController;
    use shared::protocol::remove_route;

    console_error_panic_hook::set_once();

    let window = web_sys::window().ok_or_else(|| JsValue::from_str("no window"))?;
    let document = window
        .document()
        .ok_or_else(|| JsValue::from_str("no document"))?;

    let surface = Rc::new(dom::DomSurface::from_document(&document)?);
    let controller = Rc::new(UploadController::new(
        Rc::new(fetch::FetchProcessor::new(remove_route())),
        surface.clone(),
        Rc::new(blob::BlobUrlStore),
    ));
    events::bind(&document, surface, controller)?;

    web_sys::console::log_1(&"uploader ready".into());
    Ok(())
}
