//! Wires page events through the input dispatcher.

use std::rc::Rc;

use anyhow::anyhow;
use client_core::{dispatch, DispatchAction, InputGesture, UploadController, DROP_ZONE_CONTROL};
use wasm_bindgen::{closure::Closure, convert::FromWasmAbi, JsCast, JsValue};
use web_sys::{Document, DragEvent, Event, EventTarget, File, FileList, KeyboardEvent};

use crate::{
    blob::{js_message, read_file_bytes},
    dom::DomSurface,
    page::BROWSE_SELECTOR,
};

struct Page {
    surface: Rc<DomSurface>,
    controller: Rc<UploadController>,
}

impl Page {
    fn apply(&self, event: &Event, actions: Vec<DispatchAction<File>>) {
        for action in actions {
            match action {
                DispatchAction::PreventDefault => event.prevent_default(),
                DispatchAction::SetDragAffordance(active) => {
                    self.surface.set_drag_affordance(active)
                }
                DispatchAction::OpenPicker => self.surface.input.click(),
                DispatchAction::Submit(file) => self.submit(file),
            }
        }
    }

    fn submit(&self, file: File) {
        let controller = self.controller.clone();
        wasm_bindgen_futures::spawn_local(async move {
            let read = async {
                read_file_bytes(&file)
                    .await
                    .map_err(|err| anyhow!(js_message(&err)))
            };
            if let Err(error) = controller
                .submit_deferred(&file.name(), &file.type_(), read)
                .await
            {
                web_sys::console::log_1(&format!("upload ended: {error}").into());
            }
        });
    }
}

fn files(list: Option<FileList>) -> Vec<File> {
    let Some(list) = list else {
        return Vec::new();
    };
    (0..list.length()).filter_map(|index| list.get(index)).collect()
}

fn listen<E, F>(target: &EventTarget, kind: &str, handler: F) -> Result<(), JsValue>
where
    E: FromWasmAbi + 'static,
    F: FnMut(E) + 'static,
{
    let closure = Closure::wrap(Box::new(handler) as Box<dyn FnMut(E)>);
    target.add_event_listener_with_callback(kind, closure.as_ref().unchecked_ref())?;
    // Listeners live as long as the page.
    closure.forget();
    Ok(())
}

pub fn bind(
    document: &Document,
    surface: Rc<DomSurface>,
    controller: Rc<UploadController>,
) -> Result<(), JsValue> {
    let page = Rc::new(Page {
        surface: surface.clone(),
        controller,
    });

    let drop = &surface.drop;
    drop.set_tab_index(DROP_ZONE_CONTROL.tab_index);
    drop.set_attribute("role", DROP_ZONE_CONTROL.role)?;
    drop.set_attribute("aria-label", DROP_ZONE_CONTROL.aria_label)?;

    let p = page.clone();
    listen(drop, "dragover", move |event: DragEvent| {
        p.apply(&event, dispatch(InputGesture::DragOver));
    })?;

    let p = page.clone();
    listen(drop, "dragleave", move |event: DragEvent| {
        p.apply(&event, dispatch(InputGesture::DragLeave));
    })?;

    let p = page.clone();
    listen(drop, "drop", move |event: DragEvent| {
        let dropped = files(event.data_transfer().and_then(|transfer| transfer.files()));
        p.apply(&event, dispatch(InputGesture::Drop(dropped)));
    })?;

    let p = page.clone();
    listen(drop, "keydown", move |event: KeyboardEvent| {
        p.apply(&event, dispatch(InputGesture::KeyDown(event.key())));
    })?;

    let p = page.clone();
    listen(&surface.input, "change", move |event: Event| {
        let picked = files(p.surface.input.files());
        p.apply(&event, dispatch(InputGesture::PickerChanged(picked)));
    })?;

    match document.query_selector(BROWSE_SELECTOR)? {
        Some(browse) => {
            let p = page.clone();
            listen(&browse, "click", move |event: Event| {
                p.apply(&event, dispatch(InputGesture::BrowseClicked));
            })?;
        }
        None => web_sys::console::warn_1(&format!("no {BROWSE_SELECTOR} on page").into()),
    }
    Ok(())
}
