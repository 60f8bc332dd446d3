//! Normalizes drag-drop, file-picker and keyboard gestures into a single submit.
//!
//! Dispatching is stateless: the caller applies the returned actions to its
//! own surface and forwards `Submit` to the controller.

/// A raw gesture from one of the input sources. `F` is the platform's file handle.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum InputGesture<F> {
    DragOver,
    DragLeave,
    Drop(Vec<F>),
    PickerChanged(Vec<F>),
    /// Key pressed while an activation control has focus; carries `KeyboardEvent.key`.
    KeyDown(String),
    BrowseClicked,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum DispatchAction<F> {
    PreventDefault,
    SetDragAffordance(bool),
    OpenPicker,
    Submit(F),
}

/// Attributes that make a non-button element keyboard operable.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ActivationControl {
    pub tab_index: i32,
    pub role: &'static str,
    pub aria_label: &'static str,
}

pub const DROP_ZONE_CONTROL: ActivationControl = ActivationControl {
    tab_index: 0,
    role: "button",
    aria_label: "Upload image by clicking or dragging and dropping",
};

pub fn is_activation_key(key: &str) -> bool {
    matches!(key, "Enter" | " ")
}

pub fn dispatch<F>(gesture: InputGesture<F>) -> Vec<DispatchAction<F>> {
    match gesture {
        InputGesture::DragOver => vec![
            DispatchAction::PreventDefault,
            DispatchAction::SetDragAffordance(true),
        ],
        InputGesture::DragLeave => vec![DispatchAction::SetDragAffordance(false)],
        // Only the first file of a multi-file drop is used.
        InputGesture::Drop(files) => {
            let mut actions = vec![
                DispatchAction::PreventDefault,
                DispatchAction::SetDragAffordance(false),
            ];
            actions.extend(files.into_iter().next().map(DispatchAction::Submit));
            actions
        }
        InputGesture::PickerChanged(files) => files
            .into_iter()
            .next()
            .map(DispatchAction::Submit)
            .into_iter()
            .collect(),
        InputGesture::KeyDown(key) if is_activation_key(&key) => {
            vec![DispatchAction::PreventDefault, DispatchAction::OpenPicker]
        }
        InputGesture::KeyDown(_) => Vec::new(),
        InputGesture::BrowseClicked => {
            vec![DispatchAction::PreventDefault, DispatchAction::OpenPicker]
        }
    }
}
