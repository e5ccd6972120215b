use crate::storage::LocalStorageStore;
use rainway_demo_core::KeyValueStore;
use yew::prelude::*;

/// Text field value mirrored to `localStorage` under `key`
///
/// Returns the current value and a setter that persists every change.
#[hook]
pub fn use_persisted(key: String, initial: String) -> (UseStateHandle<String>, Callback<String>) {
    let value = use_state(|| initial);

    let set = {
        let value = value.clone();
        Callback::from(move |next: String| {
            LocalStorageStore.set(&key, &next);
            value.set(next);
        })
    };

    (value, set)
}
