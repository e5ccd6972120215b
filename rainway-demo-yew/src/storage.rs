use gloo::storage::{LocalStorage, Storage};
use rainway_demo_core::KeyValueStore;

/// `KeyValueStore` backed by the browser's `localStorage`
///
/// Values are kept as plain strings, not JSON, so entries written by other
/// builds of the demo read back unchanged.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct LocalStorageStore;

impl KeyValueStore for LocalStorageStore {
    fn get(&self, key: &str) -> Option<String> {
        match LocalStorage::raw().get_item(key) {
            Ok(value) => value,
            Err(e) => {
                tracing::warn!("Could not read '{}': {:?}", key, e);
                None
            }
        }
    }

    fn set(&self, key: &str, value: &str) {
        if let Err(e) = LocalStorage::raw().set_item(key, value) {
            tracing::warn!("Could not persist '{}': {:?}", key, e);
        }
    }

    fn remove(&self, key: &str) {
        LocalStorage::delete(key);
    }
}
