//! Persistence of the one value that survives a reload: the name of the
//! wallet the user last selected.

use std::{cell::RefCell, collections::HashMap};

/// Storage key the connector persists the selected wallet name under.
pub const SELECTED_WALLET_KEY: &str = "aptos_connector_selected_wallet";

/// A string key-value store. The browser implementation sits on
/// localStorage; hosts without one can use [`MemoryStore`].
pub trait SelectionStore {
    fn get(&self, key: &str) -> Option<String>;
    fn set(&self, key: &str, value: &str);
    fn remove(&self, key: &str);
}

/// In-memory store, for tests and headless hosts.
#[derive(Debug, Default)]
pub struct MemoryStore {
    entries: RefCell<HashMap<String, String>>,
}

impl SelectionStore for MemoryStore {
    fn get(&self, key: &str) -> Option<String> {
        self.entries.borrow().get(key).cloned()
    }

    fn set(&self, key: &str, value: &str) {
        self.entries
            .borrow_mut()
            .insert(key.to_owned(), value.to_owned());
    }

    fn remove(&self, key: &str) {
        self.entries.borrow_mut().remove(key);
    }
}

#[cfg(target_arch = "wasm32")]
pub use self::local::LocalStorageStore;

#[cfg(target_arch = "wasm32")]
mod local {
    use super::SelectionStore;

    /// localStorage-backed store. Storage can be unavailable (private
    /// browsing, sandboxed frames); failures degrade to "nothing persisted"
    /// with a warning rather than surfacing to the caller.
    #[derive(Debug, Default, Clone, Copy)]
    pub struct LocalStorageStore;

    impl LocalStorageStore {
        pub fn new() -> Self {
            LocalStorageStore
        }

        fn storage() -> Option<web_sys::Storage> {
            web_sys::window()?.local_storage().ok().flatten()
        }
    }

    impl SelectionStore for LocalStorageStore {
        fn get(&self, key: &str) -> Option<String> {
            Self::storage()?.get_item(key).ok().flatten()
        }

        fn set(&self, key: &str, value: &str) {
            match Self::storage() {
                Some(storage) => {
                    if storage.set_item(key, value).is_err() {
                        log::warn!("couldn't persist `{key}' to localStorage");
                    }
                }
                None => log::warn!("no localStorage available to persist `{key}'"),
            }
        }

        fn remove(&self, key: &str) {
            if let Some(storage) = Self::storage() {
                let _ = storage.remove_item(key);
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn memory_store_round_trip() {
        let store = MemoryStore::default();

        assert_eq!(store.get(SELECTED_WALLET_KEY), None);

        store.set(SELECTED_WALLET_KEY, "Petra");
        assert_eq!(store.get(SELECTED_WALLET_KEY).as_deref(), Some("Petra"));

        store.remove(SELECTED_WALLET_KEY);
        assert_eq!(store.get(SELECTED_WALLET_KEY), None);
    }
}
