//! In-process object URL store for non-browser front-ends and tests.

use std::{
    cell::{Cell, RefCell},
    collections::HashMap,
};

use anyhow::Result;
use bytes::Bytes;
use tracing::warn;

use crate::{ObjectUrl, ObjectUrlStore};

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StoredObject {
    pub bytes: Bytes,
    pub content_type: String,
}

#[derive(Debug, Default)]
pub struct MemoryUrlStore {
    next_id: Cell<u64>,
    created: Cell<u64>,
    live: RefCell<HashMap<ObjectUrl, StoredObject>>,
}

impl MemoryUrlStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn resolve(&self, url: &ObjectUrl) -> Option<StoredObject> {
        self.live.borrow().get(url).cloned()
    }

    pub fn live_count(&self) -> usize {
        self.live.borrow().len()
    }

    pub fn created_count(&self) -> u64 {
        self.created.get()
    }
}

impl ObjectUrlStore for MemoryUrlStore {
    fn create(&self, bytes: &Bytes, content_type: &str) -> Result<ObjectUrl> {
        let id = self.next_id.get() + 1;
        self.next_id.set(id);
        self.created.set(self.created.get() + 1);

        let url = ObjectUrl::new(format!("blob:memory/{id}"));
        self.live.borrow_mut().insert(
            url.clone(),
            StoredObject {
                bytes: bytes.clone(),
                content_type: content_type.to_string(),
            },
        );
        Ok(url)
    }

    fn revoke(&self, url: &ObjectUrl) {
        if self.live.borrow_mut().remove(url).is_none() {
            warn!(%url, "object url revoked twice or never created");
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn create_resolve_revoke() {
        let store = MemoryUrlStore::new();
        let url = store
            .create(&Bytes::from_static(b"png"), "image/png")
            .expect("create");
        assert_eq!(
            store.resolve(&url),
            Some(StoredObject {
                bytes: Bytes::from_static(b"png"),
                content_type: "image/png".to_string(),
            })
        );
        assert_eq!(store.live_count(), 1);

        store.revoke(&url);
        assert_eq!(store.resolve(&url), None);
        assert_eq!(store.live_count(), 0);
        assert_eq!(store.created_count(), 1);
    }

    #[test]
    fn urls_are_unique() {
        let store = MemoryUrlStore::new();
        let a = store.create(&Bytes::new(), "image/png").expect("a");
        let b = store.create(&Bytes::new(), "image/png").expect("b");
        assert_ne!(a, b);
    }
}
