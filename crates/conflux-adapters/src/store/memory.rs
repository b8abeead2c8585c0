//! In-memory object store.

use std::{
    collections::HashMap,
    sync::{Arc, RwLock},
};

use async_trait::async_trait;
use chrono::Utc;
use conflux_core::{
    application::{ports::ObjectStore, StoreError},
    domain::{LabelSelector, ObjectKind, StoredObject},
};

type ObjectKey = (ObjectKind, String, String);

/// Thread-safe in-memory object store.
///
/// Clones share the same objects.
#[derive(Clone, Default)]
pub struct InMemoryObjectStore {
    inner: Arc<RwLock<HashMap<ObjectKey, StoredObject>>>,
}

impl InMemoryObjectStore {
    /// Create a new empty store.
    pub fn new() -> Self {
        Self::default()
    }

    /// Get the number of stored objects.
    pub fn len(&self) -> usize {
        self.inner.read().map(|inner| inner.len()).unwrap_or(0)
    }

    /// Check if store is empty.
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Remove every object.
    pub fn clear(&self) -> Result<(), StoreError> {
        self.inner.write().map_err(|_| lock_error())?.clear();
        Ok(())
    }
}

fn key(kind: ObjectKind, namespace: &str, name: &str) -> ObjectKey {
    (kind, namespace.to_string(), name.to_string())
}

fn lock_error() -> StoreError {
    StoreError::Backend("the in-memory store lock is poisoned".into())
}

#[async_trait]
impl ObjectStore for InMemoryObjectStore {
    async fn get(
        &self,
        kind: ObjectKind,
        namespace: &str,
        name: &str,
    ) -> Result<StoredObject, StoreError> {
        let inner = self.inner.read().map_err(|_| lock_error())?;
        inner
            .get(&key(kind, namespace, name))
            .cloned()
            .ok_or_else(|| StoreError::NotFound {
                kind: kind.to_string(),
                namespace: namespace.into(),
                name: name.into(),
            })
    }

    async fn list(
        &self,
        kind: ObjectKind,
        namespace: &str,
        selector: &LabelSelector,
    ) -> Result<Vec<StoredObject>, StoreError> {
        let inner = self.inner.read().map_err(|_| lock_error())?;
        let mut objects: Vec<StoredObject> = inner
            .values()
            .filter(|o| o.kind == kind && o.namespace == namespace && selector.matches(&o.labels))
            .cloned()
            .collect();
        objects.sort_by(|a, b| a.name.cmp(&b.name));
        Ok(objects)
    }

    async fn apply(&self, mut object: StoredObject) -> Result<StoredObject, StoreError> {
        let mut inner = self.inner.write().map_err(|_| lock_error())?;
        let key = key(object.kind, &object.namespace, &object.name);
        object.create_time = inner
            .get(&key)
            .and_then(|existing| existing.create_time)
            .or(object.create_time)
            .or_else(|| Some(Utc::now()));
        inner.insert(key, object.clone());
        Ok(object)
    }

    async fn delete(
        &self,
        kind: ObjectKind,
        namespace: &str,
        name: &str,
    ) -> Result<(), StoreError> {
        let mut inner = self.inner.write().map_err(|_| lock_error())?;
        inner
            .remove(&key(kind, namespace, name))
            .map(|_| ())
            .ok_or_else(|| StoreError::NotFound {
                kind: kind.to_string(),
                namespace: namespace.into(),
                name: name.into(),
            })
    }
}
