//! File-backed object store.
//!
//! Every object is one pretty-printed JSON file:
//!
//! ```text
//! <root>/
//! ├── config/
//! │   └── default/
//! │       └── integration-template-nacos-config.json
//! └── secret/
//!     └── conflux-system/
//!         └── nacos-server.json
//! ```
//!
//! Every write goes to its own temporary file that is renamed over the
//! target, so a reader never sees a partially written object and concurrent
//! writers of one object resolve as last-write-wins.

use std::io::{self, Write};
use std::path::{Path, PathBuf};

use async_trait::async_trait;
use chrono::Utc;
use conflux_core::{
    application::{ports::ObjectStore, StoreError},
    domain::{LabelSelector, ObjectKind, StoredObject},
};
use tokio::fs;
use tracing::{debug, warn};

const EXTENSION: &str = "json";

/// [`ObjectStore`] keeping objects as JSON files under a root directory.
#[derive(Debug, Clone)]
pub struct FileObjectStore {
    root: PathBuf,
}

impl FileObjectStore {
    /// Create a store rooted at `root`. The directory is created on first write.
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self { root: root.into() }
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    fn namespace_dir(&self, kind: ObjectKind, namespace: &str) -> Result<PathBuf, StoreError> {
        check_segment("namespace", namespace)?;
        Ok(self.root.join(kind.as_str()).join(namespace))
    }

    fn object_path(
        &self,
        kind: ObjectKind,
        namespace: &str,
        name: &str,
    ) -> Result<PathBuf, StoreError> {
        check_segment("name", name)?;
        Ok(self
            .namespace_dir(kind, namespace)?
            .join(format!("{name}.{EXTENSION}")))
    }

    async fn read_object(&self, path: &Path) -> io::Result<StoredObject> {
        let raw = fs::read(path).await?;
        serde_json::from_slice(&raw).map_err(|e| io::Error::new(io::ErrorKind::InvalidData, e))
    }
}

/// Object and namespace names become path segments.
fn check_segment(what: &str, value: &str) -> Result<(), StoreError> {
    let invalid = value.is_empty()
        || value == "."
        || value == ".."
        || value.contains(['/', '\\'])
        || value.starts_with('.');
    if invalid {
        return Err(StoreError::Backend(format!("invalid {what} '{value}'")));
    }
    Ok(())
}

/// Write `body` to a uniquely named temp file in `dir`, then rename it over
/// `target`. The temp file is removed when the rename fails.
fn write_atomically(dir: &Path, target: &Path, body: &[u8]) -> io::Result<()> {
    let mut temp = tempfile::Builder::new()
        .prefix(".")
        .suffix(".tmp")
        .tempfile_in(dir)?;
    temp.write_all(body)?;
    temp.as_file().sync_all()?;
    temp.persist(target).map_err(|e| e.error)?;
    Ok(())
}

fn not_found(kind: ObjectKind, namespace: &str, name: &str) -> StoreError {
    StoreError::NotFound {
        kind: kind.to_string(),
        namespace: namespace.into(),
        name: name.into(),
    }
}

fn backend(path: &Path, e: impl std::fmt::Display) -> StoreError {
    StoreError::Backend(format!("{}: {}", path.display(), e))
}

#[async_trait]
impl ObjectStore for FileObjectStore {
    async fn get(
        &self,
        kind: ObjectKind,
        namespace: &str,
        name: &str,
    ) -> Result<StoredObject, StoreError> {
        let path = self.object_path(kind, namespace, name)?;
        self.read_object(&path).await.map_err(|e| match e.kind() {
            io::ErrorKind::NotFound => not_found(kind, namespace, name),
            _ => backend(&path, e),
        })
    }

    async fn list(
        &self,
        kind: ObjectKind,
        namespace: &str,
        selector: &LabelSelector,
    ) -> Result<Vec<StoredObject>, StoreError> {
        let dir = self.namespace_dir(kind, namespace)?;
        let mut entries = match fs::read_dir(&dir).await {
            Ok(entries) => entries,
            Err(e) if e.kind() == io::ErrorKind::NotFound => return Ok(Vec::new()),
            Err(e) => return Err(backend(&dir, e)),
        };

        let mut objects = Vec::new();
        while let Some(entry) = entries.next_entry().await.map_err(|e| backend(&dir, e))? {
            let path = entry.path();
            if path.extension().and_then(|e| e.to_str()) != Some(EXTENSION) {
                continue;
            }
            match self.read_object(&path).await {
                Ok(object) if selector.matches(&object.labels) => objects.push(object),
                Ok(_) => {}
                Err(e) => warn!(path = %path.display(), error = %e, "Skipping unreadable object"),
            }
        }
        objects.sort_by(|a, b| a.name.cmp(&b.name));
        Ok(objects)
    }

    async fn apply(&self, mut object: StoredObject) -> Result<StoredObject, StoreError> {
        let path = self.object_path(object.kind, &object.namespace, &object.name)?;
        let existing_create_time = match self.read_object(&path).await {
            Ok(existing) => existing.create_time,
            Err(_) => None,
        };
        object.create_time = existing_create_time
            .or(object.create_time)
            .or_else(|| Some(Utc::now()));

        let dir = path
            .parent()
            .map(Path::to_path_buf)
            .unwrap_or_else(|| self.root.clone());
        fs::create_dir_all(&dir)
            .await
            .map_err(|e| backend(&dir, e))?;

        let body = serde_json::to_vec_pretty(&object).map_err(|e| backend(&path, e))?;
        let target = path.clone();
        tokio::task::spawn_blocking(move || write_atomically(&dir, &target, &body))
            .await
            .map_err(|e| backend(&path, e))?
            .map_err(|e| backend(&path, e))?;

        debug!(path = %path.display(), "Wrote object");
        Ok(object)
    }

    async fn delete(
        &self,
        kind: ObjectKind,
        namespace: &str,
        name: &str,
    ) -> Result<(), StoreError> {
        let path = self.object_path(kind, namespace, name)?;
        fs::remove_file(&path).await.map_err(|e| match e.kind() {
            io::ErrorKind::NotFound => not_found(kind, namespace, name),
            _ => backend(&path, e),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    fn integration(namespace: &str, name: &str) -> StoredObject {
        let mut object = StoredObject::new(ObjectKind::Secret, namespace, name);
        object
            .labels
            .insert("conflux.io/catalog".into(), "integration".into());
        object
            .data
            .insert("input-properties".into(), r#"{"host":"h"}"#.into());
        object
    }

    fn entries(dir: &Path) -> Vec<String> {
        let mut names: Vec<String> = std::fs::read_dir(dir)
            .unwrap()
            .map(|e| e.unwrap().file_name().to_string_lossy().into_owned())
            .collect();
        names.sort();
        names
    }

    #[tokio::test]
    async fn objects_are_stored_as_json_files() {
        let dir = TempDir::new().unwrap();
        let store = FileObjectStore::new(dir.path());

        store.apply(integration("default", "cache-1")).await.unwrap();

        assert_eq!(
            entries(&dir.path().join("secret/default")),
            vec!["cache-1.json"]
        );

        let loaded = store
            .get(ObjectKind::Secret, "default", "cache-1")
            .await
            .unwrap();
        assert_eq!(loaded.data["input-properties"], r#"{"host":"h"}"#);
        assert!(loaded.create_time.is_some());
    }

    #[tokio::test(flavor = "multi_thread", worker_threads = 4)]
    async fn concurrent_applies_of_one_object_all_land() {
        let dir = TempDir::new().unwrap();
        let store = FileObjectStore::new(dir.path());

        let writers: Vec<_> = (0..64)
            .map(|i| {
                let store = store.clone();
                tokio::spawn(async move {
                    let mut object = integration("default", "cache-1");
                    object
                        .data
                        .insert("input-properties".into(), format!(r#"{{"host":"h{i}"}}"#));
                    store.apply(object).await
                })
            })
            .collect();
        for writer in writers {
            writer.await.unwrap().unwrap();
        }

        let loaded = store
            .get(ObjectKind::Secret, "default", "cache-1")
            .await
            .unwrap();
        assert!(loaded.data["input-properties"].starts_with(r#"{"host":"h"#));
        assert_eq!(
            entries(&dir.path().join("secret/default")),
            vec!["cache-1.json"]
        );
    }

    #[tokio::test]
    async fn failed_write_leaves_no_temp_file() {
        let dir = TempDir::new().unwrap();
        let store = FileObjectStore::new(dir.path());
        let namespace = dir.path().join("secret/default");
        // A non-empty directory where the object file belongs.
        std::fs::create_dir_all(namespace.join("cache-1.json/blocker")).unwrap();

        let err = store
            .apply(integration("default", "cache-1"))
            .await
            .unwrap_err();
        assert!(matches!(err, StoreError::Backend(_)));
        assert_eq!(entries(&namespace), vec!["cache-1.json"]);
    }

    #[tokio::test]
    async fn reapply_keeps_the_create_time() {
        let dir = TempDir::new().unwrap();
        let store = FileObjectStore::new(dir.path());

        let first = store.apply(integration("default", "cache-1")).await.unwrap();
        let second = store.apply(integration("default", "cache-1")).await.unwrap();
        assert_eq!(first.create_time, second.create_time);
    }

    #[tokio::test]
    async fn list_of_unknown_namespace_is_empty() {
        let dir = TempDir::new().unwrap();
        let store = FileObjectStore::new(dir.path());
        let listed = store
            .list(ObjectKind::Secret, "nowhere", &LabelSelector::new())
            .await
            .unwrap();
        assert!(listed.is_empty());
    }

    #[tokio::test]
    async fn list_skips_corrupt_files_and_applies_the_selector() {
        let dir = TempDir::new().unwrap();
        let store = FileObjectStore::new(dir.path());
        store.apply(integration("default", "a")).await.unwrap();
        store
            .apply(StoredObject::new(ObjectKind::Secret, "default", "plain"))
            .await
            .unwrap();
        std::fs::write(dir.path().join("secret/default/broken.json"), "{").unwrap();

        let selector = LabelSelector::new().with("conflux.io/catalog", "integration");
        let listed = store
            .list(ObjectKind::Secret, "default", &selector)
            .await
            .unwrap();
        assert_eq!(listed.len(), 1);
        assert_eq!(listed[0].name, "a");
    }

    #[tokio::test]
    async fn delete_reports_missing_objects() {
        let dir = TempDir::new().unwrap();
        let store = FileObjectStore::new(dir.path());
        store.apply(integration("default", "a")).await.unwrap();

        store.delete(ObjectKind::Secret, "default", "a").await.unwrap();
        let err = store
            .delete(ObjectKind::Secret, "default", "a")
            .await
            .unwrap_err();
        assert!(err.is_not_found());
    }

    #[tokio::test]
    async fn path_like_names_are_refused() {
        let dir = TempDir::new().unwrap();
        let store = FileObjectStore::new(dir.path());
        let err = store
            .get(ObjectKind::Secret, "default", "../escape")
            .await
            .unwrap_err();
        assert!(matches!(err, StoreError::Backend(_)));
    }
}
