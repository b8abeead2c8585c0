//! Filesystem-based template script discovery.
//!
//! Finds template scripts (`*.toml`) in a directory tree so that a whole
//! template collection can be applied at once.
//!
//! # Directory layout expected
//!
//! ```text
//! templates/
//! ├── cache-endpoint.toml
//! ├── messaging/
//! │   └── kafka-topic.toml
//! └── README.md              ← ignored
//! ```
//!
//! The file stem is only a name hint: the parser uses the `name` declared in
//! the script's `[metadata]` table when present.

use std::{
    fs,
    path::{Path, PathBuf},
};

use tracing::{debug, instrument, warn};
use walkdir::WalkDir;

use conflux_core::domain::DomainError;

const SCRIPT_EXTENSION: &str = "toml";

/// One script read from disk.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ScriptFile {
    pub path: PathBuf,
    /// File stem, used when the script declares no name.
    pub name_hint: String,
    pub content: Vec<u8>,
}

/// Loads template scripts from a file or a directory tree.
pub struct ScriptLoader {
    root: PathBuf,
}

impl ScriptLoader {
    /// Create a loader pointed at a script file or a directory.
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self { root: root.into() }
    }

    /// Load every script found under the root, sorted by path.
    ///
    /// # Errors
    ///
    /// Returns [`DomainError::InvalidScript`] if the root does not exist or a
    /// single-file root cannot be read. Unreadable files inside a directory
    /// are **skipped with a `WARN` log** rather than failing the whole batch.
    #[instrument(skip(self), fields(root = %self.root.display()))]
    pub fn load_all(&self) -> Result<Vec<ScriptFile>, DomainError> {
        if !self.root.exists() {
            return Err(DomainError::InvalidScript(format!(
                "no such file or directory: {}",
                self.root.display()
            )));
        }

        if self.root.is_file() {
            return read_script(&self.root).map(|script| vec![script]);
        }

        let mut scripts = Vec::new();
        for entry in WalkDir::new(&self.root)
            .min_depth(1)
            .sort_by_file_name()
            .into_iter()
            .filter_map(|entry| match entry {
                Ok(entry) => Some(entry),
                Err(e) => {
                    warn!(error = %e, "skipping unreadable directory entry");
                    None
                }
            })
        {
            let path = entry.path();
            if !entry.file_type().is_file() || !is_script(path) {
                continue;
            }
            match read_script(path) {
                Ok(script) => scripts.push(script),
                Err(e) => warn!(path = %path.display(), error = %e, "skipping script"),
            }
        }

        debug!(count = scripts.len(), "finished loading scripts");
        Ok(scripts)
    }
}

fn is_script(path: &Path) -> bool {
    path.extension().and_then(|e| e.to_str()) == Some(SCRIPT_EXTENSION)
}

fn read_script(path: &Path) -> Result<ScriptFile, DomainError> {
    let content = fs::read(path).map_err(|e| {
        DomainError::InvalidScript(format!("failed to read '{}': {e}", path.display()))
    })?;
    let name_hint = path
        .file_stem()
        .map(|s| s.to_string_lossy().into_owned())
        .unwrap_or_default();
    Ok(ScriptFile {
        path: path.to_path_buf(),
        name_hint,
        content,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    fn write(dir: &Path, rel: &str, content: &str) {
        let path = dir.join(rel);
        fs::create_dir_all(path.parent().unwrap()).unwrap();
        fs::write(path, content).unwrap();
    }

    #[test]
    fn loads_nested_scripts_and_ignores_other_files() {
        let dir = TempDir::new().unwrap();
        write(dir.path(), "cache-endpoint.toml", "[metadata]\n");
        write(dir.path(), "messaging/kafka-topic.toml", "[metadata]\n");
        write(dir.path(), "README.md", "# templates");

        let scripts = ScriptLoader::new(dir.path()).load_all().unwrap();
        let hints: Vec<&str> = scripts.iter().map(|s| s.name_hint.as_str()).collect();
        assert_eq!(hints, vec!["cache-endpoint", "kafka-topic"]);
    }

    #[test]
    fn single_file_root_is_loaded() {
        let dir = TempDir::new().unwrap();
        write(dir.path(), "redis.toml", "x = 1\n");

        let scripts = ScriptLoader::new(dir.path().join("redis.toml"))
            .load_all()
            .unwrap();
        assert_eq!(scripts.len(), 1);
        assert_eq!(scripts[0].content, b"x = 1\n");
    }

    #[test]
    fn missing_root_is_an_error() {
        let dir = TempDir::new().unwrap();
        let err = ScriptLoader::new(dir.path().join("nope"))
            .load_all()
            .unwrap_err();
        assert!(matches!(err, DomainError::InvalidScript(_)));
    }
}
