//! The persisted object model shared with the object-store port.
//!
//! Templates and integrations are both stored as namespaced, labeled,
//! annotated objects with a string data section. The well-known label and
//! annotation keys live in [`keys`].

use std::collections::BTreeMap;
use std::fmt;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Well-known label, annotation and data keys.
pub mod keys {
    /// Marks objects managed by the integration catalog.
    pub const LABEL_CATALOG: &str = "conflux.io/catalog";
    /// The template name an integration was built from (empty when raw).
    pub const LABEL_TYPE: &str = "conflux.io/type";
    /// `system` or `namespace`.
    pub const LABEL_SCOPE: &str = "conflux.io/scope";

    pub const ANNOTATION_DESCRIPTION: &str = "conflux.io/description";
    pub const ANNOTATION_ALIAS: &str = "conflux.io/alias";
    pub const ANNOTATION_SENSITIVE: &str = "conflux.io/sensitive";
    pub const ANNOTATION_TEMPLATE_NAMESPACE: &str = "conflux.io/template-namespace";

    /// Value of [`LABEL_CATALOG`] for everything this crate manages.
    pub const CATALOG_INTEGRATION: &str = "integration";

    /// Data key holding the caller's input properties as JSON.
    pub const INPUT_PROPERTIES: &str = "input-properties";
    /// Data keys of a stored template.
    pub const TEMPLATE_SCRIPT: &str = "template";
    pub const TEMPLATE_SCHEMA: &str = "schema";
    pub const TEMPLATE_EXPANDED_WRITER: &str = "expanded-writer";

    /// Prefix of the object name a template is stored under.
    pub const TEMPLATE_NAME_PREFIX: &str = "integration-template-";
}

/// The two object kinds the engine persists.
#[derive(
    Debug, Clone, Copy, Default, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize,
)]
#[serde(rename_all = "lowercase")]
pub enum ObjectKind {
    /// Plain configuration, used for templates.
    Config,
    /// Possibly sensitive data, used for integrations.
    #[default]
    Secret,
}

impl ObjectKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Config => "config",
            Self::Secret => "secret",
        }
    }
}

impl fmt::Display for ObjectKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A namespaced, labeled, annotated blob.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct StoredObject {
    pub kind: ObjectKind,
    pub namespace: String,
    pub name: String,
    /// Free-form type string (e.g. `conflux.io/redis`).
    #[serde(default, rename = "type")]
    pub object_type: String,
    #[serde(default)]
    pub labels: BTreeMap<String, String>,
    #[serde(default)]
    pub annotations: BTreeMap<String, String>,
    #[serde(default)]
    pub data: BTreeMap<String, String>,
    /// Stamped by the store on first creation.
    #[serde(default)]
    pub create_time: Option<DateTime<Utc>>,
}

impl StoredObject {
    pub fn new(kind: ObjectKind, namespace: impl Into<String>, name: impl Into<String>) -> Self {
        Self {
            kind,
            namespace: namespace.into(),
            name: name.into(),
            ..Default::default()
        }
    }

    pub fn label(&self, key: &str) -> Option<&str> {
        self.labels.get(key).map(String::as_str)
    }

    pub fn annotation(&self, key: &str) -> Option<&str> {
        self.annotations.get(key).map(String::as_str)
    }

    /// `true` when the object carries the integration catalog label.
    pub fn is_integration(&self) -> bool {
        self.label(keys::LABEL_CATALOG) == Some(keys::CATALOG_INTEGRATION)
    }

    /// `true` when the sensitivity annotation is set.
    pub fn is_sensitive(&self) -> bool {
        self.annotation(keys::ANNOTATION_SENSITIVE) == Some("true")
    }

    /// Copy of this object with the data section removed.
    pub fn without_data(&self) -> Self {
        Self {
            data: BTreeMap::new(),
            ..self.clone()
        }
    }
}

/// An equality-based label selector.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct LabelSelector {
    requirements: BTreeMap<String, String>,
}

impl LabelSelector {
    pub fn new() -> Self {
        Self::default()
    }

    /// Require `key=value`.
    pub fn with(mut self, key: impl Into<String>, value: impl Into<String>) -> Self {
        self.requirements.insert(key.into(), value.into());
        self
    }

    pub fn matches(&self, labels: &BTreeMap<String, String>) -> bool {
        self.requirements
            .iter()
            .all(|(k, v)| labels.get(k).is_some_and(|actual| actual == v))
    }

    pub fn requirements(&self) -> impl Iterator<Item = (&str, &str)> {
        self.requirements
            .iter()
            .map(|(k, v)| (k.as_str(), v.as_str()))
    }
}

impl fmt::Display for LabelSelector {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let parts: Vec<String> = self
            .requirements
            .iter()
            .map(|(k, v)| format!("{k}={v}"))
            .collect();
        f.write_str(&parts.join(","))
    }
}
