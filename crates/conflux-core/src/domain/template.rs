//! Integration templates.
//!
//! A [`Template`] is a parsed template script plus the metadata extracted
//! from it. Templates are persisted as `Config` objects; [`Template::to_object`]
//! and [`Template::from_object`] define that layout.

use std::fmt;
use std::str::FromStr;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use super::encoding::Format;
use super::error::DomainError;
use super::object::{keys, ObjectKind, StoredObject};
use super::schema::Schema;

/// Where the integrations of a template live.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Scope {
    /// Integrations go to the system namespace, whatever the caller asked.
    System,
    /// Integrations go to the caller's namespace.
    Namespace,
}

impl Scope {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::System => "system",
            Self::Namespace => "namespace",
        }
    }
}

impl FromStr for Scope {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "system" => Ok(Self::System),
            "namespace" => Ok(Self::Namespace),
            other => Err(format!("unknown scope '{other}'")),
        }
    }
}

impl fmt::Display for Scope {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// The raw body of a template script.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(transparent)]
pub struct TemplateScript(String);

impl TemplateScript {
    pub fn new(body: impl Into<String>) -> Self {
        Self(body.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }

    pub fn is_empty(&self) -> bool {
        self.0.trim().is_empty()
    }
}

impl From<&str> for TemplateScript {
    fn from(s: &str) -> Self {
        Self::new(s)
    }
}

impl From<String> for TemplateScript {
    fn from(s: String) -> Self {
        Self(s)
    }
}

/// One sink declared by a template (`[template.<sink>]`).
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SinkConfig {
    /// Registered writer kind, e.g. `nacos`.
    pub sink: String,
    /// Name of the integration holding the sink's connection settings.
    pub endpoint: String,
    #[serde(default)]
    pub format: Format,
}

/// All sinks a template fans out to.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ExpandedWriterConfig {
    pub sinks: Vec<SinkConfig>,
}

impl ExpandedWriterConfig {
    pub fn is_empty(&self) -> bool {
        self.sinks.is_empty()
    }
}

/// A parsed integration template.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Template {
    pub name: String,
    pub namespace: String,
    #[serde(default)]
    pub alias: String,
    #[serde(default)]
    pub description: String,
    #[serde(default)]
    pub scope: Option<Scope>,
    #[serde(default)]
    pub sensitive: bool,
    pub script: TemplateScript,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub schema: Option<Schema>,
    #[serde(default)]
    pub expanded_writer: ExpandedWriterConfig,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub create_time: Option<DateTime<Utc>>,
}

impl Template {
    /// Name of the stored object backing a template.
    pub fn object_name(name: &str) -> String {
        format!("{}{}", keys::TEMPLATE_NAME_PREFIX, name)
    }

    /// Namespace the integrations of this template are stored in.
    pub fn integration_namespace<'a>(&self, requested: &'a str, system: &'a str) -> &'a str {
        match self.scope {
            Some(Scope::System) => system,
            _ => requested,
        }
    }

    /// The `Config` object this template is persisted as.
    pub fn to_object(&self, namespace: &str) -> Result<StoredObject, DomainError> {
        let mut object = StoredObject::new(
            ObjectKind::Config,
            namespace,
            Self::object_name(&self.name),
        );

        object
            .labels
            .insert(keys::LABEL_CATALOG.into(), keys::CATALOG_INTEGRATION.into());
        object.labels.insert(
            keys::LABEL_SCOPE.into(),
            self.scope.map(|s| s.to_string()).unwrap_or_default(),
        );

        object
            .annotations
            .insert(keys::ANNOTATION_DESCRIPTION.into(), self.description.clone());
        object
            .annotations
            .insert(keys::ANNOTATION_ALIAS.into(), self.alias.clone());
        object
            .annotations
            .insert(keys::ANNOTATION_SENSITIVE.into(), self.sensitive.to_string());

        object
            .data
            .insert(keys::TEMPLATE_SCRIPT.into(), self.script.as_str().to_string());
        if let Some(schema) = &self.schema {
            object
                .data
                .insert(keys::TEMPLATE_SCHEMA.into(), to_yaml(schema)?);
        }
        if !self.expanded_writer.is_empty() {
            object.data.insert(
                keys::TEMPLATE_EXPANDED_WRITER.into(),
                to_yaml(&self.expanded_writer)?,
            );
        }
        Ok(object)
    }

    /// Rebuild a template from its stored object.
    pub fn from_object(object: &StoredObject) -> Result<Self, DomainError> {
        let name = object
            .name
            .strip_prefix(keys::TEMPLATE_NAME_PREFIX)
            .unwrap_or(&object.name)
            .to_string();

        let script = object
            .data
            .get(keys::TEMPLATE_SCRIPT)
            .cloned()
            .map(TemplateScript::from)
            .ok_or_else(|| {
                DomainError::InvalidScript(format!("the stored template {name} has no script"))
            })?;

        let schema = object
            .data
            .get(keys::TEMPLATE_SCHEMA)
            .map(|yaml| from_yaml::<Schema>(yaml))
            .transpose()?;

        let expanded_writer = object
            .data
            .get(keys::TEMPLATE_EXPANDED_WRITER)
            .map(|yaml| from_yaml::<ExpandedWriterConfig>(yaml))
            .transpose()?
            .unwrap_or_default();

        Ok(Self {
            name,
            namespace: object.namespace.clone(),
            alias: object
                .annotation(keys::ANNOTATION_ALIAS)
                .unwrap_or_default()
                .to_string(),
            description: object
                .annotation(keys::ANNOTATION_DESCRIPTION)
                .unwrap_or_default()
                .to_string(),
            scope: object.label(keys::LABEL_SCOPE).and_then(|s| s.parse().ok()),
            sensitive: object.is_sensitive(),
            script,
            schema,
            expanded_writer,
            create_time: object.create_time,
        })
    }
}

fn to_yaml<T: Serialize>(value: &T) -> Result<String, DomainError> {
    serde_yaml::to_string(value).map_err(|e| DomainError::Encoding {
        format: "yaml".into(),
        reason: e.to_string(),
    })
}

fn from_yaml<T: for<'de> Deserialize<'de>>(yaml: &str) -> Result<T, DomainError> {
    serde_yaml::from_str(yaml)
        .map_err(|e| DomainError::InvalidScript(format!("the stored template is corrupt: {e}")))
}
