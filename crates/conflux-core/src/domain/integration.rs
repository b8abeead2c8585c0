//! Integrations: template instances bound to concrete properties.

use std::collections::BTreeMap;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use super::error::DomainError;
use super::object::{keys, StoredObject};
use super::template::{SinkConfig, Template};
use super::value::{PropertyMap, PropertyValue};

/// Variables visible to a template as `context`.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct RenderContext {
    pub name: String,
    pub namespace: String,
}

impl RenderContext {
    pub fn new(name: impl Into<String>, namespace: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            namespace: namespace.into(),
        }
    }
}

/// Input of `parse_integration`.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct IntegrationRequest {
    /// `None` (or empty) builds a raw integration without a template.
    pub template_name: Option<String>,
    pub template_namespace: String,
    pub name: String,
    pub namespace: String,
    pub properties: PropertyMap,
    pub alias: String,
    pub description: String,
}

impl IntegrationRequest {
    pub fn new(name: impl Into<String>, namespace: impl Into<String>) -> Self {
        let namespace = namespace.into();
        Self {
            name: name.into(),
            template_namespace: namespace.clone(),
            namespace,
            ..Default::default()
        }
    }

    /// Build from the named template, looked up in `namespace`.
    pub fn template(mut self, name: impl Into<String>, namespace: impl Into<String>) -> Self {
        self.template_name = Some(name.into());
        self.template_namespace = namespace.into();
        self
    }

    pub fn properties(mut self, properties: PropertyMap) -> Self {
        self.properties = properties;
        self
    }

    pub fn property(mut self, key: impl Into<String>, value: impl Into<PropertyValue>) -> Self {
        self.properties.insert(key.into(), value.into());
        self
    }

    pub fn alias(mut self, alias: impl Into<String>) -> Self {
        self.alias = alias.into();
        self
    }

    pub fn description(mut self, description: impl Into<String>) -> Self {
        self.description = description.into();
        self
    }

    /// The template name, treating an empty string as absent.
    pub fn template_name(&self) -> Option<&str> {
        self.template_name.as_deref().filter(|n| !n.is_empty())
    }
}

/// A rendered, encoded sink payload.
#[derive(Debug, Clone, PartialEq)]
pub struct ExpandedWriterData {
    pub config: SinkConfig,
    pub content: Vec<u8>,
    pub metadata: PropertyMap,
}

impl ExpandedWriterData {
    /// Metadata field as text, if present and non-empty.
    pub fn metadata_str(&self, key: &str) -> Option<String> {
        self.metadata
            .get(key)
            .map(PropertyValue::to_text)
            .filter(|s| !s.is_empty())
    }
}

/// The primary output a template may declare under `template.output`.
#[derive(Debug, Clone, PartialEq, Default, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct PrimaryOutput {
    #[serde(default, rename = "type")]
    pub object_type: Option<String>,
    #[serde(default)]
    pub labels: BTreeMap<String, String>,
    #[serde(default)]
    pub annotations: BTreeMap<String, String>,
    #[serde(default)]
    pub data: PropertyMap,
}

impl PrimaryOutput {
    /// Decode a rendered `template.output` value.
    pub fn from_value(value: PropertyValue) -> Result<Self, DomainError> {
        let json = serde_json::to_value(&value)
            .map_err(|e| DomainError::InvalidOutput(e.to_string()))?;
        serde_json::from_value(json).map_err(|e| DomainError::InvalidOutput(e.to_string()))
    }

    /// The data section as stored strings; non-string values become JSON.
    pub fn string_data(&self) -> BTreeMap<String, String> {
        self.data
            .iter()
            .map(|(k, v)| {
                let text = match v {
                    PropertyValue::String(s) => s.clone(),
                    other => serde_json::to_string(other).unwrap_or_default(),
                };
                (k.clone(), text)
            })
            .collect()
    }
}

/// The verdict a template may render under `template.validation`.
///
/// A non-empty `message` rejects the properties; `result` is informational.
#[derive(Debug, Clone, PartialEq, Eq, Default, Deserialize)]
pub struct Validation {
    #[serde(default)]
    pub result: bool,
    #[serde(default)]
    pub message: String,
}

impl Validation {
    /// Decode a rendered `template.validation` value.
    pub fn from_value(value: PropertyValue) -> Result<Self, DomainError> {
        let json = serde_json::to_value(&value)
            .map_err(|e| DomainError::InvalidOutput(format!("template.validation: {e}")))?;
        serde_json::from_value(json)
            .map_err(|e| DomainError::InvalidOutput(format!("template.validation: {e}")))
    }

    pub fn check(self) -> Result<(), DomainError> {
        if self.message.is_empty() {
            Ok(())
        } else {
            Err(DomainError::ValidationFailed(self.message))
        }
    }
}

/// A configuration instance.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct Integration {
    pub name: String,
    pub namespace: String,
    pub alias: String,
    pub description: String,
    pub create_time: Option<DateTime<Utc>>,
    pub template: Option<Template>,
    /// `None` when the data was withheld (sensitive listings).
    pub properties: Option<PropertyMap>,
    pub object: StoredObject,
    pub expanded_writer_data: Vec<ExpandedWriterData>,
}

impl Integration {
    /// Name of the template this integration was built from, empty for raw ones.
    pub fn template_name(&self) -> &str {
        self.object.label(keys::LABEL_TYPE).unwrap_or_default()
    }

    pub fn is_sensitive(&self) -> bool {
        self.object.is_sensitive()
    }

    /// Rebuild a listed integration from its stored object.
    ///
    /// Sensitive objects come back with their data stripped and no properties.
    pub fn from_object(object: StoredObject, template: Option<Template>) -> Result<Self, DomainError> {
        let (object, properties) = if object.is_sensitive() {
            (object.without_data(), None)
        } else {
            let properties = decode_properties(&object)?;
            (object, Some(properties))
        };

        let annotation = |key: &str| object.annotation(key).unwrap_or_default().to_string();
        Ok(Self {
            name: object.name.clone(),
            namespace: object.namespace.clone(),
            alias: annotation(keys::ANNOTATION_ALIAS),
            description: annotation(keys::ANNOTATION_DESCRIPTION),
            create_time: object.create_time,
            template,
            properties,
            object,
            expanded_writer_data: Vec::new(),
        })
    }
}

/// Decode the caller's properties from an integration object.
pub fn decode_properties(object: &StoredObject) -> Result<PropertyMap, DomainError> {
    match object.data.get(keys::INPUT_PROPERTIES) {
        None => Ok(PropertyMap::new()),
        Some(raw) if raw.trim().is_empty() => Ok(PropertyMap::new()),
        Some(raw) => serde_json::from_str(raw).map_err(|e| {
            DomainError::InvalidProperties {
                path: keys::INPUT_PROPERTIES.into(),
                reason: e.to_string(),
            }
        }),
    }
}

/// Serialize the caller's properties for the `input-properties` data key.
pub fn encode_properties(properties: &PropertyMap) -> Result<String, DomainError> {
    serde_json::to_string(properties).map_err(|e| DomainError::Encoding {
        format: "json".into(),
        reason: e.to_string(),
    })
}
