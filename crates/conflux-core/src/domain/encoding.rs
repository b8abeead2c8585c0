//! Output encodings for sink payloads.
//!
//! A rendered sink `content` tree is serialized into exactly one of a closed
//! set of formats. All encoders are deterministic because [`PropertyMap`] is
//! ordered.

use std::collections::BTreeMap;
use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use super::error::DomainError;
use super::value::{PropertyMap, PropertyValue};

/// Wire format of a sink payload.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Format {
    /// Structured markup (YAML).
    Yaml,
    /// Flow mapping (JSON).
    Json,
    /// Tag/value pairs (TOML).
    Toml,
    /// Key-path flattened `key=value` lines.
    Properties,
    /// No format declared: falls back to JSON.
    #[default]
    #[serde(rename = "")]
    Default,
}

impl Format {
    /// The name written next to the payload (e.g. a config-center `type`).
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Yaml => "yaml",
            Self::Json | Self::Default => "json",
            Self::Toml => "toml",
            Self::Properties => "properties",
        }
    }
}

impl FromStr for Format {
    type Err = DomainError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "" => Ok(Self::Default),
            "yaml" | "yml" => Ok(Self::Yaml),
            "json" => Ok(Self::Json),
            "toml" => Ok(Self::Toml),
            "properties" => Ok(Self::Properties),
            _ => Err(DomainError::InvalidFormat(s.to_string())),
        }
    }
}

impl fmt::Display for Format {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Serialize `content` in the given format.
pub fn encode(content: &PropertyMap, format: Format) -> Result<Vec<u8>, DomainError> {
    let encoding_error = |reason: String| DomainError::Encoding {
        format: format.to_string(),
        reason,
    };

    match format {
        Format::Json | Format::Default => {
            serde_json::to_vec(content).map_err(|e| encoding_error(e.to_string()))
        }
        Format::Yaml => serde_yaml::to_string(content)
            .map(String::into_bytes)
            .map_err(|e| encoding_error(e.to_string())),
        Format::Toml => {
            reject_nulls(content, "")?;
            toml::to_string(content)
                .map(String::into_bytes)
                .map_err(|e| encoding_error(e.to_string()))
        }
        Format::Properties => {
            let flat = flatten(content)?;
            Ok(write_properties(&flat).into_bytes())
        }
    }
}

/// Flatten nested maps into dotted key paths.
///
/// Leaves must be strings, booleans or numbers. Any other leaf (a list, a
/// null) fails instead of being dropped.
pub fn flatten(content: &PropertyMap) -> Result<BTreeMap<String, String>, DomainError> {
    let mut out = BTreeMap::new();
    flatten_into("", content, &mut out)?;
    Ok(out)
}

fn flatten_into(
    prefix: &str,
    map: &PropertyMap,
    out: &mut BTreeMap<String, String>,
) -> Result<(), DomainError> {
    for (key, value) in map {
        let path = join_key(prefix, key);
        match value {
            PropertyValue::String(s) => {
                out.insert(path, s.clone());
            }
            PropertyValue::Bool(b) => {
                out.insert(path, b.to_string());
            }
            PropertyValue::Integer(i) => {
                out.insert(path, i.to_string());
            }
            PropertyValue::Float(f) => {
                out.insert(path, f.to_string());
            }
            PropertyValue::Map(nested) => flatten_into(&path, nested, out)?,
            PropertyValue::List(_) | PropertyValue::Null => {
                return Err(DomainError::UnsupportedValue {
                    path,
                    kind: value.kind(),
                });
            }
        }
    }
    Ok(())
}

fn join_key(prefix: &str, key: &str) -> String {
    if prefix.is_empty() {
        key.to_string()
    } else {
        format!("{prefix}.{key}")
    }
}

// TOML has no null; report the path instead of the serializer's generic error.
fn reject_nulls(map: &PropertyMap, prefix: &str) -> Result<(), DomainError> {
    for (key, value) in map {
        let path = join_key(prefix, key);
        match value {
            PropertyValue::Null => {
                return Err(DomainError::UnsupportedValue {
                    path,
                    kind: value.kind(),
                });
            }
            PropertyValue::Map(nested) => reject_nulls(nested, &path)?,
            PropertyValue::List(items) => {
                if let Some(item) = items.iter().find(|v| matches!(v, PropertyValue::Null)) {
                    return Err(DomainError::UnsupportedValue {
                        path,
                        kind: item.kind(),
                    });
                }
            }
            _ => {}
        }
    }
    Ok(())
}

/// Render flattened pairs as `.properties` text, one `key=value` per line.
fn write_properties(pairs: &BTreeMap<String, String>) -> String {
    let mut out = String::new();
    for (key, value) in pairs {
        out.push_str(&escape_properties(key, true));
        out.push('=');
        out.push_str(&escape_properties(value, false));
        out.push('\n');
    }
    out
}

fn escape_properties(s: &str, is_key: bool) -> String {
    let mut out = String::with_capacity(s.len());
    for (i, ch) in s.chars().enumerate() {
        match ch {
            '\\' => out.push_str("\\\\"),
            '\n' => out.push_str("\\n"),
            '\r' => out.push_str("\\r"),
            '\t' => out.push_str("\\t"),
            '=' | ':' | '#' | '!' => {
                out.push('\\');
                out.push(ch);
            }
            ' ' if is_key || i == 0 => out.push_str("\\ "),
            _ => out.push(ch),
        }
    }
    out
}
