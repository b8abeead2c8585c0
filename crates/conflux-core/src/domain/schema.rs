//! Input schema inferred from a template's parameter declarations.
//!
//! A template declares its expected properties under `template.parameter`:
//!
//! ```toml
//! [template.parameter.host]
//! type = "string"
//! required = true
//! description = "Address of the cache server"
//!
//! [template.parameter.port]
//! type = "integer"
//! default = 6379
//!
//! [template.parameter]
//! mode = "string"          # shorthand for { type = "string" }
//! ```
//!
//! The declarations compile into a [`Schema`] that callers use to generate
//! forms, and that the factory uses to validate properties before rendering.

use std::collections::BTreeMap;
use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use super::error::DomainError;
use super::value::{PropertyMap, PropertyValue};

/// Declared type of a property.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SchemaType {
    String,
    Integer,
    Number,
    Boolean,
    #[default]
    Object,
    Array,
    Any,
}

impl FromStr for SchemaType {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "string" => Ok(Self::String),
            "integer" | "int" => Ok(Self::Integer),
            "number" | "float" => Ok(Self::Number),
            "boolean" | "bool" => Ok(Self::Boolean),
            "object" | "map" => Ok(Self::Object),
            "array" | "list" => Ok(Self::Array),
            "any" => Ok(Self::Any),
            other => Err(format!("unknown type '{other}'")),
        }
    }
}

impl fmt::Display for SchemaType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            Self::String => "string",
            Self::Integer => "integer",
            Self::Number => "number",
            Self::Boolean => "boolean",
            Self::Object => "object",
            Self::Array => "array",
            Self::Any => "any",
        };
        f.write_str(s)
    }
}

/// Structural description of a property tree.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Schema {
    #[serde(rename = "type")]
    pub schema_type: SchemaType,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub default: Option<PropertyValue>,
    #[serde(default, skip_serializing_if = "BTreeMap::is_empty")]
    pub properties: BTreeMap<String, Schema>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub required: Vec<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub items: Option<Box<Schema>>,
    #[serde(default, rename = "enum", skip_serializing_if = "Vec::is_empty")]
    pub enum_values: Vec<PropertyValue>,
}

const DECLARATION_KEYS: &[&str] = &[
    "type",
    "required",
    "description",
    "default",
    "properties",
    "items",
    "enum",
];

impl Schema {
    /// Compile a `template.parameter` table into an object schema.
    pub fn from_declarations(declarations: &PropertyMap) -> Result<Self, DomainError> {
        let mut schema = Schema::default();
        for (field, declaration) in declarations {
            let (child, required) = compile_field(field, declaration)?;
            if required {
                schema.required.push(field.clone());
            }
            schema.properties.insert(field.clone(), child);
        }
        Ok(schema)
    }

    /// Check a property map against this (object) schema.
    pub fn validate(&self, properties: &PropertyMap) -> Result<(), DomainError> {
        self.validate_object("", properties)
    }

    /// A copy of `properties` with declared defaults filled in.
    pub fn apply_defaults(&self, properties: &PropertyMap) -> PropertyMap {
        let mut out = properties.clone();
        for (field, child) in &self.properties {
            match out.get_mut(field) {
                Some(PropertyValue::Map(nested)) if child.schema_type == SchemaType::Object => {
                    *nested = child.apply_defaults(nested);
                }
                Some(_) => {}
                None => {
                    if let Some(default) = &child.default {
                        out.insert(field.clone(), default.clone());
                    }
                }
            }
        }
        out
    }

    fn validate_object(&self, prefix: &str, properties: &PropertyMap) -> Result<(), DomainError> {
        for field in &self.required {
            let declared_default = self
                .properties
                .get(field)
                .is_some_and(|s| s.default.is_some());
            if !properties.contains_key(field) && !declared_default {
                return Err(DomainError::InvalidProperties {
                    path: join_path(prefix, field),
                    reason: "the field is required".into(),
                });
            }
        }
        for (field, value) in properties {
            if let Some(child) = self.properties.get(field) {
                child.validate_value(&join_path(prefix, field), value)?;
            }
        }
        Ok(())
    }

    fn validate_value(&self, path: &str, value: &PropertyValue) -> Result<(), DomainError> {
        let mismatch = || DomainError::InvalidProperties {
            path: path.to_string(),
            reason: format!("expected {}, found {}", self.schema_type, value.kind()),
        };

        match (self.schema_type, value) {
            (SchemaType::Any, _) => {}
            (SchemaType::String, PropertyValue::String(_))
            | (SchemaType::Integer, PropertyValue::Integer(_))
            | (SchemaType::Number, PropertyValue::Integer(_) | PropertyValue::Float(_))
            | (SchemaType::Boolean, PropertyValue::Bool(_)) => {}
            (SchemaType::Object, PropertyValue::Map(map)) => self.validate_object(path, map)?,
            (SchemaType::Array, PropertyValue::List(items)) => {
                if let Some(item_schema) = &self.items {
                    for (i, item) in items.iter().enumerate() {
                        item_schema.validate_value(&format!("{path}[{i}]"), item)?;
                    }
                }
            }
            _ => return Err(mismatch()),
        }

        if !self.enum_values.is_empty() && !self.enum_values.contains(value) {
            return Err(DomainError::InvalidProperties {
                path: path.to_string(),
                reason: format!(
                    "must be one of {}",
                    self.enum_values
                        .iter()
                        .map(PropertyValue::to_text)
                        .collect::<Vec<_>>()
                        .join(", ")
                ),
            });
        }
        Ok(())
    }
}

fn join_path(prefix: &str, field: &str) -> String {
    if prefix.is_empty() {
        field.to_string()
    } else {
        format!("{prefix}.{field}")
    }
}

/// Compile one declaration, returning the schema and whether it is required.
fn compile_field(field: &str, declaration: &PropertyValue) -> Result<(Schema, bool), DomainError> {
    let invalid = |reason: String| DomainError::InvalidSchema(format!("{field}: {reason}"));

    let table = match declaration {
        PropertyValue::String(type_name) => {
            let schema_type = type_name.parse::<SchemaType>().map_err(invalid)?;
            return Ok((
                Schema {
                    schema_type,
                    ..Default::default()
                },
                false,
            ));
        }
        PropertyValue::Map(table) => table,
        other => {
            return Err(invalid(format!(
                "expected a table or a type name, found {}",
                other.kind()
            )));
        }
    };

    if let Some(unknown) = table
        .keys()
        .find(|k| !DECLARATION_KEYS.contains(&k.as_str()))
    {
        return Err(invalid(format!("unknown key '{unknown}'")));
    }

    let schema_type = match table.get("type") {
        Some(PropertyValue::String(s)) => s.parse::<SchemaType>().map_err(invalid)?,
        Some(other) => return Err(invalid(format!("`type` must be a string, found {}", other.kind()))),
        None => return Err(invalid("missing `type`".into())),
    };

    let required = match table.get("required") {
        None => false,
        Some(PropertyValue::Bool(b)) => *b,
        Some(other) => {
            return Err(invalid(format!(
                "`required` must be a boolean, found {}",
                other.kind()
            )));
        }
    };

    let description = match table.get("description") {
        None => None,
        Some(PropertyValue::String(s)) => Some(s.clone()),
        Some(other) => {
            return Err(invalid(format!(
                "`description` must be a string, found {}",
                other.kind()
            )));
        }
    };

    let mut schema = Schema {
        schema_type,
        description,
        ..Default::default()
    };

    if let Some(nested) = table.get("properties") {
        if schema_type != SchemaType::Object {
            return Err(invalid("`properties` is only allowed on objects".into()));
        }
        let nested = nested
            .as_map()
            .ok_or_else(|| invalid("`properties` must be a table".into()))?;
        let compiled = Schema::from_declarations(nested).map_err(|e| match e {
            DomainError::InvalidSchema(inner) => DomainError::InvalidSchema(format!("{field}.{inner}")),
            other => other,
        })?;
        schema.properties = compiled.properties;
        schema.required = compiled.required;
    }

    if let Some(items) = table.get("items") {
        if schema_type != SchemaType::Array {
            return Err(invalid("`items` is only allowed on arrays".into()));
        }
        let (item_schema, _) = compile_field(&format!("{field}[]"), items)?;
        schema.items = Some(Box::new(item_schema));
    }

    if let Some(values) = table.get("enum") {
        let values = values
            .as_list()
            .ok_or_else(|| invalid("`enum` must be a list".into()))?;
        for value in values {
            schema
                .validate_value(field, value)
                .map_err(|e| invalid(format!("enum value does not match the type: {e}")))?;
        }
        schema.enum_values = values.to_vec();
    }

    if let Some(default) = table.get("default") {
        schema
            .validate_value(field, default)
            .map_err(|e| invalid(format!("default does not match the type: {e}")))?;
        schema.default = Some(default.clone());
    }

    Ok((schema, required))
}
