//! Template script engine backed by TOML and minijinja.
//!
//! A script is a TOML document. Every string leaf is a minijinja template
//! rendered with two variables:
//! - `context`: `{ name, namespace }` of the integration being built
//! - `parameter`: the caller's properties, schema defaults applied
//!
//! A leaf that consists of a single `{{ expr }}` keeps the type of the
//! expression, so `port = "{{ parameter.port }}"` renders to an integer.
//! Undefined variables are errors.

mod filters;

use conflux_core::{
    application::ports::ScriptEngine,
    domain::{DomainError, PropertyMap, PropertyValue, RenderContext, TemplateScript},
};
use minijinja::{context, Environment, UndefinedBehavior, Value};
use tracing::trace;

/// [`ScriptEngine`] implementation using minijinja in strict mode.
pub struct MiniJinjaEngine {
    env: Environment<'static>,
}

impl Default for MiniJinjaEngine {
    fn default() -> Self {
        Self::new()
    }
}

impl MiniJinjaEngine {
    pub fn new() -> Self {
        let mut env = Environment::new();
        env.set_undefined_behavior(UndefinedBehavior::Strict);
        filters::register(&mut env);
        Self { env }
    }

    fn document(&self, script: &TemplateScript) -> Result<PropertyMap, DomainError> {
        toml::from_str::<PropertyMap>(script.as_str())
            .map_err(|e| DomainError::InvalidScript(e.to_string().trim_end().to_string()))
    }

    /// Compile every template leaf without rendering it.
    fn check_syntax(&self, path: &str, value: &PropertyValue) -> Result<(), DomainError> {
        match value {
            PropertyValue::String(s) if has_template_syntax(s) => self
                .env
                .template_from_str(s)
                .map(|_| ())
                .map_err(|e| DomainError::InvalidScript(format!("{path}: {e}"))),
            PropertyValue::Map(map) => map
                .iter()
                .try_for_each(|(k, v)| self.check_syntax(&join(path, k), v)),
            PropertyValue::List(items) => items
                .iter()
                .enumerate()
                .try_for_each(|(i, v)| self.check_syntax(&format!("{path}[{i}]"), v)),
            _ => Ok(()),
        }
    }

    fn render_value(
        &self,
        path: &str,
        value: &PropertyValue,
        vars: &Value,
    ) -> Result<PropertyValue, DomainError> {
        match value {
            PropertyValue::String(s) => self.render_leaf(path, s, vars),
            PropertyValue::Map(map) => map
                .iter()
                .map(|(k, v)| Ok((k.clone(), self.render_value(&join(path, k), v, vars)?)))
                .collect::<Result<PropertyMap, DomainError>>()
                .map(PropertyValue::Map),
            PropertyValue::List(items) => items
                .iter()
                .enumerate()
                .map(|(i, v)| self.render_value(&format!("{path}[{i}]"), v, vars))
                .collect::<Result<Vec<_>, DomainError>>()
                .map(PropertyValue::List),
            other => Ok(other.clone()),
        }
    }

    fn render_leaf(&self, path: &str, source: &str, vars: &Value) -> Result<PropertyValue, DomainError> {
        if !has_template_syntax(source) {
            return Ok(PropertyValue::String(source.to_string()));
        }

        let render_error = |e: minijinja::Error| DomainError::Render(format!("{path}: {e}"));

        if let Some(expr) = sole_expression(source) {
            let value = self
                .env
                .compile_expression(expr)
                .and_then(|compiled| compiled.eval(vars))
                .map_err(render_error)?;
            if value.is_undefined() {
                return Err(DomainError::Render(format!(
                    "{path}: '{}' is undefined",
                    expr.trim()
                )));
            }
            trace!(path, "Rendered typed expression");
            return from_jinja(path, &value);
        }

        self.env
            .render_str(source, vars)
            .map(PropertyValue::String)
            .map_err(render_error)
    }
}

impl ScriptEngine for MiniJinjaEngine {
    fn parse(&self, script: &TemplateScript) -> Result<PropertyMap, DomainError> {
        let document = self.document(script)?;
        document
            .iter()
            .try_for_each(|(k, v)| self.check_syntax(k, v))?;
        Ok(document)
    }

    fn render(
        &self,
        script: &TemplateScript,
        context: &RenderContext,
        parameter: &PropertyMap,
        path: &[&str],
    ) -> Result<Option<PropertyValue>, DomainError> {
        let document = PropertyValue::Map(self.document(script)?);
        let Some(value) = document.lookup(path) else {
            return Ok(None);
        };

        let vars = context! {
            context => Value::from_serialize(context),
            parameter => Value::from_serialize(parameter),
        };
        self.render_value(&path.join("."), value, &vars).map(Some)
    }
}

fn has_template_syntax(s: &str) -> bool {
    s.contains("{{") || s.contains("{%") || s.contains("{#")
}

/// The expression of a leaf that is exactly `{{ expr }}`.
fn sole_expression(source: &str) -> Option<&str> {
    let inner = source
        .trim()
        .strip_prefix("{{")?
        .strip_suffix("}}")?;
    let inner = inner.strip_prefix('-').unwrap_or(inner);
    let inner = inner.strip_suffix('-').unwrap_or(inner);
    if inner.contains("{{") || inner.contains("}}") || inner.contains("{%") {
        return None;
    }
    Some(inner)
}

fn from_jinja(path: &str, value: &Value) -> Result<PropertyValue, DomainError> {
    serde_json::to_value(value)
        .and_then(serde_json::from_value::<PropertyValue>)
        .map_err(|e| DomainError::Render(format!("{path}: {e}")))
}

fn join(prefix: &str, key: &str) -> String {
    if prefix.is_empty() {
        key.to_string()
    } else {
        format!("{prefix}.{key}")
    }
}
