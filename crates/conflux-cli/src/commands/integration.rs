//! `conflux integration`: build, distribute and inspect integrations.

use std::fs;
use std::path::Path;

use chrono::{DateTime, Utc};
use serde::Serialize;
use tracing::instrument;

use conflux_core::domain::{Integration, IntegrationRequest, PropertyMap, PropertyValue};

use crate::{
    cli::{
        DeleteArgs, IntegrationApplyArgs, IntegrationCommands, IntegrationListArgs, ListFormat,
        NamedArgs,
    },
    commands::{Session, confirm, format_time},
    error::{CliError, CliResult, IntoCli},
};

/// Dispatch to the correct integration subcommand.
pub async fn execute(cmd: IntegrationCommands, session: Session) -> CliResult<()> {
    match cmd {
        IntegrationCommands::Apply(args) => apply(args, &session).await,
        IntegrationCommands::Read(args) => read(args, &session).await,
        IntegrationCommands::List(args) => list(args, &session).await,
        IntegrationCommands::Delete(args) => delete(args, &session).await,
    }
}

#[instrument(skip_all, fields(integration = %args.name))]
async fn apply(args: IntegrationApplyArgs, session: &Session) -> CliResult<()> {
    let namespace = session.namespace(&args.namespace);
    let properties = collect_properties(args.file.as_deref(), &args.properties)?;

    let mut request = IntegrationRequest::new(&args.name, &namespace)
        .properties(properties)
        .alias(args.alias)
        .description(args.description);
    if let Some(template) = &args.template {
        let template_namespace = args
            .template_namespace
            .clone()
            .unwrap_or_else(|| namespace.clone());
        request = request.template(template, template_namespace);
    }

    let integration = session.factory.parse_integration(request).await?;
    let output = &session.output;

    if args.dry_run {
        let object = if integration.is_sensitive() {
            integration.object.without_data()
        } else {
            integration.object.clone()
        };
        if output.is_json() {
            output.json(&object)?;
        } else {
            output.yaml(&object)?;
        }
        for payload in &integration.expanded_writer_data {
            output.info(&format!(
                "Would publish {} bytes of {} to {} via {}",
                payload.content.len(),
                payload.config.format.as_str(),
                payload.config.sink,
                payload.config.endpoint
            ))?;
        }
        return Ok(());
    }

    let spinner = output.spinner(&format!("Applying {}", integration.name));
    let result = session
        .factory
        .apply_integration(&integration, &namespace)
        .await;
    spinner.finish_and_clear();
    result?;

    output.success(&format!(
        "Integration {} applied in {}",
        integration.name, integration.namespace
    ))?;
    for payload in &integration.expanded_writer_data {
        output.success(&format!(
            "Published to {} via {}",
            payload.config.sink, payload.config.endpoint
        ))?;
    }
    Ok(())
}

async fn read(args: NamedArgs, session: &Session) -> CliResult<()> {
    let namespace = session.namespace(&args.namespace);
    let properties = session
        .factory
        .read_integration(&namespace, &args.name)
        .await?;
    if session.output.is_json() {
        session.output.json(&properties)
    } else {
        session.output.yaml(&properties)
    }
}

async fn list(args: IntegrationListArgs, session: &Session) -> CliResult<()> {
    let namespace = session.namespace(&args.namespace);
    let integrations = session
        .factory
        .list_integrations(&namespace, args.template.as_deref(), args.scope.scope)
        .await?;
    let output = &session.output;

    if args.format == ListFormat::Json || output.is_json() {
        let rows: Vec<IntegrationRow<'_>> = integrations.iter().map(IntegrationRow::from).collect();
        return output.json(&rows);
    }
    if args.format == ListFormat::List {
        for integration in &integrations {
            output.data(&integration.name)?;
        }
        return Ok(());
    }

    if integrations.is_empty() {
        output.info(&format!("No integrations in namespace {namespace}"))?;
        return Ok(());
    }
    let rows: Vec<Vec<String>> = integrations
        .iter()
        .map(|i| {
            vec![
                i.name.clone(),
                i.alias.clone(),
                i.template_name().to_string(),
                i.object.object_type.clone(),
                i.is_sensitive().to_string(),
                format_time(i.create_time),
            ]
        })
        .collect();
    output.table(&["NAME", "ALIAS", "TEMPLATE", "TYPE", "SENSITIVE", "CREATED"], &rows)?;
    Ok(())
}

async fn delete(args: DeleteArgs, session: &Session) -> CliResult<()> {
    let namespace = session.namespace(&args.namespace);
    if !confirm(
        &format!("Delete integration {} from {namespace}?", args.name),
        args.yes,
    )? {
        return Err(CliError::Cancelled);
    }
    session
        .factory
        .delete_integration(&namespace, &args.name)
        .await?;
    session
        .output
        .success(&format!("Integration {} deleted from {namespace}", args.name))?;
    Ok(())
}

// ── properties ────────────────────────────────────────────────────────────────

/// Properties from `-f`, then each `-p key=value` on top.
fn collect_properties(file: Option<&Path>, assignments: &[String]) -> CliResult<PropertyMap> {
    let mut properties = match file {
        Some(path) => read_properties_file(path)?,
        None => PropertyMap::new(),
    };
    for raw in assignments {
        let (path, value) = parse_assignment(raw)?;
        insert_path(&mut properties, &path, value, raw)?;
    }
    Ok(properties)
}

fn read_properties_file(path: &Path) -> CliResult<PropertyMap> {
    let text = fs::read_to_string(path)
        .with_cli_context(|| format!("Failed to read '{}'", path.display()))?;
    if text.trim().is_empty() {
        return Ok(PropertyMap::new());
    }
    // YAML is a superset of JSON.
    serde_yaml::from_str(&text).map_err(|e| CliError::InvalidInput {
        message: format!("'{}' is not a YAML or JSON table", path.display()),
        source: Some(Box::new(e)),
    })
}

/// Split `a.b=value`; the value is read as a YAML scalar, else kept as text.
fn parse_assignment(raw: &str) -> CliResult<(Vec<String>, PropertyValue)> {
    let (key, value) = raw
        .split_once('=')
        .ok_or_else(|| CliError::invalid_input(format!("property '{raw}' is not key=value")))?;
    let path: Vec<String> = key.split('.').map(|s| s.trim().to_string()).collect();
    if path.iter().any(String::is_empty) {
        return Err(CliError::invalid_input(format!(
            "property '{raw}' has an empty key"
        )));
    }

    let value = if value.is_empty() {
        PropertyValue::String(String::new())
    } else {
        serde_yaml::from_str::<PropertyValue>(value)
            .unwrap_or_else(|_| PropertyValue::String(value.to_string()))
    };
    Ok((path, value))
}

fn insert_path(
    map: &mut PropertyMap,
    path: &[String],
    value: PropertyValue,
    raw: &str,
) -> CliResult<()> {
    let not_a_table = || {
        CliError::invalid_input(format!(
            "property '{raw}' goes through a value that is not a table"
        ))
    };
    let (last, parents) = path.split_last().ok_or_else(not_a_table)?;
    let mut current = map;
    for key in parents {
        let entry = current
            .entry(key.clone())
            .or_insert_with(|| PropertyValue::Map(PropertyMap::new()));
        current = match entry {
            PropertyValue::Map(inner) => inner,
            _ => return Err(not_a_table()),
        };
    }
    current.insert(last.clone(), value);
    Ok(())
}

// ── JSON rows ─────────────────────────────────────────────────────────────────

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
struct IntegrationRow<'a> {
    name: &'a str,
    namespace: &'a str,
    #[serde(skip_serializing_if = "str::is_empty")]
    alias: &'a str,
    #[serde(skip_serializing_if = "str::is_empty")]
    description: &'a str,
    template: &'a str,
    #[serde(rename = "type")]
    object_type: &'a str,
    sensitive: bool,
    create_time: Option<DateTime<Utc>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    properties: Option<&'a PropertyMap>,
}

impl<'a> From<&'a Integration> for IntegrationRow<'a> {
    fn from(integration: &'a Integration) -> Self {
        Self {
            name: &integration.name,
            namespace: &integration.namespace,
            alias: &integration.alias,
            description: &integration.description,
            template: integration.template_name(),
            object_type: &integration.object.object_type,
            sensitive: integration.is_sensitive(),
            create_time: integration.create_time,
            properties: integration.properties.as_ref(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[test]
    fn assignments_are_typed_yaml_scalars() {
        let props = collect_properties(
            None,
            &[
                "host=redis.local".into(),
                "port=6379".into(),
                "tls.enabled=true".into(),
                "url=http://registry:8080".into(),
                "empty=".into(),
            ],
        )
        .unwrap();

        assert_eq!(props["host"], PropertyValue::from("redis.local"));
        assert_eq!(props["port"], PropertyValue::Integer(6379));
        assert_eq!(
            PropertyValue::Map(props.clone()).lookup(&["tls", "enabled"]),
            Some(&PropertyValue::Bool(true))
        );
        assert_eq!(props["url"], PropertyValue::from("http://registry:8080"));
        assert_eq!(props["empty"], PropertyValue::from(""));
    }

    #[test]
    fn assignments_override_the_file() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("props.yaml");
        fs::write(&path, "host: old.local\ncontent:\n  level: info\n").unwrap();

        let props =
            collect_properties(Some(&path), &["host=new.local".into(), "content.debug=true".into()])
                .unwrap();
        assert_eq!(props["host"], PropertyValue::from("new.local"));
        let content = props["content"].as_map().unwrap();
        assert_eq!(content["level"], PropertyValue::from("info"));
        assert_eq!(content["debug"], PropertyValue::Bool(true));
    }

    #[test]
    fn json_file_is_accepted() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("props.json");
        fs::write(&path, r#"{"dataId": "app.json", "content": {"a": 1}}"#).unwrap();

        let props = collect_properties(Some(&path), &[]).unwrap();
        assert_eq!(props["dataId"], PropertyValue::from("app.json"));
    }

    #[test]
    fn malformed_assignments_are_rejected() {
        for raw in ["novalue", "=x", "a..b=1"] {
            assert!(
                matches!(
                    collect_properties(None, &[raw.to_string()]),
                    Err(CliError::InvalidInput { .. })
                ),
                "{raw} should be rejected"
            );
        }
    }

    #[test]
    fn nested_key_through_a_scalar_is_rejected() {
        let err = collect_properties(None, &["a=1".into(), "a.b=2".into()]).unwrap_err();
        assert!(matches!(err, CliError::InvalidInput { .. }));
    }
}
