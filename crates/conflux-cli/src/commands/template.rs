//! `conflux template`: parse, store and inspect templates.

use std::fs;

use tracing::{info, instrument};

use conflux_adapters::{ScriptFile, ScriptLoader, builtin_templates};
use conflux_core::{
    domain::{DomainError, Template},
    error::ConfluxError,
};

use crate::{
    cli::{
        BuiltinArgs, DeleteArgs, ListFormat, NamedArgs, TemplateApplyArgs, TemplateCommands,
        TemplateListArgs, TemplateParseArgs,
    },
    commands::{Session, confirm, format_time},
    error::{CliError, CliResult, IntoCli},
    output::OutputManager,
};

/// Dispatch to the correct template subcommand.
pub async fn execute(cmd: TemplateCommands, session: Session) -> CliResult<()> {
    match cmd {
        TemplateCommands::Parse(args) => parse(args, &session),
        TemplateCommands::Apply(args) => apply(args, &session).await,
        TemplateCommands::Get(args) => get(args, &session).await,
        TemplateCommands::List(args) => list(args, &session).await,
        TemplateCommands::Delete(args) => delete(args, &session).await,
        TemplateCommands::Builtin(args) => builtin(args, &session).await,
    }
}

#[instrument(skip_all, fields(file = %args.file.display()))]
fn parse(args: TemplateParseArgs, session: &Session) -> CliResult<()> {
    let content = fs::read(&args.file)
        .with_cli_context(|| format!("Failed to read '{}'", args.file.display()))?;
    let stem = args
        .file
        .file_stem()
        .map(|s| s.to_string_lossy().into_owned())
        .unwrap_or_default();
    let script = ScriptFile {
        path: args.file.clone(),
        name_hint: stem,
        content,
    };
    let template = parse_script(session, &script, args.name.as_deref())?;
    show(&template, &session.output)
}

#[instrument(skip_all, fields(path = %args.path.display()))]
async fn apply(args: TemplateApplyArgs, session: &Session) -> CliResult<()> {
    let namespace = session.namespace(&args.namespace);
    let scripts = ScriptLoader::new(&args.path)
        .load_all()
        .map_err(ConfluxError::from)?;

    if scripts.is_empty() {
        session.output.warning(&format!(
            "No template scripts found in {}",
            args.path.display()
        ))?;
        return Ok(());
    }
    if args.name.is_some() && scripts.len() > 1 {
        return Err(CliError::invalid_input(format!(
            "--name needs a single script, found {} in {}",
            scripts.len(),
            args.path.display()
        )));
    }

    for script in &scripts {
        let template = parse_script(session, script, args.name.as_deref())?;
        session.factory.apply_template(&namespace, &template).await?;
        session.output.success(&format!(
            "Template {} applied in {namespace}",
            template.name
        ))?;
    }
    info!(count = scripts.len(), %namespace, "Templates applied");
    Ok(())
}

async fn get(args: NamedArgs, session: &Session) -> CliResult<()> {
    let namespace = session.namespace(&args.namespace);
    let template = session.factory.load_template(&args.name, &namespace).await?;
    show(&template, &session.output)
}

async fn list(args: TemplateListArgs, session: &Session) -> CliResult<()> {
    let namespace = session.namespace(&args.namespace);
    let templates = session
        .factory
        .list_templates(&namespace, args.scope.scope)
        .await?;
    let output = &session.output;

    if args.format == ListFormat::Json || output.is_json() {
        return output.json(&templates);
    }
    if args.format == ListFormat::List {
        for template in &templates {
            output.data(&template.name)?;
        }
        return Ok(());
    }

    if templates.is_empty() {
        output.info(&format!("No templates in namespace {namespace}"))?;
        return Ok(());
    }
    let rows: Vec<Vec<String>> = templates
        .iter()
        .map(|t| {
            vec![
                t.name.clone(),
                t.alias.clone(),
                t.scope.map(|s| s.to_string()).unwrap_or_default(),
                t.sensitive.to_string(),
                sink_names(t),
                format_time(t.create_time),
            ]
        })
        .collect();
    output.table(
        &["NAME", "ALIAS", "SCOPE", "SENSITIVE", "SINKS", "CREATED"],
        &rows,
    )?;
    Ok(())
}

async fn delete(args: DeleteArgs, session: &Session) -> CliResult<()> {
    let namespace = session.namespace(&args.namespace);
    if !confirm(
        &format!("Delete template {} from {namespace}?", args.name),
        args.yes,
    )? {
        return Err(CliError::Cancelled);
    }
    session
        .factory
        .delete_template(&namespace, &args.name)
        .await?;
    session
        .output
        .success(&format!("Template {} deleted from {namespace}", args.name))?;
    Ok(())
}

async fn builtin(args: BuiltinArgs, session: &Session) -> CliResult<()> {
    let output = &session.output;
    let templates = builtin_templates::all_scripts()
        .iter()
        .map(|builtin| {
            session
                .factory
                .parse_template(builtin.name, builtin.script.as_bytes())
        })
        .collect::<Result<Vec<_>, _>>()?;

    if !args.apply {
        if output.is_json() {
            return output.json(&templates);
        }
        let rows: Vec<Vec<String>> = templates
            .iter()
            .map(|t| vec![t.name.clone(), t.alias.clone(), t.description.clone()])
            .collect();
        output.table(&["NAME", "ALIAS", "DESCRIPTION"], &rows)?;
        return Ok(());
    }

    let namespace = args
        .namespace
        .unwrap_or_else(|| session.config.engine.system_namespace.clone());
    for template in &templates {
        session.factory.apply_template(&namespace, template).await?;
        output.success(&format!("Template {} applied in {namespace}", template.name))?;
    }
    Ok(())
}

// ── helpers ───────────────────────────────────────────────────────────────────

/// Parse a script; a script without a name falls back to its file stem.
fn parse_script(
    session: &Session,
    script: &ScriptFile,
    name: Option<&str>,
) -> CliResult<Template> {
    let factory = &session.factory;
    match factory.parse_template(name.unwrap_or_default(), &script.content) {
        Err(ConfluxError::Domain(DomainError::MissingName)) if !script.name_hint.is_empty() => {
            Ok(factory.parse_template(&script.name_hint, &script.content)?)
        }
        result => Ok(result?),
    }
}

fn show(template: &Template, output: &OutputManager) -> CliResult<()> {
    if output.is_json() {
        return output.json(template);
    }

    output.header(&template.name)?;
    if !template.namespace.is_empty() {
        output.field("Namespace", &template.namespace)?;
    }
    output.field("Alias", &template.alias)?;
    output.field("Description", &template.description)?;
    output.field(
        "Scope",
        &template.scope.map(|s| s.to_string()).unwrap_or_default(),
    )?;
    output.field("Sensitive", &template.sensitive.to_string())?;
    for sink in &template.expanded_writer.sinks {
        output.field(
            "Sink",
            &format!("{} -> {} ({})", sink.sink, sink.endpoint, sink.format.as_str()),
        )?;
    }
    if template.create_time.is_some() {
        output.field("Created", &format_time(template.create_time))?;
    }
    if let Some(schema) = &template.schema {
        output.header("Parameters")?;
        output.yaml(schema)?;
    }
    Ok(())
}

fn sink_names(template: &Template) -> String {
    template
        .expanded_writer
        .sinks
        .iter()
        .map(|s| s.sink.as_str())
        .collect::<Vec<_>>()
        .join(",")
}
