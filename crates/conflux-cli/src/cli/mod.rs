//! CLI argument definitions using the clap derive API.
//!
//! This module is the *only* place that knows about argument names, aliases,
//! help text, and value enums.  No business logic lives here.

use std::path::PathBuf;

use clap::{Args, Parser, Subcommand, ValueEnum};
use conflux_core::domain::Scope;

pub mod global;
pub use global::{GlobalArgs, OutputFormat};

// ── Top-level CLI ─────────────────────────────────────────────────────────────

/// Main CLI entry-point.
#[derive(Debug, Parser)]
#[command(
    name    = "conflux",
    bin_name = "conflux",
    version  = env!("CARGO_PKG_VERSION"),
    author   = env!("CARGO_PKG_AUTHORS"),
    about    = "Configuration templates rendered into integrations",
    long_about = "Conflux turns parameterized configuration templates into \
                  integrations, stores them and publishes their derived \
                  payloads to config centers such as Nacos.",
    after_help = "EXAMPLES:\n\
        \x20 conflux template apply ./templates\n\
        \x20 conflux template builtin --apply\n\
        \x20 conflux integration apply orders-cache -t cache-endpoint -p host=redis.local\n\
        \x20 conflux integration list -n team-a",
    arg_required_else_help = true,
    subcommand_required    = true,
)]
pub struct Cli {
    /// Flags available on every subcommand.
    #[command(flatten)]
    pub global: GlobalArgs,

    /// Subcommand to execute.
    #[command(subcommand)]
    pub command: Commands,
}

// ── Subcommands ───────────────────────────────────────────────────────────────

/// All available subcommands.
#[derive(Debug, Subcommand)]
pub enum Commands {
    /// Parse, store and inspect templates.
    #[command(
        subcommand,
        visible_alias = "t",
        about = "Manage templates",
        after_help = "EXAMPLES:\n\
            \x20 conflux template parse cache-endpoint.toml\n\
            \x20 conflux template apply ./templates -n default\n\
            \x20 conflux template list --format json"
    )]
    Template(TemplateCommands),

    /// Build, distribute and inspect integrations.
    #[command(
        subcommand,
        visible_alias = "i",
        about = "Manage integrations",
        after_help = "EXAMPLES:\n\
            \x20 conflux integration apply orders-cache -t cache-endpoint -p host=redis.local\n\
            \x20 conflux integration apply app-config -t nacos-config \\\n\
            \x20     --template-namespace conflux-system -f app-config.yaml\n\
            \x20 conflux integration read orders-cache"
    )]
    Integration(IntegrationCommands),

    /// Initialise a Conflux configuration file.
    #[command(
        about = "Initialise configuration",
        after_help = "EXAMPLES:\n\
            \x20 conflux init           # platform config location\n\
            \x20 conflux init --local   # .conflux.toml in CWD"
    )]
    Init(InitArgs),

    /// Generate shell completion scripts.
    #[command(
        about = "Generate shell completions",
        after_help = "EXAMPLES:\n\
            \x20 conflux completions bash > ~/.local/share/bash-completion/completions/conflux\n\
            \x20 conflux completions zsh  > ~/.zfunc/_conflux\n\
            \x20 conflux completions fish > ~/.config/fish/completions/conflux.fish"
    )]
    Completions(CompletionsArgs),

    /// Inspect the Conflux configuration.
    #[command(
        about = "Configuration management",
        subcommand,
        after_help = "EXAMPLES:\n\
            \x20 conflux config get engine.system_namespace\n\
            \x20 conflux config list\n\
            \x20 conflux config path"
    )]
    Config(ConfigCommands),
}

// ── template ──────────────────────────────────────────────────────────────────

/// Subcommands for `conflux template`.
#[derive(Debug, Subcommand)]
pub enum TemplateCommands {
    /// Parse a script and print what it declares, without storing it.
    Parse(TemplateParseArgs),
    /// Parse scripts from a file or directory and store them.
    Apply(TemplateApplyArgs),
    /// Show a stored template.
    Get(NamedArgs),
    /// List the templates of a namespace.
    #[command(visible_alias = "ls")]
    List(TemplateListArgs),
    /// Delete a stored template.
    #[command(visible_alias = "rm")]
    Delete(DeleteArgs),
    /// List or install the templates shipped with Conflux.
    Builtin(BuiltinArgs),
}

/// Arguments for `conflux template parse`.
#[derive(Debug, Args)]
pub struct TemplateParseArgs {
    /// Template script file.
    #[arg(value_name = "FILE")]
    pub file: PathBuf,

    /// Name to use instead of the one declared in the script.
    #[arg(long = "name", value_name = "NAME")]
    pub name: Option<String>,
}

/// Arguments for `conflux template apply`.
#[derive(Debug, Args)]
pub struct TemplateApplyArgs {
    /// Template script file, or a directory searched for `*.toml` scripts.
    #[arg(value_name = "PATH")]
    pub path: PathBuf,

    /// Name to use instead of the one declared in the script.
    ///
    /// Only valid when a single script is applied.
    #[arg(long = "name", value_name = "NAME")]
    pub name: Option<String>,

    #[command(flatten)]
    pub namespace: NamespaceArg,
}

/// Arguments for `conflux template list`.
#[derive(Debug, Args)]
pub struct TemplateListArgs {
    #[command(flatten)]
    pub namespace: NamespaceArg,

    #[command(flatten)]
    pub scope: ScopeArg,

    /// Output format.
    #[arg(
        long = "format",
        value_enum,
        default_value = "table",
        help = "Output format"
    )]
    pub format: ListFormat,
}

/// Arguments for `conflux template builtin`.
#[derive(Debug, Args)]
pub struct BuiltinArgs {
    /// Store the shipped templates.
    #[arg(long = "apply", help = "Install the shipped templates")]
    pub apply: bool,

    /// Namespace to install into (default: the system namespace).
    #[arg(short = 'n', long = "namespace", value_name = "NS")]
    pub namespace: Option<String>,
}

// ── integration ───────────────────────────────────────────────────────────────

/// Subcommands for `conflux integration`.
#[derive(Debug, Subcommand)]
pub enum IntegrationCommands {
    /// Build an integration from a template and distribute it.
    Apply(IntegrationApplyArgs),
    /// Print the input properties of an integration.
    Read(NamedArgs),
    /// List the integrations of a namespace.
    #[command(visible_alias = "ls")]
    List(IntegrationListArgs),
    /// Delete an integration.
    #[command(visible_alias = "rm")]
    Delete(DeleteArgs),
}

/// Arguments for `conflux integration apply`.
#[derive(Debug, Args)]
pub struct IntegrationApplyArgs {
    /// Integration name.
    #[arg(value_name = "NAME")]
    pub name: String,

    /// Template to build from. Without it the properties are stored as-is.
    #[arg(short = 't', long = "template", value_name = "TEMPLATE")]
    pub template: Option<String>,

    /// Namespace of the template (default: the integration namespace).
    #[arg(long = "template-namespace", value_name = "NS")]
    pub template_namespace: Option<String>,

    #[command(flatten)]
    pub namespace: NamespaceArg,

    /// A property, `key=value`. Dotted keys build nested tables; values are
    /// read as YAML scalars.
    #[arg(short = 'p', long = "property", value_name = "KEY=VALUE")]
    pub properties: Vec<String>,

    /// YAML or JSON file with the properties. `-p` values override it.
    #[arg(short = 'f', long = "file", value_name = "FILE")]
    pub file: Option<PathBuf>,

    /// Display name stored with the integration.
    #[arg(long = "alias", value_name = "TEXT", default_value = "")]
    pub alias: String,

    #[arg(long = "description", value_name = "TEXT", default_value = "")]
    pub description: String,

    /// Render and print the integration without storing or publishing it.
    #[arg(long = "dry-run", help = "Show what would be applied")]
    pub dry_run: bool,
}

/// Arguments for `conflux integration list`.
#[derive(Debug, Args)]
pub struct IntegrationListArgs {
    #[command(flatten)]
    pub namespace: NamespaceArg,

    /// Only integrations built from this template.
    #[arg(short = 't', long = "template", value_name = "TEMPLATE")]
    pub template: Option<String>,

    #[command(flatten)]
    pub scope: ScopeArg,

    /// Output format.
    #[arg(
        long = "format",
        value_enum,
        default_value = "table",
        help = "Output format"
    )]
    pub format: ListFormat,
}

// ── shared ────────────────────────────────────────────────────────────────────

/// `-n/--namespace`, defaulting to `engine.default_namespace`.
#[derive(Debug, Args)]
pub struct NamespaceArg {
    #[arg(short = 'n', long = "namespace", value_name = "NS")]
    pub namespace: Option<String>,
}

/// `--scope system|namespace`.
#[derive(Debug, Args)]
pub struct ScopeArg {
    #[arg(long = "scope", value_name = "SCOPE", help = "Only this scope (system, namespace)")]
    pub scope: Option<Scope>,
}

/// An object addressed by name.
#[derive(Debug, Args)]
pub struct NamedArgs {
    #[arg(value_name = "NAME")]
    pub name: String,

    #[command(flatten)]
    pub namespace: NamespaceArg,
}

/// Arguments of the delete subcommands.
#[derive(Debug, Args)]
pub struct DeleteArgs {
    #[arg(value_name = "NAME")]
    pub name: String,

    #[command(flatten)]
    pub namespace: NamespaceArg,

    /// Skip the confirmation prompt.
    #[arg(short = 'y', long = "yes", help = "Delete without confirmation")]
    pub yes: bool,
}

/// Output format for the `list` commands.
#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum ListFormat {
    /// Human-readable table.
    Table,
    /// One name per line.
    List,
    /// JSON array.
    Json,
}

// ── init ──────────────────────────────────────────────────────────────────────

/// Arguments for `conflux init`.
#[derive(Debug, Args)]
pub struct InitArgs {
    /// Write to `.conflux.toml` in the current directory.
    #[arg(
        long = "local",
        help = "Create local configuration in current directory"
    )]
    pub local: bool,

    /// Overwrite an existing config file.
    #[arg(short = 'f', long = "force", help = "Overwrite existing configuration")]
    pub force: bool,
}

// ── completions ───────────────────────────────────────────────────────────────

/// Arguments for `conflux completions`.
#[derive(Debug, Args)]
pub struct CompletionsArgs {
    /// Target shell.
    #[arg(value_enum, help = "Shell to generate completions for")]
    pub shell: Shell,
}

/// Supported shells for completion generation.
#[derive(Debug, Clone, Copy, ValueEnum)]
pub enum Shell {
    Bash,
    Zsh,
    Fish,
    PowerShell,
    Elvish,
}

// ── config subcommands ────────────────────────────────────────────────────────

/// Subcommands for `conflux config`.
#[derive(Debug, Subcommand)]
pub enum ConfigCommands {
    /// Print the value of a configuration key.
    Get {
        /// Dotted key path, e.g. `engine.system_namespace`.
        key: String,
    },
    /// Print all configuration values.
    List,
    /// Print the path to the configuration file.
    Path,
}

// ── tests ─────────────────────────────────────────────────────────────────────
