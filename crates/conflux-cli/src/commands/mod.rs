//! Command handlers.
//!
//! Each handler translates parsed arguments into factory calls and renders
//! the results. [`Session`] wires the adapters selected by the configuration.

use std::io::IsTerminal as _;
use std::sync::Arc;
use std::time::Duration;

use tracing::debug;

use conflux_adapters::{FileObjectStore, InMemoryObjectStore, MiniJinjaEngine, NacosWriter};
use conflux_core::{
    application::{IntegrationFactory, ObjectStore, WriterRegistry},
    error::ConfluxError,
};

use crate::{
    cli::{GlobalArgs, NamespaceArg},
    config::{AppConfig, StoreBackend},
    error::{CliError, CliResult},
    output::OutputManager,
};

pub mod completions;
pub mod config;
pub mod init;
pub mod integration;
pub mod template;

/// Factory, configuration and output shared by the store-backed commands.
pub struct Session {
    pub factory: IntegrationFactory,
    pub config: AppConfig,
    pub output: OutputManager,
}

impl Session {
    /// Build the factory from the configured store and writers.
    pub fn open(global: &GlobalArgs, config: AppConfig, output: OutputManager) -> CliResult<Self> {
        let store = open_store(global, &config);
        let writers = writer_registry(&config)?;
        debug!(writers = ?writers, "Writers registered");

        let factory = IntegrationFactory::new(store, Box::new(MiniJinjaEngine::new()), writers)
            .with_config(config.factory_config());
        Ok(Self {
            factory,
            config,
            output,
        })
    }

    /// The requested namespace, or `engine.default_namespace`.
    pub fn namespace(&self, arg: &NamespaceArg) -> String {
        arg.namespace
            .clone()
            .filter(|ns| !ns.is_empty())
            .unwrap_or_else(|| self.config.engine.default_namespace.clone())
    }
}

fn open_store(global: &GlobalArgs, config: &AppConfig) -> Box<dyn ObjectStore> {
    if let Some(path) = &global.store {
        debug!(path = %path.display(), "Using file store from --store");
        return Box::new(FileObjectStore::new(path));
    }
    match config.store.backend {
        StoreBackend::File => {
            let path = config.store_path();
            debug!(path = %path.display(), "Using file store");
            Box::new(FileObjectStore::new(path))
        }
        StoreBackend::Memory => {
            debug!("Using in-memory store; nothing outlives this command");
            Box::new(InMemoryObjectStore::new())
        }
    }
}

fn writer_registry(config: &AppConfig) -> CliResult<WriterRegistry> {
    let mut writers = WriterRegistry::new();
    if config.writers.nacos.enabled {
        let nacos = NacosWriter::new(Duration::from_secs(
            config.writers.nacos.request_timeout_secs,
        ))
        .map_err(ConfluxError::from)?;
        writers
            .register(Arc::new(nacos))
            .map_err(ConfluxError::from)?;
    }
    Ok(writers)
}

/// Ask before a destructive step. `yes` and non-interactive stdin skip the
/// prompt.
pub fn confirm(prompt: &str, yes: bool) -> CliResult<bool> {
    if yes || !std::io::stdin().is_terminal() {
        return Ok(true);
    }
    ask(prompt)
}

#[cfg(feature = "interactive")]
fn ask(prompt: &str) -> CliResult<bool> {
    dialoguer::Confirm::new()
        .with_prompt(prompt)
        .default(false)
        .interact()
        .map_err(|e| CliError::IoError {
            message: "failed to read confirmation input".into(),
            source: std::io::Error::other(e),
        })
}

#[cfg(not(feature = "interactive"))]
fn ask(prompt: &str) -> CliResult<bool> {
    use std::io::{self, Write};

    print!("{prompt} [y/N] ");
    io::stdout().flush().map_err(|e| CliError::IoError {
        message: "failed to flush stdout".into(),
        source: e,
    })?;

    let mut input = String::new();
    io::stdin()
        .read_line(&mut input)
        .map_err(|e| CliError::IoError {
            message: "failed to read confirmation input".into(),
            source: e,
        })?;

    let input = input.trim().to_ascii_lowercase();
    Ok(input == "y" || input == "yes")
}

/// `create_time` column text.
pub fn format_time(time: Option<chrono::DateTime<chrono::Utc>>) -> String {
    time.map(|t| t.format("%Y-%m-%d %H:%M:%S").to_string())
        .unwrap_or_else(|| "-".into())
}
