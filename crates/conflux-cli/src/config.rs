//! Application configuration.
//!
//! [`AppConfig`] is loaded once at startup and passed down by value.  The
//! CLI layer owns config; the core crate only sees the [`FactoryConfig`]
//! derived from it.
//!
//! # Resolution order (highest priority first)
//!
//! 1. CLI flags (handled at the call-site, not here)
//! 2. Environment variables: `CONFLUX_` prefix, `__` between sections,
//!    e.g. `CONFLUX_ENGINE__SYSTEM_NAMESPACE=ops`
//! 3. The `--config` file, else `.conflux.toml` in the current directory,
//!    else the platform config file
//! 4. Built-in defaults (always present)

use std::path::{Path, PathBuf};
use std::time::Duration;

use anyhow::Context as _;
use config::{Config, Environment, File, FileFormat};
use serde::{Deserialize, Serialize};

use conflux_core::application::{FactoryConfig, DEFAULT_SYSTEM_NAMESPACE};

/// Name of the per-directory configuration file.
pub const LOCAL_CONFIG_FILE: &str = ".conflux.toml";

/// Application configuration.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct AppConfig {
    /// Where objects are kept.
    pub store: StoreConfig,
    /// Namespaces and store timeouts.
    pub engine: EngineConfig,
    /// Sink writers.
    pub writers: WritersConfig,
    /// Output settings.
    pub output: OutputConfig,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum StoreBackend {
    #[default]
    File,
    Memory,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct StoreConfig {
    pub backend: StoreBackend,
    /// Root of the file store; the platform data directory when unset.
    pub path: Option<PathBuf>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct EngineConfig {
    pub system_namespace: String,
    pub default_namespace: String,
    pub request_timeout_secs: u64,
    pub template_list_timeout_secs: u64,
    pub integration_list_timeout_secs: u64,
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self {
            system_namespace: DEFAULT_SYSTEM_NAMESPACE.into(),
            default_namespace: "default".into(),
            request_timeout_secs: 10,
            template_list_timeout_secs: 60,
            integration_list_timeout_secs: 180,
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct WritersConfig {
    pub nacos: NacosWriterConfig,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct NacosWriterConfig {
    pub enabled: bool,
    pub request_timeout_secs: u64,
}

impl Default for NacosWriterConfig {
    fn default() -> Self {
        Self {
            enabled: true,
            request_timeout_secs: 10,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct OutputConfig {
    pub no_color: bool,
    pub format: String,
}

impl Default for OutputConfig {
    fn default() -> Self {
        Self {
            no_color: false,
            format: "auto".into(),
        }
    }
}

impl AppConfig {
    /// Load configuration from defaults, a config file and the environment.
    ///
    /// An explicit `config_file` must exist; the implicit locations are
    /// optional.
    pub fn load(config_file: Option<&PathBuf>) -> anyhow::Result<Self> {
        let mut builder = Config::builder().add_source(
            Config::try_from(&Self::default()).context("Failed to encode default configuration")?,
        );

        builder = match config_file {
            Some(path) => builder.add_source(toml_file(path).required(true)),
            None => {
                let local = PathBuf::from(LOCAL_CONFIG_FILE);
                if local.exists() {
                    builder.add_source(toml_file(&local).required(true))
                } else {
                    builder.add_source(toml_file(&Self::config_path()).required(false))
                }
            }
        };

        builder
            .add_source(
                Environment::with_prefix("CONFLUX")
                    .prefix_separator("_")
                    .separator("__")
                    .try_parsing(true),
            )
            .build()
            .context("Failed to read configuration")?
            .try_deserialize()
            .context("Invalid configuration")
    }

    /// Path to the platform configuration file.
    ///
    /// Uses `directories::ProjectDirs` for cross-platform correctness,
    /// falling back to `.conflux.toml` in the current directory.
    pub fn config_path() -> PathBuf {
        directories::ProjectDirs::from("io", "conflux", "conflux")
            .map(|d| d.config_dir().join("config.toml"))
            .unwrap_or_else(|| PathBuf::from(LOCAL_CONFIG_FILE))
    }

    /// Root of the file object store.
    pub fn store_path(&self) -> PathBuf {
        self.store.path.clone().unwrap_or_else(|| {
            directories::ProjectDirs::from("io", "conflux", "conflux")
                .map(|d| d.data_dir().join("store"))
                .unwrap_or_else(|| PathBuf::from(".conflux").join("store"))
        })
    }

    /// Settings handed to the integration factory.
    pub fn factory_config(&self) -> FactoryConfig {
        FactoryConfig {
            system_namespace: self.engine.system_namespace.clone(),
            request_timeout: Duration::from_secs(self.engine.request_timeout_secs),
            template_list_timeout: Duration::from_secs(self.engine.template_list_timeout_secs),
            integration_list_timeout: Duration::from_secs(
                self.engine.integration_list_timeout_secs,
            ),
        }
    }
}

fn toml_file(path: &Path) -> File<config::FileSourceFile, FileFormat> {
    File::from(path).format(FileFormat::Toml)
}
