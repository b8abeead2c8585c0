//! Application layer errors.
//!
//! These errors represent failures in orchestration, storage and delivery,
//! not in the templates themselves. Template and property errors are
//! `DomainError` from `crate::domain`.

use std::time::Duration;
use thiserror::Error;

use crate::error::ErrorCategory;

/// Errors reported by an [`ObjectStore`](super::ports::ObjectStore) adapter.
#[derive(Debug, Error, Clone, PartialEq)]
pub enum StoreError {
    #[error("{kind} {namespace}/{name} not found")]
    NotFound {
        kind: String,
        namespace: String,
        name: String,
    },

    #[error("the store did not answer within {0:?}")]
    Timeout(Duration),

    #[error("store backend error: {0}")]
    Backend(String),
}

impl StoreError {
    pub fn is_not_found(&self) -> bool {
        matches!(self, Self::NotFound { .. })
    }
}

/// Errors reported by a [`SinkWriter`](super::ports::SinkWriter).
#[derive(Debug, Error, Clone, PartialEq)]
pub enum WriterError {
    /// The endpoint integration is missing or unusable.
    #[error("endpoint {name}: {reason}")]
    Endpoint { name: String, reason: String },

    /// The payload or its metadata cannot be delivered as given.
    #[error("invalid writer config: {0}")]
    InvalidConfig(String),

    /// The remote could not be reached.
    #[error("connection failed: {0}")]
    Connection(String),

    /// The remote answered but refused the payload.
    #[error("rejected by the remote: {0}")]
    Rejected(String),

    /// The writer panicked; the panic was contained.
    #[error("the writer panicked: {0}")]
    Panicked(String),
}

/// Errors that occur during application orchestration.
#[derive(Debug, Error, Clone)]
pub enum ApplicationError {
    #[error("the template {name} is not found in namespace {namespace}")]
    TemplateNotFound { name: String, namespace: String },

    #[error("the integration {name} is not found in namespace {namespace}")]
    IntegrationNotFound { name: String, namespace: String },

    #[error("the integration {name} is sensitive, its properties cannot be read")]
    SensitiveIntegration { name: String },

    #[error("the object {name} is not an integration")]
    NotAnIntegration { name: String },

    #[error("the template of the integration {name} can not be changed from '{from}' to '{to}'")]
    TemplateChanged {
        name: String,
        from: String,
        to: String,
    },

    #[error("the type of the integration {name} can not be changed from '{from}' to '{to}'")]
    TypeChanged {
        name: String,
        from: String,
        to: String,
    },

    #[error("fail to {operation}: {source}")]
    Store {
        operation: String,
        #[source]
        source: StoreError,
    },

    #[error("fail to write to the {sink} sink: {source}")]
    Sink {
        sink: String,
        #[source]
        source: WriterError,
    },

    #[error("a writer for sink kind '{kind}' is already registered")]
    DuplicateWriter { kind: String },

    #[error("no writer is registered for sink kind '{kind}'")]
    UnknownSink { kind: String },
}

impl ApplicationError {
    /// Wrap a store failure with the operation it interrupted.
    pub fn store(operation: impl Into<String>, source: StoreError) -> Self {
        Self::Store {
            operation: operation.into(),
            source,
        }
    }

    /// Get user-actionable suggestions.
    pub fn suggestions(&self) -> Vec<String> {
        match self {
            Self::TemplateNotFound { namespace, .. } => vec![
                format!("Try: conflux template list -n {}", namespace),
                "Built-in templates can be installed with: conflux template builtin --apply".into(),
            ],
            Self::IntegrationNotFound { namespace, .. } => vec![format!(
                "Try: conflux integration list -n {}",
                namespace
            )],
            Self::SensitiveIntegration { .. } => vec![
                "Sensitive integrations only expose their metadata".into(),
                "Use `conflux integration list` to see it".into(),
            ],
            Self::NotAnIntegration { .. } => {
                vec!["Only objects created by `conflux integration apply` can be deleted".into()]
            }
            Self::TemplateChanged { name, .. } | Self::TypeChanged { name, .. } => vec![
                format!("Delete it first with: conflux integration delete {}", name),
                "Or apply under another name".into(),
            ],
            Self::Store { source, .. } => match source {
                StoreError::Timeout(_) => vec![
                    "The store is slow to answer".into(),
                    "Try again in a moment".into(),
                ],
                _ => vec!["Check the store configuration with: conflux config list".into()],
            },
            Self::Sink { sink, .. } => vec![
                format!("The integration was saved, but the {} sink was not updated", sink),
                "Check the endpoint integration and apply again".into(),
            ],
            Self::DuplicateWriter { .. } => {
                vec!["Register each sink writer only once".into()]
            }
            Self::UnknownSink { kind } => vec![
                format!("No writer handles the '{}' sink", kind),
                "Check that the writer is enabled in the configuration".into(),
            ],
        }
    }

    /// Get error category.
    pub fn category(&self) -> ErrorCategory {
        match self {
            Self::TemplateNotFound { .. } | Self::IntegrationNotFound { .. } => {
                ErrorCategory::NotFound
            }
            Self::SensitiveIntegration { .. } => ErrorCategory::Sensitive,
            Self::NotAnIntegration { .. }
            | Self::TemplateChanged { .. }
            | Self::TypeChanged { .. } => ErrorCategory::Validation,
            Self::Store { .. } => ErrorCategory::Internal,
            Self::Sink { .. } | Self::UnknownSink { .. } => ErrorCategory::Sink,
            Self::DuplicateWriter { .. } => ErrorCategory::Configuration,
        }
    }

    /// Whether repeating the call may succeed.
    pub fn is_retryable(&self) -> bool {
        match self {
            Self::Store { source, .. } => {
                matches!(source, StoreError::Timeout(_) | StoreError::Backend(_))
            }
            Self::Sink { source, .. } => matches!(source, WriterError::Connection(_)),
            _ => false,
        }
    }
}
