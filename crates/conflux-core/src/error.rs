//! Unified error handling for Conflux Core.
//!
//! This module provides a unified error type that wraps domain and application
//! errors, with rich context and user-actionable suggestions.

use thiserror::Error;

use crate::application::{ApplicationError, StoreError, WriterError};
use crate::domain::DomainError;

/// Root error type for Conflux Core operations.
///
/// This enum wraps all possible errors that can occur when using conflux-core,
/// providing a unified interface for error handling.
#[derive(Debug, Error, Clone)]
pub enum ConfluxError {
    /// Errors in templates or properties (caller errors).
    #[error(transparent)]
    Domain(#[from] DomainError),

    /// Errors from the application layer (lookups, storage, sinks).
    #[error(transparent)]
    Application(#[from] ApplicationError),

    /// Configuration or setup errors.
    #[error("Configuration error: {message}")]
    Configuration { message: String },

    /// Unexpected internal errors (bugs).
    #[error("Internal error: {message}. This is a bug, please report it.")]
    Internal { message: String },
}

impl ConfluxError {
    /// Get user-actionable suggestions for fixing this error.
    pub fn suggestions(&self) -> Vec<String> {
        match self {
            Self::Domain(e) => e.suggestions(),
            Self::Application(e) => e.suggestions(),
            Self::Configuration { message } => vec![
                format!("Configuration issue: {}", message),
                "Check your setup and try again".into(),
            ],
            Self::Internal { .. } => vec!["This appears to be a bug in Conflux".into()],
        }
    }

    /// Get error category for display/styling purposes.
    pub fn category(&self) -> ErrorCategory {
        match self {
            Self::Domain(_) => ErrorCategory::Validation,
            Self::Application(e) => e.category(),
            Self::Configuration { .. } => ErrorCategory::Configuration,
            Self::Internal { .. } => ErrorCategory::Internal,
        }
    }

    /// Check if this error is retryable.
    pub fn is_retryable(&self) -> bool {
        match self {
            Self::Application(e) => e.is_retryable(),
            _ => false,
        }
    }

    /// `true` for the not-found family of errors.
    pub fn is_not_found(&self) -> bool {
        self.category() == ErrorCategory::NotFound
    }
}

impl From<StoreError> for ConfluxError {
    fn from(source: StoreError) -> Self {
        Self::Application(ApplicationError::store("access the store", source))
    }
}

impl From<WriterError> for ConfluxError {
    fn from(source: WriterError) -> Self {
        Self::Application(ApplicationError::Sink {
            sink: "unknown".into(),
            source,
        })
    }
}

/// Error categories for UI display.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorCategory {
    Validation,
    NotFound,
    Sensitive,
    Sink,
    Configuration,
    Internal,
}

/// Convenient result type alias.
pub type ConfluxResult<T> = Result<T, ConfluxError>;

/// Extension trait for adding context to errors.
pub trait Context<T> {
    /// Add context to an error.
    fn context(self, msg: impl Into<String>) -> ConfluxResult<T>;
}

impl<T, E> Context<T> for Result<T, E>
where
    E: std::error::Error + Send + Sync + 'static,
{
    fn context(self, msg: impl Into<String>) -> ConfluxResult<T> {
        self.map_err(|e| ConfluxError::Internal {
            message: format!("{}: {}", msg.into(), e),
        })
    }
}
