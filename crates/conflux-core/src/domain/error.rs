// ============================================================================
// domain/error.rs - VALIDATION AND RENDERING ERRORS
// ============================================================================

use thiserror::Error;

use super::value::ValueKind;

/// Root domain error type.
///
/// All errors are:
/// - Cloneable
/// - Actionable (provides suggestions)
/// - Non-retryable: they describe the template or the input, not the backend
#[derive(Debug, Error, Clone, PartialEq)]
pub enum DomainError {
    // ========================================================================
    // Template Parse Errors (400-level equivalent)
    // ========================================================================
    #[error("the template script is invalid: {0}")]
    InvalidScript(String),

    #[error("the properties of the template script are invalid: {0}")]
    InvalidSchema(String),

    #[error("the template declares no name and no default name was given")]
    MissingName,

    #[error("unknown output format '{0}'")]
    InvalidFormat(String),

    // ========================================================================
    // Render Errors
    // ========================================================================
    #[error("the properties do not match the template: {path}: {reason}")]
    InvalidProperties { path: String, reason: String },

    #[error("fail to render the template: {0}")]
    Render(String),

    #[error("the template output is invalid: {0}")]
    InvalidOutput(String),

    #[error("failed to validate config: {0}")]
    ValidationFailed(String),

    // ========================================================================
    // Encoding Errors
    // ========================================================================
    #[error("unsupported {kind} value at '{path}'")]
    UnsupportedValue { path: String, kind: ValueKind },

    #[error("fail to encode the content as {format}: {reason}")]
    Encoding { format: String, reason: String },
}

impl DomainError {
    /// Get user-actionable suggestions for fixing this error.
    pub fn suggestions(&self) -> Vec<String> {
        match self {
            Self::InvalidScript(msg) => vec![
                "Check the TOML syntax and the {{ }} expressions of the script".into(),
                format!("Details: {}", msg),
            ],
            Self::InvalidSchema(_) => vec![
                "Every [template.parameter.<field>] table needs a valid `type`".into(),
                "Supported types: string, integer, number, boolean, object, array, any".into(),
            ],
            Self::MissingName => vec![
                "Set `name` in the [metadata] table".into(),
                "Or pass a name explicitly with --name".into(),
            ],
            Self::InvalidFormat(_) => vec![
                "Supported formats: yaml, json, toml, properties".into(),
            ],
            Self::InvalidProperties { path, .. } => vec![
                format!("Check the value given for '{}'", path),
                "Use `conflux template get <name>` to see the expected properties".into(),
            ],
            Self::ValidationFailed(_) => vec![
                "The template's [template.validation] rejected these properties".into(),
                "Use `conflux template get <name>` to see the expected properties".into(),
            ],
            Self::UnsupportedValue { .. } => vec![
                "The properties format only supports nested maps of scalars".into(),
                "Choose json or yaml for content containing lists".into(),
            ],
            _ => vec!["See documentation for more details".into()],
        }
    }
}
