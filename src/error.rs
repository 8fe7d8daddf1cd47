//! Error types for Podsum.

use crate::services::UpstreamService;
use thiserror::Error;

/// Library-level error type for Podsum operations.
#[derive(Error, Debug)]
pub enum PodsumError {
    #[error("Validation error: {0}")]
    Validation(String),

    #[error("Upstream {service} service error: {message}")]
    Upstream {
        service: UpstreamService,
        message: String,
    },

    #[error("Persistence error: {0}")]
    Persistence(String),

    #[error("Configuration error: {0}")]
    Config(String),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("TOML parse error: {0}")]
    TomlParse(#[from] toml::de::Error),
}

impl PodsumError {
    /// Shorthand for an upstream failure attributed to `service`.
    pub fn upstream(service: UpstreamService, message: impl Into<String>) -> Self {
        PodsumError::Upstream {
            service,
            message: message.into(),
        }
    }

    /// Classification used at the inbound boundary.
    pub fn kind(&self) -> ErrorKind {
        match self {
            PodsumError::Validation(_) => ErrorKind::Validation,
            PodsumError::Upstream { .. } => ErrorKind::Upstream,
            PodsumError::Persistence(_) => ErrorKind::Persistence,
            PodsumError::Config(_) => ErrorKind::Config,
            PodsumError::Io(_) | PodsumError::Json(_) | PodsumError::TomlParse(_) => {
                ErrorKind::Internal
            }
        }
    }

    /// The upstream service that failed, if this is an upstream error.
    pub fn upstream_service(&self) -> Option<UpstreamService> {
        match self {
            PodsumError::Upstream { service, .. } => Some(*service),
            _ => None,
        }
    }
}

// Store failures all surface as persistence errors, whatever the backend.
impl From<rusqlite::Error> for PodsumError {
    fn from(e: rusqlite::Error) -> Self {
        PodsumError::Persistence(e.to_string())
    }
}

/// Coarse error classification.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorKind {
    Validation,
    Upstream,
    Persistence,
    Config,
    Internal,
}

impl ErrorKind {
    pub fn as_str(self) -> &'static str {
        match self {
            ErrorKind::Validation => "validation",
            ErrorKind::Upstream => "upstream",
            ErrorKind::Persistence => "persistence",
            ErrorKind::Config => "config",
            ErrorKind::Internal => "internal",
        }
    }

    /// Whether the caller may retry the whole run.
    ///
    /// Persistence failures are retryable only after the caller has inspected
    /// what the store already holds for the episode.
    pub fn is_retryable(self) -> bool {
        matches!(self, ErrorKind::Upstream | ErrorKind::Persistence)
    }
}

impl std::fmt::Display for ErrorKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Result type alias for Podsum operations.
pub type Result<T> = std::result::Result<T, PodsumError>;
