//! Error types for workspace assembly
//!
//! Errors are structured with fields to aid debugging in production.
//! Each variant carries the context a caller needs to decide whether the
//! failure is user-visible (not found) or internal.

use thiserror::Error;

/// Default context value when no specific context is available
pub const UNKNOWN_CONTEXT: &str = "unknown";

/// Main error type for workspace assembly
#[derive(Debug, Error)]
pub enum Error {
    /// Kubernetes API error
    #[error("kubernetes error: {source}")]
    Kube {
        /// The underlying kube-rs error
        #[from]
        source: kube::Error,
    },

    /// The requested workspace, custom resource or devfile does not exist
    #[error("{resource} not found: {message}")]
    NotFound {
        /// What was looked up (e.g., "workspace", "custom resource", "devfile")
        resource: String,
        /// Description of what was missing
        message: String,
    },

    /// Input from the cluster could not be parsed
    #[error("malformed {input}: {message}")]
    MalformedInput {
        /// Which input was malformed (e.g., "devfile", "runtime")
        input: String,
        /// Description of the parse failure
        message: String,
    },

    /// Cluster objects disagree with each other (e.g., duplicate machine names)
    #[error("data integrity error for {key}: {message}")]
    DataIntegrity {
        /// The key that collided
        key: String,
        /// Description of the conflict
        message: String,
    },

    /// Process configuration error
    #[error("configuration error: {message}")]
    Config {
        /// Description of what's invalid
        message: String,
        /// The offending setting (e.g., "workspace id")
        field: Option<String>,
    },

    /// Internal/operational error
    #[error("internal error [{context}]: {message}")]
    Internal {
        /// Description of what failed
        message: String,
        /// Context where the error occurred (e.g., "retriever", "composer")
        context: String,
    },
}

impl Error {
    /// Create a not-found error for the given resource kind
    pub fn not_found(resource: impl Into<String>, msg: impl Into<String>) -> Self {
        Self::NotFound {
            resource: resource.into(),
            message: msg.into(),
        }
    }

    /// Create a malformed-input error for the given input kind
    pub fn malformed(input: impl Into<String>, msg: impl Into<String>) -> Self {
        Self::MalformedInput {
            input: input.into(),
            message: msg.into(),
        }
    }

    /// Create a data integrity error for a colliding key
    pub fn data_integrity(key: impl Into<String>, msg: impl Into<String>) -> Self {
        Self::DataIntegrity {
            key: key.into(),
            message: msg.into(),
        }
    }

    /// Create a configuration error with the given message
    pub fn config(msg: impl Into<String>) -> Self {
        Self::Config {
            message: msg.into(),
            field: None,
        }
    }

    /// Create a configuration error naming the offending setting
    pub fn config_for_field(field: impl Into<String>, msg: impl Into<String>) -> Self {
        Self::Config {
            message: msg.into(),
            field: Some(field.into()),
        }
    }

    /// Create an internal error with the given message
    pub fn internal(msg: impl Into<String>) -> Self {
        Self::Internal {
            message: msg.into(),
            context: UNKNOWN_CONTEXT.to_string(),
        }
    }

    /// Create an internal error with context
    pub fn internal_with_context(context: impl Into<String>, msg: impl Into<String>) -> Self {
        Self::Internal {
            message: msg.into(),
            context: context.into(),
        }
    }

    /// Whether this error should be reported to the caller as "not found"
    pub fn is_not_found(&self) -> bool {
        matches!(self, Error::NotFound { .. })
    }

    /// Short, stable name of the error category for logs
    pub fn kind(&self) -> &'static str {
        match self {
            Error::Kube { .. } => "kube",
            Error::NotFound { .. } => "not_found",
            Error::MalformedInput { .. } => "malformed_input",
            Error::DataIntegrity { .. } => "data_integrity",
            Error::Config { .. } => "config",
            Error::Internal { .. } => "internal",
        }
    }

    /// Get the context if this error has one
    pub fn context(&self) -> Option<&str> {
        match self {
            Error::Internal { context, .. } => Some(context),
            _ => None,
        }
    }
}
