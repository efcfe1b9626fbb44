use thiserror::Error;

use crate::services::cascade::CascadeStep;

/// Malformed path pattern. Only ever produced while compiling configuration.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum PatternError {
    #[error("pattern is empty")]
    Empty,

    #[error("pattern '{0}' must start with '/'")]
    MissingLeadingSlash(String),

    #[error("pattern '{pattern}' has an empty segment at position {position}")]
    EmptySegment { pattern: String, position: usize },

    #[error("pattern '{pattern}' has an invalid wildcard segment '{segment}'")]
    InvalidWildcard { pattern: String, segment: String },
}

/// Authorization configuration errors. Fatal at startup, never produced per request.
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("invalid pattern for role {role}: {source}")]
    InvalidPattern {
        role: String,
        #[source]
        source: PatternError,
    },

    #[error("invalid public path: {0}")]
    InvalidPublicPath(#[source] PatternError),

    #[error("invalid enrollment path: {0}")]
    InvalidEnrollmentPath(#[source] PatternError),

    #[error("duplicate policy entry for role {0}")]
    DuplicateRole(String),

    #[error("unknown role in policy: {0}")]
    UnknownRole(String),

    #[error("failed to read policy file {path}: {source}")]
    Io {
        path: String,
        #[source]
        source: std::io::Error,
    },

    #[error("failed to parse policy file: {0}")]
    Parse(#[from] serde_yaml::Error),
}

/// Per-request authorization failures, recovered at the request boundary
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum AuthzError {
    #[error("authentication required")]
    Unauthenticated,

    #[error("no role assigned to this account")]
    NoRole,

    #[error("role {role} is not permitted to access {path}")]
    PolicyDenied { role: String, path: String },

    #[error("{0} not found")]
    NotFound(String),

    #[error("{0}")]
    Forbidden(String),

    #[error("cascade delete failed at the {step} step: {cause}")]
    CascadeStepFailure { step: CascadeStep, cause: String },
}
