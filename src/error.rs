use thiserror::Error;

pub type Result<T> = std::result::Result<T, NotifierError>;

/// Every way a single invocation can go wrong.
///
/// `Metadata` and `Dispatch` are absorbed by the upload handler (logged, then
/// the invocation continues). All other variants abort the invocation.
#[derive(Error, Debug)]
pub enum NotifierError {
    #[error("Configuration error: {0}")]
    Config(String),

    #[error("Malformed upload event: {0}")]
    Event(String),

    #[error("Authentication failed: {0}")]
    Authentication(String),

    #[error("Activity lookup failed: {0}")]
    Lookup(String),

    #[error("Template error: {0}")]
    Template(String),

    #[error("Object metadata unavailable: {0}")]
    Metadata(String),

    #[error("Could not issue download link: {0}")]
    Link(String),

    #[error("Email dispatch failed: {0}")]
    Dispatch(String),
}

impl NotifierError {
    /// Whether the upload handler carries on after this error.
    pub fn is_degraded(&self) -> bool {
        matches!(self, NotifierError::Metadata(_) | NotifierError::Dispatch(_))
    }
}
