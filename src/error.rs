use thiserror::Error as ThisError;

use crate::identity::Role;
use crate::nlu::NluError;

/// Startup errors of the server.
///
/// Request-time failures never surface as `Error`: token problems become gate
/// redirects and translation problems become empty results.
#[derive(Debug, ThisError)]
pub enum Error {
    /// The NLU client could not be built
    #[error("nlu client unavailable: {0}")]
    Nlu(#[from] NluError),
    /// Startup configuration was rejected
    #[error("invalid configuration: {0}")]
    Config(String),
    /// The log subscriber could not be installed
    #[error("logging setup failed: {0}")]
    Logging(String),
}

/// A gate violation with details about why a request was turned away.
///
/// Violations never reach the end user. They exist so the gate can log
/// why it redirected; the response itself is only ever a redirect.
#[derive(Debug, Clone, PartialEq, Eq, ThisError)]
#[error("{kind}: {message}")]
pub struct Violation {
    /// The kind of violation that occurred
    pub kind: ViolationKind,
    /// Human-readable message explaining the violation
    pub message: String,
}

impl Violation {
    /// Creates a new violation.
    pub fn new(kind: ViolationKind, message: impl Into<String>) -> Self {
        Self {
            kind,
            message: message.into(),
        }
    }
}

/// The kind of gate violation.
#[derive(Debug, Clone, Copy, PartialEq, Eq, ThisError)]
pub enum ViolationKind {
    /// No token, or a token that failed to decode
    #[error("Unauthenticated")]
    Unauthenticated,
    /// Token decoded but its primary role is not a known role
    #[error("Unknown role")]
    UnknownRole,
    /// Authenticated, but the path belongs to another role's area
    #[error("Wrong area '{area}'")]
    WrongArea {
        /// The role that owns the requested area
        area: Role,
    },
}
