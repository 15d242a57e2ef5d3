//! Error handling for Haven.
//!
//! Every fallible path in the workspace funnels into [`AppError`]: a kind,
//! a human-readable message, and an optional boxed cause kept for the logs.
//! The HTTP layer maps each [`ErrorKind`] onto a status code, and the
//! stable strings from [`ErrorKind::code`] are what API clients branch on.

use std::error::Error as StdError;
use std::fmt;

use thiserror::Error;

/// Classifies an [`AppError`] for status mapping and client branching.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, serde::Serialize, serde::Deserialize)]
pub enum ErrorKind {
    /// No usable credentials were presented, the credentials were wrong,
    /// or the account is locked out after repeated failures.
    AuthenticationRequired,
    /// A presented token failed verification: malformed, expired, revoked,
    /// or replayed after rotation.
    InvalidOrExpiredToken,
    /// The account exists but an administrator has deactivated it.
    AccountDeactivated,
    /// The account's email address is still unverified.
    EmailNotVerified,
    /// The caller is authenticated but the permission check refused the
    /// action.
    InsufficientPermissions,
    /// Nothing matched the requested identifier.
    NotFound,
    /// The request collides with existing state, such as a duplicate email
    /// or an illegal status transition.
    Conflict,
    /// The request payload failed validation.
    Validation,
    /// The database rejected or failed an operation.
    Database,
    /// The runtime configuration is missing or malformed.
    Configuration,
    /// Encoding or decoding a payload failed.
    Serialization,
    /// Any other failure; the detail is logged and never sent to clients.
    Internal,
}

impl ErrorKind {
    /// Stable machine-readable code carried in API error bodies.
    pub fn code(self) -> &'static str {
        match self {
            Self::AuthenticationRequired => "AUTHENTICATION_REQUIRED",
            Self::InvalidOrExpiredToken => "INVALID_OR_EXPIRED_TOKEN",
            Self::AccountDeactivated => "ACCOUNT_DEACTIVATED",
            Self::EmailNotVerified => "EMAIL_NOT_VERIFIED",
            Self::InsufficientPermissions => "INSUFFICIENT_PERMISSIONS",
            Self::NotFound => "NOT_FOUND",
            Self::Conflict => "CONFLICT",
            Self::Validation => "VALIDATION",
            Self::Database => "DATABASE",
            Self::Configuration => "CONFIGURATION",
            Self::Serialization => "SERIALIZATION",
            Self::Internal => "INTERNAL",
        }
    }
}

impl fmt::Display for ErrorKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.code())
    }
}

/// The single error type carried through `?` across every Haven crate.
///
/// Lower-level errors are wrapped at the point of failure with a message
/// describing what was being attempted, then bubble unchanged up to the
/// HTTP boundary.
#[derive(Debug, Error)]
#[error("{kind}: {message}")]
pub struct AppError {
    /// Classification driving the HTTP status.
    pub kind: ErrorKind,
    /// Human-readable detail describing what failed.
    pub message: String,
    /// The wrapped lower-level cause, if any.
    #[source]
    pub source: Option<Box<dyn StdError + Send + Sync>>,
}

impl AppError {
    /// Builds an error with no underlying cause.
    pub fn new(kind: ErrorKind, message: impl Into<String>) -> Self {
        Self {
            kind,
            message: message.into(),
            source: None,
        }
    }

    /// Wraps a lower-level error, keeping it as the source for the logs.
    pub fn with_source(
        kind: ErrorKind,
        message: impl Into<String>,
        source: impl StdError + Send + Sync + 'static,
    ) -> Self {
        let mut err = Self::new(kind, message);
        err.source = Some(Box::new(source));
        err
    }
}

/// One shorthand constructor per kind that call sites raise directly.
/// Kinds that only ever arrive wrapped around a lower-level error, such
/// as `Database` and `Serialization`, have no shorthand.
macro_rules! kind_constructors {
    ($($(#[$meta:meta])* $ctor:ident => $kind:ident),+ $(,)?) => {
        impl AppError {
            $(
                $(#[$meta])*
                pub fn $ctor(message: impl Into<String>) -> Self {
                    Self::new(ErrorKind::$kind, message)
                }
            )+
        }
    };
}

kind_constructors! {
    /// Missing, wrong, or locked-out credentials.
    authentication_required => AuthenticationRequired,
    /// A token that failed verification for any reason.
    invalid_token => InvalidOrExpiredToken,
    /// An account an administrator has switched off.
    account_deactivated => AccountDeactivated,
    /// An account whose email address is still unverified.
    email_not_verified => EmailNotVerified,
    /// A permission check that refused the action.
    insufficient_permissions => InsufficientPermissions,
    /// Nothing matched the requested identifier.
    not_found => NotFound,
    /// A collision with existing state.
    conflict => Conflict,
    /// A payload that failed validation.
    validation => Validation,
    /// Missing or malformed runtime configuration.
    configuration => Configuration,
    /// A failure with no more specific classification.
    internal => Internal,
}

// Boxed causes are not `Clone`; a clone keeps the kind and message and
// drops the cause, which has already been logged by then.
impl Clone for AppError {
    fn clone(&self) -> Self {
        Self::new(self.kind, self.message.clone())
    }
}

impl From<serde_json::Error> for AppError {
    fn from(err: serde_json::Error) -> Self {
        Self::with_source(ErrorKind::Serialization, format!("JSON error: {err}"), err)
    }
}

impl From<std::io::Error> for AppError {
    fn from(err: std::io::Error) -> Self {
        Self::with_source(ErrorKind::Internal, format!("I/O failure: {err}"), err)
    }
}

impl From<config::ConfigError> for AppError {
    fn from(err: config::ConfigError) -> Self {
        Self::with_source(
            ErrorKind::Configuration,
            format!("bad configuration: {err}"),
            err,
        )
    }
}
