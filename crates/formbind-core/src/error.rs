//! Error types shared by every formbind crate.
//!
//! [`FormError`] is what fallible operations return: store lookups,
//! relation declarations, settings and malformed submissions.
//! [`ValidationError`] is narrower. A field raises it when submitted data
//! is unacceptable, and the form turns it into a message under the field's
//! attribute instead of failing the request.

use std::fmt;

use thiserror::Error;

/// A rejected field value.
///
/// # Examples
///
/// ```
/// use formbind_core::error::ValidationError;
///
/// let err = ValidationError::new("Value of Age must be numerical", "integer").rejecting("abc");
/// assert_eq!(err.to_string(), "Value of Age must be numerical");
/// assert_eq!(err.code, "integer");
/// assert_eq!(err.rejected.as_deref(), Some("abc"));
/// ```
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ValidationError {
    /// The message shown next to the control.
    pub message: String,
    /// Short machine-readable reason, e.g. `required` or `integer`.
    pub code: String,
    /// The submitted text that was refused, when there was one.
    pub rejected: Option<String>,
}

impl ValidationError {
    pub fn new(message: impl Into<String>, code: impl Into<String>) -> Self {
        Self {
            message: message.into(),
            code: code.into(),
            rejected: None,
        }
    }

    /// Records the submitted text that failed.
    #[must_use]
    pub fn rejecting(mut self, value: impl Into<String>) -> Self {
        self.rejected = Some(value.into());
        self
    }
}

impl fmt::Display for ValidationError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.message)
    }
}

impl std::error::Error for ValidationError {}

/// The error type for every fallible formbind operation.
#[derive(Error, Debug)]
pub enum FormError {
    /// No row, model or related object matches.
    #[error("not found: {0}")]
    NotFound(String),

    /// The object store failed for a reason of its own.
    #[error("store error: {0}")]
    Store(String),

    /// A write would break a relation, e.g. linking to an unsaved owner.
    #[error("integrity error: {0}")]
    Integrity(String),

    /// A field refused its value outside the normal validate step.
    #[error("invalid value: {0}")]
    Invalid(#[from] ValidationError),

    /// Settings could not be read or parsed.
    #[error("configuration error: {0}")]
    Config(String),

    /// A form or model is declared inconsistently, such as a formset over
    /// an attribute that is not a one-to-many relation.
    #[error("bad declaration: {0}")]
    Declaration(String),

    /// The submitted body could not be interpreted.
    #[error("malformed submission: {0}")]
    MalformedSubmission(String),

    #[error(transparent)]
    Io(#[from] std::io::Error),
}

impl FormError {
    /// `true` when the submitted data is at fault rather than the store or
    /// the declarations.
    pub const fn is_client_error(&self) -> bool {
        matches!(self, Self::Invalid(_) | Self::MalformedSubmission(_))
    }
}

pub type FormResult<T> = Result<T, FormError>;
