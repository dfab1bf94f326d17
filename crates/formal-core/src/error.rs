//! Core error types for formal.
//!
//! Two families of errors live here:
//!
//! - **Validation errors** ([`FieldError`], [`FormError`], joined by
//!   [`ValidationError`]). These describe a rejected submission. They are
//!   collected into a form's error list and never escape form processing.
//! - **Fatal errors** ([`FormalError`]). These are configuration or usage
//!   mistakes (a duplicate action name, an unknown form) and failures of a
//!   callback that are not validation errors. They always propagate.
//!
//! [`CallbackError`] is what a submission callback returns on failure; its
//! `Validation` variant is trapped by form processing, everything else is
//! surfaced as [`FormalError::Callback`].

use std::fmt;

use thiserror::Error;

/// A validation error scoped to a single field.
///
/// The field key may be left unset by whoever raises the error (a validator
/// or converter does not know which field it is attached to); form
/// processing fills it in with [`ensure_field`](FieldError::ensure_field).
///
/// # Examples
///
/// ```
/// use formal_core::error::FieldError;
///
/// let mut err = FieldError::required();
/// assert!(err.field.is_none());
///
/// err.ensure_field("address.street");
/// assert_eq!(err.field.as_deref(), Some("address.street"));
/// assert_eq!(err.to_string(), "Required");
/// ```
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FieldError {
    /// The dotted key of the field this error belongs to.
    pub field: Option<String>,
    /// The human-readable message.
    pub message: String,
    /// A short code identifying the failure (e.g. "required", "invalid").
    pub code: String,
}

impl FieldError {
    /// Creates a new `FieldError` with no field key attached.
    pub fn new(message: impl Into<String>, code: impl Into<String>) -> Self {
        Self {
            field: None,
            message: message.into(),
            code: code.into(),
        }
    }

    /// Creates a `FieldError` for a missing required value.
    pub fn required() -> Self {
        Self::new("Required", "required")
    }

    /// Creates a `FieldError` for malformed input.
    pub fn invalid(message: impl Into<String>) -> Self {
        Self::new(message, "invalid")
    }

    /// Attaches a field key, replacing any existing one.
    #[must_use]
    pub fn with_field(mut self, field: impl Into<String>) -> Self {
        self.field = Some(field.into());
        self
    }

    /// Attaches `key` only if no field key has been set yet.
    pub fn ensure_field(&mut self, key: &str) {
        if self.field.is_none() {
            self.field = Some(key.to_string());
        }
    }
}

impl fmt::Display for FieldError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.message)
    }
}

impl std::error::Error for FieldError {}

/// A validation error that applies to the whole form rather than a field,
/// e.g. "Passwords do not match".
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FormError {
    /// The human-readable message.
    pub message: String,
    /// A short code identifying the failure.
    pub code: String,
}

impl FormError {
    /// Creates a new `FormError`.
    pub fn new(message: impl Into<String>, code: impl Into<String>) -> Self {
        Self {
            message: message.into(),
            code: code.into(),
        }
    }
}

impl fmt::Display for FormError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.message)
    }
}

impl std::error::Error for FormError {}

/// Either a field-scoped or a form-scoped validation error.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum ValidationError {
    /// Scoped to one field key.
    #[error("{0}")]
    Field(FieldError),
    /// Scoped to the whole form.
    #[error("{0}")]
    Form(FormError),
}

impl ValidationError {
    /// Returns the human-readable message.
    pub fn message(&self) -> &str {
        match self {
            Self::Field(e) => &e.message,
            Self::Form(e) => &e.message,
        }
    }

    /// Returns the field key for field-scoped errors.
    pub fn field(&self) -> Option<&str> {
        match self {
            Self::Field(e) => e.field.as_deref(),
            Self::Form(_) => None,
        }
    }
}

impl From<FieldError> for ValidationError {
    fn from(e: FieldError) -> Self {
        Self::Field(e)
    }
}

impl From<FormError> for ValidationError {
    fn from(e: FormError) -> Self {
        Self::Form(e)
    }
}

/// The failure type of a submission callback.
///
/// Returning `Validation` rejects the submission: the error is added to the
/// form's errors and the form is re-displayed. `Failed` carries any other
/// error and is propagated to the caller of form processing.
#[derive(Error, Debug)]
pub enum CallbackError {
    /// A field or form validation error; trapped by form processing.
    #[error("{0}")]
    Validation(ValidationError),
    /// Any other failure; propagated.
    #[error(transparent)]
    Failed(#[from] anyhow::Error),
}

impl From<FieldError> for CallbackError {
    fn from(e: FieldError) -> Self {
        Self::Validation(ValidationError::Field(e))
    }
}

impl From<FormError> for CallbackError {
    fn from(e: FormError) -> Self {
        Self::Validation(ValidationError::Form(e))
    }
}

impl From<ValidationError> for CallbackError {
    fn from(e: ValidationError) -> Self {
        Self::Validation(e)
    }
}

/// The fatal error type for formal.
///
/// Every variant is either a programmer error in the form definition, a
/// failed lookup, or a callback failure that is not a validation error.
/// Validation problems with submitted data are never reported through this
/// type.
#[derive(Error, Debug)]
pub enum FormalError {
    // ── Definition errors ────────────────────────────────────────────

    /// A field or group name is not a valid identifier.
    #[error("{0:?} is an invalid field name")]
    InvalidIdentifier(String),

    /// An action with the same name was already added to the form.
    #[error("Action with name {0:?} already exists")]
    DuplicateAction(String),

    /// An item with the same name already exists in the same scope.
    #[error("Item with name {0:?} already exists")]
    DuplicateItem(String),

    /// No widget or converter is registered for a type/widget combination.
    #[error("No admissible adapter: {0}")]
    NotAdmissible(String),

    /// A configuration value is missing or invalid.
    #[error("Configuration error: {0}")]
    ConfigurationError(String),

    // ── Processing errors ────────────────────────────────────────────

    /// The form has no default callback and no action matched.
    #[error("The form {0:?} has no callback and no action was found")]
    NoCallback(String),

    /// The form factory produced nothing for the requested name.
    #[error("Form {0:?} not found")]
    FormNotFound(String),

    /// No item with the given name or key exists in the form.
    #[error("No item called {0:?}")]
    ItemNotFound(String),

    /// A widget resource could not be found.
    #[error("Resource not found: {0}")]
    ResourceNotFound(String),

    /// The submission declared a character encoding that cannot be decoded.
    #[error("Unsupported charset: {0}")]
    UnsupportedCharset(String),

    /// A callback failed with an error that is not a validation error.
    #[error("Form callback failed: {0}")]
    Callback(#[source] anyhow::Error),

    // ── IO ───────────────────────────────────────────────────────────

    /// An I/O error occurred (e.g. while storing an upload).
    #[error("IO error: {0}")]
    IoError(#[from] std::io::Error),
}

impl FormalError {
    /// Returns the HTTP status code a web layer should use for this error.
    ///
    /// - `FormNotFound`, `ItemNotFound`, `ResourceNotFound` -> 404
    /// - `UnsupportedCharset` -> 400
    /// - Everything else -> 500
    pub const fn status_code(&self) -> u16 {
        match self {
            Self::FormNotFound(_) | Self::ItemNotFound(_) | Self::ResourceNotFound(_) => 404,
            Self::UnsupportedCharset(_) => 400,
            Self::InvalidIdentifier(_)
            | Self::DuplicateAction(_)
            | Self::DuplicateItem(_)
            | Self::NotAdmissible(_)
            | Self::ConfigurationError(_)
            | Self::NoCallback(_)
            | Self::Callback(_)
            | Self::IoError(_) => 500,
        }
    }
}

/// A convenience type alias for `Result<T, FormalError>`.
pub type FormalResult<T> = Result<T, FormalError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_field_error_display() {
        let err = FieldError::new("Not a valid number", "invalid");
        assert_eq!(err.to_string(), "Not a valid number");
        assert_eq!(err.code, "invalid");
    }

    #[test]
    fn test_ensure_field_keeps_existing_key() {
        let mut err = FieldError::required().with_field("name");
        err.ensure_field("other");
        assert_eq!(err.field.as_deref(), Some("name"));
    }

    #[test]
    fn test_validation_error_accessors() {
        let field: ValidationError = FieldError::required().with_field("age").into();
        assert_eq!(field.field(), Some("age"));
        assert_eq!(field.message(), "Required");

        let form: ValidationError = FormError::new("Passwords do not match", "mismatch").into();
        assert_eq!(form.field(), None);
        assert_eq!(form.to_string(), "Passwords do not match");
    }

    #[test]
    fn test_callback_error_from_validation() {
        let err: CallbackError = FormError::new("nope", "invalid").into();
        assert!(matches!(err, CallbackError::Validation(ValidationError::Form(_))));

        let err: CallbackError = anyhow::anyhow!("disk full").into();
        assert!(matches!(err, CallbackError::Failed(_)));
        assert_eq!(err.to_string(), "disk full");
    }

    #[test]
    fn test_formal_error_status_codes() {
        assert_eq!(FormalError::FormNotFound("x".into()).status_code(), 404);
        assert_eq!(FormalError::ItemNotFound("x".into()).status_code(), 404);
        assert_eq!(FormalError::ResourceNotFound("x".into()).status_code(), 404);
        assert_eq!(FormalError::UnsupportedCharset("x".into()).status_code(), 400);
        assert_eq!(FormalError::DuplicateAction("x".into()).status_code(), 500);
        assert_eq!(FormalError::NoCallback("x".into()).status_code(), 500);
    }

    #[test]
    fn test_formal_error_display() {
        let err = FormalError::DuplicateAction("submit".into());
        assert_eq!(err.to_string(), "Action with name \"submit\" already exists");

        let err = FormalError::InvalidIdentifier("1abc".into());
        assert_eq!(err.to_string(), "\"1abc\" is an invalid field name");
    }

    #[test]
    fn test_io_error_conversion() {
        let io_err = std::io::Error::new(std::io::ErrorKind::NotFound, "file missing");
        let err: FormalError = io_err.into();
        assert_eq!(err.status_code(), 500);
        assert!(err.to_string().contains("file missing"));
    }
}
