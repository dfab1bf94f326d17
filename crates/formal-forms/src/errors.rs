//! Errors collected while processing one submission.

use formal_core::{FieldError, FormError, ValidationError};

use crate::decode::DataTree;

/// The validation errors of one processing pass, with the data that
/// produced them so the form can be re-displayed as the user left it.
///
/// # Examples
///
/// ```
/// use formal_core::{FieldError, FormError};
/// use formal_forms::decode::DataTree;
/// use formal_forms::errors::FormErrors;
///
/// let mut errors = FormErrors::new("signup", DataTree::new());
/// assert!(errors.is_empty());
///
/// errors.add(FieldError::required().with_field("email"));
/// errors.add(FormError::new("Passwords do not match", "mismatch"));
///
/// assert_eq!(errors.len(), 2);
/// assert_eq!(errors.field_error("email").unwrap().message, "Required");
/// assert_eq!(errors.form_errors().len(), 1);
/// ```
#[derive(Debug, Clone, PartialEq)]
pub struct FormErrors {
    /// The name of the form the errors belong to.
    pub form_name: String,
    /// The decoded submission, as it should be re-displayed.
    pub data: DataTree,
    errors: Vec<ValidationError>,
}

impl FormErrors {
    pub fn new(form_name: impl Into<String>, data: DataTree) -> Self {
        Self {
            form_name: form_name.into(),
            data,
            errors: Vec::new(),
        }
    }

    /// Appends an error.
    pub fn add(&mut self, error: impl Into<ValidationError>) {
        self.errors.push(error.into());
    }

    /// Returns the first error attached to the field key `name`.
    pub fn field_error(&self, name: &str) -> Option<&FieldError> {
        self.errors.iter().find_map(|e| match e {
            ValidationError::Field(f) if f.field.as_deref() == Some(name) => Some(f),
            _ => None,
        })
    }

    /// Returns the whole-form errors in the order they were added.
    pub fn form_errors(&self) -> Vec<&FormError> {
        self.errors
            .iter()
            .filter_map(|e| match e {
                ValidationError::Form(f) => Some(f),
                ValidationError::Field(_) => None,
            })
            .collect()
    }

    /// Returns every error in the order it was added.
    pub fn errors(&self) -> &[ValidationError] {
        &self.errors
    }

    pub fn is_empty(&self) -> bool {
        self.errors.is_empty()
    }

    pub fn len(&self) -> usize {
        self.errors.len()
    }
}
