//! Validators attached to a [`Type`](crate::types::Type).
//!
//! Validators run on the normalized transport value, before conversion, in
//! the order they were added. The first failure wins.

use std::fmt;

use formal_core::FieldError;
use regex::Regex;

use crate::value::Value;

/// A trait for validating field values.
///
/// # Examples
///
/// ```
/// use formal_forms::validators::{LengthValidator, Validator};
/// use formal_forms::value::Value;
///
/// let v = LengthValidator::new(None, Some(5));
/// assert!(v.validate(&Value::from("hi")).is_ok());
/// assert!(v.validate(&Value::from("toolong")).is_err());
/// ```
pub trait Validator: Send + Sync + fmt::Debug {
    /// Validates the given value, returning a field error if invalid.
    fn validate(&self, value: &Value) -> Result<(), FieldError>;

    /// Returns a human-readable name for this validator.
    fn name(&self) -> &str;
}

/// Rejects the absent value.
#[derive(Debug, Clone, Copy, Default)]
pub struct RequiredValidator;

impl Validator for RequiredValidator {
    fn validate(&self, value: &Value) -> Result<(), FieldError> {
        if value.is_null() {
            return Err(FieldError::required());
        }
        Ok(())
    }

    fn name(&self) -> &str {
        "RequiredValidator"
    }
}

/// Bounds the length of a string (in characters) or a sequence (in items).
#[derive(Debug, Clone, Copy)]
pub struct LengthValidator {
    pub min_length: Option<usize>,
    pub max_length: Option<usize>,
}

impl LengthValidator {
    /// Creates a new `LengthValidator`.
    pub const fn new(min_length: Option<usize>, max_length: Option<usize>) -> Self {
        Self {
            min_length,
            max_length,
        }
    }
}

impl Validator for LengthValidator {
    fn validate(&self, value: &Value) -> Result<(), FieldError> {
        let (len, unit) = match value {
            Value::String(s) => (s.chars().count(), "characters"),
            Value::List(items) => (items.len(), "items"),
            _ => return Ok(()),
        };
        if let Some(min) = self.min_length {
            if len < min {
                return Err(FieldError::new(
                    format!("Ensure this value has at least {min} {unit} (it has {len})."),
                    "min_length",
                ));
            }
        }
        if let Some(max) = self.max_length {
            if len > max {
                return Err(FieldError::new(
                    format!("Ensure this value has at most {max} {unit} (it has {len})."),
                    "max_length",
                ));
            }
        }
        Ok(())
    }

    fn name(&self) -> &str {
        "LengthValidator"
    }
}

/// Bounds a numeric value.
///
/// Runs before conversion, so numeric strings are parsed here; strings that
/// are not numbers are left for the converter to reject.
#[derive(Debug, Clone, Copy)]
pub struct RangeValidator {
    pub min_value: Option<f64>,
    pub max_value: Option<f64>,
}

impl RangeValidator {
    /// Creates a new `RangeValidator`.
    pub const fn new(min_value: Option<f64>, max_value: Option<f64>) -> Self {
        Self {
            min_value,
            max_value,
        }
    }
}

impl Validator for RangeValidator {
    #[allow(clippy::cast_precision_loss)]
    fn validate(&self, value: &Value) -> Result<(), FieldError> {
        let numeric = match value {
            Value::Int(i) => Some(*i as f64),
            Value::Float(f) => Some(*f),
            Value::String(s) => s.trim().parse::<f64>().ok(),
            _ => None,
        };
        let Some(n) = numeric else {
            return Ok(());
        };
        if let Some(min) = self.min_value {
            if n < min {
                return Err(FieldError::new(
                    format!("Ensure this value is greater than or equal to {min}."),
                    "min_value",
                ));
            }
        }
        if let Some(max) = self.max_value {
            if n > max {
                return Err(FieldError::new(
                    format!("Ensure this value is less than or equal to {max}."),
                    "max_value",
                ));
            }
        }
        Ok(())
    }

    fn name(&self) -> &str {
        "RangeValidator"
    }
}

/// Requires string values to match a regular expression.
#[derive(Debug, Clone)]
pub struct PatternValidator {
    pub regex: Regex,
    pub message: String,
}

impl PatternValidator {
    /// Creates a new `PatternValidator` from an already compiled regex.
    pub fn new(regex: Regex, message: impl Into<String>) -> Self {
        Self {
            regex,
            message: message.into(),
        }
    }
}

impl Validator for PatternValidator {
    fn validate(&self, value: &Value) -> Result<(), FieldError> {
        if let Value::String(s) = value {
            if !self.regex.is_match(s) {
                return Err(FieldError::new(self.message.clone(), "invalid"));
            }
        }
        Ok(())
    }

    fn name(&self) -> &str {
        "PatternValidator"
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_required() {
        let err = RequiredValidator.validate(&Value::Null).unwrap_err();
        assert_eq!(err.message, "Required");
        assert_eq!(err.code, "required");
        assert!(RequiredValidator.validate(&Value::from("x")).is_ok());
    }

    #[test]
    fn test_length_counts_characters() {
        let v = LengthValidator::new(Some(2), Some(4));
        assert!(v.validate(&Value::from("été")).is_ok());
        let err = v.validate(&Value::from("a")).unwrap_err();
        assert_eq!(err.code, "min_length");
        assert_eq!(
            err.message,
            "Ensure this value has at least 2 characters (it has 1)."
        );
        assert_eq!(v.validate(&Value::from("abcde")).unwrap_err().code, "max_length");
    }

    #[test]
    fn test_length_on_lists() {
        let v = LengthValidator::new(Some(1), None);
        let err = v.validate(&Value::List(vec![])).unwrap_err();
        assert!(err.message.contains("items"));
    }

    #[test]
    fn test_length_skips_null() {
        assert!(LengthValidator::new(Some(1), None).validate(&Value::Null).is_ok());
    }

    #[test]
    fn test_range_parses_strings() {
        let v = RangeValidator::new(Some(0.0), Some(150.0));
        assert!(v.validate(&Value::from(" 42 ")).is_ok());
        assert_eq!(v.validate(&Value::from("-1")).unwrap_err().code, "min_value");
        assert_eq!(v.validate(&Value::Int(200)).unwrap_err().code, "max_value");
        assert!(v.validate(&Value::from("abc")).is_ok());
    }

    #[test]
    fn test_pattern() {
        let v = PatternValidator::new(Regex::new(r"^[a-z]+$").unwrap(), "Lowercase only");
        assert!(v.validate(&Value::from("abc")).is_ok());
        let err = v.validate(&Value::from("ABC")).unwrap_err();
        assert_eq!(err.message, "Lowercase only");
        assert!(v.validate(&Value::Null).is_ok());
    }
}
