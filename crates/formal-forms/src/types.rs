//! Field types.
//!
//! A [`Type`] names the native value domain of a field and carries its
//! validation policy: whether a value is required, what to use when none
//! was entered, whether the field can be changed at all, and an ordered
//! validator chain.
//!
//! Validation runs on the transport value a widget produced. Each kind
//! first normalizes the value (strings are stripped, blank input and empty
//! sequences become [`Value::Null`]), then the validators run in order.

use std::fmt;
use std::sync::Arc;

use formal_core::FieldError;

use crate::validators::{RequiredValidator, Validator};
use crate::value::Value;

/// Identifies a type kind for adapter lookup.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum TypeTag {
    String,
    Integer,
    Float,
    Boolean,
    Date,
    Time,
    Sequence,
    File,
}

impl fmt::Display for TypeTag {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Self::String => "String",
            Self::Integer => "Integer",
            Self::Float => "Float",
            Self::Boolean => "Boolean",
            Self::Date => "Date",
            Self::Time => "Time",
            Self::Sequence => "Sequence",
            Self::File => "File",
        };
        write!(f, "{name}")
    }
}

/// The kind-specific part of a [`Type`].
#[derive(Debug, Clone)]
pub enum TypeKind {
    /// Text. `strip` trims surrounding whitespace before validation.
    String { strip: bool },
    Integer,
    Float,
    Boolean,
    Date,
    Time,
    /// A collection whose items are of the element type.
    Sequence(Box<Type>),
    File,
}

/// A field's value domain and validation policy.
///
/// # Examples
///
/// ```
/// use formal_forms::types::Type;
/// use formal_forms::value::Value;
///
/// let ty = Type::string().required(true);
/// assert!(ty.validate(Value::from("   ")).is_err());
/// assert_eq!(ty.validate(Value::from("  Ada ")).unwrap(), Value::from("Ada"));
///
/// let ty = Type::integer().missing(Value::Int(0));
/// assert_eq!(ty.validate(Value::from("")).unwrap(), Value::Int(0));
/// ```
#[derive(Debug, Clone)]
pub struct Type {
    kind: TypeKind,
    required: bool,
    missing: Value,
    immutable: bool,
    validators: Vec<Arc<dyn Validator>>,
}

impl Type {
    /// Creates an optional, mutable type of the given kind with no validators.
    pub const fn new(kind: TypeKind) -> Self {
        Self {
            kind,
            required: false,
            missing: Value::Null,
            immutable: false,
            validators: Vec::new(),
        }
    }

    /// A string type that strips whitespace.
    pub const fn string() -> Self {
        Self::new(TypeKind::String { strip: true })
    }

    pub const fn integer() -> Self {
        Self::new(TypeKind::Integer)
    }

    pub const fn float() -> Self {
        Self::new(TypeKind::Float)
    }

    pub const fn boolean() -> Self {
        Self::new(TypeKind::Boolean)
    }

    pub const fn date() -> Self {
        Self::new(TypeKind::Date)
    }

    pub const fn time() -> Self {
        Self::new(TypeKind::Time)
    }

    /// A sequence of `element` values.
    pub fn sequence(element: Self) -> Self {
        Self::new(TypeKind::Sequence(Box::new(element)))
    }

    pub const fn file() -> Self {
        Self::new(TypeKind::File)
    }

    /// Sets whether a value is required.
    ///
    /// Making a type required appends a [`RequiredValidator`] after the
    /// validators already added; it is never added twice.
    #[must_use]
    pub fn required(mut self, required: bool) -> Self {
        if required && !self.required {
            self.validators.push(Arc::new(RequiredValidator));
        } else if !required && self.required {
            self.validators.retain(|v| v.name() != "RequiredValidator");
        }
        self.required = required;
        self
    }

    /// Sets the value used when nothing was entered.
    #[must_use]
    pub fn missing(mut self, missing: impl Into<Value>) -> Self {
        self.missing = missing.into();
        self
    }

    /// Sets whether the field ignores submitted input.
    #[must_use]
    pub fn immutable(mut self, immutable: bool) -> Self {
        self.immutable = immutable;
        self
    }

    /// Sets whether string input is stripped. Ignored for other kinds.
    #[must_use]
    pub fn strip(mut self, strip: bool) -> Self {
        if let TypeKind::String { strip: s } = &mut self.kind {
            *s = strip;
        }
        self
    }

    /// Appends a validator.
    #[must_use]
    pub fn validator(mut self, validator: impl Validator + 'static) -> Self {
        self.validators.push(Arc::new(validator));
        self
    }

    pub const fn kind(&self) -> &TypeKind {
        &self.kind
    }

    pub const fn is_required(&self) -> bool {
        self.required
    }

    pub const fn is_immutable(&self) -> bool {
        self.immutable
    }

    /// The value substituted for absent input.
    pub const fn missing_value(&self) -> &Value {
        &self.missing
    }

    pub fn validators(&self) -> &[Arc<dyn Validator>] {
        &self.validators
    }

    /// The element type of a sequence.
    pub fn element(&self) -> Option<&Self> {
        match &self.kind {
            TypeKind::Sequence(element) => Some(element),
            _ => None,
        }
    }

    /// The adapter lookup tag.
    pub const fn tag(&self) -> TypeTag {
        match self.kind {
            TypeKind::String { .. } => TypeTag::String,
            TypeKind::Integer => TypeTag::Integer,
            TypeKind::Float => TypeTag::Float,
            TypeKind::Boolean => TypeTag::Boolean,
            TypeKind::Date => TypeTag::Date,
            TypeKind::Time => TypeTag::Time,
            TypeKind::Sequence(_) => TypeTag::Sequence,
            TypeKind::File => TypeTag::File,
        }
    }

    /// The type's display name.
    pub fn name(&self) -> String {
        self.tag().to_string()
    }

    /// Normalizes `value` and runs the validators.
    ///
    /// Returns the normalized transport value, which is [`Value::Null`] when
    /// nothing was entered. Form processing uses this so that absent input
    /// bypasses the converter.
    pub fn check(&self, value: Value) -> Result<Value, FieldError> {
        let value = self.normalize(value);
        for validator in &self.validators {
            validator.validate(&value)?;
        }
        Ok(value)
    }

    /// Normalizes `value`, runs the validators, and substitutes the missing
    /// value for absent input.
    pub fn validate(&self, value: Value) -> Result<Value, FieldError> {
        let value = self.check(value)?;
        if value.is_null() {
            return Ok(self.missing.clone());
        }
        Ok(value)
    }

    fn normalize(&self, value: Value) -> Value {
        match (&self.kind, value) {
            (TypeKind::String { strip }, Value::String(s)) => {
                let s = if *strip { s.trim().to_string() } else { s };
                if s.is_empty() {
                    Value::Null
                } else {
                    Value::String(s)
                }
            }
            (
                TypeKind::Integer | TypeKind::Float | TypeKind::Date | TypeKind::Time,
                Value::String(s),
            ) => {
                let trimmed = s.trim();
                if trimmed.is_empty() {
                    Value::Null
                } else {
                    Value::String(trimmed.to_string())
                }
            }
            (TypeKind::Sequence(_), Value::List(items)) if items.is_empty() => Value::Null,
            (TypeKind::File, Value::File(f)) if f.is_empty() => Value::Null,
            (_, value) => value,
        }
    }
}
