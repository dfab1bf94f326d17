//! Converters between native values and their transport representation.
//!
//! `from_type` turns a native value into what a widget displays; `to_type`
//! parses what a widget extracted back into a native value. Both map
//! [`Value::Null`] to `Null`. Malformed input is a field error, never a
//! panic.

use std::fmt;
use std::sync::Arc;

use chrono::{Datelike, NaiveDate, NaiveTime, Timelike};
use formal_core::FieldError;

use crate::value::Value;

/// A bidirectional mapping between native and transport values.
pub trait Converter: Send + Sync + fmt::Debug {
    /// Converts a native value to its transport representation.
    fn from_type(&self, value: &Value) -> Result<Value, FieldError>;

    /// Parses a transport value into a native value.
    fn to_type(&self, value: &Value) -> Result<Value, FieldError>;
}

/// Passes values through unchanged.
#[derive(Debug, Clone, Copy, Default)]
pub struct NullConverter;

impl Converter for NullConverter {
    fn from_type(&self, value: &Value) -> Result<Value, FieldError> {
        Ok(value.clone())
    }

    fn to_type(&self, value: &Value) -> Result<Value, FieldError> {
        Ok(value.clone())
    }
}

/// `Int` <-> decimal string.
#[derive(Debug, Clone, Copy, Default)]
pub struct IntegerToStringConverter;

impl Converter for IntegerToStringConverter {
    fn from_type(&self, value: &Value) -> Result<Value, FieldError> {
        match value {
            Value::Null => Ok(Value::Null),
            Value::Int(i) => Ok(Value::String(i.to_string())),
            other => Err(unexpected("an integer", other)),
        }
    }

    fn to_type(&self, value: &Value) -> Result<Value, FieldError> {
        match trimmed(value)? {
            None => Ok(Value::Null),
            Some(s) => s
                .parse::<i64>()
                .map(Value::Int)
                .map_err(|_| FieldError::invalid("Not a valid number")),
        }
    }
}

/// `Float` <-> decimal string.
#[derive(Debug, Clone, Copy, Default)]
pub struct FloatToStringConverter;

impl Converter for FloatToStringConverter {
    fn from_type(&self, value: &Value) -> Result<Value, FieldError> {
        match value {
            Value::Null => Ok(Value::Null),
            Value::Float(f) => Ok(Value::String(f.to_string())),
            other => Err(unexpected("a number", other)),
        }
    }

    fn to_type(&self, value: &Value) -> Result<Value, FieldError> {
        match trimmed(value)? {
            None => Ok(Value::Null),
            Some(s) => s
                .parse::<f64>()
                .map(Value::Float)
                .map_err(|_| FieldError::invalid("Not a valid number")),
        }
    }
}

/// `Bool` <-> `"True"` / `"False"`.
#[derive(Debug, Clone, Copy, Default)]
pub struct BooleanToStringConverter;

impl Converter for BooleanToStringConverter {
    fn from_type(&self, value: &Value) -> Result<Value, FieldError> {
        match value {
            Value::Null => Ok(Value::Null),
            Value::Bool(true) => Ok(Value::from("True")),
            Value::Bool(false) => Ok(Value::from("False")),
            other => Err(unexpected("a boolean", other)),
        }
    }

    fn to_type(&self, value: &Value) -> Result<Value, FieldError> {
        match trimmed(value)? {
            None => Ok(Value::Null),
            Some("True") => Ok(Value::Bool(true)),
            Some("False") => Ok(Value::Bool(false)),
            Some(other) => Err(FieldError::invalid(format!(
                "{other:?} should be either True or False"
            ))),
        }
    }
}

/// `Date` <-> ISO `YYYY-MM-DD`.
#[derive(Debug, Clone, Copy, Default)]
pub struct DateToStringConverter;

impl Converter for DateToStringConverter {
    fn from_type(&self, value: &Value) -> Result<Value, FieldError> {
        match value {
            Value::Null => Ok(Value::Null),
            Value::Date(d) => Ok(Value::String(d.format("%Y-%m-%d").to_string())),
            other => Err(unexpected("a date", other)),
        }
    }

    fn to_type(&self, value: &Value) -> Result<Value, FieldError> {
        match trimmed(value)? {
            None => Ok(Value::Null),
            Some(s) => parse_date(s).map(Value::Date),
        }
    }
}

/// `Time` <-> `HH:MM[:SS[.ffffff]]`.
///
/// The fractional part is read as a decimal fraction of a second with at
/// most six digits, so `.5` is half a second.
#[derive(Debug, Clone, Copy, Default)]
pub struct TimeToStringConverter;

impl Converter for TimeToStringConverter {
    fn from_type(&self, value: &Value) -> Result<Value, FieldError> {
        match value {
            Value::Null => Ok(Value::Null),
            Value::Time(t) => {
                let formatted = if t.nanosecond() == 0 {
                    t.format("%H:%M:%S").to_string()
                } else {
                    t.format("%H:%M:%S%.6f").to_string()
                };
                Ok(Value::String(formatted))
            }
            other => Err(unexpected("a time", other)),
        }
    }

    fn to_type(&self, value: &Value) -> Result<Value, FieldError> {
        match trimmed(value)? {
            None => Ok(Value::Null),
            Some(s) => parse_time(s).map(Value::Time),
        }
    }
}

/// `Date` <-> `[year, month, day]`.
#[derive(Debug, Clone, Copy, Default)]
pub struct DateToDateTupleConverter;

impl Converter for DateToDateTupleConverter {
    fn from_type(&self, value: &Value) -> Result<Value, FieldError> {
        match value {
            Value::Null => Ok(Value::Null),
            Value::Date(d) => Ok(Value::List(vec![
                Value::Int(i64::from(d.year())),
                Value::Int(i64::from(d.month())),
                Value::Int(i64::from(d.day())),
            ])),
            other => Err(unexpected("a date", other)),
        }
    }

    fn to_type(&self, value: &Value) -> Result<Value, FieldError> {
        let parts = match value {
            Value::Null => return Ok(Value::Null),
            Value::List(parts) => parts,
            other => return Err(unexpected("a (year, month, day) tuple", other)),
        };
        let [Value::Int(y), Value::Int(m), Value::Int(d)] = parts.as_slice() else {
            return Err(FieldError::invalid("Invalid date"));
        };
        let (Ok(y), Ok(m), Ok(d)) = (i32::try_from(*y), u32::try_from(*m), u32::try_from(*d))
        else {
            return Err(FieldError::invalid("Invalid date"));
        };
        ymd(y, m, d).map(Value::Date)
    }
}

/// Converts each item of a `List` with an element converter.
#[derive(Debug, Clone)]
pub struct SequenceConverter {
    element: Arc<dyn Converter>,
}

impl SequenceConverter {
    pub fn new(element: Arc<dyn Converter>) -> Self {
        Self { element }
    }
}

impl Converter for SequenceConverter {
    fn from_type(&self, value: &Value) -> Result<Value, FieldError> {
        match value {
            Value::Null => Ok(Value::Null),
            Value::List(items) => items
                .iter()
                .map(|item| self.element.from_type(item))
                .collect::<Result<Vec<_>, _>>()
                .map(Value::List),
            other => Err(unexpected("a sequence", other)),
        }
    }

    fn to_type(&self, value: &Value) -> Result<Value, FieldError> {
        match value {
            Value::Null => Ok(Value::Null),
            Value::List(items) => items
                .iter()
                .map(|item| self.element.to_type(item))
                .collect::<Result<Vec<_>, _>>()
                .map(Value::List),
            single => self.element.to_type(single).map(|v| Value::List(vec![v])),
        }
    }
}

// ── Parsing helpers ────────────────────────────────────────────────────

/// Returns the trimmed string, or `None` for absent or blank input.
fn trimmed(value: &Value) -> Result<Option<&str>, FieldError> {
    match value {
        Value::Null => Ok(None),
        Value::String(s) => {
            let s = s.trim();
            Ok(if s.is_empty() { None } else { Some(s) })
        }
        other => Err(unexpected("text", other)),
    }
}

fn unexpected(expected: &str, got: &Value) -> FieldError {
    FieldError::invalid(format!("Expected {expected}, got {got:?}"))
}

fn parse_date(s: &str) -> Result<NaiveDate, FieldError> {
    let parts: Vec<&str> = s.split('-').collect();
    let [y, m, d] = parts.as_slice() else {
        return Err(FieldError::invalid("Invalid date"));
    };
    let (Ok(y), Ok(m), Ok(d)) = (y.parse::<i32>(), m.parse::<u32>(), d.parse::<u32>()) else {
        return Err(FieldError::invalid("Invalid date"));
    };
    ymd(y, m, d)
}

fn ymd(y: i32, m: u32, d: u32) -> Result<NaiveDate, FieldError> {
    if !(1..=9999).contains(&y) {
        return Err(FieldError::invalid(format!("Invalid date: year {y} is out of range")));
    }
    NaiveDate::from_ymd_opt(y, m, d).ok_or_else(|| {
        let reason = if (1..=12).contains(&m) {
            "day is out of range for month"
        } else {
            "month must be in 1..12"
        };
        FieldError::invalid(format!("Invalid date: {reason}"))
    })
}

fn parse_time(s: &str) -> Result<NaiveTime, FieldError> {
    let invalid = || FieldError::invalid("Invalid time");

    let (clock, fraction) = match s.split_once('.') {
        Some((clock, fraction)) => (clock, Some(fraction)),
        None => (s, None),
    };

    let parts: Vec<&str> = clock.split(':').collect();
    let (h, m, sec) = match parts.as_slice() {
        [h, m] => (*h, *m, "0"),
        [h, m, sec] => (*h, *m, *sec),
        _ => return Err(invalid()),
    };
    let (Ok(h), Ok(m), Ok(sec)) = (h.parse::<u32>(), m.parse::<u32>(), sec.parse::<u32>()) else {
        return Err(invalid());
    };

    let micro = match fraction {
        None => 0,
        Some(f) if !f.is_empty() && f.len() <= 6 && f.bytes().all(|b| b.is_ascii_digit()) => {
            format!("{f:0<6}").parse::<u32>().map_err(|_| invalid())?
        }
        Some(_) => return Err(invalid()),
    };

    NaiveTime::from_hms_micro_opt(h, m, sec, micro)
        .ok_or_else(|| FieldError::invalid("Invalid time: value out of range"))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn s(v: &str) -> Value {
        Value::from(v)
    }

    #[test]
    fn test_null_is_total() {
        let converters: Vec<Box<dyn Converter>> = vec![
            Box::new(NullConverter),
            Box::new(IntegerToStringConverter),
            Box::new(FloatToStringConverter),
            Box::new(BooleanToStringConverter),
            Box::new(DateToStringConverter),
            Box::new(TimeToStringConverter),
            Box::new(DateToDateTupleConverter),
            Box::new(SequenceConverter::new(Arc::new(IntegerToStringConverter))),
        ];
        for c in converters {
            assert_eq!(c.to_type(&Value::Null).unwrap(), Value::Null, "{c:?}");
            assert_eq!(c.from_type(&Value::Null).unwrap(), Value::Null, "{c:?}");
        }
    }

    #[test]
    fn test_integer() {
        let c = IntegerToStringConverter;
        assert_eq!(c.to_type(&s(" 42 ")).unwrap(), Value::Int(42));
        assert_eq!(c.to_type(&s("")).unwrap(), Value::Null);
        let err = c.to_type(&s("4x")).unwrap_err();
        assert_eq!(err.message, "Not a valid number");
        assert_eq!(c.from_type(&Value::Int(-3)).unwrap(), s("-3"));
    }

    #[test]
    fn test_integer_round_trip() {
        let c = IntegerToStringConverter;
        for x in [0, 7, -3, i64::MAX, i64::MIN] {
            let back = c.to_type(&c.from_type(&Value::Int(x)).unwrap()).unwrap();
            assert_eq!(back, Value::Int(x));
        }
        for text in ["0", "-12", "900"] {
            assert_eq!(c.from_type(&c.to_type(&s(text)).unwrap()).unwrap(), s(text));
        }
    }

    #[test]
    fn test_float_round_trip() {
        let c = FloatToStringConverter;
        for x in [0.5, -2.25, 1e10] {
            let back = c.to_type(&c.from_type(&Value::Float(x)).unwrap()).unwrap();
            assert_eq!(back, Value::Float(x));
        }
        assert!(c.to_type(&s("one")).is_err());
    }

    #[test]
    fn test_boolean() {
        let c = BooleanToStringConverter;
        assert_eq!(c.to_type(&s("True")).unwrap(), Value::Bool(true));
        assert_eq!(c.to_type(&s("False")).unwrap(), Value::Bool(false));
        let err = c.to_type(&s("yes")).unwrap_err();
        assert_eq!(err.message, "\"yes\" should be either True or False");
        assert_eq!(c.from_type(&Value::Bool(true)).unwrap(), s("True"));
    }

    #[test]
    fn test_boolean_round_trip() {
        let c = BooleanToStringConverter;
        for b in [true, false] {
            let back = c.to_type(&c.from_type(&Value::Bool(b)).unwrap()).unwrap();
            assert_eq!(back, Value::Bool(b));
        }
        for text in ["True", "False"] {
            assert_eq!(c.from_type(&c.to_type(&s(text)).unwrap()).unwrap(), s(text));
        }
    }

    #[test]
    fn test_date_leap_years() {
        let c = DateToStringConverter;
        let d = c.to_type(&s("2024-02-29")).unwrap();
        assert_eq!(d, Value::Date(NaiveDate::from_ymd_opt(2024, 2, 29).unwrap()));

        let err = c.to_type(&s("2024-02-30")).unwrap_err();
        assert_eq!(err.message, "Invalid date: day is out of range for month");
        assert_eq!(err.code, "invalid");

        let err = c.to_type(&s("2023-13-01")).unwrap_err();
        assert_eq!(err.message, "Invalid date: month must be in 1..12");
    }

    #[test]
    fn test_date_malformed() {
        let c = DateToStringConverter;
        for bad in ["2024/01/01", "2024-01", "yyyy-mm-dd"] {
            assert_eq!(c.to_type(&s(bad)).unwrap_err().message, "Invalid date");
        }
    }

    #[test]
    fn test_date_year_out_of_range() {
        let c = DateToStringConverter;
        let err = c.to_type(&s("0000-01-01")).unwrap_err();
        assert_eq!(err.message, "Invalid date: year 0 is out of range");
        let err = c.to_type(&s("12345-06-07")).unwrap_err();
        assert_eq!(err.message, "Invalid date: year 12345 is out of range");
        assert!(c.to_type(&s("9999-12-31")).is_ok());
        assert!(c.to_type(&s("0001-01-01")).is_ok());

        let tuple = DateToDateTupleConverter;
        let err = tuple
            .to_type(&Value::List(vec![Value::Int(-5), Value::Int(1), Value::Int(1)]))
            .unwrap_err();
        assert_eq!(err.message, "Invalid date: year -5 is out of range");
    }

    #[test]
    fn test_date_round_trip() {
        let c = DateToStringConverter;
        assert_eq!(c.from_type(&c.to_type(&s("1999-12-31")).unwrap()).unwrap(), s("1999-12-31"));
    }

    #[test]
    fn test_time_forms() {
        let c = TimeToStringConverter;
        let t = |h, m, s, us| Value::Time(NaiveTime::from_hms_micro_opt(h, m, s, us).unwrap());
        assert_eq!(c.to_type(&s("09:30")).unwrap(), t(9, 30, 0, 0));
        assert_eq!(c.to_type(&s("09:30:15")).unwrap(), t(9, 30, 15, 0));
        assert_eq!(c.to_type(&s("09:30:15.5")).unwrap(), t(9, 30, 15, 500_000));
        assert_eq!(c.to_type(&s("09:30:15.000123")).unwrap(), t(9, 30, 15, 123));
    }

    #[test]
    fn test_time_invalid() {
        let c = TimeToStringConverter;
        for bad in ["9", "1:2:3:4", "aa:bb", "09:30:15.1234567", "09:30.", "09:30:15.x"] {
            assert_eq!(c.to_type(&s(bad)).unwrap_err().message, "Invalid time", "{bad}");
        }
        assert!(c.to_type(&s("25:00")).unwrap_err().message.starts_with("Invalid time: "));
    }

    #[test]
    fn test_time_round_trip() {
        let c = TimeToStringConverter;
        for text in ["23:59:59", "00:00:01.250000"] {
            assert_eq!(c.from_type(&c.to_type(&s(text)).unwrap()).unwrap(), s(text));
        }
    }

    #[test]
    fn test_date_tuple() {
        let c = DateToDateTupleConverter;
        let tuple = Value::List(vec![Value::Int(2024), Value::Int(2), Value::Int(29)]);
        let date = c.to_type(&tuple).unwrap();
        assert_eq!(date, Value::Date(NaiveDate::from_ymd_opt(2024, 2, 29).unwrap()));
        assert_eq!(c.from_type(&date).unwrap(), tuple);

        let bad = Value::List(vec![Value::Int(2023), Value::Int(2), Value::Int(29)]);
        assert!(c.to_type(&bad).unwrap_err().message.starts_with("Invalid date: "));
        let negative = Value::List(vec![Value::Int(2023), Value::Int(-1), Value::Int(1)]);
        assert_eq!(c.to_type(&negative).unwrap_err().message, "Invalid date");
    }

    #[test]
    fn test_sequence() {
        let c = SequenceConverter::new(Arc::new(IntegerToStringConverter));
        let native = c.to_type(&Value::List(vec![s("1"), s("2")])).unwrap();
        assert_eq!(native, Value::List(vec![Value::Int(1), Value::Int(2)]));
        assert_eq!(c.to_type(&s("3")).unwrap(), Value::List(vec![Value::Int(3)]));
        assert!(c.to_type(&Value::List(vec![s("x")])).is_err());
        assert_eq!(
            c.from_type(&native).unwrap(),
            Value::List(vec![s("1"), s("2")])
        );
    }
}
