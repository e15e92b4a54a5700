//! Logger capability
//!
//! Workers and the coordinator report through a [`Logger`] rather than a
//! concrete sink. Every call carries a short message plus named fields, so a
//! sink can render them as structured output. Implementations must be safe to
//! call from many workers at once.

use std::error::Error as StdError;
use std::fmt;

/// Value carried by a log field
#[derive(Debug, Clone, Copy)]
pub enum FieldValue<'a> {
    /// Unsigned integer (ids, counts, line numbers)
    Int(u64),
    /// Text
    Str(&'a str),
    /// Underlying error
    Err(&'a (dyn StdError + Send + Sync + 'static)),
}

impl fmt::Display for FieldValue<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            FieldValue::Int(v) => write!(f, "{}", v),
            FieldValue::Str(s) => write!(f, "{}", s),
            FieldValue::Err(e) => write!(f, "{}", e),
        }
    }
}

/// Named key/value pair attached to a log event
#[derive(Debug, Clone, Copy)]
pub struct Field<'a> {
    pub key: &'static str,
    pub value: FieldValue<'a>,
}

impl<'a> Field<'a> {
    pub fn int(key: &'static str, value: usize) -> Self {
        Self {
            key,
            value: FieldValue::Int(value as u64),
        }
    }

    pub fn str(key: &'static str, value: &'a str) -> Self {
        Self {
            key,
            value: FieldValue::Str(value),
        }
    }

    /// Attach an error under the conventional `err` key
    pub fn err(err: &'a (dyn StdError + Send + Sync + 'static)) -> Self {
        Self {
            key: "err",
            value: FieldValue::Err(err),
        }
    }
}

/// Renders fields as `key=value` pairs; text values are quoted
pub struct Fields<'a>(pub &'a [Field<'a>]);

impl fmt::Display for Fields<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for (i, field) in self.0.iter().enumerate() {
            if i > 0 {
                f.write_str(" ")?;
            }
            match field.value {
                FieldValue::Int(v) => write!(f, "{}={}", field.key, v)?,
                FieldValue::Str(s) => write!(f, "{}={:?}", field.key, s)?,
                FieldValue::Err(e) => write!(f, "{}={:?}", field.key, e.to_string())?,
            }
        }
        Ok(())
    }
}

/// Logging capability shared by all workers
pub trait Logger: Send + Sync {
    /// Informational event
    fn info(&self, message: &str, fields: &[Field<'_>]);

    /// Error event
    fn error(&self, message: &str, fields: &[Field<'_>]);

    /// Transient progress event; sinks may drop it
    fn debug(&self, _message: &str, _fields: &[Field<'_>]) {}
}

/// Logger that discards everything
#[derive(Debug, Clone, Copy, Default)]
pub struct NullLogger;

impl Logger for NullLogger {
    fn info(&self, _message: &str, _fields: &[Field<'_>]) {}

    fn error(&self, _message: &str, _fields: &[Field<'_>]) {}
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_fields_display() {
        let err = std::io::Error::new(std::io::ErrorKind::Other, "boom");
        let fields = [
            Field::int("thread", 3),
            Field::str("cmd", "echo a"),
            Field::err(&err),
        ];
        assert_eq!(
            Fields(&fields).to_string(),
            r#"thread=3 cmd="echo a" err="boom""#
        );
    }

    #[test]
    fn test_field_value_display() {
        assert_eq!(FieldValue::Int(7).to_string(), "7");
        assert_eq!(FieldValue::Str("x y").to_string(), "x y");
    }

    #[test]
    fn test_empty_fields() {
        assert_eq!(Fields(&[]).to_string(), "");
    }
}
