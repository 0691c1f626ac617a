//! Null-safe scalar wrappers for nullable SQL columns.
//!
//! Each wrapper carries a value plus a validity flag. An invalid wrapper
//! marshals to the encoding's null token (`null` in JSON, `nil` in EDN),
//! maps to SQL NULL, and is omitted from generated WHERE/INSERT clauses.

use rusqlite::types::{FromSql, FromSqlResult, ToSqlOutput, Value, ValueRef};
use rusqlite::ToSql;
use serde::{Deserialize, Deserializer, Serialize, Serializer};
use std::fmt;
use thiserror::Error;

const EDN_NIL: &str = "nil";

#[derive(Debug, Error)]
pub enum ParseValueError {
    #[error("invalid integer literal: {0:?}")]
    Int(String),

    #[error("invalid float literal: {0:?}")]
    Float(String),

    #[error("invalid boolean literal: {0:?}")]
    Bool(String),

    #[error("invalid string literal: {0:?}")]
    Text(String),
}

macro_rules! null_scalar {
    ($name:ident, $inner:ty) => {
        #[derive(Debug, Clone, Copy, Default)]
        pub struct $name {
            pub value: $inner,
            pub valid: bool,
        }

        impl $name {
            pub fn new(value: $inner) -> Self {
                Self { value, valid: true }
            }

            pub fn get(&self) -> Option<$inner> {
                if self.valid {
                    Some(self.value)
                } else {
                    None
                }
            }

            pub fn is_set(&self) -> bool {
                self.valid
            }
        }

        impl From<$inner> for $name {
            fn from(value: $inner) -> Self {
                Self::new(value)
            }
        }

        impl From<Option<$inner>> for $name {
            fn from(value: Option<$inner>) -> Self {
                match value {
                    Some(v) => Self::new(v),
                    None => Self::default(),
                }
            }
        }

        // Two invalid wrappers compare equal regardless of their stored
        // values; a valid and an invalid wrapper never do.
        impl PartialEq for $name {
            fn eq(&self, other: &Self) -> bool {
                match (self.valid, other.valid) {
                    (false, false) => true,
                    (true, true) => self.value == other.value,
                    _ => false,
                }
            }
        }

        impl fmt::Display for $name {
            fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                match self.get() {
                    Some(v) => write!(f, "{}", v),
                    None => write!(f, "null"),
                }
            }
        }

        impl Serialize for $name {
            fn serialize<S>(&self, serializer: S) -> Result<S::Ok, S::Error>
            where
                S: Serializer,
            {
                self.get().serialize(serializer)
            }
        }

        impl<'de> Deserialize<'de> for $name {
            fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
                Option::<$inner>::deserialize(deserializer).map(Self::from)
            }
        }
    };
}

null_scalar!(NullInt, i64);
null_scalar!(NullFloat, f64);
null_scalar!(NullBool, bool);

impl NullInt {
    pub fn to_edn(&self) -> String {
        match self.get() {
            Some(v) => v.to_string(),
            None => EDN_NIL.to_string(),
        }
    }

    pub fn from_edn(text: &str) -> Result<Self, ParseValueError> {
        if text == EDN_NIL {
            return Ok(Self::default());
        }
        text.parse::<i64>()
            .map(Self::new)
            .map_err(|_| ParseValueError::Int(text.to_string()))
    }
}

impl NullFloat {
    pub fn to_edn(&self) -> String {
        match self.get() {
            Some(v) => v.to_string(),
            None => EDN_NIL.to_string(),
        }
    }

    pub fn from_edn(text: &str) -> Result<Self, ParseValueError> {
        if text == EDN_NIL {
            return Ok(Self::default());
        }
        text.parse::<f64>()
            .map(Self::new)
            .map_err(|_| ParseValueError::Float(text.to_string()))
    }
}

impl NullBool {
    pub fn to_edn(&self) -> String {
        match self.get() {
            Some(v) => v.to_string(),
            None => EDN_NIL.to_string(),
        }
    }

    pub fn from_edn(text: &str) -> Result<Self, ParseValueError> {
        if text == EDN_NIL {
            return Ok(Self::default());
        }
        text.parse::<bool>()
            .map(Self::new)
            .map_err(|_| ParseValueError::Bool(text.to_string()))
    }
}

/// Nullable text column. Not `Copy`, so it lives outside the macro.
#[derive(Debug, Clone, Default)]
pub struct NullText {
    pub value: String,
    pub valid: bool,
}

impl NullText {
    pub fn new(value: impl Into<String>) -> Self {
        Self {
            value: value.into(),
            valid: true,
        }
    }

    pub fn get(&self) -> Option<&str> {
        if self.valid {
            Some(&self.value)
        } else {
            None
        }
    }

    pub fn is_set(&self) -> bool {
        self.valid
    }

    /// EDN strings are written quoted so that the null token and a string
    /// spelling "nil" stay distinguishable.
    pub fn to_edn(&self) -> String {
        match self.get() {
            Some(v) => quote(v),
            None => EDN_NIL.to_string(),
        }
    }

    pub fn from_edn(text: &str) -> Result<Self, ParseValueError> {
        if text == EDN_NIL {
            return Ok(Self::default());
        }
        unquote(text)
            .map(Self::new)
            .ok_or_else(|| ParseValueError::Text(text.to_string()))
    }
}

impl From<&str> for NullText {
    fn from(value: &str) -> Self {
        Self::new(value)
    }
}

impl From<String> for NullText {
    fn from(value: String) -> Self {
        Self::new(value)
    }
}

impl From<Option<String>> for NullText {
    fn from(value: Option<String>) -> Self {
        match value {
            Some(v) => Self::new(v),
            None => Self::default(),
        }
    }
}

impl PartialEq for NullText {
    fn eq(&self, other: &Self) -> bool {
        match (self.valid, other.valid) {
            (false, false) => true,
            (true, true) => self.value == other.value,
            _ => false,
        }
    }
}

impl fmt::Display for NullText {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.get() {
            Some(v) => write!(f, "{}", v),
            None => write!(f, "null"),
        }
    }
}

impl Serialize for NullText {
    fn serialize<S>(&self, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: Serializer,
    {
        self.get().serialize(serializer)
    }
}

impl<'de> Deserialize<'de> for NullText {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        Option::<String>::deserialize(deserializer).map(Self::from)
    }
}

// EDN string literals share JSON's escape syntax closely enough for the
// subset we emit and accept.
fn quote(s: &str) -> String {
    serde_json::to_string(s).unwrap_or_else(|_| format!("{:?}", s))
}

fn unquote(s: &str) -> Option<String> {
    if !s.starts_with('"') || !s.ends_with('"') || s.len() < 2 {
        return None;
    }
    serde_json::from_str::<String>(s).ok()
}

impl ToSql for NullInt {
    fn to_sql(&self) -> rusqlite::Result<ToSqlOutput<'_>> {
        Ok(match self.get() {
            Some(v) => ToSqlOutput::from(v),
            None => ToSqlOutput::Owned(Value::Null),
        })
    }
}

impl ToSql for NullFloat {
    fn to_sql(&self) -> rusqlite::Result<ToSqlOutput<'_>> {
        Ok(match self.get() {
            Some(v) => ToSqlOutput::from(v),
            None => ToSqlOutput::Owned(Value::Null),
        })
    }
}

impl ToSql for NullBool {
    fn to_sql(&self) -> rusqlite::Result<ToSqlOutput<'_>> {
        Ok(match self.get() {
            Some(v) => ToSqlOutput::from(v),
            None => ToSqlOutput::Owned(Value::Null),
        })
    }
}

impl ToSql for NullText {
    fn to_sql(&self) -> rusqlite::Result<ToSqlOutput<'_>> {
        Ok(match self.get() {
            Some(v) => ToSqlOutput::from(v),
            None => ToSqlOutput::Owned(Value::Null),
        })
    }
}

impl FromSql for NullInt {
    fn column_result(value: ValueRef<'_>) -> FromSqlResult<Self> {
        match value {
            ValueRef::Null => Ok(Self::default()),
            other => i64::column_result(other).map(Self::new),
        }
    }
}

impl FromSql for NullFloat {
    fn column_result(value: ValueRef<'_>) -> FromSqlResult<Self> {
        match value {
            ValueRef::Null => Ok(Self::default()),
            other => f64::column_result(other).map(Self::new),
        }
    }
}

impl FromSql for NullBool {
    fn column_result(value: ValueRef<'_>) -> FromSqlResult<Self> {
        match value {
            ValueRef::Null => Ok(Self::default()),
            other => bool::column_result(other).map(Self::new),
        }
    }
}

impl FromSql for NullText {
    fn column_result(value: ValueRef<'_>) -> FromSqlResult<Self> {
        match value {
            ValueRef::Null => Ok(Self::default()),
            other => String::column_result(other).map(Self::new),
        }
    }
}

/// A single entity field value, tagged with its column type. The query
/// builder binds these as SQL parameters; the engine reads result rows
/// back through them.
#[derive(Debug, Clone, PartialEq)]
pub enum SqlValue {
    Int(NullInt),
    Float(NullFloat),
    Text(NullText),
    Bool(NullBool),
}

impl SqlValue {
    /// Whether the field participates in WHERE/INSERT clauses.
    pub fn is_set(&self) -> bool {
        match self {
            SqlValue::Int(v) => v.is_set(),
            SqlValue::Float(v) => v.is_set(),
            SqlValue::Text(v) => v.is_set(),
            SqlValue::Bool(v) => v.is_set(),
        }
    }

    pub fn type_name(&self) -> &'static str {
        match self {
            SqlValue::Int(_) => "integer",
            SqlValue::Float(_) => "float",
            SqlValue::Text(_) => "text",
            SqlValue::Bool(_) => "boolean",
        }
    }

    /// Read a raw column value using `template` to pick the wrapper type.
    pub fn read_as(template: &SqlValue, raw: ValueRef<'_>) -> FromSqlResult<SqlValue> {
        Ok(match template {
            SqlValue::Int(_) => SqlValue::Int(NullInt::column_result(raw)?),
            SqlValue::Float(_) => SqlValue::Float(NullFloat::column_result(raw)?),
            SqlValue::Text(_) => SqlValue::Text(NullText::column_result(raw)?),
            SqlValue::Bool(_) => SqlValue::Bool(NullBool::column_result(raw)?),
        })
    }
}

impl fmt::Display for SqlValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            SqlValue::Int(v) => v.fmt(f),
            SqlValue::Float(v) => v.fmt(f),
            SqlValue::Text(v) => v.fmt(f),
            SqlValue::Bool(v) => v.fmt(f),
        }
    }
}

impl ToSql for SqlValue {
    fn to_sql(&self) -> rusqlite::Result<ToSqlOutput<'_>> {
        match self {
            SqlValue::Int(v) => v.to_sql(),
            SqlValue::Float(v) => v.to_sql(),
            SqlValue::Text(v) => v.to_sql(),
            SqlValue::Bool(v) => v.to_sql(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn new_is_valid() {
        assert!(NullInt::new(0).is_set());
        assert!(NullFloat::new(0.0).is_set());
        assert!(NullText::new("").is_set());
        assert!(NullBool::new(false).is_set());
        assert!(!NullInt::default().is_set());
    }

    #[test]
    fn invalid_wrappers_compare_equal() {
        let a = NullInt {
            value: 5,
            valid: false,
        };
        let b = NullInt {
            value: 7,
            valid: false,
        };
        assert_eq!(a, b);
        assert_ne!(NullInt::new(5), a);
        assert_ne!(NullInt::new(5), NullInt::new(7));
        assert_eq!(NullInt::new(5), NullInt::new(5));
    }

    #[test]
    fn json_round_trip() {
        let v = NullInt::new(42);
        let text = serde_json::to_string(&v).unwrap();
        assert_eq!(text, "42");
        let back: NullInt = serde_json::from_str(&text).unwrap();
        assert_eq!(back, v);

        let invalid: NullInt = serde_json::from_str("null").unwrap();
        assert!(!invalid.is_set());
        assert_eq!(serde_json::to_string(&invalid).unwrap(), "null");
    }

    #[test]
    fn json_round_trip_all_types() {
        let f = NullFloat::new(2.5);
        assert_eq!(serde_json::to_string(&f).unwrap(), "2.5");
        assert_eq!(serde_json::from_str::<NullFloat>("2.5").unwrap(), f);
        assert_eq!(serde_json::to_string(&NullFloat::default()).unwrap(), "null");

        let t = NullText::new("a \"quoted\" name");
        let text = serde_json::to_string(&t).unwrap();
        assert_eq!(serde_json::from_str::<NullText>(&text).unwrap(), t);
        assert_eq!(serde_json::to_string(&NullText::default()).unwrap(), "null");

        let b = NullBool::new(true);
        assert_eq!(serde_json::to_string(&b).unwrap(), "true");
        assert_eq!(serde_json::from_str::<NullBool>("true").unwrap(), b);
        assert_eq!(serde_json::to_string(&NullBool::default()).unwrap(), "null");
    }

    #[test]
    fn edn_round_trip() {
        let v = NullInt::new(-3);
        assert_eq!(v.to_edn(), "-3");
        assert_eq!(NullInt::from_edn(&v.to_edn()).unwrap(), v);
        assert_eq!(NullInt::default().to_edn(), "nil");
        assert!(!NullInt::from_edn("nil").unwrap().is_set());

        let f = NullFloat::new(1.25);
        assert_eq!(NullFloat::from_edn(&f.to_edn()).unwrap(), f);

        let t = NullText::new("nil");
        assert_eq!(t.to_edn(), "\"nil\"");
        assert_eq!(NullText::from_edn(&t.to_edn()).unwrap(), t);
        assert!(!NullText::from_edn("nil").unwrap().is_set());

        let b = NullBool::new(false);
        assert_eq!(NullBool::from_edn(&b.to_edn()).unwrap(), b);
    }

    #[test]
    fn edn_parse_errors_propagate() {
        assert!(NullInt::from_edn("five").is_err());
        assert!(NullFloat::from_edn("1.2.3").is_err());
        assert!(NullBool::from_edn("yes").is_err());
        assert!(NullText::from_edn("unquoted").is_err());
    }

    #[test]
    fn sql_value_set_detection() {
        assert!(SqlValue::Int(NullInt::new(0)).is_set());
        assert!(!SqlValue::Int(NullInt::default()).is_set());
        assert!(SqlValue::Text(NullText::new("")).is_set());
        assert!(!SqlValue::Text(NullText::default()).is_set());
    }
}
