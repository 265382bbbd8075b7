use std::convert::TryFrom;
use std::fmt;

use chrono::NaiveDateTime;
use uuid::Uuid;

use crate::error::{DataMapperError, Result};

/// Semantic type of a column or a parameter, independent of the provider's own type names.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum FieldType {
    Bool,
    Byte,
    Int16,
    Int32,
    Int64,
    Float32,
    Float64,
    Text,
    Char,
    Bytes,
    Timestamp,
    Uuid,
    /// The provider reported a type this crate has no dedicated representation for.
    Unknown,
}

impl FieldType {
    pub fn name(&self) -> &'static str {
        match self {
            FieldType::Bool => "bool",
            FieldType::Byte => "byte",
            FieldType::Int16 => "int16",
            FieldType::Int32 => "int32",
            FieldType::Int64 => "int64",
            FieldType::Float32 => "float32",
            FieldType::Float64 => "float64",
            FieldType::Text => "string",
            FieldType::Char => "char",
            FieldType::Bytes => "bytes",
            FieldType::Timestamp => "timestamp",
            FieldType::Uuid => "uuid",
            FieldType::Unknown => "unknown",
        }
    }

    /// Resolves a logical type name as written in a mapping declaration, e.g. `int` or
    /// `DateTime`. Matching is case-insensitive.
    pub fn from_type_name(name: &str) -> Option<Self> {
        let field_type = match name.trim().to_ascii_lowercase().as_str() {
            "bool" | "boolean" => FieldType::Bool,
            "byte" | "u8" => FieldType::Byte,
            "short" | "int16" | "smallint" | "i16" => FieldType::Int16,
            "int" | "int32" | "integer" | "i32" => FieldType::Int32,
            "long" | "int64" | "bigint" | "i64" => FieldType::Int64,
            "float" | "single" | "float32" | "real" | "f32" => FieldType::Float32,
            "double" | "float64" | "decimal" | "f64" => FieldType::Float64,
            "string" | "text" | "varchar" => FieldType::Text,
            "char" => FieldType::Char,
            "byte[]" | "bytes" | "binary" => FieldType::Bytes,
            "datetime" | "timestamp" => FieldType::Timestamp,
            "guid" | "uuid" => FieldType::Uuid,
            "object" => FieldType::Unknown,
            _ => return None,
        };
        Some(field_type)
    }
}

impl fmt::Display for FieldType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

/// Represents a SQL value in a driver-agnostic way.
/// Drivers are responsible for converting these to and from their native types.
#[derive(Debug, Clone, PartialEq)]
pub enum SqlValue {
    Null,
    Bool(bool),
    Byte(u8),
    Int16(i16),
    Int32(i32),
    Int64(i64),
    Float32(f32),
    Float64(f64),
    Text(String),
    Char(char),
    Bytes(Vec<u8>),
    Timestamp(NaiveDateTime),
    Uuid(Uuid),
}

impl Default for SqlValue {
    fn default() -> Self {
        SqlValue::Null
    }
}

impl SqlValue {
    pub fn is_null(&self) -> bool {
        matches!(self, SqlValue::Null)
    }

    /// Semantic type of the value, `None` for NULL.
    pub fn field_type(&self) -> Option<FieldType> {
        let field_type = match self {
            SqlValue::Null => return None,
            SqlValue::Bool(_) => FieldType::Bool,
            SqlValue::Byte(_) => FieldType::Byte,
            SqlValue::Int16(_) => FieldType::Int16,
            SqlValue::Int32(_) => FieldType::Int32,
            SqlValue::Int64(_) => FieldType::Int64,
            SqlValue::Float32(_) => FieldType::Float32,
            SqlValue::Float64(_) => FieldType::Float64,
            SqlValue::Text(_) => FieldType::Text,
            SqlValue::Char(_) => FieldType::Char,
            SqlValue::Bytes(_) => FieldType::Bytes,
            SqlValue::Timestamp(_) => FieldType::Timestamp,
            SqlValue::Uuid(_) => FieldType::Uuid,
        };
        Some(field_type)
    }

    /// Name of the value's kind as used in error messages.
    pub fn kind_name(&self) -> &'static str {
        self.field_type().map_or("NULL", |t| t.name())
    }

    fn as_i64(&self) -> Option<i64> {
        match *self {
            SqlValue::Byte(v) => Some(i64::from(v)),
            SqlValue::Int16(v) => Some(i64::from(v)),
            SqlValue::Int32(v) => Some(i64::from(v)),
            SqlValue::Int64(v) => Some(v),
            _ => None,
        }
    }

    fn mismatch(&self, target: FieldType) -> DataMapperError {
        DataMapperError::TypeMismatch {
            expected: target.name(),
            actual: self.kind_name(),
        }
    }

    /// Converts the value into the representation of `target`.
    ///
    /// NULL stays NULL and `FieldType::Unknown` accepts anything. Integers convert between widths
    /// when the value fits, integers widen to floats, single-character text becomes a char and
    /// every scalar can be rendered as text.
    pub fn convert_to(self, target: FieldType) -> Result<SqlValue> {
        if self.is_null() || target == FieldType::Unknown || self.field_type() == Some(target) {
            return Ok(self);
        }
        let converted = match target {
            FieldType::Byte => self.as_i64().and_then(|v| u8::try_from(v).ok()).map(SqlValue::Byte),
            FieldType::Int16 => self
                .as_i64()
                .and_then(|v| i16::try_from(v).ok())
                .map(SqlValue::Int16),
            FieldType::Int32 => self
                .as_i64()
                .and_then(|v| i32::try_from(v).ok())
                .map(SqlValue::Int32),
            FieldType::Int64 => self.as_i64().map(SqlValue::Int64),
            FieldType::Float32 => match self {
                SqlValue::Float64(v) => Some(SqlValue::Float32(v as f32)),
                ref other => other.as_i64().map(|v| SqlValue::Float32(v as f32)),
            },
            FieldType::Float64 => match self {
                SqlValue::Float32(v) => Some(SqlValue::Float64(f64::from(v))),
                ref other => other.as_i64().map(|v| SqlValue::Float64(v as f64)),
            },
            FieldType::Char => match self {
                SqlValue::Text(ref s) if s.chars().count() == 1 => s.chars().next().map(SqlValue::Char),
                _ => None,
            },
            FieldType::Text => match self {
                SqlValue::Bytes(_) => None,
                ref other => Some(SqlValue::Text(other.to_string())),
            },
            _ => None,
        };
        converted.ok_or_else(|| self.mismatch(target))
    }
}

impl fmt::Display for SqlValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            SqlValue::Null => f.write_str("NULL"),
            SqlValue::Bool(v) => write!(f, "{}", v),
            SqlValue::Byte(v) => write!(f, "{}", v),
            SqlValue::Int16(v) => write!(f, "{}", v),
            SqlValue::Int32(v) => write!(f, "{}", v),
            SqlValue::Int64(v) => write!(f, "{}", v),
            SqlValue::Float32(v) => write!(f, "{}", v),
            SqlValue::Float64(v) => write!(f, "{}", v),
            SqlValue::Text(v) => f.write_str(v),
            SqlValue::Char(v) => write!(f, "{}", v),
            SqlValue::Bytes(v) => write!(f, "<{} byte(s)>", v.len()),
            SqlValue::Timestamp(v) => write!(f, "{}", v),
            SqlValue::Uuid(v) => write!(f, "{}", v),
        }
    }
}

impl From<&str> for SqlValue {
    fn from(value: &str) -> Self {
        SqlValue::Text(value.to_string())
    }
}

impl<T: Into<SqlValue>> From<Option<T>> for SqlValue {
    fn from(value: Option<T>) -> Self {
        match value {
            Some(v) => v.into(),
            None => SqlValue::Null,
        }
    }
}

/// Implements `From<T> for SqlValue` and the strict `TryFrom<&SqlValue> for T` used by typed
/// getters. Extraction does not convert between kinds; NULL never extracts.
macro_rules! sql_value_conversions {
    ($($ty:ty => $variant:ident),* $(,)?) => {
        $(
            impl From<$ty> for SqlValue {
                fn from(value: $ty) -> Self {
                    SqlValue::$variant(value)
                }
            }

            impl TryFrom<&SqlValue> for $ty {
                type Error = DataMapperError;

                fn try_from(value: &SqlValue) -> Result<Self> {
                    match value {
                        SqlValue::$variant(v) => Ok(v.clone()),
                        other => Err(other.mismatch(FieldType::$variant)),
                    }
                }
            }
        )*
    };
}

sql_value_conversions! {
    bool => Bool,
    u8 => Byte,
    i16 => Int16,
    i32 => Int32,
    i64 => Int64,
    f32 => Float32,
    f64 => Float64,
    String => Text,
    char => Char,
    Vec<u8> => Bytes,
    NaiveDateTime => Timestamp,
    Uuid => Uuid,
}

#[cfg(test)]
mod tests {
    use super::*;
    use test_case::test_case;

    #[test_case(SqlValue::Int64(42), FieldType::Int32, SqlValue::Int32(42); "narrow int64")]
    #[test_case(SqlValue::Int16(7), FieldType::Int64, SqlValue::Int64(7); "widen int16")]
    #[test_case(SqlValue::Int32(3), FieldType::Float64, SqlValue::Float64(3.0); "int to double")]
    #[test_case(SqlValue::Text("x".into()), FieldType::Char, SqlValue::Char('x'); "text to char")]
    #[test_case(SqlValue::Int32(5), FieldType::Text, SqlValue::Text("5".into()); "int to text")]
    #[test_case(SqlValue::Null, FieldType::Int32, SqlValue::Null; "null stays null")]
    fn test_convert_to(value: SqlValue, target: FieldType, expected: SqlValue) {
        assert_eq!(value.convert_to(target).unwrap(), expected);
    }

    #[test]
    fn test_convert_out_of_range_fails() {
        let err = SqlValue::Int64(i64::MAX).convert_to(FieldType::Int32).unwrap_err();
        assert!(matches!(
            err,
            DataMapperError::TypeMismatch {
                expected: "int32",
                actual: "int64"
            }
        ));
    }

    #[test]
    fn test_strict_extraction() {
        assert_eq!(i32::try_from(&SqlValue::Int32(9)).unwrap(), 9);
        assert!(i32::try_from(&SqlValue::Int64(9)).is_err());
        assert!(String::try_from(&SqlValue::Null).is_err());
    }

    #[test]
    fn test_type_names() {
        assert_eq!(FieldType::from_type_name("Int"), Some(FieldType::Int32));
        assert_eq!(FieldType::from_type_name("DateTime"), Some(FieldType::Timestamp));
        assert_eq!(FieldType::from_type_name("Guid"), Some(FieldType::Uuid));
        assert_eq!(FieldType::from_type_name("Widget"), None);
    }
}
