//! Database value types
//!
//! This module defines the null-aware cell value exchanged with native drivers
//! and the [`SqlType`] capability that marks a Rust type as a simple,
//! column-mappable type.

use chrono::{DateTime, FixedOffset, NaiveDateTime, TimeDelta};
use rust_decimal::prelude::ToPrimitive;
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Database value that can hold different types
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, Default)]
pub enum DatabaseValue {
    /// Null value (the database-null sentinel)
    #[default]
    Null,
    /// Boolean value
    Bool(bool),
    /// 32-bit integer
    Int(i32),
    /// 64-bit integer
    Long(i64),
    /// 32-bit floating point
    Float(f32),
    /// 64-bit floating point
    Double(f64),
    /// Exact decimal
    Decimal(Decimal),
    /// String value
    String(String),
    /// Binary data
    Bytes(Vec<u8>),
    /// Date and time without offset
    DateTime(NaiveDateTime),
    /// Date and time with a fixed UTC offset
    DateTimeOffset(DateTime<FixedOffset>),
    /// Elapsed time, stored as microseconds when serialized
    TimeSpan(#[serde(with = "timespan_micros")] TimeDelta),
    /// Globally unique identifier
    Guid(Uuid),
}

const DATETIME_FORMATS: [&str; 3] = ["%Y-%m-%d %H:%M:%S%.f", "%Y-%m-%dT%H:%M:%S%.f", "%Y-%m-%d %H:%M"];

impl DatabaseValue {
    /// Get the value as a boolean
    pub fn as_bool(&self) -> Option<bool> {
        match self {
            DatabaseValue::Bool(v) => Some(*v),
            DatabaseValue::Int(v) => Some(*v != 0),
            DatabaseValue::Long(v) => Some(*v != 0),
            DatabaseValue::String(s) => match s.to_lowercase().as_str() {
                "true" | "1" | "yes" => Some(true),
                "false" | "0" | "no" => Some(false),
                _ => None,
            },
            _ => None,
        }
    }

    /// Get the value as an i32
    pub fn as_int(&self) -> Option<i32> {
        match self {
            DatabaseValue::Int(v) => Some(*v),
            DatabaseValue::Long(v) => i32::try_from(*v).ok(),
            DatabaseValue::Decimal(v) if v.fract().is_zero() => v.to_i32(),
            DatabaseValue::String(s) => s.trim().parse().ok(),
            DatabaseValue::Bool(v) => Some(*v as i32),
            _ => None,
        }
    }

    /// Get the value as an i64
    pub fn as_long(&self) -> Option<i64> {
        match self {
            DatabaseValue::Long(v) => Some(*v),
            DatabaseValue::Int(v) => Some(*v as i64),
            DatabaseValue::Decimal(v) if v.fract().is_zero() => v.to_i64(),
            DatabaseValue::String(s) => s.trim().parse().ok(),
            DatabaseValue::Bool(v) => Some(*v as i64),
            _ => None,
        }
    }

    /// Get the value as an f32
    pub fn as_float(&self) -> Option<f32> {
        match self {
            DatabaseValue::Float(v) => Some(*v),
            DatabaseValue::Double(v) => Some(*v as f32),
            DatabaseValue::Int(v) => Some(*v as f32),
            DatabaseValue::Long(v) => Some(*v as f32),
            DatabaseValue::Decimal(v) => v.to_f32(),
            DatabaseValue::String(s) => s.trim().parse().ok(),
            _ => None,
        }
    }

    /// Get the value as an f64
    pub fn as_double(&self) -> Option<f64> {
        match self {
            DatabaseValue::Double(v) => Some(*v),
            DatabaseValue::Float(v) => Some(*v as f64),
            DatabaseValue::Int(v) => Some(*v as f64),
            DatabaseValue::Long(v) => Some(*v as f64),
            DatabaseValue::Decimal(v) => v.to_f64(),
            DatabaseValue::String(s) => s.trim().parse().ok(),
            _ => None,
        }
    }

    /// Get the value as an exact decimal
    pub fn as_decimal(&self) -> Option<Decimal> {
        match self {
            DatabaseValue::Decimal(v) => Some(*v),
            DatabaseValue::Int(v) => Some(Decimal::from(*v)),
            DatabaseValue::Long(v) => Some(Decimal::from(*v)),
            DatabaseValue::Double(v) => Decimal::try_from(*v).ok(),
            DatabaseValue::Float(v) => Decimal::try_from(*v).ok(),
            DatabaseValue::String(s) => s.trim().parse().ok(),
            _ => None,
        }
    }

    /// Get the value as a date and time without offset
    pub fn as_datetime(&self) -> Option<NaiveDateTime> {
        match self {
            DatabaseValue::DateTime(v) => Some(*v),
            DatabaseValue::DateTimeOffset(v) => Some(v.naive_local()),
            DatabaseValue::String(s) => DATETIME_FORMATS
                .iter()
                .find_map(|format| NaiveDateTime::parse_from_str(s.trim(), format).ok()),
            _ => None,
        }
    }

    /// Get the value as a date and time with offset
    pub fn as_datetime_offset(&self) -> Option<DateTime<FixedOffset>> {
        match self {
            DatabaseValue::DateTimeOffset(v) => Some(*v),
            DatabaseValue::String(s) => DateTime::parse_from_rfc3339(s.trim()).ok(),
            _ => None,
        }
    }

    /// Get the value as an elapsed time
    ///
    /// Integers are read as microseconds, matching the serialized form.
    pub fn as_timespan(&self) -> Option<TimeDelta> {
        match self {
            DatabaseValue::TimeSpan(v) => Some(*v),
            DatabaseValue::Long(v) => Some(TimeDelta::microseconds(*v)),
            DatabaseValue::Int(v) => Some(TimeDelta::microseconds(i64::from(*v))),
            _ => None,
        }
    }

    /// Get the value as a GUID
    pub fn as_uuid(&self) -> Option<Uuid> {
        match self {
            DatabaseValue::Guid(v) => Some(*v),
            DatabaseValue::String(s) => Uuid::parse_str(s.trim()).ok(),
            DatabaseValue::Bytes(b) => Uuid::from_slice(b).ok(),
            _ => None,
        }
    }

    /// Get the value as a string (zero-copy for String values)
    ///
    /// Returns a string reference without cloning for String values.
    /// For other types, use `as_string()` which performs conversion.
    pub fn as_str(&self) -> Option<&str> {
        match self {
            DatabaseValue::String(s) => Some(s.as_str()),
            _ => None,
        }
    }

    /// Get the value as a string (with conversion)
    pub fn as_string(&self) -> String {
        match self {
            DatabaseValue::Null => "null".to_string(),
            DatabaseValue::Bool(v) => v.to_string(),
            DatabaseValue::Int(v) => v.to_string(),
            DatabaseValue::Long(v) => v.to_string(),
            DatabaseValue::Float(v) => v.to_string(),
            DatabaseValue::Double(v) => v.to_string(),
            DatabaseValue::Decimal(v) => v.to_string(),
            DatabaseValue::String(s) => s.clone(),
            DatabaseValue::Bytes(b) => format!("<{} bytes>", b.len()),
            DatabaseValue::DateTime(v) => v.to_string(),
            DatabaseValue::DateTimeOffset(v) => v.to_rfc3339(),
            DatabaseValue::TimeSpan(v) => v.to_string(),
            DatabaseValue::Guid(v) => v.to_string(),
        }
    }

    /// Get the value as bytes (zero-copy)
    pub fn as_bytes(&self) -> Option<&[u8]> {
        match self {
            DatabaseValue::Bytes(b) => Some(b),
            DatabaseValue::String(s) => Some(s.as_bytes()),
            _ => None,
        }
    }

    /// Check if the value is null
    pub fn is_null(&self) -> bool {
        matches!(self, DatabaseValue::Null)
    }

    /// Get the type name of this value
    pub fn type_name(&self) -> &'static str {
        match self {
            DatabaseValue::Null => "null",
            DatabaseValue::Bool(_) => "bool",
            DatabaseValue::Int(_) => "int",
            DatabaseValue::Long(_) => "long",
            DatabaseValue::Float(_) => "float",
            DatabaseValue::Double(_) => "double",
            DatabaseValue::Decimal(_) => "decimal",
            DatabaseValue::String(_) => "string",
            DatabaseValue::Bytes(_) => "bytes",
            DatabaseValue::DateTime(_) => "datetime",
            DatabaseValue::DateTimeOffset(_) => "datetimeoffset",
            DatabaseValue::TimeSpan(_) => "timespan",
            DatabaseValue::Guid(_) => "guid",
        }
    }
}

impl std::fmt::Display for DatabaseValue {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(&self.as_string())
    }
}

impl From<bool> for DatabaseValue {
    fn from(v: bool) -> Self {
        DatabaseValue::Bool(v)
    }
}

impl From<i32> for DatabaseValue {
    fn from(v: i32) -> Self {
        DatabaseValue::Int(v)
    }
}

impl From<i64> for DatabaseValue {
    fn from(v: i64) -> Self {
        DatabaseValue::Long(v)
    }
}

impl From<f32> for DatabaseValue {
    fn from(v: f32) -> Self {
        DatabaseValue::Float(v)
    }
}

impl From<f64> for DatabaseValue {
    fn from(v: f64) -> Self {
        DatabaseValue::Double(v)
    }
}

impl From<Decimal> for DatabaseValue {
    fn from(v: Decimal) -> Self {
        DatabaseValue::Decimal(v)
    }
}

impl From<String> for DatabaseValue {
    fn from(v: String) -> Self {
        DatabaseValue::String(v)
    }
}

impl From<&str> for DatabaseValue {
    fn from(v: &str) -> Self {
        DatabaseValue::String(v.to_string())
    }
}

impl From<Vec<u8>> for DatabaseValue {
    fn from(v: Vec<u8>) -> Self {
        DatabaseValue::Bytes(v)
    }
}

impl From<NaiveDateTime> for DatabaseValue {
    fn from(v: NaiveDateTime) -> Self {
        DatabaseValue::DateTime(v)
    }
}

impl From<DateTime<FixedOffset>> for DatabaseValue {
    fn from(v: DateTime<FixedOffset>) -> Self {
        DatabaseValue::DateTimeOffset(v)
    }
}

impl From<TimeDelta> for DatabaseValue {
    fn from(v: TimeDelta) -> Self {
        DatabaseValue::TimeSpan(v)
    }
}

impl From<Uuid> for DatabaseValue {
    fn from(v: Uuid) -> Self {
        DatabaseValue::Guid(v)
    }
}

impl<T: Into<DatabaseValue>> From<Option<T>> for DatabaseValue {
    fn from(v: Option<T>) -> Self {
        match v {
            Some(val) => val.into(),
            None => DatabaseValue::Null,
        }
    }
}

/// A simple, column-mappable type
///
/// Implemented for primitives, `String`, `Decimal`, the chrono date/time
/// types, `TimeDelta`, `Uuid`, `Vec<u8>` and `Option` of any of those.
/// Enums become mappable by implementing it for themselves.
pub trait SqlType: Sized {
    /// Whether the type can represent the database null
    const NULLABLE: bool = false;

    /// Human-readable name used in mapping diagnostics
    fn sql_type_name() -> String;

    /// Convert from a cell value, `None` when the value does not fit
    fn from_value(value: &DatabaseValue) -> Option<Self>;

    /// Convert into a cell value
    fn to_value(&self) -> DatabaseValue;
}

macro_rules! impl_sql_type_via_long {
    ($($ty:ty),*) => {
        $(
            impl SqlType for $ty {
                fn sql_type_name() -> String {
                    stringify!($ty).to_string()
                }

                fn from_value(value: &DatabaseValue) -> Option<Self> {
                    value.as_long().and_then(|v| <$ty>::try_from(v).ok())
                }

                fn to_value(&self) -> DatabaseValue {
                    DatabaseValue::Long(*self as i64)
                }
            }
        )*
    };
}

impl_sql_type_via_long!(i8, i16, u8, u16, u32);

impl SqlType for i32 {
    fn sql_type_name() -> String {
        "i32".to_string()
    }

    fn from_value(value: &DatabaseValue) -> Option<Self> {
        value.as_int()
    }

    fn to_value(&self) -> DatabaseValue {
        DatabaseValue::Int(*self)
    }
}

impl SqlType for i64 {
    fn sql_type_name() -> String {
        "i64".to_string()
    }

    fn from_value(value: &DatabaseValue) -> Option<Self> {
        value.as_long()
    }

    fn to_value(&self) -> DatabaseValue {
        DatabaseValue::Long(*self)
    }
}

impl SqlType for u64 {
    fn sql_type_name() -> String {
        "u64".to_string()
    }

    fn from_value(value: &DatabaseValue) -> Option<Self> {
        match value {
            DatabaseValue::Decimal(v) if v.fract().is_zero() => v.to_u64(),
            other => other.as_long().and_then(|v| u64::try_from(v).ok()),
        }
    }

    fn to_value(&self) -> DatabaseValue {
        match i64::try_from(*self) {
            Ok(v) => DatabaseValue::Long(v),
            Err(_) => DatabaseValue::Decimal(Decimal::from(*self)),
        }
    }
}

impl SqlType for f32 {
    fn sql_type_name() -> String {
        "f32".to_string()
    }

    fn from_value(value: &DatabaseValue) -> Option<Self> {
        value.as_float()
    }

    fn to_value(&self) -> DatabaseValue {
        DatabaseValue::Float(*self)
    }
}

impl SqlType for f64 {
    fn sql_type_name() -> String {
        "f64".to_string()
    }

    fn from_value(value: &DatabaseValue) -> Option<Self> {
        value.as_double()
    }

    fn to_value(&self) -> DatabaseValue {
        DatabaseValue::Double(*self)
    }
}

impl SqlType for bool {
    fn sql_type_name() -> String {
        "bool".to_string()
    }

    fn from_value(value: &DatabaseValue) -> Option<Self> {
        value.as_bool()
    }

    fn to_value(&self) -> DatabaseValue {
        DatabaseValue::Bool(*self)
    }
}

impl SqlType for String {
    fn sql_type_name() -> String {
        "String".to_string()
    }

    fn from_value(value: &DatabaseValue) -> Option<Self> {
        match value {
            DatabaseValue::String(s) => Some(s.clone()),
            DatabaseValue::Guid(v) => Some(v.to_string()),
            _ => None,
        }
    }

    fn to_value(&self) -> DatabaseValue {
        DatabaseValue::String(self.clone())
    }
}

impl SqlType for Decimal {
    fn sql_type_name() -> String {
        "Decimal".to_string()
    }

    fn from_value(value: &DatabaseValue) -> Option<Self> {
        value.as_decimal()
    }

    fn to_value(&self) -> DatabaseValue {
        DatabaseValue::Decimal(*self)
    }
}

impl SqlType for Vec<u8> {
    fn sql_type_name() -> String {
        "Vec<u8>".to_string()
    }

    fn from_value(value: &DatabaseValue) -> Option<Self> {
        match value {
            DatabaseValue::Bytes(b) => Some(b.clone()),
            _ => None,
        }
    }

    fn to_value(&self) -> DatabaseValue {
        DatabaseValue::Bytes(self.clone())
    }
}

impl SqlType for NaiveDateTime {
    fn sql_type_name() -> String {
        "NaiveDateTime".to_string()
    }

    fn from_value(value: &DatabaseValue) -> Option<Self> {
        value.as_datetime()
    }

    fn to_value(&self) -> DatabaseValue {
        DatabaseValue::DateTime(*self)
    }
}

impl SqlType for DateTime<FixedOffset> {
    fn sql_type_name() -> String {
        "DateTime<FixedOffset>".to_string()
    }

    fn from_value(value: &DatabaseValue) -> Option<Self> {
        value.as_datetime_offset()
    }

    fn to_value(&self) -> DatabaseValue {
        DatabaseValue::DateTimeOffset(*self)
    }
}

impl SqlType for TimeDelta {
    fn sql_type_name() -> String {
        "TimeDelta".to_string()
    }

    fn from_value(value: &DatabaseValue) -> Option<Self> {
        value.as_timespan()
    }

    fn to_value(&self) -> DatabaseValue {
        DatabaseValue::TimeSpan(*self)
    }
}

impl SqlType for Uuid {
    fn sql_type_name() -> String {
        "Uuid".to_string()
    }

    fn from_value(value: &DatabaseValue) -> Option<Self> {
        value.as_uuid()
    }

    fn to_value(&self) -> DatabaseValue {
        DatabaseValue::Guid(*self)
    }
}

impl<T: SqlType> SqlType for Option<T> {
    const NULLABLE: bool = true;

    fn sql_type_name() -> String {
        format!("Option<{}>", T::sql_type_name())
    }

    fn from_value(value: &DatabaseValue) -> Option<Self> {
        if value.is_null() {
            Some(None)
        } else {
            T::from_value(value).map(Some)
        }
    }

    fn to_value(&self) -> DatabaseValue {
        match self {
            Some(v) => v.to_value(),
            None => DatabaseValue::Null,
        }
    }
}

mod timespan_micros {
    use chrono::TimeDelta;
    use serde::{Deserialize, Deserializer, Serialize, Serializer};

    pub fn serialize<S: Serializer>(value: &TimeDelta, serializer: S) -> Result<S::Ok, S::Error> {
        value
            .num_microseconds()
            .ok_or_else(|| serde::ser::Error::custom("timespan overflows microseconds"))?
            .serialize(serializer)
    }

    pub fn deserialize<'de, D: Deserializer<'de>>(deserializer: D) -> Result<TimeDelta, D::Error> {
        i64::deserialize(deserializer).map(TimeDelta::microseconds)
    }
}
