//! Typed command values
//!
//! `CommandValue` is the engine's representation of a single data point. The
//! payload is a closed sum type so every consumer matches exhaustively.

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// Declared value type of a device resource
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum ValueType {
    Bool,
    String,
    Uint8,
    Uint16,
    Uint32,
    Uint64,
    Int8,
    Int16,
    Int32,
    Int64,
    Float32,
    Float64,
    Binary,
    BoolArray,
    Uint8Array,
    Uint16Array,
    Uint32Array,
    Uint64Array,
    Int8Array,
    Int16Array,
    Int32Array,
    Int64Array,
    Float32Array,
    Float64Array,
}

impl ValueType {
    pub const ALL: [ValueType; 24] = [
        ValueType::Bool,
        ValueType::String,
        ValueType::Uint8,
        ValueType::Uint16,
        ValueType::Uint32,
        ValueType::Uint64,
        ValueType::Int8,
        ValueType::Int16,
        ValueType::Int32,
        ValueType::Int64,
        ValueType::Float32,
        ValueType::Float64,
        ValueType::Binary,
        ValueType::BoolArray,
        ValueType::Uint8Array,
        ValueType::Uint16Array,
        ValueType::Uint32Array,
        ValueType::Uint64Array,
        ValueType::Int8Array,
        ValueType::Int16Array,
        ValueType::Int32Array,
        ValueType::Int64Array,
        ValueType::Float32Array,
        ValueType::Float64Array,
    ];

    /// Canonical type name as reported in readings
    pub fn as_str(&self) -> &'static str {
        match self {
            ValueType::Bool => "Bool",
            ValueType::String => "String",
            ValueType::Uint8 => "Uint8",
            ValueType::Uint16 => "Uint16",
            ValueType::Uint32 => "Uint32",
            ValueType::Uint64 => "Uint64",
            ValueType::Int8 => "Int8",
            ValueType::Int16 => "Int16",
            ValueType::Int32 => "Int32",
            ValueType::Int64 => "Int64",
            ValueType::Float32 => "Float32",
            ValueType::Float64 => "Float64",
            ValueType::Binary => "Binary",
            ValueType::BoolArray => "BoolArray",
            ValueType::Uint8Array => "Uint8Array",
            ValueType::Uint16Array => "Uint16Array",
            ValueType::Uint32Array => "Uint32Array",
            ValueType::Uint64Array => "Uint64Array",
            ValueType::Int8Array => "Int8Array",
            ValueType::Int16Array => "Int16Array",
            ValueType::Int32Array => "Int32Array",
            ValueType::Int64Array => "Int64Array",
            ValueType::Float32Array => "Float32Array",
            ValueType::Float64Array => "Float64Array",
        }
    }

    pub fn is_float(&self) -> bool {
        matches!(self, ValueType::Float32 | ValueType::Float64)
    }
}

impl fmt::Display for ValueType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Error returned for an unrecognized type tag
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("unsupported value type: {0}")]
pub struct UnknownValueType(pub String);

impl FromStr for ValueType {
    type Err = UnknownValueType;

    /// Type tags are matched case-insensitively
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        ValueType::ALL
            .iter()
            .find(|t| t.as_str().eq_ignore_ascii_case(s))
            .copied()
            .ok_or_else(|| UnknownValueType(s.to_string()))
    }
}

/// Typed payload of a command value
#[derive(Debug, Clone, PartialEq)]
pub enum Value {
    Bool(bool),
    String(String),
    Uint8(u8),
    Uint16(u16),
    Uint32(u32),
    Uint64(u64),
    Int8(i8),
    Int16(i16),
    Int32(i32),
    Int64(i64),
    Float32(f32),
    Float64(f64),
    Binary(Vec<u8>),
    BoolArray(Vec<bool>),
    Uint8Array(Vec<u8>),
    Uint16Array(Vec<u16>),
    Uint32Array(Vec<u32>),
    Uint64Array(Vec<u64>),
    Int8Array(Vec<i8>),
    Int16Array(Vec<i16>),
    Int32Array(Vec<i32>),
    Int64Array(Vec<i64>),
    Float32Array(Vec<f32>),
    Float64Array(Vec<f64>),
}

impl Value {
    pub fn value_type(&self) -> ValueType {
        match self {
            Value::Bool(_) => ValueType::Bool,
            Value::String(_) => ValueType::String,
            Value::Uint8(_) => ValueType::Uint8,
            Value::Uint16(_) => ValueType::Uint16,
            Value::Uint32(_) => ValueType::Uint32,
            Value::Uint64(_) => ValueType::Uint64,
            Value::Int8(_) => ValueType::Int8,
            Value::Int16(_) => ValueType::Int16,
            Value::Int32(_) => ValueType::Int32,
            Value::Int64(_) => ValueType::Int64,
            Value::Float32(_) => ValueType::Float32,
            Value::Float64(_) => ValueType::Float64,
            Value::Binary(_) => ValueType::Binary,
            Value::BoolArray(_) => ValueType::BoolArray,
            Value::Uint8Array(_) => ValueType::Uint8Array,
            Value::Uint16Array(_) => ValueType::Uint16Array,
            Value::Uint32Array(_) => ValueType::Uint32Array,
            Value::Uint64Array(_) => ValueType::Uint64Array,
            Value::Int8Array(_) => ValueType::Int8Array,
            Value::Int16Array(_) => ValueType::Int16Array,
            Value::Int32Array(_) => ValueType::Int32Array,
            Value::Int64Array(_) => ValueType::Int64Array,
            Value::Float32Array(_) => ValueType::Float32Array,
            Value::Float64Array(_) => ValueType::Float64Array,
        }
    }
}

fn json_array<T: Serialize>(items: &[T]) -> String {
    serde_json::to_string(items).unwrap_or_else(|_| "[]".into())
}

/// Renders the payload the way it is compared against assertions and mapping keys
impl fmt::Display for Value {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Value::Bool(v) => write!(f, "{}", v),
            Value::String(v) => f.write_str(v),
            Value::Uint8(v) => write!(f, "{}", v),
            Value::Uint16(v) => write!(f, "{}", v),
            Value::Uint32(v) => write!(f, "{}", v),
            Value::Uint64(v) => write!(f, "{}", v),
            Value::Int8(v) => write!(f, "{}", v),
            Value::Int16(v) => write!(f, "{}", v),
            Value::Int32(v) => write!(f, "{}", v),
            Value::Int64(v) => write!(f, "{}", v),
            Value::Float32(v) => write!(f, "{}", v),
            Value::Float64(v) => write!(f, "{}", v),
            Value::Binary(v) => write!(f, "Binary: [{} bytes]", v.len()),
            Value::BoolArray(v) => f.write_str(&json_array(v)),
            Value::Uint8Array(v) => f.write_str(&json_array(v)),
            Value::Uint16Array(v) => f.write_str(&json_array(v)),
            Value::Uint32Array(v) => f.write_str(&json_array(v)),
            Value::Uint64Array(v) => f.write_str(&json_array(v)),
            Value::Int8Array(v) => f.write_str(&json_array(v)),
            Value::Int16Array(v) => f.write_str(&json_array(v)),
            Value::Int32Array(v) => f.write_str(&json_array(v)),
            Value::Int64Array(v) => f.write_str(&json_array(v)),
            Value::Float32Array(v) => f.write_str(&json_array(v)),
            Value::Float64Array(v) => f.write_str(&json_array(v)),
        }
    }
}

/// A single typed data point produced by a driver or decoded from a request
#[derive(Debug, Clone, PartialEq)]
pub struct CommandValue {
    pub device_resource_name: String,
    /// Nanoseconds since Unix epoch at creation
    pub origin: i64,
    pub value: Value,
}

impl CommandValue {
    pub fn new(device_resource_name: impl Into<String>, origin: i64, value: Value) -> Self {
        Self {
            device_resource_name: device_resource_name.into(),
            origin,
            value,
        }
    }

    /// Convenience constructor for string values
    pub fn string(device_resource_name: impl Into<String>, origin: i64, value: impl Into<String>) -> Self {
        Self::new(device_resource_name, origin, Value::String(value.into()))
    }

    pub fn value_type(&self) -> ValueType {
        self.value.value_type()
    }

    /// A copy of this value with a different payload, keeping name and origin
    pub fn with_value(&self, value: Value) -> Self {
        Self::new(self.device_resource_name.clone(), self.origin, value)
    }
}

impl fmt::Display for CommandValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "DeviceResource: {}, {}: {}",
            self.device_resource_name,
            self.value_type(),
            self.value
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_value_type_parse_case_insensitive() {
        assert_eq!("uint8".parse::<ValueType>(), Ok(ValueType::Uint8));
        assert_eq!("UINT8".parse::<ValueType>(), Ok(ValueType::Uint8));
        assert_eq!("Float32Array".parse::<ValueType>(), Ok(ValueType::Float32Array));
        assert_eq!("float32array".parse::<ValueType>(), Ok(ValueType::Float32Array));
        assert!("uint128".parse::<ValueType>().is_err());
    }

    #[test]
    fn test_every_type_round_trips_through_its_name() {
        for t in ValueType::ALL {
            assert_eq!(t.as_str().parse::<ValueType>(), Ok(t));
        }
    }

    #[test]
    fn test_value_display() {
        assert_eq!(Value::Bool(true).to_string(), "true");
        assert_eq!(Value::Int16(-42).to_string(), "-42");
        assert_eq!(Value::Float64(3.5).to_string(), "3.5");
        assert_eq!(Value::Int32Array(vec![1, -2, 3]).to_string(), "[1,-2,3]");
        assert_eq!(Value::Binary(vec![0, 1, 2]).to_string(), "Binary: [3 bytes]");
    }

    #[test]
    fn test_command_value_display() {
        let cv = CommandValue::new("temperature", 1, Value::Uint8(5));
        assert_eq!(cv.to_string(), "DeviceResource: temperature, Uint8: 5");
    }

    #[test]
    fn test_with_value_keeps_origin() {
        let cv = CommandValue::new("mode", 77, Value::Uint8(1));
        let replaced = cv.with_value(Value::String("heat".into()));
        assert_eq!(replaced.origin, 77);
        assert_eq!(replaced.device_resource_name, "mode");
        assert_eq!(replaced.value_type(), ValueType::String);
    }
}
