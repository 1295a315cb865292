//! Value codec: string parameters to typed command values
//!
//! Scalars are parsed with the exact width and signedness of the declared
//! type. Arrays are JSON, except `Uint8Array` which uses the legacy bracketed
//! comma-separated form:
//! ```text
//! [ 1, 2, 255 ]
//! ```
//! Floats that are not decimal literals fall back to base64-encoded
//! big-endian IEEE-754 bytes of the declared width.

use base64::{engine::general_purpose::STANDARD, Engine as _};
use bytes::Buf;
use serde::de::DeserializeOwned;
use std::num::{IntErrorKind, ParseIntError};
use std::str::FromStr;
use thiserror::Error;

use crate::value::{CommandValue, Value, ValueType};

/// Errors that can occur while decoding a parameter
#[derive(Error, Debug)]
pub enum CodecError {
    #[error("unsupported value type: {0}")]
    UnsupportedType(String),

    #[error("invalid {value_type} value {raw:?}: {reason}")]
    InvalidValue {
        value_type: ValueType,
        raw: String,
        reason: String,
    },

    #[error("{value_type} value {raw:?} out of range")]
    OutOfRange { value_type: ValueType, raw: String },

    #[error("invalid {value_type} value {raw:?}: {source}")]
    InvalidArray {
        value_type: ValueType,
        raw: String,
        #[source]
        source: serde_json::Error,
    },

    #[error("invalid base64 {value_type} value {raw:?}: {source}")]
    InvalidBase64 {
        value_type: ValueType,
        raw: String,
        #[source]
        source: base64::DecodeError,
    },

    #[error("not enough data for {value_type}: need {needed} bytes, have {available}")]
    NotEnoughData {
        value_type: ValueType,
        needed: usize,
        available: usize,
    },

    #[error("fail to parse {raw:?} to {value_type}, unexpected result NaN")]
    NotANumber { value_type: ValueType, raw: String },
}

/// Decode `raw` against a declared type tag into a value owned by `device_resource_name`
///
/// The value's origin is the current nanosecond timestamp.
pub fn decode(device_resource_name: &str, declared_type: &str, raw: &str) -> Result<CommandValue, CodecError> {
    let value_type = declared_type
        .parse::<ValueType>()
        .map_err(|_| CodecError::UnsupportedType(declared_type.to_string()))?;
    let value = decode_value(value_type, raw)?;
    Ok(CommandValue::new(device_resource_name, crate::now_ns(), value))
}

/// Decode `raw` into a payload of the given type
pub fn decode_value(value_type: ValueType, raw: &str) -> Result<Value, CodecError> {
    use ValueType as T;

    let value = match value_type {
        T::Bool => Value::Bool(parse_bool(raw)?),
        T::String => Value::String(raw.to_string()),
        T::Uint8 => Value::Uint8(parse_uint(value_type, raw)?),
        T::Uint16 => Value::Uint16(parse_uint(value_type, raw)?),
        T::Uint32 => Value::Uint32(parse_uint(value_type, raw)?),
        T::Uint64 => Value::Uint64(parse_uint(value_type, raw)?),
        T::Int8 => Value::Int8(parse_int(value_type, raw)?),
        T::Int16 => Value::Int16(parse_int(value_type, raw)?),
        T::Int32 => Value::Int32(parse_int(value_type, raw)?),
        T::Int64 => Value::Int64(parse_int(value_type, raw)?),
        T::Float32 => Value::Float32(parse_float32(raw)?),
        T::Float64 => Value::Float64(parse_float64(raw)?),
        T::Binary => return Err(CodecError::UnsupportedType(value_type.to_string())),
        T::BoolArray => Value::BoolArray(parse_json_array(value_type, raw)?),
        T::Uint8Array => Value::Uint8Array(parse_bracketed_u8(raw)?),
        T::Uint16Array => Value::Uint16Array(parse_json_array(value_type, raw)?),
        T::Uint32Array => Value::Uint32Array(parse_json_array(value_type, raw)?),
        T::Uint64Array => Value::Uint64Array(parse_json_array(value_type, raw)?),
        T::Int8Array => Value::Int8Array(parse_json_array(value_type, raw)?),
        T::Int16Array => Value::Int16Array(parse_json_array(value_type, raw)?),
        T::Int32Array => Value::Int32Array(parse_json_array(value_type, raw)?),
        T::Int64Array => Value::Int64Array(parse_json_array(value_type, raw)?),
        T::Float32Array => Value::Float32Array(parse_json_array(value_type, raw)?),
        T::Float64Array => Value::Float64Array(parse_json_array(value_type, raw)?),
    };

    Ok(value)
}

fn parse_bool(raw: &str) -> Result<bool, CodecError> {
    match raw {
        "1" | "t" | "T" | "TRUE" | "true" | "True" => Ok(true),
        "0" | "f" | "F" | "FALSE" | "false" | "False" => Ok(false),
        _ => Err(CodecError::InvalidValue {
            value_type: ValueType::Bool,
            raw: raw.to_string(),
            reason: "not a boolean literal".into(),
        }),
    }
}

fn parse_int<N>(value_type: ValueType, raw: &str) -> Result<N, CodecError>
where
    N: FromStr<Err = ParseIntError>,
{
    raw.parse::<N>().map_err(|e| match e.kind() {
        IntErrorKind::PosOverflow | IntErrorKind::NegOverflow => CodecError::OutOfRange {
            value_type,
            raw: raw.to_string(),
        },
        _ => CodecError::InvalidValue {
            value_type,
            raw: raw.to_string(),
            reason: e.to_string(),
        },
    })
}

/// Unsigned widths take digits only; an explicit `+` sign is rejected
fn parse_uint<N>(value_type: ValueType, raw: &str) -> Result<N, CodecError>
where
    N: FromStr<Err = ParseIntError>,
{
    if raw.starts_with('+') {
        return Err(CodecError::InvalidValue {
            value_type,
            raw: raw.to_string(),
            reason: "unexpected sign".into(),
        });
    }
    parse_int(value_type, raw)
}

fn parse_json_array<N: DeserializeOwned>(value_type: ValueType, raw: &str) -> Result<Vec<N>, CodecError> {
    serde_json::from_str(raw).map_err(|source| CodecError::InvalidArray {
        value_type,
        raw: raw.to_string(),
        source,
    })
}

fn parse_bracketed_u8(raw: &str) -> Result<Vec<u8>, CodecError> {
    raw.trim_matches(|c| c == '[' || c == ']')
        .split(',')
        .map(|item| parse_uint::<u8>(ValueType::Uint8Array, item.trim_matches(' ')))
        .collect()
}

/// True when the literal itself spells infinity, so an infinite parse is not an overflow
fn is_infinity_literal(raw: &str) -> bool {
    let unsigned = raw.trim_start_matches(['+', '-']);
    unsigned.eq_ignore_ascii_case("inf") || unsigned.eq_ignore_ascii_case("infinity")
}

fn decode_base64(value_type: ValueType, raw: &str, needed: usize) -> Result<Vec<u8>, CodecError> {
    let bytes = STANDARD.decode(raw).map_err(|source| CodecError::InvalidBase64 {
        value_type,
        raw: raw.to_string(),
        source,
    })?;

    if bytes.len() < needed {
        return Err(CodecError::NotEnoughData {
            value_type,
            needed,
            available: bytes.len(),
        });
    }

    Ok(bytes)
}

fn parse_float32(raw: &str) -> Result<f32, CodecError> {
    let value_type = ValueType::Float32;
    match raw.parse::<f32>() {
        Ok(v) if v.is_infinite() && !is_infinity_literal(raw) => Err(CodecError::OutOfRange {
            value_type,
            raw: raw.to_string(),
        }),
        Ok(v) => Ok(v),
        Err(_) => {
            let bytes = decode_base64(value_type, raw, 4)?;
            let v = bytes.as_slice().get_f32();
            if v.is_nan() {
                return Err(CodecError::NotANumber {
                    value_type,
                    raw: raw.to_string(),
                });
            }
            Ok(v)
        }
    }
}

fn parse_float64(raw: &str) -> Result<f64, CodecError> {
    let value_type = ValueType::Float64;
    match raw.parse::<f64>() {
        Ok(v) if v.is_infinite() && !is_infinity_literal(raw) => Err(CodecError::OutOfRange {
            value_type,
            raw: raw.to_string(),
        }),
        Ok(v) => Ok(v),
        Err(_) => {
            let bytes = decode_base64(value_type, raw, 8)?;
            let v = bytes.as_slice().get_f64();
            if v.is_nan() {
                return Err(CodecError::NotANumber {
                    value_type,
                    raw: raw.to_string(),
                });
            }
            Ok(v)
        }
    }
}
