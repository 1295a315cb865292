//! Events and readings reported back to callers of a read command

use base64::{engine::general_purpose::STANDARD, Engine as _};
use serde::{Serialize, Serializer};

use crate::defaults;
use crate::value::{CommandValue, Value, ValueType};

/// A materialized data point derived from a command value
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Reading {
    pub device: String,
    pub name: String,
    pub value: String,
    pub value_type: ValueType,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub media_type: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub float_encoding: Option<String>,
    #[serde(
        skip_serializing_if = "Option::is_none",
        serialize_with = "serialize_binary"
    )]
    pub binary_value: Option<Vec<u8>>,
    pub origin: i64,
}

fn serialize_binary<S: Serializer>(bytes: &Option<Vec<u8>>, serializer: S) -> Result<S::Ok, S::Error> {
    match bytes {
        Some(b) => serializer.serialize_str(&STANDARD.encode(b)),
        None => serializer.serialize_none(),
    }
}

fn uses_base64(float_encoding: Option<&str>) -> bool {
    float_encoding.is_some_and(|e| e.eq_ignore_ascii_case(defaults::BASE64_ENCODING))
}

/// Six-digit mantissa with a signed, at least two-digit exponent: `2.150000e+01`
fn e_notation(v: f64) -> String {
    if v.is_nan() {
        return "NaN".into();
    }
    if v.is_infinite() {
        return if v > 0.0 { "+Inf".into() } else { "-Inf".into() };
    }

    let formatted = format!("{:.6e}", v);
    match formatted.split_once('e') {
        Some((mantissa, exp)) => {
            let exp: i32 = exp.parse().unwrap_or_default();
            let sign = if exp < 0 { '-' } else { '+' };
            format!("{}e{}{:02}", mantissa, sign, exp.abs())
        }
        None => formatted,
    }
}

impl Reading {
    /// Build a reading for `device` carrying the media-type and float-encoding hints
    ///
    /// Floats render as base64 big-endian bytes when the hint is `Base64` and in
    /// e-notation otherwise. Binary payloads travel in `binary_value`.
    pub fn from_command_value(
        cv: &CommandValue,
        device: &str,
        media_type: Option<&str>,
        float_encoding: Option<&str>,
    ) -> Self {
        let mut binary_value = None;
        let value = match &cv.value {
            Value::Float32(v) if uses_base64(float_encoding) => STANDARD.encode(v.to_be_bytes()),
            Value::Float64(v) if uses_base64(float_encoding) => STANDARD.encode(v.to_be_bytes()),
            Value::Float32(v) => e_notation(*v as f64),
            Value::Float64(v) => e_notation(*v),
            Value::Binary(bytes) => {
                binary_value = Some(bytes.clone());
                String::new()
            }
            other => other.to_string(),
        };

        let float_encoding = if cv.value_type().is_float() {
            Some(float_encoding.unwrap_or(defaults::E_NOTATION).to_string())
        } else {
            None
        };

        Self {
            device: device.to_string(),
            name: cv.device_resource_name.clone(),
            value,
            value_type: cv.value_type(),
            media_type: media_type.filter(|m| !m.is_empty()).map(str::to_string),
            float_encoding,
            binary_value,
            origin: cv.origin,
        }
    }
}

/// The readings produced by one read command on one device
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Event {
    pub device: String,
    pub origin: i64,
    pub readings: Vec<Reading>,
}

impl Event {
    /// Create an event with a freshly assigned unique origin
    pub fn new(device: impl Into<String>, readings: Vec<Reading>) -> Self {
        Self {
            device: device.into(),
            origin: crate::unique_origin(),
            readings,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_integer_reading() {
        let cv = CommandValue::new("level", 10, Value::Int32(-7));
        let reading = Reading::from_command_value(&cv, "dev-1", None, None);
        assert_eq!(reading.device, "dev-1");
        assert_eq!(reading.name, "level");
        assert_eq!(reading.value, "-7");
        assert_eq!(reading.value_type, ValueType::Int32);
        assert_eq!(reading.origin, 10);
        assert!(reading.float_encoding.is_none());
    }

    #[test]
    fn test_float_reading_encodings() {
        let cv = CommandValue::new("temp", 1, Value::Float32(1.5));

        let reading = Reading::from_command_value(&cv, "dev-1", None, Some("Base64"));
        assert_eq!(reading.value, STANDARD.encode(1.5f32.to_be_bytes()));
        assert_eq!(reading.float_encoding.as_deref(), Some("Base64"));

        let reading = Reading::from_command_value(&cv, "dev-1", None, None);
        assert_eq!(reading.value, "1.500000e+00");
        assert_eq!(reading.float_encoding.as_deref(), Some(defaults::E_NOTATION));
        assert_eq!(reading.value.parse::<f32>().ok(), Some(1.5));
    }

    #[test]
    fn test_e_notation_format() {
        assert_eq!(e_notation(21.5), "2.150000e+01");
        assert_eq!(e_notation(-0.00125), "-1.250000e-03");
        assert_eq!(e_notation(0.0), "0.000000e+00");
        assert_eq!(e_notation(1.0e300), "1.000000e+300");
        assert_eq!(e_notation(1.0 / 3.0), "3.333333e-01");
        assert_eq!(e_notation(f64::NEG_INFINITY), "-Inf");
        assert_eq!(e_notation(f64::NAN), "NaN");
    }

    #[test]
    fn test_binary_reading() {
        let cv = CommandValue::new("image", 1, Value::Binary(vec![0xde, 0xad]));
        let reading = Reading::from_command_value(&cv, "cam", Some("image/jpeg"), None);
        assert_eq!(reading.binary_value, Some(vec![0xde, 0xad]));
        assert_eq!(reading.media_type.as_deref(), Some("image/jpeg"));
        assert!(reading.value.is_empty());

        let json = serde_json::to_value(&reading).expect("serialize");
        assert_eq!(json["binaryValue"], "3q0=");
        assert_eq!(json["valueType"], "Binary");
    }

    #[test]
    fn test_event_origins_are_unique() {
        let a = Event::new("dev", vec![]);
        let b = Event::new("dev", vec![]);
        assert!(b.origin > a.origin);
    }
}
