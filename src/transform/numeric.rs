//! Numeric transforms driven by the declared value properties
//!
//! Read:  mask -> shift -> base^v -> v*scale -> v+offset
//! Write: v-offset -> v/scale -> log_base(v)
//!
//! Non-numeric values pass through untouched. Results are range-checked
//! against the value's own type.

use edgecmd_shared::{CommandValue, Device, Value, ValueProperty, ValueType};
use std::collections::HashMap;
use tracing::warn;

use super::{TransformError, Transformer};

/// Transformer implementing mask/shift/base/scale/offset, equality assertions and mapping tables
#[derive(Debug, Default, Clone, Copy)]
pub struct DefaultTransformer;

impl DefaultTransformer {
    pub fn new() -> Self {
        Self
    }
}

#[derive(Debug, Clone, Copy)]
enum Number {
    Int(i128),
    Float(f64),
}

impl Number {
    fn as_f64(self) -> f64 {
        match self {
            Number::Int(i) => i as f64,
            Number::Float(f) => f,
        }
    }
}

fn number(value: &Value) -> Option<Number> {
    let n = match value {
        Value::Uint8(v) => Number::Int(*v as i128),
        Value::Uint16(v) => Number::Int(*v as i128),
        Value::Uint32(v) => Number::Int(*v as i128),
        Value::Uint64(v) => Number::Int(*v as i128),
        Value::Int8(v) => Number::Int(*v as i128),
        Value::Int16(v) => Number::Int(*v as i128),
        Value::Int32(v) => Number::Int(*v as i128),
        Value::Int64(v) => Number::Int(*v as i128),
        Value::Float32(v) => Number::Float(*v as f64),
        Value::Float64(v) => Number::Float(*v),
        _ => return None,
    };
    Some(n)
}

fn overflow(value_type: ValueType, n: Number) -> TransformError {
    let result = match n {
        Number::Int(i) => i.to_string(),
        Number::Float(f) => f.to_string(),
    };
    TransformError::Overflow { value_type, result }
}

fn into_value(value_type: ValueType, n: Number) -> Result<Value, TransformError> {
    let int = match n {
        Number::Int(i) => Some(i),
        Number::Float(f) if f.is_finite() && f.trunc().abs() < 1e38 => Some(f.trunc() as i128),
        Number::Float(_) => None,
    };

    macro_rules! int_variant {
        ($variant:ident) => {
            int.and_then(|i| i.try_into().ok())
                .map(Value::$variant)
                .ok_or_else(|| overflow(value_type, n))
        };
    }

    match value_type {
        ValueType::Uint8 => int_variant!(Uint8),
        ValueType::Uint16 => int_variant!(Uint16),
        ValueType::Uint32 => int_variant!(Uint32),
        ValueType::Uint64 => int_variant!(Uint64),
        ValueType::Int8 => int_variant!(Int8),
        ValueType::Int16 => int_variant!(Int16),
        ValueType::Int32 => int_variant!(Int32),
        ValueType::Int64 => int_variant!(Int64),
        ValueType::Float32 => {
            let f = n.as_f64();
            if !f.is_finite() || f.abs() > f32::MAX as f64 {
                return Err(overflow(value_type, n));
            }
            Ok(Value::Float32(f as f32))
        }
        ValueType::Float64 => {
            let f = n.as_f64();
            if !f.is_finite() {
                return Err(overflow(value_type, n));
            }
            Ok(Value::Float64(f))
        }
        _ => Err(overflow(value_type, n)),
    }
}

/// Parse an optional float parameter, treating empty and neutral values as absent
fn float_param(name: &'static str, raw: &Option<String>, neutral: f64) -> Result<Option<f64>, TransformError> {
    let Some(raw) = raw.as_deref().filter(|r| !r.is_empty()) else {
        return Ok(None);
    };
    let v = raw
        .trim()
        .parse::<f64>()
        .map_err(|_| TransformError::InvalidParameter { name, raw: raw.to_string() })?;
    Ok((v != neutral).then_some(v))
}

fn int_param<N: std::str::FromStr>(name: &'static str, raw: &Option<String>) -> Result<Option<N>, TransformError> {
    let Some(raw) = raw.as_deref().filter(|r| !r.is_empty()) else {
        return Ok(None);
    };
    raw.trim()
        .parse::<N>()
        .map(Some)
        .map_err(|_| TransformError::InvalidParameter { name, raw: raw.to_string() })
}

impl Transformer for DefaultTransformer {
    fn transform_on_read(&self, cv: &CommandValue, props: &ValueProperty) -> Result<CommandValue, TransformError> {
        let Some(mut n) = number(&cv.value) else {
            return Ok(cv.clone());
        };
        let original = n;

        if let (Some(mask), Number::Int(i)) = (int_param::<u64>("mask", &props.mask)?, n) {
            n = Number::Int(i & mask as i128);
        }

        if let (Some(shift), Number::Int(i)) = (int_param::<i32>("shift", &props.shift)?, n) {
            if shift.unsigned_abs() >= 64 {
                return Err(TransformError::InvalidParameter {
                    name: "shift",
                    raw: shift.to_string(),
                });
            }
            n = Number::Int(if shift >= 0 { i << shift } else { i >> -shift });
        }

        if let Some(base) = float_param("base", &props.base, 0.0)? {
            n = Number::Float(base.powf(n.as_f64()));
        }

        if let Some(scale) = float_param("scale", &props.scale, 1.0)? {
            n = Number::Float(n.as_f64() * scale);
        }

        if let Some(offset) = float_param("offset", &props.offset, 0.0)? {
            n = Number::Float(n.as_f64() + offset);
        }

        if matches!((original, n), (Number::Int(a), Number::Int(b)) if a == b) {
            return Ok(cv.clone());
        }

        Ok(cv.with_value(into_value(cv.value_type(), n)?))
    }

    fn transform_on_write(&self, cv: &CommandValue, props: &ValueProperty) -> Result<CommandValue, TransformError> {
        let Some(mut n) = number(&cv.value) else {
            return Ok(cv.clone());
        };
        let mut changed = false;

        if let Some(offset) = float_param("offset", &props.offset, 0.0)? {
            n = Number::Float(n.as_f64() - offset);
            changed = true;
        }

        if let Some(scale) = float_param("scale", &props.scale, 1.0)? {
            if scale == 0.0 {
                return Err(TransformError::InvalidParameter {
                    name: "scale",
                    raw: "0".into(),
                });
            }
            n = Number::Float(n.as_f64() / scale);
            changed = true;
        }

        if let Some(base) = float_param("base", &props.base, 0.0)? {
            n = Number::Float(n.as_f64().ln() / base.ln());
            changed = true;
        }

        if !changed {
            return Ok(cv.clone());
        }

        Ok(cv.with_value(into_value(cv.value_type(), n)?))
    }

    fn check_assertion(
        &self,
        cv: &CommandValue,
        assertion: Option<&str>,
        device: &Device,
    ) -> Result<(), TransformError> {
        let Some(assertion) = assertion.filter(|a| !a.is_empty()) else {
            return Ok(());
        };

        let value = cv.value.to_string();
        if value != assertion {
            warn!(
                "Assertion ({}) failed for device {} resource {}",
                assertion, device.name, cv.device_resource_name
            );
            return Err(TransformError::AssertionFailed {
                device: device.name.clone(),
                assertion: assertion.to_string(),
                value,
            });
        }

        Ok(())
    }

    fn map_value(&self, cv: &CommandValue, mappings: &HashMap<String, String>) -> Option<CommandValue> {
        mappings
            .get(&cv.value.to_string())
            .map(|mapped| CommandValue::string(cv.device_resource_name.clone(), cv.origin, mapped.clone()))
    }
}
