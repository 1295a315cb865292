//! Value transforms, assertions and mapping tables
//!
//! Transforms never mutate a command value; they return a replacement.

mod numeric;

pub use numeric::DefaultTransformer;

use edgecmd_shared::{CommandValue, Device, ValueProperty, ValueType};
use std::collections::HashMap;
use thiserror::Error;

/// Errors raised by transforms and assertion checks
#[derive(Error, Debug, Clone, PartialEq)]
pub enum TransformError {
    #[error("invalid {name} parameter {raw:?}")]
    InvalidParameter { name: &'static str, raw: String },

    #[error("transformed value {result} overflows {value_type}")]
    Overflow { value_type: ValueType, result: String },

    #[error("assertion ({assertion}) failed for device {device} with value: {value}")]
    AssertionFailed {
        device: String,
        assertion: String,
        value: String,
    },
}

/// Transform capability consumed by the read and write pipelines
pub trait Transformer: Send + Sync {
    /// Apply the declared read-side transform to a driver result
    fn transform_on_read(&self, value: &CommandValue, props: &ValueProperty) -> Result<CommandValue, TransformError>;

    /// Apply the declared write-side transform before handing a value to the driver
    fn transform_on_write(&self, value: &CommandValue, props: &ValueProperty) -> Result<CommandValue, TransformError>;

    /// Check a value against the declared assertion, if any
    fn check_assertion(
        &self,
        value: &CommandValue,
        assertion: Option<&str>,
        device: &Device,
    ) -> Result<(), TransformError>;

    /// Substitute a value through a mapping table; `None` when no key matches
    fn map_value(&self, value: &CommandValue, mappings: &HashMap<String, String>) -> Option<CommandValue>;
}
