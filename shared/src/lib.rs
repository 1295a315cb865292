//! edgecmd Shared Types
//!
//! This crate provides the device model, the typed command values and the
//! value codec shared by the command engine and device drivers.

pub mod codec;
pub mod model;
pub mod reading;
pub mod value;

use std::sync::atomic::{AtomicI64, Ordering};
use std::time::{SystemTime, UNIX_EPOCH};

// Re-export commonly used types at crate root
pub use codec::{decode, CodecError};
pub use model::{
    AdminState, Device, DeviceCommand, DeviceResource, Method, OperatingState, Profile,
    ResourceOperation, ValueProperty,
};
pub use reading::{Event, Reading};
pub use value::{CommandValue, Value, ValueType};

/// Get current timestamp in milliseconds since Unix epoch
pub fn now_ms() -> i64 {
    SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .unwrap_or_default()
        .as_millis() as i64
}

/// Get current timestamp in nanoseconds since Unix epoch
pub fn now_ns() -> i64 {
    SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .unwrap_or_default()
        .as_nanos() as i64
}

static LAST_ORIGIN: AtomicI64 = AtomicI64::new(0);

/// Nanosecond timestamp that is strictly greater than any previously returned one
pub fn unique_origin() -> i64 {
    let now = now_ns();
    let mut last = LAST_ORIGIN.load(Ordering::Relaxed);
    loop {
        let next = if now > last { now } else { last + 1 };
        match LAST_ORIGIN.compare_exchange_weak(last, next, Ordering::SeqCst, Ordering::Relaxed) {
            Ok(_) => return next,
            Err(actual) => last = actual,
        }
    }
}

/// Defaults and reserved names shared with drivers
pub mod defaults {
    /// Maximum number of resource operations a single command may expand to
    pub const MAX_CMD_OPS: usize = 128;

    /// Attribute key under which filtered query parameters are handed to the driver
    pub const URL_RAW_QUERY: &str = "urlRawQuery";

    /// Query parameters with this prefix are reserved and never passed to drivers
    pub const SDK_RESERVED_PREFIX: &str = "ds-";

    /// Method token that selects the read path
    pub const GET_CMD_METHOD: &str = "get";

    /// Float encoding hint for base64 big-endian bytes
    pub const BASE64_ENCODING: &str = "Base64";

    /// Float encoding hint for e-notation
    pub const E_NOTATION: &str = "eNotation";
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_now_ns_is_after_now_ms() {
        let ms = now_ms();
        let ns = now_ns();
        assert!(ms > 0);
        assert!(ns / 1_000_000 >= ms);
    }

    #[test]
    fn test_unique_origin_strictly_increases() {
        let mut prev = unique_origin();
        for _ in 0..1000 {
            let next = unique_origin();
            assert!(next > prev);
            prev = next;
        }
    }
}
