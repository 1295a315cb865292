//! Device command engine
//!
//! Resolves device commands against cached profiles, decodes and transforms
//! values, and executes reads and writes through a protocol driver.

pub mod cache;
pub mod command;
pub mod config;
pub mod driver;
pub mod error;
pub mod metadata;
pub mod transform;

pub use command::{CommandExecutor, DeviceKey, ExecutionPlan};
pub use config::{DeviceConfig, EngineConfig};
pub use error::{CommandError, ErrorKind, Result};
