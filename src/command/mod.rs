//! Command execution engine
//!
//! This module handles:
//! - Resolving a device and command into an execution plan
//! - Rejecting locked and disabled devices
//! - Running the read and write pipelines against the protocol driver
//! - Fanning a command out to every operational device

mod executor;
pub mod handlers;

#[cfg(test)]
mod testing;

pub use executor::{CommandExecutor, DeviceKey, ExecutionPlan};
