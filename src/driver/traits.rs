//! Driver trait abstraction for pluggable device protocols

use anyhow::Result;
use async_trait::async_trait;
use edgecmd_shared::model::ProtocolProperties;
use edgecmd_shared::{CommandValue, ValueType};
use std::collections::HashMap;

/// One device-resource operation handed to a driver
#[derive(Debug, Clone, PartialEq)]
pub struct CommandRequest {
    pub device_resource_name: String,
    pub attributes: HashMap<String, String>,
    pub value_type: ValueType,
}

/// A device-specific protocol driver
#[async_trait]
pub trait ProtocolDriver: Send + Sync {
    /// Read every requested resource, returning one value per resource
    async fn handle_read_commands(
        &self,
        device_name: &str,
        protocols: &ProtocolProperties,
        requests: &[CommandRequest],
    ) -> Result<Vec<CommandValue>>;

    /// Write `values[i]` to the resource named by `requests[i]`
    async fn handle_write_commands(
        &self,
        device_name: &str,
        protocols: &ProtocolProperties,
        requests: &[CommandRequest],
        values: &[CommandValue],
    ) -> Result<()>;
}
