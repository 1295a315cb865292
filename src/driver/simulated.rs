//! In-memory simulated driver
//!
//! Keeps the last written value per (device, resource). Reads of a resource
//! that was never written return the zero value of the requested type.

use anyhow::{anyhow, Result};
use async_trait::async_trait;
use edgecmd_shared::model::ProtocolProperties;
use edgecmd_shared::{now_ns, CommandValue, Value, ValueType};
use std::collections::HashMap;
use std::sync::Arc;
use tokio::sync::RwLock;
use tracing::debug;

use super::traits::{CommandRequest, ProtocolDriver};

/// Driver backed by an in-memory register map
#[derive(Debug, Default, Clone)]
pub struct SimulatedDriver {
    registers: Arc<RwLock<HashMap<(String, String), Value>>>,
}

impl SimulatedDriver {
    pub fn new() -> Self {
        Self::default()
    }

    /// Current register value, if the resource was ever written
    pub async fn register(&self, device_name: &str, resource: &str) -> Option<Value> {
        self.registers
            .read()
            .await
            .get(&(device_name.to_string(), resource.to_string()))
            .cloned()
    }
}

fn zero_value(value_type: ValueType) -> Value {
    match value_type {
        ValueType::Bool => Value::Bool(false),
        ValueType::String => Value::String(String::new()),
        ValueType::Uint8 => Value::Uint8(0),
        ValueType::Uint16 => Value::Uint16(0),
        ValueType::Uint32 => Value::Uint32(0),
        ValueType::Uint64 => Value::Uint64(0),
        ValueType::Int8 => Value::Int8(0),
        ValueType::Int16 => Value::Int16(0),
        ValueType::Int32 => Value::Int32(0),
        ValueType::Int64 => Value::Int64(0),
        ValueType::Float32 => Value::Float32(0.0),
        ValueType::Float64 => Value::Float64(0.0),
        ValueType::Binary => Value::Binary(Vec::new()),
        ValueType::BoolArray => Value::BoolArray(Vec::new()),
        ValueType::Uint8Array => Value::Uint8Array(Vec::new()),
        ValueType::Uint16Array => Value::Uint16Array(Vec::new()),
        ValueType::Uint32Array => Value::Uint32Array(Vec::new()),
        ValueType::Uint64Array => Value::Uint64Array(Vec::new()),
        ValueType::Int8Array => Value::Int8Array(Vec::new()),
        ValueType::Int16Array => Value::Int16Array(Vec::new()),
        ValueType::Int32Array => Value::Int32Array(Vec::new()),
        ValueType::Int64Array => Value::Int64Array(Vec::new()),
        ValueType::Float32Array => Value::Float32Array(Vec::new()),
        ValueType::Float64Array => Value::Float64Array(Vec::new()),
    }
}

#[async_trait]
impl ProtocolDriver for SimulatedDriver {
    async fn handle_read_commands(
        &self,
        device_name: &str,
        _protocols: &ProtocolProperties,
        requests: &[CommandRequest],
    ) -> Result<Vec<CommandValue>> {
        let registers = self.registers.read().await;
        let origin = now_ns();

        let values = requests
            .iter()
            .map(|req| {
                let key = (device_name.to_string(), req.device_resource_name.clone());
                let value = registers
                    .get(&key)
                    .cloned()
                    .unwrap_or_else(|| zero_value(req.value_type));
                debug!("[SIM] read {}/{} = {}", device_name, req.device_resource_name, value);
                CommandValue::new(req.device_resource_name.clone(), origin, value)
            })
            .collect();

        Ok(values)
    }

    async fn handle_write_commands(
        &self,
        device_name: &str,
        _protocols: &ProtocolProperties,
        requests: &[CommandRequest],
        values: &[CommandValue],
    ) -> Result<()> {
        if requests.len() != values.len() {
            return Err(anyhow!(
                "{} requests but {} values for {}",
                requests.len(),
                values.len(),
                device_name
            ));
        }

        let mut registers = self.registers.write().await;
        for (req, cv) in requests.iter().zip(values) {
            debug!("[SIM] write {}/{} = {}", device_name, req.device_resource_name, cv.value);
            registers.insert(
                (device_name.to_string(), req.device_resource_name.clone()),
                cv.value.clone(),
            );
        }

        Ok(())
    }
}
