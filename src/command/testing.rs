//! Test doubles and fixtures for engine tests

use anyhow::{anyhow, Result};
use async_trait::async_trait;
use edgecmd_shared::{
    now_ns, AdminState, CommandValue, Device, DeviceCommand, DeviceResource, OperatingState, Profile,
    ResourceOperation, Value, ValueProperty,
};
use edgecmd_shared::model::ProtocolProperties;
use std::collections::{HashMap, HashSet};
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};

use crate::cache::InMemoryCache;
use crate::config::DeviceConfig;
use crate::driver::{CommandRequest, ProtocolDriver};
use crate::metadata::InMemoryMetadata;
use crate::transform::{DefaultTransformer, TransformError, Transformer};

use super::CommandExecutor;

/// Driver that answers reads from preset values and records every call
#[derive(Default)]
pub struct RecordingDriver {
    reads: AtomicUsize,
    writes: AtomicUsize,
    read_requests: Mutex<Vec<(String, CommandRequest)>>,
    written: Mutex<Vec<(String, Vec<CommandValue>)>>,
    values: Mutex<HashMap<String, Value>>,
    stray: Mutex<Option<(String, Value)>>,
    failing: Mutex<HashSet<String>>,
    panicking: Mutex<HashSet<String>>,
}

impl RecordingDriver {
    pub fn with_value(self, resource: &str, value: Value) -> Self {
        self.values.lock().unwrap().insert(resource.to_string(), value);
        self
    }

    /// Append a value for a resource nobody asked for to every read result
    pub fn with_stray_value(self, resource: &str, value: Value) -> Self {
        *self.stray.lock().unwrap() = Some((resource.to_string(), value));
        self
    }

    pub fn panic_device(&self, device: &str) {
        self.panicking.lock().unwrap().insert(device.to_string());
    }

    pub fn fail_device(&self, device: &str) {
        self.failing.lock().unwrap().insert(device.to_string());
    }

    pub fn reads(&self) -> usize {
        self.reads.load(Ordering::SeqCst)
    }

    pub fn writes(&self) -> usize {
        self.writes.load(Ordering::SeqCst)
    }

    pub fn read_requests(&self) -> Vec<(String, CommandRequest)> {
        self.read_requests.lock().unwrap().clone()
    }

    pub fn written(&self) -> Vec<(String, Vec<CommandValue>)> {
        self.written.lock().unwrap().clone()
    }

    fn check_device(&self, device_name: &str) -> Result<()> {
        if self.failing.lock().unwrap().contains(device_name) {
            return Err(anyhow!("device {} unreachable", device_name));
        }
        Ok(())
    }
}

#[async_trait]
impl ProtocolDriver for RecordingDriver {
    async fn handle_read_commands(
        &self,
        device_name: &str,
        _protocols: &ProtocolProperties,
        requests: &[CommandRequest],
    ) -> Result<Vec<CommandValue>> {
        self.reads.fetch_add(1, Ordering::SeqCst);
        self.read_requests
            .lock()
            .unwrap()
            .extend(requests.iter().map(|r| (device_name.to_string(), r.clone())));
        let panics = self.panicking.lock().unwrap().contains(device_name);
        if panics {
            panic!("driver crashed reading {}", device_name);
        }
        self.check_device(device_name)?;

        let values = self.values.lock().unwrap();
        let mut results = requests
            .iter()
            .map(|req| {
                let value = values
                    .get(&req.device_resource_name)
                    .cloned()
                    .ok_or_else(|| anyhow!("no value for {}", req.device_resource_name))?;
                Ok(CommandValue::new(req.device_resource_name.clone(), now_ns(), value))
            })
            .collect::<Result<Vec<_>>>()?;

        if let Some((resource, value)) = self.stray.lock().unwrap().clone() {
            results.push(CommandValue::new(resource, now_ns(), value));
        }
        Ok(results)
    }

    async fn handle_write_commands(
        &self,
        device_name: &str,
        _protocols: &ProtocolProperties,
        _requests: &[CommandRequest],
        values: &[CommandValue],
    ) -> Result<()> {
        self.writes.fetch_add(1, Ordering::SeqCst);
        self.check_device(device_name)?;
        self.written
            .lock()
            .unwrap()
            .push((device_name.to_string(), values.to_vec()));
        Ok(())
    }
}

/// Default transformer that counts read-side transform calls
#[derive(Default)]
pub struct CountingTransformer {
    inner: DefaultTransformer,
    reads: AtomicUsize,
}

impl CountingTransformer {
    pub fn reads(&self) -> usize {
        self.reads.load(Ordering::SeqCst)
    }
}

impl Transformer for CountingTransformer {
    fn transform_on_read(&self, value: &CommandValue, props: &ValueProperty) -> Result<CommandValue, TransformError> {
        self.reads.fetch_add(1, Ordering::SeqCst);
        self.inner.transform_on_read(value, props)
    }

    fn transform_on_write(&self, value: &CommandValue, props: &ValueProperty) -> Result<CommandValue, TransformError> {
        self.inner.transform_on_write(value, props)
    }

    fn check_assertion(&self, value: &CommandValue, assertion: Option<&str>, device: &Device) -> Result<(), TransformError> {
        self.inner.check_assertion(value, assertion, device)
    }

    fn map_value(&self, value: &CommandValue, mappings: &HashMap<String, String>) -> Option<CommandValue> {
        self.inner.map_value(value, mappings)
    }
}

/// Thermostat profile used across engine tests
pub fn thermostat_profile() -> Profile {
    let mut level = DeviceResource::new("level", "Uint8");
    level.properties.scale = Some("100".into());

    let mut status = DeviceResource::new("status", "String");
    status.properties.assertion = Some("ok".into());

    Profile {
        name: "thermostat".into(),
        device_resources: vec![
            DeviceResource::new("temperature", "Float64"),
            DeviceResource::new("setpoint", "Float64").with_default("20"),
            DeviceResource::new("mode", "Uint8"),
            DeviceResource::new("label", "String"),
            level,
            status,
        ],
        device_commands: vec![
            DeviceCommand {
                name: "climate".into(),
                get: vec![
                    ResourceOperation::new("temperature"),
                    ResourceOperation::new("mode").with_mapping("1", "heat"),
                ],
                set: vec![
                    ResourceOperation::new("setpoint"),
                    ResourceOperation::new("mode").with_mapping("heat", "1"),
                ],
            },
            DeviceCommand {
                name: "configure".into(),
                get: vec![],
                set: vec![ResourceOperation::new("label")],
            },
            DeviceCommand {
                name: "preset".into(),
                get: vec![],
                set: vec![ResourceOperation::new("mode").with_parameter("2")],
            },
            DeviceCommand {
                name: "gauge".into(),
                get: vec![ResourceOperation::new("level")],
                set: vec![],
            },
            DeviceCommand {
                name: "readout".into(),
                get: vec![ResourceOperation::new("level"), ResourceOperation::new("temperature")],
                set: vec![],
            },
            DeviceCommand {
                name: "diagnostics".into(),
                get: vec![ResourceOperation::new("status")],
                set: vec![],
            },
        ],
    }
}

/// Three operational thermostats plus one locked and one disabled
pub fn thermostat_cache() -> InMemoryCache {
    let mut locked = Device::new("id-locked", "locked", "thermostat");
    locked.admin_state = AdminState::Locked;
    let mut disabled = Device::new("id-disabled", "disabled", "thermostat");
    disabled.operating_state = OperatingState::Disabled;

    InMemoryCache::new()
        .with_profile(thermostat_profile())
        .with_device(Device::new("id-1", "t1", "thermostat"))
        .with_device(Device::new("id-2", "t2", "thermostat"))
        .with_device(Device::new("id-3", "t3", "thermostat"))
        .with_device(locked)
        .with_device(disabled)
}

/// Driver preloaded with a value for every readable thermostat resource
pub fn thermostat_driver() -> RecordingDriver {
    RecordingDriver::default()
        .with_value("temperature", Value::Float64(21.5))
        .with_value("mode", Value::Uint8(1))
        .with_value("level", Value::Uint8(10))
        .with_value("status", Value::String("ok".into()))
}

pub struct Harness {
    pub executor: CommandExecutor,
    pub driver: Arc<RecordingDriver>,
    pub metadata: Arc<InMemoryMetadata>,
    pub transformer: Arc<CountingTransformer>,
}

pub fn harness(cache: InMemoryCache, driver: RecordingDriver, config: DeviceConfig) -> Harness {
    let driver = Arc::new(driver);
    let metadata = Arc::new(InMemoryMetadata::new());
    let transformer = Arc::new(CountingTransformer::default());
    let executor = CommandExecutor::new(
        Arc::new(cache),
        driver.clone(),
        transformer.clone(),
        metadata.clone(),
        config,
    );
    Harness {
        executor,
        driver,
        metadata,
        transformer,
    }
}
