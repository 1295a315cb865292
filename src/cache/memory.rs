//! In-memory metadata cache

use edgecmd_shared::{Device, DeviceResource, Method, Profile, ResourceOperation};
use std::collections::HashMap;

use super::{CacheError, DeviceCache};

/// Metadata cache built up front from devices and profiles
#[derive(Debug, Default, Clone)]
pub struct InMemoryCache {
    /// Devices by name
    devices: HashMap<String, Device>,
    /// Device id -> device name
    ids: HashMap<String, String>,
    /// Profiles by name
    profiles: HashMap<String, Profile>,
}

impl InMemoryCache {
    pub fn new() -> Self {
        Self::default()
    }

    /// Add or replace a device, keyed by name
    pub fn add_device(&mut self, device: Device) {
        if let Some(previous) = self.devices.get(&device.name) {
            self.ids.remove(&previous.id);
        }
        self.ids.insert(device.id.clone(), device.name.clone());
        self.devices.insert(device.name.clone(), device);
    }

    /// Add or replace a profile, keyed by name
    pub fn add_profile(&mut self, profile: Profile) {
        self.profiles.insert(profile.name.clone(), profile);
    }

    pub fn with_device(mut self, device: Device) -> Self {
        self.add_device(device);
        self
    }

    pub fn with_profile(mut self, profile: Profile) -> Self {
        self.add_profile(profile);
        self
    }

    fn profile(&self, name: &str) -> Result<&Profile, CacheError> {
        self.profiles
            .get(name)
            .ok_or_else(|| CacheError::ProfileNotFound(name.to_string()))
    }
}

impl DeviceCache for InMemoryCache {
    fn device_by_id(&self, id: &str) -> Option<Device> {
        self.ids
            .get(id)
            .and_then(|name| self.devices.get(name))
            .cloned()
    }

    fn device_by_name(&self, name: &str) -> Option<Device> {
        self.devices.get(name).cloned()
    }

    fn all_devices(&self) -> Vec<Device> {
        let mut devices: Vec<Device> = self.devices.values().cloned().collect();
        devices.sort_by(|a, b| a.name.cmp(&b.name));
        devices
    }

    fn command_exists(&self, profile: &str, command: &str, method: Method) -> Result<bool, CacheError> {
        let profile = self.profile(profile)?;
        Ok(profile
            .device_commands
            .iter()
            .any(|dc| dc.name == command && !dc.operations(method).is_empty()))
    }

    fn device_resource(&self, profile: &str, name: &str) -> Option<DeviceResource> {
        self.profiles
            .get(profile)?
            .device_resources
            .iter()
            .find(|dr| dr.name == name)
            .cloned()
    }

    fn resource_operation(
        &self,
        profile: &str,
        resource: &str,
        method: Method,
    ) -> Result<ResourceOperation, CacheError> {
        self.profile(profile)?
            .device_commands
            .iter()
            .flat_map(|dc| dc.operations(method))
            .find(|ro| ro.device_resource == resource)
            .cloned()
            .ok_or_else(|| CacheError::ResourceOperationNotFound {
                profile: profile.to_string(),
                resource: resource.to_string(),
                method,
            })
    }

    fn resource_operations(
        &self,
        profile: &str,
        command: &str,
        method: Method,
    ) -> Result<Vec<ResourceOperation>, CacheError> {
        self.profile(profile)?
            .device_commands
            .iter()
            .find(|dc| dc.name == command && !dc.operations(method).is_empty())
            .map(|dc| dc.operations(method).to_vec())
            .ok_or_else(|| CacheError::CommandNotFound {
                profile: profile.to_string(),
                command: command.to_string(),
                method,
            })
    }
}
