//! Read-only device and profile metadata lookups

mod memory;

pub use memory::InMemoryCache;

use edgecmd_shared::{Device, DeviceResource, Method, ResourceOperation};
use thiserror::Error;

/// Errors returned by metadata lookups
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum CacheError {
    #[error("profile {0} not found")]
    ProfileNotFound(String),

    #[error("command {command} ({method}) not found in profile {profile}")]
    CommandNotFound {
        profile: String,
        command: String,
        method: Method,
    },

    #[error("no {method} resource operation for {resource} in profile {profile}")]
    ResourceOperationNotFound {
        profile: String,
        resource: String,
        method: Method,
    },
}

/// Metadata cache consumed by the command engine
///
/// Implementations must be safe to query concurrently; the engine never
/// mutates what they return.
pub trait DeviceCache: Send + Sync {
    fn device_by_id(&self, id: &str) -> Option<Device>;

    fn device_by_name(&self, name: &str) -> Option<Device>;

    fn all_devices(&self) -> Vec<Device>;

    /// Whether `command` names a device command of the profile with operations for `method`
    fn command_exists(&self, profile: &str, command: &str, method: Method) -> Result<bool, CacheError>;

    fn device_resource(&self, profile: &str, name: &str) -> Option<DeviceResource>;

    /// First operation of any device command that targets `resource` for `method`
    fn resource_operation(
        &self,
        profile: &str,
        resource: &str,
        method: Method,
    ) -> Result<ResourceOperation, CacheError>;

    /// Ordered operations of `command` for `method`
    fn resource_operations(
        &self,
        profile: &str,
        command: &str,
        method: Method,
    ) -> Result<Vec<ResourceOperation>, CacheError>;
}
