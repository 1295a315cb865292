//! Device and profile metadata
//!
//! These types are owned by the metadata cache and are read-only to the
//! command engine.

use serde::{Deserialize, Serialize};
use std::collections::HashMap;

use crate::defaults;

/// Protocol name -> connection properties
pub type ProtocolProperties = HashMap<String, HashMap<String, String>>;

/// Administrative state of a device
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum AdminState {
    Locked,
    #[default]
    Unlocked,
}

/// Operating state of a device
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum OperatingState {
    #[default]
    Enabled,
    Disabled,
}

/// A device known to the metadata cache
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Device {
    pub id: String,
    pub name: String,
    #[serde(default)]
    pub admin_state: AdminState,
    #[serde(default)]
    pub operating_state: OperatingState,
    pub profile_name: String,
    #[serde(default)]
    pub protocols: ProtocolProperties,
}

impl Device {
    /// Create an unlocked, enabled device
    pub fn new(id: impl Into<String>, name: impl Into<String>, profile_name: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            name: name.into(),
            profile_name: profile_name.into(),
            ..Default::default()
        }
    }

    pub fn is_locked(&self) -> bool {
        self.admin_state == AdminState::Locked
    }

    pub fn is_disabled(&self) -> bool {
        self.operating_state == OperatingState::Disabled
    }

    /// A device accepts commands only when unlocked and enabled
    pub fn is_operational(&self) -> bool {
        !self.is_locked() && !self.is_disabled()
    }
}

/// Declared value properties of a device resource
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct ValueProperty {
    /// Declared value type tag (case-insensitive, e.g. "Uint8", "float32Array")
    #[serde(rename = "type")]
    pub value_type: String,
    pub read_write: String,
    pub default_value: Option<String>,
    pub mask: Option<String>,
    pub shift: Option<String>,
    pub scale: Option<String>,
    pub offset: Option<String>,
    pub base: Option<String>,
    pub assertion: Option<String>,
    pub media_type: Option<String>,
    pub float_encoding: Option<String>,
}

impl ValueProperty {
    /// The declared default value, ignoring empty strings
    pub fn default_value(&self) -> Option<&str> {
        self.default_value.as_deref().filter(|v| !v.is_empty())
    }

    /// The declared assertion expression, ignoring empty strings
    pub fn assertion(&self) -> Option<&str> {
        self.assertion.as_deref().filter(|v| !v.is_empty())
    }
}

/// The smallest addressable unit of data/control on a device
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DeviceResource {
    pub name: String,
    #[serde(default)]
    pub description: String,
    #[serde(default)]
    pub attributes: HashMap<String, String>,
    pub properties: ValueProperty,
}

impl DeviceResource {
    pub fn new(name: impl Into<String>, value_type: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            properties: ValueProperty {
                value_type: value_type.into(),
                read_write: "RW".into(),
                ..Default::default()
            },
            ..Default::default()
        }
    }

    pub fn with_default(mut self, value: impl Into<String>) -> Self {
        self.properties.default_value = Some(value.into());
        self
    }

    pub fn with_attribute(mut self, key: impl Into<String>, value: impl Into<String>) -> Self {
        self.attributes.insert(key.into(), value.into());
        self
    }
}

/// A single step of a device command
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ResourceOperation {
    #[serde(default)]
    pub index: String,
    pub device_resource: String,
    #[serde(default)]
    pub parameter: Option<String>,
    #[serde(default)]
    pub mappings: HashMap<String, String>,
}

impl ResourceOperation {
    pub fn new(device_resource: impl Into<String>) -> Self {
        Self {
            device_resource: device_resource.into(),
            ..Default::default()
        }
    }

    pub fn with_parameter(mut self, parameter: impl Into<String>) -> Self {
        self.parameter = Some(parameter.into());
        self
    }

    pub fn with_mapping(mut self, from: impl Into<String>, to: impl Into<String>) -> Self {
        self.mappings.insert(from.into(), to.into());
        self
    }

    /// The static parameter, ignoring empty strings
    pub fn parameter(&self) -> Option<&str> {
        self.parameter.as_deref().filter(|p| !p.is_empty())
    }
}

/// A profile-level named command expanding to ordered resource operations
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DeviceCommand {
    pub name: String,
    #[serde(default)]
    pub get: Vec<ResourceOperation>,
    #[serde(default)]
    pub set: Vec<ResourceOperation>,
}

impl DeviceCommand {
    /// Operations for the given method, in declared order
    pub fn operations(&self, method: Method) -> &[ResourceOperation] {
        match method {
            Method::Get => &self.get,
            Method::Set => &self.set,
        }
    }
}

/// Named collection of device resources and commands
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Profile {
    pub name: String,
    #[serde(default)]
    pub device_resources: Vec<DeviceResource>,
    #[serde(default)]
    pub device_commands: Vec<DeviceCommand>,
}

/// Command direction
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Method {
    Get,
    Set,
}

impl Method {
    /// A case-insensitive match on "get" selects the read path; anything else writes
    pub fn from_request(method: &str) -> Self {
        if method.eq_ignore_ascii_case(defaults::GET_CMD_METHOD) {
            Method::Get
        } else {
            Method::Set
        }
    }
}

impl std::fmt::Display for Method {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Method::Get => write!(f, "GET"),
            Method::Set => write!(f, "PUT"),
        }
    }
}
