//! Read and write pipelines for single resources and composite commands

mod read;
mod write;

pub use read::{read_command, read_resource};
pub use write::{write_command, write_resource};

use edgecmd_shared::{defaults, Device, DeviceResource, ValueType};
use std::collections::HashMap;
use std::sync::Arc;
use tracing::error;
use url::form_urlencoded;

use crate::cache::DeviceCache;
use crate::config::DeviceConfig;
use crate::driver::{CommandRequest, ProtocolDriver};
use crate::error::{CommandError, Result};
use crate::transform::Transformer;

/// Collaborators shared by every pipeline invocation
#[derive(Clone)]
pub struct HandlerContext {
    pub cache: Arc<dyn DeviceCache>,
    pub driver: Arc<dyn ProtocolDriver>,
    pub transformer: Arc<dyn Transformer>,
    pub config: DeviceConfig,
}

/// Drop reserved and attribute-shadowing keys, then re-encode in sorted key order
pub fn filter_query_params(query: &str, attributes: &HashMap<String, String>) -> String {
    let mut pairs: Vec<(String, String)> = form_urlencoded::parse(query.trim_start_matches('?').as_bytes())
        .filter(|(k, _)| !k.starts_with(defaults::SDK_RESERVED_PREFIX) && !attributes.contains_key(&**k))
        .map(|(k, v)| (k.into_owned(), v.into_owned()))
        .collect();
    pairs.sort_by(|a, b| a.0.cmp(&b.0));

    form_urlencoded::Serializer::new(String::new())
        .extend_pairs(pairs)
        .finish()
}

/// Build the driver request for a device resource
///
/// Query parameters, when present, travel under the reserved `urlRawQuery`
/// attribute, replacing any previous entry at that key.
pub(crate) fn build_request(device: &Device, dr: &DeviceResource, query: &str) -> Result<CommandRequest> {
    let value_type = dr.properties.value_type.parse::<ValueType>().map_err(|e| {
        let msg = format!(
            "DeviceResource {} of dev: {} declares an unsupported value type {}",
            dr.name, device.name, dr.properties.value_type
        );
        error!("{}", msg);
        CommandError::server_from(msg, e)
    })?;

    let mut attributes = dr.attributes.clone();
    if !query.is_empty() {
        attributes.insert(
            defaults::URL_RAW_QUERY.to_string(),
            filter_query_params(query, &dr.attributes),
        );
    }

    Ok(CommandRequest {
        device_resource_name: dr.name.clone(),
        attributes,
        value_type,
    })
}
