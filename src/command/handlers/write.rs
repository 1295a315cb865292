//! Write pipeline: request body to driver write batch

use edgecmd_shared::{decode, CommandValue, Device, DeviceResource, Method, ResourceOperation};
use std::collections::HashMap;
use tracing::{debug, error, warn};

use super::{build_request, HandlerContext};
use crate::error::{CommandError, Result};

/// Parse a write body into resource name -> raw value
fn parse_params(body: &str) -> Result<HashMap<String, String>> {
    let params: HashMap<String, String> = serde_json::from_str(body).map_err(|e| {
        let msg = format!("parsing Write parameters failed {}", body);
        error!("[WRITE] {}, {}", msg, e);
        CommandError::bad_request_from(msg, e)
    })?;

    if params.is_empty() {
        error!("[WRITE] no parameters specified");
        return Err(CommandError::bad_request("no parameters specified"));
    }

    Ok(params)
}

fn decode_for(dr: &DeviceResource, raw: &str) -> Result<CommandValue> {
    decode(&dr.name, &dr.properties.value_type, raw).map_err(|e| {
        let msg = format!("Put parameter {} for DeviceResource {} is invalid", raw, dr.name);
        error!("[WRITE] {}: {}", msg, e);
        CommandError::bad_request_from(msg, e)
    })
}

fn transform(ctx: &HandlerContext, cv: CommandValue, dr: &DeviceResource) -> Result<CommandValue> {
    if !ctx.config.data_transform {
        return Ok(cv);
    }
    ctx.transformer
        .transform_on_write(&cv, &dr.properties)
        .map_err(|e| {
            let msg = format!("CommandValue ({}) transform failed: {}", cv, e);
            error!("[WRITE] {}", msg);
            CommandError::server_from(msg, e)
        })
}

/// Write a single device resource
///
/// Uses the body value named after the resource, or the resource default.
pub async fn write_resource(ctx: &HandlerContext, device: &Device, dr: &DeviceResource, body: &str) -> Result<()> {
    let params = parse_params(body)?;

    let raw = match params.get(&dr.name) {
        Some(v) => v.as_str(),
        None => dr.properties.default_value().ok_or_else(|| {
            let msg = format!("there is no {} in parameters and no default value in DeviceResource", dr.name);
            error!("[WRITE] {}", msg);
            CommandError::bad_request(msg)
        })?,
    };

    let cv = decode_for(dr, raw)?;
    debug!("[WRITE] device: {} deviceResource: {}", device.name, dr.name);

    let req = build_request(device, dr, "")?;
    let cv = transform(ctx, cv, dr)?;

    ctx.driver
        .handle_write_commands(&device.name, &device.protocols, &[req], &[cv])
        .await
        .map_err(|e| {
            let msg = format!(
                "write error for Device: {} DeviceResource: {}, {}",
                device.name, dr.name, e
            );
            error!("{}", msg);
            CommandError::server_from(msg, e)
        })
}

/// Write every resource operation of a profile command in one driver call
///
/// Nothing reaches the driver unless every operation resolves a value,
/// decodes and transforms.
pub async fn write_command(ctx: &HandlerContext, device: &Device, command: &str, body: &str) -> Result<()> {
    let ros = ctx
        .cache
        .resource_operations(&device.profile_name, command, Method::Set)
        .map_err(|e| {
            let msg = format!(
                "can't find ResourceOperations in Profile({}) and Command({})",
                device.profile_name, command
            );
            error!("[WRITE] {}, {}", msg, e);
            CommandError::bad_request_from(msg, e)
        })?;

    if ros.len() > ctx.config.max_cmd_ops {
        let msg = format!(
            "MaxCmdOps ({}) exceeded for dev: {} cmd: {} method: PUT",
            ctx.config.max_cmd_ops, device.name, command
        );
        error!("[WRITE] {}", msg);
        return Err(CommandError::server(msg));
    }

    let params = parse_params(body)?;

    let mut batch = Vec::with_capacity(ros.len());
    for ro in &ros {
        let dr = ctx
            .cache
            .device_resource(&device.profile_name, &ro.device_resource)
            .ok_or_else(|| {
                let msg = format!(
                    "the parameter {} does not match any DeviceResource in DeviceProfile",
                    ro.device_resource
                );
                error!("[WRITE] {}", msg);
                CommandError::bad_request(msg)
            })?;

        let raw = operation_value(ro, &dr, &params)?;
        let cv = decode_for(&dr, &raw)?;
        batch.push((dr, cv));
    }

    let mut reqs = Vec::with_capacity(batch.len());
    let mut values = Vec::with_capacity(batch.len());
    for (dr, cv) in batch {
        debug!("[WRITE] device: {} deviceResource: {}", device.name, dr.name);
        reqs.push(build_request(device, &dr, "")?);
        values.push(transform(ctx, cv, &dr)?);
    }

    ctx.driver
        .handle_write_commands(&device.name, &device.protocols, &reqs, &values)
        .await
        .map_err(|e| {
            let msg = format!("write error for Device: {} cmd: {}, {}", device.name, command, e);
            error!("{}", msg);
            CommandError::server_from(msg, e)
        })
}

/// Pick the raw value for one operation and apply its mapping table
///
/// Lookup order: body value, operation parameter, resource default.
fn operation_value(ro: &ResourceOperation, dr: &DeviceResource, params: &HashMap<String, String>) -> Result<String> {
    let raw = params
        .get(&ro.device_resource)
        .map(String::as_str)
        .or_else(|| {
            debug!("[WRITE] no {} in the request parameters, trying operation parameter", ro.device_resource);
            ro.parameter()
        })
        .or_else(|| dr.properties.default_value())
        .ok_or_else(|| {
            let msg = format!(
                "the parameter {} is not defined in the request body and there is no default value",
                ro.device_resource
            );
            error!("[WRITE] {}", msg);
            CommandError::bad_request(msg)
        })?;

    if ro.mappings.is_empty() {
        return Ok(raw.to_string());
    }

    match ro.mappings.get(raw) {
        Some(mapped) => Ok(mapped.clone()),
        None => {
            warn!(
                "[WRITE] Resource ({}) mapping value ({}) failed with the mapping table: {:?}",
                ro.device_resource, raw, ro.mappings
            );
            Ok(raw.to_string())
        }
    }
}
