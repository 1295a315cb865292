//! Read pipeline: driver results to events

use edgecmd_shared::{CommandValue, Device, DeviceResource, Event, Method, Reading, Value};
use tracing::{debug, error, warn};

use super::{build_request, HandlerContext};
use crate::error::{CommandError, Result};

/// Read a single device resource
pub async fn read_resource(
    ctx: &HandlerContext,
    device: &Device,
    dr: &DeviceResource,
    query: &str,
) -> Result<Event> {
    debug!("[READ] device: {} deviceResource: {}", device.name, dr.name);

    let reqs = vec![build_request(device, dr, query)?];

    let results = ctx
        .driver
        .handle_read_commands(&device.name, &device.protocols, &reqs)
        .await
        .map_err(|e| {
            let msg = format!(
                "read error for Device: {} DeviceResource: {}, {}",
                device.name, dr.name, e
            );
            error!("{}", msg);
            CommandError::server_from(msg, e)
        })?;

    command_values_to_event(ctx, device, results, &dr.name)
}

/// Read every resource operation of a profile command, in declared order
pub async fn read_command(ctx: &HandlerContext, device: &Device, command: &str, query: &str) -> Result<Event> {
    let ros = ctx
        .cache
        .resource_operations(&device.profile_name, command, Method::Get)
        .map_err(|e| {
            error!("[READ] {}", e);
            CommandError::NotFound(e.to_string())
        })?;

    if ros.len() > ctx.config.max_cmd_ops {
        let msg = format!(
            "MaxCmdOps ({}) exceeded for dev: {} cmd: {} method: GET",
            ctx.config.max_cmd_ops, device.name, command
        );
        error!("[READ] {}", msg);
        return Err(CommandError::server(msg));
    }

    let mut reqs = Vec::with_capacity(ros.len());
    for ro in &ros {
        debug!("[READ] device: {} deviceResource: {}", device.name, ro.device_resource);

        let dr = ctx
            .cache
            .device_resource(&device.profile_name, &ro.device_resource)
            .ok_or_else(|| {
                let msg = format!(
                    "no deviceResource: {} for dev: {} cmd: {} method: GET",
                    ro.device_resource, device.name, command
                );
                error!("[READ] {}", msg);
                CommandError::server(msg)
            })?;

        reqs.push(build_request(device, &dr, query)?);
    }

    let results = ctx
        .driver
        .handle_read_commands(&device.name, &device.protocols, &reqs)
        .await
        .map_err(|e| {
            let msg = format!("read error for Device: {} cmd: {}, {}", device.name, command, e);
            error!("{}", msg);
            CommandError::server_from(msg, e)
        })?;

    command_values_to_event(ctx, device, results, command)
}

/// Assemble driver results into an event
///
/// A transform failure marks the batch as failed but conversion continues so
/// every failure is logged. Assertion failures become string readings.
fn command_values_to_event(
    ctx: &HandlerContext,
    device: &Device,
    values: Vec<CommandValue>,
    command: &str,
) -> Result<Event> {
    let mut readings = Vec::with_capacity(values.len());
    let mut transforms_ok = true;

    for mut cv in values {
        let dr = ctx
            .cache
            .device_resource(&device.profile_name, &cv.device_resource_name)
            .ok_or_else(|| {
                let msg = format!(
                    "no deviceResource: {} for dev: {} in Command Result {}",
                    cv.device_resource_name, device.name, cv
                );
                error!("[READ] {}", msg);
                CommandError::server(msg)
            })?;
        let props = &dr.properties;

        if ctx.config.data_transform {
            match ctx.transformer.transform_on_read(&cv, props) {
                Ok(transformed) => cv = transformed,
                Err(e) => {
                    error!("[READ] CommandValue ({}) transform failed: {}", cv, e);
                    transforms_ok = false;
                }
            }
        }

        if let Err(e) = ctx.transformer.check_assertion(&cv, props.assertion(), device) {
            let assertion = props.assertion().unwrap_or_default();
            error!("[READ] Assertion failed for device resource: {}, with value: {}", cv, e);
            let description = format!(
                "Assertion failed for device resource, with value: {} and assertion: {}",
                cv, assertion
            );
            cv = CommandValue::string(cv.device_resource_name.clone(), cv.origin, description);
        }

        match ctx
            .cache
            .resource_operation(&device.profile_name, &cv.device_resource_name, Method::Get)
        {
            Err(e) => debug!("[READ] getting resource operation failed: {}", e),
            Ok(ro) if !ro.mappings.is_empty() => match ctx.transformer.map_value(&cv, &ro.mappings) {
                Some(mapped) => cv = mapped,
                None => warn!(
                    "[READ] Resource Operation ({}) mapping value ({}) failed with the mapping table: {:?}",
                    ro.device_resource, cv, ro.mappings
                ),
            },
            Ok(_) => {}
        }

        let reading = Reading::from_command_value(
            &cv,
            &device.name,
            props.media_type.as_deref(),
            props.float_encoding.as_deref(),
        );

        if matches!(cv.value, Value::Binary(_)) {
            debug!("[READ] device: {} DeviceResource: {} reading: binary value", device.name, cv.device_resource_name);
        } else {
            debug!("[READ] device: {} DeviceResource: {} reading: {:?}", device.name, cv.device_resource_name, reading);
        }

        readings.push(reading);
    }

    if !transforms_ok {
        let msg = format!("Transform failed for dev: {} cmd: {} method: GET", device.name, command);
        error!("[READ] {}", msg);
        debug!("[READ] Readings: {:?}", readings);
        return Err(CommandError::server(msg));
    }

    Ok(Event::new(&device.name, readings))
}
