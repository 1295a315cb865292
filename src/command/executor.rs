//! Command executor - resolves, validates and dispatches device commands

use super::handlers::{self, HandlerContext};
use crate::cache::DeviceCache;
use crate::config::DeviceConfig;
use crate::driver::ProtocolDriver;
use crate::error::{CommandError, Result};
use crate::metadata::MetadataClient;
use crate::transform::Transformer;
use edgecmd_shared::{now_ms, Device, DeviceResource, Event, Method};
use futures::future::join_all;
use std::fmt;
use std::sync::Arc;
use tokio::sync::mpsc;
use tracing::{debug, error, info, warn};

/// How a command request names its target device
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum DeviceKey {
    Id(String),
    Name(String),
}

impl fmt::Display for DeviceKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            DeviceKey::Id(id) => write!(f, "{}", id),
            DeviceKey::Name(name) => write!(f, "{}", name),
        }
    }
}

/// What a resolved command runs against
#[derive(Debug, Clone, PartialEq)]
pub enum ExecutionPlan {
    /// A profile command expanding to resource operations
    Command(String),
    /// A single device resource addressed directly
    Resource(DeviceResource),
}

/// Executes device commands against injected collaborators
#[derive(Clone)]
pub struct CommandExecutor {
    ctx: HandlerContext,
    metadata: Arc<dyn MetadataClient>,
}

impl CommandExecutor {
    /// Create a new command executor
    pub fn new(
        cache: Arc<dyn DeviceCache>,
        driver: Arc<dyn ProtocolDriver>,
        transformer: Arc<dyn Transformer>,
        metadata: Arc<dyn MetadataClient>,
        config: DeviceConfig,
    ) -> Self {
        Self {
            ctx: HandlerContext {
                cache,
                driver,
                transformer,
                config,
            },
            metadata,
        }
    }

    /// Find the device and decide between the composite and single-resource path
    ///
    /// Locked or disabled devices are rejected before the command is looked at.
    pub fn resolve(&self, key: &DeviceKey, command: &str, method: Method) -> Result<(Device, ExecutionPlan)> {
        let device = match key {
            DeviceKey::Id(id) => self.ctx.cache.device_by_id(id),
            DeviceKey::Name(name) => self.ctx.cache.device_by_name(name),
        }
        .ok_or_else(|| {
            let msg = format!("Device: {} not found; {}", key, method);
            error!("{}", msg);
            CommandError::not_found(msg)
        })?;

        if device.is_locked() {
            let msg = format!("{} is locked; {}", device.name, method);
            error!("{}", msg);
            return Err(CommandError::locked(msg));
        }

        if device.is_disabled() {
            let msg = format!("{} is disabled; {}", device.name, method);
            error!("{}", msg);
            return Err(CommandError::locked(msg));
        }

        let exists = self
            .ctx
            .cache
            .command_exists(&device.profile_name, command, method)
            .map_err(|e| {
                let msg = format!(
                    "internal error; Device: {} searching {} in cache failed; {}",
                    device.name, command, method
                );
                error!("{}", msg);
                CommandError::server_from(msg, e)
            })?;

        if exists {
            return Ok((device, ExecutionPlan::Command(command.to_string())));
        }

        match self.ctx.cache.device_resource(&device.profile_name, command) {
            Some(dr) => Ok((device, ExecutionPlan::Resource(dr))),
            None => {
                let msg = format!("{} for Device: {} not found; {}", command, device.name, method);
                error!("{}", msg);
                Err(CommandError::not_found(msg))
            }
        }
    }

    /// Execute a command on one device
    ///
    /// `method` is the request method; "get" (any case) reads, anything else
    /// writes. Reads return the assembled event, writes return `None`.
    pub async fn execute(
        &self,
        key: &DeviceKey,
        command: &str,
        method: &str,
        body: &str,
        query: &str,
    ) -> Result<Option<Event>> {
        let method = Method::from_request(method);
        let (device, plan) = self.resolve(key, command, method)?;

        let result = match (method, &plan) {
            (Method::Get, ExecutionPlan::Resource(dr)) => handlers::read_resource(&self.ctx, &device, dr, query)
                .await
                .map(Some),
            (Method::Get, ExecutionPlan::Command(cmd)) => handlers::read_command(&self.ctx, &device, cmd, query)
                .await
                .map(Some),
            (Method::Set, ExecutionPlan::Resource(dr)) => handlers::write_resource(&self.ctx, &device, dr, body)
                .await
                .map(|_| None),
            (Method::Set, ExecutionPlan::Command(cmd)) => handlers::write_command(&self.ctx, &device, cmd, body)
                .await
                .map(|_| None),
        };

        self.touch_last_connected(device.name);
        result
    }

    /// Execute a profile command on every operational device concurrently
    ///
    /// Succeeds when at least one device succeeded; failures are logged. When
    /// every device fails, the error of the last result drained is returned.
    pub async fn execute_all(&self, command: &str, method: &str, body: &str, query: &str) -> Result<Vec<Event>> {
        let method = Method::from_request(method);
        debug!("[FANOUT] execute the {} command {} on all operational devices", method, command);

        let devices: Vec<Device> = self
            .ctx
            .cache
            .all_devices()
            .into_iter()
            .filter(Device::is_operational)
            .collect();

        let count = devices.len();
        if count == 0 {
            info!("[FANOUT] no operational devices for command {}", command);
            return Ok(Vec::new());
        }

        let (tx, mut rx) = mpsc::channel::<Result<Option<Event>>>(count);

        let handles: Vec<_> = devices
            .into_iter()
            .map(|device| {
                let ctx = self.ctx.clone();
                let tx = tx.clone();
                let command = command.to_string();
                let body = body.to_string();
                let query = query.to_string();
                tokio::spawn(async move {
                    let result = match method {
                        Method::Get => handlers::read_command(&ctx, &device, &command, &query).await.map(Some),
                        Method::Set => handlers::write_command(&ctx, &device, &command, &body)
                            .await
                            .map(|_| None),
                    };
                    // Capacity equals the task count, so this never waits
                    let _ = tx.send(result).await;
                })
            })
            .collect();

        let mut failures = Vec::new();
        for joined in join_all(handles).await {
            if let Err(e) = joined {
                failures.push(CommandError::server_from("fan-out task failed", e));
            }
        }
        drop(tx);

        let mut results = Vec::with_capacity(count);
        while let Some(result) = rx.recv().await {
            results.push(result);
        }
        results.extend(failures.into_iter().map(Err));

        let mut events = Vec::with_capacity(count);
        let mut last_error = None;
        let mut error_count = 0;
        for result in results {
            match result {
                Ok(Some(event)) => events.push(event),
                Ok(None) => {}
                Err(e) => {
                    error!("[FANOUT] {}", e);
                    error_count += 1;
                    last_error = Some(e);
                }
            }
        }

        match last_error {
            Some(e) if error_count == count => Err(e),
            _ => {
                if error_count > 0 {
                    info!(
                        "[FANOUT] {} of {} devices executed {} successfully",
                        count - error_count,
                        count,
                        command
                    );
                }
                Ok(events)
            }
        }
    }

    /// Record the device as reached without waiting for the metadata service
    fn touch_last_connected(&self, device_name: String) {
        let metadata = self.metadata.clone();
        let at = now_ms();
        tokio::spawn(async move {
            if let Err(e) = metadata.update_last_connected(&device_name, at).await {
                warn!("[METADATA] failed to update last connected for {}: {}", device_name, e);
            }
        });
    }
}
