use edgecmd::cache::InMemoryCache;
use edgecmd::driver::SimulatedDriver;
use edgecmd::metadata::InMemoryMetadata;
use edgecmd::transform::DefaultTransformer;
use edgecmd::{CommandExecutor, DeviceKey, EngineConfig};
use edgecmd_shared::{AdminState, Device, DeviceCommand, DeviceResource, Event, Profile, ResourceOperation};
use std::sync::Arc;

use tracing::{error, info};
use tracing_subscriber::{fmt, prelude::*, EnvFilter};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Initialize tracing
    tracing_subscriber::registry()
        .with(fmt::layer())
        .with(EnvFilter::from_default_env().add_directive(tracing::Level::INFO.into()))
        .init();

    let config = match std::env::args().nth(1) {
        Some(path) => {
            info!("Loading config from {}", path);
            EngineConfig::load(path)?
        }
        None => EngineConfig::default(),
    };
    info!(
        "Command engine starting: MaxCmdOps={} DataTransform={}",
        config.device.max_cmd_ops, config.device.data_transform
    );

    let driver = SimulatedDriver::new();
    let metadata = Arc::new(InMemoryMetadata::new());
    let executor = CommandExecutor::new(
        Arc::new(sample_cache()),
        Arc::new(driver.clone()),
        Arc::new(DefaultTransformer::new()),
        metadata.clone(),
        config.device,
    );

    let thermo = DeviceKey::Name("thermo-1".into());

    executor
        .execute(&thermo, "climate", "PUT", r#"{"setpoint":"22.5","mode":"heat"}"#, "")
        .await?;
    info!("Wrote climate to thermo-1");

    if let Some(event) = executor.execute(&thermo, "climate", "GET", "", "").await? {
        log_event(&event)?;
    }

    if let Some(event) = executor
        .execute(&DeviceKey::Id("dev-002".into()), "setpoint", "get", "", "unit=C")
        .await?
    {
        log_event(&event)?;
    }

    match executor
        .execute(&DeviceKey::Name("thermo-3".into()), "climate", "get", "", "")
        .await
    {
        Ok(_) => error!("thermo-3 is locked but accepted a command"),
        Err(e) => info!("thermo-3 rejected ({}): {}", e.status_code(), e),
    }

    let events = executor.execute_all("climate", "get", "", "").await?;
    info!("Fan-out read returned {} events", events.len());
    for event in &events {
        log_event(event)?;
    }

    if let Some(at) = metadata.last_connected("thermo-1").await {
        info!("thermo-1 last connected at {}", at);
    }

    Ok(())
}

fn log_event(event: &Event) -> anyhow::Result<()> {
    info!("Event: {}", serde_json::to_string(event)?);
    Ok(())
}

fn sample_cache() -> InMemoryCache {
    let mut setpoint = DeviceResource::new("setpoint", "Float32").with_default("20");
    setpoint.properties.scale = Some("0.5".into());

    let profile = Profile {
        name: "thermostat".into(),
        device_resources: vec![
            setpoint,
            DeviceResource::new("mode", "Uint8").with_default("0"),
        ],
        device_commands: vec![DeviceCommand {
            name: "climate".into(),
            get: vec![
                ResourceOperation::new("setpoint"),
                ResourceOperation::new("mode").with_mapping("0", "off").with_mapping("1", "heat"),
            ],
            set: vec![
                ResourceOperation::new("setpoint"),
                ResourceOperation::new("mode").with_mapping("off", "0").with_mapping("heat", "1"),
            ],
        }],
    };

    let mut locked = Device::new("dev-003", "thermo-3", "thermostat");
    locked.admin_state = AdminState::Locked;

    InMemoryCache::new()
        .with_profile(profile)
        .with_device(Device::new("dev-001", "thermo-1", "thermostat"))
        .with_device(Device::new("dev-002", "thermo-2", "thermostat"))
        .with_device(locked)
}
