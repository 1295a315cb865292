//! Metadata service client
//!
//! The engine reports "last connected" timestamps here after every command.
//! Updates are fire-and-forget and never affect a command's outcome.

use anyhow::Result;
use async_trait::async_trait;
use std::collections::HashMap;
use std::sync::Arc;
use tokio::sync::RwLock;
use tracing::debug;

/// Remote metadata operations the engine triggers as side effects
#[async_trait]
pub trait MetadataClient: Send + Sync {
    /// Record that `device_name` was last reached at `at_ms` (milliseconds since epoch)
    async fn update_last_connected(&self, device_name: &str, at_ms: i64) -> Result<()>;
}

/// Metadata client that keeps last-connected timestamps in memory
#[derive(Debug, Default, Clone)]
pub struct InMemoryMetadata {
    last_connected: Arc<RwLock<HashMap<String, i64>>>,
}

impl InMemoryMetadata {
    pub fn new() -> Self {
        Self::default()
    }

    /// Last recorded timestamp for a device
    pub async fn last_connected(&self, device_name: &str) -> Option<i64> {
        self.last_connected.read().await.get(device_name).copied()
    }
}

#[async_trait]
impl MetadataClient for InMemoryMetadata {
    async fn update_last_connected(&self, device_name: &str, at_ms: i64) -> Result<()> {
        let mut map = self.last_connected.write().await;
        let entry = map.entry(device_name.to_string()).or_insert(at_ms);
        // Updates may arrive out of order; keep the newest
        if at_ms > *entry {
            *entry = at_ms;
        }
        debug!("[METADATA] {} last connected at {}", device_name, *entry);
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_records_newest_timestamp() {
        let metadata = InMemoryMetadata::new();
        assert_eq!(metadata.last_connected("pump").await, None);

        metadata.update_last_connected("pump", 200).await.expect("update");
        metadata.update_last_connected("pump", 100).await.expect("update");
        assert_eq!(metadata.last_connected("pump").await, Some(200));

        metadata.update_last_connected("pump", 300).await.expect("update");
        assert_eq!(metadata.last_connected("pump").await, Some(300));
    }
}
