//! Simulated radio that reports a fixed set of nearby users

use async_trait::async_trait;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::time::Duration;
use tracing::debug;

use crate::error::{Error, Result};

use super::{AdvertisedDevice, BluetoothAdapter, RequestDeviceOptions};

/// (id, name, distance)
const NEARBY_USERS: [(&str, &str, &str); 5] = [
    ("device-001", "John's iPhone", "2m"),
    ("device-002", "Sarah's Galaxy", "5m"),
    ("device-003", "Mike's MacBook", "8m"),
    ("device-004", "Emma's iPad", "10m"),
    ("device-005", "David's Pixel", "15m"),
];

/// Each request waits `delay` and returns the next nearby user in turn
pub struct SimulatedAdapter {
    delay: Duration,
    cursor: AtomicUsize,
}

impl SimulatedAdapter {
    pub fn new(delay: Duration) -> Self {
        Self {
            delay,
            cursor: AtomicUsize::new(0),
        }
    }

    /// Number of distinct users the simulation knows
    pub fn population() -> usize {
        NEARBY_USERS.len()
    }
}

#[async_trait]
impl BluetoothAdapter for SimulatedAdapter {
    fn is_supported(&self) -> bool {
        true
    }

    async fn request_device(&self, _options: &RequestDeviceOptions) -> Result<AdvertisedDevice> {
        tokio::time::sleep(self.delay).await;

        let index = self.cursor.fetch_add(1, Ordering::Relaxed) % NEARBY_USERS.len();
        let (id, name, distance) = NEARBY_USERS[index];
        debug!("Simulated device {} ({})", id, name);

        Ok(AdvertisedDevice {
            id: id.to_string(),
            name: Some(name.to_string()),
            distance: Some(distance.to_string()),
        })
    }

    async fn connect(&self, device_id: &str) -> Result<()> {
        if NEARBY_USERS.iter().any(|(id, _, _)| *id == device_id) {
            Ok(())
        } else {
            Err(Error::DeviceNotFound(device_id.to_string()))
        }
    }

    async fn disconnect(&self, _device_id: &str) -> Result<()> {
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::discovery::NearbyScanner;
    use std::sync::Arc;

    #[tokio::test(start_paused = true)]
    async fn test_simulation_cycles_all_users() {
        let scanner = NearbyScanner::new(Arc::new(SimulatedAdapter::new(Duration::from_secs(2))));

        for _ in 0..SimulatedAdapter::population() + 2 {
            scanner.start_scan().await.unwrap();
        }

        let devices = scanner.devices().await;
        assert_eq!(devices.len(), 5);
        assert_eq!(devices[0].name, "John's iPhone");
        assert_eq!(devices[4].distance.as_deref(), Some("15m"));

        scanner.connect_to_device("device-003").await.unwrap();
        assert_eq!(scanner.selected_device().await.unwrap().name, "Mike's MacBook");
    }
}
