//! Nearby-user discovery over Bluetooth
//!
//! The radio is an external capability (`BluetoothAdapter`). `NearbyScanner`
//! keeps the de-duplicated device list, scan flag, last error and the
//! selected device. `SimulatedAdapter` stands in when no radio is present.

pub mod simulated;

use async_trait::async_trait;
use serde::Serialize;
use std::sync::Arc;
use tokio::sync::RwLock;
use tracing::{debug, info, warn};

use crate::error::{Error, Result};

pub use simulated::SimulatedAdapter;

/// Name shown for devices that do not advertise one
pub const UNKNOWN_DEVICE_NAME: &str = "Unknown Device";

/// Options passed to the device chooser
#[derive(Debug, Clone, PartialEq)]
pub struct RequestDeviceOptions {
    pub accept_all_devices: bool,
    pub optional_services: Vec<String>,
}

impl Default for RequestDeviceOptions {
    fn default() -> Self {
        Self {
            accept_all_devices: true,
            optional_services: Vec::new(),
        }
    }
}

/// Device as reported by the adapter
#[derive(Debug, Clone, PartialEq)]
pub struct AdvertisedDevice {
    pub id: String,
    pub name: Option<String>,
    /// Rough distance label, when the adapter can estimate one
    pub distance: Option<String>,
}

/// Bluetooth radio capability
#[async_trait]
pub trait BluetoothAdapter: Send + Sync {
    fn is_supported(&self) -> bool;

    /// Let the user pick one nearby device
    async fn request_device(&self, options: &RequestDeviceOptions) -> Result<AdvertisedDevice>;

    async fn connect(&self, device_id: &str) -> Result<()>;

    async fn disconnect(&self, device_id: &str) -> Result<()>;
}

/// Adapter for hosts without a radio
#[derive(Debug, Default)]
pub struct UnsupportedAdapter;

#[async_trait]
impl BluetoothAdapter for UnsupportedAdapter {
    fn is_supported(&self) -> bool {
        false
    }

    async fn request_device(&self, _options: &RequestDeviceOptions) -> Result<AdvertisedDevice> {
        Err(Error::BluetoothUnsupported)
    }

    async fn connect(&self, _device_id: &str) -> Result<()> {
        Err(Error::BluetoothUnsupported)
    }

    async fn disconnect(&self, _device_id: &str) -> Result<()> {
        Ok(())
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct DiscoveredDevice {
    pub id: String,
    pub name: String,
    pub distance: Option<String>,
}

impl From<AdvertisedDevice> for DiscoveredDevice {
    fn from(device: AdvertisedDevice) -> Self {
        Self {
            id: device.id,
            name: device
                .name
                .filter(|n| !n.trim().is_empty())
                .unwrap_or_else(|| UNKNOWN_DEVICE_NAME.to_string()),
            distance: device.distance,
        }
    }
}

#[derive(Debug, Default)]
struct ScannerState {
    devices: Vec<DiscoveredDevice>,
    is_scanning: bool,
    error: Option<String>,
    selected: Option<DiscoveredDevice>,
}

/// Device list and selection on top of a `BluetoothAdapter`
pub struct NearbyScanner {
    adapter: Arc<dyn BluetoothAdapter>,
    options: RequestDeviceOptions,
    state: RwLock<ScannerState>,
}

impl NearbyScanner {
    pub fn new(adapter: Arc<dyn BluetoothAdapter>) -> Self {
        let mut state = ScannerState::default();
        if !adapter.is_supported() {
            state.error = Some(Error::BluetoothUnsupported.to_string());
        }

        Self {
            adapter,
            options: RequestDeviceOptions::default(),
            state: RwLock::new(state),
        }
    }

    pub fn is_supported(&self) -> bool {
        self.adapter.is_supported()
    }

    pub async fn devices(&self) -> Vec<DiscoveredDevice> {
        self.state.read().await.devices.clone()
    }

    pub async fn is_scanning(&self) -> bool {
        self.state.read().await.is_scanning
    }

    pub async fn error(&self) -> Option<String> {
        self.state.read().await.error.clone()
    }

    pub async fn selected_device(&self) -> Option<DiscoveredDevice> {
        self.state.read().await.selected.clone()
    }

    /// Request one device and add it to the list unless already present
    pub async fn start_scan(&self) -> Result<DiscoveredDevice> {
        if !self.adapter.is_supported() {
            self.state.write().await.error = Some(Error::BluetoothUnsupported.to_string());
            return Err(Error::BluetoothUnsupported);
        }

        {
            let mut state = self.state.write().await;
            state.error = None;
            state.is_scanning = true;
        }

        let result = self.adapter.request_device(&self.options).await;

        let mut state = self.state.write().await;
        state.is_scanning = false;

        match result {
            Ok(advertised) => {
                let device = DiscoveredDevice::from(advertised);
                if state.devices.iter().any(|d| d.id == device.id) {
                    debug!("Device {} already listed", device.id);
                } else {
                    info!("Discovered {} ({})", device.name, device.id);
                    state.devices.push(device.clone());
                }
                Ok(device)
            }
            Err(e) => {
                warn!("Bluetooth scan error: {}", e);
                let message = e.to_string();
                state.error = Some(if message.is_empty() {
                    "Failed to scan for devices".to_string()
                } else {
                    message
                });
                Err(e)
            }
        }
    }

    /// Select a listed device and connect to it
    pub async fn connect_to_device(&self, device_id: &str) -> Result<DiscoveredDevice> {
        let device = {
            let mut state = self.state.write().await;
            match state.devices.iter().find(|d| d.id == device_id).cloned() {
                Some(device) => {
                    state.selected = Some(device.clone());
                    device
                }
                None => {
                    let e = Error::DeviceNotFound(device_id.to_string());
                    state.error = Some(e.to_string());
                    return Err(e);
                }
            }
        };

        if let Err(e) = self.adapter.connect(&device.id).await {
            warn!("Connection error for {}: {}", device.id, e);
            self.state.write().await.error = Some(e.to_string());
            return Err(e);
        }

        info!("Connected to device: {}", device.name);
        Ok(device)
    }

    /// Drop the selected device; false when nothing was selected
    pub async fn disconnect(&self) -> bool {
        let Some(device) = self.state.write().await.selected.take() else {
            return false;
        };

        if let Err(e) = self.adapter.disconnect(&device.id).await {
            warn!("Disconnect error for {}: {}", device.id, e);
        }
        info!("Disconnected from device: {}", device.name);
        true
    }

    pub async fn clear_devices(&self) {
        self.state.write().await.devices.clear();
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Mutex;

    /// Hands out a scripted sequence of devices
    struct ScriptedAdapter {
        queue: Mutex<Vec<AdvertisedDevice>>,
    }

    #[async_trait]
    impl BluetoothAdapter for ScriptedAdapter {
        fn is_supported(&self) -> bool {
            true
        }

        async fn request_device(&self, options: &RequestDeviceOptions) -> Result<AdvertisedDevice> {
            assert!(options.accept_all_devices);
            let mut queue = self.queue.lock().unwrap();
            if queue.is_empty() {
                return Err(Error::Bluetooth("User cancelled the requestDevice() chooser.".to_string()));
            }
            Ok(queue.remove(0))
        }

        async fn connect(&self, _device_id: &str) -> Result<()> {
            Ok(())
        }

        async fn disconnect(&self, _device_id: &str) -> Result<()> {
            Ok(())
        }
    }

    fn advertised(id: &str, name: Option<&str>) -> AdvertisedDevice {
        AdvertisedDevice {
            id: id.to_string(),
            name: name.map(str::to_string),
            distance: None,
        }
    }

    fn scanner() -> NearbyScanner {
        NearbyScanner::new(Arc::new(ScriptedAdapter {
            queue: Mutex::new(vec![
                advertised("a", Some("Phone")),
                advertised("a", Some("Phone")),
                advertised("b", None),
            ]),
        }))
    }

    #[tokio::test]
    async fn test_scan_dedupes_and_names() {
        let scanner = scanner();
        for _ in 0..3 {
            scanner.start_scan().await.unwrap();
        }

        let devices = scanner.devices().await;
        assert_eq!(devices.len(), 2);
        assert_eq!(devices[1].name, UNKNOWN_DEVICE_NAME);
        assert!(!scanner.is_scanning().await);

        assert!(scanner.start_scan().await.is_err());
        assert_eq!(
            scanner.error().await.as_deref(),
            Some("User cancelled the requestDevice() chooser.")
        );

        scanner.clear_devices().await;
        assert!(scanner.devices().await.is_empty());
    }

    #[tokio::test]
    async fn test_connect_and_disconnect() {
        let scanner = scanner();
        scanner.start_scan().await.unwrap();

        assert!(matches!(
            scanner.connect_to_device("zzz").await,
            Err(Error::DeviceNotFound(_))
        ));
        assert_eq!(scanner.error().await.as_deref(), Some("Device not found"));

        let device = scanner.connect_to_device("a").await.unwrap();
        assert_eq!(scanner.selected_device().await, Some(device));

        assert!(scanner.disconnect().await);
        assert!(!scanner.disconnect().await);
    }

    #[tokio::test]
    async fn test_unsupported_adapter() {
        let scanner = NearbyScanner::new(Arc::new(UnsupportedAdapter));
        assert!(!scanner.is_supported());
        assert_eq!(
            scanner.error().await.as_deref(),
            Some("Bluetooth is not supported by this browser")
        );
        assert!(matches!(scanner.start_scan().await, Err(Error::BluetoothUnsupported)));
    }
}
