//! hidapi host: selection, opening and hot-plug monitoring

use std::collections::HashSet;
use std::ffi::CString;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use hidapi::HidApi;
use parking_lot::Mutex;
use tokio::sync::broadcast;
use tokio::task::JoinHandle;
use tracing::{debug, info, warn};

use crate::chooser::{prompt_selection, Chooser};
use crate::error::TransportError;
use crate::filter::DeviceFilter;
use crate::hid_device::HidapiDevice;
use crate::hotplug::{diff_snapshots, snapshot};
use crate::report_reader::ReportReaderConfig;
use crate::types::{DeviceInfo, DeviceKey, HostEvent};
use crate::{HidDevice, HidHost};

/// Default hot-plug poll interval
pub const DEFAULT_POLL_INTERVAL: Duration = Duration::from_millis(500);

/// Host events channel capacity
const HOST_EVENT_CAPACITY: usize = 16;

/// Device access on top of hidapi
pub struct HidapiHost {
    api: Arc<Mutex<HidApi>>,
    chooser: Chooser,
    reader_config: ReportReaderConfig,
    /// Devices the user picked through `request_device`
    granted: Arc<Mutex<HashSet<DeviceKey>>>,
    event_tx: broadcast::Sender<HostEvent>,
    monitoring: Arc<AtomicBool>,
}

impl HidapiHost {
    /// Initialise hidapi
    pub fn new(chooser: Chooser) -> Result<Self, TransportError> {
        let api = HidApi::new()?;
        let (event_tx, _) = broadcast::channel(HOST_EVENT_CAPACITY);
        Ok(Self {
            api: Arc::new(Mutex::new(api)),
            chooser,
            reader_config: ReportReaderConfig::default(),
            granted: Arc::new(Mutex::new(HashSet::new())),
            event_tx,
            monitoring: Arc::new(AtomicBool::new(false)),
        })
    }

    /// Whether devices prefix input reports with a report ID (default true)
    pub fn with_numbered_reports(mut self, numbered: bool) -> Self {
        self.reader_config.numbered_reports = numbered;
        self
    }

    /// Re-enumerate and return interfaces matching `filter`
    pub fn list_devices(&self, filter: &DeviceFilter) -> Result<Vec<DeviceInfo>, TransportError> {
        let devices = enumerate(&self.api)?;
        Ok(devices.into_iter().filter(|d| filter.matches(d)).collect())
    }

    /// Re-enumerate and return every HID interface
    pub fn list_all(&self) -> Result<Vec<DeviceInfo>, TransportError> {
        enumerate(&self.api)
    }

    /// Remember a device as authorised for connect/disconnect notifications
    pub fn grant(&self, device: &DeviceInfo) {
        if self.granted.lock().insert(device.key()) {
            debug!("Granted access to {}", device.display_name());
        }
    }

    /// Start polling for granted devices coming and going.
    ///
    /// Devices present when the monitor starts do not produce events.
    pub fn start_hotplug_monitor(
        &self,
        filter: DeviceFilter,
        interval: Duration,
    ) -> Result<JoinHandle<()>, TransportError> {
        let mut last = snapshot(self.list_devices(&filter)?);
        let api = self.api.clone();
        let granted = self.granted.clone();
        let event_tx = self.event_tx.clone();
        let monitoring = self.monitoring.clone();
        monitoring.store(true, Ordering::SeqCst);

        info!("Hot-plug monitor started ({} ms)", interval.as_millis());
        Ok(tokio::spawn(async move {
            let mut ticker = tokio::time::interval(interval);
            while monitoring.load(Ordering::Relaxed) {
                ticker.tick().await;

                let current = match enumerate(&api) {
                    Ok(devices) => snapshot(devices.into_iter().filter(|d| filter.matches(d))),
                    Err(e) => {
                        warn!("Hot-plug enumeration failed: {}", e);
                        continue;
                    }
                };

                let events = diff_snapshots(&last, &current, &granted.lock());
                for event in events {
                    debug!("Hot-plug event: {:?}", event);
                    let _ = event_tx.send(event);
                }
                last = current;
            }
            debug!("Hot-plug monitor exiting");
        }))
    }

    /// Stop the hot-plug monitor after its current tick
    pub fn stop_hotplug_monitor(&self) {
        self.monitoring.store(false, Ordering::SeqCst);
    }
}

impl Drop for HidapiHost {
    fn drop(&mut self) {
        self.stop_hotplug_monitor();
    }
}

/// Refresh hidapi's device list and convert it
fn enumerate(api: &Mutex<HidApi>) -> Result<Vec<DeviceInfo>, TransportError> {
    let mut api = api.lock();
    api.refresh_devices()?;
    Ok(api.device_list().map(DeviceInfo::from_hidapi).collect())
}

#[async_trait]
impl HidHost for HidapiHost {
    async fn request_device(
        &self,
        filter: &DeviceFilter,
    ) -> Result<Vec<DeviceInfo>, TransportError> {
        let matches = self.list_devices(filter)?;
        info!(
            "Found {} device(s) on usage page 0x{:04X}",
            matches.len(),
            filter.usage_page
        );
        if matches.is_empty() {
            return Ok(matches);
        }

        let chosen = match self.chooser {
            Chooser::First => Some(matches[0].clone()),
            Chooser::Prompt => {
                let candidates = matches.clone();
                let index = tokio::task::spawn_blocking(move || prompt_selection(&candidates))
                    .await
                    .map_err(|e| TransportError::Internal(format!("selection task: {e}")))?
                    .map_err(|e| TransportError::Internal(format!("selection prompt: {e}")))?;
                index.map(|i| matches[i].clone())
            }
        };

        match chosen {
            Some(device) => {
                self.grant(&device);
                Ok(vec![device])
            }
            None => {
                info!("Device selection cancelled");
                Ok(Vec::new())
            }
        }
    }

    async fn open(&self, device: &DeviceInfo) -> Result<Arc<dyn HidDevice>, TransportError> {
        let path = CString::new(device.path.as_str())
            .map_err(|_| TransportError::DeviceNotFound(device.path.clone()))?;
        let raw = self.api.lock().open_path(&path)?;
        let handle = HidapiDevice::new(raw, device.clone(), self.reader_config.clone())?;
        info!(
            "Opened {} ({:04X}:{:04X}) at {}",
            device.display_name(),
            device.vid,
            device.pid,
            device.path
        );
        Ok(Arc::new(handle))
    }

    fn subscribe_events(&self) -> broadcast::Receiver<HostEvent> {
        self.event_tx.subscribe()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_list_devices() {
        // Passes without hardware; only fails if hidapi cannot initialise
        if let Ok(host) = HidapiHost::new(Chooser::First) {
            assert!(host.list_devices(&DeviceFilter::default()).is_ok());
        }
    }
}
