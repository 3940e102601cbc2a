//! hidapi-backed device handle

use std::sync::Arc;

use async_trait::async_trait;
use hidapi::HidDevice as RawHidDevice;
use parking_lot::Mutex;
use tokio::sync::broadcast;
use tracing::debug;

use crate::error::TransportError;
use crate::protocol::{build_report, MAX_REPORT_SIZE};
use crate::report_reader::{ReportReaderConfig, ReportSubsystem};
use crate::types::{DeviceInfo, InputReport};
use crate::HidDevice;

/// Open vendor interface of a keyboard
///
/// Output reports are written with `hid_write`; input reports are read on a
/// dedicated thread sharing the same handle.
pub struct HidapiDevice {
    device: Arc<Mutex<RawHidDevice>>,
    info: DeviceInfo,
    reports: ReportSubsystem,
}

impl HidapiDevice {
    /// Wrap an opened hidapi handle and start its report reader
    pub fn new(
        device: RawHidDevice,
        info: DeviceInfo,
        config: ReportReaderConfig,
    ) -> Result<Self, TransportError> {
        let device = Arc::new(Mutex::new(device));
        let reports = ReportSubsystem::spawn(device.clone(), info.display_name(), config)?;
        Ok(Self {
            device,
            info,
            reports,
        })
    }
}

#[async_trait]
impl HidDevice for HidapiDevice {
    fn info(&self) -> &DeviceInfo {
        &self.info
    }

    async fn send_report(&self, report_id: u8, data: &[u8]) -> Result<(), TransportError> {
        if data.len() > MAX_REPORT_SIZE {
            return Err(TransportError::ReportTooLarge {
                len: data.len(),
                max: MAX_REPORT_SIZE,
            });
        }
        let buf = build_report(report_id, data);
        debug!("Writing output report: {:02X?}", buf);
        let written = self.device.lock().write(&buf)?;
        if written == 0 {
            return Err(TransportError::Disconnected);
        }
        Ok(())
    }

    fn subscribe_input(&self) -> broadcast::Receiver<InputReport> {
        self.reports.subscribe()
    }

    async fn close(&self) -> Result<(), TransportError> {
        // Handle itself is released when the last Arc drops
        self.reports.stop();
        Ok(())
    }
}

impl Drop for HidapiDevice {
    fn drop(&mut self) {
        debug!("HidapiDevice {} dropped, stopping report reader", self.info.path);
    }
}
