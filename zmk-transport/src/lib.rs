//! Transport layer for ZMK keyboards exposing a vendor raw HID interface
//!
//! This crate provides the device-access capability used by the session
//! controller:
//!
//! - `HidHost`: request (user-mediated selection), open, hot-plug notifications
//! - `HidDevice`: output reports and input report subscription
//!
//! `HidapiHost`/`HidapiDevice` implement both on top of hidapi.

pub mod chooser;
pub mod error;
pub mod filter;
pub mod hotplug;
pub mod protocol;
pub mod report_reader;
pub mod types;

mod discovery;
mod hid_device;

pub use chooser::Chooser;
pub use discovery::{HidapiHost, DEFAULT_POLL_INTERVAL};
pub use error::TransportError;
pub use filter::DeviceFilter;
pub use hid_device::HidapiDevice;
pub use protocol::OutputReport;
pub use types::{DeviceInfo, DeviceKey, HostEvent, InputReport};

use async_trait::async_trait;
use std::sync::Arc;
use tokio::sync::broadcast;

/// Host-side device access
#[async_trait]
pub trait HidHost: Send + Sync {
    /// Ask for device access under `filter`.
    ///
    /// The host decides which of the matching devices the user grants; an
    /// empty result means nothing was chosen.
    async fn request_device(&self, filter: &DeviceFilter)
        -> Result<Vec<DeviceInfo>, TransportError>;

    /// Open a device returned by `request_device` or a connect notification
    async fn open(&self, device: &DeviceInfo) -> Result<Arc<dyn HidDevice>, TransportError>;

    /// Subscribe to connect/disconnect notifications for granted devices
    fn subscribe_events(&self) -> broadcast::Receiver<HostEvent>;
}

/// An open HID connection
#[async_trait]
pub trait HidDevice: Send + Sync {
    /// Device information
    fn info(&self) -> &DeviceInfo;

    /// Send an output report
    ///
    /// # Arguments
    /// * `report_id` - Report ID (e.g., `protocol::report::VALUE`)
    /// * `data` - Payload without the report ID
    async fn send_report(&self, report_id: u8, data: &[u8]) -> Result<(), TransportError>;

    /// Subscribe to input reports
    fn subscribe_input(&self) -> broadcast::Receiver<InputReport>;

    /// Close the device
    async fn close(&self) -> Result<(), TransportError>;
}

/// Type alias for a shared device handle
pub type BoxedDevice = Arc<dyn HidDevice>;
