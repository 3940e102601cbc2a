//! Common types for transport layer

use serde::Serialize;

/// Device identification information
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct DeviceInfo {
    /// USB Vendor ID
    pub vid: u16,
    /// USB Product ID
    pub pid: u16,
    /// HID usage page of this interface
    pub usage_page: u16,
    /// HID usage of this interface
    pub usage: u16,
    /// USB interface number (-1 when the backend does not report one)
    pub interface_number: i32,
    /// OS device path (changes across replugs)
    pub path: String,
    /// Serial number if available
    pub serial: Option<String>,
    /// Product name if available
    pub product_name: Option<String>,
}

impl DeviceInfo {
    /// Build from a hidapi enumeration entry
    pub fn from_hidapi(info: &hidapi::DeviceInfo) -> Self {
        Self {
            vid: info.vendor_id(),
            pid: info.product_id(),
            usage_page: info.usage_page(),
            usage: info.usage(),
            interface_number: info.interface_number(),
            path: info.path().to_string_lossy().to_string(),
            serial: info
                .serial_number()
                .filter(|s| !s.is_empty())
                .map(|s| s.to_string()),
            product_name: info.product_string().map(|s| s.to_string()),
        }
    }

    /// Stable identity used to recognise a device after it is replugged
    pub fn key(&self) -> DeviceKey {
        DeviceKey {
            vid: self.vid,
            pid: self.pid,
            serial: self.serial.clone(),
        }
    }

    /// Product name, or `VID:PID` if the device has none
    pub fn display_name(&self) -> String {
        match &self.product_name {
            Some(name) if !name.is_empty() => name.clone(),
            _ => format!("{:04x}:{:04x}", self.vid, self.pid),
        }
    }
}

/// Identity of a physical device independent of its OS path
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct DeviceKey {
    pub vid: u16,
    pub pid: u16,
    pub serial: Option<String>,
}

/// Input report received from a device
#[derive(Debug, Clone, PartialEq)]
pub struct InputReport {
    /// Report ID (0 for devices without numbered reports)
    pub report_id: u8,
    /// Report payload, without the report ID
    pub data: Vec<u8>,
    /// Seconds since the device was opened
    pub timestamp: f64,
}

/// Host notifications for granted devices
#[derive(Debug, Clone)]
pub enum HostEvent {
    /// A previously granted device appeared
    Connected(DeviceInfo),
    /// A previously granted device went away
    Disconnected(DeviceInfo),
}
