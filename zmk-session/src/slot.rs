//! Single-device slot

use zmk_transport::{BoxedDevice, DeviceInfo};

/// Holds the one device a session talks to
#[derive(Default)]
pub struct DeviceSlot {
    device: Option<BoxedDevice>,
}

impl DeviceSlot {
    pub fn new() -> Self {
        Self::default()
    }

    /// Bind `device`, returning whatever was bound before
    pub fn bind(&mut self, device: BoxedDevice) -> Option<BoxedDevice> {
        self.device.replace(device)
    }

    /// Currently bound device
    pub fn current(&self) -> Option<&BoxedDevice> {
        self.device.as_ref()
    }

    /// Clear the slot
    pub fn unbind(&mut self) -> Option<BoxedDevice> {
        self.device.take()
    }

    /// Whether `info` refers to the bound device (same OS path)
    pub fn is_bound_to(&self, info: &DeviceInfo) -> bool {
        self.device
            .as_ref()
            .is_some_and(|d| d.info().path == info.path)
    }
}
