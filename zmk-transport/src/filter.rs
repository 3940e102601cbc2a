//! Device selection filter

use crate::protocol;
use crate::types::DeviceInfo;

/// Criteria a HID interface must meet to be offered for selection
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct DeviceFilter {
    /// Required usage page
    pub usage_page: u16,
    /// Optional vendor ID restriction
    pub vendor_id: Option<u16>,
    /// Optional product ID restriction
    pub product_id: Option<u16>,
}

impl Default for DeviceFilter {
    fn default() -> Self {
        Self::usage_page(protocol::USAGE_PAGE)
    }
}

impl DeviceFilter {
    /// Filter on usage page only
    pub fn usage_page(usage_page: u16) -> Self {
        Self {
            usage_page,
            vendor_id: None,
            product_id: None,
        }
    }

    /// Restrict to a vendor ID
    pub fn with_vendor(mut self, vid: u16) -> Self {
        self.vendor_id = Some(vid);
        self
    }

    /// Restrict to a product ID
    pub fn with_product(mut self, pid: u16) -> Self {
        self.product_id = Some(pid);
        self
    }

    /// Check whether an interface satisfies the filter
    #[inline]
    pub fn matches(&self, info: &DeviceInfo) -> bool {
        info.usage_page == self.usage_page
            && self.vendor_id.map_or(true, |vid| vid == info.vid)
            && self.product_id.map_or(true, |pid| pid == info.pid)
    }
}
