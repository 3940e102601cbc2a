//! Vendor report protocol constants
//!
//! The keyboard firmware exposes a raw HID interface on a vendor usage page.
//! The host writes single-byte output reports and the firmware answers with
//! input reports whose first payload byte carries the current value.

/// HID usage page of the vendor interface
pub const USAGE_PAGE: u16 = 0xFF0B;

/// Report IDs
pub mod report {
    /// Output report carrying the control value
    pub const VALUE: u8 = 0x42;
}

/// Payload sent right after binding to ask the device for its current value.
///
/// Meaning is defined by the firmware; treat as opaque.
pub const READ_PROBE: u8 = 64;

/// Largest output payload accepted by `send_report` (64-byte full-speed report)
pub const MAX_REPORT_SIZE: usize = 64;

/// Input buffer size for the reader thread (report ID + 64 bytes)
pub const INPUT_BUFFER_SIZE: usize = 65;

/// Output report ready to be written to a device
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct OutputReport {
    pub report_id: u8,
    pub data: Vec<u8>,
}

impl OutputReport {
    /// One-byte value report
    pub fn value(report_id: u8, value: u8) -> Self {
        Self {
            report_id,
            data: vec![value],
        }
    }
}

/// Prefix `data` with `report_id`
pub fn build_report(report_id: u8, data: &[u8]) -> Vec<u8> {
    let mut buf = Vec::with_capacity(data.len() + 1);
    buf.push(report_id);
    buf.extend_from_slice(data);
    buf
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_value_report_layout() {
        let report = OutputReport::value(report::VALUE, 200);
        assert_eq!(report.data, vec![200]);
        assert_eq!(build_report(report.report_id, &report.data), vec![0x42, 200]);
    }

    #[test]
    fn test_probe_report() {
        let report = OutputReport::value(report::VALUE, READ_PROBE);
        assert_eq!(build_report(report.report_id, &report.data), vec![0x42, 64]);
    }
}
