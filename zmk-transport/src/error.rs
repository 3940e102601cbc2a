//! Transport error types

use thiserror::Error;

/// Errors that can occur during transport operations
#[derive(Error, Debug)]
pub enum TransportError {
    #[error("Device not found: {0}")]
    DeviceNotFound(String),

    #[error("Device disconnected")]
    Disconnected,

    // HID-specific errors
    #[error("HID error: {0}")]
    HidError(String),

    #[error("HID permission denied: {0}")]
    HidPermissionDenied(String),

    #[error("Output report too large: {len} bytes (max {max})")]
    ReportTooLarge { len: usize, max: usize },

    // Generic
    #[error("Internal error: {0}")]
    Internal(String),
}

impl From<hidapi::HidError> for TransportError {
    fn from(e: hidapi::HidError) -> Self {
        let msg = e.to_string();
        if msg.contains("Permission denied") || msg.contains("EPERM") || msg.contains("EACCES") {
            TransportError::HidPermissionDenied(msg)
        } else {
            TransportError::HidError(msg)
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_permission_errors_are_classified() {
        let err: TransportError = hidapi::HidError::HidApiError {
            message: "Permission denied (os error 13)".into(),
        }
        .into();
        assert!(matches!(err, TransportError::HidPermissionDenied(_)));
    }

    #[test]
    fn test_other_errors_stay_generic() {
        let err: TransportError = hidapi::HidError::HidApiError {
            message: "No such device".into(),
        }
        .into();
        assert!(matches!(err, TransportError::HidError(_)));
    }
}
