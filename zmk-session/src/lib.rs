//! Device session controller for ZMK vendor HID value reports
//!
//! The session binds at most one device, mirrors the first byte of every
//! input report into a control value, and sends one-byte output reports built
//! from values supplied by the presentation layer.
//!
//! ```ignore
//! let host = Arc::new(HidapiHost::new(Chooser::First)?);
//! let (controller, handle) = SessionController::new(host, SessionConfig::default());
//! tokio::spawn(controller.run());
//! handle.request_device().await?;
//! handle.save(128).await?;
//! ```

pub mod controller;
pub mod error;
pub mod slot;

pub use controller::{
    Reply, SessionCommand, SessionConfig, SessionController, SessionHandle, SessionStatus,
};
pub use error::SessionError;
pub use slot::DeviceSlot;
