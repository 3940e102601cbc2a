//! Session error types

use thiserror::Error;
use zmk_transport::TransportError;

/// Errors returned by session operations
#[derive(Error, Debug)]
pub enum SessionError {
    #[error("No device bound")]
    NotBound,

    #[error("Transport error: {0}")]
    Transport(#[from] TransportError),

    #[error("Session closed")]
    Closed,
}
