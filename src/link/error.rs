use super::frame::FrameError;
use crate::transport::TransportError;

/// Errors of the controller link layer
#[derive(Debug, thiserror::Error)]
pub enum LinkError {
    #[error("Controller slot {0} does not exist")]
    SlotOutOfRange(usize),

    #[error("Serial device not found: {0}")]
    DeviceNotFound(String),

    #[error("Malformed command frame: {0}")]
    Frame(#[from] FrameError),

    /// The adapter accepted only part of the request; no response is read
    #[error("Short write: {written} of {expected} bytes sent")]
    ShortWrite { expected: usize, written: usize },

    #[error(transparent)]
    Transport(#[from] TransportError),
}
