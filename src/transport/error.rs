//! Error taxonomy for the serial transport

use std::io;
use std::path::PathBuf;

/// Errors returned by the device registry and its port sessions
///
/// Every variant is local and recoverable. The transport never escalates
/// on its own; retrying, logging or disabling a controller slot is up to
/// the caller.
#[derive(Debug, thiserror::Error)]
pub enum TransportError {
    /// Registry index outside of the current enumeration
    #[error("Invalid device index {index} (registry holds {count} devices)")]
    InvalidIndex { index: usize, count: usize },

    /// Requested rate has no discrete OS baud constant
    #[error("Unsupported baud rate: {0}")]
    UnsupportedBaudRate(u32),

    /// The OS refused to open or configure the device node
    #[error("Failed to open {}: {source}", .path.display())]
    OpenError {
        path: PathBuf,
        #[source]
        source: io::Error,
    },

    /// Operation on a descriptor without a live handle
    #[error("Device {0} is not open")]
    NotOpen(usize),

    /// The underlying write call failed
    #[error("Write to device {index} failed: {source}")]
    WriteError {
        index: usize,
        #[source]
        source: io::Error,
    },

    /// The underlying read call failed; accumulated bytes are discarded
    #[error("Read from device {index} failed: {source}")]
    ReadError {
        index: usize,
        #[source]
        source: io::Error,
    },

    /// Only raised when a read deadline has been configured
    #[error("Read from device {index} timed out after {received}/{expected} bytes")]
    ReadTimeout {
        index: usize,
        expected: usize,
        received: usize,
    },
}
