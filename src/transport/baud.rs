//! Baud rate mapping
//!
//! Controllers are configured with a plain bits-per-second integer. Only
//! rates with a matching discrete termios constant are accepted; there is
//! no rounding to a neighbouring rate.

use super::TransportError;
use std::fmt;

/// Rates with a discrete OS constant, ascending
#[cfg(target_os = "linux")]
pub const SUPPORTED_BAUD_RATES: &[u32] = &[
    50, 75, 110, 134, 150, 200, 300, 600, 1200, 1800, 2400, 4800, 9600, 19200, 38400, 57600,
    115200, 230400, 460800, 500000, 576000, 921600, 1000000, 1152000, 1500000, 2000000, 2500000,
    3000000, 3500000, 4000000,
];

/// Rates with a discrete OS constant, ascending
#[cfg(not(target_os = "linux"))]
pub const SUPPORTED_BAUD_RATES: &[u32] = &[
    50, 75, 110, 134, 150, 200, 300, 600, 1200, 1800, 2400, 4800, 9600, 19200, 38400, 57600,
    115200, 230400,
];

/// Default rate for a controller slot
pub const DEFAULT_BAUD_RATE: u32 = 115200;

/// A validated baud rate
///
/// Can only be constructed from a rate listed in [`SUPPORTED_BAUD_RATES`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct BaudRate(u32);

impl BaudRate {
    /// Maps a numeric rate onto the supported set
    ///
    /// # Errors
    ///
    /// [`TransportError::UnsupportedBaudRate`] if `bps` is not an exact
    /// member of the table.
    pub fn from_bps(bps: u32) -> Result<Self, TransportError> {
        if SUPPORTED_BAUD_RATES.binary_search(&bps).is_ok() {
            Ok(Self(bps))
        } else {
            Err(TransportError::UnsupportedBaudRate(bps))
        }
    }

    pub fn bps(self) -> u32 {
        self.0
    }
}

impl Default for BaudRate {
    fn default() -> Self {
        Self(DEFAULT_BAUD_RATE)
    }
}

impl TryFrom<u32> for BaudRate {
    type Error = TransportError;

    fn try_from(bps: u32) -> Result<Self, Self::Error> {
        Self::from_bps(bps)
    }
}

impl fmt::Display for BaudRate {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} baud", self.0)
    }
}
