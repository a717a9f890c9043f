//! Port sessions: the open state of a registry entry

use super::backend::{SerialLink, POLL_INTERVAL};
use super::baud::BaudRate;
use super::registry::DeviceRegistry;
use super::TransportError;
use std::fmt;
use std::io;
use std::thread;
use std::time::{Duration, Instant};
use tracing::{debug, info, warn};

/// Handle state of one descriptor
pub enum PortState {
    Closed,
    Open(Box<dyn SerialLink>),
}

impl PortState {
    pub fn is_open(&self) -> bool {
        matches!(self, Self::Open(_))
    }
}

impl fmt::Debug for PortState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Closed => f.write_str("Closed"),
            Self::Open(_) => f.write_str("Open"),
        }
    }
}

/// Behaviour shared by all sessions of a registry
///
/// The default matches the hardware: reads wait for as long as the device
/// takes. A deadline turns a silent device into
/// [`TransportError::ReadTimeout`] instead of a hung caller.
///
/// # Examples
///
/// ```rust
/// use serial_input::{DeviceRegistry, SessionSettings};
/// use std::time::Duration;
///
/// // Blocks until every requested byte has arrived
/// let blocking = SessionSettings::default();
/// assert!(blocking.read_deadline.is_none());
///
/// // Gives up on a controller that has not answered within 50 ms
/// let bounded = SessionSettings {
///     read_deadline: Some(Duration::from_millis(50)),
/// };
/// let registry = DeviceRegistry::system().with_settings(bounded);
/// assert_eq!(
///     registry.settings().read_deadline,
///     Some(Duration::from_millis(50))
/// );
/// ```
#[derive(Debug, Clone, Default)]
pub struct SessionSettings {
    /// Upper bound for a single exact-length read
    ///
    /// `None` keeps the hardware-faithful behaviour: a device that never
    /// answers blocks the caller indefinitely.
    pub read_deadline: Option<Duration>,
}

impl DeviceRegistry {
    /// Opens (or re-opens) the device at `index` with `baud` and returns
    /// the accepted rate
    ///
    /// An already open handle on the same descriptor is closed first, even
    /// when the new open fails afterwards.
    ///
    /// # Errors
    ///
    /// * [`TransportError::InvalidIndex`] - `index` is not in the registry
    /// * [`TransportError::UnsupportedBaudRate`] - no OS constant for `baud`
    /// * [`TransportError::OpenError`] - access denied, busy, missing node or
    ///   the port configuration was rejected
    pub fn open(&mut self, index: usize, baud: u32) -> Result<BaudRate, TransportError> {
        self.descriptor_mut(index)?;
        self.close(index);

        let baud = BaudRate::from_bps(baud)?;
        let path = self.devices[index].path().to_path_buf();

        debug!("Trying {} at {}", path.display(), baud);
        let link = self
            .backend()
            .open(&path, baud)
            .map_err(|source| TransportError::OpenError {
                path: path.clone(),
                source,
            })?;

        self.devices[index].state = PortState::Open(link);
        info!("Opened {} at {}", path.display(), baud);
        Ok(baud)
    }

    /// Drains pending output, then releases the handle. No-op if the index
    /// is unknown or the descriptor is closed.
    pub fn close(&mut self, index: usize) {
        let Some(device) = self.devices.get_mut(index) else {
            return;
        };

        if let PortState::Open(mut link) = std::mem::replace(&mut device.state, PortState::Closed)
        {
            if let Err(e) = link.drain() {
                warn!("Failed to drain {}: {}", device.path().display(), e);
            }
            drop(link);
            debug!("Closed {}", device.path().display());
        }
    }

    /// Closes every open descriptor; safe on an empty registry
    pub fn close_all(&mut self) {
        for index in 0..self.devices.len() {
            self.close(index);
        }
    }

    pub fn is_open(&self, index: usize) -> bool {
        self.devices
            .get(index)
            .is_some_and(|device| device.is_open())
    }

    /// One write call; a short count is returned as-is
    pub fn write(&mut self, index: usize, bytes: &[u8]) -> Result<usize, TransportError> {
        let link = self.link_mut(index)?;
        link.write(bytes)
            .map_err(|source| TransportError::WriteError { index, source })
    }

    /// Fills `buffer` completely, looping over partial reads
    ///
    /// A link that reports nothing (a poll timeout or an empty read) is
    /// retried; after an empty read the loop sleeps one [`POLL_INTERVAL`].
    /// On failure `buffer` is left untouched and the partially received
    /// bytes are dropped.
    ///
    /// # Errors
    ///
    /// * [`TransportError::InvalidIndex`] / [`TransportError::NotOpen`]
    /// * [`TransportError::ReadError`] - the OS read failed
    /// * [`TransportError::ReadTimeout`] - only with
    ///   [`SessionSettings::read_deadline`] set
    pub fn read(&mut self, index: usize, buffer: &mut [u8]) -> Result<usize, TransportError> {
        let deadline = self.settings.read_deadline.map(|limit| Instant::now() + limit);
        let link = self.link_mut(index)?;

        let expected = buffer.len();
        let mut scratch = vec![0u8; expected];
        let mut received = 0;

        while received < expected {
            let idle = match link.read(&mut scratch[received..]) {
                Ok(0) => true,
                Ok(n) => {
                    received += n;
                    false
                }
                Err(e) if is_transient(&e) => false,
                Err(source) => return Err(TransportError::ReadError { index, source }),
            };

            if received == expected {
                break;
            }

            let now = Instant::now();
            if let Some(deadline) = deadline {
                if now >= deadline {
                    return Err(TransportError::ReadTimeout {
                        index,
                        expected,
                        received,
                    });
                }
            }

            // Ok(0) returns immediately, unlike a poll timeout
            if idle {
                let pause = deadline.map_or(POLL_INTERVAL, |deadline| {
                    POLL_INTERVAL.min(deadline.saturating_duration_since(now))
                });
                thread::sleep(pause);
            }
        }

        buffer.copy_from_slice(&scratch);
        Ok(received)
    }

    fn link_mut(&mut self, index: usize) -> Result<&mut Box<dyn SerialLink>, TransportError> {
        match &mut self.descriptor_mut(index)?.state {
            PortState::Open(link) => Ok(link),
            PortState::Closed => Err(TransportError::NotOpen(index)),
        }
    }
}

fn is_transient(e: &io::Error) -> bool {
    matches!(
        e.kind(),
        io::ErrorKind::TimedOut | io::ErrorKind::Interrupted | io::ErrorKind::WouldBlock
    )
}
