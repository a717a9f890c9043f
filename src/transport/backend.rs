//! OS seam for the serial transport
//!
//! [`PortBackend`] opens device nodes and hands back a [`SerialLink`], the
//! owned OS handle of one port session. Dropping a link releases the
//! handle. [`SystemBackend`] is the real implementation on top of the
//! `serialport` crate; tests plug in a scripted backend instead.

use super::baud::BaudRate;
use serialport::{DataBits, FlowControl, Parity, SerialPort, SerialPortBuilder, StopBits};
use std::io::{self, Read, Write};
use std::path::Path;
use std::time::Duration;
use tracing::debug;

/// Owned handle of an open, configured port
pub trait SerialLink: Send {
    /// Single write call, may accept fewer bytes than offered
    fn write(&mut self, bytes: &[u8]) -> io::Result<usize>;

    /// Single read call; `TimedOut` means nothing arrived within one poll
    /// interval and is not a failure of the link
    fn read(&mut self, buffer: &mut [u8]) -> io::Result<usize>;

    /// Blocks until all queued output has been transmitted
    fn drain(&mut self) -> io::Result<()>;
}

/// Factory for [`SerialLink`]s
pub trait PortBackend {
    /// Opens `path` in raw 8N1 mode at `baud`
    ///
    /// Configuration failures must not leave a handle behind.
    fn open(&self, path: &Path, baud: BaudRate) -> io::Result<Box<dyn SerialLink>>;
}

/// How long a single OS read may wait before the read loop checks its
/// deadline again
pub const POLL_INTERVAL: Duration = Duration::from_millis(100);

/// Default backend using the host's serial ports
///
/// Ports are opened exclusively in raw mode: no line discipline, no echo,
/// no software or hardware flow control, 8 data bits, no parity, 1 stop
/// bit, receiver enabled and modem control lines ignored. On unix hosts
/// break conditions are ignored instead of arriving as NUL bytes.
#[derive(Debug, Clone, Copy, Default)]
pub struct SystemBackend;

impl PortBackend for SystemBackend {
    fn open(&self, path: &Path, baud: BaudRate) -> io::Result<Box<dyn SerialLink>> {
        let builder = serialport::new(path.to_string_lossy(), baud.bps())
            .data_bits(DataBits::Eight)
            .parity(Parity::None)
            .stop_bits(StopBits::One)
            .flow_control(FlowControl::None)
            .timeout(POLL_INTERVAL);

        let port = open_port(builder)?;
        debug!("Configured {} at {}", path.display(), baud);
        Ok(Box::new(SystemLink { port }))
    }
}

#[cfg(unix)]
fn open_port(builder: SerialPortBuilder) -> io::Result<Box<dyn SerialPort>> {
    let port = builder.open_native().map_err(io::Error::from)?;
    // port is dropped, and its descriptor closed, on the error path
    ignore_breaks(&port)?;
    Ok(Box::new(port))
}

#[cfg(not(unix))]
fn open_port(builder: SerialPortBuilder) -> io::Result<Box<dyn SerialPort>> {
    builder.open().map_err(io::Error::from)
}

/// Sets `IGNBRK`, which `cfmakeraw` clears
#[cfg(unix)]
fn ignore_breaks(port: &serialport::TTYPort) -> io::Result<()> {
    use nix::sys::termios::{self, InputFlags, SetArg};
    use std::os::unix::io::AsRawFd;

    let fd = port.as_raw_fd();
    let mut settings = termios::tcgetattr(fd)?;
    settings.input_flags |= InputFlags::IGNBRK;
    termios::tcsetattr(fd, SetArg::TCSANOW, &settings)?;
    Ok(())
}

struct SystemLink {
    port: Box<dyn SerialPort>,
}

impl SerialLink for SystemLink {
    fn write(&mut self, bytes: &[u8]) -> io::Result<usize> {
        self.port.write(bytes)
    }

    fn read(&mut self, buffer: &mut [u8]) -> io::Result<usize> {
        self.port.read(buffer)
    }

    // tcdrain on POSIX hosts
    fn drain(&mut self) -> io::Result<()> {
        self.port.flush()
    }
}
