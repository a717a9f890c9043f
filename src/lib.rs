//! Serial input for N64 emulators
//!
//! Relays the emulator's raw controller command frames to a physical
//! controller adapter on a serial port and writes the adapter's answer
//! back into the frame.
//!
//! ```text
//! emulator ──► link::SerialInput ──► transport::DeviceRegistry ──► /dev/ttyACM0
//!  (slots)       (frames)              (port sessions)
//! ```

pub mod config;
pub mod link;
pub mod transport;
pub mod version;

pub use config::{ControllerConfig, PluginConfig, TransportConfig};
pub use link::{BindOutcome, CommandFrame, LinkError, SerialInput, SLOT_COUNT};
pub use transport::{DeviceRegistry, SessionSettings, TransportError};
