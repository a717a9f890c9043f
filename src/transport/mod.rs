//! Serial transport subsystem
//!
//! Two layers, leaf first:
//!
//! 1. [`registry`] - device discovery and the indexable inventory
//! 2. [`session`] - exclusive open/configure/close lifecycle and blocking
//!    exact-length I/O on one inventory entry
//!
//! # Lifecycle
//!
//! ```text
//! enumerate() ──► open(i, baud) ──► write / read ... ──► close(i)
//!      ▲                                                    │
//!      └──────── enumerate() again closes every handle ◄────┘
//! ```
//!
//! Everything is synchronous and single-threaded. Callers that poll from
//! several threads must serialize access to the registry themselves.

pub mod backend;
pub mod baud;
pub mod error;
pub mod registry;
pub mod session;

pub use backend::{PortBackend, SerialLink, SystemBackend};
pub use baud::{BaudRate, DEFAULT_BAUD_RATE, SUPPORTED_BAUD_RATES};
pub use error::TransportError;
pub use registry::{DeviceDescriptor, DeviceNamespace, DeviceRegistry, DEVICE_PREFIXES};
pub use session::{PortState, SessionSettings};
