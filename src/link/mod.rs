//! Controller link protocol
//!
//! Relays raw N64 controller command frames through the serial transport.
//! [`SerialInput`] is the entry point for the emulator side: it owns the
//! device registry and the table of controller slots.
//!
//! # Exchange
//!
//! ```text
//! emulator buffer ──[hdr + tx]──► adapter
//!                 ◄──[rx_len]────
//! ```
//!
//! The layer is a transparent byte relay. Response integrity is the
//! adapter's business.

pub mod error;
pub mod frame;
pub mod joybus;
pub mod slot;

pub use error::LinkError;
pub use frame::{CommandFrame, FrameError};
pub use slot::{Bound, ControllerSlot, SessionBinding, SlotEntry, Unbound};

use crate::config::PluginConfig;
use crate::transport::{DeviceRegistry, PortBackend, SessionSettings, SystemBackend};
use crate::version::{PLUGIN_NAME, PLUGIN_VERSION};
use tracing::{debug, info, warn};

/// Number of controller ports on the console
pub const SLOT_COUNT: usize = 4;

/// Result of binding one slot from configuration
#[derive(Debug)]
pub enum BindOutcome {
    /// Slot is disabled or incompletely configured
    Skipped,
    Bound { device: String },
    Failed(LinkError),
}

impl BindOutcome {
    pub fn is_bound(&self) -> bool {
        matches!(self, Self::Bound { .. })
    }
}

/// Serial input subsystem: registry plus controller slots
///
/// Each of the [`SLOT_COUNT`] controller ports is either unbound, where
/// [`exchange`](Self::exchange) leaves the frame untouched, or bound to one
/// open registry entry. Slots are bound from a [`PluginConfig`] by
/// [`initiate_controllers`](Self::initiate_controllers) or one at a time
/// with [`bind`](Self::bind).
///
/// Dropping the subsystem has the same effect as [`shutdown`](Self::shutdown).
///
/// # Examples
///
/// ```rust,no_run
/// use serial_input::link::joybus;
/// use serial_input::SerialInput;
///
/// # fn main() -> Result<(), Box<dyn std::error::Error>> {
/// let mut input = SerialInput::system();
/// input.initialize_ports();
/// input.bind(0, "ttyACM0", 115200)?;
///
/// let mut frame = joybus::read_buttons_request();
/// input.exchange(0, Some(&mut frame[..]))?;
/// println!("buttons: {:02X?}", &frame[3..]);
///
/// input.shutdown();
/// # Ok(())
/// # }
/// ```
pub struct SerialInput {
    registry: DeviceRegistry,
    slots: Vec<SlotEntry>,
}

impl SerialInput {
    pub fn new(registry: DeviceRegistry) -> Self {
        Self {
            registry,
            slots: (0..SLOT_COUNT).map(SlotEntry::unbound).collect(),
        }
    }

    pub fn with_backend(backend: impl PortBackend + 'static, settings: SessionSettings) -> Self {
        Self::new(DeviceRegistry::new(backend).with_settings(settings))
    }

    pub fn system() -> Self {
        Self::with_backend(SystemBackend, SessionSettings::default())
    }

    /// Builds the subsystem the way `config` describes its transport
    pub fn from_config(backend: impl PortBackend + 'static, config: &PluginConfig) -> Self {
        let mut registry =
            DeviceRegistry::new(backend).with_settings(config.transport.session_settings());
        if let Some(dir) = &config.transport.dev_dir {
            registry = registry.with_dev_dir(dir);
        }
        Self::new(registry)
    }

    pub fn registry(&self) -> &DeviceRegistry {
        &self.registry
    }

    pub fn registry_mut(&mut self) -> &mut DeviceRegistry {
        &mut self.registry
    }

    /// Enumerates serial devices and logs the inventory
    ///
    /// All slots are unbound, their session indices are gone.
    pub fn initialize_ports(&mut self) -> usize {
        self.reset_slots();
        let devices = self.registry.enumerate();

        for (index, device) in self.registry.devices().iter().enumerate() {
            info!("com[{}]: {}", index, device.name());
        }
        info!("Found {} serial devices", devices);
        devices
    }

    /// Binds every active slot of `config`; failures leave slots unbound
    pub fn initiate_controllers(&mut self, config: &PluginConfig) -> Vec<BindOutcome> {
        self.reset_slots();

        let outcomes = (0..SLOT_COUNT)
            .map(|slot| match config.controller(slot) {
                Some(controller) if controller.is_active() => {
                    match self.bind(slot, &controller.serial, controller.baud) {
                        Ok(()) => {
                            info!(
                                "Assigned controller {} to serial port {}",
                                slot + 1,
                                controller.serial
                            );
                            BindOutcome::Bound {
                                device: controller.serial.clone(),
                            }
                        }
                        Err(e) => {
                            warn!("Controller {} stays unplugged: {}", slot + 1, e);
                            BindOutcome::Failed(e)
                        }
                    }
                }
                _ => BindOutcome::Skipped,
            })
            .collect();

        info!("{} version {} initialized.", PLUGIN_NAME, PLUGIN_VERSION);
        outcomes
    }

    /// Opens `device` at `baud` and marks `slot` present
    ///
    /// A slot that is already bound is rebound.
    pub fn bind(&mut self, slot: usize, device: &str, baud: u32) -> Result<(), LinkError> {
        if slot >= self.slots.len() {
            return Err(LinkError::SlotOutOfRange(slot));
        }
        let index = self
            .registry
            .find_by_name(device)
            .ok_or_else(|| LinkError::DeviceNotFound(device.to_owned()))?;

        if let Some(previous) = self.binding(slot).map(|binding| binding.index) {
            if previous != index {
                self.registry.close(previous);
            }
            self.slots[slot] = SlotEntry::unbound(slot);
        }

        let baud = self.registry.open(index, baud)?;

        let binding = SessionBinding {
            index,
            device: device.to_owned(),
            baud,
        };
        let bound = ControllerSlot::<Unbound>::create(slot).bind(binding);
        self.slots[slot] = SlotEntry::Bound(bound);
        debug!("Slot {} bound to registry index {}", slot, index);
        Ok(())
    }

    pub fn is_present(&self, slot: usize) -> bool {
        self.slots.get(slot).is_some_and(SlotEntry::is_present)
    }

    pub fn binding(&self, slot: usize) -> Option<&SessionBinding> {
        self.slots.get(slot).and_then(SlotEntry::binding)
    }

    /// Relays one command frame for `slot`, filling its response in place
    ///
    /// Writes the two header bytes and the tx payload, then reads exactly
    /// `rx_len` bytes into the region right after the payload. Headers and
    /// payload are never modified.
    ///
    /// Silent no-op when the slot is not present or there is no buffer.
    ///
    /// # Errors
    ///
    /// * [`LinkError::Frame`] - declared lengths do not fit the buffer
    /// * [`LinkError::ShortWrite`] - the request was only partially sent;
    ///   the response region is left untouched
    /// * [`LinkError::Transport`] - write or read failed
    pub fn exchange(&mut self, slot: usize, command: Option<&mut [u8]>) -> Result<(), LinkError> {
        let (Some(buffer), Some(binding)) = (command, self.binding(slot)) else {
            return Ok(());
        };
        let index = binding.index;

        let mut frame = CommandFrame::parse(buffer)?;

        let expected = frame.request().len();
        let written = self.registry.write(index, frame.request())?;
        if written != expected {
            return Err(LinkError::ShortWrite { expected, written });
        }

        self.registry.read(index, frame.response_mut())?;
        Ok(())
    }

    /// Unbinds every slot and tears the registry down. Idempotent.
    pub fn shutdown(&mut self) {
        self.reset_slots();
        self.registry.teardown();
    }

    fn reset_slots(&mut self) {
        for (slot, entry) in self.slots.iter_mut().enumerate() {
            *entry = SlotEntry::unbound(slot);
        }
    }
}

impl Drop for SerialInput {
    fn drop(&mut self) {
        self.shutdown();
    }
}
