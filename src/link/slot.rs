//! Controller slot lifecycle
//!
//! ```text
//! Unbound ──bind──► Bound ──exchange──► Bound
//! ```
//!
//! A slot never returns to `Unbound` on its own; the whole slot table is
//! reset when the registry is rebuilt or shut down.

use crate::transport::BaudRate;
use statum::{machine, state, transition};
use std::fmt;

/// Port session a bound slot relays through
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SessionBinding {
    pub index: usize,
    pub device: String,
    pub baud: BaudRate,
}

#[state]
#[derive(Debug, Clone)]
pub enum SlotState {
    Unbound,
    Bound(SessionBinding),
}

#[machine]
pub struct ControllerSlot<SlotState> {
    slot: usize,
}

impl<S: SlotStateTrait> ControllerSlot<S> {
    pub fn slot(&self) -> usize {
        self.slot
    }
}

impl ControllerSlot<Unbound> {
    pub fn create(slot: usize) -> Self {
        Self::builder().slot(slot).build()
    }
}

#[transition]
impl ControllerSlot<Unbound> {
    pub fn bind(self, binding: SessionBinding) -> ControllerSlot<Bound> {
        self.transition_with(binding)
    }
}

impl ControllerSlot<Bound> {
    pub fn binding(&self) -> &SessionBinding {
        &self.state_data
    }
}

/// Entry of the slot table
pub enum SlotEntry {
    Unbound(ControllerSlot<Unbound>),
    Bound(ControllerSlot<Bound>),
}

impl SlotEntry {
    pub fn unbound(slot: usize) -> Self {
        Self::Unbound(ControllerSlot::create(slot))
    }

    /// Same as the emulator's per-slot `Present` flag
    pub fn is_present(&self) -> bool {
        matches!(self, Self::Bound(_))
    }

    pub fn binding(&self) -> Option<&SessionBinding> {
        match self {
            Self::Bound(slot) => Some(slot.binding()),
            Self::Unbound(_) => None,
        }
    }
}

impl fmt::Debug for SlotEntry {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Unbound(slot) => f.debug_tuple("Unbound").field(&slot.slot()).finish(),
            Self::Bound(slot) => f
                .debug_tuple("Bound")
                .field(&slot.slot())
                .field(slot.binding())
                .finish(),
        }
    }
}
