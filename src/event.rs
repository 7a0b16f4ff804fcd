//! Connection events.
//!
//! Connect and disconnect are the only transitions a host observes. Each is
//! delivered synchronously on the thread that detected it:
//! - `Connected`: the discovery thread (or the caller of
//!   [`Manager::initialize`](crate::manager::Manager::initialize) /
//!   [`Manager::poll_once`](crate::manager::Manager::poll_once));
//! - `Disconnected`: the controller's read-loop thread, or the thread that
//!   closed the controller explicitly.
//!
//! Listeners must not assume a single notification thread.

use crate::device::DeviceHandle;
use std::time::Instant;

/// What happened to a controller.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum ControllerEventKind {
    /// A validated controller was assigned `slot`.
    Connected { slot: usize },

    /// The controller in `slot` was removed or closed. The slot is free again.
    Disconnected { slot: usize },
}

/// Timestamped connection event.
#[derive(Clone, Debug)]
pub struct ControllerEvent {
    /// Detection time (monotonic).
    pub at: Instant,
    /// Device the event concerns.
    pub handle: DeviceHandle,
    pub kind: ControllerEventKind,
}

impl ControllerEvent {
    pub fn connected(slot: usize, handle: DeviceHandle) -> Self {
        Self {
            at: Instant::now(),
            handle,
            kind: ControllerEventKind::Connected { slot },
        }
    }

    pub fn disconnected(slot: usize, handle: DeviceHandle) -> Self {
        Self {
            at: Instant::now(),
            handle,
            kind: ControllerEventKind::Disconnected { slot },
        }
    }

    pub fn slot(&self) -> usize {
        match self.kind {
            ControllerEventKind::Connected { slot } | ControllerEventKind::Disconnected { slot } => {
                slot
            }
        }
    }
}
