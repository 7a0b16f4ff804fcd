//! ps4pad: hot-plug discovery and per-frame input state for "Wireless
//! Controller" HID gamepads.
//!
//! A [`Manager`] enumerates HID devices through a [`DeviceBackend`], accepts
//! the ones that identify as a DualShock 4 with a 64-byte input report, and
//! gives each a small stable slot index. Every controller is read on its own
//! thread; the host calls [`Manager::reset_all`] once per frame and queries
//! buttons and axes by slot in between.

#![cfg_attr(docsrs, feature(doc_cfg))]

pub mod backends;
pub mod buttons;
pub mod config;
pub mod device;
pub mod error;
pub mod event;
pub mod eventbus;
pub mod filtered_listener;
pub mod logger;
pub mod manager;
pub mod metadata;
mod registry;
pub mod report;
pub mod session;
pub mod slot;
pub mod snapshot;
pub mod state;

pub use buttons::{Analog, Axis, Buttons, Trigger};
pub use config::{Config, DeadZone};
pub use device::*;
pub use error::{Error, Result};
pub use event::*;
pub use eventbus::*;
pub use manager::*;
pub use metadata::ControllerInfo;
pub use report::{ControllerModel, DecodedReport};
pub use snapshot::{AxisState, PadState, Snapshot};
