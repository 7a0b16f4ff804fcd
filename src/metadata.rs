//! Connected-controller metadata.
//!
//! [`ControllerInfo`] is a lightweight, cloneable description of one
//! connected controller, suitable for UI display, logging and diagnostics
//! dumps (it is `Serialize`).
//!
//! # Example
//! ```no_run
//! use ps4pad::{Config, Manager};
//! use ps4pad::backends::virtual_input::VirtualBackend;
//!
//! let mgr = Manager::new(VirtualBackend::new(), Config::default());
//! mgr.initialize().expect("initialize");
//! for info in mgr.controllers() {
//!     println!("{info}");
//! }
//! ```

use crate::device::{Capabilities, DeviceHandle};
use serde::{Deserialize, Serialize};
use std::fmt;

/// Snapshot of metadata describing a single connected controller.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct ControllerInfo {
    /// Slot index the host addresses this controller by.
    pub slot: usize,

    /// Backend identity of the underlying device (path for `hidapi`).
    pub handle: DeviceHandle,

    /// Product string as read during validation.
    pub product_string: String,

    /// Capabilities read during validation.
    pub caps: Capabilities,

    /// Reports rejected by the decoder since the controller connected.
    pub malformed_reports: u64,
}

impl fmt::Display for ControllerInfo {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "#{} {} [{}] up=0x{:02x} u=0x{:02x} in={}B",
            self.slot,
            self.product_string,
            self.handle,
            self.caps.usage_page,
            self.caps.usage,
            self.caps.input_report_len
        )?;
        if self.malformed_reports > 0 {
            write!(f, " malformed={}", self.malformed_reports)?;
        }
        Ok(())
    }
}
