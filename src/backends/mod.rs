//! Device backends for `ps4pad`.
//!
//! Implementations of [`DeviceBackend`](crate::device::DeviceBackend):
//! - [`hid`]: real devices through `hidapi` (feature **`hid`**, on by default)
//! - [`virtual_input`]: in-memory devices for tests, demos and headless hosts
//!
//! The report-descriptor walker in [`descriptor`] is used by the `hidapi`
//! backend off Windows and is public for diagnostics.

pub mod descriptor;
pub mod virtual_input;

#[cfg(feature = "hid")]
#[cfg_attr(docsrs, doc(cfg(feature = "hid")))]
pub mod hid;

#[cfg(all(feature = "hid", target_os = "windows"))]
#[cfg_attr(docsrs, doc(cfg(all(feature = "hid", target_os = "windows"))))]
pub mod windows;

#[cfg(feature = "hid")]
pub use hid::HidApiBackend;
pub use virtual_input::{VirtualBackend, VirtualPad};
