#![cfg(target_os = "windows")]

//! Windows-specific helpers for the `hidapi` backend.
//!
//! `hidapi` already covers enumeration, reads and the product string on
//! Windows. The one thing it does not expose is the HID parser's view of the
//! device, so [`hidp_caps`] asks `HidP_GetCaps` for the usage pair and the
//! input report length directly.

pub mod hidp_caps;

pub use hidp_caps::query_caps;
