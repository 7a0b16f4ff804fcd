//! Device collaborator interface.
//!
//! `ps4pad` does not talk to the OS directly. A [`DeviceBackend`] enumerates
//! devices, opens them for reading and answers product-string queries; the
//! registry decides what to do with the results. Backends shipped with the
//! crate live in [`backends`](crate::backends).

use serde::{Deserialize, Serialize};
use std::fmt;
use std::io;

/// Opaque, stable identity of an enumerated device.
///
/// For `hidapi` this is the device path; other backends may use anything that
/// stays unique while the device is present.
#[derive(Clone, Debug, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct DeviceHandle(pub String);

impl fmt::Display for DeviceHandle {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl From<&str> for DeviceHandle {
    fn from(s: &str) -> Self {
        DeviceHandle(s.to_string())
    }
}

impl From<String> for DeviceHandle {
    fn from(s: String) -> Self {
        DeviceHandle(s)
    }
}

/// Device class as reported by enumeration.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum DeviceKind {
    Mouse,
    Keyboard,
    Hid,
}

/// One enumerated device.
#[derive(Clone, Debug, PartialEq, Eq, Hash)]
pub struct DeviceDescriptor {
    pub handle: DeviceHandle,
    pub kind: DeviceKind,
}

impl DeviceDescriptor {
    pub fn new(handle: impl Into<DeviceHandle>, kind: DeviceKind) -> Self {
        Self {
            handle: handle.into(),
            kind,
        }
    }
}

/// Parsed HID capabilities of an opened device.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Capabilities {
    pub usage: u16,
    pub usage_page: u16,
    /// Input report length in bytes, including the report id byte.
    pub input_report_len: u16,
}

/// A readable stream of input reports bound to one opened device.
///
/// The stream is shared between the session's read loop and whoever closes the
/// session, so every method takes `&self`.
pub trait ReportStream: Send + Sync {
    /// Block until one input report has been read into `buf`.
    ///
    /// Returns the number of bytes written. After [`close`](Self::close), or when
    /// the device goes away, this fails.
    fn read_report(&self, buf: &mut [u8]) -> io::Result<usize>;

    /// Close the underlying handle. A pending or future read fails.
    fn close(&self);

    /// `false` once the stream has been closed.
    fn is_readable(&self) -> bool;
}

/// OS-facing collaborator consumed by the registry.
pub trait DeviceBackend: Send + Sync + 'static {
    type Stream: ReportStream + 'static;

    /// List every raw input device currently present.
    fn enumerate(&self) -> crate::Result<Vec<DeviceDescriptor>>;

    /// Open a device for reading and query its capabilities.
    fn open(&self, device: &DeviceDescriptor) -> crate::Result<(Self::Stream, Capabilities)>;

    /// Product string of an opened device.
    fn product_string(&self, stream: &Self::Stream) -> crate::Result<String>;
}
