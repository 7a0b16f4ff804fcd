//! `hidapi` backend.
//!
//! Enumerates every HID top-level collection `hidapi` can see and opens them by
//! path. Capabilities come from `HidP_GetCaps` on Windows and from the report
//! descriptor elsewhere; both count the report id byte in the input length.
//!
//! Reads are done in short `read_timeout` slices so that [`close`] can stop a
//! reader that is parked on an idle device.
//!
//! [`close`]: crate::device::ReportStream::close

use crate::device::{
    Capabilities, DeviceBackend, DeviceDescriptor, DeviceHandle, DeviceKind, ReportStream,
};
use crate::error::{Error, Result};
use hidapi::{DeviceInfo, HidApi, HidDevice};
use parking_lot::Mutex;
use std::ffi::CString;
use std::io;
use std::sync::atomic::{AtomicBool, Ordering};
use tracing::trace;

/// Milliseconds one `read_timeout` call may block.
const READ_SLICE_MS: i32 = 50;

const GENERIC_DESKTOP: u16 = 0x01;
const USAGE_MOUSE: u16 = 0x02;
const USAGE_KEYBOARD: u16 = 0x06;

pub struct HidApiBackend {
    api: Mutex<HidApi>,
}

impl HidApiBackend {
    pub fn new() -> Result<Self> {
        let api = HidApi::new().map_err(hid_err)?;
        Ok(Self {
            api: Mutex::new(api),
        })
    }
}

fn hid_err(e: hidapi::HidError) -> Error {
    Error::Backend(e.to_string())
}

/// Plain mice and keyboards on the Generic Desktop page are not HID game
/// devices for our purposes.
fn classify(info: &DeviceInfo) -> DeviceKind {
    match (info.usage_page(), info.usage()) {
        (GENERIC_DESKTOP, USAGE_MOUSE) => DeviceKind::Mouse,
        (GENERIC_DESKTOP, USAGE_KEYBOARD) => DeviceKind::Keyboard,
        _ => DeviceKind::Hid,
    }
}

fn handle_of(info: &DeviceInfo) -> DeviceHandle {
    DeviceHandle(info.path().to_string_lossy().into_owned())
}

impl DeviceBackend for HidApiBackend {
    type Stream = HidReportStream;

    fn enumerate(&self) -> Result<Vec<DeviceDescriptor>> {
        let mut api = self.api.lock();
        api.refresh_devices().map_err(hid_err)?;
        Ok(api
            .device_list()
            .map(|info| DeviceDescriptor::new(handle_of(info), classify(info)))
            .collect())
    }

    fn open(&self, device: &DeviceDescriptor) -> Result<(HidReportStream, Capabilities)> {
        let path = CString::new(device.handle.0.as_bytes())
            .map_err(|_| Error::Backend(format!("device path contains NUL: {}", device.handle)))?;

        let api = self.api.lock();
        let listed = api
            .device_list()
            .find(|info| info.path() == path.as_c_str())
            .map(|info| (info.usage_page(), info.usage()));
        let raw = api.open_path(&path).map_err(hid_err)?;
        drop(api);

        let caps = read_caps(&device.handle, &raw, listed)?;
        trace!(device = %device.handle, ?caps, "opened hid device");

        Ok((
            HidReportStream {
                device: Mutex::new(Some(raw)),
                closed: AtomicBool::new(false),
            },
            caps,
        ))
    }

    fn product_string(&self, stream: &HidReportStream) -> Result<String> {
        let guard = stream.device.lock();
        let raw = guard
            .as_ref()
            .ok_or_else(|| Error::Backend("stream closed".into()))?;
        raw.get_product_string()
            .map_err(hid_err)?
            .ok_or_else(|| Error::Backend("device has no product string".into()))
    }
}

#[cfg(target_os = "windows")]
fn read_caps(
    handle: &DeviceHandle,
    _raw: &HidDevice,
    _listed: Option<(u16, u16)>,
) -> Result<Capabilities> {
    crate::backends::windows::query_caps(&handle.0)
}

#[cfg(not(target_os = "windows"))]
fn read_caps(
    handle: &DeviceHandle,
    raw: &HidDevice,
    listed: Option<(u16, u16)>,
) -> Result<Capabilities> {
    let mut buf = vec![0u8; hidapi::MAX_REPORT_DESCRIPTOR_SIZE];
    let n = raw.get_report_descriptor(&mut buf).map_err(hid_err)?;
    let summary = crate::backends::descriptor::summarize(&buf[..n])?;
    trace!(device = %handle, ?summary, "parsed report descriptor");

    let (usage_page, usage) = match listed {
        Some((page, usage)) if page != 0 => (page, usage),
        _ => (summary.usage_page, summary.usage),
    };
    Ok(Capabilities {
        usage,
        usage_page,
        input_report_len: summary.input_report_len,
    })
}

/// An opened `hidapi` device.
pub struct HidReportStream {
    device: Mutex<Option<HidDevice>>,
    closed: AtomicBool,
}

impl ReportStream for HidReportStream {
    fn read_report(&self, buf: &mut [u8]) -> io::Result<usize> {
        loop {
            if self.closed.load(Ordering::Acquire) {
                return Err(io::Error::new(io::ErrorKind::NotConnected, "stream closed"));
            }
            let guard = self.device.lock();
            let Some(raw) = guard.as_ref() else {
                return Err(io::Error::new(io::ErrorKind::NotConnected, "stream closed"));
            };
            match raw.read_timeout(buf, READ_SLICE_MS) {
                Ok(0) => continue,
                Ok(n) => return Ok(n),
                Err(e) => return Err(io::Error::other(e.to_string())),
            }
        }
    }

    fn close(&self) {
        self.closed.store(true, Ordering::Release);
        // Waits out at most one read slice.
        self.device.lock().take();
    }

    fn is_readable(&self) -> bool {
        !self.closed.load(Ordering::Acquire)
    }
}
