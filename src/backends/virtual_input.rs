//! In-memory backend for tests and demos.
//!
//! [`VirtualBackend::plug`] adds a device and returns a [`VirtualPad`] used to
//! feed it raw input reports. Dropping or unplugging the pad makes every open
//! stream fail, which the registry sees as a removal.

use crate::device::{
    Capabilities, DeviceBackend, DeviceDescriptor, DeviceHandle, DeviceKind, ReportStream,
};
use crate::error::{Error, Result};
use crossbeam_channel::{Receiver, RecvTimeoutError, Sender};
use parking_lot::Mutex;
use std::io;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::time::Duration;

const PRODUCT: &str = "Wireless Controller";
const REPORT_LEN: u16 = 64;

/// How long one blocking read waits before re-checking the closed flag.
const READ_SLICE: Duration = Duration::from_millis(20);

/// A 64-byte report with centered sticks, neutral D-pad and nothing pressed.
pub fn neutral_report() -> [u8; 64] {
    let mut r = [0u8; 64];
    r[0] = 0x01;
    r[1..5].fill(0x80);
    r[5] = 0x08;
    r
}

struct Entry {
    handle: DeviceHandle,
    kind: DeviceKind,
    product: String,
    report_len: u16,
    reports: Receiver<Vec<u8>>,
    closed: Arc<AtomicBool>,
}

#[derive(Default)]
struct Inner {
    devices: Vec<Entry>,
    fail_enumeration: bool,
    opens: usize,
}

#[derive(Clone, Default)]
pub struct VirtualBackend {
    inner: Arc<Mutex<Inner>>,
}

impl VirtualBackend {
    pub fn new() -> Self {
        Self::default()
    }

    /// Plug in a well-formed controller.
    pub fn plug(&self, handle: &str) -> VirtualPad {
        self.plug_with(handle, PRODUCT, REPORT_LEN)
    }

    /// Plug in a HID device with an arbitrary product string and report length.
    pub fn plug_with(&self, handle: &str, product: &str, report_len: u16) -> VirtualPad {
        self.insert(handle, DeviceKind::Hid, product, report_len)
    }

    /// Plug in a non-HID device (mouse, keyboard).
    pub fn plug_kind(&self, handle: &str, kind: DeviceKind) -> VirtualPad {
        self.insert(handle, kind, PRODUCT, REPORT_LEN)
    }

    fn insert(&self, handle: &str, kind: DeviceKind, product: &str, report_len: u16) -> VirtualPad {
        let (tx, rx) = crossbeam_channel::unbounded();
        let closed = Arc::new(AtomicBool::new(false));
        let handle = DeviceHandle::from(handle);
        self.inner.lock().devices.push(Entry {
            handle: handle.clone(),
            kind,
            product: product.to_string(),
            report_len,
            reports: rx,
            closed: Arc::clone(&closed),
        });
        VirtualPad {
            handle,
            reports: tx,
            closed,
            backend: Arc::clone(&self.inner),
        }
    }

    /// Make every following [`enumerate`](DeviceBackend::enumerate) fail.
    pub fn fail_enumeration(&self, fail: bool) {
        self.inner.lock().fail_enumeration = fail;
    }

    /// Number of `open` calls so far.
    pub fn open_count(&self) -> usize {
        self.inner.lock().opens
    }
}

impl DeviceBackend for VirtualBackend {
    type Stream = VirtualStream;

    fn enumerate(&self) -> Result<Vec<DeviceDescriptor>> {
        let inner = self.inner.lock();
        if inner.fail_enumeration {
            return Err(Error::Backend("virtual enumeration failure".into()));
        }
        Ok(inner
            .devices
            .iter()
            .map(|e| DeviceDescriptor::new(e.handle.clone(), e.kind))
            .collect())
    }

    fn open(&self, device: &DeviceDescriptor) -> Result<(VirtualStream, Capabilities)> {
        let mut inner = self.inner.lock();
        inner.opens += 1;
        let entry = inner
            .devices
            .iter()
            .find(|e| e.handle == device.handle)
            .ok_or_else(|| Error::Backend(format!("no virtual device {}", device.handle)))?;

        let stream = VirtualStream {
            product: entry.product.clone(),
            reports: entry.reports.clone(),
            closed: Arc::clone(&entry.closed),
        };
        let caps = Capabilities {
            usage: 0x05,
            usage_page: 0x01,
            input_report_len: entry.report_len,
        };
        Ok((stream, caps))
    }

    fn product_string(&self, stream: &VirtualStream) -> Result<String> {
        Ok(stream.product.clone())
    }
}

/// Host-side handle of a plugged virtual device.
pub struct VirtualPad {
    handle: DeviceHandle,
    reports: Sender<Vec<u8>>,
    closed: Arc<AtomicBool>,
    backend: Arc<Mutex<Inner>>,
}

impl VirtualPad {
    pub fn handle(&self) -> &DeviceHandle {
        &self.handle
    }

    /// Queue one raw report. `false` once a reader closed the device.
    pub fn send(&self, report: &[u8]) -> bool {
        !self.is_closed() && self.reports.send(report.to_vec()).is_ok()
    }

    /// `true` after any stream opened on this device was closed.
    pub fn is_closed(&self) -> bool {
        self.closed.load(Ordering::Acquire)
    }

    /// Remove the device from enumeration and fail its open streams.
    pub fn unplug(self) {
        self.backend
            .lock()
            .devices
            .retain(|e| !Arc::ptr_eq(&e.closed, &self.closed));
    }
}

pub struct VirtualStream {
    product: String,
    reports: Receiver<Vec<u8>>,
    closed: Arc<AtomicBool>,
}

impl ReportStream for VirtualStream {
    fn read_report(&self, buf: &mut [u8]) -> io::Result<usize> {
        loop {
            if self.closed.load(Ordering::Acquire) {
                return Err(io::Error::new(io::ErrorKind::NotConnected, "stream closed"));
            }
            match self.reports.recv_timeout(READ_SLICE) {
                Ok(report) => {
                    let n = report.len().min(buf.len());
                    buf[..n].copy_from_slice(&report[..n]);
                    return Ok(n);
                }
                Err(RecvTimeoutError::Timeout) => continue,
                Err(RecvTimeoutError::Disconnected) => {
                    return Err(io::Error::new(io::ErrorKind::BrokenPipe, "device unplugged"))
                }
            }
        }
    }

    fn close(&self) {
        self.closed.store(true, Ordering::Release);
    }

    fn is_readable(&self) -> bool {
        !self.closed.load(Ordering::Acquire)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn reads_what_the_pad_sends() {
        let backend = VirtualBackend::new();
        let pad = backend.plug("v0");
        let d = backend.enumerate().unwrap().remove(0);
        let (stream, caps) = backend.open(&d).unwrap();
        assert_eq!(caps.input_report_len, 64);
        assert_eq!(backend.product_string(&stream).unwrap(), PRODUCT);

        assert!(pad.send(&neutral_report()));
        let mut buf = [0u8; 64];
        assert_eq!(stream.read_report(&mut buf).unwrap(), 64);
        assert_eq!(buf, neutral_report());
    }

    #[test]
    fn unplug_fails_reads_and_hides_device() {
        let backend = VirtualBackend::new();
        let pad = backend.plug("v0");
        let d = backend.enumerate().unwrap().remove(0);
        let (stream, _) = backend.open(&d).unwrap();

        pad.unplug();
        let mut buf = [0u8; 64];
        assert!(stream.read_report(&mut buf).is_err());
        assert!(backend.enumerate().unwrap().is_empty());
        assert!(backend.open(&d).is_err());
    }

    #[test]
    fn close_is_seen_by_pad() {
        let backend = VirtualBackend::new();
        let pad = backend.plug("v0");
        let d = backend.enumerate().unwrap().remove(0);
        let (stream, _) = backend.open(&d).unwrap();

        stream.close();
        assert!(!stream.is_readable());
        assert!(pad.is_closed());
        assert!(!pad.send(&neutral_report()));
        assert!(stream.read_report(&mut [0u8; 64]).is_err());
    }
}
