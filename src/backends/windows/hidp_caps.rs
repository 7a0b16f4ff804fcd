#![cfg(target_os = "windows")]
//! Capability query through the Windows HID parser (HIDP).
//!
//! Opens a second, short-lived handle on the interface path, fetches the
//! preparsed data and reads the top-level `HIDP_CAPS`:
//! - `Usage` / `UsagePage` of the top-level collection
//! - `InputReportByteLength`, which includes the report id byte
//!
//! Both OS resources are released before returning.

use core::mem::MaybeUninit;
use std::ffi::OsStr;
use std::os::windows::ffi::OsStrExt;

use crate::device::Capabilities;
use crate::error::{Error, Result};

use windows_sys::Win32::Devices::HumanInterfaceDevice::{
    HidD_FreePreparsedData, HidD_GetPreparsedData, HidP_GetCaps, HIDP_CAPS, HIDP_STATUS_SUCCESS,
    PHIDP_PREPARSED_DATA,
};
use windows_sys::Win32::Foundation::{
    CloseHandle, GetLastError, GENERIC_READ, GENERIC_WRITE, HANDLE, INVALID_HANDLE_VALUE,
};
use windows_sys::Win32::Storage::FileSystem::{
    CreateFileW, FILE_ATTRIBUTE_NORMAL, FILE_SHARE_READ, FILE_SHARE_WRITE, OPEN_EXISTING,
};

/// Owns the device handle and preparsed data for the duration of a query.
struct HidpHandle {
    handle: HANDLE,
    ppd: PHIDP_PREPARSED_DATA,
}

impl Drop for HidpHandle {
    fn drop(&mut self) {
        unsafe {
            if self.ppd != 0 {
                HidD_FreePreparsedData(self.ppd);
            }
            if !self.handle.is_null() {
                CloseHandle(self.handle);
            }
        }
    }
}

/// Read the top-level capabilities of the HID interface at `path`.
pub fn query_caps(path: &str) -> Result<Capabilities> {
    let handle = open_device_handle(path)
        .map_err(|code| Error::Backend(format!("CreateFileW failed ({code}) for {path}")))?;
    let mut guard = HidpHandle { handle, ppd: 0 };

    let ok = unsafe { HidD_GetPreparsedData(guard.handle, &mut guard.ppd) };
    if ok == 0 || guard.ppd == 0 {
        return Err(Error::Backend(format!("HidD_GetPreparsedData failed for {path}")));
    }

    let mut caps = MaybeUninit::<HIDP_CAPS>::uninit();
    let status = unsafe { HidP_GetCaps(guard.ppd, caps.as_mut_ptr()) };
    if status != HIDP_STATUS_SUCCESS {
        return Err(Error::Backend(format!(
            "HidP_GetCaps returned 0x{status:08x} for {path}"
        )));
    }
    let caps = unsafe { caps.assume_init() };

    Ok(Capabilities {
        usage: caps.Usage,
        usage_page: caps.UsagePage,
        input_report_len: caps.InputReportByteLength,
    })
}

/// Open a Windows file handle for a HID interface path.
///
/// Falls back to read-only access when the device refuses write sharing.
/// Returns `Err(GetLastError())` on failure.
fn open_device_handle(path: &str) -> std::result::Result<HANDLE, u32> {
    use std::ptr::{null, null_mut};

    let wide: Vec<u16> = OsStr::new(path)
        .encode_wide()
        .chain(std::iter::once(0))
        .collect();

    let try_open = |access: u32| unsafe {
        CreateFileW(
            wide.as_ptr(),
            access,
            FILE_SHARE_READ | FILE_SHARE_WRITE,
            null(),
            OPEN_EXISTING,
            FILE_ATTRIBUTE_NORMAL,
            null_mut(),
        )
    };

    let mut handle = try_open(GENERIC_READ | GENERIC_WRITE);
    if handle == INVALID_HANDLE_VALUE {
        handle = try_open(GENERIC_READ);
    }

    if handle == INVALID_HANDLE_VALUE {
        Err(unsafe { GetLastError() })
    } else {
        Ok(handle)
    }
}
