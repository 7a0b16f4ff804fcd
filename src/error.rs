//! Crate-wide error type.
//!
//! Most "failures" in this crate are not errors at all: a HID device that is
//! not a Wireless Controller is simply rejected, and a controller that is
//! unplugged becomes `Disconnected`. [`Error`] covers what remains: malformed
//! reports, caller misuse of the analog query surface, backend/OS failures
//! and configuration problems.

use thiserror::Error;

/// Errors produced by `ps4pad`.
#[derive(Debug, Error)]
pub enum Error {
    /// An input report was shorter than the controller's fixed report length.
    #[error("malformed input report: expected {expected} bytes, got {actual}")]
    Decode { expected: usize, actual: usize },

    /// An analog query named something that is not an axis or trigger of this controller.
    #[error("invalid analog input: {0:?}")]
    InvalidAnalog(String),

    /// The device backend (enumeration / open / string query) failed.
    #[error("device backend error: {0}")]
    Backend(String),

    #[error(transparent)]
    Io(#[from] std::io::Error),

    #[error("invalid configuration: {0}")]
    Config(#[from] toml::de::Error),

    /// A session's stream stopped being readable while the session was still active.
    #[error("controller {slot}: stream became unreadable while active")]
    StreamUnreadable { slot: usize },

    #[error("failed to spawn {0} thread")]
    ThreadSpawn(&'static str),
}

pub type Result<T> = std::result::Result<T, Error>;
