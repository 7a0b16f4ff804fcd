//! Runtime configuration.
//!
//! ```toml
//! dead_zone = 0.2          # stick travel needed for the digital stick bits, [0, 1]
//! poll_interval_ms = 2000  # hot-plug re-enumeration period
//! ```
//!
//! Every field is optional. Out-of-range values are normalized on load rather
//! than rejected.

use crate::error::Result;
use serde::{Deserialize, Serialize};
use std::path::Path;
use std::sync::atomic::{AtomicU32, Ordering};
use std::sync::Arc;
use std::time::Duration;
use tracing::debug;

pub const DEFAULT_DEAD_ZONE: f32 = 0.15;
pub const DEFAULT_POLL_INTERVAL_MS: u64 = 2000;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    pub dead_zone: f32,
    pub poll_interval_ms: u64,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            dead_zone: DEFAULT_DEAD_ZONE,
            poll_interval_ms: DEFAULT_POLL_INTERVAL_MS,
        }
    }
}

impl Config {
    pub fn from_toml_str(s: &str) -> Result<Self> {
        let cfg: Config = toml::from_str(s)?;
        Ok(cfg.normalized())
    }

    pub fn load(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        let text = std::fs::read_to_string(path)?;
        let cfg = Self::from_toml_str(&text)?;
        debug!(path = %path.display(), ?cfg, "loaded config");
        Ok(cfg)
    }

    /// Clamp the dead zone and keep the poll interval non-zero.
    pub fn normalized(mut self) -> Self {
        self.dead_zone = clamp_dead_zone(self.dead_zone);
        self.poll_interval_ms = self.poll_interval_ms.max(1);
        self
    }

    pub fn poll_interval(&self) -> Duration {
        Duration::from_millis(self.poll_interval_ms)
    }
}

fn clamp_dead_zone(value: f32) -> f32 {
    if value.is_nan() {
        DEFAULT_DEAD_ZONE
    } else {
        value.clamp(0.0, 1.0)
    }
}

/// Dead-zone threshold shared by every controller's read loop.
///
/// Stored as the bit pattern of an `f32` so a change made on the host thread
/// is seen by the next decode on any controller.
#[derive(Debug, Clone)]
pub struct DeadZone(Arc<AtomicU32>);

impl DeadZone {
    pub fn new(value: f32) -> Self {
        Self(Arc::new(AtomicU32::new(clamp_dead_zone(value).to_bits())))
    }

    #[inline]
    pub fn get(&self) -> f32 {
        f32::from_bits(self.0.load(Ordering::Relaxed))
    }

    /// Store `value` clamped to `[0, 1]`; NaN resets to the default.
    pub fn set(&self, value: f32) -> f32 {
        let v = clamp_dead_zone(value);
        self.0.store(v.to_bits(), Ordering::Relaxed);
        v
    }
}

impl Default for DeadZone {
    fn default() -> Self {
        Self::new(DEFAULT_DEAD_ZONE)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::Error;

    #[test]
    fn empty_toml_gives_defaults() {
        let cfg = Config::from_toml_str("").unwrap();
        assert_eq!(cfg, Config::default());
        assert_eq!(cfg.poll_interval(), Duration::from_millis(2000));
    }

    #[test]
    fn values_are_normalized() {
        let cfg = Config::from_toml_str("dead_zone = 1.5\npoll_interval_ms = 0").unwrap();
        assert_eq!(cfg.dead_zone, 1.0);
        assert_eq!(cfg.poll_interval_ms, 1);

        let cfg = Config::from_toml_str("dead_zone = -0.3").unwrap();
        assert_eq!(cfg.dead_zone, 0.0);
        assert_eq!(cfg.poll_interval_ms, DEFAULT_POLL_INTERVAL_MS);
    }

    #[test]
    fn malformed_toml_is_a_config_error() {
        let err = Config::from_toml_str("dead_zone = \"wide\"").unwrap_err();
        assert!(matches!(err, Error::Config(_)));
    }

    #[test]
    fn load_missing_file_is_io_error() {
        let err = Config::load("/definitely/not/here.toml").unwrap_err();
        assert!(matches!(err, Error::Io(_)));
    }

    #[test]
    fn dead_zone_clamps_on_assignment() {
        let dz = DeadZone::default();
        assert_eq!(dz.get(), DEFAULT_DEAD_ZONE);
        assert_eq!(dz.set(2.0), 1.0);
        assert_eq!(dz.get(), 1.0);
        assert_eq!(dz.set(-1.0), 0.0);
        assert_eq!(dz.set(f32::NAN), DEFAULT_DEAD_ZONE);

        let shared = dz.clone();
        dz.set(0.4);
        assert_eq!(shared.get(), 0.4);
    }
}
