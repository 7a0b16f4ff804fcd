//! Per-controller input state store.
//!
//! [`FrameState`] is shared between exactly two parties: the controller's read
//! loop, which calls [`FrameState::record`] after every decoded report, and the
//! host's update thread, which calls [`FrameState::reset`] once per frame and
//! queries. Button masks are atomics so the handoff is a plain
//! single-writer/single-reader exchange; the analog values sit behind a short
//! lock that is only held to copy them.
//!
//! Frame semantics:
//! - `accumulator` is the OR of every report decoded since the last frame
//!   boundary, so a press and release inside one frame still shows up as
//!   "down" for that frame.
//! - `reset` moves `current` to `previous` and the drained accumulator to
//!   `current`.
//! - `live` is the mask of the most recent report and is never cleared by
//!   `reset`.

use crate::buttons::Buttons;
use crate::report::DecodedReport;
use crate::snapshot::{AxisState, PadState};
use parking_lot::Mutex;
use std::sync::atomic::{AtomicU32, Ordering};

#[derive(Debug, Default)]
pub struct FrameState {
    current: AtomicU32,
    previous: AtomicU32,
    accumulator: AtomicU32,
    live: AtomicU32,
    axes: Mutex<AxisState>,
}

impl FrameState {
    pub fn new() -> Self {
        Self::default()
    }

    /// Publish one decoded report. Read-loop side.
    pub fn record(&self, report: &DecodedReport) {
        let bits = report.buttons.bits();
        *self.axes.lock() = report.axes;
        self.live.store(bits, Ordering::Release);
        self.accumulator.fetch_or(bits, Ordering::AcqRel);
    }

    /// Advance one frame. Host side.
    ///
    /// Without an intervening `record`, a second call leaves `current` empty
    /// and `previous` equal to the old `current`.
    pub fn reset(&self) {
        let drained = self.accumulator.swap(0, Ordering::AcqRel);
        let current = self.current.swap(drained, Ordering::AcqRel);
        self.previous.store(current, Ordering::Release);
    }

    #[inline]
    pub fn current(&self) -> Buttons {
        Buttons::from_bits_retain(self.current.load(Ordering::Acquire))
    }

    #[inline]
    pub fn previous(&self) -> Buttons {
        Buttons::from_bits_retain(self.previous.load(Ordering::Acquire))
    }

    /// Mask of the most recently decoded report.
    #[inline]
    pub fn live(&self) -> Buttons {
        Buttons::from_bits_retain(self.live.load(Ordering::Acquire))
    }

    /// Everything seen since the last frame boundary.
    #[inline]
    pub fn accumulated(&self) -> Buttons {
        Buttons::from_bits_retain(self.accumulator.load(Ordering::Acquire))
    }

    pub fn axes(&self) -> AxisState {
        *self.axes.lock()
    }

    pub fn is_down(&self, button: Buttons) -> bool {
        self.current().contains(button)
    }

    pub fn is_live_down(&self, button: Buttons) -> bool {
        self.live().contains(button)
    }

    pub fn was_pressed(&self, button: Buttons) -> bool {
        self.current().contains(button) && !self.previous().contains(button)
    }

    pub fn was_released(&self, button: Buttons) -> bool {
        !self.current().contains(button) && self.previous().contains(button)
    }

    pub fn pad_state(&self) -> PadState {
        PadState {
            current: self.current(),
            previous: self.previous(),
            live: self.live(),
            axes: self.axes(),
        }
    }
}
