//! Owned, per-frame views of controller state.
//!
//! [`AxisState`] is the analog half of one decoded report. [`Snapshot`] is an
//! **owned**, read-only copy of every connected controller's frame state,
//! produced by [`Manager::snapshot`](crate::manager::Manager::snapshot) and
//! cheap to clone for fan-out to multiple consumers.
//!
//! # Semantics
//! - Keys are slot indices.
//! - Button masks are the frame-boundary view (`current` / `previous`) plus the
//!   latest decode (`live`).
//! - Axes are the latest decoded values; they are not frame-sampled.
//! - A snapshot never changes. Take a new one after the next `reset_all()`.

use crate::buttons::{Analog, Axis, Buttons, Trigger};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

/// Analog values from one input report.
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
pub struct AxisState {
    pub left_x: f32,
    pub left_y: f32,
    pub right_x: f32,
    pub right_y: f32,
    pub left_trigger: u8,
    pub right_trigger: u8,
}

impl AxisState {
    /// Stick value in `[-1, 1]`.
    pub fn axis(&self, axis: Axis) -> f32 {
        match axis {
            Axis::LeftX => self.left_x,
            Axis::LeftY => self.left_y,
            Axis::RightX => self.right_x,
            Axis::RightY => self.right_y,
        }
    }

    /// Raw trigger travel, `0..=255`.
    pub fn trigger(&self, trigger: Trigger) -> u8 {
        match trigger {
            Trigger::Left => self.left_trigger,
            Trigger::Right => self.right_trigger,
        }
    }

    /// Any analog channel as `f32`. Triggers are scaled to `[0, 1]`.
    pub fn analog(&self, analog: Analog) -> f32 {
        match analog {
            Analog::Axis(a) => self.axis(a),
            Analog::Trigger(t) => self.trigger(t) as f32 / u8::MAX as f32,
        }
    }
}

/// Frame view of one controller.
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
pub struct PadState {
    pub current: Buttons,
    pub previous: Buttons,
    pub live: Buttons,
    pub axes: AxisState,
}

impl PadState {
    #[inline]
    pub fn is_down(&self, button: Buttons) -> bool {
        self.current.contains(button)
    }

    #[inline]
    pub fn was_pressed(&self, button: Buttons) -> bool {
        self.current.contains(button) && !self.previous.contains(button)
    }

    #[inline]
    pub fn was_released(&self, button: Buttons) -> bool {
        !self.current.contains(button) && self.previous.contains(button)
    }
}

/// Owned snapshot of all connected controllers (`slot → PadState`).
#[derive(Clone, Debug, Default, Serialize, Deserialize)]
pub struct Snapshot(pub BTreeMap<usize, PadState>);

impl Snapshot {
    /// Get the state for a specific slot.
    #[inline]
    pub fn get(&self, slot: usize) -> Option<&PadState> {
        self.0.get(&slot)
    }

    /// Iterate `(slot, state)` pairs in slot order.
    #[inline]
    pub fn iter(&self) -> impl Iterator<Item = (&usize, &PadState)> {
        self.0.iter()
    }

    #[inline]
    pub fn len(&self) -> usize {
        self.0.len()
    }

    #[inline]
    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }
}
