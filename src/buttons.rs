//! Logical buttons and analog channels of the controller.
//!
//! [`Buttons`] is the button mask: one bit per logical button, combined with
//! `|`/`&` only. Analog channels are addressed with [`Axis`] and [`Trigger`],
//! or by their short control ids (`"lx"`, `"ly"`, `"rx"`, `"ry"`, `"l2"`,
//! `"r2"`) through [`Analog`].

use crate::error::Error;
use bitflags::bitflags;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

bitflags! {
    /// Set of logical controller buttons.
    ///
    /// The stick-direction bits are not on the wire; the decoder derives them
    /// from the axis values and the configured dead zone.
    #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
    #[repr(transparent)]
    pub struct Buttons: u32 {
        /// Cross.
        const FACE1 = 1 << 0;
        /// Square.
        const FACE2 = 1 << 1;
        /// Triangle.
        const FACE3 = 1 << 2;
        /// Circle.
        const FACE4 = 1 << 3;
        const DPAD_UP = 1 << 4;
        const DPAD_RIGHT = 1 << 5;
        const DPAD_DOWN = 1 << 6;
        const DPAD_LEFT = 1 << 7;
        const RIGHT_SHOULDER = 1 << 8;
        const LEFT_SHOULDER = 1 << 9;
        const RIGHT_TRIGGER = 1 << 10;
        const LEFT_TRIGGER = 1 << 11;
        const START = 1 << 12;
        const SELECT = 1 << 13;
        /// Right stick click.
        const RIGHT_STICK = 1 << 14;
        /// Left stick click.
        const LEFT_STICK = 1 << 15;
        const LEFT_STICK_UP = 1 << 16;
        const LEFT_STICK_LEFT = 1 << 17;
        const LEFT_STICK_DOWN = 1 << 18;
        const LEFT_STICK_RIGHT = 1 << 19;
        const RIGHT_STICK_UP = 1 << 20;
        const RIGHT_STICK_LEFT = 1 << 21;
        const RIGHT_STICK_DOWN = 1 << 22;
        const RIGHT_STICK_RIGHT = 1 << 23;
        /// The vendor ("PS") button.
        const SYMBOL = 1 << 24;
        /// Touchpad click.
        const TRACKPAD = 1 << 25;

        const DPAD = Self::DPAD_UP.bits()
            | Self::DPAD_RIGHT.bits()
            | Self::DPAD_DOWN.bits()
            | Self::DPAD_LEFT.bits();
    }
}

/// Analog stick axis.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Axis {
    LeftX,
    LeftY,
    RightX,
    RightY,
}

/// Analog trigger.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Trigger {
    Left,
    Right,
}

/// Any analog channel, addressable by control id.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Analog {
    Axis(Axis),
    Trigger(Trigger),
}

impl Analog {
    pub const ALL: [Analog; 6] = [
        Analog::Axis(Axis::LeftX),
        Analog::Axis(Axis::LeftY),
        Analog::Axis(Axis::RightX),
        Analog::Axis(Axis::RightY),
        Analog::Trigger(Trigger::Left),
        Analog::Trigger(Trigger::Right),
    ];

    /// Stable control id used in configs and logs.
    pub fn control_id(self) -> &'static str {
        match self {
            Analog::Axis(Axis::LeftX) => "lx",
            Analog::Axis(Axis::LeftY) => "ly",
            Analog::Axis(Axis::RightX) => "rx",
            Analog::Axis(Axis::RightY) => "ry",
            Analog::Trigger(Trigger::Left) => "l2",
            Analog::Trigger(Trigger::Right) => "r2",
        }
    }
}

impl fmt::Display for Analog {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.control_id())
    }
}

impl FromStr for Analog {
    type Err = Error;

    /// Parse a control id, case-insensitively.
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let id = s.trim().to_ascii_lowercase();
        Analog::ALL
            .into_iter()
            .find(|a| a.control_id() == id)
            .ok_or_else(|| Error::InvalidAnalog(s.to_string()))
    }
}

impl From<Axis> for Analog {
    fn from(axis: Axis) -> Self {
        Analog::Axis(axis)
    }
}

impl From<Trigger> for Analog {
    fn from(trigger: Trigger) -> Self {
        Analog::Trigger(trigger)
    }
}
