//! Input report decoding for the "Wireless Controller" pad.
//!
//! The controller emits a fixed 64-byte input report. Decoding is a pure
//! function of the report bytes and the stick dead zone:
//!
//! | Offset | Meaning |
//! |---|---|
//! | 0 | report id (ignored) |
//! | 1–4 | LX, LY, RX, RY (0..=255, 128 = centre) |
//! | 5 | low nibble: dpad (0..=7 clockwise from Up, 8 = neutral); high nibble: face buttons |
//! | 6 | L1, R1, L2, R2, Select, Start, L3, R3 (bit 0..=7) |
//! | 7 | bit 0: Symbol, bit 1: Trackpad |
//! | 8–9 | left / right trigger (0..=255) |

use crate::buttons::Buttons;
use crate::error::{Error, Result};
use crate::snapshot::AxisState;

/// Raw stick travel from centre to either end.
const AXIS_RANGE: f32 = 127.0;

/// Dpad nibble → asserted directions. Anything outside 0..=7 is neutral.
const DPAD_TABLE: [Buttons; 16] = [
    Buttons::DPAD_UP,
    Buttons::DPAD_UP.union(Buttons::DPAD_RIGHT),
    Buttons::DPAD_RIGHT,
    Buttons::DPAD_DOWN.union(Buttons::DPAD_RIGHT),
    Buttons::DPAD_DOWN,
    Buttons::DPAD_DOWN.union(Buttons::DPAD_LEFT),
    Buttons::DPAD_LEFT,
    Buttons::DPAD_UP.union(Buttons::DPAD_LEFT),
    Buttons::empty(),
    Buttons::empty(),
    Buttons::empty(),
    Buttons::empty(),
    Buttons::empty(),
    Buttons::empty(),
    Buttons::empty(),
    Buttons::empty(),
];

/// Byte 5, high nibble.
const FACE_BITS: [(u8, Buttons); 4] = [
    (0x10, Buttons::FACE2),
    (0x20, Buttons::FACE1),
    (0x40, Buttons::FACE4),
    (0x80, Buttons::FACE3),
];

/// Byte 6.
const SHOULDER_BITS: [(u8, Buttons); 8] = [
    (0x01, Buttons::LEFT_SHOULDER),
    (0x02, Buttons::RIGHT_SHOULDER),
    (0x04, Buttons::LEFT_TRIGGER),
    (0x08, Buttons::RIGHT_TRIGGER),
    (0x10, Buttons::SELECT),
    (0x20, Buttons::START),
    (0x40, Buttons::LEFT_STICK),
    (0x80, Buttons::RIGHT_STICK),
];

/// Byte 7.
const AUX_BITS: [(u8, Buttons); 2] = [(0x01, Buttons::SYMBOL), (0x02, Buttons::TRACKPAD)];

/// Supported controller models.
///
/// There is exactly one today; the enum is the seam where another report
/// shape would be added.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum ControllerModel {
    #[default]
    DualShock4,
}

impl ControllerModel {
    /// Product string the device must report, compared case-sensitively.
    pub fn product_string(self) -> &'static str {
        match self {
            ControllerModel::DualShock4 => "Wireless Controller",
        }
    }

    /// Input report length in bytes, including the report id byte.
    pub fn input_report_len(self) -> usize {
        match self {
            ControllerModel::DualShock4 => 64,
        }
    }

    pub fn decode(self, report: &[u8], dead_zone: f32) -> Result<DecodedReport> {
        match self {
            ControllerModel::DualShock4 => decode(report, dead_zone),
        }
    }
}

/// Result of decoding one input report.
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct DecodedReport {
    pub buttons: Buttons,
    pub axes: AxisState,
}

/// Map a raw stick byte to `[-1, 1]` (128 is centre).
#[inline]
pub fn normalize_axis(raw: u8) -> f32 {
    ((raw as f32 - 128.0) / AXIS_RANGE).clamp(-1.0, 1.0)
}

/// Directions asserted by a dpad nibble. Only the low 4 bits are looked at.
#[inline]
pub fn dpad_buttons(nibble: u8) -> Buttons {
    DPAD_TABLE[(nibble & 0x0F) as usize]
}

/// Digital directions of one stick. The threshold is inclusive.
fn stick_buttons(x: f32, y: f32, dead_zone: f32, [up, left, down, right]: [Buttons; 4]) -> Buttons {
    let mut out = Buttons::empty();
    out.set(left, x <= -dead_zone);
    out.set(right, x >= dead_zone);
    out.set(down, y <= -dead_zone);
    out.set(up, y >= dead_zone);
    out
}

fn bits(byte: u8, table: &[(u8, Buttons)]) -> Buttons {
    table
        .iter()
        .filter(|(mask, _)| byte & mask != 0)
        .fold(Buttons::empty(), |acc, (_, b)| acc | *b)
}

/// Decode a Wireless Controller input report.
///
/// `report` must hold at least 64 bytes; trailing bytes are ignored.
pub fn decode(report: &[u8], dead_zone: f32) -> Result<DecodedReport> {
    let expected = ControllerModel::DualShock4.input_report_len();
    if report.len() < expected {
        return Err(Error::Decode {
            expected,
            actual: report.len(),
        });
    }

    let axes = AxisState {
        left_x: normalize_axis(report[1]),
        left_y: normalize_axis(report[2]),
        right_x: normalize_axis(report[3]),
        right_y: normalize_axis(report[4]),
        left_trigger: report[8],
        right_trigger: report[9],
    };

    let mut buttons = dpad_buttons(report[5])
        | bits(report[5], &FACE_BITS)
        | bits(report[6], &SHOULDER_BITS)
        | bits(report[7], &AUX_BITS);

    buttons |= stick_buttons(
        axes.left_x,
        axes.left_y,
        dead_zone,
        [
            Buttons::LEFT_STICK_UP,
            Buttons::LEFT_STICK_LEFT,
            Buttons::LEFT_STICK_DOWN,
            Buttons::LEFT_STICK_RIGHT,
        ],
    );
    buttons |= stick_buttons(
        axes.right_x,
        axes.right_y,
        dead_zone,
        [
            Buttons::RIGHT_STICK_UP,
            Buttons::RIGHT_STICK_LEFT,
            Buttons::RIGHT_STICK_DOWN,
            Buttons::RIGHT_STICK_RIGHT,
        ],
    );

    Ok(DecodedReport { buttons, axes })
}

#[cfg(test)]
mod tests {
    use super::*;

    const DZ: f32 = 0.15;

    fn neutral() -> [u8; 64] {
        let mut r = [0u8; 64];
        r[0] = 0x01;
        r[1..5].fill(128);
        r[5] = 0x08;
        r
    }

    #[test]
    fn dpad_table_matches_clock_positions() {
        use Buttons as B;
        let expected = [
            B::DPAD_UP,
            B::DPAD_UP | B::DPAD_RIGHT,
            B::DPAD_RIGHT,
            B::DPAD_RIGHT | B::DPAD_DOWN,
            B::DPAD_DOWN,
            B::DPAD_DOWN | B::DPAD_LEFT,
            B::DPAD_LEFT,
            B::DPAD_LEFT | B::DPAD_UP,
        ];
        for nibble in 0u8..16 {
            let want = expected.get(nibble as usize).copied().unwrap_or(B::empty());
            assert_eq!(dpad_buttons(nibble), want, "nibble {nibble}");

            let mut r = neutral();
            r[5] = nibble;
            let got = decode(&r, DZ).unwrap().buttons & B::DPAD;
            assert_eq!(got, want, "decoded nibble {nibble}");
        }
    }

    #[test]
    fn dpad_ignores_face_nibble() {
        assert_eq!(dpad_buttons(0xF2), Buttons::DPAD_RIGHT);
        assert_eq!(dpad_buttons(0xF8), Buttons::empty());
    }

    #[test]
    fn axis_centre_and_extremes() {
        assert_eq!(normalize_axis(128), 0.0);
        assert_eq!(normalize_axis(255), 1.0);
        assert_eq!(normalize_axis(0), -1.0);
        assert!((normalize_axis(1) - (-1.0)).abs() < 1e-6);
        assert!((normalize_axis(192) - 64.0 / 127.0).abs() < 1e-6);
    }

    #[test]
    fn crafted_report_decodes_exactly() {
        let mut r = [0u8; 64];
        r[1..5].fill(128);
        r[5] = 0x20;
        r[6] = 0x30;

        let d = decode(&r, DZ).unwrap();
        assert_eq!(
            d.buttons,
            Buttons::DPAD_UP | Buttons::FACE1 | Buttons::SELECT | Buttons::START
        );
        assert_eq!(d.axes, AxisState::default());
        assert_eq!((d.axes.left_trigger, d.axes.right_trigger), (0, 0));
    }

    #[test]
    fn every_wire_bit_maps_to_one_button() {
        let cases: &[(usize, u8, Buttons)] = &[
            (5, 0x18, Buttons::FACE2),
            (5, 0x28, Buttons::FACE1),
            (5, 0x48, Buttons::FACE4),
            (5, 0x88, Buttons::FACE3),
            (6, 0x01, Buttons::LEFT_SHOULDER),
            (6, 0x02, Buttons::RIGHT_SHOULDER),
            (6, 0x04, Buttons::LEFT_TRIGGER),
            (6, 0x08, Buttons::RIGHT_TRIGGER),
            (6, 0x10, Buttons::SELECT),
            (6, 0x20, Buttons::START),
            (6, 0x40, Buttons::LEFT_STICK),
            (6, 0x80, Buttons::RIGHT_STICK),
            (7, 0x01, Buttons::SYMBOL),
            (7, 0x02, Buttons::TRACKPAD),
        ];
        for &(offset, value, button) in cases {
            let mut r = neutral();
            r[offset] = value;
            assert_eq!(decode(&r, DZ).unwrap().buttons, button, "byte {offset} = {value:#04x}");
        }
    }

    #[test]
    fn byte7_upper_bits_are_ignored() {
        let mut r = neutral();
        r[7] = 0xFC;
        assert_eq!(decode(&r, DZ).unwrap().buttons, Buttons::empty());
    }

    #[test]
    fn triggers_are_raw_and_independent_of_trigger_bits() {
        let mut r = neutral();
        r[8] = 200;
        r[9] = 7;
        let d = decode(&r, DZ).unwrap();
        assert_eq!((d.axes.left_trigger, d.axes.right_trigger), (200, 7));
        assert_eq!(d.buttons, Buttons::empty());
    }

    #[test]
    fn dead_zone_boundary_is_inclusive() {
        // 147 → 19/127; use that exact value as the threshold.
        let threshold = normalize_axis(147);
        let mut r = neutral();
        r[1] = 147;
        assert!(decode(&r, threshold).unwrap().buttons.contains(Buttons::LEFT_STICK_RIGHT));

        r[1] = 146;
        assert!(!decode(&r, threshold).unwrap().buttons.contains(Buttons::LEFT_STICK_RIGHT));

        // Negative side: 109 → -19/127.
        r[1] = 128;
        r[2] = 109;
        assert!(decode(&r, threshold).unwrap().buttons.contains(Buttons::LEFT_STICK_DOWN));
        r[2] = 110;
        assert!(!decode(&r, threshold).unwrap().buttons.contains(Buttons::LEFT_STICK_DOWN));
    }

    #[test]
    fn stick_directions_follow_sign() {
        let mut r = neutral();
        r[1] = 0; // LX full left
        r[2] = 255; // LY full positive
        r[3] = 255; // RX full right
        r[4] = 0; // RY full negative
        let b = decode(&r, DZ).unwrap().buttons;
        assert_eq!(
            b,
            Buttons::LEFT_STICK_LEFT
                | Buttons::LEFT_STICK_UP
                | Buttons::RIGHT_STICK_RIGHT
                | Buttons::RIGHT_STICK_DOWN
        );
    }

    #[test]
    fn zero_dead_zone_asserts_a_direction_at_centre() {
        // |0.0| >= 0.0 holds on both sides of each axis.
        let b = decode(&neutral(), 0.0).unwrap().buttons;
        assert!(b.contains(Buttons::LEFT_STICK_LEFT | Buttons::LEFT_STICK_RIGHT));
    }

    #[test]
    fn short_and_empty_reports_are_rejected() {
        for len in [0usize, 10, 63] {
            let r = vec![0u8; len];
            match decode(&r, DZ) {
                Err(Error::Decode { expected, actual }) => {
                    assert_eq!(expected, 64);
                    assert_eq!(actual, len);
                }
                other => panic!("expected decode error for {len} bytes, got {other:?}"),
            }
        }
    }

    #[test]
    fn longer_reports_decode_the_prefix() {
        let mut r = vec![0u8; 78];
        r[1..5].fill(128);
        r[5] = 0x08;
        r[7] = 0x01;
        assert_eq!(decode(&r, DZ).unwrap().buttons, Buttons::SYMBOL);
    }

    #[test]
    fn model_describes_the_wireless_controller() {
        let m = ControllerModel::default();
        assert_eq!(m.product_string(), "Wireless Controller");
        assert_eq!(m.input_report_len(), 64);
        assert_eq!(m.decode(&neutral(), DZ).unwrap(), decode(&neutral(), DZ).unwrap());
    }
}
