mod common;

use common::{manual_manager, wait_until};
use ps4pad::backends::virtual_input::neutral_report;
use ps4pad::backends::VirtualBackend;
use ps4pad::{Axis, Buttons, Trigger};
use std::time::Duration;

const CROSS: u8 = 0x20;
const DPAD_NEUTRAL: u8 = 0x08;

#[test]
fn reference_report_reaches_the_frame() {
    let backend = VirtualBackend::new();
    let mgr = manual_manager(&backend);
    let pad = backend.plug("a");
    mgr.poll_once().unwrap();

    let mut r = neutral_report();
    r[5] = 0x20;
    r[6] = 0x30;
    pad.send(&r);
    assert!(wait_until(|| mgr.is_live_down(0, Buttons::FACE1)));

    // Nothing is visible in `current` until the frame boundary.
    assert!(!mgr.is_down(0, Buttons::FACE1));
    mgr.reset_all();

    let expected = Buttons::DPAD_UP | Buttons::FACE1 | Buttons::SELECT | Buttons::START;
    let state = mgr.snapshot().get(0).copied().unwrap();
    assert_eq!(state.current, expected);
    assert!(mgr.was_pressed(0, Buttons::START));
    assert_eq!(mgr.axis(0, Axis::LeftX), Some(0.0));
    assert_eq!(mgr.axis(0, Axis::RightY), Some(0.0));
    assert_eq!(mgr.trigger(0, Trigger::Left), Some(0));
    assert_eq!(mgr.analog(0, "r2").unwrap(), Some(0.0));
}

#[test]
fn press_and_release_inside_one_frame_still_counts() {
    let backend = VirtualBackend::new();
    let mgr = manual_manager(&backend);
    let pad = backend.plug("a");
    mgr.poll_once().unwrap();

    let mut down = neutral_report();
    down[5] = CROSS | DPAD_NEUTRAL;
    let up = neutral_report();
    pad.send(&down);
    pad.send(&up);
    pad.send(&up);
    std::thread::sleep(Duration::from_millis(50));
    assert!(wait_until(|| !mgr.is_live_down(0, Buttons::FACE1)));

    mgr.reset_all();
    assert!(mgr.is_down(0, Buttons::FACE1));
    assert!(mgr.was_pressed(0, Buttons::FACE1));

    mgr.reset_all();
    assert!(!mgr.is_down(0, Buttons::FACE1));
    assert!(mgr.was_released(0, Buttons::FACE1));
}

#[test]
fn reset_without_reports_empties_current() {
    let backend = VirtualBackend::new();
    let mgr = manual_manager(&backend);
    let pad = backend.plug("a");
    mgr.poll_once().unwrap();

    let mut r = neutral_report();
    r[6] = 0x01;
    pad.send(&r);
    assert!(wait_until(|| mgr.is_live_down(0, Buttons::LEFT_SHOULDER)));

    mgr.reset_all();
    let first = mgr.snapshot().get(0).copied().unwrap();
    mgr.reset_all();
    let second = mgr.snapshot().get(0).copied().unwrap();
    mgr.reset_all();
    let third = mgr.snapshot().get(0).copied().unwrap();

    assert_eq!(first.current, Buttons::LEFT_SHOULDER);
    assert!(second.current.is_empty());
    assert_eq!(second.previous, Buttons::LEFT_SHOULDER);
    assert!(third.current.is_empty() && third.previous.is_empty());
    // `live` is the latest report and survives frame boundaries.
    assert_eq!(third.live, Buttons::LEFT_SHOULDER);
}

#[test]
fn short_report_is_dropped_and_counted() {
    let backend = VirtualBackend::new();
    let mgr = manual_manager(&backend);
    let pad = backend.plug("a");
    mgr.poll_once().unwrap();

    let mut good = neutral_report();
    good[5] = CROSS | DPAD_NEUTRAL;
    pad.send(&good);
    assert!(wait_until(|| mgr.is_live_down(0, Buttons::FACE1)));

    pad.send(&[0x01; 10]);
    assert!(wait_until(|| mgr.controller(0).unwrap().malformed_reports == 1));
    assert!(mgr.is_connected(0));
    assert!(mgr.is_live_down(0, Buttons::FACE1));
    assert_eq!(mgr.axis(0, Axis::LeftX), Some(0.0));
}

#[test]
fn dead_zone_change_reaches_running_loops() {
    let backend = VirtualBackend::new();
    let mgr = manual_manager(&backend);
    let pad = backend.plug("a");
    mgr.poll_once().unwrap();

    // About 0.31 to the right.
    let mut r = neutral_report();
    r[1] = 168;
    pad.send(&r);
    assert!(wait_until(|| mgr.is_live_down(0, Buttons::LEFT_STICK_RIGHT)));

    mgr.set_dead_zone(0.5);
    r[2] = 0x80;
    pad.send(&r);
    assert!(wait_until(|| !mgr.is_live_down(0, Buttons::LEFT_STICK_RIGHT)));
    let lx = mgr.axis(0, Axis::LeftX).unwrap();
    assert!((lx - 40.0 / 127.0).abs() < 1e-6);
}

#[test]
fn controllers_are_independent() {
    let backend = VirtualBackend::new();
    let mgr = manual_manager(&backend);
    let a = backend.plug("a");
    let b = backend.plug("b");
    mgr.poll_once().unwrap();

    let mut r = neutral_report();
    r[7] = 0x02;
    r[9] = 200;
    b.send(&r);
    a.send(&neutral_report());
    assert!(wait_until(|| mgr.is_live_down(1, Buttons::TRACKPAD)));

    mgr.reset_all();
    assert!(mgr.is_down(1, Buttons::TRACKPAD));
    assert!(!mgr.is_down(0, Buttons::TRACKPAD));
    assert_eq!(mgr.trigger(1, Trigger::Right), Some(200));
    let info = mgr.controllers();
    assert_eq!(info.len(), 2);
    assert_eq!(info[1].product_string, "Wireless Controller");
}
