use ps4pad::backends::virtual_input::{neutral_report, VirtualBackend};
use ps4pad::{Axis, Buttons, Config, ControllerEvent, Manager};
use std::time::Duration;

fn main() -> ps4pad::Result<()> {
    let backend = VirtualBackend::new();
    let pad = backend.plug("virtual:demo");

    let mgr = Manager::new(backend, Config::default());
    mgr.subscribe(|e: &ControllerEvent| println!("(Virtual) {:?}", e.kind));
    mgr.initialize()?;

    // Cross pressed, left stick pushed fully right.
    let mut report = neutral_report();
    report[1] = 0xFF;
    report[5] = 0x28;
    pad.send(&report);
    std::thread::sleep(Duration::from_millis(50));

    mgr.reset_all();
    println!(
        "(Virtual) face1 pressed={} lx={:?} stick right={}",
        mgr.was_pressed(0, Buttons::FACE1),
        mgr.axis(0, Axis::LeftX),
        mgr.is_down(0, Buttons::LEFT_STICK_RIGHT)
    );

    pad.unplug();
    std::thread::sleep(Duration::from_millis(100));
    println!("(Virtual) connected after unplug: {}", mgr.is_connected(0));
    Ok(())
}
