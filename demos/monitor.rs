use ps4pad::backends::HidApiBackend;
use ps4pad::logger::Logger;
use ps4pad::{Analog, Buttons, Config, Manager};
use std::time::Duration;
use tracing_subscriber::layer::SubscriberExt;
use tracing_subscriber::util::SubscriberInitExt;

const FRAME: Duration = Duration::from_millis(16);

fn init_logging() {
    let filter = tracing_subscriber::EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("info"));

    tracing_subscriber::registry()
        .with(filter)
        .with(tracing_subscriber::fmt::layer().with_target(false))
        .init();
}

fn main() -> ps4pad::Result<()> {
    init_logging();

    // Optional: path to a TOML config as the first argument.
    let config = match std::env::args().nth(1) {
        Some(path) => Config::load(path)?,
        None => Config::default(),
    };

    let mgr = Manager::new(HidApiBackend::new()?, config);
    mgr.subscribe(Logger::new());
    mgr.initialize()?;

    for info in mgr.controllers() {
        println!("- {info}");
    }

    loop {
        for (slot, pad) in mgr.snapshot().iter() {
            for (name, button) in Buttons::all().iter_names() {
                if pad.was_pressed(button) {
                    println!("#{slot} {name} pressed");
                }
                if pad.was_released(button) {
                    println!("#{slot} {name} released");
                }
            }
            if pad.was_pressed(Buttons::TRACKPAD) {
                let values: Vec<String> = Analog::ALL
                    .iter()
                    .map(|a| format!("{a}={:+.2}", pad.axes.analog(*a)))
                    .collect();
                println!("#{slot} {}", values.join(" "));
            }
        }

        mgr.reset_all();
        std::thread::sleep(FRAME);
    }
}
