#![allow(dead_code)]

use ps4pad::backends::VirtualBackend;
use ps4pad::{Config, ControllerEvent, ControllerEventKind, Manager};
use std::sync::{Arc, Mutex};
use std::time::{Duration, Instant};

/// Poll `cond` until it holds or two seconds pass.
pub fn wait_until(mut cond: impl FnMut() -> bool) -> bool {
    let deadline = Instant::now() + Duration::from_secs(2);
    while Instant::now() < deadline {
        if cond() {
            return true;
        }
        std::thread::sleep(Duration::from_millis(2));
    }
    cond()
}

/// A manager that only polls when told to.
pub fn manual_manager(backend: &VirtualBackend) -> Manager<VirtualBackend> {
    Manager::new(backend.clone(), Config::default())
}

pub type EventLog = Arc<Mutex<Vec<ControllerEventKind>>>;

pub fn record_events(mgr: &Manager<VirtualBackend>) -> EventLog {
    let log: EventLog = Arc::default();
    let sink = Arc::clone(&log);
    mgr.subscribe(move |e: &ControllerEvent| sink.lock().unwrap().push(e.kind.clone()));
    log
}
