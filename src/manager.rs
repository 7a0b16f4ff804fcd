//! Controller manager.
//!
//! [`Manager`] is the host-facing façade. It owns the registry shared with the
//! discovery and read-loop threads and answers every per-slot query.
//!
//! Typical frame loop:
//! ```no_run
//! use ps4pad::{Buttons, Config, Manager};
//! # fn main() -> ps4pad::Result<()> {
//! let mgr = Manager::new(ps4pad::backends::HidApiBackend::new()?, Config::default());
//! mgr.initialize()?;
//! loop {
//!     if mgr.was_pressed(0, Buttons::FACE1) {
//!         println!("jump");
//!     }
//!     mgr.reset_all();
//!     std::thread::sleep(std::time::Duration::from_millis(16));
//! }
//! # }
//! ```

use crate::buttons::{Analog, Axis, Buttons, Trigger};
use crate::config::{Config, DeadZone};
use crate::device::DeviceBackend;
use crate::error::{Error, Result};
use crate::eventbus::{ControllerListener, EventFilter};
use crate::metadata::ControllerInfo;
use crate::registry::Shared;
use crate::report::ControllerModel;
use crate::snapshot::Snapshot;
use crossbeam_channel::{select, Sender};
use parking_lot::Mutex;
use std::sync::Arc;
use std::thread::JoinHandle;
use tracing::{debug, info, warn};

/// Discovery thread handle. Dropping `stop` ends the thread.
struct Poller {
    stop: Sender<()>,
    thread: JoinHandle<()>,
}

pub struct Manager<B: DeviceBackend> {
    backend: Arc<B>,
    shared: Arc<Shared>,
    config: Config,
    poller: Mutex<Option<Poller>>,
}

impl<B: DeviceBackend> Manager<B> {
    pub fn new(backend: B, config: Config) -> Self {
        let config = config.normalized();
        let shared = Shared::new(ControllerModel::DualShock4, DeadZone::new(config.dead_zone));
        Self {
            backend: Arc::new(backend),
            shared: Arc::new(shared),
            config,
            poller: Mutex::new(None),
        }
    }

    pub fn config(&self) -> &Config {
        &self.config
    }

    pub fn backend(&self) -> &B {
        &self.backend
    }

    /// Run one discovery pass now and start hot-plug polling.
    ///
    /// A failed first enumeration is logged and retried by the timer. Calling
    /// this again while polling is running does nothing.
    pub fn initialize(&self) -> Result<()> {
        let mut poller = self.poller.lock();
        if poller.is_some() {
            debug!("already initialized");
            return Ok(());
        }

        match self.shared.poll_once(&*self.backend) {
            Ok(n) => info!(connected = n, "initial discovery complete"),
            Err(e) => warn!(error = %e, "initial enumeration failed"),
        }

        let (stop, stopped) = crossbeam_channel::bounded::<()>(0);
        let ticker = crossbeam_channel::tick(self.config.poll_interval());
        let shared = Arc::clone(&self.shared);
        let backend = Arc::clone(&self.backend);

        let thread = std::thread::Builder::new()
            .name("ps4pad-discovery".into())
            .spawn(move || loop {
                select! {
                    recv(stopped) -> _ => break,
                    recv(ticker) -> _ => match shared.poll_once(&*backend) {
                        Ok(0) => {}
                        Ok(n) => debug!(connected = n, "hot-plug poll"),
                        Err(e) => warn!(error = %e, "enumeration failed, retrying next tick"),
                    },
                }
            })
            .map_err(|e| {
                warn!(error = %e, "could not spawn discovery thread");
                Error::ThreadSpawn("discovery")
            })?;

        info!(interval_ms = self.config.poll_interval_ms, "hot-plug polling started");
        *poller = Some(Poller { stop, thread });
        Ok(())
    }

    /// One discovery pass on the calling thread. Returns how many controllers
    /// connected.
    pub fn poll_once(&self) -> Result<usize> {
        self.shared.poll_once(&*self.backend)
    }

    /// Frame boundary for every controller: `previous ← current`,
    /// `current ← everything seen since the last call`.
    pub fn reset_all(&self) {
        self.shared.reset_all();
    }

    pub fn is_connected(&self, slot: usize) -> bool {
        self.shared.with_session(slot, |s| s.is_active()).unwrap_or(false)
    }

    pub fn connected_count(&self) -> usize {
        self.shared.state.lock().slots.len()
    }

    pub fn is_down(&self, slot: usize, button: Buttons) -> bool {
        self.shared
            .with_session(slot, |s| s.frame().is_down(button))
            .unwrap_or(false)
    }

    /// Answers from the most recent report instead of the current frame.
    pub fn is_live_down(&self, slot: usize, button: Buttons) -> bool {
        self.shared
            .with_session(slot, |s| s.frame().is_live_down(button))
            .unwrap_or(false)
    }

    pub fn was_pressed(&self, slot: usize, button: Buttons) -> bool {
        self.shared
            .with_session(slot, |s| s.frame().was_pressed(button))
            .unwrap_or(false)
    }

    pub fn was_released(&self, slot: usize, button: Buttons) -> bool {
        self.shared
            .with_session(slot, |s| s.frame().was_released(button))
            .unwrap_or(false)
    }

    pub fn axis(&self, slot: usize, axis: Axis) -> Option<f32> {
        self.shared.with_session(slot, |s| s.axes().axis(axis))
    }

    pub fn trigger(&self, slot: usize, trigger: Trigger) -> Option<u8> {
        self.shared.with_session(slot, |s| s.axes().trigger(trigger))
    }

    /// Look up an analog control by id (`lx`, `ly`, `rx`, `ry`, `l2`, `r2`).
    ///
    /// Triggers are scaled to `[0, 1]`.
    pub fn analog(&self, slot: usize, name: &str) -> Result<Option<f32>> {
        let analog: Analog = name.parse()?;
        Ok(self.shared.with_session(slot, |s| s.axes().analog(analog)))
    }

    pub fn snapshot(&self) -> Snapshot {
        Snapshot(
            self.shared
                .sessions()
                .iter()
                .map(|s| (s.slot(), s.pad_state()))
                .collect(),
        )
    }

    pub fn controllers(&self) -> Vec<ControllerInfo> {
        self.shared.sessions().iter().map(|s| s.info()).collect()
    }

    pub fn controller(&self, slot: usize) -> Option<ControllerInfo> {
        self.shared.with_session(slot, |s| s.info())
    }

    /// Disconnect one controller. Its device is not picked up again until it
    /// disappears from enumeration.
    pub fn close(&self, slot: usize) -> bool {
        self.shared.close(slot)
    }

    pub fn dead_zone(&self) -> f32 {
        self.shared.dead_zone.get()
    }

    /// Clamped to `[0, 1]`; returns the stored value.
    pub fn set_dead_zone(&self, value: f32) -> f32 {
        let v = self.shared.dead_zone.set(value);
        debug!(dead_zone = v, "dead zone changed");
        v
    }

    /// Register a listener for every connect/disconnect.
    ///
    /// Listeners run on the thread that detected the change (the discovery
    /// thread, a read-loop thread, or the caller of `poll_once`/`close`), with
    /// no manager lock held.
    ///
    /// From inside `on_event` it is fine to query state, call
    /// [`close`](Self::close), [`poll_once`](Self::poll_once) and
    /// [`set_dead_zone`](Self::set_dead_zone), and to subscribe, unsubscribe or
    /// toggle listeners. Events raised that way are delivered after the current
    /// callback chain returns. A listener subscribed during delivery first
    /// hears the next event.
    ///
    /// Do not call [`initialize`](Self::initialize) or
    /// [`shutdown`](Self::shutdown), and do not drop the last handle to the
    /// manager, from a listener: those wait on the discovery thread, which may
    /// be the one running the callback.
    pub fn subscribe(&self, listener: impl ControllerListener + 'static) -> u64 {
        self.subscribe_filtered(listener, EventFilter::All, None)
    }

    pub fn subscribe_filtered(
        &self,
        listener: impl ControllerListener + 'static,
        filter: EventFilter,
        slot: Option<usize>,
    ) -> u64 {
        self.shared.bus.lock().add_listener(listener, filter, slot)
    }

    pub fn unsubscribe(&self, id: u64) -> bool {
        self.shared.bus.lock().remove_listener(id)
    }

    pub fn set_listener_enabled(&self, id: u64, enabled: bool) {
        let mut bus = self.shared.bus.lock();
        if enabled {
            bus.enable(id);
        } else {
            bus.disable(id);
        }
    }

    /// Stop polling and disconnect every controller.
    ///
    /// Listeners still receive the `Disconnected` events. Safe to call twice;
    /// a later [`initialize`](Self::initialize) starts over.
    pub fn shutdown(&self) {
        if let Some(Poller { stop, thread }) = self.poller.lock().take() {
            drop(stop);
            if thread.join().is_err() {
                warn!("discovery thread panicked");
            }
        }
        self.shared.close_all();
        debug!("manager shut down");
    }
}

impl<B: DeviceBackend> Drop for Manager<B> {
    fn drop(&mut self) {
        self.shutdown();
    }
}
