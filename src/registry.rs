//! Controller registry: validation, slot table, seen-set and event fan-out.
//!
//! The slot table and the seen-set sit behind one lock so a discovery pass
//! and a read-loop teardown never observe each other half-done. Validation
//! (open, product query, capability check) runs with the lock released, and
//! events are emitted after it is dropped.
//!
//! Listeners are invoked with no registry lock held. An event raised from
//! inside a listener (a `close` in a `Connected` callback, say) is queued on
//! that thread and delivered once the current listener chain returns, so
//! every listener still sees events in the order they happened.

use crate::config::DeadZone;
use crate::device::{
    Capabilities, DeviceBackend, DeviceDescriptor, DeviceHandle, DeviceKind, ReportStream,
};
use crate::error::{Error, Result};
use crate::event::ControllerEvent;
use crate::eventbus::{deliver, EventBus, SharedListener};
use crate::report::ControllerModel;
use crate::session::Session;
use crate::slot::SlotTable;
use parking_lot::Mutex;
use std::cell::RefCell;
use std::collections::{HashSet, VecDeque};
use std::fmt;
use std::sync::Arc;
use tracing::{debug, trace, warn};

type Deferred = VecDeque<(Vec<SharedListener>, ControllerEvent)>;

thread_local! {
    /// `Some` while this thread is delivering events.
    static DEFERRED: RefCell<Option<Deferred>> = const { RefCell::new(None) };
}

/// Ends a delivery run on this thread, also when a listener panics.
struct DeliveryRun;

impl Drop for DeliveryRun {
    fn drop(&mut self) {
        DEFERRED.with(|cell| *cell.borrow_mut() = None);
    }
}

/// Lock-protected registry contents.
#[derive(Default)]
pub(crate) struct RegistryState {
    pub(crate) slots: SlotTable<Arc<Session>>,
    /// Handles already examined. Never re-validated while still enumerated.
    pub(crate) seen: HashSet<DeviceHandle>,
}

/// State shared between the host, the discovery thread and every read loop.
pub(crate) struct Shared {
    pub(crate) state: Mutex<RegistryState>,
    pub(crate) bus: Mutex<EventBus>,
    pub(crate) dead_zone: DeadZone,
    pub(crate) model: ControllerModel,
}

/// Why a device did not become a controller.
#[derive(Debug)]
pub(crate) enum Rejection {
    Open(Error),
    ProductQuery(Error),
    Product(String),
    ReportLength(u16),
}

impl fmt::Display for Rejection {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Rejection::Open(e) => write!(f, "open failed: {e}"),
            Rejection::ProductQuery(e) => write!(f, "product string unavailable: {e}"),
            Rejection::Product(p) => write!(f, "product string {p:?} does not match"),
            Rejection::ReportLength(n) => write!(f, "input report length {n} does not match"),
        }
    }
}

/// An opened device that passed every check.
pub(crate) struct Accepted<S> {
    pub(crate) stream: S,
    pub(crate) caps: Capabilities,
    pub(crate) product: String,
}

/// Open `device` and check it against `model`.
///
/// A rejected device has its stream closed before returning.
pub(crate) fn validate<B: DeviceBackend>(
    backend: &B,
    device: &DeviceDescriptor,
    model: ControllerModel,
) -> std::result::Result<Accepted<B::Stream>, Rejection> {
    let (stream, caps) = backend.open(device).map_err(Rejection::Open)?;

    let product = match backend.product_string(&stream) {
        Ok(p) => p,
        Err(e) => {
            stream.close();
            return Err(Rejection::ProductQuery(e));
        }
    };
    if product != model.product_string() {
        stream.close();
        return Err(Rejection::Product(product));
    }
    if usize::from(caps.input_report_len) != model.input_report_len() {
        stream.close();
        return Err(Rejection::ReportLength(caps.input_report_len));
    }

    Ok(Accepted {
        stream,
        caps,
        product,
    })
}

impl Shared {
    pub(crate) fn new(model: ControllerModel, dead_zone: DeadZone) -> Self {
        Self {
            state: Mutex::new(RegistryState::default()),
            bus: Mutex::new(EventBus::new()),
            dead_zone,
            model,
        }
    }

    pub(crate) fn emit(&self, event: &ControllerEvent) {
        let targets = self.bus.lock().targets(event);

        let first = DEFERRED.with(|cell| {
            let mut cell = cell.borrow_mut();
            if let Some(pending) = cell.as_mut() {
                pending.push_back((targets, event.clone()));
                return None;
            }
            *cell = Some(VecDeque::new());
            Some(targets)
        });
        let Some(targets) = first else {
            return;
        };

        let _run = DeliveryRun;
        deliver(targets, event);
        while let Some((targets, event)) =
            DEFERRED.with(|cell| cell.borrow_mut().as_mut().and_then(VecDeque::pop_front))
        {
            deliver(targets, &event);
        }
    }

    /// One discovery pass. Returns how many controllers connected.
    ///
    /// Fails only when enumeration itself fails; per-device problems are
    /// logged and the device is remembered in the seen-set.
    pub(crate) fn poll_once<B: DeviceBackend>(self: &Arc<Self>, backend: &B) -> Result<usize> {
        let devices = backend.enumerate()?;

        let fresh: Vec<DeviceDescriptor> = {
            let mut state = self.state.lock();
            let present: HashSet<&DeviceHandle> = devices.iter().map(|d| &d.handle).collect();
            let active: HashSet<DeviceHandle> = state
                .slots
                .iter()
                .map(|(_, s)| s.handle().clone())
                .collect();
            state
                .seen
                .retain(|h| present.contains(h) || active.contains(h));

            devices
                .iter()
                .filter(|d| d.kind == DeviceKind::Hid)
                .filter(|d| !active.contains(&d.handle))
                .filter(|d| state.seen.insert(d.handle.clone()))
                .cloned()
                .collect()
        };

        if !fresh.is_empty() {
            debug!(count = fresh.len(), "examining new devices");
        }

        let mut connected = 0;
        for device in fresh {
            match validate(backend, &device, self.model) {
                Ok(accepted) => {
                    let stream: Arc<dyn ReportStream> = Arc::new(accepted.stream);
                    match Session::start(
                        self,
                        device.handle.clone(),
                        accepted.product,
                        stream,
                        accepted.caps,
                    ) {
                        Ok(_) => connected += 1,
                        Err(e) => warn!(device = %device.handle, error = %e, "could not start controller"),
                    }
                }
                Err(reason) => trace!(device = %device.handle, %reason, "ignoring device"),
            }
        }
        Ok(connected)
    }

    pub(crate) fn session(&self, slot: usize) -> Option<Arc<Session>> {
        self.state.lock().slots.get(slot).cloned()
    }

    pub(crate) fn with_session<R>(&self, slot: usize, f: impl FnOnce(&Session) -> R) -> Option<R> {
        let state = self.state.lock();
        state.slots.get(slot).map(|s| f(s))
    }

    pub(crate) fn sessions(&self) -> Vec<Arc<Session>> {
        self.state
            .lock()
            .slots
            .iter()
            .map(|(_, s)| Arc::clone(s))
            .collect()
    }

    /// Advance every registered controller by one frame.
    pub(crate) fn reset_all(&self) {
        for session in self.sessions() {
            session.reset();
        }
    }

    /// Close one controller. `false` if the slot was empty.
    pub(crate) fn close(&self, slot: usize) -> bool {
        match self.session(slot) {
            Some(session) => session.disconnect(self),
            None => false,
        }
    }

    /// Close every controller and forget every examined device.
    pub(crate) fn close_all(&self) {
        for session in self.sessions() {
            session.disconnect(self);
        }
        self.state.lock().seen.clear();
    }
}
