//! Controller session: one validated device and its read loop.
//!
//! A session is created by the registry after validation and starts
//! `Active`. Its read loop runs on a dedicated thread: block on the stream,
//! decode, publish into the [`FrameState`], read again. There is no pacing;
//! decoding keeps up with whatever rate the device reports at.
//!
//! The session ends (`Disconnected`, terminal) when a read fails or when it
//! is closed explicitly. Either way the stream is closed, the slot goes back
//! to the free list and a single `Disconnected` event is emitted.

use crate::config::DeadZone;
use crate::device::{Capabilities, DeviceHandle, ReportStream};
use crate::error::{Error, Result};
use crate::event::ControllerEvent;
use crate::metadata::ControllerInfo;
use crate::registry::Shared;
use crate::report::ControllerModel;
use crate::snapshot::{AxisState, PadState};
use crate::state::FrameState;
use std::sync::atomic::{AtomicBool, AtomicU64, Ordering};
use std::sync::{Arc, Weak};
use tracing::{debug, error, info, warn};

/// Session lifecycle.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SessionState {
    Active,
    Disconnected,
}

pub struct Session {
    slot: usize,
    handle: DeviceHandle,
    product: String,
    caps: Capabilities,
    model: ControllerModel,
    stream: Arc<dyn ReportStream>,
    frame: FrameState,
    disconnected: AtomicBool,
    malformed: AtomicU64,
}

impl Session {
    /// Register a validated device and arm its read loop.
    ///
    /// Allocates the lowest free slot, stores the session in the slot table,
    /// emits `Connected` and then spawns the reader thread.
    pub(crate) fn start(
        shared: &Arc<Shared>,
        handle: DeviceHandle,
        product: String,
        stream: Arc<dyn ReportStream>,
        caps: Capabilities,
    ) -> Result<Arc<Session>> {
        let session = {
            let mut state = shared.state.lock();
            let slot = state.slots.acquire();
            let session = Arc::new(Session {
                slot,
                handle,
                product,
                caps,
                model: shared.model,
                stream,
                frame: FrameState::new(),
                disconnected: AtomicBool::new(false),
                malformed: AtomicU64::new(0),
            });
            state.slots.fill(slot, Arc::clone(&session));
            session
        };

        info!(
            slot = session.slot,
            device = %session.handle,
            product = %session.product,
            "controller connected"
        );
        shared.emit(&ControllerEvent::connected(
            session.slot,
            session.handle.clone(),
        ));

        let reader = Arc::clone(&session);
        let weak = Arc::downgrade(shared);
        let dead_zone = shared.dead_zone.clone();
        let spawned = std::thread::Builder::new()
            .name(format!("ps4pad-pad{}", session.slot))
            .spawn(move || reader.run(weak, dead_zone));

        if let Err(e) = spawned {
            error!(slot = session.slot, error = %e, "failed to spawn read loop");
            session.disconnect(shared);
            return Err(Error::ThreadSpawn("read loop"));
        }

        Ok(session)
    }

    pub fn slot(&self) -> usize {
        self.slot
    }

    pub fn handle(&self) -> &DeviceHandle {
        &self.handle
    }

    pub fn capabilities(&self) -> Capabilities {
        self.caps
    }

    pub fn state(&self) -> SessionState {
        if self.disconnected.load(Ordering::Acquire) {
            SessionState::Disconnected
        } else {
            SessionState::Active
        }
    }

    pub fn is_active(&self) -> bool {
        self.state() == SessionState::Active
    }

    pub fn frame(&self) -> &FrameState {
        &self.frame
    }

    /// Advance this controller by one frame.
    pub fn reset(&self) {
        self.frame.reset();
    }

    pub fn axes(&self) -> AxisState {
        self.frame.axes()
    }

    pub fn pad_state(&self) -> PadState {
        self.frame.pad_state()
    }

    pub fn malformed_reports(&self) -> u64 {
        self.malformed.load(Ordering::Relaxed)
    }

    pub fn info(&self) -> ControllerInfo {
        ControllerInfo {
            slot: self.slot,
            handle: self.handle.clone(),
            product_string: self.product.clone(),
            caps: self.caps,
            malformed_reports: self.malformed_reports(),
        }
    }

    /// Move to `Disconnected`: close the stream, free the slot, notify.
    ///
    /// Only the first call does anything; returns whether this call did it.
    pub(crate) fn disconnect(&self, shared: &Shared) -> bool {
        if self.disconnected.swap(true, Ordering::AcqRel) {
            return false;
        }
        self.stream.close();

        {
            let mut state = shared.state.lock();
            let owns_slot = state
                .slots
                .get(self.slot)
                .is_some_and(|s| std::ptr::eq(Arc::as_ptr(s), self));
            if owns_slot {
                state.slots.release(self.slot);
            }
        }

        info!(slot = self.slot, device = %self.handle, "controller disconnected");
        shared.emit(&ControllerEvent::disconnected(self.slot, self.handle.clone()));
        true
    }

    /// Reader thread body.
    fn run(self: Arc<Self>, shared: Weak<Shared>, dead_zone: DeadZone) {
        let mut buf = vec![0u8; self.caps.input_report_len as usize];

        match self.read_loop(&mut buf, &dead_zone) {
            Ok(()) => debug!(slot = self.slot, "read loop stopped after close"),
            Err(Error::Io(e)) => {
                debug!(slot = self.slot, error = %e, "read failed, treating as removal")
            }
            Err(e) => error!(slot = self.slot, error = %e, "read loop aborted"),
        }

        if let Some(shared) = shared.upgrade() {
            self.disconnect(&shared);
        } else {
            self.disconnected.store(true, Ordering::Release);
            self.stream.close();
        }
    }

    /// Read until the stream fails. `Ok` means the session was closed on purpose.
    fn read_loop(&self, buf: &mut [u8], dead_zone: &DeadZone) -> Result<()> {
        loop {
            if !self.stream.is_readable() {
                if self.state() == SessionState::Disconnected {
                    return Ok(());
                }
                return Err(Error::StreamUnreadable { slot: self.slot });
            }

            let n = match self.stream.read_report(buf) {
                Ok(n) => n,
                Err(_) if self.state() == SessionState::Disconnected => return Ok(()),
                Err(e) => return Err(e.into()),
            };

            self.on_report(&buf[..n], dead_zone.get());
        }
    }

    /// Decode one report into the frame state. A malformed report is counted
    /// and dropped; the session stays up.
    pub(crate) fn on_report(&self, report: &[u8], dead_zone: f32) {
        match self.model.decode(report, dead_zone) {
            Ok(decoded) => self.frame.record(&decoded),
            Err(e) => {
                let count = self.malformed.fetch_add(1, Ordering::Relaxed) + 1;
                if count == 1 {
                    warn!(slot = self.slot, error = %e, "dropping malformed report");
                } else {
                    debug!(slot = self.slot, error = %e, count, "dropping malformed report");
                }
            }
        }
    }
}

impl std::fmt::Debug for Session {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Session")
            .field("slot", &self.slot)
            .field("handle", &self.handle)
            .field("product", &self.product)
            .field("caps", &self.caps)
            .field("state", &self.state())
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::buttons::Buttons;
    use crate::backends::virtual_input::{neutral_report, VirtualBackend};
    use crate::device::DeviceBackend;
    use crate::event::ControllerEventKind;
    use std::io;
    use std::sync::Mutex;
    use std::time::{Duration, Instant};

    const CAPS: Capabilities = Capabilities {
        usage: 0x05,
        usage_page: 0x01,
        input_report_len: 64,
    };

    fn wait_for(mut cond: impl FnMut() -> bool) -> bool {
        let deadline = Instant::now() + Duration::from_secs(2);
        while Instant::now() < deadline {
            if cond() {
                return true;
            }
            std::thread::sleep(Duration::from_millis(2));
        }
        cond()
    }

    fn start_virtual(
        shared: &Arc<Shared>,
        backend: &VirtualBackend,
        name: &str,
    ) -> (Arc<Session>, crate::backends::virtual_input::VirtualPad) {
        let pad = backend.plug(name);
        let descriptor = backend.enumerate().unwrap().into_iter().last().unwrap();
        let (stream, caps) = backend.open(&descriptor).unwrap();
        let session = Session::start(
            shared,
            descriptor.handle,
            "Wireless Controller".into(),
            Arc::new(stream),
            caps,
        )
        .unwrap();
        (session, pad)
    }

    #[test]
    fn malformed_report_is_counted_not_fatal() {
        let shared = Arc::new(Shared::new(ControllerModel::DualShock4, DeadZone::default()));
        let backend = VirtualBackend::new();
        let (session, pad) = start_virtual(&shared, &backend, "a");

        let mut r = neutral_report();
        r[5] = 0x28; // Face1, dpad neutral
        session.on_report(&[0u8; 10], 0.15);
        assert_eq!(session.malformed_reports(), 1);
        assert!(session.frame().live().is_empty());

        pad.send(&r);
        assert!(wait_for(|| session.frame().is_live_down(Buttons::FACE1)));
        assert!(session.is_active());
        assert_eq!(session.info().malformed_reports, 1);
    }

    #[test]
    fn read_failure_frees_slot_and_notifies_once() {
        let shared = Arc::new(Shared::new(ControllerModel::DualShock4, DeadZone::default()));
        let events = Arc::new(Mutex::new(Vec::new()));
        let sink = Arc::clone(&events);
        shared.bus.lock().add_listener(
            move |e: &ControllerEvent| sink.lock().unwrap().push(e.kind.clone()),
            crate::eventbus::EventFilter::All,
            None,
        );

        let backend = VirtualBackend::new();
        let (session, pad) = start_virtual(&shared, &backend, "a");
        assert_eq!(session.slot(), 0);
        assert_eq!(session.capabilities(), CAPS);

        pad.unplug();
        assert!(wait_for(|| !session.is_active()));
        assert!(wait_for(|| !shared.state.lock().slots.is_occupied(0)));
        assert!(!session.disconnect(&shared));

        let got = events.lock().unwrap().clone();
        assert_eq!(
            got,
            vec![
                ControllerEventKind::Connected { slot: 0 },
                ControllerEventKind::Disconnected { slot: 0 },
            ]
        );
    }

    #[test]
    fn explicit_close_stops_the_loop() {
        let shared = Arc::new(Shared::new(ControllerModel::DualShock4, DeadZone::default()));
        let backend = VirtualBackend::new();
        let (session, pad) = start_virtual(&shared, &backend, "a");

        assert!(session.disconnect(&shared));
        assert_eq!(session.state(), SessionState::Disconnected);
        assert!(pad.is_closed());
        assert!(shared.state.lock().slots.is_empty());
    }

    /// Yields one report and then stops being readable without being closed.
    #[derive(Default)]
    struct FadingStream {
        gone: AtomicBool,
        closed: AtomicBool,
    }

    impl ReportStream for FadingStream {
        fn read_report(&self, buf: &mut [u8]) -> io::Result<usize> {
            let report = neutral_report();
            let n = report.len().min(buf.len());
            buf[..n].copy_from_slice(&report[..n]);
            self.gone.store(true, Ordering::Release);
            Ok(n)
        }

        fn close(&self) {
            self.closed.store(true, Ordering::Release);
        }

        fn is_readable(&self) -> bool {
            !self.gone.load(Ordering::Acquire)
        }
    }

    #[test]
    fn unreadable_stream_while_active_tears_down_once() {
        let shared = Arc::new(Shared::new(ControllerModel::DualShock4, DeadZone::default()));
        let events = Arc::new(Mutex::new(Vec::new()));
        let sink = Arc::clone(&events);
        shared.bus.lock().add_listener(
            move |e: &ControllerEvent| sink.lock().unwrap().push(e.kind.clone()),
            crate::eventbus::EventFilter::All,
            None,
        );

        let stream = Arc::new(FadingStream::default());
        let session = Session::start(
            &shared,
            DeviceHandle::from("fading"),
            "Wireless Controller".into(),
            Arc::clone(&stream) as Arc<dyn ReportStream>,
            CAPS,
        )
        .unwrap();

        assert!(wait_for(|| session.state() == SessionState::Disconnected));
        assert!(wait_for(|| shared.state.lock().slots.is_empty()));
        assert!(stream.closed.load(Ordering::Acquire));
        assert_eq!(session.malformed_reports(), 0);

        std::thread::sleep(Duration::from_millis(30));
        assert_eq!(
            *events.lock().unwrap(),
            vec![
                ControllerEventKind::Connected { slot: 0 },
                ControllerEventKind::Disconnected { slot: 0 },
            ]
        );
    }
}
