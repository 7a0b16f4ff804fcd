use crate::event::{ControllerEvent, ControllerEventKind};
use parking_lot::Mutex;
use std::collections::HashMap;
use std::sync::Arc;

/// Trait for reacting to controller connect/disconnect events.
pub trait ControllerListener: Send {
    fn on_event(&mut self, event: &ControllerEvent);
}

impl<F> ControllerListener for F
where
    F: FnMut(&ControllerEvent) + Send,
{
    fn on_event(&mut self, event: &ControllerEvent) {
        self(event)
    }
}

/// Determines which events a listener wants to receive.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum EventFilter {
    All,
    ConnectOnly,
    DisconnectOnly,
    Custom(fn(&ControllerEvent) -> bool),
}

impl EventFilter {
    fn accepts(self, event: &ControllerEvent) -> bool {
        match self {
            EventFilter::All => true,
            EventFilter::ConnectOnly => {
                matches!(event.kind, ControllerEventKind::Connected { .. })
            }
            EventFilter::DisconnectOnly => {
                matches!(event.kind, ControllerEventKind::Disconnected { .. })
            }
            EventFilter::Custom(f) => f(event),
        }
    }
}

/// A registered listener, lockable on its own so it can be invoked after the
/// bus lock is released.
pub type SharedListener = Arc<Mutex<Box<dyn ControllerListener>>>;

/// Metadata-wrapped listener with filters and control flags.
struct ListenerEntry {
    listener: SharedListener,
    enabled: bool,
    filter: EventFilter,
    slot: Option<usize>, // only events for this slot
}

/// Listener registry.
///
/// The manager keeps it behind a lock, collects the matching listeners with
/// [`targets`](Self::targets) and invokes them after dropping that lock, so a
/// listener may call back into the manager.
#[derive(Default)]
pub struct EventBus {
    next_id: u64,
    listeners: HashMap<u64, ListenerEntry>,
}

impl EventBus {
    pub fn new() -> Self {
        Self::default()
    }

    /// Registers a listener with optional filtering by kind and slot.
    pub fn add_listener(
        &mut self,
        listener: impl ControllerListener + 'static,
        filter: EventFilter,
        slot: Option<usize>,
    ) -> u64 {
        let id = self.next_id;
        let boxed: Box<dyn ControllerListener> = Box::new(listener);
        self.listeners.insert(
            id,
            ListenerEntry {
                listener: Arc::new(Mutex::new(boxed)),
                enabled: true,
                filter,
                slot,
            },
        );
        self.next_id += 1;
        id
    }

    /// Enables a previously registered listener.
    pub fn enable(&mut self, id: u64) {
        if let Some(entry) = self.listeners.get_mut(&id) {
            entry.enabled = true;
        }
    }

    /// Disables (mutes) a listener without removing it.
    pub fn disable(&mut self, id: u64) {
        if let Some(entry) = self.listeners.get_mut(&id) {
            entry.enabled = false;
        }
    }

    /// Unregisters a listener entirely.
    pub fn remove_listener(&mut self, id: u64) -> bool {
        self.listeners.remove(&id).is_some()
    }

    /// Active listeners whose kind and slot filters accept `event`, in
    /// registration order.
    pub fn targets(&self, event: &ControllerEvent) -> Vec<SharedListener> {
        let mut matching: Vec<(u64, &ListenerEntry)> = self
            .listeners
            .iter()
            .filter(|(_, e)| e.enabled)
            .filter(|(_, e)| e.slot.map_or(true, |wanted| event.slot() == wanted))
            .filter(|(_, e)| e.filter.accepts(event))
            .map(|(id, e)| (*id, e))
            .collect();
        matching.sort_by_key(|(id, _)| *id);
        matching
            .into_iter()
            .map(|(_, e)| Arc::clone(&e.listener))
            .collect()
    }

    /// Emits one event to all active and matching listeners.
    pub fn emit(&self, event: &ControllerEvent) {
        deliver(self.targets(event), event);
    }
}

/// Invoke each listener in turn.
pub fn deliver(targets: Vec<SharedListener>, event: &ControllerEvent) {
    for listener in targets {
        listener.lock().on_event(event);
    }
}
