use crate::event::ControllerEvent;
use crate::eventbus::ControllerListener;

/// Wraps a listener and filters events based on a user-supplied predicate.
pub struct FilteredListener {
    predicate: Box<dyn Fn(&ControllerEvent) -> bool + Send + Sync>,
    inner: Box<dyn ControllerListener>,
}

impl FilteredListener {
    pub fn new(
        predicate: impl Fn(&ControllerEvent) -> bool + Send + Sync + 'static,
        inner: impl ControllerListener + 'static,
    ) -> Self {
        Self {
            predicate: Box::new(predicate),
            inner: Box::new(inner),
        }
    }
}

impl ControllerListener for FilteredListener {
    fn on_event(&mut self, event: &ControllerEvent) {
        if (self.predicate)(event) {
            self.inner.on_event(event);
        }
    }
}
