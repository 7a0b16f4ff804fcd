use crate::event::{ControllerEvent, ControllerEventKind};
use crate::eventbus::ControllerListener;
use tracing::info;

/// A simple listener that logs every connection event through `tracing`.
#[derive(Debug, Default)]
pub struct Logger;

impl Logger {
    pub fn new() -> Self {
        Logger
    }
}

impl ControllerListener for Logger {
    fn on_event(&mut self, event: &ControllerEvent) {
        match event.kind {
            ControllerEventKind::Connected { slot } => {
                info!(slot, device = %event.handle, "controller connected")
            }
            ControllerEventKind::Disconnected { slot } => {
                info!(slot, device = %event.handle, "controller disconnected")
            }
        }
    }
}
