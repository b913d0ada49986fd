/// Resize notifications handed from the window layer to the renderer
///
/// The window thread calls `ResizeNotifier::notify`; the renderer takes
/// the pending event at the start of its next frame. Only the latest
/// event is kept.

use std::sync::{Arc, Mutex};

/// New client-area size of the window, in physical pixels
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ResizeEvent {
    pub width: u32,
    pub height: u32,
}

impl ResizeEvent {
    pub fn new(width: u32, height: u32) -> Self {
        Self { width, height }
    }

    /// A minimised window reports a zero-sized client area
    pub fn is_empty(&self) -> bool {
        self.width == 0 || self.height == 0
    }
}

impl From<winit::dpi::PhysicalSize<u32>> for ResizeEvent {
    fn from(size: winit::dpi::PhysicalSize<u32>) -> Self {
        Self::new(size.width, size.height)
    }
}

/// Cloneable single-slot hand-off of the latest `ResizeEvent`
#[derive(Debug, Clone, Default)]
pub struct ResizeNotifier {
    pending: Arc<Mutex<Option<ResizeEvent>>>,
}

impl ResizeNotifier {
    pub fn new() -> Self {
        Self::default()
    }

    /// Record a resize, replacing any event not yet consumed
    pub fn notify(&self, event: impl Into<ResizeEvent>) {
        let mut pending = self.pending.lock().unwrap_or_else(|poisoned| poisoned.into_inner());
        *pending = Some(event.into());
    }

    /// Take the pending event, if any
    pub fn take(&self) -> Option<ResizeEvent> {
        self.pending
            .lock()
            .unwrap_or_else(|poisoned| poisoned.into_inner())
            .take()
    }

    /// Put back an event that could not be applied
    ///
    /// Does nothing if a newer event arrived in the meantime. Returns
    /// whether `event` is pending again.
    pub fn restore(&self, event: ResizeEvent) -> bool {
        let mut pending = self.pending.lock().unwrap_or_else(|poisoned| poisoned.into_inner());
        if pending.is_some() {
            return false;
        }
        *pending = Some(event);
        true
    }

    pub fn is_pending(&self) -> bool {
        self.pending
            .lock()
            .map(|pending| pending.is_some())
            .unwrap_or(false)
    }
}
