use std::{cell::RefCell, collections::BTreeMap, collections::VecDeque, rc::Rc};

/// An overlay was created or edited and should be persisted.
pub const COMMIT: &str = "commit";
/// An overlay was deleted by the user.
pub const REMOVE: &str = "remove";
/// The selection changed.
pub const SELECT: &str = "select";
/// A resource decode failed for one overlay.
pub const DECODE_ERROR: &str = "decode-error";
/// Something the current frame depends on changed.
pub const RERENDER: &str = "rerender";

/// Upward notification from a node, overlay, or the scene.
#[derive(Clone, Debug, PartialEq)]
pub struct SceneEvent {
    pub event_type: String,
    pub details: Option<serde_json::Value>,
}

impl SceneEvent {
    pub fn new(event_type: impl Into<String>, details: Option<serde_json::Value>) -> Self {
        Self {
            event_type: event_type.into(),
            details,
        }
    }

    pub fn is(&self, event_type: &str) -> bool {
        self.event_type == event_type
    }
}

/// Shared outbox behind `dispatch_event(type, details)`.
///
/// Cloning yields another handle to the same queue; everything runs on one thread.
#[derive(Clone, Debug, Default)]
pub struct EventQueue {
    inner: Rc<RefCell<VecDeque<SceneEvent>>>,
}

impl EventQueue {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn dispatch_event(&self, event_type: &str, details: Option<serde_json::Value>) {
        tracing::trace!(event_type, "dispatch");
        self.inner
            .borrow_mut()
            .push_back(SceneEvent::new(event_type, details));
    }

    /// Take every queued event in dispatch order.
    pub fn take(&self) -> Vec<SceneEvent> {
        self.inner.borrow_mut().drain(..).collect()
    }

    pub fn len(&self) -> usize {
        self.inner.borrow().len()
    }

    pub fn is_empty(&self) -> bool {
        self.inner.borrow().is_empty()
    }
}

type Handler = Box<dyn FnMut(&SceneEvent)>;

/// Routes events to subscribers by event type string.
#[derive(Default)]
pub struct EventBus {
    handlers: BTreeMap<String, Vec<Handler>>,
}

impl EventBus {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn subscribe(&mut self, event_type: &str, handler: impl FnMut(&SceneEvent) + 'static) {
        self.handlers
            .entry(event_type.to_owned())
            .or_default()
            .push(Box::new(handler));
    }

    /// Deliver one event; returns how many handlers saw it.
    pub fn publish(&mut self, event: &SceneEvent) -> usize {
        let Some(handlers) = self.handlers.get_mut(&event.event_type) else {
            return 0;
        };
        for h in handlers.iter_mut() {
            h(event);
        }
        handlers.len()
    }

    /// Drain `queue` and deliver everything in order.
    pub fn pump(&mut self, queue: &EventQueue) -> usize {
        queue.take().iter().map(|e| self.publish(e)).sum()
    }
}
