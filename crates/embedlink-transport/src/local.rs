use std::cell::{Cell, RefCell};
use std::collections::VecDeque;
use std::rc::Rc;

use serde_json::Value;
use tracing::{debug, trace};

use crate::error::{Result, TransportError};
use crate::origin::Origin;
use crate::traits::{FrameHost, InboundMessage, ListenerId, MessageHandler, MessageSource, MessageTarget};

/// In-memory window for native hosts and tests.
///
/// Messages are queued with [`LocalWindow::enqueue`] and delivered in FIFO
/// order by [`LocalWindow::pump`], or delivered immediately with
/// [`LocalWindow::deliver`]. Every registered listener sees every message,
/// in registration order.
#[derive(Default)]
pub struct LocalWindow {
    listeners: RefCell<Vec<(ListenerId, MessageHandler)>>,
    queue: RefCell<VecDeque<InboundMessage>>,
    next_listener_id: Cell<u64>,
}

impl LocalWindow {
    pub fn new() -> Self {
        Self::default()
    }

    /// Queue a message for the next [`pump`](Self::pump).
    pub fn enqueue(&self, message: InboundMessage) {
        self.queue.borrow_mut().push_back(message);
    }

    /// Deliver all queued messages in arrival order. Returns how many were
    /// delivered.
    ///
    /// Messages queued by a listener during the pump are delivered in the
    /// same pump, after the ones already queued.
    pub fn pump(&self) -> usize {
        let mut delivered = 0usize;
        loop {
            let next = self.queue.borrow_mut().pop_front();
            match next {
                Some(message) => {
                    self.deliver(&message);
                    delivered = delivered.saturating_add(1);
                }
                None => return delivered,
            }
        }
    }

    /// Deliver one message to the listeners registered right now.
    pub fn deliver(&self, message: &InboundMessage) {
        // Snapshot so handlers may add or remove listeners while running.
        let handlers: Vec<MessageHandler> = self
            .listeners
            .borrow()
            .iter()
            .map(|(_, handler)| Rc::clone(handler))
            .collect();
        trace!(origin = %message.origin, listeners = handlers.len(), "delivering message");
        for handler in handlers {
            handler(message);
        }
    }

    /// Number of registered listeners.
    pub fn listener_count(&self) -> usize {
        self.listeners.borrow().len()
    }
}

impl MessageSource for LocalWindow {
    fn add_listener(&self, handler: MessageHandler) -> ListenerId {
        let id = self.next_listener_id.get().wrapping_add(1);
        self.next_listener_id.set(id);
        let id = ListenerId::new(id);
        self.listeners.borrow_mut().push((id, handler));
        debug!(listener = id.get(), "message listener added");
        id
    }

    fn remove_listener(&self, id: ListenerId) -> bool {
        let mut listeners = self.listeners.borrow_mut();
        let before = listeners.len();
        listeners.retain(|(existing, _)| *existing != id);
        let removed = listeners.len() != before;
        if removed {
            debug!(listener = id.get(), "message listener removed");
        }
        removed
    }
}

/// A message target that records everything posted to it.
#[derive(Debug, Default)]
pub struct RecordingTarget {
    posted: RefCell<Vec<(Value, Origin)>>,
}

impl RecordingTarget {
    pub fn new() -> Self {
        Self::default()
    }

    /// All posted messages with the target origin they were posted to.
    pub fn posted(&self) -> Vec<(Value, Origin)> {
        self.posted.borrow().clone()
    }

    /// Posted message bodies only.
    pub fn messages(&self) -> Vec<Value> {
        self.posted
            .borrow()
            .iter()
            .map(|(data, _)| data.clone())
            .collect()
    }

    pub fn len(&self) -> usize {
        self.posted.borrow().len()
    }

    pub fn is_empty(&self) -> bool {
        self.posted.borrow().is_empty()
    }

    pub fn clear(&self) {
        self.posted.borrow_mut().clear();
    }
}

impl MessageTarget for RecordingTarget {
    fn post_message(&self, data: &Value, target_origin: &Origin) -> Result<()> {
        self.posted
            .borrow_mut()
            .push((data.clone(), target_origin.clone()));
        Ok(())
    }
}

/// In-memory iframe element.
///
/// Starts attached but without a content window; call
/// [`LocalFrame::load`] to simulate the embedded page becoming available.
pub struct LocalFrame {
    attached: Cell<bool>,
    navigations: RefCell<Vec<String>>,
    content: RefCell<Option<Rc<dyn MessageTarget>>>,
}

impl LocalFrame {
    pub fn new() -> Self {
        Self {
            attached: Cell::new(true),
            navigations: RefCell::new(Vec::new()),
            content: RefCell::new(None),
        }
    }

    /// Attach a content window to the frame.
    pub fn load(&self, content: Rc<dyn MessageTarget>) {
        *self.content.borrow_mut() = Some(content);
    }

    /// Remove the element from the page.
    pub fn detach(&self) {
        self.attached.set(false);
        self.content.borrow_mut().take();
    }

    /// Current `src`, if any navigation happened.
    pub fn src(&self) -> Option<String> {
        self.navigations.borrow().last().cloned()
    }

    /// Every `src` assigned so far, oldest first.
    pub fn navigations(&self) -> Vec<String> {
        self.navigations.borrow().clone()
    }
}

impl Default for LocalFrame {
    fn default() -> Self {
        Self::new()
    }
}

impl FrameHost for LocalFrame {
    fn set_src(&self, url: &str) -> Result<()> {
        if !self.attached.get() {
            return Err(TransportError::FrameDetached);
        }
        self.navigations.borrow_mut().push(url.to_string());
        Ok(())
    }

    fn content_window(&self) -> Result<Rc<dyn MessageTarget>> {
        if !self.attached.get() {
            return Err(TransportError::FrameDetached);
        }
        self.content
            .borrow()
            .as_ref()
            .map(Rc::clone)
            .ok_or(TransportError::ContentWindowUnavailable)
    }
}
