use std::cell::{Cell, RefCell};
use std::rc::Rc;

use embedlink_transport::{
    InboundMessage, ListenerId, MessageHandler, MessageSource, MessageTarget, Origin, Result,
    TransportError,
};
use serde_json::Value;
use tracing::warn;
use wasm_bindgen::prelude::*;
use wasm_bindgen::JsCast;
use web_sys::{MessageEvent, Window};

use crate::convert::{to_js, to_json};

type MessageClosure = Closure<dyn FnMut(MessageEvent)>;

/// `window` as a message source.
pub struct WebWindow {
    window: Window,
    next_id: Cell<u64>,
    listeners: RefCell<Vec<(ListenerId, MessageClosure)>>,
    // A closure must outlive any call into it. Removal can happen from
    // inside a handler, so removed closures are freed with the window.
    retired: RefCell<Vec<MessageClosure>>,
}

impl WebWindow {
    pub fn new(window: Window) -> Self {
        Self {
            window,
            next_id: Cell::new(1),
            listeners: RefCell::new(Vec::new()),
            retired: RefCell::new(Vec::new()),
        }
    }
}

impl MessageSource for WebWindow {
    fn add_listener(&self, handler: MessageHandler) -> ListenerId {
        let id = ListenerId::new(self.next_id.get());
        self.next_id.set(self.next_id.get() + 1);

        let closure = MessageClosure::new(move |event: MessageEvent| {
            handler(&inbound(&event));
        });
        if let Err(err) = self
            .window
            .add_event_listener_with_callback("message", closure.as_ref().unchecked_ref())
        {
            warn!(error = ?err, "failed to register message listener");
        }
        self.listeners.borrow_mut().push((id, closure));
        id
    }

    fn remove_listener(&self, id: ListenerId) -> bool {
        let removed = {
            let mut listeners = self.listeners.borrow_mut();
            listeners
                .iter()
                .position(|(candidate, _)| *candidate == id)
                .map(|index| listeners.remove(index).1)
        };
        let Some(closure) = removed else {
            return false;
        };

        if let Err(err) = self
            .window
            .remove_event_listener_with_callback("message", closure.as_ref().unchecked_ref())
        {
            warn!(error = ?err, "failed to remove message listener");
        }
        self.retired.borrow_mut().push(closure);
        true
    }
}

impl Drop for WebWindow {
    fn drop(&mut self) {
        for (_, closure) in self.listeners.get_mut().drain(..) {
            let _ = self
                .window
                .remove_event_listener_with_callback("message", closure.as_ref().unchecked_ref());
        }
    }
}

fn inbound(event: &MessageEvent) -> InboundMessage {
    let data = to_json(&event.data()).unwrap_or(Value::Null);
    let message = InboundMessage::new(event.origin(), data);
    match event.source() {
        // Cross-origin WindowProxy objects fail `instanceof Window`.
        Some(source) => message.with_source(Rc::new(WebTarget::new(source.unchecked_into()))),
        None => message,
    }
}

/// A window (usually an iframe's content window) as a post target.
pub struct WebTarget {
    window: Window,
}

impl WebTarget {
    pub fn new(window: Window) -> Self {
        Self { window }
    }
}

impl MessageTarget for WebTarget {
    fn post_message(&self, data: &Value, target_origin: &Origin) -> Result<()> {
        let message =
            to_js(data).map_err(|err| TransportError::PostFailed(format!("{err:?}")))?;
        self.window
            .post_message(&message, target_origin.as_str())
            .map_err(|err| TransportError::PostFailed(format!("{err:?}")))
    }
}
