use std::rc::Rc;

use embedlink_transport::{ListenerId, MessageHandler, MessageSource};
use tracing::debug;

/// A registered message listener. Removed on [`ListenerGuard::detach`] or
/// drop, exactly once.
pub struct ListenerGuard {
    source: Rc<dyn MessageSource>,
    id: Option<ListenerId>,
}

impl ListenerGuard {
    /// Register `handler` on `source`.
    pub fn attach(source: Rc<dyn MessageSource>, handler: MessageHandler) -> Self {
        let id = source.add_listener(handler);
        debug!(listener = id.get(), "message listener attached");
        Self {
            source,
            id: Some(id),
        }
    }

    pub fn is_attached(&self) -> bool {
        self.id.is_some()
    }

    /// Remove the listener. Returns false if it was already removed.
    pub fn detach(&mut self) -> bool {
        match self.id.take() {
            Some(id) => {
                let removed = self.source.remove_listener(id);
                debug!(listener = id.get(), removed, "message listener detached");
                true
            }
            None => false,
        }
    }
}

impl Drop for ListenerGuard {
    fn drop(&mut self) {
        self.detach();
    }
}

impl std::fmt::Debug for ListenerGuard {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ListenerGuard").field("id", &self.id).finish()
    }
}
