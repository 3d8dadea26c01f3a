use std::cell::RefCell;
use std::fmt;
use std::rc::{Rc, Weak};

use embedlink_transport::{FrameHost, InboundMessage, MessageSource, Origin};
use serde_json::Value;
use tracing::{debug, warn};

use crate::config::BridgeConfig;
use crate::error::{BridgeError, Result};
use crate::listener::ListenerGuard;
use crate::message::{CallbackEvent, HostMessage, StoreEvent, UnsafeParams};
use crate::protocol::{Classification, ProtocolVersion};
use crate::session::{FrameSession, SessionPhase};

#[cfg(feature = "schema")]
use embedlink_schema::EnvelopeRegistry;

/// Called with the store's new path.
pub type PathChangeHandler = Rc<dyn Fn(&str)>;
/// Called for a store callback action. `Some` is posted back to the store.
pub type CallbackHandler = Rc<dyn Fn(&CallbackEvent) -> Option<Value>>;
/// Called with a listing id and its new installed state.
pub type InstalledChangeHandler = Rc<dyn Fn(&str, bool)>;

/// Caller-supplied event handlers. All are optional.
///
/// Handlers run with no bridge state borrowed, so they may call back into the
/// bridge (for example to push new params from a callback).
#[derive(Clone, Default)]
pub struct BridgeHandlers {
    pub on_path_change: Option<PathChangeHandler>,
    pub on_callback: Option<CallbackHandler>,
    pub on_installed_change: Option<InstalledChangeHandler>,
}

impl BridgeHandlers {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn on_path_change(mut self, handler: impl Fn(&str) + 'static) -> Self {
        self.on_path_change = Some(Rc::new(handler));
        self
    }

    pub fn on_callback(mut self, handler: impl Fn(&CallbackEvent) -> Option<Value> + 'static) -> Self {
        self.on_callback = Some(Rc::new(handler));
        self
    }

    pub fn on_installed_change(mut self, handler: impl Fn(&str, bool) + 'static) -> Self {
        self.on_installed_change = Some(Rc::new(handler));
        self
    }
}

impl fmt::Debug for BridgeHandlers {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("BridgeHandlers")
            .field("on_path_change", &self.on_path_change.is_some())
            .field("on_callback", &self.on_callback.is_some())
            .field("on_installed_change", &self.on_installed_change.is_some())
            .finish()
    }
}

/// How an outbound update was handled.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Delivery {
    /// The iframe has not loaded yet; the change rides on the initial URL.
    FoldedIntoInitialUrl,
    /// Posted to the iframe's content window.
    Posted,
    /// The iframe or its content window was missing. Logged and dropped.
    TargetNotReady,
}

struct Shared {
    session: RefCell<FrameSession>,
    handlers: BridgeHandlers,
    protocol: ProtocolVersion,
    #[cfg(feature = "schema")]
    registry: Option<EnvelopeRegistry>,
}

/// Parent-side bridge to one embedded store iframe.
///
/// Mounting validates the config and attaches one message listener for the
/// bridge's lifetime. [`navigate`](Self::navigate) points the iframe at the
/// initial URL once; afterwards parameter changes are posted as messages.
/// Dropping the bridge unmounts it.
pub struct FrameBridge {
    shared: Rc<Shared>,
    frame: Rc<dyn FrameHost>,
    listener: RefCell<Option<ListenerGuard>>,
}

impl FrameBridge {
    /// Validate `config` and start listening on `window`.
    ///
    /// Fails with [`BridgeError::ReservedKey`] before anything touches the
    /// iframe or the window.
    pub fn mount(
        config: BridgeConfig,
        handlers: BridgeHandlers,
        window: Rc<dyn MessageSource>,
        frame: Rc<dyn FrameHost>,
    ) -> Result<Self> {
        let session = FrameSession::new(config)?;
        Ok(Self::attach(Self::shared(session, handlers), window, frame))
    }

    /// Like [`mount`](Self::mount), validating every inbound envelope from the
    /// store origin against `registry` before dispatch.
    #[cfg(feature = "schema")]
    pub fn mount_validated(
        config: BridgeConfig,
        handlers: BridgeHandlers,
        window: Rc<dyn MessageSource>,
        frame: Rc<dyn FrameHost>,
        registry: EnvelopeRegistry,
    ) -> Result<Self> {
        let session = FrameSession::new(config)?;
        let mut shared = Self::shared(session, handlers);
        shared.registry = Some(registry);
        Ok(Self::attach(shared, window, frame))
    }

    fn shared(session: FrameSession, handlers: BridgeHandlers) -> Shared {
        let protocol = session.config().protocol;
        Shared {
            session: RefCell::new(session),
            handlers,
            protocol,
            #[cfg(feature = "schema")]
            registry: None,
        }
    }

    fn attach(shared: Shared, window: Rc<dyn MessageSource>, frame: Rc<dyn FrameHost>) -> Self {
        let shared = Rc::new(shared);
        let weak: Weak<Shared> = Rc::downgrade(&shared);
        let listener = ListenerGuard::attach(
            window,
            Rc::new(move |message: &InboundMessage| {
                if let Some(shared) = weak.upgrade() {
                    dispatch(&shared, message);
                }
            }),
        );

        debug!(
            origin = %shared.session.borrow().target_origin(),
            protocol = %shared.protocol,
            "frame bridge mounted"
        );

        Self {
            shared,
            frame,
            listener: RefCell::new(Some(listener)),
        }
    }

    /// Point the iframe at the initial URL.
    ///
    /// Returns the URL on the first call and `None` afterwards; the token and
    /// URL-encoded params are never sent twice.
    pub fn navigate(&self) -> Result<Option<String>> {
        self.ensure_mounted()?;
        let url = match self.shared.session.borrow().initial_url()? {
            Some(url) => url,
            None => return Ok(None),
        };

        self.frame.set_src(&url)?;
        self.shared.session.borrow_mut().mark_delivered();
        debug!(origin = %self.target_origin(), "iframe navigated to initial url");
        Ok(Some(url))
    }

    /// Replace the unsafe params.
    ///
    /// Before [`navigate`](Self::navigate) the change is folded into the
    /// initial URL and nothing is posted. Afterwards one
    /// `UNSAFE_PARAMS_CHANGE` message is posted to the iframe.
    pub fn update_unsafe_params(&self, params: UnsafeParams) -> Result<Delivery> {
        self.ensure_mounted()?;
        let delivered = {
            let mut session = self.shared.session.borrow_mut();
            session.set_unsafe_params(params.clone())?;
            session.params_delivered()
        };

        if !delivered {
            debug!(keys = params.len(), "unsafe params folded into initial url");
            return Ok(Delivery::FoldedIntoInitialUrl);
        }
        self.post(HostMessage::UnsafeParamsChange { params })
    }

    /// Ask the store to reload its session.
    pub fn reload_session(&self) -> Result<Delivery> {
        self.ensure_mounted()?;
        self.post(HostMessage::SessionReload)
    }

    /// Remove the message listener. Returns false if already unmounted.
    pub fn unmount(&self) -> bool {
        let guard = self.listener.borrow_mut().take();
        match guard {
            Some(mut guard) => {
                guard.detach();
                self.shared.session.borrow_mut().mark_unmounted();
                debug!(origin = %self.target_origin(), "frame bridge unmounted");
                true
            }
            None => false,
        }
    }

    pub fn phase(&self) -> SessionPhase {
        self.shared.session.borrow().phase()
    }

    pub fn params_delivered(&self) -> bool {
        self.shared.session.borrow().params_delivered()
    }

    pub fn target_origin(&self) -> Origin {
        self.shared.session.borrow().target_origin().clone()
    }

    pub fn protocol(&self) -> ProtocolVersion {
        self.shared.protocol
    }

    /// Snapshot of the session state.
    pub fn session(&self) -> FrameSession {
        self.shared.session.borrow().clone()
    }

    fn ensure_mounted(&self) -> Result<()> {
        if self.phase() == SessionPhase::Unmounted {
            return Err(BridgeError::Unmounted);
        }
        Ok(())
    }

    fn post(&self, message: HostMessage) -> Result<Delivery> {
        let envelope_type = message.envelope_type();
        let data = serde_json::to_value(&message)?;
        let origin = self.target_origin();

        let sent = self
            .frame
            .content_window()
            .and_then(|target| target.post_message(&data, &origin));
        match sent {
            Ok(()) => {
                debug!(envelope_type, %origin, "posted message to iframe");
                Ok(Delivery::Posted)
            }
            Err(err) if err.is_not_ready() => {
                warn!(envelope_type, error = %err, "iframe not ready; message dropped");
                Ok(Delivery::TargetNotReady)
            }
            Err(err) => Err(err.into()),
        }
    }
}

impl Drop for FrameBridge {
    fn drop(&mut self) {
        self.unmount();
    }
}

impl fmt::Debug for FrameBridge {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("FrameBridge")
            .field("session", &self.shared.session.borrow())
            .field("handlers", &self.shared.handlers)
            .finish()
    }
}

fn dispatch(shared: &Shared, message: &InboundMessage) {
    let origin = {
        let mut session = shared.session.borrow_mut();
        if session.phase() == SessionPhase::Unmounted {
            return;
        }
        if !session.target_origin().matches(&message.origin) {
            session.record_foreign_drop();
            debug!(origin = %message.origin, "dropping message from foreign origin");
            return;
        }
        session.target_origin().clone()
    };

    if !passes_schema(shared, &message.data) {
        return;
    }

    let event = match shared.protocol.classify(&message.data) {
        Classification::Event(event) => event,
        Classification::Unrecognized { envelope_type } => {
            debug!(?envelope_type, "ignoring unrecognized message");
            return;
        }
        Classification::Malformed {
            envelope_type,
            reason,
        } => {
            debug!(%envelope_type, %reason, "dropping malformed envelope");
            return;
        }
    };
    debug!(event = event.name(), "dispatching store event");

    let handlers = &shared.handlers;
    match event {
        StoreEvent::PathChanged { path } => {
            if let Some(handler) = handlers.on_path_change.clone() {
                handler(&path);
            }
        }
        StoreEvent::Callback(callback) => {
            let Some(handler) = handlers.on_callback.clone() else {
                return;
            };
            let Some(reply) = handler(&callback) else {
                return;
            };
            match &message.source {
                Some(source) => {
                    if let Err(err) = source.post_message(&reply, &origin) {
                        warn!(error = %err, action = %callback.action_identifier, "callback reply not delivered");
                    }
                }
                None => {
                    debug!(action = %callback.action_identifier, "callback reply dropped; message has no source");
                }
            }
        }
        StoreEvent::SetInstalled {
            listing_id,
            installed,
        } => {
            if let Some(handler) = handlers.on_installed_change.clone() {
                handler(&listing_id, installed);
            }
        }
        StoreEvent::ParamsAcknowledged { params } => {
            shared.session.borrow_mut().record_params_ack(params);
        }
        StoreEvent::SessionReloaded => {
            shared.session.borrow_mut().record_reload_ack();
        }
    }
}

#[cfg(feature = "schema")]
fn passes_schema(shared: &Shared, data: &Value) -> bool {
    match &shared.registry {
        Some(registry) => match registry.validate(data) {
            Ok(()) => true,
            Err(err) => {
                debug!(error = %err, "dropping envelope that failed schema validation");
                false
            }
        },
        None => true,
    }
}

#[cfg(not(feature = "schema"))]
fn passes_schema(_shared: &Shared, _data: &Value) -> bool {
    true
}
