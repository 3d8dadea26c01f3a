use embedlink_transport::Origin;
use url::Url;

use crate::config::BridgeConfig;
use crate::error::Result;
use crate::message::UnsafeParams;
use crate::params::{build_frame_url, check_unsafe_params, parse_url};

/// Lifecycle of a mounted bridge.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SessionPhase {
    /// Listener attached, iframe not yet pointed at the store.
    AwaitingFirstLoad,
    /// Initial URL applied; parameters now travel as messages.
    Live,
    /// Listener removed; nothing is processed any more.
    Unmounted,
}

impl SessionPhase {
    pub fn as_str(self) -> &'static str {
        match self {
            SessionPhase::AwaitingFirstLoad => "awaiting_first_load",
            SessionPhase::Live => "live",
            SessionPhase::Unmounted => "unmounted",
        }
    }
}

/// State of one embedded iframe.
#[derive(Debug, Clone, PartialEq)]
pub struct FrameSession {
    config: BridgeConfig,
    target_url: Url,
    target_origin: Origin,
    phase: SessionPhase,
    params_delivered: bool,
    last_acknowledged_params: Option<UnsafeParams>,
    reloads_acknowledged: u64,
    foreign_messages_dropped: u64,
}

impl FrameSession {
    /// Validate `config` and start in [`SessionPhase::AwaitingFirstLoad`].
    pub fn new(config: BridgeConfig) -> Result<Self> {
        check_unsafe_params(&config.unsafe_params)?;
        let target_url = parse_url(&config.target_url)?;
        let target_origin = Origin::from_url(&target_url)?;

        Ok(Self {
            config,
            target_url,
            target_origin,
            phase: SessionPhase::AwaitingFirstLoad,
            params_delivered: false,
            last_acknowledged_params: None,
            reloads_acknowledged: 0,
            foreign_messages_dropped: 0,
        })
    }

    pub fn config(&self) -> &BridgeConfig {
        &self.config
    }

    pub fn target_url(&self) -> &Url {
        &self.target_url
    }

    /// Origin every inbound message must come from.
    pub fn target_origin(&self) -> &Origin {
        &self.target_origin
    }

    pub fn phase(&self) -> SessionPhase {
        self.phase
    }

    /// True once the initial URL (with token and params) has been applied.
    pub fn params_delivered(&self) -> bool {
        self.params_delivered
    }

    pub fn unsafe_params(&self) -> &UnsafeParams {
        &self.config.unsafe_params
    }

    /// Params most recently echoed back by the store.
    pub fn last_acknowledged_params(&self) -> Option<&UnsafeParams> {
        self.last_acknowledged_params.as_ref()
    }

    pub fn reloads_acknowledged(&self) -> u64 {
        self.reloads_acknowledged
    }

    pub fn foreign_messages_dropped(&self) -> u64 {
        self.foreign_messages_dropped
    }

    /// The URL for the first navigation, or `None` once it has been used.
    /// After delivery the token and params are never put in a URL again.
    pub fn initial_url(&self) -> Result<Option<String>> {
        if self.params_delivered {
            return Ok(None);
        }
        build_frame_url(&self.config).map(|url| Some(url.into()))
    }

    /// Replace the unsafe params. Before delivery they are folded into the
    /// pending initial URL.
    pub fn set_unsafe_params(&mut self, params: UnsafeParams) -> Result<()> {
        check_unsafe_params(&params)?;
        self.config.unsafe_params = params;
        Ok(())
    }

    pub(crate) fn mark_delivered(&mut self) {
        self.params_delivered = true;
        self.phase = SessionPhase::Live;
    }

    pub(crate) fn mark_unmounted(&mut self) {
        self.phase = SessionPhase::Unmounted;
    }

    pub(crate) fn record_params_ack(&mut self, params: UnsafeParams) {
        self.last_acknowledged_params = Some(params);
    }

    pub(crate) fn record_reload_ack(&mut self) {
        self.reloads_acknowledged = self.reloads_acknowledged.saturating_add(1);
    }

    pub(crate) fn record_foreign_drop(&mut self) {
        self.foreign_messages_dropped = self.foreign_messages_dropped.saturating_add(1);
    }
}
