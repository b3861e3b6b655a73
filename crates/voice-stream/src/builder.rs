//! Builder pattern for constructing a [`Streamer`].

use std::sync::Arc;

use chipper_protocol::{ConnectionCheckOptions, IntentOptions, KnowledgeGraphOptions, StreamOptions};

use crate::config::{ChipperConfig, DeviceInfo, ProbeConfig, TransportConfig};
use crate::error::StreamerError;
use crate::probe::{ConnectivityProber, Prober};
use crate::receiver::{NoopReceiver, Receiver};
use crate::streamer::Streamer;
use crate::token::TokenProvider;
use crate::transport::ChipperDialer;
use crate::ws::WsDialer;

/// Fluent builder for [`Streamer`].
///
/// # Example
///
/// ```rust,no_run
/// # use std::sync::Arc;
/// # use chipper_voice::{StreamerBuilder, IntentOptions, StaticTokenProvider, TracingReceiver};
/// let streamer = StreamerBuilder::new()
///     .url("wss://chipper.example.com:443")
///     .intent(IntentOptions::default())
///     .token_provider(Arc::new(StaticTokenProvider::new("jwt")))
///     .require_token(true)
///     .receiver(Arc::new(TracingReceiver))
///     .build()
///     .unwrap();
/// ```
pub struct StreamerBuilder {
    pub(crate) url: String,
    pub(crate) check_host: String,
    pub(crate) options: Option<StreamOptions>,
    pub(crate) token_provider: Option<Arc<dyn TokenProvider>>,
    pub(crate) require_token: bool,
    pub(crate) receiver: Arc<dyn Receiver>,
    pub(crate) dialer: Arc<dyn ChipperDialer>,
    pub(crate) prober: Option<Arc<dyn Prober>>,
    pub(crate) probe: ProbeConfig,
    pub(crate) transport: TransportConfig,
    pub(crate) device: DeviceInfo,
}

impl StreamerBuilder {
    pub fn new() -> Self {
        Self::from_config(&ChipperConfig::default())
    }

    /// Seed endpoints, probe, transport and device settings from config.
    pub fn from_config(cfg: &ChipperConfig) -> Self {
        Self {
            url: cfg.url.clone(),
            check_host: cfg.check_host.clone(),
            options: None,
            token_provider: None,
            require_token: cfg.require_token,
            receiver: Arc::new(NoopReceiver),
            dialer: Arc::new(WsDialer),
            prober: None,
            probe: cfg.probe.clone(),
            transport: cfg.transport.clone(),
            device: cfg.device.clone(),
        }
    }

    // ── Endpoints ────────────────────────────────────────────────────

    /// Set the chipper transport endpoint.
    pub fn url(mut self, url: impl Into<String>) -> Self {
        self.url = url.into();
        self
    }

    /// Set the connectivity check host (no scheme).
    pub fn check_host(mut self, host: impl Into<String>) -> Self {
        self.check_host = host.into();
        self
    }

    // ── Stream mode (exactly one) ────────────────────────────────────

    /// Set the stream mode and its options.  Replaces any earlier mode.
    pub fn options(mut self, options: StreamOptions) -> Self {
        self.options = Some(options);
        self
    }

    pub fn connection_check(self, opts: ConnectionCheckOptions) -> Self {
        self.options(StreamOptions::ConnectionCheck(opts))
    }

    pub fn knowledge_graph(self, opts: KnowledgeGraphOptions) -> Self {
        self.options(StreamOptions::KnowledgeGraph(opts))
    }

    pub fn intent(self, opts: IntentOptions) -> Self {
        self.options(StreamOptions::Intent(opts))
    }

    // ── Credentials ──────────────────────────────────────────────────

    pub fn token_provider(mut self, provider: Arc<dyn TokenProvider>) -> Self {
        self.token_provider = Some(provider);
        self
    }

    /// Fail attempts that cannot produce a credential.
    pub fn require_token(mut self, required: bool) -> Self {
        self.require_token = required;
        self
    }

    // ── Collaborators ────────────────────────────────────────────────

    pub fn receiver(mut self, receiver: Arc<dyn Receiver>) -> Self {
        self.receiver = receiver;
        self
    }

    /// Override the transport implementation (default [`WsDialer`]).
    pub fn dialer(mut self, dialer: Arc<dyn ChipperDialer>) -> Self {
        self.dialer = dialer;
        self
    }

    /// Override the reachability pre-check (default [`ConnectivityProber`]
    /// against `check_host`).
    pub fn prober(mut self, prober: Arc<dyn Prober>) -> Self {
        self.prober = Some(prober);
        self
    }

    // ── Settings ─────────────────────────────────────────────────────

    pub fn probe_config(mut self, probe: ProbeConfig) -> Self {
        self.probe = probe;
        self
    }

    pub fn transport_config(mut self, transport: TransportConfig) -> Self {
        self.transport = transport;
        self
    }

    pub fn device(mut self, device: DeviceInfo) -> Self {
        self.device = device;
        self
    }

    /// Build the [`Streamer`].
    pub fn build(self) -> Result<Streamer, StreamerError> {
        let options = self
            .options
            .ok_or_else(|| StreamerError::Config("a stream mode is required".into()))?;
        if self.url.trim().is_empty() {
            return Err(StreamerError::Config("url is required".into()));
        }
        let prober = match self.prober {
            Some(prober) => prober,
            None => {
                if matches!(options, StreamOptions::ConnectionCheck(_))
                    && self.check_host.trim().is_empty()
                {
                    return Err(StreamerError::Config(
                        "check_host is required for connection checks".into(),
                    ));
                }
                Arc::new(ConnectivityProber::new(
                    self.check_host,
                    self.device.clone(),
                    &self.probe,
                ))
            }
        };

        Ok(Streamer {
            url: self.url,
            options,
            prober,
            token_provider: self.token_provider,
            require_token: self.require_token,
            receiver: self.receiver,
            dialer: self.dialer,
            transport: self.transport,
            device: self.device,
        })
    }
}

impl Default for StreamerBuilder {
    fn default() -> Self {
        Self::new()
    }
}
