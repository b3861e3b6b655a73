//! Transport seam: opening a chipper connection and attaching a sub-stream.
//!
//! [`WsDialer`](crate::ws::WsDialer) is the shipped implementation; tests
//! and alternative transports plug in through [`ChipperDialer`].

use std::time::Duration;

use async_trait::async_trait;
use chipper_protocol::{ConnectionCheckOptions, IntentOptions, KnowledgeGraphOptions, StreamKind};

use crate::config::{DeviceInfo, TransportConfig};
use crate::token::Credentials;

/// Everything the transport needs to open one connection.
#[derive(Debug, Clone, Default)]
pub struct DialOptions {
    // ── Platform base ────────────────────────────────────────────
    /// Permit unencrypted endpoints.
    pub insecure: bool,

    // ── Common overrides ─────────────────────────────────────────
    pub connect_timeout: Option<Duration>,
    pub stream_open_timeout: Option<Duration>,
    pub headers: Vec<(String, String)>,

    // ── Per attempt ──────────────────────────────────────────────
    pub credentials: Option<Credentials>,
    pub session_id: String,
    pub firmware_version: String,
    pub boot_id: String,
}

impl DialOptions {
    /// Assemble options for one attempt from static config plus the
    /// attempt's credential and session id.
    pub fn assemble(
        transport: &TransportConfig,
        device: &DeviceInfo,
        credentials: Option<Credentials>,
        session_id: &str,
    ) -> Self {
        Self {
            insecure: transport.insecure,
            connect_timeout: transport.connect_timeout_ms.map(Duration::from_millis),
            stream_open_timeout: Some(Duration::from_millis(transport.stream_open_timeout_ms)),
            headers: transport
                .headers
                .iter()
                .map(|(k, v)| (k.clone(), v.clone()))
                .collect(),
            credentials,
            session_id: session_id.to_string(),
            firmware_version: device.os_version.clone(),
            boot_id: device.boot_id.clone(),
        }
    }
}

/// Opens transport connections to chipper.
#[async_trait]
pub trait ChipperDialer: Send + Sync {
    async fn dial(&self, url: &str, opts: &DialOptions) -> anyhow::Result<Box<dyn ChipperConn>>;
}

/// An open transport connection, before a sub-stream purpose is attached.
#[async_trait]
pub trait ChipperConn: Send + Sync {
    async fn new_connection_stream(
        &self,
        opts: &ConnectionCheckOptions,
    ) -> anyhow::Result<Box<dyn ChipperStream>>;

    async fn new_kg_stream(
        &self,
        opts: &KnowledgeGraphOptions,
    ) -> anyhow::Result<Box<dyn ChipperStream>>;

    async fn new_intent_stream(&self, opts: &IntentOptions)
        -> anyhow::Result<Box<dyn ChipperStream>>;

    /// Close the transport.  Idempotent.
    async fn close(&self);
}

/// A negotiated sub-stream.
#[async_trait]
pub trait ChipperStream: Send + Sync {
    fn kind(&self) -> StreamKind;

    /// Session id the server acknowledged for this stream.
    fn session_id(&self) -> &str;

    /// Close the stream.  Idempotent.
    async fn close(&mut self);
}
