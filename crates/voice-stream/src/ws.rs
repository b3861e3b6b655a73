//! WebSocket implementation of the chipper transport.
//!
//! Transport open is the WebSocket handshake, with the session id, device
//! identifiers and credentials carried as request headers.  Sub-stream
//! negotiation is one `open_stream` text frame answered by `stream_opened`
//! or `stream_rejected`.

use std::time::Duration;

use anyhow::{anyhow, bail};
use async_trait::async_trait;
use chipper_protocol::{
    ConnectionCheckOptions, IntentOptions, KnowledgeGraphOptions, StreamKind, StreamMessage,
    StreamOptions, HEADER_BOOT_ID, HEADER_FIRMWARE_VERSION, HEADER_SESSION_ID, PROTOCOL_VERSION,
};
use futures_util::{SinkExt, StreamExt};
use tokio::net::TcpStream;
use tokio::sync::Mutex;
use tokio_tungstenite::tungstenite::client::IntoClientRequest;
use tokio_tungstenite::tungstenite::handshake::client::Request;
use tokio_tungstenite::tungstenite::http::{HeaderName, HeaderValue};
use tokio_tungstenite::tungstenite::Message;
use tokio_tungstenite::{MaybeTlsStream, WebSocketStream};

use crate::transport::{ChipperConn, ChipperDialer, ChipperStream, DialOptions};

type Socket = WebSocketStream<MaybeTlsStream<TcpStream>>;

/// Dials chipper over WebSocket.
#[derive(Debug, Default, Clone, Copy)]
pub struct WsDialer;

#[async_trait]
impl ChipperDialer for WsDialer {
    async fn dial(&self, url: &str, opts: &DialOptions) -> anyhow::Result<Box<dyn ChipperConn>> {
        let request = build_request(url, opts)?;
        tracing::debug!(url = %url, session_id = %opts.session_id, "opening chipper transport");

        let connect = tokio_tungstenite::connect_async(request);
        let (socket, _response) = match opts.connect_timeout {
            Some(t) => tokio::time::timeout(t, connect)
                .await
                .map_err(|_| anyhow!("transport open timed out after {}ms", t.as_millis()))??,
            None => connect.await?,
        };

        Ok(Box::new(WsConn {
            socket: Mutex::new(Some(socket)),
            session_id: opts.session_id.clone(),
            stream_open_timeout: opts.stream_open_timeout,
        }))
    }
}

/// Build the handshake request with all attempt metadata as headers.
fn build_request(url: &str, opts: &DialOptions) -> anyhow::Result<Request> {
    let mut request = url.into_client_request()?;

    match request.uri().scheme_str() {
        Some("wss") => {}
        Some("ws") if opts.insecure => {}
        Some("ws") => bail!("insecure transport refused for {url}"),
        other => bail!("unsupported transport scheme {other:?} in {url}"),
    }

    let headers = request.headers_mut();
    for (key, value) in &opts.headers {
        headers.insert(
            HeaderName::from_bytes(key.as_bytes())?,
            HeaderValue::from_str(value)?,
        );
    }
    if let Some(creds) = &opts.credentials {
        for (key, value) in creds.metadata() {
            headers.insert(
                HeaderName::from_bytes(key.as_bytes())?,
                HeaderValue::from_str(value)?,
            );
        }
    }
    headers.insert(
        HeaderName::from_static(HEADER_SESSION_ID),
        HeaderValue::from_str(&opts.session_id)?,
    );
    headers.insert(
        HeaderName::from_static(HEADER_FIRMWARE_VERSION),
        HeaderValue::from_str(&opts.firmware_version)?,
    );
    headers.insert(
        HeaderName::from_static(HEADER_BOOT_ID),
        HeaderValue::from_str(&opts.boot_id)?,
    );

    Ok(request)
}

/// An open WebSocket transport.  Carries at most one sub-stream; the
/// socket moves into the stream once negotiation succeeds.
struct WsConn {
    socket: Mutex<Option<Socket>>,
    session_id: String,
    stream_open_timeout: Option<Duration>,
}

impl WsConn {
    async fn open_stream(&self, options: StreamOptions) -> anyhow::Result<Box<dyn ChipperStream>> {
        let kind = options.kind();
        let language = options.settings().language.clone();
        let mut socket = self
            .socket
            .lock()
            .await
            .take()
            .ok_or_else(|| anyhow!("transport already carries a stream"))?;

        let open = StreamMessage::OpenStream {
            protocol_version: PROTOCOL_VERSION,
            options,
        };
        socket.send(Message::Text(serde_json::to_string(&open)?)).await?;

        let negotiated = match self.stream_open_timeout {
            Some(t) => tokio::time::timeout(t, await_ack(&mut socket))
                .await
                .unwrap_or_else(|_| Err(anyhow!("no stream ack within {}ms", t.as_millis()))),
            None => await_ack(&mut socket).await,
        };
        let acked = match negotiated {
            Ok(acked) => acked,
            Err(e) => {
                let _ = socket.close(None).await;
                return Err(e);
            }
        };

        if !acked.is_empty() && acked != self.session_id {
            let _ = socket.close(None).await;
            bail!(
                "server acknowledged session {acked}, expected {}",
                self.session_id
            );
        }

        tracing::debug!(
            session_id = %self.session_id,
            kind = %kind,
            language = %language,
            "chipper stream acknowledged"
        );

        Ok(Box::new(WsStream {
            socket: Mutex::new(Some(socket)),
            kind,
            session_id: self.session_id.clone(),
        }))
    }
}

#[async_trait]
impl ChipperConn for WsConn {
    async fn new_connection_stream(
        &self,
        opts: &ConnectionCheckOptions,
    ) -> anyhow::Result<Box<dyn ChipperStream>> {
        self.open_stream(StreamOptions::ConnectionCheck(opts.clone()))
            .await
    }

    async fn new_kg_stream(
        &self,
        opts: &KnowledgeGraphOptions,
    ) -> anyhow::Result<Box<dyn ChipperStream>> {
        self.open_stream(StreamOptions::KnowledgeGraph(opts.clone()))
            .await
    }

    async fn new_intent_stream(
        &self,
        opts: &IntentOptions,
    ) -> anyhow::Result<Box<dyn ChipperStream>> {
        self.open_stream(StreamOptions::Intent(opts.clone())).await
    }

    async fn close(&self) {
        if let Some(mut socket) = self.socket.lock().await.take() {
            let _ = socket.close(None).await;
        }
    }
}

/// Wait for the server's answer to `open_stream`.  Returns the session id
/// the server acknowledged.
async fn await_ack(socket: &mut Socket) -> anyhow::Result<String> {
    while let Some(msg) = socket.next().await {
        match msg? {
            Message::Text(text) => match serde_json::from_str::<StreamMessage>(&text) {
                Ok(StreamMessage::StreamOpened { session_id }) => return Ok(session_id),
                Ok(StreamMessage::StreamRejected { reason }) => {
                    bail!("stream rejected: {reason}")
                }
                Ok(_) => tracing::debug!("ignoring message before stream ack: {}", &text),
                Err(e) => tracing::debug!(error = %e, "failed to parse message"),
            },
            Message::Close(_) => bail!("server closed transport before stream ack"),
            _ => {}
        }
    }
    bail!("transport ended before stream ack")
}

struct WsStream {
    socket: Mutex<Option<Socket>>,
    kind: StreamKind,
    session_id: String,
}

#[async_trait]
impl ChipperStream for WsStream {
    fn kind(&self) -> StreamKind {
        self.kind
    }

    fn session_id(&self) -> &str {
        &self.session_id
    }

    async fn close(&mut self) {
        if let Some(mut socket) = self.socket.get_mut().take() {
            let _ = socket.close(None).await;
        }
    }
}
