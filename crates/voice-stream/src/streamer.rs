//! Connection attempt orchestration.
//!
//! `probe (check mode) → credentials (if a provider is set) → session id →
//! transport open → on_stream_open → sub-stream open`.  Each phase either
//! advances or ends the attempt with exactly one [`CloudError`].

use std::sync::Arc;
use std::time::{Duration, Instant};

use chipper_protocol::{StreamKind, StreamOptions};

use crate::config::{DeviceInfo, TransportConfig};
use crate::context::ConnectContext;
use crate::error::{CloudError, Phase};
use crate::probe::Prober;
use crate::receiver::Receiver;
use crate::session::new_session_id;
use crate::token::{Credentials, TokenProvider};
use crate::transport::{ChipperConn, ChipperDialer, ChipperStream, DialOptions};

/// A configured connection attempt factory.
///
/// Create via [`StreamerBuilder`](crate::builder::StreamerBuilder).  Every
/// call to [`connect`](Self::connect) is an independent attempt.
pub struct Streamer {
    pub(crate) url: String,
    pub(crate) options: StreamOptions,
    pub(crate) prober: Arc<dyn Prober>,
    pub(crate) token_provider: Option<Arc<dyn TokenProvider>>,
    pub(crate) require_token: bool,
    pub(crate) receiver: Arc<dyn Receiver>,
    pub(crate) dialer: Arc<dyn ChipperDialer>,
    pub(crate) transport: TransportConfig,
    pub(crate) device: DeviceInfo,
}

/// Diagnostic timings of a successful attempt.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct ConnectTimings {
    /// Time spent in the token provider, when one is configured.
    pub token: Option<Duration>,
    /// Transport open plus sub-stream negotiation.
    pub connect: Duration,
}

/// A fully-open chipper connection: the transport and its single
/// negotiated sub-stream.  Owned by the caller.
pub struct Conn {
    session_id: String,
    transport: Box<dyn ChipperConn>,
    stream: Box<dyn ChipperStream>,
    timings: ConnectTimings,
}

impl Conn {
    pub fn session_id(&self) -> &str {
        &self.session_id
    }

    pub fn kind(&self) -> StreamKind {
        self.stream.kind()
    }

    pub fn timings(&self) -> ConnectTimings {
        self.timings
    }

    pub fn stream(&self) -> &dyn ChipperStream {
        self.stream.as_ref()
    }

    pub fn stream_mut(&mut self) -> &mut dyn ChipperStream {
        self.stream.as_mut()
    }

    pub fn transport(&self) -> &dyn ChipperConn {
        self.transport.as_ref()
    }

    /// Split into the transport and the stream.
    pub fn into_parts(self) -> (Box<dyn ChipperConn>, Box<dyn ChipperStream>) {
        (self.transport, self.stream)
    }

    /// Close the stream, then the transport.
    pub async fn close(mut self) {
        self.stream.close().await;
        self.transport.close().await;
    }
}

impl std::fmt::Debug for Conn {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Conn")
            .field("session_id", &self.session_id)
            .field("kind", &self.stream.kind())
            .field("timings", &self.timings)
            .finish()
    }
}

impl Streamer {
    /// Start a new builder.
    pub fn builder() -> crate::builder::StreamerBuilder {
        crate::builder::StreamerBuilder::new()
    }

    pub fn options(&self) -> &StreamOptions {
        &self.options
    }

    /// Run one connection attempt under `ctx`.
    pub async fn connect(&self, ctx: &ConnectContext) -> Result<Conn, CloudError> {
        let mode = self.options.kind();

        if matches!(self.options, StreamOptions::ConnectionCheck(_)) {
            self.prober.probe(ctx, self.receiver.as_ref()).await?;
        }

        let (credentials, token_time) = self.acquire_credentials(ctx).await?;

        let session_id = new_session_id();
        let start = Instant::now();
        let result = self.open_chipper_stream(ctx, credentials, &session_id).await;
        let connect_time = start.elapsed();

        let (transport, stream) = match result {
            Ok(parts) => parts,
            Err(e) => {
                tracing::warn!(
                    mode = %mode,
                    session_id = %session_id,
                    kind = %e.kind,
                    error = %e.cause,
                    elapsed_ms = connect_time.as_millis() as u64,
                    "error creating chipper stream"
                );
                return Err(e);
            }
        };

        tracing::debug!(
            mode = %mode,
            session_id = %session_id,
            connect_ms = connect_time.as_millis() as u64,
            token_ms = token_time.map(|t| t.as_millis() as u64).unwrap_or(0),
            "created chipper session"
        );

        Ok(Conn {
            session_id,
            transport,
            stream,
            timings: ConnectTimings {
                token: token_time,
                connect: connect_time,
            },
        })
    }

    /// Fetch credentials if a provider is configured.  Always timed.
    async fn acquire_credentials(
        &self,
        ctx: &ConnectContext,
    ) -> Result<(Option<Credentials>, Option<Duration>), CloudError> {
        let Some(provider) = &self.token_provider else {
            if self.require_token {
                return Err(Phase::Token.classify(anyhow::anyhow!(
                    "token required, no token provider configured"
                )));
            }
            return Ok((None, None));
        };

        let start = Instant::now();
        let result = ctx.run(provider.credentials()).await;
        let elapsed = start.elapsed();

        // An interrupted fetch ends the attempt even when no token is required.
        let outcome = result
            .map_err(|interrupted| Phase::Token.classify(interrupted))?
            .map(|creds| creds.filter(|c| !c.is_empty()));

        match outcome {
            Ok(Some(creds)) => Ok((Some(creds), Some(elapsed))),
            Ok(None) if self.require_token => Err(Phase::Token.classify(anyhow::anyhow!(
                "token required, got empty credentials"
            ))),
            Ok(None) => Ok((None, Some(elapsed))),
            Err(e) if self.require_token => Err(Phase::Token.classify(e)),
            Err(e) => {
                tracing::warn!(error = %e, "token provider failed, continuing without credentials");
                Ok((None, Some(elapsed)))
            }
        }
    }

    /// Open the transport, announce it, then attach the one sub-stream the
    /// options select.
    async fn open_chipper_stream(
        &self,
        ctx: &ConnectContext,
        credentials: Option<Credentials>,
        session_id: &str,
    ) -> Result<(Box<dyn ChipperConn>, Box<dyn ChipperStream>), CloudError> {
        let opts = DialOptions::assemble(&self.transport, &self.device, credentials, session_id);

        let transport = ctx
            .run(self.dialer.dial(&self.url, &opts))
            .await
            .map_err(|e| Phase::Connect.classify(e))?
            .map_err(|e| Phase::Connect.classify(e))?;

        // Tells the caller a transport existed; its absence is how a
        // server timeout is told apart from a failed connect.
        self.receiver.on_stream_open(session_id);

        let opened = match &self.options {
            StreamOptions::ConnectionCheck(o) => ctx.run(transport.new_connection_stream(o)).await,
            StreamOptions::KnowledgeGraph(o) => ctx.run(transport.new_kg_stream(o)).await,
            StreamOptions::Intent(o) => ctx.run(transport.new_intent_stream(o)).await,
        };

        let stream = match opened {
            Ok(Ok(stream)) => stream,
            Ok(Err(e)) => {
                transport.close().await;
                return Err(Phase::NewStream.classify(e));
            }
            Err(interrupted) => {
                transport.close().await;
                return Err(Phase::NewStream.classify(interrupted));
            }
        };

        Ok((transport, stream))
    }
}
