//! `chipper-voice`: opens authenticated streaming connections from the
//! robot to the chipper speech backend.
//!
//! One call to [`Streamer::connect`] is one connection attempt.  The attempt
//! either yields a fully-open [`Conn`] (transport plus exactly one
//! sub-stream) or a single [`CloudError`] whose [`ErrorKind`] tells the
//! caller which phase failed.  Retrying is the caller's job: build a new
//! attempt and it gets a new session id.
//!
//! # Architecture
//!
//! ```text
//! ┌──────────────────────────────────────────────────────────────┐
//! │  Streamer::connect(&ctx)                                     │
//! │                                                              │
//! │   ConnectivityProber ── HEAD http:// , HEAD https://         │
//! │        (connection-check mode only)                          │
//! │   TokenProvider      ── per-call credentials (optional)      │
//! │   new_session_id()   ── 16 chars, fresh per attempt          │
//! │   ChipperDialer      ── transport open                       │
//! │        └─ Receiver::on_stream_open(session_id)               │
//! │   ChipperConn        ── exactly one sub-stream               │
//! └──────────────────────────────────────────────────────────────┘
//! ```
//!
//! # Error mapping
//!
//! | Phase              | Reason                       |
//! |--------------------|------------------------------|
//! | plain HTTP probe   | [`ErrorKind::Connectivity`]  |
//! | HTTPS probe        | [`ErrorKind::Tls`]           |
//! | credentials        | [`ErrorKind::Token`]         |
//! | transport open     | [`ErrorKind::Connecting`]    |
//! | sub-stream open    | [`ErrorKind::NewStream`]     |

pub mod builder;
pub mod config;
pub mod context;
pub mod error;
pub mod probe;
pub mod receiver;
pub mod session;
pub mod streamer;
pub mod token;
pub mod transport;
pub mod ws;

// ── Re-exports for ergonomic imports ─────────────────────────────────

pub use builder::StreamerBuilder;
pub use config::{ChipperConfig, DeviceInfo, ProbeConfig, TransportConfig};
pub use context::{ConnectContext, Interrupted};
pub use error::{CloudError, Phase, StreamerError};
pub use probe::{ConnectivityProber, Prober};
pub use receiver::{NoopReceiver, Receiver, TracingReceiver};
pub use session::new_session_id;
pub use streamer::{Conn, ConnectTimings, Streamer};
pub use token::{Credentials, StaticTokenProvider, TokenProvider};
pub use transport::{ChipperConn, ChipperDialer, ChipperStream, DialOptions};
pub use ws::WsDialer;

// Re-export protocol types so callers never need to import chipper-protocol directly.
pub use chipper_protocol::{
    ConnectionCheckOptions, ErrorKind, IntentOptions, IntentService, KnowledgeGraphOptions,
    StreamKind, StreamOptions, StreamSettings,
};
