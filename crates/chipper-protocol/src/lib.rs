//! Chipper stream protocol: error taxonomy, sub-stream option bundles, and
//! the control messages exchanged while a sub-stream is negotiated.
//!
//! A device opens one transport per attempt and attaches exactly one
//! sub-stream to it.  The sub-stream purpose is carried by [`StreamOptions`],
//! a sum type, so "no purpose selected" cannot be expressed on the wire.

use std::fmt;

use serde::{Deserialize, Serialize};

/// Current stream protocol version, sent in [`StreamMessage::OpenStream`].
pub const PROTOCOL_VERSION: u32 = 1;

/// Transport request header carrying the per-attempt session id.
pub const HEADER_SESSION_ID: &str = "x-chipper-session-id";
/// Transport request header carrying the device OS/firmware version.
pub const HEADER_FIRMWARE_VERSION: &str = "x-chipper-firmware-version";
/// Transport request header carrying the device boot id.
pub const HEADER_BOOT_ID: &str = "x-chipper-boot-id";

// ━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━
// Error taxonomy
// ━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━

/// Reason code for a failed connection attempt.
///
/// Upstream control logic switches on this value; the underlying cause is
/// only ever logged.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ErrorKind {
    /// Plain-HTTP connectivity probe failed.
    Connectivity,
    /// HTTPS connectivity probe failed.
    Tls,
    /// Credential required but absent, or the credential provider failed.
    Token,
    /// The transport connection could not be opened.
    Connecting,
    /// The transport opened but the sub-stream could not be negotiated.
    NewStream,
}

impl ErrorKind {
    pub fn as_str(self) -> &'static str {
        match self {
            ErrorKind::Connectivity => "connectivity",
            ErrorKind::Tls => "tls",
            ErrorKind::Token => "token",
            ErrorKind::Connecting => "connecting",
            ErrorKind::NewStream => "new_stream",
        }
    }
}

impl fmt::Display for ErrorKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

// ━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━
// Sub-stream options
// ━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━

/// Settings shared by every sub-stream type.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct StreamSettings {
    #[serde(default = "d_language")]
    pub language: String,
    /// IANA timezone name, e.g. `"America/Los_Angeles"`.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub timezone: Option<String>,
    /// Ask the server to keep the uploaded audio for analysis.
    #[serde(default)]
    pub save_audio: bool,
    /// Audio compression parameters.  `None` streams raw PCM.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub compress: Option<CompressOptions>,
}

impl Default for StreamSettings {
    fn default() -> Self {
        Self {
            language: d_language(),
            timezone: None,
            save_audio: false,
            compress: None,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct CompressOptions {
    pub bitrate: u32,
    pub complexity: u32,
    pub frame_size_ms: u32,
}

/// Options for the connection-check sub-stream.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct ConnectionCheckOptions {
    #[serde(default)]
    pub stream: StreamSettings,
    /// Total audio the server should expect during the check.
    #[serde(default)]
    pub total_audio_ms: u32,
    /// Audio sent per request during the check.
    #[serde(default)]
    pub audio_per_request: u32,
}

/// Options for the keyword / knowledge-graph sub-stream.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct KnowledgeGraphOptions {
    #[serde(default)]
    pub stream: StreamSettings,
}

/// Options for the intent sub-stream.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct IntentOptions {
    #[serde(default)]
    pub stream: StreamSettings,
    #[serde(default)]
    pub handler: IntentService,
    /// Return only the transcript, skip intent matching.
    #[serde(default)]
    pub speech_only: bool,
}

/// Which intent engine the server should route the utterance to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum IntentService {
    #[default]
    Default,
    Dialogflow,
    Lex,
    Bing,
}

/// The single sub-stream purpose of an attempt, with its option payload.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "mode", rename_all = "snake_case")]
pub enum StreamOptions {
    ConnectionCheck(ConnectionCheckOptions),
    KnowledgeGraph(KnowledgeGraphOptions),
    Intent(IntentOptions),
}

impl StreamOptions {
    pub fn kind(&self) -> StreamKind {
        match self {
            StreamOptions::ConnectionCheck(_) => StreamKind::ConnectionCheck,
            StreamOptions::KnowledgeGraph(_) => StreamKind::KnowledgeGraph,
            StreamOptions::Intent(_) => StreamKind::Intent,
        }
    }

    /// Settings common to every mode.
    pub fn settings(&self) -> &StreamSettings {
        match self {
            StreamOptions::ConnectionCheck(o) => &o.stream,
            StreamOptions::KnowledgeGraph(o) => &o.stream,
            StreamOptions::Intent(o) => &o.stream,
        }
    }
}

/// Payload-free discriminant of [`StreamOptions`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum StreamKind {
    ConnectionCheck,
    KnowledgeGraph,
    Intent,
}

impl StreamKind {
    pub fn as_str(self) -> &'static str {
        match self {
            StreamKind::ConnectionCheck => "connection_check",
            StreamKind::KnowledgeGraph => "knowledge_graph",
            StreamKind::Intent => "intent",
        }
    }
}

impl fmt::Display for StreamKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

// ━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━
// Control messages
// ━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━

/// Sub-stream negotiation envelope, sent as JSON text frames.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum StreamMessage {
    /// Device → server: attach a sub-stream to this transport.
    OpenStream {
        protocol_version: u32,
        options: StreamOptions,
    },
    /// Server → device: sub-stream accepted.
    StreamOpened { session_id: String },
    /// Server → device: sub-stream refused.
    StreamRejected { reason: String },
}

fn d_language() -> String {
    "en-US".into()
}
