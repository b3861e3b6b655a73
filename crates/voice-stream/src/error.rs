//! Classified connection errors and the phase → reason mapping.

use chipper_protocol::ErrorKind;

/// A failed connection attempt: the reason code plus the original failure.
///
/// Callers branch on [`kind`](Self::kind); the cause is for logs only.
#[derive(thiserror::Error, Debug)]
#[error("{kind}: {cause}")]
pub struct CloudError {
    pub kind: ErrorKind,
    #[source]
    pub cause: anyhow::Error,
}

impl CloudError {
    pub fn new(kind: ErrorKind, cause: impl Into<anyhow::Error>) -> Self {
        Self {
            kind,
            cause: cause.into(),
        }
    }

    pub fn kind(&self) -> ErrorKind {
        self.kind
    }

    pub fn cause(&self) -> &anyhow::Error {
        &self.cause
    }
}

/// The fallible phases of one connection attempt.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Phase {
    PlainProbe,
    TlsProbe,
    Token,
    Connect,
    NewStream,
}

impl Phase {
    /// The reason code reported for a failure during this phase.
    pub fn kind(self) -> ErrorKind {
        match self {
            Phase::PlainProbe => ErrorKind::Connectivity,
            Phase::TlsProbe => ErrorKind::Tls,
            Phase::Token => ErrorKind::Token,
            Phase::Connect => ErrorKind::Connecting,
            Phase::NewStream => ErrorKind::NewStream,
        }
    }

    /// Wrap a raw failure from this phase.
    pub fn classify(self, cause: impl Into<anyhow::Error>) -> CloudError {
        CloudError::new(self.kind(), cause)
    }
}

/// Errors raised while assembling a [`Streamer`](crate::Streamer) or
/// loading its configuration.
///
/// These are caller contract violations, never network conditions, so they
/// are kept out of the [`CloudError`] taxonomy.
#[derive(thiserror::Error, Debug)]
pub enum StreamerError {
    #[error("config: {0}")]
    Config(String),
    #[error("config file {path}: {source}")]
    ConfigFile {
        path: String,
        #[source]
        source: std::io::Error,
    },
    #[error("config parse: {0}")]
    ConfigParse(#[from] toml::de::Error),
}
