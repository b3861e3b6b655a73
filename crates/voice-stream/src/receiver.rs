//! Notification side channel for connection attempts.

use chipper_protocol::ErrorKind;

/// Receives synchronous notifications from a connection attempt.
///
/// Called from whichever task drives the attempt; implementations must not
/// block.
pub trait Receiver: Send + Sync {
    /// The transport connection is open.  The absence of this event is how
    /// callers tell "never connected" from "connected, then the server went
    /// silent".
    fn on_stream_open(&self, session_id: &str);

    /// Out-of-band error signal.  Only the HTTPS probe failure uses it; the
    /// same failure is also returned from the attempt.
    fn on_error(&self, kind: ErrorKind, cause: &anyhow::Error);
}

/// Discards every notification.
#[derive(Debug, Default, Clone, Copy)]
pub struct NoopReceiver;

impl Receiver for NoopReceiver {
    fn on_stream_open(&self, _session_id: &str) {}
    fn on_error(&self, _kind: ErrorKind, _cause: &anyhow::Error) {}
}

/// Logs notifications through `tracing`.
#[derive(Debug, Default, Clone, Copy)]
pub struct TracingReceiver;

impl Receiver for TracingReceiver {
    fn on_stream_open(&self, session_id: &str) {
        tracing::info!(session_id = %session_id, "chipper stream opened");
    }

    fn on_error(&self, kind: ErrorKind, cause: &anyhow::Error) {
        tracing::warn!(kind = %kind, error = %cause, "chipper connection error");
    }
}
