//! Per-call credentials for the chipper transport.

use std::fmt;

use async_trait::async_trait;

/// Request metadata that authenticates one transport open.
#[derive(Clone, Default, PartialEq, Eq)]
pub struct Credentials {
    metadata: Vec<(String, String)>,
}

impl Credentials {
    /// `authorization: Bearer <token>`.
    pub fn bearer(token: impl AsRef<str>) -> Self {
        Self::default().with("authorization", format!("Bearer {}", token.as_ref()))
    }

    /// Add one metadata entry.  Keys are lowercased.
    pub fn with(mut self, key: impl Into<String>, value: impl Into<String>) -> Self {
        self.metadata
            .push((key.into().to_ascii_lowercase(), value.into()));
        self
    }

    pub fn metadata(&self) -> &[(String, String)] {
        &self.metadata
    }

    pub fn get(&self, key: &str) -> Option<&str> {
        self.metadata
            .iter()
            .find(|(k, _)| k.eq_ignore_ascii_case(key))
            .map(|(_, v)| v.as_str())
    }

    pub fn is_empty(&self) -> bool {
        self.metadata.is_empty()
    }
}

// Values are secrets; only the keys are printed.
impl fmt::Debug for Credentials {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_list()
            .entries(self.metadata.iter().map(|(k, _)| k))
            .finish()
    }
}

/// Supplies credentials for each connection attempt.
///
/// `Ok(None)` means "no credential available right now"; whether that is
/// fatal is decided by the streamer's `require_token` setting.
#[async_trait]
pub trait TokenProvider: Send + Sync {
    async fn credentials(&self) -> anyhow::Result<Option<Credentials>>;
}

/// Hands out the same bearer token on every call.
#[derive(Clone)]
pub struct StaticTokenProvider {
    token: Option<String>,
}

impl StaticTokenProvider {
    pub fn new(token: impl Into<String>) -> Self {
        let token = token.into();
        Self {
            token: (!token.is_empty()).then_some(token),
        }
    }

    /// A provider that never has a token.
    pub fn empty() -> Self {
        Self { token: None }
    }
}

#[async_trait]
impl TokenProvider for StaticTokenProvider {
    async fn credentials(&self) -> anyhow::Result<Option<Credentials>> {
        Ok(self.token.as_deref().map(Credentials::bearer))
    }
}
