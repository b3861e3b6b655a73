use std::collections::BTreeMap;
use std::path::Path;
use std::time::Duration;

use serde::{Deserialize, Serialize};

use crate::error::StreamerError;

// ━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━
// Top-level config
// ━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━

/// Process-wide connection settings.  Immutable for the lifetime of an
/// attempt; handed to [`StreamerBuilder::from_config`](crate::StreamerBuilder::from_config).
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ChipperConfig {
    /// Chipper transport endpoint.
    #[serde(default = "d_url")]
    pub url: String,
    /// Host (and optional path) probed over plain HTTP and HTTPS in
    /// connection-check mode.
    #[serde(default = "d_check_host")]
    pub check_host: String,
    /// Fail the attempt when no credential can be produced.
    #[serde(default)]
    pub require_token: bool,
    #[serde(default)]
    pub probe: ProbeConfig,
    #[serde(default)]
    pub transport: TransportConfig,
    #[serde(default)]
    pub device: DeviceInfo,
}

impl Default for ChipperConfig {
    fn default() -> Self {
        Self {
            url: d_url(),
            check_host: d_check_host(),
            require_token: false,
            probe: ProbeConfig::default(),
            transport: TransportConfig::default(),
            device: DeviceInfo::default(),
        }
    }
}

impl ChipperConfig {
    /// Read and parse a TOML config file.
    pub fn load(path: impl AsRef<Path>) -> Result<Self, StreamerError> {
        let path = path.as_ref();
        let raw = std::fs::read_to_string(path).map_err(|source| StreamerError::ConfigFile {
            path: path.display().to_string(),
            source,
        })?;
        Ok(toml::from_str(&raw)?)
    }

    /// Human-readable problems with this config.  Empty means usable.
    pub fn validate(&self) -> Vec<String> {
        let mut issues = Vec::new();
        if self.url.trim().is_empty() {
            issues.push("url must not be empty".to_string());
        }
        if self.check_host.trim().is_empty() {
            issues.push("check_host must not be empty".to_string());
        }
        if self.check_host.contains("://") {
            issues.push(format!(
                "check_host must not carry a scheme: {}",
                self.check_host
            ));
        }
        if self.probe.timeout_ms == 0 {
            issues.push("probe.timeout_ms must be greater than zero".to_string());
        }
        if self.device.app_version.is_empty() {
            issues.push("device.app_version is empty (sent in User-Agent)".to_string());
        }
        issues
    }
}

// ━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━
// Connectivity probe
// ━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ProbeConfig {
    /// Per-request timeout for each HEAD probe.
    #[serde(default = "d_8000")]
    pub timeout_ms: u64,
    /// Client name in the `User-Agent` header (`<client_name>/<app_version>`).
    #[serde(default = "d_client_name")]
    pub client_name: String,
}

impl Default for ProbeConfig {
    fn default() -> Self {
        Self {
            timeout_ms: 8000,
            client_name: d_client_name(),
        }
    }
}

impl ProbeConfig {
    pub fn timeout(&self) -> Duration {
        Duration::from_millis(self.timeout_ms)
    }
}

// ━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━
// Transport
// ━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TransportConfig {
    /// Allow unencrypted transports (development platforms only).
    #[serde(default)]
    pub insecure: bool,
    #[serde(default = "d_connect_timeout")]
    pub connect_timeout_ms: Option<u64>,
    #[serde(default = "d_10000")]
    pub stream_open_timeout_ms: u64,
    /// Extra request headers applied to every transport open.
    #[serde(default)]
    pub headers: BTreeMap<String, String>,
}

impl Default for TransportConfig {
    fn default() -> Self {
        Self {
            insecure: false,
            connect_timeout_ms: d_connect_timeout(),
            stream_open_timeout_ms: 10_000,
            headers: BTreeMap::new(),
        }
    }
}

// ━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━
// Device identity
// ━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━

/// Read-only robot identity strings sent with probes and transport opens.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct DeviceInfo {
    /// Electronic serial number.
    #[serde(default)]
    pub esn: String,
    /// OS / firmware version.
    #[serde(default)]
    pub os_version: String,
    /// Application version.
    #[serde(default)]
    pub app_version: String,
    /// Kernel boot id.
    #[serde(default)]
    pub boot_id: String,
}

// ── serde default helpers ───────────────────────────────────────────

fn d_url() -> String {
    "wss://chipper.api.anki.com:443".into()
}
fn d_check_host() -> String {
    "conncheck.global.anki-services.com/ok".into()
}
fn d_client_name() -> String {
    "Victor-CCHECK".into()
}
fn d_8000() -> u64 {
    8000
}
fn d_10000() -> u64 {
    10_000
}
fn d_connect_timeout() -> Option<u64> {
    Some(10_000)
}
