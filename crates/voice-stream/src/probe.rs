//! Connectivity pre-checks for connection-check mode.
//!
//! Two independent HEAD requests against the check endpoint: first over
//! plain HTTP, then over HTTPS with the built-in webpki root store.  A
//! plain failure stops the check before any TLS traffic.

use std::time::{Duration, Instant};

use async_trait::async_trait;
use chipper_protocol::ErrorKind;
use reqwest::header::USER_AGENT;
use reqwest::{Client, StatusCode, Url};

use crate::config::{DeviceInfo, ProbeConfig};
use crate::context::ConnectContext;
use crate::error::{CloudError, Phase};
use crate::receiver::Receiver;

/// Reachability pre-check run before a connection-check attempt dials.
///
/// A failure must already be classified: `Connectivity` for the plain
/// check, `Tls` for the encrypted one.
#[async_trait]
pub trait Prober: Send + Sync {
    async fn probe(&self, ctx: &ConnectContext, receiver: &dyn Receiver) -> Result<(), CloudError>;
}

/// Probes the check endpoint over HTTP and HTTPS.
#[derive(Debug, Clone)]
pub struct ConnectivityProber {
    check_host: String,
    device: DeviceInfo,
    client_name: String,
    timeout: Duration,
}

impl ConnectivityProber {
    pub fn new(check_host: impl Into<String>, device: DeviceInfo, cfg: &ProbeConfig) -> Self {
        Self {
            check_host: check_host.into(),
            device,
            client_name: cfg.client_name.clone(),
            timeout: cfg.timeout(),
        }
    }

    /// `<client_name>/<app_version>`.
    pub fn user_agent(&self) -> String {
        format!("{}/{}", self.client_name, self.device.app_version)
    }

    /// Check URL for `scheme` with the device identity query suffix.
    pub fn probe_url(&self, scheme: &str) -> anyhow::Result<Url> {
        let mut url = Url::parse(&format!("{scheme}://{}", self.check_host))?;
        url.query_pairs_mut()
            .append_pair("emresn", &self.device.esn)
            .append_pair("ankiversion", &self.device.app_version)
            .append_pair("victorversion", &self.device.os_version);
        Ok(url)
    }

    async fn probe_plain(&self, ctx: &ConnectContext) -> anyhow::Result<()> {
        let client = Client::builder()
            .timeout(self.timeout)
            .pool_max_idle_per_host(0)
            .build()?;
        let url = self.probe_url("http")?;
        let start = Instant::now();
        let status = self.head(ctx, &client, url).await?;
        tracing::debug!(
            status = status.as_u16(),
            elapsed_ms = start.elapsed().as_millis() as u64,
            "dialed connection check endpoint"
        );
        Ok(())
    }

    async fn probe_tls(&self, ctx: &ConnectContext) -> anyhow::Result<()> {
        let client = Client::builder()
            .use_rustls_tls()
            .tls_built_in_root_certs(true)
            .https_only(true)
            .timeout(self.timeout)
            .pool_max_idle_per_host(0)
            .build()?;
        let url = self.probe_url("https")?;
        let start = Instant::now();
        let status = self.head(ctx, &client, url).await?;
        tracing::debug!(
            status = status.as_u16(),
            elapsed_ms = start.elapsed().as_millis() as u64,
            "dialed connection check endpoint over https"
        );
        Ok(())
    }

    /// Any HTTP status counts as reachable.
    async fn head(
        &self,
        ctx: &ConnectContext,
        client: &Client,
        url: Url,
    ) -> anyhow::Result<StatusCode> {
        let request = client.head(url).header(USER_AGENT, self.user_agent());
        let resp = ctx.run(request.send()).await??;
        Ok(resp.status())
    }
}

#[async_trait]
impl Prober for ConnectivityProber {
    /// Run both probes.  On HTTPS failure the receiver is told before the
    /// error is returned.
    async fn probe(&self, ctx: &ConnectContext, receiver: &dyn Receiver) -> Result<(), CloudError> {
        if let Err(e) = self.probe_plain(ctx).await {
            tracing::warn!(
                host = %self.check_host,
                error = %e,
                "connection check endpoint unreachable over http"
            );
            return Err(Phase::PlainProbe.classify(e));
        }

        if let Err(e) = self.probe_tls(ctx).await {
            tracing::warn!(
                host = %self.check_host,
                error = %e,
                "connection check endpoint unreachable over https"
            );
            receiver.on_error(ErrorKind::Tls, &e);
            return Err(Phase::TlsProbe.classify(e));
        }

        Ok(())
    }
}
