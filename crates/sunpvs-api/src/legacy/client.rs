// Legacy CGI HTTP client
//
// Older supervisors expose telemetry as unauthenticated `dl_cgi` commands.
// Bodies are command-specific and handed back as `serde_json::Value`
// untouched; callers that need a shape decode it themselves.

use std::time::Duration;

use serde_json::Value;
use tracing::debug;
use url::Url;

use crate::error::{Error, preview};
use crate::transport::{DEFAULT_LEGACY_TIMEOUT, TransportConfig};

const COMMAND_PATH: &str = "cgi-bin/dl_cgi";
const ESS_STATUS_PATH: &str = "cgi-bin/dl_cgi/energy-storage-system/status";

/// Full device inventory with per-device telemetry.
pub const DEVICE_LIST: &str = "DeviceList";

/// Communication interface status (ethernet, wifi, cellular, PLC).
pub const GET_COMM: &str = "Get_Comm";

/// Raw HTTP client for the supervisor's legacy CGI commands.
///
/// Stateless: no session, no retries. Commands can be slow on busy
/// supervisors, so the client is built with the long legacy timeout.
pub struct LegacyClient {
    http: reqwest::Client,
    base_url: Url,
    timeout: Duration,
}

impl LegacyClient {
    /// Create a legacy client using `transport.legacy_timeout`.
    pub fn new(base_url: Url, transport: &TransportConfig) -> Result<Self, Error> {
        let http = transport.build_legacy_client()?;
        let mut client = Self::with_client(http, base_url);
        client.timeout = transport.legacy_timeout;
        Ok(client)
    }

    /// Create a legacy client with a pre-built `reqwest::Client`.
    pub fn with_client(http: reqwest::Client, base_url: Url) -> Self {
        Self {
            http,
            base_url,
            timeout: DEFAULT_LEGACY_TIMEOUT,
        }
    }

    /// The supervisor base URL.
    pub fn base_url(&self) -> &Url {
        &self.base_url
    }

    // ── Commands ─────────────────────────────────────────────────────

    /// Run a named command and return its JSON body unmodified.
    ///
    /// `GET /cgi-bin/dl_cgi?Command=<name>`
    pub async fn run_command(&self, name: &str) -> Result<Value, Error> {
        let url = self.base_url.join(COMMAND_PATH)?;
        debug!("GET {url} Command={name}");

        self.fetch(self.http.get(url).query(&[("Command", name)])).await
    }

    /// `GET /cgi-bin/dl_cgi?Command=DeviceList`
    pub async fn device_list(&self) -> Result<Value, Error> {
        self.run_command(DEVICE_LIST).await
    }

    /// `GET /cgi-bin/dl_cgi?Command=Get_Comm`
    pub async fn comm_status(&self) -> Result<Value, Error> {
        self.run_command(GET_COMM).await
    }

    /// Energy storage status, passed through as-is.
    ///
    /// `GET /cgi-bin/dl_cgi/energy-storage-system/status`
    pub async fn ess_status(&self) -> Result<Value, Error> {
        let url = self.base_url.join(ESS_STATUS_PATH)?;
        debug!("GET {url}");

        self.fetch(self.http.get(url)).await
    }

    async fn fetch(&self, request: reqwest::RequestBuilder) -> Result<Value, Error> {
        let result = match request.send().await {
            Ok(resp) => Self::parse_body(resp).await,
            Err(e) => Err(e.into()),
        };
        result.map_err(|e| e.timed_out_after(self.timeout))
    }

    async fn parse_body(resp: reqwest::Response) -> Result<Value, Error> {
        let status = resp.status();

        if !status.is_success() {
            let body = resp.text().await.unwrap_or_default();
            return Err(Error::Http {
                status: status.as_u16(),
                message: preview(&body).to_owned(),
            });
        }

        let body = resp.text().await?;
        serde_json::from_str(&body).map_err(|e| Error::deserialization(&e, body))
    }
}
