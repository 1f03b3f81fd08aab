// Capability probe
//
// One-shot, unauthenticated check of the supervisor info endpoint that
// decides whether a PVS speaks LocalAPI. Never fails: every problem is
// folded into `Capability::error` so setup flows can show it verbatim.

use std::time::Duration;

use serde::Serialize;
use serde_json::Value;
use tracing::debug;
use url::Url;

use crate::auth::LOGIN_PATH;
use crate::transport::{DEFAULT_TIMEOUT, TransportConfig, base_url};

/// Lowest firmware build that ships the LocalAPI (`/auth`, `/vars`).
pub const MIN_LOCALAPI_BUILD: i64 = 61840;

pub(crate) const SUPERVISOR_INFO_PATH: &str = "cgi-bin/dl_cgi/supervisor/info";

/// Outcome of a capability probe.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct Capability {
    pub supported: bool,
    pub build: Option<i64>,
    pub version: Option<String>,
    pub serial: Option<String>,
    pub error: Option<String>,
    /// Result of the `/auth` liveness check: `Some(true)` if the endpoint
    /// answered with anything but 404, `None` if skipped or unreachable.
    pub auth_endpoint: Option<bool>,
}

impl Capability {
    fn failed(error: impl Into<String>) -> Self {
        Self {
            error: Some(error.into()),
            ..Self::default()
        }
    }
}

/// Tuning for [`probe`].
#[derive(Debug, Clone)]
pub struct ProbeOptions {
    pub timeout: Duration,
    /// Confirm the LocalAPI login endpoint exists once the build qualifies.
    pub check_auth_endpoint: bool,
}

impl Default for ProbeOptions {
    fn default() -> Self {
        Self {
            timeout: DEFAULT_TIMEOUT,
            check_auth_endpoint: true,
        }
    }
}

/// Probe a host given as an address or URL.
pub async fn probe_host(host: &str, options: &ProbeOptions) -> Capability {
    match base_url(host) {
        Ok(url) => probe(&url, options).await,
        Err(e) => Capability::failed(format!("Invalid host: {e}")),
    }
}

/// Probe a supervisor for LocalAPI support.
///
/// `GET /cgi-bin/dl_cgi/supervisor/info` → `{"supervisor": {"BUILD", "SWVER", "SERIAL"}}`
pub async fn probe(base_url: &Url, options: &ProbeOptions) -> Capability {
    let transport = TransportConfig {
        timeout: options.timeout,
        ..TransportConfig::default()
    };
    let http = match transport.build_client() {
        Ok(http) => http,
        Err(e) => return Capability::failed(format!("Connection failed: {e}")),
    };

    let url = match base_url.join(SUPERVISOR_INFO_PATH) {
        Ok(url) => url,
        Err(e) => return Capability::failed(format!("Invalid host: {e}")),
    };
    debug!("probing supervisor info at {url}");

    let resp = match http.get(url).send().await {
        Ok(resp) => resp,
        Err(e) => return Capability::failed(format!("Connection failed: {e}")),
    };

    let status = resp.status();
    if status != reqwest::StatusCode::OK {
        return Capability::failed(format!("HTTP {}", status.as_u16()));
    }

    let body = match resp.text().await {
        Ok(body) => body,
        Err(e) => return Capability::failed(format!("Connection failed: {e}")),
    };

    let mut capability = match parse_supervisor_info(&body) {
        Some(capability) => capability,
        None => return Capability::failed("Invalid response format"),
    };

    match capability.build {
        Some(build) if build >= MIN_LOCALAPI_BUILD => capability.supported = true,
        build => {
            let shown = build.map_or_else(|| "unknown".to_owned(), |b| b.to_string());
            capability.error = Some(format!(
                "Firmware build {shown} is too old. LocalAPI requires build {MIN_LOCALAPI_BUILD}+"
            ));
        }
    }

    if capability.supported && options.check_auth_endpoint {
        check_auth_endpoint(&http, base_url, &mut capability).await;
    }

    debug!(
        supported = capability.supported,
        build = ?capability.build,
        "probe complete"
    );
    capability
}

/// Any answer other than 404 proves the LocalAPI surface exists, even a
/// 401/403. Unreachable leaves the build-number decision in place.
async fn check_auth_endpoint(http: &reqwest::Client, base_url: &Url, capability: &mut Capability) {
    let Ok(url) = base_url.join(LOGIN_PATH) else {
        return;
    };
    debug!("checking LocalAPI endpoint at {url}");

    match http.get(url).send().await {
        Ok(resp) if resp.status() == reqwest::StatusCode::NOT_FOUND => {
            capability.auth_endpoint = Some(false);
            capability.supported = false;
            capability.error = Some("LocalAPI login endpoint not found (HTTP 404)".into());
        }
        Ok(_) => capability.auth_endpoint = Some(true),
        Err(e) => debug!(error = %e, "LocalAPI endpoint unreachable, keeping build decision"),
    }
}

/// Extract build/version/serial from a supervisor info body.
///
/// Returns `None` when the body is not JSON or has no `supervisor` object.
pub(crate) fn parse_supervisor_info(body: &str) -> Option<Capability> {
    let value: Value = serde_json::from_str(body).ok()?;
    let supervisor = value.get("supervisor")?.as_object()?;

    let build = supervisor.get("BUILD").and_then(|b| match b {
        Value::Number(n) => n.as_i64(),
        Value::String(s) => s.trim().parse().ok(),
        _ => None,
    });
    let text = |key: &str| {
        supervisor.get(key).and_then(|v| match v {
            Value::String(s) => Some(s.clone()),
            Value::Number(n) => Some(n.to_string()),
            _ => None,
        })
    };

    Some(Capability {
        build,
        version: text("SWVER"),
        serial: text("SERIAL"),
        ..Capability::default()
    })
}
