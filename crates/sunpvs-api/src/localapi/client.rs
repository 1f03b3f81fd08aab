// LocalAPI HTTP client
//
// Wraps `reqwest::Client` with supervisor URL construction, session cookie
// injection, and the re-authenticate/retry policy for `/vars`. Login lives
// in `auth.rs`; this module stays focused on transport mechanics.

use std::time::Duration;

use reqwest::header::COOKIE;
use secrecy::SecretString;
use tracing::{debug, warn};
use url::Url;

use crate::auth::Session;
use crate::error::{Error, preview};
use crate::localapi::vars::{VarMap, VarQuery};
use crate::transport::{DEFAULT_TIMEOUT, TransportConfig};

/// Bounds on `/vars` retries, counted separately per failure class.
///
/// A class surfaces its error once it has failed `max_*_attempts` times.
/// There is no delay between attempts.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RetryPolicy {
    /// Attempts that may end in 401/403 before giving up.
    pub max_auth_attempts: u32,
    /// Attempts that may time out before giving up.
    pub max_timeout_attempts: u32,
}

impl Default for RetryPolicy {
    fn default() -> Self {
        Self {
            max_auth_attempts: 2,
            max_timeout_attempts: 2,
        }
    }
}

/// Where the client is in its session lifecycle.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SessionState {
    Unauthenticated,
    Authenticated,
    /// A data request was rejected and a fresh login is in flight.
    ReAuthenticating,
}

/// HTTP client for the supervisor's LocalAPI.
///
/// Owns the one session it authenticates; every method that can touch the
/// session takes `&mut self`, so a client cannot be driven from two tasks
/// at once. Use one client per task if you need parallel polling.
pub struct LocalApiClient {
    pub(crate) http: reqwest::Client,
    base_url: Url,
    pub(crate) credential: SecretString,
    pub(crate) session: Option<Session>,
    pub(crate) state: SessionState,
    retry: RetryPolicy,
    pub(crate) timeout: Duration,
}

impl LocalApiClient {
    /// Create a client from a `TransportConfig`. Does NOT log in --
    /// call [`login()`](Self::login) before querying.
    pub fn new(
        base_url: Url,
        credential: SecretString,
        transport: &TransportConfig,
    ) -> Result<Self, Error> {
        let http = transport.build_client()?;
        let mut client = Self::with_client(http, base_url, credential);
        client.timeout = transport.timeout;
        Ok(client)
    }

    /// Create a client with a pre-built `reqwest::Client`.
    pub fn with_client(http: reqwest::Client, base_url: Url, credential: SecretString) -> Self {
        Self {
            http,
            base_url,
            credential,
            session: None,
            state: SessionState::Unauthenticated,
            retry: RetryPolicy::default(),
            timeout: DEFAULT_TIMEOUT,
        }
    }

    pub fn with_retry_policy(mut self, retry: RetryPolicy) -> Self {
        self.retry = retry;
        self
    }

    /// The supervisor base URL.
    pub fn base_url(&self) -> &Url {
        &self.base_url
    }

    pub fn state(&self) -> SessionState {
        self.state
    }

    pub fn is_authenticated(&self) -> bool {
        self.session.is_some()
    }

    pub fn retry_policy(&self) -> RetryPolicy {
        self.retry
    }

    // ── URL builders ─────────────────────────────────────────────────

    pub(crate) fn url(&self, path: &str) -> Result<Url, Error> {
        Ok(self.base_url.join(path)?)
    }

    // ── Variable queries ─────────────────────────────────────────────

    /// Query `/vars`, re-authenticating on session expiry and retrying on
    /// timeout within the [`RetryPolicy`].
    ///
    /// `GET /vars?name=…&match=…&cache=…&fmt=obj`
    pub async fn query_vars(&mut self, query: &VarQuery) -> Result<VarMap, Error> {
        let mut auth_failures = 0_u32;
        let mut timeout_failures = 0_u32;

        loop {
            match self.send_vars(query).await {
                Ok(vars) => return Ok(vars),
                Err(e) if e.is_auth_expired() => {
                    auth_failures += 1;
                    if auth_failures >= self.retry.max_auth_attempts {
                        warn!(attempts = auth_failures, "session still rejected, giving up");
                        return Err(Error::AuthRetriesExhausted {
                            attempts: auth_failures,
                        });
                    }
                    warn!(error = %e, "session rejected, re-authenticating");
                    self.state = SessionState::ReAuthenticating;
                    self.login().await?;
                }
                Err(e) if e.is_timeout() => {
                    timeout_failures += 1;
                    if timeout_failures >= self.retry.max_timeout_attempts {
                        warn!(attempts = timeout_failures, "query kept timing out, giving up");
                        return Err(Error::Timeout {
                            timeout_secs: self.timeout.as_secs(),
                        });
                    }
                    warn!(attempt = timeout_failures, "query timed out, retrying");
                }
                Err(e) => return Err(e),
            }
        }
    }

    /// One `/vars` round trip, no retries.
    async fn send_vars(&self, query: &VarQuery) -> Result<VarMap, Error> {
        let url = self.url("vars")?;
        let params = query.params();
        debug!("GET {url} params={params:?}");

        let mut builder = self.http.get(url).query(&params);
        if let Some(ref session) = self.session {
            builder = builder.header(COOKIE, session.cookie_header()?);
        }
        let resp = builder.send().await?;

        Self::parse_vars(resp).await
    }

    async fn parse_vars(resp: reqwest::Response) -> Result<VarMap, Error> {
        let status = resp.status();

        if status == reqwest::StatusCode::UNAUTHORIZED || status == reqwest::StatusCode::FORBIDDEN
        {
            return Err(Error::SessionExpired {
                status: status.as_u16(),
            });
        }

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
