use std::time::Duration;

use thiserror::Error;

/// The two failure classes surfaced to callers.
///
/// `Connection` covers anything that kept a usable response from arriving;
/// `Parse` means a response arrived but did not have the expected shape,
/// which usually points at firmware drift rather than a network problem.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorKind {
    Connection,
    Parse,
}

/// Top-level error type for the `sunpvs-api` crate.
///
/// Variants stay fine-grained for diagnostics; [`Error::kind`] collapses
/// them into the two classes callers branch on.
#[derive(Debug, Error)]
pub enum Error {
    // ── Authentication ──────────────────────────────────────────────
    /// The supervisor rejected the `ssm_owner` credential (HTTP 401 at login).
    #[error("Invalid credentials -- check the last 5 characters of the PVS serial")]
    InvalidCredentials,

    /// Session was rejected on a data request (HTTP 401/403).
    #[error("Session expired (HTTP {status})")]
    SessionExpired { status: u16 },

    /// Session re-authentication was attempted and still failed.
    #[error("Session still rejected after {attempts} attempts")]
    AuthRetriesExhausted { attempts: u32 },

    // ── Transport ───────────────────────────────────────────────────
    /// HTTP transport error (connection refused, DNS failure, etc.)
    #[error("HTTP transport error: {0}")]
    Transport(#[from] reqwest::Error),

    /// URL parsing error.
    #[error("Invalid URL: {0}")]
    InvalidUrl(#[from] url::ParseError),

    /// Request timed out (after retries, where retries apply).
    #[error("Request timed out after {timeout_secs}s")]
    Timeout { timeout_secs: u64 },

    /// Non-success HTTP status.
    #[error("HTTP {status}: {message}")]
    Http { status: u16, message: String },

    // ── Data ────────────────────────────────────────────────────────
    /// JSON deserialization failed, with the raw body for debugging.
    #[error("Deserialization error: {message}")]
    Deserialization { message: String, body: String },

    /// Response decoded but a required key was absent.
    #[error("Missing `{key}` in response")]
    MissingField { key: &'static str, body: String },
}

impl Error {
    /// Classify this error as a connection or parse failure.
    pub fn kind(&self) -> ErrorKind {
        match self {
            Self::Deserialization { .. } | Self::MissingField { .. } => ErrorKind::Parse,
            Self::Transport(e) if e.is_decode() => ErrorKind::Parse,
            _ => ErrorKind::Connection,
        }
    }

    /// Returns `true` if the session was rejected and a fresh login
    /// might resolve it.
    pub fn is_auth_expired(&self) -> bool {
        matches!(self, Self::SessionExpired { .. })
    }

    /// Returns `true` if the request timed out.
    pub fn is_timeout(&self) -> bool {
        match self {
            Self::Transport(e) => e.is_timeout(),
            Self::Timeout { .. } => true,
            _ => false,
        }
    }

    /// Turn a transport timeout into [`Timeout`](Self::Timeout) carrying
    /// the limit the client was built with.
    pub(crate) fn timed_out_after(self, timeout: Duration) -> Self {
        match self {
            Self::Transport(ref e) if e.is_timeout() => Self::Timeout {
                timeout_secs: timeout.as_secs(),
            },
            other => other,
        }
    }

    /// Build a `Deserialization` error with a truncated body preview.
    pub(crate) fn deserialization(err: &serde_json::Error, body: String) -> Self {
        let preview = preview(&body);
        Self::Deserialization {
            message: format!("{err} (body preview: {preview:?})"),
            body,
        }
    }
}

/// First 200 bytes of a body, cut on a char boundary.
pub(crate) fn preview(body: &str) -> &str {
    let mut end = body.len().min(200);
    while !body.is_char_boundary(end) {
        end -= 1;
    }
    &body[..end]
}
