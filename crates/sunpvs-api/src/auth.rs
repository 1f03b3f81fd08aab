use base64::Engine;
use base64::engine::general_purpose::STANDARD;
use reqwest::header::HeaderValue;
use secrecy::{ExposeSecret, SecretString};

use crate::error::Error;

/// Fixed LocalAPI account name; the password is the serial suffix.
pub const LOCALAPI_USER: &str = "ssm_owner";

/// LocalAPI login endpoint, relative to the supervisor root.
pub const LOGIN_PATH: &str = "auth?login";

/// Number of trailing serial characters that form the credential.
pub const SERIAL_SUFFIX_LEN: usize = 5;

/// Which HTTP surface a supervisor is addressed through.
///
/// Chosen once per client from the capability probe; determines the
/// endpoint paths and whether a session is needed at all.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ApiMode {
    /// Session-authenticated variable queries (`/vars`), newer firmware.
    LocalApi,
    /// Unauthenticated `dl_cgi` command endpoints, older firmware.
    Legacy,
}

impl ApiMode {
    pub fn label(self) -> &'static str {
        match self {
            Self::LocalApi => "LocalAPI",
            Self::Legacy => "Legacy CGI",
        }
    }
}

/// Last [`SERIAL_SUFFIX_LEN`] characters of a serial number.
///
/// Returns `None` for serials that are too short to carry a suffix.
pub fn serial_suffix(serial: &str) -> Option<String> {
    let serial = serial.trim();
    let count = serial.chars().count();
    if count < SERIAL_SUFFIX_LEN {
        return None;
    }
    Some(serial.chars().skip(count - SERIAL_SUFFIX_LEN).collect())
}

/// `Authorization` header value for the LocalAPI login.
///
/// The supervisor expects the scheme in lowercase (`basic`, not `Basic`).
pub fn basic_authorization(credential: &SecretString) -> Result<HeaderValue, Error> {
    let encoded = STANDARD.encode(format!("{LOCALAPI_USER}:{}", credential.expose_secret()));
    let mut value = HeaderValue::from_str(&format!("basic {encoded}"))
        .map_err(|_| Error::InvalidCredentials)?;
    value.set_sensitive(true);
    Ok(value)
}

/// An authenticated LocalAPI session.
///
/// Owned by exactly one client; replaced wholesale on every login.
#[derive(Debug)]
pub struct Session {
    token: SecretString,
}

impl Session {
    pub(crate) fn new(token: String) -> Self {
        Self {
            token: SecretString::from(token),
        }
    }

    /// The `Cookie` header value carrying this session.
    pub(crate) fn cookie_header(&self) -> Result<HeaderValue, Error> {
        let mut value = HeaderValue::from_str(&format!("session={}", self.token.expose_secret()))
            .map_err(|e| Error::Http {
                status: 0,
                message: format!("session token is not a valid header value: {e}"),
            })?;
        value.set_sensitive(true);
        Ok(value)
    }
}
