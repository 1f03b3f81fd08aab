// LocalAPI authentication
//
// `GET /auth?login` with a lowercase `basic` Authorization header returns
// `{"session": "<token>"}`. The token is replayed as `Cookie: session=…`
// on every later request from the same client.

use reqwest::header::AUTHORIZATION;
use serde::Deserialize;
use tracing::{debug, info};

use crate::auth::{LOGIN_PATH, Session, basic_authorization};
use crate::error::{Error, preview};
use crate::localapi::client::{LocalApiClient, SessionState};

#[derive(Deserialize)]
struct LoginResponse {
    #[serde(default)]
    session: Option<String>,
}

impl LocalApiClient {
    /// Authenticate as `ssm_owner` using the serial-suffix credential.
    ///
    /// Re-entrant: any previous session is dropped before the request, so
    /// a failed login, transport failures included, leaves the client
    /// unauthenticated.
    pub async fn login(&mut self) -> Result<(), Error> {
        self.session = None;
        let result = self.request_session().await;
        if result.is_err() {
            self.state = SessionState::Unauthenticated;
        }
        result.map_err(|e| e.timed_out_after(self.timeout))
    }

    async fn request_session(&mut self) -> Result<(), Error> {
        let url = self.url(LOGIN_PATH)?;
        debug!("logging in at {url}");

        let resp = self
            .http
            .get(url)
            .header(AUTHORIZATION, basic_authorization(&self.credential)?)
            .send()
            .await?;

        let status = resp.status();
        if status == reqwest::StatusCode::UNAUTHORIZED {
            return Err(Error::InvalidCredentials);
        }
        if !status.is_success() {
            let body = resp.text().await.unwrap_or_default();
            return Err(Error::Http {
                status: status.as_u16(),
                message: format!("login failed: {}", preview(&body)),
            });
        }

        let body = resp.text().await?;
        let parsed: LoginResponse =
            serde_json::from_str(&body).map_err(|e| Error::deserialization(&e, body.clone()))?;

        let Some(token) = parsed.session.filter(|t| !t.is_empty()) else {
            return Err(Error::MissingField {
                key: "session",
                body,
            });
        };

        self.session = Some(Session::new(token));
        self.state = SessionState::Authenticated;
        info!("LocalAPI session established");
        Ok(())
    }
}
