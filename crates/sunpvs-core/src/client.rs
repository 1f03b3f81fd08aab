// ── PVS client facade ──
//
// Picks the API surface once, then serves device lists, storage status and
// network status through it. LocalAPI answers are normalized into the
// legacy schema; legacy answers pass through unchanged.

use std::time::Duration;

use secrecy::{ExposeSecret, SecretString};
use serde_json::Value;
use tracing::{debug, info, warn};

use sunpvs_api::transport::TransportConfig;
use sunpvs_api::{
    ApiMode, CacheId, Capability, LegacyClient, LocalApiClient, ProbeOptions, SessionState,
    VarMap, probe, probe_host, serial_suffix,
};

use crate::cache::TelemetryCache;
use crate::config::{ClientConfig, ModePreference};
use crate::convert;
use crate::credential::CredentialSources;
use crate::error::CoreError;
use crate::index::DeviceIndex;
use crate::model::{DeviceList, EssStatus};

// ── ClientState ──────────────────────────────────────────────────

/// Lifecycle of a [`PvsClient`].
///
/// `Uninitialized → Probing → {LocalApiAuthenticated | LegacyReady} → Ready`.
/// Session renewal inside LocalAPI mode is tracked separately by
/// [`PvsClient::session_state`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ClientState {
    Uninitialized,
    Probing,
    LocalApiAuthenticated,
    LegacyReady,
    /// At least one data request has completed.
    Ready,
}

enum Backend {
    Disconnected,
    LocalApi(LocalApiClient),
    Legacy(LegacyClient),
}

// ── PvsClient ────────────────────────────────────────────────────

/// The main entry point for consumers.
///
/// Owns its HTTP session outright. Every operation takes `&mut self`, so
/// one client serves one caller at a time; create a client per task for
/// parallel polling.
pub struct PvsClient {
    config: ClientConfig,
    state: ClientState,
    backend: Backend,
    cache: TelemetryCache,
    capability: Option<Capability>,
}

impl PvsClient {
    /// Create a client from configuration. Does NOT connect --
    /// call [`initialize()`](Self::initialize) or use [`connect()`](Self::connect).
    pub fn new(config: ClientConfig) -> Self {
        Self {
            config,
            state: ClientState::Uninitialized,
            backend: Backend::Disconnected,
            cache: TelemetryCache::new(),
            capability: None,
        }
    }

    /// Create and initialize a client in one step.
    pub async fn connect(config: ClientConfig) -> Result<Self, CoreError> {
        let mut client = Self::new(config);
        client.initialize().await?;
        Ok(client)
    }

    /// Probe the supervisor without constructing a client.
    ///
    /// Never fails; problems are reported in [`Capability::error`].
    pub async fn check_capability(host: &str, timeout: Duration) -> Capability {
        let options = ProbeOptions {
            timeout,
            ..ProbeOptions::default()
        };
        probe_host(host, &options).await
    }

    // ── Connection lifecycle ─────────────────────────────────────

    /// Probe, select the API mode and (for LocalAPI) log in.
    ///
    /// The mode is fixed for the lifetime of the client; calling this
    /// again after success is a no-op.
    pub async fn initialize(&mut self) -> Result<(), CoreError> {
        if !matches!(self.backend, Backend::Disconnected) {
            debug!("client already initialized");
            return Ok(());
        }

        self.state = ClientState::Probing;
        let result = self.select_backend().await;
        if result.is_err() {
            self.state = ClientState::Uninitialized;
        }
        result
    }

    async fn select_backend(&mut self) -> Result<(), CoreError> {
        let config = &self.config;
        let base_url = sunpvs_api::base_url(&config.host)?;
        let transport = TransportConfig {
            timeout: config.timeout,
            legacy_timeout: config.legacy_timeout,
        };

        let needs_probe = match config.mode {
            ModePreference::Auto => true,
            // only for the serial, when no explicit credential was given
            ModePreference::LocalApi => config
                .credential
                .as_ref()
                .is_none_or(|c| c.expose_secret().trim().is_empty()),
            ModePreference::Legacy => false,
        };

        let capability = if needs_probe {
            let options = ProbeOptions {
                timeout: config.timeout,
                check_auth_endpoint: config.check_auth_endpoint
                    && config.mode == ModePreference::Auto,
            };
            Some(probe(&base_url, &options).await)
        } else {
            None
        };

        let mode = match config.mode {
            ModePreference::Auto => match capability.as_ref() {
                Some(cap) if cap.supported => ApiMode::LocalApi,
                cap => {
                    warn!(
                        reason = cap.and_then(|c| c.error.as_deref()).unwrap_or("unknown"),
                        "LocalAPI unavailable, falling back to legacy CGI"
                    );
                    ApiMode::Legacy
                }
            },
            ModePreference::LocalApi => ApiMode::LocalApi,
            ModePreference::Legacy => ApiMode::Legacy,
        };
        info!(host = %config.host, mode = mode.label(), "selected API mode");

        match mode {
            ApiMode::LocalApi => {
                let fetched = capability
                    .as_ref()
                    .and_then(|c| c.serial.as_deref())
                    .and_then(serial_suffix)
                    .map(SecretString::from);
                let sources = CredentialSources {
                    explicit: config.credential.as_ref(),
                    fetched: fetched.as_ref(),
                    environment: config.env_credential.as_ref(),
                    fallback: config.fallback_credential.as_ref(),
                };
                let (credential, source) =
                    sources.resolve().ok_or_else(|| CoreError::MissingCredential {
                        host: config.host.clone(),
                    })?;
                debug!(%source, "resolved LocalAPI credential");

                let mut api = LocalApiClient::new(base_url, credential, &transport)?
                    .with_retry_policy(config.retry);
                api.login().await?;

                self.backend = Backend::LocalApi(api);
                self.state = ClientState::LocalApiAuthenticated;
            }
            ApiMode::Legacy => {
                self.backend = Backend::Legacy(LegacyClient::new(base_url, &transport)?);
                self.state = ClientState::LegacyReady;
            }
        }

        self.capability = capability;
        Ok(())
    }

    // ── State observation ────────────────────────────────────────

    pub fn config(&self) -> &ClientConfig {
        &self.config
    }

    pub fn state(&self) -> ClientState {
        self.state
    }

    /// The selected API surface, once initialized.
    pub fn mode(&self) -> Option<ApiMode> {
        match self.backend {
            Backend::Disconnected => None,
            Backend::LocalApi(_) => Some(ApiMode::LocalApi),
            Backend::Legacy(_) => Some(ApiMode::Legacy),
        }
    }

    /// LocalAPI session state; `None` outside LocalAPI mode.
    pub fn session_state(&self) -> Option<SessionState> {
        match &self.backend {
            Backend::LocalApi(api) => Some(api.state()),
            _ => None,
        }
    }

    /// Result of the probe run during initialization, if one was sent.
    pub fn capability(&self) -> Option<&Capability> {
        self.capability.as_ref()
    }

    // ── Cache control ────────────────────────────────────────────

    /// Make every category re-supply its match pattern on the next fetch.
    pub fn invalidate_cache(&mut self) {
        self.cache.invalidate_all();
    }

    pub fn invalidate_category(&mut self, cache: CacheId) {
        self.cache.invalidate(cache);
    }

    // ── Data ─────────────────────────────────────────────────────

    /// All devices in the canonical schema.
    ///
    /// In LocalAPI mode a category that fails to load (sysinfo, meters or
    /// inverters) is logged and treated as empty; the call still succeeds.
    pub async fn device_list(&mut self) -> Result<DeviceList, CoreError> {
        let list = match &mut self.backend {
            Backend::Disconnected => return Err(CoreError::NotConnected),
            Backend::Legacy(legacy) => {
                DeviceList::from_legacy(legacy.device_list().await?)
            }
            Backend::LocalApi(api) => {
                let host = api
                    .base_url()
                    .host_str()
                    .unwrap_or(&self.config.host)
                    .to_owned();
                let sysinfo = fetch_or_empty(&mut self.cache, api, CacheId::SysInfo).await;
                let meters = fetch_or_empty(&mut self.cache, api, CacheId::Meters).await;
                let inverters = fetch_or_empty(&mut self.cache, api, CacheId::Inverters).await;
                convert::device_list(&host, &sysinfo, &meters, &inverters)
            }
        };

        self.state = ClientState::Ready;
        Ok(list)
    }

    /// [`device_list()`](Self::device_list), indexed by type and serial,
    /// optionally with the virtual production meter added.
    pub async fn device_index(&mut self, virtual_meter: bool) -> Result<DeviceIndex, CoreError> {
        let list = self.device_list().await?;
        let mut index = DeviceIndex::from_list(&list);
        if virtual_meter {
            index.add_virtual_meter();
        }
        Ok(index)
    }

    /// Energy storage status.
    ///
    /// LocalAPI mode synthesizes an aggregate report from livedata; a
    /// failed or empty livedata fetch yields an empty report.
    pub async fn ess_status(&mut self) -> Result<EssStatus, CoreError> {
        let status = match &mut self.backend {
            Backend::Disconnected => return Err(CoreError::NotConnected),
            Backend::Legacy(legacy) => {
                EssStatus::from_legacy(legacy.ess_status().await?)
            }
            Backend::LocalApi(api) => {
                let livedata = fetch_or_empty(&mut self.cache, api, CacheId::LiveData).await;
                convert::ess_status(&livedata)
            }
        };

        self.state = ClientState::Ready;
        Ok(status)
    }

    /// Network/system status: the sysinfo variables (LocalAPI) or the
    /// `Get_Comm` answer (legacy), unmodified.
    pub async fn network_status(&mut self) -> Result<Value, CoreError> {
        let status = match &mut self.backend {
            Backend::Disconnected => return Err(CoreError::NotConnected),
            Backend::Legacy(legacy) => legacy.comm_status().await?,
            Backend::LocalApi(api) => {
                let vars = self.cache.fetch(api, CacheId::SysInfo).await?;
                Value::Object(vars.into_iter().collect())
            }
        };

        self.state = ClientState::Ready;
        Ok(status)
    }
}

// ── Helpers ──────────────────────────────────────────────────────

/// Fetch one category, downgrading any failure to an empty set.
async fn fetch_or_empty(
    cache: &mut TelemetryCache,
    api: &mut LocalApiClient,
    category: CacheId,
) -> VarMap {
    match cache.fetch(api, category).await {
        Ok(vars) => vars,
        Err(e) => {
            warn!(%category, error = %e, "category unavailable, treating as empty");
            VarMap::new()
        }
    }
}
