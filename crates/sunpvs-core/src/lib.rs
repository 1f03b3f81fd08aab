//! Domain layer between `sunpvs-api` and consumers (CLI, integrations).
//!
//! - **[`PvsClient`]**: facade over one supervisor. [`connect()`](PvsClient::connect)
//!   probes the firmware, fixes the API mode (LocalAPI or legacy CGI) and
//!   logs in when needed; [`device_list()`](PvsClient::device_list),
//!   [`ess_status()`](PvsClient::ess_status) and
//!   [`network_status()`](PvsClient::network_status) then serve data in
//!   one schema regardless of mode.
//!
//! - **[`TelemetryCache`]**: tracks which server-side variable caches are
//!   primed so repeat queries skip the match pattern.
//!
//! - **Normalizer** ([`convert`]): reshapes LocalAPI variables into the
//!   legacy `DeviceList` schema.
//!
//! - **[`DeviceIndex`]**: type/serial lookup with virtual production
//!   meter synthesis.

pub mod cache;
pub mod client;
pub mod config;
pub mod convert;
pub mod credential;
pub mod error;
pub mod index;
pub mod model;

// ── Primary re-exports ──────────────────────────────────────────────
pub use cache::TelemetryCache;
pub use client::{ClientState, PvsClient};
pub use config::{ClientConfig, ModePreference};
pub use credential::{CredentialSource, CredentialSources, ENV_SERIAL_SUFFIX, env_credential};
pub use error::CoreError;
pub use index::{DeviceIndex, is_virtual_meter};
pub use model::{DeviceKind, DeviceList, DeviceRecord, EssReport, EssStatus};

pub use sunpvs_api::{ApiMode, CacheId, Capability, ErrorKind, RetryPolicy, SessionState};
