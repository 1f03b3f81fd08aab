// sunpvs-api: Async Rust client for SunPower PVS supervisors (LocalAPI + legacy CGI)

pub mod auth;
pub mod error;
pub mod legacy;
pub mod localapi;
pub mod probe;
pub mod transport;

pub use auth::{ApiMode, LOCALAPI_USER, serial_suffix};
pub use error::{Error, ErrorKind};
pub use legacy::LegacyClient;
pub use localapi::{
    CacheId, DeviceClass, FieldMap, LocalApiClient, RetryPolicy, SessionState, VarMap, VarQuery,
    group_devices,
};
pub use probe::{Capability, MIN_LOCALAPI_BUILD, ProbeOptions, probe, probe_host};
pub use transport::{TransportConfig, base_url};
