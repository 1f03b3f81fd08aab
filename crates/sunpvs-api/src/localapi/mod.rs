// LocalAPI (Varserver) surface: session login and `/vars` queries.

mod auth;
pub mod client;
pub mod vars;

pub use client::{LocalApiClient, RetryPolicy, SessionState};
pub use vars::{CacheId, DeviceClass, FieldMap, VarMap, VarQuery, group_devices};
