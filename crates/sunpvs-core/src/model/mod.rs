// ── Canonical domain model ──
//
// One device-list schema for both API surfaces. Records stay open maps so
// legacy passthrough keeps every field the supervisor sent.

pub mod device;
pub mod ess;

pub use device::{DeviceKind, DeviceList, DeviceRecord, keys};
pub use ess::{EssReport, EssStatus};
