// Legacy CGI surface for supervisors below the LocalAPI build.

pub mod client;

pub use client::{DEVICE_LIST, GET_COMM, LegacyClient};
