// ── Device domain types ──

use indexmap::IndexMap;
use serde::ser::SerializeMap;
use serde::{Deserialize, Serialize, Serializer};
use serde_json::Value;
use strum::{AsRefStr, Display, EnumString};

/// Field names every canonical record carries.
pub mod keys {
    pub const DEVICE_TYPE: &str = "DEVICE_TYPE";
    pub const SERIAL: &str = "SERIAL";
    pub const MODEL: &str = "MODEL";
    pub const TYPE: &str = "TYPE";
    pub const DESCR: &str = "DESCR";
    pub const STATE: &str = "STATE";
}

/// `STATE` value of a healthy device.
pub const STATE_WORKING: &str = "working";

/// Known `DEVICE_TYPE` values.
///
/// LocalAPI mode only produces the first three; the rest show up in legacy
/// `DeviceList` answers from systems with storage. Records with any other
/// type string are still carried, they just have no `DeviceKind`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Display, EnumString, AsRefStr)]
#[strum(ascii_case_insensitive)]
pub enum DeviceKind {
    #[strum(to_string = "PVS", serialize = "supervisor")]
    Pvs,
    #[strum(to_string = "Power Meter", serialize = "meter", serialize = "power-meter")]
    PowerMeter,
    #[strum(to_string = "Inverter")]
    Inverter,
    #[strum(to_string = "Battery")]
    Battery,
    #[strum(to_string = "ESS")]
    Ess,
    #[strum(to_string = "HubPlus", serialize = "hub-plus")]
    HubPlus,
    #[strum(to_string = "SunVault")]
    SunVault,
}

/// One device, as an ordered `field → value` map.
///
/// Optional telemetry is represented by absence: a field the source did
/// not report is not in the map at all.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct DeviceRecord(IndexMap<String, Value>);

impl DeviceRecord {
    /// An empty record of the given kind.
    pub fn new(kind: DeviceKind) -> Self {
        let mut record = Self::default();
        record.insert(keys::DEVICE_TYPE, kind.as_ref());
        record
    }

    pub fn insert(&mut self, key: impl Into<String>, value: impl Into<Value>) {
        self.0.insert(key.into(), value.into());
    }

    pub fn get(&self, key: &str) -> Option<&Value> {
        self.0.get(key)
    }

    pub fn contains_key(&self, key: &str) -> bool {
        self.0.contains_key(key)
    }

    /// A field rendered as text (strings as-is, numbers formatted).
    pub fn text(&self, key: &str) -> Option<String> {
        self.get(key).and_then(value_text)
    }

    /// Raw `DEVICE_TYPE` string.
    pub fn device_type(&self) -> Option<&str> {
        self.get(keys::DEVICE_TYPE).and_then(Value::as_str)
    }

    pub fn kind(&self) -> Option<DeviceKind> {
        self.device_type().and_then(|t| t.parse().ok())
    }

    pub fn serial(&self) -> Option<String> {
        self.text(keys::SERIAL)
    }

    pub fn state(&self) -> Option<&str> {
        self.get(keys::STATE).and_then(Value::as_str)
    }

    pub fn fields(&self) -> &IndexMap<String, Value> {
        &self.0
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }
}

impl From<IndexMap<String, Value>> for DeviceRecord {
    fn from(fields: IndexMap<String, Value>) -> Self {
        Self(fields)
    }
}

/// `{"devices": [...]}` plus any other top-level keys the supervisor sent.
///
/// A list read from a legacy `DeviceList` answer keeps that answer and
/// serializes back to it unchanged; `devices` and `extra` are a typed
/// view over it.
#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
pub struct DeviceList {
    #[serde(default)]
    pub devices: Vec<DeviceRecord>,
    /// Extra top-level keys (legacy answers carry `result`).
    #[serde(flatten)]
    pub extra: IndexMap<String, Value>,
    #[serde(skip)]
    raw: Option<Value>,
}

impl DeviceList {
    pub fn new(devices: Vec<DeviceRecord>) -> Self {
        Self {
            devices,
            ..Self::default()
        }
    }

    /// Wrap a legacy `DeviceList` answer.
    ///
    /// Never fails: entries of `devices` that are not objects are left out
    /// of the typed view but stay in the serialized body.
    pub fn from_legacy(body: Value) -> Self {
        let mut devices = Vec::new();
        let mut extra = IndexMap::new();
        if let Some(map) = body.as_object() {
            for (key, value) in map {
                if key == "devices" {
                    devices = value
                        .as_array()
                        .into_iter()
                        .flatten()
                        .filter_map(Value::as_object)
                        .map(|fields| DeviceRecord(fields.clone().into_iter().collect()))
                        .collect();
                } else {
                    extra.insert(key.clone(), value.clone());
                }
            }
        }
        Self {
            devices,
            extra,
            raw: Some(body),
        }
    }

    /// Records whose `DEVICE_TYPE` is `kind`.
    pub fn of_kind(&self, kind: DeviceKind) -> impl Iterator<Item = &DeviceRecord> {
        self.devices.iter().filter(move |d| d.kind() == Some(kind))
    }

    pub fn len(&self) -> usize {
        self.devices.len()
    }

    pub fn is_empty(&self) -> bool {
        self.devices.is_empty()
    }
}

impl Serialize for DeviceList {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        if let Some(raw) = &self.raw {
            return raw.serialize(serializer);
        }
        let mut map = serializer.serialize_map(Some(self.extra.len() + 1))?;
        map.serialize_entry("devices", &self.devices)?;
        for (key, value) in &self.extra {
            map.serialize_entry(key, value)?;
        }
        map.end()
    }
}

/// Strings verbatim, numbers and booleans formatted; `None` for the rest.
pub(crate) fn value_text(value: &Value) -> Option<String> {
    match value {
        Value::String(s) => Some(s.clone()),
        Value::Number(n) => Some(n.to_string()),
        Value::Bool(b) => Some(b.to_string()),
        _ => None,
    }
}

/// Numbers, or strings that parse as numbers.
pub(crate) fn value_f64(value: &Value) -> Option<f64> {
    match value {
        Value::Number(n) => n.as_f64(),
        Value::String(s) => s.trim().parse().ok(),
        _ => None,
    }
}
