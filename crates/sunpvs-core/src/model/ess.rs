// ── Energy storage status ──

use indexmap::IndexMap;
use serde::ser::SerializeMap;
use serde::{Deserialize, Serialize, Serializer};
use serde_json::Value;

/// `{"ess_report": {...}}` as returned by the legacy ESS endpoint, or
/// synthesized from LocalAPI livedata.
///
/// A legacy answer is kept and serialized back unchanged.
#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct EssStatus {
    #[serde(default)]
    pub ess_report: Option<EssReport>,
    #[serde(flatten)]
    pub extra: IndexMap<String, Value>,
    #[serde(skip)]
    raw: Option<Value>,
}

impl EssStatus {
    /// A report with no batteries, no ESS units and an empty hub.
    pub fn empty() -> Self {
        Self::with_report(EssReport::default())
    }

    pub fn with_report(report: EssReport) -> Self {
        Self {
            ess_report: Some(report),
            extra: IndexMap::new(),
            raw: None,
        }
    }

    /// Wrap a legacy ESS answer. A report that does not decode leaves
    /// `ess_report` unset; the body itself is always kept.
    pub fn from_legacy(body: Value) -> Self {
        let mut status = serde_json::from_value::<Self>(body.clone()).unwrap_or_else(|_| Self {
            ess_report: None,
            extra: body
                .as_object()
                .into_iter()
                .flatten()
                .filter(|(key, _)| key.as_str() != "ess_report")
                .map(|(key, value)| (key.clone(), value.clone()))
                .collect(),
            raw: None,
        });
        status.raw = Some(body);
        status
    }

    /// True when the report names no storage hardware at all.
    pub fn is_empty(&self) -> bool {
        self.ess_report.as_ref().is_none_or(|r| {
            r.battery_status.is_empty()
                && r.ess_status.is_empty()
                && r.hub_plus_status.as_object().is_none_or(serde_json::Map::is_empty)
        })
    }
}

impl Serialize for EssStatus {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        if let Some(raw) = &self.raw {
            return raw.serialize(serializer);
        }
        let mut map = serializer.serialize_map(None)?;
        if let Some(report) = &self.ess_report {
            map.serialize_entry("ess_report", report)?;
        }
        for (key, value) in &self.extra {
            map.serialize_entry(key, value)?;
        }
        map.end()
    }
}

impl Default for EssStatus {
    fn default() -> Self {
        Self::empty()
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct EssReport {
    #[serde(default)]
    pub battery_status: Vec<Value>,
    #[serde(default)]
    pub ess_status: Vec<Value>,
    #[serde(default = "empty_object")]
    pub hub_plus_status: Value,
    #[serde(flatten)]
    pub extra: IndexMap<String, Value>,
}

impl Default for EssReport {
    fn default() -> Self {
        Self {
            battery_status: Vec::new(),
            ess_status: Vec::new(),
            hub_plus_status: empty_object(),
            extra: IndexMap::new(),
        }
    }
}

fn empty_object() -> Value {
    Value::Object(serde_json::Map::new())
}
