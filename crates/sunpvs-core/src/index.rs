// ── Device index ──
//
// `device type → serial → record` lookup over a `DeviceList`, plus the
// virtual production meter that sums inverter output for systems without
// a physical production CT.

use indexmap::IndexMap;
use serde::Serialize;
use serde_json::Value;
use tracing::{debug, warn};

use crate::model::device::{STATE_WORKING, value_f64};
use crate::model::{DeviceKind, DeviceList, DeviceRecord, keys};

/// Suffix appended to the PVS serial to key the virtual meter.
pub const VIRTUAL_METER_SUFFIX: &str = "pv";

/// Devices grouped by `DEVICE_TYPE`, then keyed by `SERIAL`.
///
/// Both levels keep first-seen order. A later record with the same type
/// and serial replaces the earlier one in place.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
#[serde(transparent)]
pub struct DeviceIndex {
    by_type: IndexMap<String, IndexMap<String, DeviceRecord>>,
}

impl DeviceIndex {
    /// Index every record that carries both a `DEVICE_TYPE` and a `SERIAL`.
    pub fn from_list(list: &DeviceList) -> Self {
        let mut index = Self::default();
        for record in &list.devices {
            let (Some(device_type), Some(serial)) = (record.device_type(), record.serial()) else {
                debug!("skipping device record without DEVICE_TYPE/SERIAL");
                continue;
            };
            index.insert(device_type.to_owned(), serial, record.clone());
        }
        index
    }

    /// Insert or replace a record. Returns `true` if the key was new.
    pub fn insert(&mut self, device_type: String, serial: String, record: DeviceRecord) -> bool {
        self.by_type
            .entry(device_type)
            .or_default()
            .insert(serial, record)
            .is_none()
    }

    pub fn get(&self, device_type: &str, serial: &str) -> Option<&DeviceRecord> {
        self.by_type.get(device_type)?.get(serial)
    }

    /// All records of one raw type string.
    pub fn of_type(&self, device_type: &str) -> Option<&IndexMap<String, DeviceRecord>> {
        self.by_type.get(device_type)
    }

    pub fn of_kind(&self, kind: DeviceKind) -> Option<&IndexMap<String, DeviceRecord>> {
        self.of_type(kind.as_ref())
    }

    /// Type strings present, in first-seen order.
    pub fn device_types(&self) -> impl Iterator<Item = &str> {
        self.by_type.keys().map(String::as_str)
    }

    pub fn iter(&self) -> impl Iterator<Item = &DeviceRecord> {
        self.by_type.values().flat_map(IndexMap::values)
    }

    /// Total number of records across all types.
    pub fn len(&self) -> usize {
        self.by_type.values().map(IndexMap::len).sum()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Flatten back into a `DeviceList`, grouped by type.
    pub fn to_list(&self) -> DeviceList {
        DeviceList::new(self.iter().cloned().collect())
    }

    /// Synthesize a production meter from the inverter totals.
    ///
    /// Keyed `<pvs serial>pv` under `Power Meter`. Returns `false` and
    /// leaves the index untouched when there is no PVS to anchor it to.
    pub fn add_virtual_meter(&mut self) -> bool {
        let Some(pvs_serial) = self
            .of_kind(DeviceKind::Pvs)
            .and_then(|pvs| pvs.keys().next())
            .cloned()
        else {
            warn!("PVS device not found, skipping virtual meter");
            return false;
        };

        let totals = InverterTotals::sum(
            self.of_kind(DeviceKind::Inverter)
                .into_iter()
                .flat_map(IndexMap::values),
        );
        let serial = format!("{pvs_serial}{VIRTUAL_METER_SUFFIX}");
        let meter = totals.into_meter(&serial);

        debug!(%serial, "adding virtual production meter");
        self.insert(DeviceKind::PowerMeter.to_string(), serial, meter);
        true
    }
}

/// Running sums over a set of inverter records.
#[derive(Debug, Default)]
struct InverterTotals {
    kwh: f64,
    kw: f64,
    amps: f64,
    freq: Vec<f64>,
    volts: Vec<f64>,
    state: Option<String>,
}

impl InverterTotals {
    fn sum<'a>(inverters: impl Iterator<Item = &'a DeviceRecord>) -> Self {
        let mut totals = Self::default();
        let number = |record: &DeviceRecord, key: &str| record.get(key).and_then(value_f64);

        for inverter in inverters {
            if let Some(state) = inverter.state().filter(|s| *s != STATE_WORKING) {
                totals.state = Some(state.to_owned());
            }
            totals.kwh += number(inverter, "ltea_3phsum_kwh").unwrap_or(0.0);
            totals.kw += number(inverter, "p_mppt1_kw").unwrap_or(0.0);
            totals.amps += number(inverter, "i_3phsum_a").unwrap_or(0.0);
            totals.freq.extend(number(inverter, "freq_hz"));
            totals.volts.extend(number(inverter, "vln_3phavg_v"));
        }
        totals
    }

    fn into_meter(self, serial: &str) -> DeviceRecord {
        let mut meter = DeviceRecord::new(DeviceKind::PowerMeter);
        meter.insert(keys::SERIAL, serial);
        meter.insert(keys::TYPE, "PVS-METER-P");
        meter.insert(
            keys::STATE,
            self.state.unwrap_or_else(|| STATE_WORKING.to_owned()),
        );
        meter.insert(keys::MODEL, "Virtual");
        meter.insert(keys::DESCR, format!("Power Meter {serial}"));
        meter.insert("interface", "virtual");
        meter.insert("SWVER", "1.0");
        meter.insert("HWVER", "Virtual");
        meter.insert("origin", "virtual");
        meter.insert("net_ltea_3phsum_kwh", self.kwh);
        meter.insert("p_3phsum_kw", self.kw);
        meter.insert("i_a", self.amps);
        if let Some(freq) = average(&self.freq) {
            meter.insert("freq_hz", freq);
        }
        if let Some(volts) = average(&self.volts) {
            meter.insert("v12_v", volts);
        }
        meter
    }
}

#[allow(clippy::cast_precision_loss, clippy::as_conversions)]
fn average(samples: &[f64]) -> Option<f64> {
    (!samples.is_empty()).then(|| samples.iter().sum::<f64>() / samples.len() as f64)
}

impl From<&DeviceList> for DeviceIndex {
    fn from(list: &DeviceList) -> Self {
        Self::from_list(list)
    }
}

impl IntoIterator for DeviceIndex {
    type Item = (String, IndexMap<String, DeviceRecord>);
    type IntoIter = indexmap::map::IntoIter<String, IndexMap<String, DeviceRecord>>;

    fn into_iter(self) -> Self::IntoIter {
        self.by_type.into_iter()
    }
}

/// Whether `record` was synthesized by [`DeviceIndex::add_virtual_meter`].
pub fn is_virtual_meter(record: &DeviceRecord) -> bool {
    record.get("origin") == Some(&Value::from("virtual"))
}
