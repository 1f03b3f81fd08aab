// ── LocalAPI-to-canonical conversions ──
//
// Reshapes flat `/vars` answers into the device-list schema legacy
// firmware returns from `Command=DeviceList`, so callers see one schema
// regardless of the API surface. Field values are copied verbatim; a field
// the source did not report is left out of the record.

use serde_json::{Value, json};
use tracing::debug;

use sunpvs_api::{DeviceClass, FieldMap, VarMap, group_devices};

use crate::model::device::{STATE_WORKING, value_f64, value_text};
use crate::model::{DeviceKind, DeviceList, DeviceRecord, EssReport, EssStatus, keys};

// ── Field tables ───────────────────────────────────────────────────
//
// `(canonical name, source fields in order of preference)`.

const METER_FIELDS: &[(&str, &[&str])] = &[
    ("net_ltea_3phsum_kwh", &["netLtea3phsumKwh"]),
    ("p_3phsum_kw", &["p3phsumKw"]),
    ("q_3phsum_kvar", &["q3phsumKvar"]),
    ("s_3phsum_kva", &["s3phsumKva"]),
    ("tot_pf_rto", &["totPfRto"]),
    ("v12_v", &["v12V"]),
    ("v1n_v", &["v1nV"]),
    ("v2n_v", &["v2nV"]),
    ("freq_hz", &["freqHz"]),
    // per leg
    ("i1_a", &["i1A"]),
    ("i2_a", &["i2A"]),
    ("p1_kw", &["p1Kw"]),
    ("p2_kw", &["p2Kw"]),
    // to grid / to home
    ("neg_ltea_3phsum_kwh", &["negLtea3phsumKwh"]),
    ("pos_ltea_3phsum_kwh", &["posLtea3phsumKwh"]),
];

const INVERTER_FIELDS: &[(&str, &[&str])] = &[
    ("ltea_3phsum_kwh", &["ltea3phsumKwh"]),
    // AC side
    ("p_3phsum_kw", &["p3phsumKw"]),
    ("vln_3phavg_v", &["vln3phavgV"]),
    // older firmware reports no AC current; the MPPT current stands in
    ("i_3phsum_a", &["i3phsumA", "iMppt1A"]),
    // DC side
    ("p_mppt1_kw", &["pMppt1Kw"]),
    ("v_mppt1_v", &["vMppt1V"]),
    ("i_mppt1_a", &["iMppt1A"]),
    ("p_mpptsum_kw", &["pMpptsumKw"]),
    ("t_htsnk_degc", &["tHtsnkDegc"]),
    ("freq_hz", &["freqHz"]),
];

// ── Sysinfo variables ──────────────────────────────────────────────

const SYS_SERIAL: &str = "/sys/info/serialnum";
const SYS_MODEL: &str = "/sys/info/model";
const SYS_SW_REV: &str = "/sys/info/sw_rev";

const LIVEDATA_SOC: &str = "/sys/livedata/soc";
const LIVEDATA_ESS_P: &str = "/sys/livedata/ess_p";

const UNKNOWN: &str = "Unknown";

fn copy_fields(record: &mut DeviceRecord, source: &FieldMap, table: &[(&str, &[&str])]) {
    for (canonical, candidates) in table {
        if let Some(value) = candidates.iter().find_map(|name| source.get(*name)) {
            record.insert(*canonical, value.clone());
        }
    }
}

fn field_or_unknown(source: &FieldMap, name: &str) -> Value {
    source
        .get(name)
        .cloned()
        .unwrap_or_else(|| Value::from(UNKNOWN))
}

/// `"<prefix> <sn>"`, or just the prefix when there is no serial.
fn description(prefix: &str, source: &FieldMap) -> String {
    match source.get("sn").and_then(value_text) {
        Some(sn) => format!("{prefix} {sn}"),
        None => prefix.to_owned(),
    }
}

// ── Device records ─────────────────────────────────────────────────

/// The supervisor itself, from the sysinfo set. Missing values fall back
/// to host-derived placeholders so the record is always present.
pub fn pvs_record(host: &str, sysinfo: &VarMap) -> DeviceRecord {
    let serial = sysinfo
        .get(SYS_SERIAL)
        .cloned()
        .unwrap_or_else(|| Value::from(format!("PVS-{host}")));
    let model = sysinfo
        .get(SYS_MODEL)
        .cloned()
        .unwrap_or_else(|| Value::from("PVS"));
    let sw_ver = sysinfo
        .get(SYS_SW_REV)
        .cloned()
        .unwrap_or_else(|| Value::from(UNKNOWN));

    let descr = format!(
        "{} {}",
        value_text(&model).unwrap_or_default(),
        value_text(&serial).unwrap_or_default()
    );

    let mut record = DeviceRecord::new(DeviceKind::Pvs);
    record.insert(keys::SERIAL, serial);
    record.insert(keys::MODEL, model);
    record.insert(keys::TYPE, "PVS");
    record.insert(keys::DESCR, descr);
    record.insert(keys::STATE, STATE_WORKING);
    record.insert("sw_ver", sw_ver);
    record
}

/// One production/consumption meter.
pub fn meter_record(fields: &FieldMap) -> DeviceRecord {
    let mut record = DeviceRecord::new(DeviceKind::PowerMeter);
    record.insert(keys::SERIAL, field_or_unknown(fields, "sn"));
    record.insert(keys::MODEL, field_or_unknown(fields, "prodMdlNm"));
    record.insert(keys::TYPE, "PVS-METER");
    record.insert(keys::DESCR, description("Power Meter", fields));
    record.insert(keys::STATE, STATE_WORKING);
    copy_fields(&mut record, fields, METER_FIELDS);
    record
}

/// One microinverter.
pub fn inverter_record(fields: &FieldMap) -> DeviceRecord {
    let mut record = DeviceRecord::new(DeviceKind::Inverter);
    record.insert(keys::SERIAL, field_or_unknown(fields, "sn"));
    record.insert(keys::MODEL, field_or_unknown(fields, "prodMdlNm"));
    record.insert(keys::TYPE, "MICRO-INVERTER");
    record.insert(keys::DESCR, description("Inverter", fields));
    record.insert(keys::STATE, STATE_WORKING);
    copy_fields(&mut record, fields, INVERTER_FIELDS);
    record
}

/// Assemble the canonical device list: the PVS first, then meters, then
/// inverters, each in the order the supervisor reported them.
pub fn device_list(host: &str, sysinfo: &VarMap, meters: &VarMap, inverters: &VarMap) -> DeviceList {
    let mut devices = vec![pvs_record(host, sysinfo)];

    let meters = group_devices(meters, DeviceClass::Meter);
    let inverters = group_devices(inverters, DeviceClass::Inverter);
    debug!(
        meters = meters.len(),
        inverters = inverters.len(),
        "normalizing LocalAPI telemetry"
    );

    devices.extend(meters.values().map(meter_record));
    devices.extend(inverters.values().map(inverter_record));

    DeviceList::new(devices)
}

// ── Energy storage ─────────────────────────────────────────────────

fn zero_reading() -> Value {
    json!({
        "reading": {
            "current": { "value": 0 },
            "power": { "value": 0 },
            "voltage": { "value": 0 }
        }
    })
}

/// Aggregate ESS status from the livedata set.
///
/// The LocalAPI only exposes system-level state of charge and storage
/// power, so at most one `ESS-AGG` unit and one `HUBPLUS-AGG` hub are
/// produced; per-unit readings are zero. Without either variable the
/// report is empty.
pub fn ess_status(livedata: &VarMap) -> EssStatus {
    let soc = livedata.get(LIVEDATA_SOC).filter(|v| !v.is_null());
    let ess_p = livedata.get(LIVEDATA_ESS_P).filter(|v| !v.is_null());
    if soc.is_none() && ess_p.is_none() {
        return EssStatus::empty();
    }

    let agg_power = ess_p.and_then(value_f64).unwrap_or(0.0);

    let ess = json!({
        "serial_number": "ESS-AGG",
        "ess_meter_reading": {
            "agg_power": { "value": agg_power },
            "meter_a": zero_reading(),
            "meter_b": zero_reading()
        },
        "enclosure_humidity": { "value": 0 },
        "enclosure_temperature": { "value": 0 }
    });

    let hub = json!({
        "serial_number": "HUBPLUS-AGG",
        "grid_phase1_voltage": { "value": 0 },
        "grid_phase2_voltage": { "value": 0 },
        "hub_humidity": { "value": 0 },
        "hub_temperature": { "value": 0 },
        "inverter_connection_voltage": { "value": 0 },
        "load_phase1_voltage": { "value": 0 },
        "load_phase2_voltage": { "value": 0 }
    });

    EssStatus::with_report(EssReport {
        ess_status: vec![ess],
        hub_plus_status: hub,
        ..EssReport::default()
    })
}
