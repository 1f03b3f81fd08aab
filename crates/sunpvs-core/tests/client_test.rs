#![allow(clippy::unwrap_used)]
// End-to-end tests for `PvsClient` against a wiremock supervisor.

use std::time::Duration;

use pretty_assertions::assert_eq;
use secrecy::SecretString;
use serde_json::{Value, json};
use wiremock::matchers::{header, method, path, query_param};
use wiremock::{Mock, MockServer, ResponseTemplate};

use sunpvs_core::{
    ApiMode, ClientConfig, ClientState, CoreError, DeviceKind, ErrorKind, ModePreference,
    PvsClient,
};

const INFO: &str = "/cgi-bin/dl_cgi/supervisor/info";
const SERIAL: &str = "ZT01234567890A1651";

// ── Helpers ─────────────────────────────────────────────────────────

fn config(server: &MockServer) -> ClientConfig {
    let mut config = ClientConfig::new(server.uri());
    config.timeout = Duration::from_secs(5);
    config.legacy_timeout = Duration::from_secs(5);
    config
}

fn secret(s: &str) -> SecretString {
    SecretString::from(s.to_owned())
}

async fn mount_info(server: &MockServer, build: i64, serial: Option<&str>) {
    let mut supervisor = json!({ "BUILD": build, "SWVER": "2025.06, Build 61845" });
    if let Some(serial) = serial {
        supervisor["SERIAL"] = json!(serial);
    }
    Mock::given(method("GET"))
        .and(path(INFO))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({ "supervisor": supervisor })))
        .mount(server)
        .await;
}

/// Login accepting exactly `authorization`; bare `/auth` answers 401.
async fn mount_auth(server: &MockServer, authorization: &str) {
    Mock::given(method("GET"))
        .and(path("/auth"))
        .and(header("authorization", authorization))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({ "session": "tok" })))
        .with_priority(1)
        .mount(server)
        .await;
    Mock::given(method("GET"))
        .and(path("/auth"))
        .respond_with(ResponseTemplate::new(401))
        .mount(server)
        .await;
}

async fn mount_vars(server: &MockServer, cache: &str, body: Value) {
    Mock::given(method("GET"))
        .and(path("/vars"))
        .and(query_param("cache", cache))
        .respond_with(ResponseTemplate::new(200).set_body_json(body))
        .mount(server)
        .await;
}

async fn mount_telemetry(server: &MockServer) {
    mount_vars(
        server,
        "sysinfo",
        json!({
            "/sys/info/serialnum": SERIAL,
            "/sys/info/model": "PVS6",
            "/sys/info/sw_rev": "2025.06, Build 61845"
        }),
    )
    .await;
    mount_vars(
        server,
        "mdata",
        json!({
            "/sys/devices/meter/0/sn": "PVS6M0001p",
            "/sys/devices/meter/0/p3phsumKw": 3.2
        }),
    )
    .await;
    mount_vars(
        server,
        "idata",
        json!({
            "/sys/devices/inverter/0/sn": "INV001",
            "/sys/devices/inverter/0/ltea3phsumKwh": 100.5,
            "/sys/devices/inverter/0/pMppt1Kw": 0.25
        }),
    )
    .await;
}

async fn localapi_client(server: &MockServer) -> PvsClient {
    mount_info(server, 61845, Some(SERIAL)).await;
    mount_auth(server, "basic c3NtX293bmVyOkExNjUx").await;
    PvsClient::connect(config(server)).await.unwrap()
}

/// `match` presence for every `/vars` request, in arrival order.
async fn vars_match_flags(server: &MockServer) -> Vec<bool> {
    server
        .received_requests()
        .await
        .unwrap()
        .iter()
        .filter(|r| r.url.path() == "/vars")
        .map(|r| r.url.query_pairs().any(|(k, _)| k == "match"))
        .collect()
}

// ── Legacy mode ─────────────────────────────────────────────────────

#[tokio::test]
async fn test_old_firmware_passes_device_list_through() {
    let server = MockServer::start().await;
    mount_info(&server, 5408, Some(SERIAL)).await;

    let body = json!({
        "result": "succeed",
        "devices": [
            { "DEVICE_TYPE": "PVS", "SERIAL": SERIAL, "MODEL": "PV Supervisor PVS6", "dl_uptime": "91513" },
            { "DEVICE_TYPE": "Battery", "SERIAL": "BAT01", "STATE": "working" }
        ]
    });

    Mock::given(method("GET"))
        .and(path("/cgi-bin/dl_cgi"))
        .and(query_param("Command", "DeviceList"))
        .respond_with(ResponseTemplate::new(200).set_body_json(&body))
        .expect(1)
        .mount(&server)
        .await;
    Mock::given(path("/auth"))
        .respond_with(ResponseTemplate::new(401))
        .expect(0)
        .mount(&server)
        .await;

    let mut client = PvsClient::connect(config(&server)).await.unwrap();
    assert_eq!(client.mode(), Some(ApiMode::Legacy));
    assert_eq!(client.state(), ClientState::LegacyReady);

    let list = client.device_list().await.unwrap();
    assert_eq!(serde_json::to_value(&list).unwrap(), body);
    assert_eq!(client.state(), ClientState::Ready);
}

#[tokio::test]
async fn test_legacy_device_list_without_devices_is_unchanged() {
    let server = MockServer::start().await;
    let body = json!({ "result": "succeed" });
    Mock::given(method("GET"))
        .and(path("/cgi-bin/dl_cgi"))
        .and(query_param("Command", "DeviceList"))
        .respond_with(ResponseTemplate::new(200).set_body_json(&body))
        .mount(&server)
        .await;

    let mut client = PvsClient::connect(config(&server).with_mode(ModePreference::Legacy))
        .await
        .unwrap();

    let list = client.device_list().await.unwrap();
    assert!(list.is_empty());
    assert_eq!(serde_json::to_value(&list).unwrap(), body);

    let index = client.device_index(false).await.unwrap();
    assert!(index.to_list().is_empty());
}

#[tokio::test]
async fn test_legacy_device_list_keeps_unknown_entries() {
    let server = MockServer::start().await;
    let body = json!({
        "result": "succeed",
        "devices": [{ "DEVICE_TYPE": "Inverter", "SERIAL": "E001" }, "garbage"]
    });
    Mock::given(method("GET"))
        .and(path("/cgi-bin/dl_cgi"))
        .and(query_param("Command", "DeviceList"))
        .respond_with(ResponseTemplate::new(200).set_body_json(&body))
        .mount(&server)
        .await;

    let mut client = PvsClient::connect(config(&server).with_mode(ModePreference::Legacy))
        .await
        .unwrap();

    let list = client.device_list().await.unwrap();
    assert_eq!(list.len(), 1);
    assert_eq!(serde_json::to_value(&list).unwrap(), body);
}

#[tokio::test]
async fn test_pinned_legacy_skips_probe() {
    let server = MockServer::start().await;
    Mock::given(path(INFO))
        .respond_with(ResponseTemplate::new(200))
        .expect(0)
        .mount(&server)
        .await;

    let body = json!({ "result": "succeed", "networkstatus": { "ts": "1575501242" } });
    Mock::given(method("GET"))
        .and(path("/cgi-bin/dl_cgi"))
        .and(query_param("Command", "Get_Comm"))
        .respond_with(ResponseTemplate::new(200).set_body_json(&body))
        .mount(&server)
        .await;

    let mut client = PvsClient::connect(config(&server).with_mode(ModePreference::Legacy))
        .await
        .unwrap();

    assert!(client.capability().is_none());
    assert_eq!(client.network_status().await.unwrap(), body);
}

#[tokio::test]
async fn test_legacy_ess_is_verbatim() {
    let server = MockServer::start().await;
    let body = json!({
        "ess_report": {
            "battery_status": [{ "serial_number": "BAT01", "ssoc": 0.87 }],
            "ess_status": [{ "serial_number": "ESS01" }],
            "hub_plus_status": { "serial_number": "HUB01" }
        },
        "last_updated": "2024-05-01T12:00:00Z"
    });
    Mock::given(method("GET"))
        .and(path("/cgi-bin/dl_cgi/energy-storage-system/status"))
        .respond_with(ResponseTemplate::new(200).set_body_json(&body))
        .mount(&server)
        .await;

    let mut client = PvsClient::connect(config(&server).with_mode(ModePreference::Legacy))
        .await
        .unwrap();

    let status = client.ess_status().await.unwrap();
    assert_eq!(serde_json::to_value(&status).unwrap(), body);
}

// ── LocalAPI mode ───────────────────────────────────────────────────

#[tokio::test]
async fn test_localapi_device_list_is_normalized() {
    let server = MockServer::start().await;
    mount_telemetry(&server).await;
    let mut client = localapi_client(&server).await;

    assert_eq!(client.mode(), Some(ApiMode::LocalApi));
    assert_eq!(client.state(), ClientState::LocalApiAuthenticated);
    assert_eq!(client.capability().unwrap().auth_endpoint, Some(true));

    let list = client.device_list().await.unwrap();

    let types: Vec<_> = list.devices.iter().filter_map(|d| d.device_type()).collect();
    assert_eq!(types, ["PVS", "Power Meter", "Inverter"]);
    assert_eq!(list.devices[0].serial().as_deref(), Some(SERIAL));
    assert_eq!(list.devices[1].get("p_3phsum_kw"), Some(&json!(3.2)));
    assert_eq!(list.devices[2].get("ltea_3phsum_kwh"), Some(&json!(100.5)));
}

#[tokio::test]
async fn test_cache_pattern_sent_once_until_invalidated() {
    let server = MockServer::start().await;
    mount_telemetry(&server).await;
    let mut client = localapi_client(&server).await;

    client.device_list().await.unwrap();
    client.device_list().await.unwrap();
    client.invalidate_cache();
    client.device_list().await.unwrap();

    assert_eq!(
        vars_match_flags(&server).await,
        [true, true, true, false, false, false, true, true, true]
    );
}

#[tokio::test]
async fn test_failed_category_degrades_to_empty() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/vars"))
        .and(query_param("cache", "mdata"))
        .respond_with(ResponseTemplate::new(500))
        .with_priority(1)
        .mount(&server)
        .await;
    mount_telemetry(&server).await;
    let mut client = localapi_client(&server).await;

    let list = client.device_list().await.unwrap();

    assert_eq!(list.of_kind(DeviceKind::PowerMeter).count(), 0);
    assert_eq!(list.of_kind(DeviceKind::Inverter).count(), 1);
    assert_eq!(list.of_kind(DeviceKind::Pvs).count(), 1);
}

#[tokio::test]
async fn test_failed_sysinfo_falls_back_to_host() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/vars"))
        .and(query_param("cache", "sysinfo"))
        .respond_with(ResponseTemplate::new(200).set_body_string("not json"))
        .with_priority(1)
        .mount(&server)
        .await;
    mount_telemetry(&server).await;
    let mut client = localapi_client(&server).await;

    let list = client.device_list().await.unwrap();

    assert_eq!(list.devices[0].serial().as_deref(), Some("PVS-127.0.0.1"));
}

#[tokio::test]
async fn test_virtual_meter_from_index() {
    let server = MockServer::start().await;
    mount_telemetry(&server).await;
    let mut client = localapi_client(&server).await;

    let index = client.device_index(true).await.unwrap();

    let meter = index
        .get("Power Meter", &format!("{SERIAL}pv"))
        .unwrap();
    assert_eq!(meter.get("net_ltea_3phsum_kwh"), Some(&json!(100.5)));
    assert_eq!(meter.get("p_3phsum_kw"), Some(&json!(0.25)));
}

#[tokio::test]
async fn test_localapi_ess_synthesized_from_livedata() {
    let server = MockServer::start().await;
    mount_vars(
        &server,
        "ldata",
        json!({ "/sys/livedata/soc": 0.5, "/sys/livedata/ess_p": -2.5 }),
    )
    .await;
    let mut client = localapi_client(&server).await;

    let report = client.ess_status().await.unwrap().ess_report.unwrap();

    assert_eq!(report.ess_status[0]["serial_number"], "ESS-AGG");
    assert_eq!(
        report.ess_status[0]["ess_meter_reading"]["agg_power"]["value"],
        json!(-2.5)
    );
    assert_eq!(report.hub_plus_status["serial_number"], "HUBPLUS-AGG");
}

#[tokio::test]
async fn test_localapi_ess_failure_is_empty() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/vars"))
        .respond_with(ResponseTemplate::new(503))
        .mount(&server)
        .await;
    let mut client = localapi_client(&server).await;

    let status = client.ess_status().await.unwrap();
    assert!(status.is_empty());
}

#[tokio::test]
async fn test_localapi_network_status_is_sysinfo() {
    let server = MockServer::start().await;
    mount_telemetry(&server).await;
    let mut client = localapi_client(&server).await;

    let status = client.network_status().await.unwrap();
    assert_eq!(status["/sys/info/model"], "PVS6");
}

#[tokio::test]
async fn test_localapi_network_status_surfaces_errors() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/vars"))
        .respond_with(ResponseTemplate::new(500))
        .mount(&server)
        .await;
    let mut client = localapi_client(&server).await;

    let err = client.network_status().await.unwrap_err();
    assert_eq!(err.kind(), ErrorKind::Connection);
}

// ── Credential resolution ───────────────────────────────────────────

#[tokio::test]
async fn test_explicit_credential_wins() {
    let server = MockServer::start().await;
    mount_info(&server, 61845, Some(SERIAL)).await;
    mount_auth(&server, "basic c3NtX293bmVyOkVYUEwx").await;

    let mut config = config(&server).with_credential(secret("EXPL1"));
    config.env_credential = Some(secret("ENVVR"));

    let client = PvsClient::connect(config).await.unwrap();
    assert_eq!(client.state(), ClientState::LocalApiAuthenticated);
}

#[tokio::test]
async fn test_environment_beats_fallback() {
    let server = MockServer::start().await;
    mount_info(&server, 61845, None).await;
    mount_auth(&server, "basic c3NtX293bmVyOkVOVlZS").await;

    let mut config = config(&server);
    config.env_credential = Some(secret("ENVVR"));
    config.fallback_credential = Some(secret("FALLB"));

    PvsClient::connect(config).await.unwrap();
}

#[tokio::test]
async fn test_fallback_used_last() {
    let server = MockServer::start().await;
    mount_info(&server, 61845, None).await;
    mount_auth(&server, "basic c3NtX293bmVyOkZBTExC").await;

    let mut config = config(&server).with_credential(secret("   "));
    config.fallback_credential = Some(secret("FALLB"));

    PvsClient::connect(config).await.unwrap();
}

#[tokio::test]
async fn test_no_credential_fails_to_connect() {
    let server = MockServer::start().await;
    mount_info(&server, 61845, None).await;
    mount_auth(&server, "basic c3NtX293bmVyOkExNjUx").await;

    let mut client = PvsClient::new(config(&server));
    let err = client.initialize().await.unwrap_err();

    assert!(
        matches!(err, CoreError::MissingCredential { .. }),
        "expected MissingCredential, got: {err:?}"
    );
    assert_eq!(err.kind(), ErrorKind::Connection);
    assert_eq!(client.state(), ClientState::Uninitialized);
    assert!(matches!(
        client.device_list().await,
        Err(CoreError::NotConnected)
    ));
}

#[tokio::test]
async fn test_rejected_credential_is_connection_failure() {
    let server = MockServer::start().await;
    mount_info(&server, 61845, Some(SERIAL)).await;
    Mock::given(path("/auth"))
        .respond_with(ResponseTemplate::new(401))
        .mount(&server)
        .await;

    let err = PvsClient::connect(config(&server)).await.err().unwrap();
    assert!(matches!(err, CoreError::AuthenticationFailed { .. }));
    assert_eq!(err.kind(), ErrorKind::Connection);
}

// ── Static probe ────────────────────────────────────────────────────

#[tokio::test]
async fn test_check_capability_reports_http_status() {
    let server = MockServer::start().await;
    Mock::given(path(INFO))
        .respond_with(ResponseTemplate::new(404))
        .mount(&server)
        .await;

    let cap = PvsClient::check_capability(&server.uri(), Duration::from_secs(5)).await;

    assert!(!cap.supported);
    assert_eq!(cap.error.as_deref(), Some("HTTP 404"));
}
