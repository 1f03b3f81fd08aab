#![allow(clippy::unwrap_used)]
// Integration tests for `LegacyClient` using wiremock.

use std::time::Duration;

use pretty_assertions::assert_eq;
use serde_json::json;
use url::Url;
use wiremock::matchers::{method, path, query_param};
use wiremock::{Mock, MockServer, ResponseTemplate};

use sunpvs_api::{Error, ErrorKind, LegacyClient, TransportConfig};

// ── Helpers ─────────────────────────────────────────────────────────

async fn setup() -> (MockServer, LegacyClient) {
    let server = MockServer::start().await;
    let base_url = Url::parse(&format!("{}/", server.uri())).unwrap();
    let client = LegacyClient::with_client(reqwest::Client::new(), base_url);
    (server, client)
}

// ── Command tests ───────────────────────────────────────────────────

#[tokio::test]
async fn test_device_list_passthrough() {
    let (server, client) = setup().await;

    let body = json!({
        "result": "succeed",
        "devices": [
            {
                "DEVICE_TYPE": "PVS",
                "SERIAL": "ZT01234567890A1651",
                "MODEL": "PV Supervisor PVS6",
                "STATE": "working",
                "dl_comm_err": "0"
            },
            {
                "DEVICE_TYPE": "Inverter",
                "SERIAL": "E00121234567",
                "ltea_3phsum_kwh": "1234.5678"
            }
        ]
    });

    Mock::given(method("GET"))
        .and(path("/cgi-bin/dl_cgi"))
        .and(query_param("Command", "DeviceList"))
        .respond_with(ResponseTemplate::new(200).set_body_json(&body))
        .expect(1)
        .mount(&server)
        .await;

    let devices = client.device_list().await.unwrap();
    assert_eq!(devices, body);
}

#[tokio::test]
async fn test_arbitrary_command_name() {
    let (server, client) = setup().await;

    Mock::given(method("GET"))
        .and(path("/cgi-bin/dl_cgi"))
        .and(query_param("Command", "Get_Comm"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "result": "succeed",
            "networkstatus": { "interfaces": [{ "interface": "wan", "link": "connected" }] }
        })))
        .expect(1)
        .mount(&server)
        .await;

    let status = client.comm_status().await.unwrap();
    assert_eq!(status["networkstatus"]["interfaces"][0]["link"], "connected");
}

#[tokio::test]
async fn test_ess_status_passthrough() {
    let (server, client) = setup().await;

    let body = json!({
        "ess_report": {
            "battery_status": [{ "serial_number": "BAT01", "ssoc": 0.87 }],
            "ess_status": [],
            "hub_plus_status": { "serial_number": "HUB01" }
        },
        "errors": []
    });

    Mock::given(method("GET"))
        .and(path("/cgi-bin/dl_cgi/energy-storage-system/status"))
        .respond_with(ResponseTemplate::new(200).set_body_json(&body))
        .mount(&server)
        .await;

    assert_eq!(client.ess_status().await.unwrap(), body);
}

// ── Error tests ─────────────────────────────────────────────────────

#[tokio::test]
async fn test_http_error_is_connection_failure() {
    let (server, client) = setup().await;

    Mock::given(method("GET"))
        .and(path("/cgi-bin/dl_cgi"))
        .respond_with(ResponseTemplate::new(500).set_body_string("busy"))
        .mount(&server)
        .await;

    let err = client.run_command("DeviceList").await.unwrap_err();
    assert!(
        matches!(err, Error::Http { status: 500, .. }),
        "expected Http 500, got: {err:?}"
    );
    assert_eq!(err.kind(), ErrorKind::Connection);
}

#[tokio::test]
async fn test_non_json_body_is_parse_failure() {
    let (server, client) = setup().await;

    Mock::given(method("GET"))
        .and(path("/cgi-bin/dl_cgi"))
        .respond_with(ResponseTemplate::new(200).set_body_string("<html>login</html>"))
        .mount(&server)
        .await;

    let err = client.device_list().await.unwrap_err();
    assert_eq!(err.kind(), ErrorKind::Parse);
}

#[tokio::test]
async fn test_timeout_reports_configured_limit() {
    let server = MockServer::start().await;
    let base_url = Url::parse(&format!("{}/", server.uri())).unwrap();
    let transport = TransportConfig {
        timeout: Duration::from_secs(5),
        legacy_timeout: Duration::from_secs(1),
    };
    let client = LegacyClient::new(base_url, &transport).unwrap();

    Mock::given(method("GET"))
        .and(path("/cgi-bin/dl_cgi"))
        .respond_with(ResponseTemplate::new(200).set_delay(Duration::from_secs(3)))
        .mount(&server)
        .await;

    let err = client.comm_status().await.unwrap_err();
    assert!(
        matches!(err, Error::Timeout { timeout_secs: 1 }),
        "expected Timeout after 1s, got: {err:?}"
    );
    assert_eq!(err.to_string(), "Request timed out after 1s");
}
