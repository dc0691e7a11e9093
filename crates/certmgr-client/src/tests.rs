//! Tests for the certmgr API client and types.

#![allow(clippy::unwrap_used, clippy::panic)]

use std::time::Duration;

use certmgr_core::{Scheme, TransportKind};
use serde_json::json;
use wiremock::matchers::{body_json, method, path, query_param};
use wiremock::{Mock, MockServer, ResponseTemplate};

use super::client::{validate_port, CertMgrClient, ClientConfig};
use super::error::ClientError;
use super::resolve::HostResolver;
use super::transport::Transport;
use super::types::{Certificate, CertificateRef};

const STAGED: &str = "/krb/certmgr/staged/";

fn client_for(server: &MockServer) -> CertMgrClient {
    let addr = server.address();
    CertMgrClient::with_parts(
        addr.ip().to_string(),
        addr.port(),
        Scheme::Http,
        HostResolver::Verbatim,
        Transport::http(Duration::from_secs(10)).unwrap(),
    )
}

fn verbatim_config(port: i64) -> ClientConfig {
    ClientConfig {
        verbatim_host: true,
        ..ClientConfig::new("certmgr.example.org", port)
    }
}

fn cert_json(id: u64, hostname: &str) -> serde_json::Value {
    json!({
        "id": id,
        "hostname": hostname,
        "requestor": null,
        "start": "2026-10-01T00:00:00",
        "end": "2027-10-01T00:00:00"
    })
}

fn staged_json(objects: Vec<serde_json::Value>) -> serde_json::Value {
    json!({
        "meta": {"limit": 20, "offset": 0, "total_count": objects.len()},
        "objects": objects
    })
}

// =============================================================================
// Client construction tests
// =============================================================================

#[test]
fn port_zero_is_configuration_error() {
    let err = CertMgrClient::new(&verbatim_config(0)).unwrap_err();
    assert!(matches!(err, ClientError::Configuration(_)));
}

#[test]
fn negative_port_is_configuration_error() {
    let err = CertMgrClient::new(&verbatim_config(-8008)).unwrap_err();
    assert!(matches!(err, ClientError::Configuration(_)));
}

#[test]
fn port_above_range_is_configuration_error() {
    let err = CertMgrClient::new(&verbatim_config(65_536)).unwrap_err();
    assert!(matches!(err, ClientError::Configuration(_)));
}

#[test]
fn port_range_bounds_are_accepted() {
    assert_eq!(validate_port(1).unwrap(), 1);
    assert_eq!(validate_port(8008).unwrap(), 8008);
    assert_eq!(validate_port(65_535).unwrap(), 65_535);
}

#[test]
fn valid_config_creates_client() {
    assert!(CertMgrClient::new(&verbatim_config(8008)).is_ok());
}

#[test]
fn blank_host_is_configuration_error() {
    let config = ClientConfig {
        host: "   ".into(),
        ..verbatim_config(8008)
    };
    let err = CertMgrClient::new(&config).unwrap_err();
    assert!(matches!(err, ClientError::Configuration(_)));
}

#[test]
fn default_config_uses_curl_over_https() {
    let config = ClientConfig::new("certmgr.example.org", 8008);
    assert_eq!(config.transport, TransportKind::Curl);
    assert_eq!(config.scheme, Scheme::Https);
    assert_eq!(config.timeout, Duration::from_secs(10));
    assert!(!config.verbatim_host);
}

#[test]
fn api_url_constructed_correctly() {
    let client = CertMgrClient::new(&verbatim_config(8008)).unwrap();
    assert_eq!(
        client.api_url("baby01.example.org", "/staged/"),
        "https://baby01.example.org:8008/krb/certmgr/staged/"
    );
}

// =============================================================================
// Deserialization tests
// =============================================================================

#[test]
fn deserialize_certificate_full() {
    let json = r#"{
        "id": 42,
        "hostname": "tf-test-1.example.org",
        "requestor": "terraform-test",
        "start": "2026-10-01T00:00:00",
        "end": "2027-10-01T00:00:00"
    }"#;
    let cert: Certificate = serde_json::from_str(json).unwrap();
    assert_eq!(cert.id, 42);
    assert_eq!(cert.hostname, "tf-test-1.example.org");
    assert_eq!(cert.requestor.as_deref(), Some("terraform-test"));
    assert_eq!(cert.end.as_deref(), Some("2027-10-01T00:00:00"));
}

#[test]
fn deserialize_certificate_minimal() {
    let cert: Certificate =
        serde_json::from_str(r#"{"id": 7, "hostname": "h.example.org"}"#).unwrap();
    assert!(cert.requestor.is_none());
    assert!(cert.start.is_none());
    assert!(cert.end.is_none());
}

#[test]
fn serialize_certificate_omits_absent_fields() {
    let cert = Certificate {
        id: 7,
        hostname: "h.example.org".into(),
        requestor: Some("ops".into()),
        start: None,
        end: None,
    };
    assert_eq!(
        serde_json::to_value(&cert).unwrap(),
        json!({"id": 7, "hostname": "h.example.org", "requestor": "ops"})
    );
}

// =============================================================================
// Error display tests
// =============================================================================

#[test]
fn error_display_api() {
    let err = ClientError::Api {
        status: 403,
        message: "Forbidden".into(),
    };
    assert_eq!(err.to_string(), "certmgr API error (403): Forbidden");
    assert!(err.is_transport());
}

#[test]
fn error_display_not_found() {
    let err = ClientError::NotFound(CertificateRef::from("h.example.org"));
    assert_eq!(
        err.to_string(),
        "No certificates found for hostname h.example.org"
    );
    assert!(err.is_not_found());
    assert!(!err.is_transport());
}

// =============================================================================
// Request tests (mock server)
// =============================================================================

#[tokio::test]
async fn create_posts_hostname_and_returns_assigned_id() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path(STAGED))
        .and(body_json(json!({"hostname": "tf-test-1.example.org"})))
        .respond_with(
            ResponseTemplate::new(201).set_body_json(cert_json(42, "tf-test-1.example.org")),
        )
        .expect(1)
        .mount(&server)
        .await;

    let cert = client_for(&server)
        .create_certificate("tf-test-1.example.org")
        .await
        .unwrap();
    assert_eq!(cert.id, 42);
    assert_eq!(cert.hostname, "tf-test-1.example.org");
}

#[tokio::test]
async fn create_with_malformed_body_is_decode_error() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path(STAGED))
        .respond_with(ResponseTemplate::new(201).set_body_string("<html>nope</html>"))
        .mount(&server)
        .await;

    let err = client_for(&server)
        .create_certificate("h.example.org")
        .await
        .unwrap_err();
    assert!(matches!(err, ClientError::Decode(_)));
}

#[tokio::test]
async fn create_surfaces_api_error_body() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path(STAGED))
        .respond_with(ResponseTemplate::new(401).set_body_string("Authentication required"))
        .mount(&server)
        .await;

    let err = client_for(&server)
        .create_certificate("h.example.org")
        .await
        .unwrap_err();
    match err {
        ClientError::Api { status, message } => {
            assert_eq!(status, 401);
            assert_eq!(message, "Authentication required");
        }
        other => panic!("expected Api error, got {other:?}"),
    }
}

#[tokio::test]
async fn get_by_hostname_returns_last_staged_entry() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path(STAGED))
        .and(query_param("hostname", "h.example.org"))
        .respond_with(ResponseTemplate::new(200).set_body_json(staged_json(vec![
            cert_json(10, "h.example.org"),
            cert_json(11, "h.example.org"),
            cert_json(12, "h.example.org"),
        ])))
        .mount(&server)
        .await;

    let cert = client_for(&server)
        .get_certificate(&CertificateRef::from("h.example.org"))
        .await
        .unwrap();
    assert_eq!(cert.id, 12);
}

#[tokio::test]
async fn get_by_hostname_empty_listing_is_not_found() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path(STAGED))
        .respond_with(ResponseTemplate::new(200).set_body_json(staged_json(vec![])))
        .mount(&server)
        .await;

    let err = client_for(&server)
        .get_certificate(&CertificateRef::from("gone.example.org"))
        .await
        .unwrap_err();
    assert!(err.is_not_found());
}

#[tokio::test]
async fn get_by_id_fetches_single_record() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/krb/certmgr/staged/42/"))
        .respond_with(ResponseTemplate::new(200).set_body_json(cert_json(42, "h.example.org")))
        .mount(&server)
        .await;

    let cert = client_for(&server)
        .get_certificate(&CertificateRef::Id(42))
        .await
        .unwrap();
    assert_eq!(cert.hostname, "h.example.org");
}

#[tokio::test]
async fn get_by_id_404_is_not_found() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/krb/certmgr/staged/404/"))
        .respond_with(ResponseTemplate::new(404))
        .mount(&server)
        .await;

    let err = client_for(&server)
        .get_certificate(&CertificateRef::Id(404))
        .await
        .unwrap_err();
    assert!(matches!(err, ClientError::NotFound(CertificateRef::Id(404))));
}

#[tokio::test]
async fn update_posts_full_record() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/krb/certmgr/certificate/"))
        .and(body_json(json!({
            "id": 42,
            "hostname": "h.example.org",
            "requestor": "terraform-test",
            "start": "2026-10-01T00:00:00",
            "end": "2027-10-01T00:00:00"
        })))
        .respond_with(ResponseTemplate::new(200))
        .expect(1)
        .mount(&server)
        .await;

    let cert = Certificate {
        id: 42,
        hostname: "h.example.org".into(),
        requestor: Some("terraform-test".into()),
        start: Some("2026-10-01T00:00:00".into()),
        end: Some("2027-10-01T00:00:00".into()),
    };
    client_for(&server).update_certificate(&cert).await.unwrap();
}

#[tokio::test]
async fn update_failure_is_transport_error() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/krb/certmgr/certificate/"))
        .respond_with(ResponseTemplate::new(500))
        .mount(&server)
        .await;

    let cert = Certificate {
        id: 1,
        hostname: "h.example.org".into(),
        requestor: None,
        start: None,
        end: None,
    };
    let err = client_for(&server)
        .update_certificate(&cert)
        .await
        .unwrap_err();
    assert!(err.is_transport());
    assert_eq!(
        err.to_string(),
        "certmgr API error (500): Internal Server Error"
    );
}

#[tokio::test]
async fn delete_by_hostname_drains_every_staged_entry() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path(STAGED))
        .and(query_param("hostname", "h.example.org"))
        .respond_with(ResponseTemplate::new(200).set_body_json(staged_json(vec![
            cert_json(1, "h.example.org"),
            cert_json(2, "h.example.org"),
        ])))
        .up_to_n_times(1)
        .with_priority(1)
        .mount(&server)
        .await;
    Mock::given(method("GET"))
        .and(path(STAGED))
        .respond_with(ResponseTemplate::new(200).set_body_json(staged_json(vec![])))
        .mount(&server)
        .await;
    for id in [1, 2] {
        Mock::given(method("DELETE"))
            .and(path(format!("/krb/certmgr/staged/{id}/")))
            .respond_with(ResponseTemplate::new(204))
            .expect(1)
            .mount(&server)
            .await;
    }

    let client = client_for(&server);
    let key = CertificateRef::from("h.example.org");
    client.delete_certificate(&key).await.unwrap();

    let err = client.get_certificate(&key).await.unwrap_err();
    assert!(err.is_not_found());
}

#[tokio::test]
async fn delete_drain_stops_at_first_failure() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path(STAGED))
        .respond_with(ResponseTemplate::new(200).set_body_json(staged_json(vec![
            cert_json(1, "h.example.org"),
            cert_json(2, "h.example.org"),
            cert_json(3, "h.example.org"),
        ])))
        .mount(&server)
        .await;
    Mock::given(method("DELETE"))
        .and(path("/krb/certmgr/staged/1/"))
        .respond_with(ResponseTemplate::new(204))
        .expect(1)
        .mount(&server)
        .await;
    Mock::given(method("DELETE"))
        .and(path("/krb/certmgr/staged/2/"))
        .respond_with(ResponseTemplate::new(500).set_body_string("database locked"))
        .expect(1)
        .mount(&server)
        .await;
    Mock::given(method("DELETE"))
        .and(path("/krb/certmgr/staged/3/"))
        .respond_with(ResponseTemplate::new(204))
        .expect(0)
        .mount(&server)
        .await;

    let err = client_for(&server)
        .delete_certificate(&CertificateRef::from("h.example.org"))
        .await
        .unwrap_err();
    assert!(matches!(err, ClientError::DeleteFailed { id: 2, .. }));
    assert!(err.is_transport());
}

#[tokio::test]
async fn delete_drain_skips_entries_already_gone() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path(STAGED))
        .respond_with(ResponseTemplate::new(200).set_body_json(staged_json(vec![
            cert_json(10, "h.example.org"),
            cert_json(11, "h.example.org"),
        ])))
        .mount(&server)
        .await;
    Mock::given(method("DELETE"))
        .and(path("/krb/certmgr/staged/10/"))
        .respond_with(ResponseTemplate::new(404))
        .expect(1)
        .mount(&server)
        .await;
    Mock::given(method("DELETE"))
        .and(path("/krb/certmgr/staged/11/"))
        .respond_with(ResponseTemplate::new(204))
        .expect(1)
        .mount(&server)
        .await;

    client_for(&server)
        .delete_certificate(&CertificateRef::from("h.example.org"))
        .await
        .unwrap();
}

#[tokio::test]
async fn create_get_delete_by_id_scenario() {
    let server = MockServer::start().await;
    let hostname = "tf-test-1.example.org";

    Mock::given(method("POST"))
        .and(path(STAGED))
        .respond_with(ResponseTemplate::new(201).set_body_json(cert_json(42, hostname)))
        .mount(&server)
        .await;
    // The listing shows the entry until it is deleted.
    Mock::given(method("GET"))
        .and(path(STAGED))
        .and(query_param("hostname", hostname))
        .respond_with(
            ResponseTemplate::new(200).set_body_json(staged_json(vec![cert_json(42, hostname)])),
        )
        .up_to_n_times(1)
        .with_priority(1)
        .mount(&server)
        .await;
    Mock::given(method("GET"))
        .and(path(STAGED))
        .respond_with(ResponseTemplate::new(200).set_body_json(staged_json(vec![])))
        .mount(&server)
        .await;
    Mock::given(method("DELETE"))
        .and(path("/krb/certmgr/staged/42/"))
        .respond_with(ResponseTemplate::new(204))
        .expect(1)
        .mount(&server)
        .await;

    let client = client_for(&server);
    let created = client.create_certificate(hostname).await.unwrap();
    assert_eq!(created.id, 42);

    let read = client
        .get_certificate(&CertificateRef::from(hostname))
        .await
        .unwrap();
    assert_eq!(read, created);

    client
        .delete_certificate(&CertificateRef::Id(created.id))
        .await
        .unwrap();

    let err = client
        .get_certificate(&CertificateRef::from(hostname))
        .await
        .unwrap_err();
    assert!(err.is_not_found());
}
