//! End-to-end tests through the HTTP router

use async_trait::async_trait;
use axum::{
    body::Body,
    http::{header, Request, StatusCode},
    Router,
};
use http_body_util::BodyExt;
use serde_json::{json, Value};
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;
use std::time::Duration;
use tower::ServiceExt;
use wiremock::matchers::{method, path};
use wiremock::{Mock, MockServer, ResponseTemplate};

use gprox::api::{router, AppState};
use gprox::config::Settings;
use gprox::google::{Backoff, CloudDnsClient, DnsApiError, ResourceRecordSet, StaticTokenSource};
use gprox::manager::{ChangerSource, DnsManager, Operation, RecordChanger};
use gprox::metrics::{DnsMetrics, Outcome};

const CONFIG: &str = r#"
gcloud_service_account: /etc/gprox/sa.json
gcloud_project: my-project
managed_zones:
  z1: example.com
api_keys:
  - good
"#;

/// Answers every change with a fixed payload
#[derive(Default)]
struct EchoChanger {
    calls: AtomicUsize,
}

#[async_trait]
impl RecordChanger for EchoChanger {
    async fn create_txt_record(
        &self,
        _project_id: &str,
        managed_zone: &str,
        record: &ResourceRecordSet,
        _num_retries: u32,
    ) -> Result<Value, DnsApiError> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        Ok(json!({"zone": managed_zone, "name": record.name, "rrdatas": record.rrdatas}))
    }

    async fn delete_txt_record(
        &self,
        _project_id: &str,
        managed_zone: &str,
        _record: &ResourceRecordSet,
        _num_retries: u32,
    ) -> Result<Value, DnsApiError> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        Ok(json!({"zone": managed_zone, "status": "pending"}))
    }
}

fn app_with(changer: Arc<dyn RecordChanger>) -> (Router, DnsMetrics) {
    let settings = Arc::new(Settings::from_yaml_str(CONFIG).unwrap());
    let metrics = DnsMetrics::new().unwrap();
    let changers: Arc<dyn ChangerSource> = Arc::new(changer);
    let manager = Arc::new(DnsManager::new(settings.clone(), changers, metrics.clone()));

    let app = router(AppState {
        settings,
        manager,
        metrics: metrics.clone(),
    });
    (app, metrics)
}

async fn post(app: Router, uri: &str, body: Value) -> (StatusCode, Value) {
    let response = app
        .oneshot(
            Request::builder()
                .method("POST")
                .uri(uri)
                .header(header::CONTENT_TYPE, "application/json")
                .body(Body::from(body.to_string()))
                .unwrap(),
        )
        .await
        .unwrap();

    let status = response.status();
    let bytes = response.into_body().collect().await.unwrap().to_bytes();
    (status, serde_json::from_slice(&bytes).unwrap())
}

async fn get(app: Router, uri: &str) -> (StatusCode, String) {
    let response = app
        .oneshot(Request::builder().uri(uri).body(Body::empty()).unwrap())
        .await
        .unwrap();

    let status = response.status();
    let bytes = response.into_body().collect().await.unwrap().to_bytes();
    (status, String::from_utf8(bytes.to_vec()).unwrap())
}

#[tokio::test]
async fn test_invalid_api_key_is_forbidden() {
    let changer = Arc::new(EchoChanger::default());
    let (app, metrics) = app_with(changer.clone());

    let (status, body) = post(
        app,
        "/v1/dns/add",
        json!({"api_key": "bad", "fqdn": "_acme-challenge.host.example.com", "value": "x"}),
    )
    .await;

    assert_eq!(status, StatusCode::FORBIDDEN);
    assert_eq!(body, json!({"status": "error", "message": "Invalid API key"}));
    assert_eq!(changer.calls.load(Ordering::SeqCst), 0);
    assert_eq!(metrics.count(Operation::Add, Outcome::Error), 0);
}

#[tokio::test]
async fn test_missing_api_key_is_forbidden() {
    let (app, _) = app_with(Arc::new(EchoChanger::default()));

    let (status, body) = post(
        app,
        "/v1/dns/remove",
        json!({"fqdn": "_acme-challenge.host.example.com", "value": "x"}),
    )
    .await;

    assert_eq!(status, StatusCode::FORBIDDEN);
    assert_eq!(body["message"], "Invalid API key");
}

#[tokio::test]
async fn test_unknown_zone_is_multi_status_error() {
    let (app, metrics) = app_with(Arc::new(EchoChanger::default()));

    let (status, body) = post(
        app,
        "/v1/dns/add",
        json!({"api_key": "good", "fqdn": "_acme-challenge.host.example.org", "value": "x"}),
    )
    .await;

    assert_eq!(status, StatusCode::MULTI_STATUS);
    assert_eq!(
        body,
        json!([{
            "fqdn": "_acme-challenge.host.example.org",
            "status": "error",
            "message": "No managed zone found for FQDN: _acme-challenge.host.example.org"
        }])
    );
    assert_eq!(metrics.count(Operation::Add, Outcome::Error), 1);
}

#[tokio::test]
async fn test_missing_fields_are_multi_status_error() {
    let (app, _) = app_with(Arc::new(EchoChanger::default()));

    let (status, body) = post(app, "/v1/dns/add", json!({"api_key": "good"})).await;

    assert_eq!(status, StatusCode::MULTI_STATUS);
    assert_eq!(
        body,
        json!([{
            "fqdn": "",
            "status": "error",
            "message": "Missing required fields 'fqdn' or 'value'"
        }])
    );
}

#[tokio::test]
async fn test_add_success_echoes_provider_response() {
    let changer = Arc::new(EchoChanger::default());
    let (app, metrics) = app_with(changer.clone());

    let (status, body) = post(
        app,
        "/v1/dns/add",
        json!({"api_key": "good", "fqdn": "_acme-challenge.host.example.com", "value": "token123"}),
    )
    .await;

    assert_eq!(status, StatusCode::MULTI_STATUS);
    assert_eq!(
        body,
        json!([{
            "fqdn": "_acme-challenge.host.example.com",
            "status": "success",
            "message": "TXT record added successfully",
            "response": {
                "zone": "z1",
                "name": "_acme-challenge.host.example.com.",
                "rrdatas": ["\"token123\""]
            }
        }])
    );
    assert_eq!(changer.calls.load(Ordering::SeqCst), 1);
    assert_eq!(metrics.count(Operation::Add, Outcome::Success), 1);
}

#[tokio::test]
async fn test_remove_success() {
    let (app, metrics) = app_with(Arc::new(EchoChanger::default()));

    let (status, body) = post(
        app,
        "/v1/dns/remove",
        json!({"api_key": "good", "fqdn": "_acme-challenge.example.com", "value": "token123"}),
    )
    .await;

    assert_eq!(status, StatusCode::MULTI_STATUS);
    assert_eq!(body[0]["status"], "success");
    assert_eq!(body[0]["message"], "TXT record removed successfully");
    assert_eq!(body[0]["response"]["status"], "pending");
    assert_eq!(metrics.count(Operation::Remove, Outcome::Success), 1);
}

#[tokio::test]
async fn test_malformed_body_is_rejected() {
    let (app, _) = app_with(Arc::new(EchoChanger::default()));

    let response = app
        .oneshot(
            Request::builder()
                .method("POST")
                .uri("/v1/dns/add")
                .header(header::CONTENT_TYPE, "application/json")
                .body(Body::from("not json"))
                .unwrap(),
        )
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
}

#[tokio::test]
async fn test_probes() {
    let (app, _) = app_with(Arc::new(EchoChanger::default()));

    let (status, body) = get(app.clone(), "/v1/health").await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(serde_json::from_str::<Value>(&body).unwrap(), json!({"status": "ok"}));

    let (status, body) = get(app, "/v1/live").await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(serde_json::from_str::<Value>(&body).unwrap(), json!({"status": "alive"}));
}

#[tokio::test]
async fn test_metrics_endpoint_reports_counts() {
    let (app, _) = app_with(Arc::new(EchoChanger::default()));

    post(
        app.clone(),
        "/v1/dns/add",
        json!({"api_key": "good", "fqdn": "_acme-challenge.example.com", "value": "v"}),
    )
    .await;
    post(
        app.clone(),
        "/v1/dns/remove",
        json!({"api_key": "good", "fqdn": "bad", "value": "v"}),
    )
    .await;

    let (status, body) = get(app, "/metrics").await;
    assert_eq!(status, StatusCode::OK);
    assert!(body.contains(r#"gprox_dns_requests_total{operation="add",result="success"} 1"#));
    assert!(body.contains(r#"gprox_dns_requests_total{operation="remove",result="error"} 1"#));
}

#[tokio::test]
async fn test_full_stack_against_mocked_cloud_dns() {
    let server = MockServer::start().await;

    Mock::given(method("POST"))
        .and(path("/dns/v1/projects/my-project/managedZones/z1/rrsets"))
        .respond_with(ResponseTemplate::new(503))
        .up_to_n_times(1)
        .mount(&server)
        .await;

    Mock::given(method("POST"))
        .and(path("/dns/v1/projects/my-project/managedZones/z1/rrsets"))
        .respond_with(
            ResponseTemplate::new(200).set_body_json(json!({"kind": "dns#resourceRecordSet"})),
        )
        .expect(1)
        .mount(&server)
        .await;

    Mock::given(method("POST"))
        .and(path("/dns/v1/projects/my-project/managedZones/z1/changes"))
        .respond_with(ResponseTemplate::new(403).set_body_json(json!({
            "error": {"code": 403, "message": "Forbidden", "errors": [{"reason": "forbidden"}]}
        })))
        .expect(1)
        .mount(&server)
        .await;

    let client = CloudDnsClient::new(Arc::new(StaticTokenSource::new("t")), Duration::from_secs(5))
        .unwrap()
        .with_base_url(server.uri())
        .with_backoff(Backoff {
            base: Duration::from_millis(1),
            max: Duration::from_millis(1),
        });
    let (app, metrics) = app_with(Arc::new(client));

    let (status, body) = post(
        app.clone(),
        "/v1/dns/add",
        json!({"api_key": "good", "fqdn": "_acme-challenge.www.example.com", "value": "abc"}),
    )
    .await;
    assert_eq!(status, StatusCode::MULTI_STATUS);
    assert_eq!(body[0]["status"], "success");
    assert_eq!(body[0]["response"], json!({"kind": "dns#resourceRecordSet"}));

    let (status, body) = post(
        app,
        "/v1/dns/remove",
        json!({"api_key": "good", "fqdn": "_acme-challenge.www.example.com", "value": "abc"}),
    )
    .await;
    assert_eq!(status, StatusCode::MULTI_STATUS);
    assert_eq!(
        body,
        json!([{
            "fqdn": "_acme-challenge.www.example.com",
            "status": "error",
            "message": "Failed to remove TXT record"
        }])
    );

    assert_eq!(metrics.count(Operation::Add, Outcome::Success), 1);
    assert_eq!(metrics.count(Operation::Remove, Outcome::Error), 1);
}
