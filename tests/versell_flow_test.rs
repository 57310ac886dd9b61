//! End-to-end tests for the Versell routes
//!
//! Tests cover:
//! - Charge creation and amount normalization
//! - Webhook reconciliation through the transaction-id mapping
//! - Both status readers and the provider poll-through
//! - Error envelopes and method handling

use axum::{
    body::Body,
    http::{header, HeaderMap, Request, StatusCode},
    Router,
};
use serde_json::{json, Value};
use std::sync::{Arc, Mutex};
use std::time::Duration;
use tower::ServiceExt;

use async_trait::async_trait;
use versell_pix_gateway::api::{self, AppState};
use versell_pix_gateway::cache::{CacheError, CacheResult, InMemoryCache, KeyValueStore, LazyStore};
use versell_pix_gateway::payments::error::{PaymentError, PaymentResult};
use versell_pix_gateway::payments::types::{
    ChargePayload, QrCodeResponse, WalletTransactionQuery, WalletTransactionResponse,
};
use versell_pix_gateway::payments::PixGateway;

struct MockGateway {
    configured: bool,
    id_transaction: Option<String>,
    reject_with: Option<PaymentError>,
    transaction: Option<Value>,
    charges: Mutex<Vec<ChargePayload>>,
    queries: Mutex<Vec<WalletTransactionQuery>>,
}

impl MockGateway {
    fn new() -> Self {
        Self {
            configured: true,
            id_transaction: Some("T1".to_string()),
            reject_with: None,
            transaction: None,
            charges: Mutex::new(Vec::new()),
            queries: Mutex::new(Vec::new()),
        }
    }

    fn outbound_calls(&self) -> usize {
        self.charges.lock().unwrap().len() + self.queries.lock().unwrap().len()
    }
}

#[async_trait]
impl PixGateway for MockGateway {
    async fn request_qrcode(&self, payload: &ChargePayload) -> PaymentResult<QrCodeResponse> {
        self.ensure_configured()?;
        self.charges.lock().unwrap().push(payload.clone());
        if let Some(err) = &self.reject_with {
            return Err(err.clone());
        }
        Ok(QrCodeResponse {
            id_transaction: self.id_transaction.clone(),
            payment_code: Some("00020126580014br.gov.bcb.pix".to_string()),
            payment_code_base64: Some("iVBORw0KGgo=".to_string()),
            response: None,
        })
    }

    async fn wallet_transaction(
        &self,
        query: &WalletTransactionQuery,
    ) -> PaymentResult<WalletTransactionResponse> {
        self.ensure_configured()?;
        self.queries.lock().unwrap().push(query.clone());
        if let Some(err) = &self.reject_with {
            return Err(err.clone());
        }
        Ok(WalletTransactionResponse {
            transaction: self.transaction.clone(),
        })
    }

    fn ensure_configured(&self) -> PaymentResult<()> {
        if self.configured {
            Ok(())
        } else {
            Err(PaymentError::ConfigurationError {
                message: "Missing environment variable: VSPI/VSPS".to_string(),
            })
        }
    }

    fn name(&self) -> &'static str {
        "Versell"
    }
}

/// Store whose every operation fails
struct DownStore;

#[async_trait]
impl KeyValueStore for DownStore {
    async fn get_raw(&self, _key: &str) -> CacheResult<Option<String>> {
        Err(CacheError::ConnectionError("connection refused".to_string()))
    }

    async fn set_raw(&self, _key: &str, _value: String, _ttl: Option<Duration>) -> CacheResult<()> {
        Err(CacheError::ConnectionError("connection refused".to_string()))
    }

    fn backend_name(&self) -> &'static str {
        "down"
    }
}

fn create_test_app(gateway: Arc<MockGateway>) -> Router {
    create_test_app_with_store(gateway, Arc::new(InMemoryCache::new()))
}

fn create_test_app_with_store(gateway: Arc<MockGateway>, backend: Arc<dyn KeyValueStore>) -> Router {
    let store = Arc::new(LazyStore::with_backend(backend));
    api::router(AppState::new(
        gateway,
        store,
        Duration::from_secs(3600),
        None,
    ))
}

async fn send(app: &Router, request: Request<Body>) -> (StatusCode, HeaderMap, Value) {
    let response = app.clone().oneshot(request).await.unwrap();
    let status = response.status();
    let headers = response.headers().clone();
    let body = axum::body::to_bytes(response.into_body(), usize::MAX)
        .await
        .unwrap();
    let json = serde_json::from_slice(&body).unwrap_or(Value::Null);
    (status, headers, json)
}

fn post_json(uri: &str, body: Value) -> Request<Body> {
    Request::builder()
        .method("POST")
        .uri(uri)
        .header(header::CONTENT_TYPE, "application/json")
        .body(Body::from(body.to_string()))
        .unwrap()
}

fn get(uri: &str) -> Request<Body> {
    Request::builder().uri(uri).body(Body::empty()).unwrap()
}

async fn create_charge(app: &Router, request_number: &str, amount: Value) -> (StatusCode, Value) {
    let (status, _, json) = send(
        app,
        post_json(
            "/api/versell-qrcode",
            json!({"requestNumber": request_number, "amount": amount}),
        ),
    )
    .await;
    (status, json)
}

async fn cached_value(app: &Router, request_number: &str) -> Value {
    let (status, _, json) = send(
        app,
        get(&format!(
            "/api/versell-status-cache?requestNumber={}",
            request_number
        )),
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    json["value"].clone()
}

#[tokio::test]
async fn test_amounts_are_normalized_to_major_units() {
    for (amount, expected) in [
        (json!(3280), 32.8),
        (json!(32.8), 32.8),
        (json!(999), 999.0),
        (json!(1000), 10.0),
    ] {
        let gateway = Arc::new(MockGateway::new());
        let app = create_test_app(gateway.clone());

        let (status, _) = create_charge(&app, "R1", amount.clone()).await;
        assert_eq!(status, StatusCode::OK, "amount {}", amount);

        assert_eq!(cached_value(&app, "R1").await, expected, "amount {}", amount);
        let sent = gateway.charges.lock().unwrap()[0].amount;
        assert_eq!(sent.to_string(), format!("{:.2}", expected));
    }
}

#[tokio::test]
async fn test_invalid_amounts_are_rejected_before_any_outbound_call() {
    let gateway = Arc::new(MockGateway::new());
    let app = create_test_app(gateway.clone());

    for amount in [json!(0), json!(-10), json!("abc"), json!(null)] {
        let (status, json) = create_charge(&app, "R1", amount.clone()).await;
        assert_eq!(status, StatusCode::BAD_REQUEST, "amount {}", amount);
        assert_eq!(json["error"], "VALIDATION_ERROR");
        assert_eq!(json["details"]["field"], "amount");
    }

    let (status, _, json) = send(
        &app,
        post_json("/api/versell-qrcode", json!({"amount": 10})),
    )
    .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(json["details"]["field"], "requestNumber");

    assert_eq!(gateway.outbound_calls(), 0);
}

#[tokio::test]
async fn test_missing_credentials_fail_before_validation() {
    let mut gateway = MockGateway::new();
    gateway.configured = false;
    let gateway = Arc::new(gateway);
    let app = create_test_app(gateway.clone());

    let (status, json) = create_charge(&app, "", json!(-1)).await;
    assert_eq!(status, StatusCode::INTERNAL_SERVER_ERROR);
    assert_eq!(json["error"], "CONFIGURATION_ERROR");

    let (status, _, json) = send(&app, post_json("/api/versell-status", json!({}))).await;
    assert_eq!(status, StatusCode::INTERNAL_SERVER_ERROR);
    assert_eq!(json["error"], "CONFIGURATION_ERROR");

    assert_eq!(gateway.outbound_calls(), 0);
}

#[tokio::test]
async fn test_charge_response_shape_and_payload_defaults() {
    let gateway = Arc::new(MockGateway::new());
    let app = create_test_app(gateway.clone());

    let request = Request::builder()
        .method("POST")
        .uri("/api/versell-qrcode")
        .header(header::CONTENT_TYPE, "application/json")
        .header("x-forwarded-host", "landing.example.com")
        .body(Body::from(
            json!({"requestNumber": "R1", "amount": 5000}).to_string(),
        ))
        .unwrap();
    let (status, _, json) = send(&app, request).await;

    assert_eq!(status, StatusCode::OK);
    assert_eq!(
        json,
        json!({
            "idTransaction": "T1",
            "paymentCode": "00020126580014br.gov.bcb.pix",
            "paymentCodeBase64": "iVBORw0KGgo=",
            "response": "OK",
            "requestNumber": "R1"
        })
    );

    let sent = gateway.charges.lock().unwrap()[0].clone();
    assert_eq!(
        sent.callback_url.as_deref(),
        Some("https://landing.example.com/api/versell-webhook")
    );
    assert_eq!(sent.client.name, "Cliente");
    assert_eq!(sent.products[0]["description"], "Pagamento");
    assert_eq!(sent.products[0]["value"], 50.0);
}

#[tokio::test]
async fn test_provider_rejection_keeps_status_and_body() {
    let mut gateway = MockGateway::new();
    gateway.reject_with = Some(PaymentError::ProviderError {
        provider: "Versell".to_string(),
        message: "HTTP 422".to_string(),
        status: Some(422),
        details: Some(json!({"message": "document invalid"})),
    });
    let app = create_test_app(Arc::new(gateway));

    let (status, json) = create_charge(&app, "R1", json!(10)).await;
    assert_eq!(status, StatusCode::UNPROCESSABLE_ENTITY);
    assert_eq!(json["error"], "PAYMENT_PROVIDER_ERROR");
    assert_eq!(json["details"]["message"], "document invalid");

    // nothing seeded for a rejected charge
    let (_, _, json) = send(&app, get("/api/versell-transaction?r=R1")).await;
    assert_eq!(json["error"], "TRANSACTION_NOT_FOUND");
}

#[tokio::test]
async fn test_provider_timeout_is_gateway_timeout() {
    let mut gateway = MockGateway::new();
    gateway.reject_with = Some(PaymentError::TimeoutError { timeout_secs: 30 });
    let app = create_test_app(Arc::new(gateway));

    let (status, json) = create_charge(&app, "R1", json!(10)).await;
    assert_eq!(status, StatusCode::GATEWAY_TIMEOUT);
    assert_eq!(json["error"], "EXTERNAL_SERVICE_TIMEOUT");
}

#[tokio::test]
async fn test_round_trip_from_charge_to_paid() {
    let app = create_test_app(Arc::new(MockGateway::new()));

    let (status, json) = create_charge(&app, "R1", json!(5000)).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(json["idTransaction"], "T1");

    let (_, _, record) = send(&app, get("/api/versell-transaction?id=T1")).await;
    assert_eq!(record["requestNumber"], "R1");
    assert_eq!(record["value"], 50.0);
    assert_eq!(record["statusTransaction"], "WAITING_FOR_APPROVAL");

    let (status, _, ack) = send(
        &app,
        post_json(
            "/api/versell-webhook",
            json!({"idTransaction": "T1", "statusTransaction": "PAID_OUT"}),
        ),
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(ack, json!({"ok": true}));

    let (_, _, by_request) = send(&app, get("/api/versell-status-cache?requestNumber=R1")).await;
    assert_eq!(by_request["statusTransaction"], "PAID_OUT");

    let (_, _, by_id) = send(&app, get("/api/versell-transaction?id=T1")).await;
    assert_eq!(by_id["statusTransaction"], "PAID_OUT");
    assert_eq!(by_id["idTransaction"], "T1");
}

#[tokio::test]
async fn test_id_only_webhook_without_mapping_is_acknowledged() {
    let app = create_test_app(Arc::new(MockGateway::new()));

    let (status, _, ack) = send(
        &app,
        post_json(
            "/api/versell-webhook",
            json!({"idTransaction": "T9", "statusTransaction": "PAID_OUT"}),
        ),
    )
    .await;

    assert_eq!(status, StatusCode::OK);
    assert_eq!(ack["note"], "No requestNumber mapping found");

    let (status, _, _) = send(&app, get("/api/versell-transaction?id=T9")).await;
    assert_eq!(status, StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn test_redelivered_webhook_only_refreshes_timestamp() {
    let app = create_test_app(Arc::new(MockGateway::new()));
    let event = json!({
        "requestNumber": "R2",
        "idTransaction": "T2",
        "statusTransaction": "PAID_OUT",
        "value": 12.5,
        "endToEnd": "E2E2"
    });

    send(&app, post_json("/api/versell-webhook", event.clone())).await;
    let (_, _, first) = send(&app, get("/api/versell-status-cache?requestNumber=R2")).await;

    send(&app, post_json("/api/versell-webhook", event)).await;
    let (_, _, mut second) = send(&app, get("/api/versell-status-cache?requestNumber=R2")).await;

    second["updatedAt"] = first["updatedAt"].clone();
    assert_eq!(first, second);
}

#[tokio::test]
async fn test_reader_a_never_returns_not_found() {
    let app = create_test_app(Arc::new(MockGateway::new()));

    let (status, _, json) = send(&app, get("/api/versell-status-cache?requestNumber=UNSEEN")).await;

    assert_eq!(status, StatusCode::OK);
    assert_eq!(json["requestNumber"], "UNSEEN");
    assert_eq!(json["statusTransaction"], "WAITING_FOR_APPROVAL");
    assert_eq!(json["typeTransaction"], "PIX");
    assert_eq!(json["idTransaction"], Value::Null);
    assert_eq!(json["value"], Value::Null);
    assert!(json["updatedAt"].is_string());

    let (status, _, _) = send(&app, get("/api/versell-status-cache")).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
}

#[tokio::test]
async fn test_reader_b_requires_mapping_when_id_given() {
    let app = create_test_app(Arc::new(MockGateway::new()));

    // record exists, but no transaction id was ever seen
    send(
        &app,
        post_json(
            "/api/versell-webhook",
            json!({"requestNumber": "R5", "statusTransaction": "PAID_OUT"}),
        ),
    )
    .await;

    let (status, _, json) = send(&app, get("/api/versell-transaction?id=T5&r=R5")).await;
    assert_eq!(status, StatusCode::NOT_FOUND);
    assert_eq!(json["error"], "TRANSACTION_NOT_FOUND");

    let (status, _, json) = send(&app, get("/api/versell-transaction?r=R5")).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(json["statusTransaction"], "PAID_OUT");

    let (status, _, _) = send(&app, get("/api/versell-transaction")).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
}

#[tokio::test]
async fn test_poll_through_sends_only_given_identifiers() {
    let mut gateway = MockGateway::new();
    gateway.transaction = Some(json!({
        "processingStatus": "paid_out",
        "idTransaction": "T3",
        "endToEnd": "E2E3"
    }));
    let gateway = Arc::new(gateway);
    let app = create_test_app(gateway.clone());

    let (status, _, json) = send(
        &app,
        post_json(
            "/api/versell-status",
            json!({"requestNumber": "R3", "endToEnd": "  "}),
        ),
    )
    .await;

    assert_eq!(status, StatusCode::OK);
    assert_eq!(json["ok"], true);
    assert_eq!(json["status"], "PAID_OUT");
    assert_eq!(json["idTransaction"], "T3");
    assert_eq!(json["requestNumber"], "R3");
    assert_eq!(json["endToEnd"], "E2E3");
    assert_eq!(json["raw"]["processingStatus"], "paid_out");

    let query = gateway.queries.lock().unwrap()[0].clone();
    assert_eq!(
        query,
        WalletTransactionQuery {
            request_number: Some("R3".to_string()),
            id_transaction: None,
            end_to_end: None,
        }
    );

    // poll-through never writes back
    let (_, _, cached) = send(&app, get("/api/versell-status-cache?requestNumber=R3")).await;
    assert_eq!(cached["statusTransaction"], "WAITING_FOR_APPROVAL");
}

#[tokio::test]
async fn test_poll_through_without_identifiers_is_rejected() {
    let gateway = Arc::new(MockGateway::new());
    let app = create_test_app(gateway.clone());

    let (status, _, json) = send(&app, post_json("/api/versell-status", json!({}))).await;

    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(json["error"], "VALIDATION_ERROR");
    assert_eq!(gateway.outbound_calls(), 0);
}

#[tokio::test]
async fn test_wrong_method_is_405_with_allow_header() {
    let app = create_test_app(Arc::new(MockGateway::new()));

    for (method, uri, allow) in [
        ("GET", "/api/versell-qrcode", "POST"),
        ("GET", "/api/versell-webhook", "POST"),
        ("GET", "/api/versell-status", "POST"),
        ("POST", "/api/versell-status-cache", "GET"),
        ("DELETE", "/api/versell-transaction", "GET"),
    ] {
        let request = Request::builder()
            .method(method)
            .uri(uri)
            .body(Body::empty())
            .unwrap();
        let (status, headers, json) = send(&app, request).await;

        assert_eq!(status, StatusCode::METHOD_NOT_ALLOWED, "{} {}", method, uri);
        assert_eq!(headers[header::ALLOW], allow);
        assert_eq!(json, json!({"error": "Method not allowed"}));
    }
}

#[tokio::test]
async fn test_unusable_webhook_bodies_are_acknowledged() {
    let app = create_test_app(Arc::new(MockGateway::new()));

    for body in ["[]", "null", "\"PAID_OUT\"", "42", "", "statusTransaction=PAID_OUT"] {
        let request = Request::builder()
            .method("POST")
            .uri("/api/versell-webhook")
            .body(Body::from(body))
            .unwrap();
        let (status, _, json) = send(&app, request).await;

        assert_eq!(status, StatusCode::OK, "body {:?}", body);
        assert_eq!(
            json,
            json!({"ok": true, "note": "No requestNumber mapping found"}),
            "body {:?}",
            body
        );
    }
}

#[tokio::test]
async fn test_store_outage_after_charge_is_retryable_server_error() {
    let app = create_test_app_with_store(Arc::new(MockGateway::new()), Arc::new(DownStore));

    let (status, json) = create_charge(&app, "R1", json!(10)).await;
    assert_eq!(status, StatusCode::INTERNAL_SERVER_ERROR);
    assert_eq!(json["error"], "CACHE_ERROR");
    assert_eq!(json["retryable"], true);

    let (status, _, json) = send(&app, get("/api/versell-status-cache?requestNumber=R1")).await;
    assert_eq!(status, StatusCode::INTERNAL_SERVER_ERROR);
    assert_eq!(json["error"], "CACHE_ERROR");

    // the provider still hears about webhooks as delivered
    let (status, _, ack) = send(
        &app,
        post_json("/api/versell-webhook", json!({"requestNumber": "R1"})),
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(ack["note"], "store failed");
}

#[tokio::test]
async fn test_request_id_is_generated_and_propagated() {
    let app = create_test_app(Arc::new(MockGateway::new()));

    let (_, headers, _) = send(&app, get("/health/live")).await;
    assert!(headers.contains_key("x-request-id"));

    let request = Request::builder()
        .uri("/api/versell-transaction?id=T404")
        .header("x-request-id", "req-123")
        .body(Body::empty())
        .unwrap();
    let (_, headers, json) = send(&app, request).await;
    assert_eq!(headers["x-request-id"], "req-123");
    assert_eq!(json["request_id"], "req-123");
}

#[tokio::test]
async fn test_health_reports_in_process_store() {
    let app = create_test_app(Arc::new(MockGateway::new()));

    let (status, _, json) = send(&app, get("/health")).await;

    assert_eq!(status, StatusCode::OK);
    assert_eq!(json["status"], "Degraded");
    assert_eq!(json["checks"]["cache"]["status"], "Warning");
    assert_eq!(json["checks"]["versell"]["status"], "Up");
}
