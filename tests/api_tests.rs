use tender_report::config::AppConfig;
use tender_report::message::{GenerateReportResponse, HistoryResponse};
use tender_report::routes::create_router;
use tender_report::services::report_history::ReportHistory;
use tender_report::state::AppState;

use axum::Router;
use axum::body::Body;
use axum::http::{Request, StatusCode};
use serde_json::{Value, json};
use std::path::Path;
use std::sync::Arc;
use tower::util::ServiceExt;

fn test_config(dir: &Path) -> AppConfig {
    AppConfig {
        public_dir: dir.to_path_buf(),
        reports_dir: dir.join("reports"),
        history_dir: dir.join("data"),
        ..AppConfig::default()
    }
}

fn app_with(config: AppConfig) -> Router {
    let state = Arc::new(AppState::new(config.clone(), ReportHistory::in_memory()).unwrap());
    create_router(&config).with_state(state)
}

fn test_app(dir: &Path) -> Router {
    app_with(test_config(dir))
}

async fn body_json(response: axum::response::Response) -> Value {
    let bytes = axum::body::to_bytes(response.into_body(), usize::MAX).await.unwrap();
    serde_json::from_slice(&bytes).unwrap()
}

fn post_json(uri: &str, body: Value) -> Request<Body> {
    Request::builder()
        .method("POST")
        .uri(uri)
        .header("content-type", "application/json")
        .body(Body::from(body.to_string()))
        .unwrap()
}

#[tokio::test]
async fn test_health_endpoint() {
    let dir = tempfile::tempdir().unwrap();
    let response = test_app(dir.path())
        .oneshot(Request::builder().uri("/health").body(Body::empty()).unwrap())
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::OK);
    let bytes = axum::body::to_bytes(response.into_body(), usize::MAX).await.unwrap();
    assert_eq!(&bytes[..], b"OK");
}

#[tokio::test]
async fn test_generate_report_and_history() {
    let dir = tempfile::tempdir().unwrap();
    let app = test_app(dir.path());

    let payload = json!({
        "reportData": {
            "meta": {
                "report_generated_at": "2024-05-01T10:00:00Z",
                "params_used": { "sellerName": "Acme Supplies", "department": "Defence", "days": 30 }
            },
            "data": {
                "priceBand": { "highest": 1200, "lowest": 800, "average": 1000 },
                "sellerBids": { "table1": { "win": 7, "lost": 3 } }
            }
        },
        "filterOptions": { "includeSections": ["marketOverview", "bidsSummary"] },
        "userEmail": "buyer@example.com"
    });

    let response = app.clone().oneshot(post_json("/api/reports", payload)).await.unwrap();
    assert_eq!(response.status(), StatusCode::OK);

    let bytes = axum::body::to_bytes(response.into_body(), usize::MAX).await.unwrap();
    let generated: GenerateReportResponse = serde_json::from_slice(&bytes).unwrap();
    assert_eq!(generated.pages, 3);
    assert_eq!(generated.url, format!("/reports/{}.pdf", generated.id));

    let pdf = std::fs::read(dir.path().join("reports").join(format!("{}.pdf", generated.id))).unwrap();
    assert!(pdf.starts_with(b"%PDF"));

    let response = app
        .oneshot(
            Request::builder()
                .uri("/api/reports/history/buyer@example.com")
                .body(Body::empty())
                .unwrap(),
        )
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::OK);

    let bytes = axum::body::to_bytes(response.into_body(), usize::MAX).await.unwrap();
    let history: HistoryResponse = serde_json::from_slice(&bytes).unwrap();
    assert_eq!(history.count, 1);
    assert_eq!(history.reports[0].id, generated.id);
    assert_eq!(history.reports[0].seller_name, "Acme Supplies");
    assert_eq!(history.reports[0].file_name.as_deref(), Some(format!("{}.pdf", generated.id).as_str()));
}

#[tokio::test]
async fn test_empty_payload_renders_cover_only() {
    let dir = tempfile::tempdir().unwrap();
    let response = test_app(dir.path()).oneshot(post_json("/api/reports", json!({}))).await.unwrap();

    assert_eq!(response.status(), StatusCode::OK);
    let body = body_json(response).await;
    assert_eq!(body["pages"], 1);
}

#[tokio::test]
async fn test_history_without_reports_is_empty() {
    let dir = tempfile::tempdir().unwrap();
    let response = test_app(dir.path())
        .oneshot(Request::builder().uri("/api/reports/history/nobody").body(Body::empty()).unwrap())
        .await
        .unwrap();

    let body = body_json(response).await;
    assert_eq!(body["count"], 0);
    assert_eq!(body["reports"], json!([]));
}

#[tokio::test]
async fn test_proxy_rejects_invalid_json() {
    let dir = tempfile::tempdir().unwrap();
    let request = Request::builder()
        .method("POST")
        .uri("/proxy-pdf")
        .header("content-type", "application/json")
        .body(Body::from("{not json"))
        .unwrap();
    let response = test_app(dir.path()).oneshot(request).await.unwrap();

    assert_eq!(response.status(), StatusCode::INTERNAL_SERVER_ERROR);
    let body = body_json(response).await;
    assert_eq!(body["error"], "Proxy request failed");
}

#[tokio::test]
async fn test_cors_preflight() {
    let dir = tempfile::tempdir().unwrap();
    let request = Request::builder()
        .method("OPTIONS")
        .uri("/proxy-pdf")
        .header("origin", "https://app.example.com")
        .header("access-control-request-method", "POST")
        .header("access-control-request-headers", "apikey, content-type")
        .body(Body::empty())
        .unwrap();
    let response = test_app(dir.path()).oneshot(request).await.unwrap();

    assert_eq!(response.status(), StatusCode::OK);
    assert_eq!(response.headers()["access-control-allow-origin"], "*");
    let allowed = response.headers()["access-control-allow-headers"].to_str().unwrap().to_string();
    assert!(allowed.contains("apikey"));
    assert!(allowed.contains("x-client-info"));
}

#[tokio::test]
async fn test_static_reports_are_served() {
    let dir = tempfile::tempdir().unwrap();
    std::fs::create_dir_all(dir.path().join("reports")).unwrap();
    std::fs::write(dir.path().join("reports").join("sample.pdf"), b"%PDF-1.3").unwrap();

    let response = test_app(dir.path())
        .oneshot(Request::builder().uri("/reports/sample.pdf").body(Body::empty()).unwrap())
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::OK);
}

#[tokio::test]
async fn test_loose_request_shapes_render_cover_only() {
    let dir = tempfile::tempdir().unwrap();
    let app = test_app(dir.path());
    let payloads = [
        json!({ "reportData": {}, "filterOptions": null }),
        json!({ "reportData": {}, "filterOptions": { "includeSections": null } }),
        json!({ "reportData": {}, "filterOptions": { "includeSections": [7, false] } }),
        json!({ "includeSections": ["bidsSummary", 7] }),
        json!({ "reportData": null, "userEmail": 42 }),
    ];

    for payload in payloads {
        let response = app.clone().oneshot(post_json("/api/reports", payload.clone())).await.unwrap();
        assert_eq!(response.status(), StatusCode::OK, "payload {payload}");
        assert_eq!(body_json(response).await["pages"], 1, "payload {payload}");
    }
}

#[tokio::test]
async fn test_non_string_section_keys_are_skipped() {
    let dir = tempfile::tempdir().unwrap();
    let payload = json!({
        "reportData": { "data": { "sellerBids": { "table1": { "win": 1, "lost": 1 } } } },
        "filterOptions": { "includeSections": ["bidsSummary", 7] }
    });
    let response = test_app(dir.path()).oneshot(post_json("/api/reports", payload)).await.unwrap();

    assert_eq!(response.status(), StatusCode::OK);
    assert_eq!(body_json(response).await["pages"], 2);
}

#[tokio::test]
async fn test_numeric_user_email_is_recorded_as_text() {
    let dir = tempfile::tempdir().unwrap();
    let app = test_app(dir.path());
    let response = app.clone().oneshot(post_json("/api/reports", json!({ "userEmail": 42 }))).await.unwrap();
    assert_eq!(response.status(), StatusCode::OK);

    let response = app
        .oneshot(Request::builder().uri("/api/reports/history/42").body(Body::empty()).unwrap())
        .await
        .unwrap();
    assert_eq!(body_json(response).await["count"], 1);
}

#[tokio::test]
async fn test_meta_email_is_history_fallback() {
    let dir = tempfile::tempdir().unwrap();
    let app = test_app(dir.path());
    let payload = json!({
        "reportData": { "meta": { "params_used": { "sellerName": "Acme", "email": "meta@example.com" } } }
    });
    let response = app.clone().oneshot(post_json("/api/reports", payload)).await.unwrap();
    assert_eq!(response.status(), StatusCode::OK);

    let response = app
        .oneshot(Request::builder().uri("/api/reports/history/meta@example.com").body(Body::empty()).unwrap())
        .await
        .unwrap();
    let history: HistoryResponse = serde_json::from_slice(
        &axum::body::to_bytes(response.into_body(), usize::MAX).await.unwrap(),
    )
    .unwrap();
    assert_eq!(history.count, 1);
    assert_eq!(history.reports[0].seller_name, "Acme");
}

#[tokio::test]
async fn test_report_url_resolves_outside_public_dir() {
    let public = tempfile::tempdir().unwrap();
    let reports = tempfile::tempdir().unwrap();
    let app = app_with(AppConfig { reports_dir: reports.path().to_path_buf(), ..test_config(public.path()) });

    let response = app.clone().oneshot(post_json("/api/reports", json!({}))).await.unwrap();
    let generated: GenerateReportResponse = serde_json::from_slice(
        &axum::body::to_bytes(response.into_body(), usize::MAX).await.unwrap(),
    )
    .unwrap();
    assert!(reports.path().join(format!("{}.pdf", generated.id)).exists());

    let response = app
        .oneshot(Request::builder().uri(generated.url.as_str()).body(Body::empty()).unwrap())
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::OK);
    let bytes = axum::body::to_bytes(response.into_body(), usize::MAX).await.unwrap();
    assert!(bytes.starts_with(b"%PDF"));
}

#[tokio::test]
async fn test_proxy_unreachable_backend_keeps_cors() {
    let dir = tempfile::tempdir().unwrap();
    let closed = {
        let listener = std::net::TcpListener::bind("127.0.0.1:0").unwrap();
        listener.local_addr().unwrap()
    };
    let app = app_with(AppConfig {
        relay_target: format!("http://{closed}/api/pdf"),
        ..test_config(dir.path())
    });

    let request = Request::builder()
        .method("POST")
        .uri("/proxy-pdf")
        .header("origin", "https://app.example.com")
        .header("content-type", "application/json")
        .body(Body::from(json!({ "sellerName": "Acme" }).to_string()))
        .unwrap();
    let response = app.oneshot(request).await.unwrap();

    assert_eq!(response.status(), StatusCode::SERVICE_UNAVAILABLE);
    assert_eq!(response.headers()["access-control-allow-origin"], "*");
    let body = body_json(response).await;
    assert_eq!(body["error"], "Backend Connection Failed");
    assert!(body["message"].as_str().unwrap().starts_with("Network error:"));
    assert!(body["details"].is_string());
}
