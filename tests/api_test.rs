use async_trait::async_trait;
use axum::{
    Router,
    body::Body,
    http::{Request, StatusCode, header},
};
use base64::{Engine as _, engine::general_purpose::STANDARD};
use image::{ImageFormat, Rgba, RgbaImage};
use serde_json::{Value, json};
use std::io::Cursor;
use std::sync::Arc;
use tower::ServiceExt; // for `oneshot`

use qrstudio::api::build_router;
use qrstudio::api::state::AppState;
use qrstudio::checks::{ProbeError, UrlProbe};
use qrstudio::config::{ByteSize, Config};
use qrstudio::decoder::RqrrDecoder;
use qrstudio::render::Renderer;

/// Answers every HEAD request with a fixed status
struct StubProbe(u16);

#[async_trait]
impl UrlProbe for StubProbe {
    async fn head(&self, _url: &str) -> Result<u16, ProbeError> {
        Ok(self.0)
    }
}

/// Builds a test app with isolated dependencies (no font, no network)
fn build_test_app(config: Config) -> Router {
    let renderer = Renderer::new(config.style.render_limits(), None);
    let state = AppState::new(
        config,
        renderer,
        Arc::new(RqrrDecoder),
        Arc::new(StubProbe(200)),
    );
    build_router(state)
}

fn post_json(uri: &str, body: Value) -> Request<Body> {
    Request::builder()
        .uri(uri)
        .method("POST")
        .header(header::CONTENT_TYPE, "application/json")
        .body(Body::from(serde_json::to_string(&body).unwrap()))
        .unwrap()
}

fn post_csv(uri: &str, csv: &str) -> Request<Body> {
    Request::builder()
        .uri(uri)
        .method("POST")
        .header(header::CONTENT_TYPE, "text/csv")
        .body(Body::from(csv.to_string()))
        .unwrap()
}

fn get(uri: &str) -> Request<Body> {
    Request::builder().uri(uri).body(Body::empty()).unwrap()
}

async fn send(app: &Router, request: Request<Body>) -> (StatusCode, Value) {
    let response = app.clone().oneshot(request).await.unwrap();
    let status = response.status();
    let body = axum::body::to_bytes(response.into_body(), usize::MAX)
        .await
        .unwrap();
    let value = serde_json::from_slice(&body).unwrap_or(Value::Null);
    (status, value)
}

fn wifi_request() -> Value {
    json!({
        "kind": "wifi",
        "fields": {"ssid": "Home", "password": "pass1234", "security": "WPA2"}
    })
}

fn png_base64(image: &RgbaImage) -> String {
    let mut bytes = Vec::new();
    image
        .write_to(&mut Cursor::new(&mut bytes), ImageFormat::Png)
        .unwrap();
    STANDARD.encode(bytes)
}

#[tokio::test]
async fn test_health_and_index() {
    let app = build_test_app(Config::default());

    let (status, body) = send(&app, get("/health")).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["status"], "healthy");
    assert_eq!(body["components"]["caption_font"], "missing");

    let response = app.clone().oneshot(get("/")).await.unwrap();
    assert_eq!(response.status(), StatusCode::OK);
    let html = axum::body::to_bytes(response.into_body(), usize::MAX)
        .await
        .unwrap();
    assert!(String::from_utf8_lossy(&html).contains("<title>qrstudio</title>"));
}

#[tokio::test]
async fn test_kinds_lists_every_schema() {
    let app = build_test_app(Config::default());

    let (status, body) = send(&app, get("/api/kinds")).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["kinds"].as_array().unwrap().len(), 11);
    assert_eq!(body["kinds"][1]["kind"], "wifi");
    assert_eq!(body["kinds"][1]["fields"][0]["name"], "ssid");
    assert_eq!(body["min_size"], 300);
    assert_eq!(body["max_size"], 2400);
}

#[tokio::test]
async fn test_generate_wifi() {
    let app = build_test_app(Config::default());

    let (status, body) = send(&app, post_json("/api/generate", wifi_request())).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["payload"], "WIFI:T:WPA2;S:Home;P:pass1234;;");
    assert_eq!(body["error_correction"], "M");
    assert_eq!(body["error_correction_upgraded"], false);
    assert_eq!(body["size"], 600);
    assert!(
        body["image"]
            .as_str()
            .unwrap()
            .starts_with("data:image/png;base64,")
    );

    let (_, history) = send(&app, get("/api/history")).await;
    assert_eq!(history["entries"].as_array().unwrap().len(), 1);
    assert_eq!(history["entries"][0]["kind"], "wifi");
}

#[tokio::test]
async fn test_generate_rejects_missing_field_without_recording() {
    let app = build_test_app(Config::default());

    let (status, body) = send(
        &app,
        post_json("/api/generate", json!({"kind": "email", "fields": {"subject": "hi"}})),
    )
    .await;
    assert_eq!(status, StatusCode::UNPROCESSABLE_ENTITY);
    assert_eq!(body["code"], "INVALID_FIELDS");

    let (_, history) = send(&app, get("/api/history")).await;
    assert!(history["entries"].as_array().unwrap().is_empty());

    let (_, analytics) = send(&app, get("/api/analytics")).await;
    assert_eq!(analytics["counters"]["generation_failed"], 1);
}

#[tokio::test]
async fn test_generate_invalid_style() {
    let app = build_test_app(Config::default());

    let mut request = wifi_request();
    request["style"] = json!({"size": 100});
    let (status, body) = send(&app, post_json("/api/generate", request)).await;
    assert_eq!(status, StatusCode::UNPROCESSABLE_ENTITY);
    assert_eq!(body["code"], "INVALID_STYLE");

    let mut request = wifi_request();
    request["style"] = json!({"fg": "#eeeeee", "bg": "#ffffff"});
    let (status, _) = send(&app, post_json("/api/generate", request)).await;
    assert_eq!(status, StatusCode::UNPROCESSABLE_ENTITY);
}

#[tokio::test]
async fn test_generate_content_type_checks() {
    let app = build_test_app(Config::default());

    let request = Request::builder()
        .uri("/api/generate")
        .method("POST")
        .header(header::CONTENT_TYPE, "text/plain")
        .body(Body::from(wifi_request().to_string()))
        .unwrap();
    let (status, body) = send(&app, request).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["code"], "INVALID_PAYLOAD");

    let request = Request::builder()
        .uri("/api/generate")
        .method("POST")
        .body(Body::from(wifi_request().to_string()))
        .unwrap();
    let (status, _) = send(&app, request).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
}

#[tokio::test]
async fn test_logo_forces_high_error_correction() {
    let app = build_test_app(Config::default());

    let logo = RgbaImage::from_pixel(32, 32, Rgba([220, 40, 40, 255]));
    let request = json!({
        "kind": "url",
        "fields": {"url": "https://example.com"},
        "style": {
            "error_correction": "L",
            "logo": {"image": format!("data:image/png;base64,{}", png_base64(&logo))}
        }
    });

    let (status, body) = send(&app, post_json("/api/generate", request)).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["error_correction"], "H");
    assert_eq!(body["error_correction_upgraded"], true);
}

#[tokio::test]
async fn test_unreadable_logo_is_rejected() {
    let app = build_test_app(Config::default());

    let request = json!({
        "kind": "url",
        "fields": {"url": "https://example.com"},
        "style": {"logo": {"image": STANDARD.encode(b"not an image at all")}}
    });

    let (status, body) = send(&app, post_json("/api/generate", request)).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["code"], "INVALID_PAYLOAD");
    assert!(body["message"].as_str().unwrap().contains("style.logo.image"));

    let (_, history) = send(&app, get("/api/history")).await;
    assert!(history["entries"].as_array().unwrap().is_empty());
}

#[tokio::test]
async fn test_batch_short_row_is_a_failure() {
    let app = build_test_app(Config::default());

    let csv = "name,phone,email,org\n\
               John Doe,+1234567890,john@example.com,Acme\n\
               Jane\n";
    let (status, body) = send(&app, post_csv("/api/batch?mode=vcards", csv)).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["succeeded"], 1);
    assert_eq!(body["failed"], 1);
    assert_eq!(body["report"][1]["status"], "failure");
}

#[tokio::test]
async fn test_generate_png_download() {
    let app = build_test_app(Config::default());

    let response = app
        .clone()
        .oneshot(post_json(
            "/api/generate/png",
            json!({"kind": "phone", "fields": {"phone": "+1 555 0100"}}),
        ))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::OK);
    assert_eq!(response.headers()[header::CONTENT_TYPE], "image/png");
    assert_eq!(
        response.headers()[header::CONTENT_DISPOSITION],
        "attachment; filename=\"qr_phone.png\""
    );

    let png = axum::body::to_bytes(response.into_body(), usize::MAX)
        .await
        .unwrap();
    assert!(png.starts_with(&[0x89, b'P', b'N', b'G']));
}

#[tokio::test]
async fn test_batch_reports_each_row() {
    let app = build_test_app(Config::default());

    let csv = "url\nhttps://example.com\nhttps://example.org\nnot a url\nhttps://example.net\n";
    let (status, body) = send(&app, post_csv("/api/batch?mode=urls", csv)).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["mode"], "urls");
    assert_eq!(body["total"], 4);
    assert_eq!(body["succeeded"], 3);
    assert_eq!(body["failed"], 1);
    assert_eq!(body["report"][2]["status"], "failure");
    assert_eq!(body["report"][3]["row_index"], 4);
    assert_eq!(body["items"].as_array().unwrap().len(), 3);
    assert!(body["gallery"].as_str().unwrap().starts_with("data:image/png"));

    let (_, history) = send(&app, get("/api/history")).await;
    assert_eq!(history["entries"].as_array().unwrap().len(), 3);

    let (_, analytics) = send(&app, get("/api/analytics")).await;
    assert_eq!(analytics["counters"]["batch_rows_ok"], 3);
    assert_eq!(analytics["counters"]["batch_rows_failed"], 1);
}

#[tokio::test]
async fn test_batch_rejects_structural_problems() {
    let app = build_test_app(Config::default());

    let (status, body) = send(
        &app,
        post_csv("/api/batch?mode=wifi", "network,pass\nHome,secret123\n"),
    )
    .await;
    assert_eq!(status, StatusCode::UNPROCESSABLE_ENTITY);
    assert_eq!(body["code"], "BATCH_REJECTED");
    assert!(body["message"].as_str().unwrap().contains("ssid"));

    let (status, _) = send(&app, post_csv("/api/batch?mode=urls", "url\n")).await;
    assert_eq!(status, StatusCode::UNPROCESSABLE_ENTITY);

    let (status, _) = send(&app, post_csv("/api/batch?mode=faxes", "url\nx\n")).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
}

#[tokio::test]
async fn test_batch_upload_limit() {
    let mut config = Config::default();
    config.server.max_upload_bytes = ByteSize(64);
    let app = build_test_app(config);

    let csv = format!("url\n{}\n", "https://example.com/".repeat(10));
    let (status, body) = send(&app, post_csv("/api/batch", &csv)).await;
    assert_eq!(status, StatusCode::PAYLOAD_TOO_LARGE);
    assert_eq!(body["code"], "PAYLOAD_TOO_LARGE");
}

#[tokio::test]
async fn test_batch_templates() {
    let app = build_test_app(Config::default());

    let response = app
        .clone()
        .oneshot(get("/api/batch/templates/wifi"))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::OK);
    assert_eq!(
        response.headers()[header::CONTENT_DISPOSITION],
        "attachment; filename=\"wifi_template.csv\""
    );
    let csv = axum::body::to_bytes(response.into_body(), usize::MAX)
        .await
        .unwrap();
    let csv = String::from_utf8_lossy(&csv);
    assert_eq!(csv.lines().next(), Some("ssid,password,security"));
    assert_eq!(csv.lines().count(), 4);

    let (status, body) = send(&app, get("/api/batch/templates/faxes")).await;
    assert_eq!(status, StatusCode::NOT_FOUND);
    assert_eq!(body["code"], "NOT_FOUND");
}

#[tokio::test]
async fn test_decode_generated_code() {
    let app = build_test_app(Config::default());

    let (_, generated) = send(&app, post_json("/api/generate", wifi_request())).await;
    let image = generated["image"].as_str().unwrap().to_string();

    let (status, body) = send(&app, post_json("/api/decode", json!({"image": image}))).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["count"], 1);
    assert_eq!(body["symbols"][0]["text"], "WIFI:T:WPA2;S:Home;P:pass1234;;");
    assert_eq!(body["symbols"][0]["kind"], "wifi");
    assert_eq!(body["symbols"][0]["fields"]["ssid"], "Home");
}

#[tokio::test]
async fn test_decode_without_symbol() {
    let app = build_test_app(Config::default());

    let blank = RgbaImage::from_pixel(200, 200, Rgba([255, 255, 255, 255]));
    let (status, body) = send(
        &app,
        post_json("/api/decode", json!({"image": png_base64(&blank)})),
    )
    .await;
    assert_eq!(status, StatusCode::UNPROCESSABLE_ENTITY);
    assert_eq!(body["code"], "NO_QR_FOUND");

    let (status, _) = send(&app, post_json("/api/decode", json!({"image": "%%%"}))).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
}

#[tokio::test]
async fn test_validation_endpoints() {
    let app = build_test_app(Config::default());

    let (status, body) = send(
        &app,
        post_json("/api/validate/url", json!({"url": "https://example.com"})),
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["valid"], true);
    assert_eq!(body["reachability"], "reachable");
    assert_eq!(body["status"], 200);

    let (_, body) = send(
        &app,
        post_json("/api/validate/url", json!({"url": "ftp://example.com"})),
    )
    .await;
    assert_eq!(body["valid"], false);

    let (_, body) = send(
        &app,
        post_json("/api/validate/password", json!({"password": "short"})),
    )
    .await;
    assert_eq!(body["strength"], "weak");

    let (_, body) = send(
        &app,
        post_json("/api/validate/password", json!({"password": "Correct-Horse-42"})),
    )
    .await;
    assert_eq!(body["strength"], "strong");
}

#[tokio::test]
async fn test_history_is_bounded_and_clearable() {
    let mut config = Config::default();
    config.history.capacity = 2;
    let app = build_test_app(config);

    for text in ["first", "second", "third"] {
        let (status, _) = send(
            &app,
            post_json("/api/generate", json!({"kind": "text", "fields": {"text": text}})),
        )
        .await;
        assert_eq!(status, StatusCode::OK);
    }

    let (_, history) = send(&app, get("/api/history")).await;
    assert_eq!(history["capacity"], 2);
    let entries = history["entries"].as_array().unwrap();
    assert_eq!(entries.len(), 2);
    assert_eq!(entries[0]["summary"], "third");
    assert_eq!(entries[1]["summary"], "second");

    let (_, analytics) = send(&app, get("/api/analytics")).await;
    assert_eq!(analytics["total"], 2);
    assert_eq!(analytics["by_kind"][0]["kind"], "text");
    assert_eq!(analytics["counters"]["generated"], 3);

    let request = Request::builder()
        .uri("/api/history")
        .method("DELETE")
        .body(Body::empty())
        .unwrap();
    let (status, body) = send(&app, request).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["removed"], 2);

    let (_, history) = send(&app, get("/api/history")).await;
    assert!(history["entries"].as_array().unwrap().is_empty());
}
