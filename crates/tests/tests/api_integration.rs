use std::path::{Path, PathBuf};
use std::sync::Arc;

use axum::body::{to_bytes, Body};
use axum::extract::State;
use axum::http::{header, HeaderMap, Request, StatusCode};
use axum::routing::post;
use axum::{Json, Router};
use ecochat_agent::{ProviderConfig, NOT_LOADED_MESSAGE};
use ecochat_api::{build_app, ServerConfig};
use ecochat_core::humanize::FALLBACKS;
use ecochat_core::ModelMode;
use ecochat_ml::trainer::train_and_persist;
use serde_json::{json, Value};
use tempfile::TempDir;
use tokio::net::TcpListener;
use tokio::sync::Mutex;
use tower::ServiceExt;

fn intents_source() -> PathBuf {
    PathBuf::from(env!("CARGO_MANIFEST_DIR")).join("../../data/intents.json")
}

fn config_for(dir: &Path, mode: ModelMode, seed: Option<u64>) -> ServerConfig {
    ServerConfig {
        bind: "127.0.0.1:0".to_string(),
        mode,
        model_path: dir.join("model.json"),
        intents_path: dir.join("intents_data.json"),
        provider: ProviderConfig::default(),
        seed,
        allowed_origins: Vec::new(),
    }
}

fn trained_app(seed: Option<u64>) -> (TempDir, Router) {
    let dir = tempfile::tempdir().expect("tempdir");
    train_and_persist(
        intents_source(),
        dir.path().join("model.json"),
        dir.path().join("intents_data.json"),
    )
    .expect("training should succeed");
    let app = build_app(&config_for(dir.path(), ModelMode::Local, seed)).expect("app should build");
    (dir, app)
}

fn untrained_app(mode: ModelMode) -> (TempDir, Router) {
    let dir = tempfile::tempdir().expect("tempdir");
    let app = build_app(&config_for(dir.path(), mode, None)).expect("app should build");
    (dir, app)
}

fn chat_request(body: Value) -> Request<Body> {
    Request::builder()
        .method("POST")
        .uri("/chat")
        .header("content-type", "application/json")
        .body(Body::from(body.to_string()))
        .unwrap()
}

async fn send(app: Router, request: Request<Body>) -> (StatusCode, Value) {
    let response = app.oneshot(request).await.unwrap();
    let status = response.status();
    let body = to_bytes(response.into_body(), usize::MAX).await.unwrap();
    (status, serde_json::from_slice(&body).unwrap())
}

#[tokio::test]
async fn health_reports_loaded_model() {
    let (_dir, app) = trained_app(None);
    let request = Request::builder().uri("/health").body(Body::empty()).unwrap();

    let (status, body) = send(app, request).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["status"], "healthy");
    assert_eq!(body["model_loaded"], true);
    assert_eq!(body["mode"], "local");
}

#[tokio::test]
async fn health_reports_missing_model() {
    let (_dir, app) = untrained_app(ModelMode::Local);
    let request = Request::builder().uri("/health").body(Body::empty()).unwrap();

    let (status, body) = send(app, request).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["model_loaded"], false);
}

#[tokio::test]
async fn chat_classifies_known_topic() {
    let (_dir, app) = trained_app(Some(1));

    let (status, body) = send(
        app,
        chat_request(json!({ "message": "How do I recycle plastic bottles?" })),
    )
    .await;

    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["success"], true);
    assert_eq!(body["tag"], "recycling");
    assert!(!body["response"].as_str().unwrap().is_empty());
    assert!(body["confidence"].as_f64().unwrap() >= 0.30);

    let timestamp = body["timestamp"].as_str().unwrap();
    assert_eq!(timestamp.len(), 5);
    assert_eq!(&timestamp[2..3], ":");
}

#[tokio::test]
async fn gibberish_gets_a_fallback() {
    let (_dir, app) = trained_app(None);

    let (status, body) = send(app, chat_request(json!({ "message": "zzzz qqqq" }))).await;

    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["tag"], "fallback");
    assert!(body["confidence"].as_f64().unwrap() < 0.30);
    assert!(FALLBACKS.contains(&body["response"].as_str().unwrap()));
}

#[tokio::test]
async fn empty_and_blank_messages_are_rejected() {
    let (_dir, app) = trained_app(None);

    for payload in [json!({ "message": "" }), json!({ "message": "   \n" }), json!({})] {
        let (status, body) = send(app.clone(), chat_request(payload)).await;
        assert_eq!(status, StatusCode::BAD_REQUEST);
        assert_eq!(body["success"], false);
        assert_eq!(body["error"], "Message cannot be empty");
    }
}

#[tokio::test]
async fn malformed_json_is_a_bad_request() {
    let (_dir, app) = trained_app(None);
    let request = Request::builder()
        .method("POST")
        .uri("/chat")
        .header("content-type", "application/json")
        .body(Body::from("{\"message\": "))
        .unwrap();

    let (status, body) = send(app, request).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["success"], false);
}

#[tokio::test]
async fn missing_content_type_is_unsupported_media() {
    let (_dir, app) = untrained_app(ModelMode::Local);
    let request = Request::builder()
        .method("POST")
        .uri("/chat")
        .body(Body::from(json!({ "message": "hello" }).to_string()))
        .unwrap();

    let (status, body) = send(app, request).await;
    assert_eq!(status, StatusCode::UNSUPPORTED_MEDIA_TYPE);
    assert_eq!(body["success"], false);
}

#[tokio::test]
async fn oversized_body_is_rejected_with_413() {
    let (_dir, app) = untrained_app(ModelMode::Local);
    let message = "recycle ".repeat(10_000);

    let (status, body) = send(app, chat_request(json!({ "message": message }))).await;
    assert_eq!(status, StatusCode::PAYLOAD_TOO_LARGE);
    assert_eq!(body["success"], false);
}

#[tokio::test]
async fn chat_without_model_answers_with_notice() {
    let (_dir, app) = untrained_app(ModelMode::Local);

    let (status, body) = send(app, chat_request(json!({ "message": "hello" }))).await;

    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["success"], true);
    assert_eq!(body["response"], NOT_LOADED_MESSAGE);
    assert_eq!(body["tag"], Value::Null);
    assert_eq!(body["confidence"], 0.0);
}

#[tokio::test]
async fn provider_mode_without_key_reports_error_tag() {
    let (_dir, app) = untrained_app(ModelMode::Provider("gpt-4o-mini".to_string()));

    let (status, body) = send(app, chat_request(json!({ "message": "what is composting?" }))).await;

    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["tag"], "error");
    assert_eq!(body["confidence"], 0.0);
    assert!(body["response"]
        .as_str()
        .unwrap()
        .contains("OPENAI_API_KEY not set"));
}

#[tokio::test]
async fn fixed_seed_gives_reproducible_replies() {
    let (_first_dir, first) = trained_app(Some(99));
    let (_second_dir, second) = trained_app(Some(99));
    let message = json!({ "message": "how can i save water at home?" });

    let (_, a) = send(first, chat_request(message.clone())).await;
    let (_, b) = send(second, chat_request(message)).await;

    assert_eq!(a["tag"], "water_conservation");
    assert_eq!(a["response"], b["response"]);
}

#[tokio::test]
async fn index_serves_chat_page() {
    let (_dir, app) = untrained_app(ModelMode::Local);
    let request = Request::builder().uri("/").body(Body::empty()).unwrap();

    let response = app.oneshot(request).await.unwrap();
    assert_eq!(response.status(), StatusCode::OK);
    let body = to_bytes(response.into_body(), usize::MAX).await.unwrap();
    assert!(String::from_utf8_lossy(&body).contains("/chat"));
}

#[derive(Debug, Clone)]
struct CapturedCall {
    authorization: Option<String>,
    body: Value,
}

#[derive(Clone)]
struct FakeCompletions {
    status: StatusCode,
    reply: Value,
    calls: Arc<Mutex<Vec<CapturedCall>>>,
}

async fn fake_completions(
    State(fake): State<FakeCompletions>,
    headers: HeaderMap,
    Json(body): Json<Value>,
) -> (StatusCode, Json<Value>) {
    fake.calls.lock().await.push(CapturedCall {
        authorization: headers
            .get(header::AUTHORIZATION)
            .and_then(|value| value.to_str().ok())
            .map(ToString::to_string),
        body,
    });
    (fake.status, Json(fake.reply.clone()))
}

async fn spawn_completions(status: StatusCode, reply: Value) -> (String, Arc<Mutex<Vec<CapturedCall>>>) {
    let calls = Arc::new(Mutex::new(Vec::new()));
    let fake = FakeCompletions {
        status,
        reply,
        calls: calls.clone(),
    };
    let app = Router::new()
        .route("/v1/chat/completions", post(fake_completions))
        .with_state(fake);

    let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    tokio::spawn(async move {
        axum::serve(listener, app).await.unwrap();
    });

    (format!("http://{addr}/v1"), calls)
}

fn provider_app(dir: &Path, base_url: String) -> Router {
    let mut config = config_for(dir, ModelMode::Provider("gpt-4o-mini".to_string()), Some(5));
    config.provider = ProviderConfig {
        api_key: Some("sk-test".to_string()),
        base_url,
    };
    build_app(&config).expect("app should build")
}

#[tokio::test]
async fn provider_mode_forwards_message_and_returns_trimmed_completion() {
    let (base_url, calls) = spawn_completions(
        StatusCode::OK,
        json!({
            "choices": [{ "message": { "role": "assistant", "content": "  Compost it.\n" } }]
        }),
    )
    .await;
    let dir = tempfile::tempdir().expect("tempdir");
    let app = provider_app(dir.path(), base_url);

    let (status, body) = send(
        app.clone(),
        chat_request(json!({ "message": "What should I do with food scraps?" })),
    )
    .await;

    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["success"], true);
    assert_eq!(body["response"], "Compost it.");
    assert_eq!(body["tag"], "provider");
    assert_eq!(body["confidence"], 1.0);

    let calls = calls.lock().await;
    assert_eq!(calls.len(), 1);
    let call = &calls[0];
    assert_eq!(call.authorization.as_deref(), Some("Bearer sk-test"));
    assert_eq!(call.body["model"], "gpt-4o-mini");
    assert_eq!(call.body["temperature"], 0.7);
    assert_eq!(call.body["max_tokens"], 300);

    let messages = call.body["messages"].as_array().unwrap();
    assert_eq!(messages.len(), 2);
    assert_eq!(messages[0]["role"], "system");
    assert!(messages[0]["content"]
        .as_str()
        .unwrap()
        .contains("environmental awareness"));
    assert_eq!(messages[1]["role"], "user");
    assert_eq!(messages[1]["content"], "What should I do with food scraps?");
    drop(calls);

    let request = Request::builder().uri("/health").body(Body::empty()).unwrap();
    let (_, health) = send(app, request).await;
    assert_eq!(health["mode"], "provider:gpt-4o-mini");
    assert_eq!(health["metrics"]["provider_calls_total"], 1);
}

#[tokio::test]
async fn provider_failure_status_becomes_error_reply() {
    let (base_url, calls) =
        spawn_completions(StatusCode::INTERNAL_SERVER_ERROR, json!({ "error": "boom" })).await;
    let dir = tempfile::tempdir().expect("tempdir");
    let app = provider_app(dir.path(), base_url);

    let (status, body) = send(app, chat_request(json!({ "message": "is glass recyclable?" }))).await;

    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["tag"], "error");
    assert_eq!(body["confidence"], 0.0);
    assert_eq!(
        body["response"],
        "Provider request failed: provider returned status 500: {\"error\":\"boom\"}"
    );
    assert_eq!(calls.lock().await.len(), 1);
}
