mod config;

use std::any::Any;
use std::sync::Arc;

use anyhow::{Context, Result};
use axum::extract::rejection::JsonRejection;
use axum::extract::{Json, State};
use axum::http::{header, HeaderValue, Method, StatusCode};
use axum::response::{Html, IntoResponse, Response};
use axum::routing::{get, post};
use axum::Router;
use ecochat_agent::{ChatProvider, ModelState, Responder};
use ecochat_core::ModelMode;
use ecochat_observability::AppMetrics;
use serde::{Deserialize, Serialize};
use tower_http::catch_panic::CatchPanicLayer;
use tower_http::cors::{AllowOrigin, CorsLayer};
use tower_http::limit::RequestBodyLimitLayer;
use tower_http::request_id::{MakeRequestUuid, PropagateRequestIdLayer, SetRequestIdLayer};
use tower_http::trace::TraceLayer;

pub use config::ServerConfig;

const INDEX_HTML: &str = include_str!("../static/index.html");

#[derive(Clone)]
pub struct ApiState {
    pub responder: Arc<Responder>,
    pub allowed_origins: Arc<Vec<String>>,
}

impl ApiState {
    pub fn new(responder: Responder) -> Self {
        Self {
            responder: Arc::new(responder),
            allowed_origins: Arc::new(Vec::new()),
        }
    }

    pub fn with_allowed_origins(mut self, origins: Vec<String>) -> Self {
        self.allowed_origins = Arc::new(origins);
        self
    }
}

#[derive(Debug, Deserialize)]
struct ChatRequest {
    #[serde(default)]
    message: Option<String>,
}

#[derive(Debug, Serialize)]
struct ChatResponse {
    success: bool,
    response: String,
    timestamp: String,
    tag: Option<String>,
    confidence: Option<f32>,
}

#[derive(Debug, Serialize)]
struct ErrorResponse {
    success: bool,
    error: String,
}

#[derive(Debug, Serialize)]
struct HealthResponse {
    status: &'static str,
    model_loaded: bool,
    mode: String,
    metrics: ecochat_observability::MetricsSnapshot,
}

pub fn build_app(config: &ServerConfig) -> Result<Router> {
    let metrics = AppMetrics::shared();
    let model = ModelState::load(&config.model_path, &config.intents_path);

    let mut responder = Responder::new(config.mode.clone(), model, metrics);
    if let ModelMode::Provider(model_name) = &config.mode {
        let provider =
            ChatProvider::new(config.provider.clone()).context("failed to build HTTP client")?;
        if !provider.has_api_key() {
            tracing::warn!(model = %model_name, "OPENAI_API_KEY not set, provider requests will fail");
        }
        responder = responder.with_provider(provider);
    }
    if let Some(seed) = config.seed {
        responder = responder.with_seed(seed);
    }

    let state = ApiState::new(responder).with_allowed_origins(config.allowed_origins.clone());
    Ok(build_router(state))
}

pub fn build_router(state: ApiState) -> Router {
    Router::new()
        .route("/", get(index))
        .route("/health", get(health))
        .route("/chat", post(chat))
        .layer(build_cors_layer(&state.allowed_origins))
        .layer(TraceLayer::new_for_http())
        .layer(SetRequestIdLayer::x_request_id(MakeRequestUuid))
        .layer(PropagateRequestIdLayer::x_request_id())
        .layer(RequestBodyLimitLayer::new(64 * 1024))
        .layer(CatchPanicLayer::custom(handle_panic))
        .with_state(state)
}

async fn index() -> Html<&'static str> {
    Html(INDEX_HTML)
}

async fn health(State(state): State<ApiState>) -> impl IntoResponse {
    let payload = HealthResponse {
        status: "healthy",
        model_loaded: state.responder.model_loaded(),
        mode: state.responder.mode().label(),
        metrics: state.responder.metrics().snapshot(),
    };
    (StatusCode::OK, Json(payload))
}

async fn chat(
    State(state): State<ApiState>,
    payload: Result<Json<ChatRequest>, JsonRejection>,
) -> Response {
    let request = match payload {
        Ok(Json(request)) => request,
        Err(rejection) => {
            let status = rejection.status();
            let status = if status == StatusCode::PAYLOAD_TOO_LARGE
                || status == StatusCode::UNSUPPORTED_MEDIA_TYPE
            {
                status
            } else {
                StatusCode::BAD_REQUEST
            };
            return error_response(status, rejection.body_text());
        }
    };

    let message = request.message.as_deref().map(str::trim).unwrap_or_default();
    if message.is_empty() {
        return error_response(StatusCode::BAD_REQUEST, "Message cannot be empty");
    }

    let reply = state.responder.respond(message).await;

    (
        StatusCode::OK,
        Json(ChatResponse {
            success: true,
            response: reply.text,
            timestamp: chrono::Local::now().format("%H:%M").to_string(),
            tag: reply.tag,
            confidence: Some(reply.confidence),
        }),
    )
        .into_response()
}

fn error_response(status: StatusCode, error: impl Into<String>) -> Response {
    (
        status,
        Json(ErrorResponse {
            success: false,
            error: error.into(),
        }),
    )
        .into_response()
}

fn handle_panic(err: Box<dyn Any + Send + 'static>) -> axum::http::Response<String> {
    let detail = err
        .downcast_ref::<String>()
        .cloned()
        .or_else(|| err.downcast_ref::<&str>().map(|value| value.to_string()))
        .unwrap_or_else(|| "unknown panic".to_string());
    tracing::error!(panic = %detail, "request handler panicked");

    let body = serde_json::json!({
        "success": false,
        "error": "internal server error"
    })
    .to_string();

    axum::http::Response::builder()
        .status(StatusCode::INTERNAL_SERVER_ERROR)
        .header(header::CONTENT_TYPE, "application/json")
        .body(body)
        .unwrap_or_default()
}

fn build_cors_layer(allowed_origins: &Arc<Vec<String>>) -> CorsLayer {
    let origins = allowed_origins
        .iter()
        .filter_map(|origin| HeaderValue::from_str(origin).ok())
        .collect::<Vec<_>>();
    if origins.is_empty() {
        return CorsLayer::permissive();
    }

    CorsLayer::new()
        .allow_origin(AllowOrigin::list(origins))
        .allow_methods([Method::GET, Method::POST, Method::OPTIONS])
        .allow_headers([header::CONTENT_TYPE])
}
