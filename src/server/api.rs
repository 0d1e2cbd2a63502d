use crate::agent::{ AgentError, ServiceAgent };
use crate::models::chat::{ ChatReply, ChatRequest, ErrorReply };
use crate::ui::parser::{ parse_reply, ParsedBusiness };

use std::num::NonZeroU32;
use std::sync::Arc;
use axum::{
    body::Bytes,
    extract::{ Request, State },
    http::{ header, StatusCode },
    middleware::{ self, Next },
    response::{ Html, IntoResponse, Response },
    routing::{ get, post },
    Json,
    Router,
};
use governor::{ RateLimiter, Quota, state::{ InMemoryState, NotKeyed }, clock::DefaultClock };
use serde::{ Deserialize, Serialize };
use thiserror::Error;
use tower::ServiceBuilder;
use tower_http::cors::{ Any, CorsLayer };
use uuid::Uuid;
use log::{ info, warn, error };

const LANDING_PAGE: &str = include_str!("../../static/index.html");
const CHAT_WIDGET_JS: &str = include_str!("../../static/chat-widget.js");
const INTERNAL_ERROR: &str = "Internal server error";

type RequestLimiter = RateLimiter<NotKeyed, InMemoryState, DefaultClock>;

#[derive(Debug, Error)]
pub enum ApiError {
    #[error("Malformed request body: {0}")]
    MalformedBody(#[from] serde_json::Error),
    #[error(transparent)]
    Agent(#[from] AgentError),
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        (
            StatusCode::INTERNAL_SERVER_ERROR,
            Json(ErrorReply { error: INTERNAL_ERROR.to_string() }),
        ).into_response()
    }
}

#[derive(Deserialize)]
pub struct ParseRequest {
    pub text: String,
}

#[derive(Serialize, Deserialize)]
pub struct ParseResponse {
    pub businesses: Vec<ParsedBusiness>,
}

#[derive(Serialize, Deserialize)]
pub struct ReloadResponse {
    pub success: bool,
    pub message: String,
    pub details: Option<Vec<String>>,
}

#[derive(Clone)]
pub struct AppState {
    agent: Arc<ServiceAgent>,
    prompts_path: Option<String>,
    limiter: Arc<RequestLimiter>,
}

impl AppState {
    pub fn new(agent: Arc<ServiceAgent>, prompts_path: Option<String>, requests_per_second: u32) -> Self {
        let per_second = NonZeroU32::new(requests_per_second).unwrap_or(NonZeroU32::MIN);
        Self {
            agent,
            prompts_path: prompts_path.filter(|p| !p.trim().is_empty()),
            limiter: Arc::new(RateLimiter::direct(Quota::per_second(per_second))),
        }
    }
}

pub fn router(state: AppState) -> Router {
    let cors = CorsLayer::new()
        .allow_origin(Any)
        .allow_methods(Any)
        .allow_headers(Any);

    Router::new()
        .route("/", get(landing_page_handler))
        .route("/assets/chat-widget.js", get(chat_widget_handler))
        .route("/health", get(|| async { "ok" }))
        .route("/api/chat", post(chat_handler))
        .route("/api/recommendations/parse", post(parse_handler))
        .route("/api/reload-prompts", get(reload_prompts_handler))
        .layer(
            ServiceBuilder::new()
                .layer(cors)
                .layer(middleware::from_fn_with_state(state.clone(), rate_limit))
        )
        .with_state(state)
}

async fn rate_limit(State(state): State<AppState>, req: Request, next: Next) -> Response {
    if state.limiter.check().is_err() {
        warn!("Global request rate limit exceeded. Rejecting {} {}", req.method(), req.uri());
        return (
            StatusCode::TOO_MANY_REQUESTS,
            Json(ErrorReply { error: "Too many requests".to_string() }),
        ).into_response();
    }
    next.run(req).await
}

async fn landing_page_handler() -> Html<&'static str> {
    Html(LANDING_PAGE)
}

async fn chat_widget_handler() -> impl IntoResponse {
    ([(header::CONTENT_TYPE, "application/javascript; charset=utf-8")], CHAT_WIDGET_JS)
}

async fn chat_handler(
    State(state): State<AppState>,
    body: Bytes
) -> Result<Json<ChatReply>, ApiError> {
    let request_id = Uuid::new_v4();
    let result = async {
        let request: ChatRequest = serde_json::from_slice(&body)?;
        info!("[{}] Chat turn with {} messages", request_id, request.messages.len());
        let reply = state.agent.process_messages(&request.messages).await?;
        info!("[{}] Replied with {:?} at stage '{}'", request_id, reply.kind, reply.stage);
        Ok::<_, ApiError>(Json(ChatReply { message: reply.message }))
    }.await;

    result.map_err(|e| {
        error!("[{}] Error: {}", request_id, e);
        e
    })
}

async fn parse_handler(Json(req): Json<ParseRequest>) -> Json<ParseResponse> {
    Json(ParseResponse { businesses: parse_reply(&req.text) })
}

async fn reload_prompts_handler(State(state): State<AppState>) -> impl IntoResponse {
    let Some(path) = state.prompts_path.as_deref() else {
        return (
            StatusCode::BAD_REQUEST,
            Json(ReloadResponse {
                success: false,
                message: "No prompts file configured".into(),
                details: None,
            }),
        ).into_response();
    };

    let (ok, detail) = match state.agent.reload_prompts_if_changed(path).await {
        Ok(true) => (true, "Prompts reloaded".to_string()),
        Ok(false) => (true, "Prompts unchanged".to_string()),
        Err(e) => {
            error!("Prompt reload failed: {}", e);
            (false, format!("Prompts error: {}", e))
        }
    };

    let code = if ok { StatusCode::OK } else { StatusCode::BAD_REQUEST };
    (code, Json(ReloadResponse {
        success: ok,
        message: if ok { "Reload complete".into() } else { "Reload errors".into() },
        details: Some(vec![detail]),
    })).into_response()
}
