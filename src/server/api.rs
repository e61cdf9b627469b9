use crate::agent::EllaAgent;
use crate::models::chat::{ ChatMessage, NewConversation };
use crate::models::review::ProjectedPoint;
use crate::projection::ProjectionError;
use axum::{
    extract::{ rejection::{ JsonRejection, QueryRejection }, Query, State },
    http::StatusCode,
    response::{ IntoResponse, Response },
    routing::{ get, post },
    Json,
    Router,
};
use governor::{ DefaultDirectRateLimiter, Quota, RateLimiter };
use log::{ error, info, warn };
use serde::Deserialize;
use serde_json::json;
use std::error::Error as StdError;
use std::num::NonZeroU32;
use std::sync::Arc;
use thiserror::Error;
use tower_http::cors::{ Any, CorsLayer };

#[derive(Debug, Error)]
pub enum ApiError {
    #[error("{0}")]
    BadRequest(String),
    #[error("Too many requests")]
    RateLimited,
    #[error("Internal Server Error")]
    Internal(String),
}

impl From<Box<dyn StdError + Send + Sync>> for ApiError {
    fn from(err: Box<dyn StdError + Send + Sync>) -> Self {
        ApiError::Internal(err.to_string())
    }
}

impl From<JsonRejection> for ApiError {
    fn from(rejection: JsonRejection) -> Self {
        ApiError::BadRequest(rejection.body_text())
    }
}

impl From<QueryRejection> for ApiError {
    fn from(rejection: QueryRejection) -> Self {
        ApiError::BadRequest(rejection.body_text())
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let (status, body) = match &self {
            ApiError::BadRequest(msg) => {
                warn!("Rejected request: {}", msg);
                (StatusCode::BAD_REQUEST, json!({ "success": false, "error": msg }))
            }
            ApiError::RateLimited =>
                (StatusCode::TOO_MANY_REQUESTS, json!({ "success": false, "error": self.to_string() })),
            ApiError::Internal(details) => {
                error!("Request failed: {}", details);
                (
                    StatusCode::INTERNAL_SERVER_ERROR,
                    json!({ "success": false, "error": self.to_string(), "details": details }),
                )
            }
        };
        (status, Json(body)).into_response()
    }
}

#[derive(Clone)]
pub struct AppState {
    agent: Arc<EllaAgent>,
    chat_limiter: Arc<DefaultDirectRateLimiter>,
}

impl AppState {
    pub fn new(agent: Arc<EllaAgent>, chat_per_second: u32) -> Self {
        let quota = Quota::per_second(NonZeroU32::new(chat_per_second).unwrap_or(NonZeroU32::MIN));
        Self {
            agent,
            chat_limiter: Arc::new(RateLimiter::direct(quota)),
        }
    }
}

#[derive(Deserialize)]
struct ChatRequest {
    messages: Vec<ChatMessage>,
}

#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
struct ProjectionQuery {
    buffer_radius: Option<f64>,
}

#[derive(Deserialize)]
struct FlagRequest {
    points: Vec<ProjectedPoint>,
}

pub fn router(state: AppState) -> Router {
    let cors = CorsLayer::new().allow_origin(Any).allow_methods(Any).allow_headers(Any);

    Router::new()
        .route("/health", get(health_handler))
        .route("/api/chat", post(chat_handler))
        .route("/api/save-conversation", post(save_conversation_handler))
        .route("/api/fetch-conversations", get(fetch_conversations_handler))
        .route("/api/evaluate-conversations", post(evaluate_conversations_handler))
        .route("/api/process-embeddings", post(process_embeddings_handler))
        .route("/api/fetch-embeddings", get(fetch_embeddings_handler))
        .route("/api/flag-points", post(flag_points_handler))
        .layer(cors)
        .with_state(state)
}

async fn health_handler() -> impl IntoResponse {
    Json(json!({ "status": "ok" }))
}

async fn chat_handler(
    State(state): State<AppState>,
    payload: Result<Json<ChatRequest>, JsonRejection>
) -> Result<Json<ChatMessage>, ApiError> {
    let Json(req) = payload?;
    if req.messages.is_empty() {
        return Err(ApiError::BadRequest("messages must not be empty".into()));
    }
    if state.chat_limiter.check().is_err() {
        return Err(ApiError::RateLimited);
    }
    let reply = state.agent.chat_turn(&req.messages).await?;
    Ok(Json(reply))
}

async fn save_conversation_handler(
    State(state): State<AppState>,
    payload: Result<Json<NewConversation>, JsonRejection>
) -> Result<impl IntoResponse, ApiError> {
    let Json(req) = payload?;
    if req.messages.is_empty() {
        return Err(ApiError::BadRequest("messages must not be empty".into()));
    }
    let saved = state.agent.save_conversation(req).await?;
    Ok(Json(json!({ "success": true, "id": saved.id })))
}

async fn fetch_conversations_handler(
    State(state): State<AppState>
) -> Result<impl IntoResponse, ApiError> {
    let conversations = state.agent.list_conversations().await?;
    Ok(Json(json!({ "success": true, "conversations": conversations })))
}

async fn evaluate_conversations_handler(
    State(state): State<AppState>
) -> Result<impl IntoResponse, ApiError> {
    let report = state.agent.evaluate_pending().await?;
    Ok(
        Json(
            json!({
            "success": true,
            "evaluatedCount": report.succeeded,
            "failedCount": report.failed,
        })
        )
    )
}

async fn process_embeddings_handler(
    State(state): State<AppState>
) -> Result<impl IntoResponse, ApiError> {
    let report = state.agent.embed_pending().await?;
    Ok(
        Json(
            json!({
            "success": true,
            "embeddedCount": report.succeeded,
            "failedCount": report.failed,
        })
        )
    )
}

async fn fetch_embeddings_handler(
    State(state): State<AppState>,
    query: Result<Query<ProjectionQuery>, QueryRejection>
) -> Result<impl IntoResponse, ApiError> {
    let Query(query) = query?;
    let projection = match state.agent.projection(query.buffer_radius).await {
        Ok(projection) => projection,
        Err(e) => {
            if let Some(err) = e.downcast_ref::<ProjectionError>() {
                info!("Projection unavailable: {}", err);
                return Ok(Json(json!({ "success": false, "error": err.to_string() })));
            }
            return Err(e.into());
        }
    };

    let data = state.agent.flag(&projection.points);
    Ok(Json(json!({ "success": true, "data": data, "isPCA": projection.is_pca })))
}

async fn flag_points_handler(
    State(state): State<AppState>,
    payload: Result<Json<FlagRequest>, JsonRejection>
) -> Result<impl IntoResponse, ApiError> {
    let Json(req) = payload?;
    let data = state.agent.flag(&req.points);
    Ok(Json(json!({ "success": true, "data": data })))
}
