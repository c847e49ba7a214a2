use super::AppState;
use crate::error::ChargeDeckError;
use crate::session::SessionSnapshot;
use axum::extract::State;
use axum::response::IntoResponse;
use axum::response::sse::{Event, KeepAlive, Sse};
use axum::routing::{get, post};
use axum::{Json, Router};
use serde::Deserialize;
use std::sync::Arc;
use tokio_stream::StreamExt;
use tokio_stream::wrappers::WatchStream;

type ApiResult = Result<Json<SessionSnapshot>, ChargeDeckError>;

fn owned(snapshot: &Arc<SessionSnapshot>) -> Json<SessionSnapshot> {
    Json(snapshot.as_ref().clone())
}

#[derive(Debug, Deserialize)]
#[cfg_attr(feature = "openapi", derive(utoipa::ToSchema))]
pub struct SupplyBody {
    pub present: bool,
}

#[cfg_attr(feature = "openapi", utoipa::path(get, path = "/api/session", responses((status = 200))))]
pub async fn get_session(State(state): State<AppState>) -> Json<SessionSnapshot> {
    owned(&state.session.snapshot())
}

#[cfg_attr(feature = "openapi", utoipa::path(post, path = "/api/session/pause", responses((status = 200), (status = 409))))]
pub async fn pause(State(state): State<AppState>) -> ApiResult {
    Ok(owned(&state.session.pause().await?))
}

#[cfg_attr(feature = "openapi", utoipa::path(post, path = "/api/session/resume", responses((status = 200), (status = 409))))]
pub async fn resume(State(state): State<AppState>) -> ApiResult {
    Ok(owned(&state.session.resume().await?))
}

#[cfg_attr(feature = "openapi", utoipa::path(post, path = "/api/session/reset", responses((status = 200))))]
pub async fn reset(State(state): State<AppState>) -> ApiResult {
    Ok(owned(&state.session.reset().await?))
}

#[cfg_attr(feature = "openapi", utoipa::path(post, path = "/api/session/supply", request_body = SupplyBody, responses((status = 200))))]
pub async fn set_supply(State(state): State<AppState>, Json(body): Json<SupplyBody>) -> ApiResult {
    Ok(owned(&state.session.set_supply(body.present).await?))
}

#[cfg_attr(feature = "openapi", utoipa::path(get, path = "/api/session/stream", responses((status = 200))))]
pub async fn stream(State(state): State<AppState>) -> impl IntoResponse {
    let stream = WatchStream::new(state.session.subscribe())
        .map(|snapshot| Event::default().event("session").json_data(snapshot.as_ref()));
    Sse::new(stream).keep_alive(KeepAlive::default())
}

pub fn routes() -> Router<AppState> {
    Router::new()
        .route("/api/session", get(get_session))
        .route("/api/session/pause", post(pause))
        .route("/api/session/resume", post(resume))
        .route("/api/session/reset", post(reset))
        .route("/api/session/supply", post(set_supply))
        .route("/api/session/stream", get(stream))
}
