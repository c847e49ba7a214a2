use super::AppState;
use crate::error::ChargeDeckError;
use crate::events::{DashboardEvent, OnboardingChange};
use crate::onboarding::{OnboardingStore, OnboardingView};
use axum::extract::{Path, State};
use axum::routing::{get, post, put};
use axum::{Json, Router};
use serde::Deserialize;

type ApiResult<T> = Result<Json<T>, ChargeDeckError>;

#[derive(Debug, Deserialize)]
#[cfg_attr(feature = "openapi", derive(utoipa::ToSchema))]
pub struct CompleteStepBody {
    pub step: String,
}

#[derive(Debug, Deserialize)]
#[cfg_attr(feature = "openapi", derive(utoipa::ToSchema))]
pub struct ChargerBody {
    pub charger_id: String,
}

/// Apply a mutation off the async workers; storage writes hit the disk synchronously
async fn mutate<F>(state: &AppState, op: F) -> ApiResult<OnboardingView>
where
    F: FnOnce(&mut OnboardingStore) -> Result<OnboardingChange, ChargeDeckError> + Send + 'static,
{
    let store = state.onboarding.clone();
    let (view, change) = tokio::task::spawn_blocking(move || {
        let mut guard = store.blocking_lock();
        let change = op(&mut *guard)?;
        Ok::<_, ChargeDeckError>((guard.view(), change))
    })
    .await
    .map_err(|e| ChargeDeckError::generic(format!("Onboarding update failed: {}", e)))??;

    state.events.emit(&DashboardEvent::Onboarding {
        change,
        progress: view.progress,
    });
    Ok(Json(view))
}

#[cfg_attr(feature = "openapi", utoipa::path(get, path = "/api/onboarding", responses((status = 200))))]
pub async fn get_onboarding(State(state): State<AppState>) -> Json<OnboardingView> {
    Json(state.onboarding.lock().await.view())
}

#[cfg_attr(feature = "openapi", utoipa::path(post, path = "/api/onboarding/start", responses((status = 200))))]
pub async fn start(State(state): State<AppState>) -> ApiResult<OnboardingView> {
    mutate(&state, |store| {
        store.start()?;
        Ok(OnboardingChange::Started)
    })
    .await
}

#[cfg_attr(feature = "openapi", utoipa::path(post, path = "/api/onboarding/complete", request_body = CompleteStepBody, responses((status = 200), (status = 400))))]
pub async fn complete_step(
    State(state): State<AppState>,
    Json(body): Json<CompleteStepBody>,
) -> ApiResult<OnboardingView> {
    mutate(&state, move |store| {
        store.complete_step(&body.step)?;
        Ok(OnboardingChange::StepCompleted { step: body.step })
    })
    .await
}

#[cfg_attr(feature = "openapi", utoipa::path(post, path = "/api/onboarding/advance", responses((status = 200))))]
pub async fn advance(State(state): State<AppState>) -> ApiResult<OnboardingView> {
    mutate(&state, |store| {
        store.advance()?;
        Ok(if store.is_onboarding() {
            OnboardingChange::Advanced
        } else {
            OnboardingChange::Finished
        })
    })
    .await
}

#[cfg_attr(feature = "openapi", utoipa::path(post, path = "/api/onboarding/finish", responses((status = 200))))]
pub async fn finish(State(state): State<AppState>) -> ApiResult<OnboardingView> {
    mutate(&state, |store| {
        store.finish()?;
        Ok(OnboardingChange::Finished)
    })
    .await
}

#[cfg_attr(feature = "openapi", utoipa::path(put, path = "/api/onboarding/charger", request_body = ChargerBody, responses((status = 200), (status = 400))))]
pub async fn set_charger(
    State(state): State<AppState>,
    Json(body): Json<ChargerBody>,
) -> ApiResult<OnboardingView> {
    mutate(&state, move |store| {
        store.set_charger_id(&body.charger_id)?;
        let charger_id = store.charger_id().unwrap_or_default().to_string();
        Ok(OnboardingChange::ChargerSelected { charger_id })
    })
    .await
}

#[cfg_attr(feature = "openapi", utoipa::path(get, path = "/api/onboarding/route/{index}", params(("index" = usize, Path, description = "Zero-based step index")), responses((status = 200), (status = 404))))]
pub async fn route_for_step(
    State(state): State<AppState>,
    Path(index): Path<usize>,
) -> ApiResult<serde_json::Value> {
    let store = state.onboarding.lock().await;
    let route = store
        .route_for_step(index)
        .ok_or_else(|| ChargeDeckError::not_found(format!("onboarding step {}", index)))?;
    Ok(Json(serde_json::json!({"index": index, "route": route})))
}

pub fn routes() -> Router<AppState> {
    Router::new()
        .route("/api/onboarding", get(get_onboarding))
        .route("/api/onboarding/start", post(start))
        .route("/api/onboarding/complete", post(complete_step))
        .route("/api/onboarding/advance", post(advance))
        .route("/api/onboarding/finish", post(finish))
        .route("/api/onboarding/charger", put(set_charger))
        .route("/api/onboarding/route/{index}", get(route_for_step))
}
