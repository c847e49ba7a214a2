//! History, invoices, tariff templates and price input

use super::AppState;
use crate::error::ChargeDeckError;
use crate::history::{self, HistoryFilter, Invoice, SessionRecord, Totals};
use crate::tariff::{self, TariffTemplate};
use axum::extract::{Path, Query, State};
use axum::http::{StatusCode, header};
use axum::response::IntoResponse;
use axum::routing::{get, post};
use axum::{Json, Router};
use chrono::{NaiveTime, Utc};
use serde::Deserialize;

#[cfg_attr(feature = "openapi", utoipa::path(get, path = "/api/history", responses((status = 200))))]
pub async fn list_history(
    State(state): State<AppState>,
    Query(filter): Query<HistoryFilter>,
) -> Json<Vec<SessionRecord>> {
    Json(state.history.filter(&filter))
}

#[cfg_attr(feature = "openapi", utoipa::path(get, path = "/api/history/totals", responses((status = 200))))]
pub async fn history_totals(
    State(state): State<AppState>,
    Query(filter): Query<HistoryFilter>,
) -> Json<Totals> {
    Json(history::totals(&state.history.filter(&filter)))
}

#[cfg_attr(feature = "openapi", utoipa::path(get, path = "/api/history/export", responses((status = 200, content_type = "text/csv"))))]
pub async fn export_history(
    State(state): State<AppState>,
    Query(filter): Query<HistoryFilter>,
) -> impl IntoResponse {
    let csv = history::export_csv(&state.history.filter(&filter));
    (
        [
            (header::CONTENT_TYPE, "text/csv; charset=utf-8"),
            (
                header::CONTENT_DISPOSITION,
                "attachment; filename=\"chargedeck-history.csv\"",
            ),
        ],
        csv,
    )
}

#[cfg_attr(feature = "openapi", utoipa::path(get, path = "/api/invoices", responses((status = 200))))]
pub async fn list_invoices(State(state): State<AppState>) -> Json<Vec<Invoice>> {
    Json(history::invoices(&state.history.records(), Utc::now()))
}

#[cfg_attr(feature = "openapi", utoipa::path(get, path = "/api/tariffs", responses((status = 200))))]
pub async fn list_tariffs(State(state): State<AppState>) -> Json<Vec<TariffTemplate>> {
    let book = state.tariffs.read().await;
    Json(book.list().into_iter().cloned().collect())
}

#[cfg_attr(feature = "openapi", utoipa::path(post, path = "/api/tariffs/import", request_body(content = String, content_type = "text/csv"), responses((status = 200), (status = 400))))]
pub async fn import_tariffs(
    State(state): State<AppState>,
    body: String,
) -> Result<impl IntoResponse, ChargeDeckError> {
    let templates = tariff::parse_tariff_csv(&body)?;
    let names: Vec<String> = templates.iter().map(|t| t.name.clone()).collect();
    let imported = state.tariffs.write().await.import(templates);
    crate::logging::get_logger("tariff").info(&format!(
        "Imported {} tariff templates: {}",
        imported,
        names.join(", ")
    ));
    Ok(Json(serde_json::json!({"imported": imported, "templates": names})))
}

#[derive(Debug, Default, Deserialize)]
#[cfg_attr(feature = "openapi", derive(utoipa::IntoParams))]
pub struct RateParams {
    /// Local time `HH:MM`; defaults to now in the configured timezone
    pub at: Option<String>,
}

#[cfg_attr(feature = "openapi", utoipa::path(get, path = "/api/tariffs/{name}/rate", params(("name" = String, Path), RateParams), responses((status = 200), (status = 404))))]
pub async fn tariff_rate(
    State(state): State<AppState>,
    Path(name): Path<String>,
    Query(params): Query<RateParams>,
) -> Result<impl IntoResponse, ChargeDeckError> {
    let at = match params.at.as_deref() {
        Some(raw) => NaiveTime::parse_from_str(raw, "%H:%M")
            .map_err(|_| ChargeDeckError::validation("at", format!("Expected HH:MM, got '{}'", raw)))?,
        None => Utc::now().with_timezone(&state.locale.timezone).time(),
    };
    let book = state.tariffs.read().await;
    let template = book
        .get(&name)
        .ok_or_else(|| ChargeDeckError::not_found(format!("tariff '{}'", name)))?;
    let window = template.window_at(at);
    Ok(Json(serde_json::json!({
        "template": template.name,
        "at": at.format("%H:%M").to_string(),
        "label": window.map(|w| w.label.clone()),
        "rate": window.map(|w| w.rate),
        "rate_display": window.map(|w| state.locale.amount(w.rate)),
    })))
}

#[derive(Debug, Deserialize)]
#[cfg_attr(feature = "openapi", derive(utoipa::ToSchema))]
pub struct PriceBody {
    pub value: String,
}

#[cfg_attr(feature = "openapi", utoipa::path(post, path = "/api/pricing/validate", request_body = PriceBody, responses((status = 200), (status = 400))))]
pub async fn validate_price(Json(body): Json<PriceBody>) -> impl IntoResponse {
    match tariff::validate_price_input(&body.value) {
        Ok(value) => (
            StatusCode::OK,
            Json(serde_json::json!({"valid": true, "value": value})),
        ),
        Err(e) => (
            StatusCode::BAD_REQUEST,
            Json(serde_json::json!({"valid": false, "error": e.to_string()})),
        ),
    }
}

pub fn routes() -> Router<AppState> {
    Router::new()
        .route("/api/history", get(list_history))
        .route("/api/history/totals", get(history_totals))
        .route("/api/history/export", get(export_history))
        .route("/api/invoices", get(list_invoices))
        .route("/api/tariffs", get(list_tariffs))
        .route("/api/tariffs/import", post(import_tariffs))
        .route("/api/tariffs/{name}/rate", get(tariff_rate))
        .route("/api/pricing/validate", post(validate_price))
}
