use super::AppState;
use crate::catalog::{Charger, Connector};
use crate::error::ChargeDeckError;
use crate::format::NOT_APPLICABLE;
use axum::extract::{Path, State};
use axum::routing::get;
use axum::{Json, Router};
use serde::Serialize;

/// Charger card as rendered on the dashboard
#[derive(Debug, Serialize)]
pub struct ChargerView {
    #[serde(flatten)]
    pub charger: Charger,
    pub commercial: bool,
    /// Lifetime earnings, or "N/A" on non-commercial chargers
    pub amount_display: String,
}

fn view(state: &AppState, charger: &Charger) -> ChargerView {
    let commercial = state.catalog.is_commercial(&charger.id);
    ChargerView {
        charger: charger.clone(),
        commercial,
        amount_display: if commercial {
            state.locale.amount(charger.amount)
        } else {
            NOT_APPLICABLE.to_string()
        },
    }
}

#[cfg_attr(feature = "openapi", utoipa::path(get, path = "/api/chargers", responses((status = 200))))]
pub async fn list_chargers(State(state): State<AppState>) -> Json<Vec<ChargerView>> {
    Json(state.catalog.list().iter().map(|c| view(&state, c)).collect())
}

#[cfg_attr(feature = "openapi", utoipa::path(get, path = "/api/chargers/{id}", params(("id" = String, Path)), responses((status = 200), (status = 404))))]
pub async fn get_charger(
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> Result<Json<ChargerView>, ChargeDeckError> {
    let charger = state
        .catalog
        .get(&id)
        .ok_or_else(|| ChargeDeckError::not_found(format!("charger '{}'", id)))?;
    Ok(Json(view(&state, charger)))
}

#[cfg_attr(feature = "openapi", utoipa::path(get, path = "/api/chargers/{id}/connectors", params(("id" = String, Path)), responses((status = 200), (status = 404))))]
pub async fn get_connectors(
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> Result<Json<Vec<Connector>>, ChargeDeckError> {
    state
        .catalog
        .connectors(&id)
        .map(|c| Json(c.to_vec()))
        .ok_or_else(|| ChargeDeckError::not_found(format!("charger '{}'", id)))
}

pub fn routes() -> Router<AppState> {
    Router::new()
        .route("/api/chargers", get(list_chargers))
        .route("/api/chargers/{id}", get(get_charger))
        .route("/api/chargers/{id}/connectors", get(get_connectors))
}
