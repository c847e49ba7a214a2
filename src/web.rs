//! Axum-based HTTP API with optional OpenAPI (utoipa) and Swagger UI

use crate::catalog::Catalog;
use crate::config::Config;
use crate::error::ChargeDeckError;
use crate::events::{ActionKind, BroadcastSink, DashboardEvent, EventSink};
use crate::format::LocaleSettings;
use crate::history::SessionHistory;
use crate::onboarding::OnboardingStore;
use crate::session::runner::SessionHandle;
use crate::tariff::TariffBook;
use axum::response::sse::{Event, KeepAlive, Sse};
use axum::{
    Json, Router,
    extract::{Query, State},
    http::StatusCode,
    response::{IntoResponse, Response},
    routing::{get, post},
};
use chrono::{DateTime, Utc};
use serde::Deserialize;
use std::future::Future;
use std::net::{IpAddr, SocketAddr};
use std::sync::Arc;
use tokio::sync::{Mutex, RwLock};
use tokio_stream::StreamExt;
use tokio_stream::wrappers::BroadcastStream;
use tower_http::{cors::CorsLayer, trace::TraceLayer};

mod billing;
mod chargers;
mod logs;
mod onboarding;
mod session;

pub use logs::logs_stream;

/// Shared handles for every request handler
#[derive(Clone)]
pub struct AppState {
    pub config: Arc<Config>,
    pub catalog: Arc<Catalog>,
    pub onboarding: Arc<Mutex<OnboardingStore>>,
    pub session: SessionHandle,
    pub history: Arc<SessionHistory>,
    pub tariffs: Arc<RwLock<TariffBook>>,
    pub locale: Arc<LocaleSettings>,
    /// Sink every handler reports to
    pub events: Arc<dyn EventSink>,
    /// Live feed behind `/api/events`; also reachable through `events`
    pub broadcast: BroadcastSink,
}

impl IntoResponse for ChargeDeckError {
    fn into_response(self) -> Response {
        let status = match &self {
            Self::Validation { .. } => StatusCode::BAD_REQUEST,
            Self::NotFound { .. } => StatusCode::NOT_FOUND,
            Self::Rejected { .. } => StatusCode::CONFLICT,
            _ => StatusCode::INTERNAL_SERVER_ERROR,
        };
        if status.is_server_error() {
            crate::logging::get_logger("web").error(&format!("Request failed: {}", self));
        }
        (status, Json(serde_json::json!({"error": self.to_string()}))).into_response()
    }
}

#[cfg_attr(feature = "openapi", utoipa::path(get, path = "/api/health", responses(
    (status = 200, description = "Service is healthy")
)))]
pub async fn health() -> impl IntoResponse {
    (StatusCode::OK, "ok")
}

#[cfg_attr(feature = "openapi", utoipa::path(get, path = "/api/version", responses((status = 200))))]
pub async fn version() -> impl IntoResponse {
    Json(serde_json::json!({"version": env!("APP_VERSION")}))
}

#[cfg_attr(feature = "openapi", utoipa::path(get, path = "/api/config", responses((status = 200))))]
pub async fn get_config(State(state): State<AppState>) -> impl IntoResponse {
    Json(state.config.as_ref().clone())
}

#[cfg(feature = "openapi")]
#[utoipa::path(get, path = "/api/config/schema", responses((status = 200)))]
pub async fn get_config_schema() -> impl IntoResponse {
    let schema = schemars::schema_for!(crate::config::Config);
    Json(serde_json::to_value(&schema).unwrap_or(serde_json::json!({"error":"schema"})))
}

#[derive(Debug, Default, Deserialize)]
#[cfg_attr(feature = "openapi", derive(utoipa::IntoParams))]
pub struct PreviewParams {
    /// Instant to render; defaults to now
    pub at: Option<DateTime<Utc>>,
}

#[cfg_attr(feature = "openapi", utoipa::path(get, path = "/api/format/preview", params(PreviewParams), responses((status = 200))))]
pub async fn format_preview(
    State(state): State<AppState>,
    Query(params): Query<PreviewParams>,
) -> impl IntoResponse {
    Json(state.locale.preview(params.at.unwrap_or_else(Utc::now)))
}

#[derive(Debug, Deserialize)]
#[cfg_attr(feature = "openapi", derive(utoipa::ToSchema))]
pub struct ScreenActionBody {
    pub screen: String,
    pub action: ActionKind,
    #[serde(default)]
    pub payload: serde_json::Value,
}

#[cfg_attr(feature = "openapi", utoipa::path(post, path = "/api/actions", request_body = ScreenActionBody, responses((status = 202))))]
pub async fn post_action(
    State(state): State<AppState>,
    Json(body): Json<ScreenActionBody>,
) -> Result<impl IntoResponse, ChargeDeckError> {
    if body.screen.trim().is_empty() {
        return Err(ChargeDeckError::validation("screen", "Screen name cannot be empty"));
    }
    state.events.emit(&DashboardEvent::ScreenAction {
        screen: body.screen,
        action: body.action,
        payload: body.payload,
    });
    Ok((StatusCode::ACCEPTED, Json(serde_json::json!({"ok": true}))))
}

#[cfg_attr(feature = "openapi", utoipa::path(get, path = "/api/events", responses((status = 200))))]
pub async fn events(State(state): State<AppState>) -> impl IntoResponse {
    let rx = state.broadcast.subscribe();
    // Lagged receivers skip what they missed
    let stream = BroadcastStream::new(rx).filter_map(|msg| {
        let event = msg.ok()?;
        Event::default()
            .event(event.name())
            .json_data(&event)
            .ok()
            .map(Ok::<Event, std::convert::Infallible>)
    });
    Sse::new(stream).keep_alive(KeepAlive::default())
}

#[cfg(feature = "openapi")]
#[derive(utoipa::OpenApi)]
#[openapi(
    paths(
        health, version, get_config, get_config_schema, format_preview, post_action, events,
        onboarding::get_onboarding, onboarding::start, onboarding::complete_step,
        onboarding::advance, onboarding::finish, onboarding::set_charger, onboarding::route_for_step,
        chargers::list_chargers, chargers::get_charger, chargers::get_connectors,
        session::get_session, session::pause, session::resume, session::reset,
        session::set_supply, session::stream,
        billing::list_history, billing::history_totals, billing::export_history,
        billing::list_invoices, billing::list_tariffs, billing::import_tariffs,
        billing::tariff_rate, billing::validate_price,
        logs::logs_tail, logs::logs_head, logs::logs_download, logs::logs_stream,
        logs::set_web_log_level, logs::get_web_log_level,
    ),
    components(schemas(ScreenActionBody, ActionKind)),
    tags((name = "chargedeck", description = "ChargeDeck dashboard API"))
)]
pub struct ApiDoc;

pub fn build_router(state: AppState) -> Router {
    let router = Router::new()
        .route("/api/health", get(health))
        .route("/api/version", get(version))
        .route("/api/config", get(get_config))
        .route("/api/format/preview", get(format_preview))
        .route("/api/actions", post(post_action))
        .route("/api/events", get(events))
        .merge(onboarding::routes())
        .merge(chargers::routes())
        .merge(session::routes())
        .merge(billing::routes())
        .merge(logs::routes());

    #[cfg(feature = "openapi")]
    let router = {
        use utoipa::OpenApi as _;
        router
            .route("/api/config/schema", get(get_config_schema))
            .merge(utoipa_swagger_ui::SwaggerUi::new("/docs").url("/openapi.json", ApiDoc::openapi()))
    };

    let router = router
        .with_state(state)
        .layer(CorsLayer::permissive())
        .layer(TraceLayer::new_for_http());

    #[cfg(feature = "compression")]
    let router = router.layer(tower_http::compression::CompressionLayer::new());

    router
}

/// Bind and serve until `shutdown` resolves
pub async fn serve<F>(state: AppState, host: &str, port: u16, shutdown: F) -> crate::Result<()>
where
    F: Future<Output = ()> + Send + 'static,
{
    let router = build_router(state);
    let logger = crate::logging::get_logger("web");
    logger.info(&format!(
        "Starting web server; requested host={}, port={}",
        host, port
    ));

    let addr = match host.parse::<IpAddr>() {
        Ok(ip) => SocketAddr::new(ip, port),
        Err(_) => {
            logger.warn(&format!("Invalid host '{}'; falling back to 127.0.0.1", host));
            SocketAddr::from(([127, 0, 0, 1], port))
        }
    };

    let listener = tokio::net::TcpListener::bind(addr)
        .await
        .map_err(|e| ChargeDeckError::web(format!("bind {}: {}", addr, e)))?;
    let local_addr = listener.local_addr()?;
    logger.info(&format!(
        "Web server listening at http://{}:{} (API /api, docs /docs)",
        local_addr.ip(),
        local_addr.port()
    ));

    axum::serve(listener, router)
        .with_graceful_shutdown(shutdown)
        .await
        .map_err(|e| ChargeDeckError::web(e.to_string()))?;
    logger.info("Web server stopped");
    Ok(())
}
