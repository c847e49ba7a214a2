use axum::response::sse::{Event, KeepAlive, Sse};
use axum::{Json, Router, extract::Query, http::header, response::IntoResponse};
use axum::{http::StatusCode, response::Response};
use axum::{routing::get, routing::post};
use serde::Deserialize;
use std::path::{Path, PathBuf};
use tokio::fs;
use tokio_stream::StreamExt;
use tokio_stream::wrappers::BroadcastStream;

use super::AppState;
use axum::extract::State;
use std::time::SystemTime;

const DEFAULT_LINES: usize = 200;
const MAX_LINES: usize = 10_000;

#[derive(Debug, Deserialize)]
#[cfg_attr(feature = "openapi", derive(utoipa::ToSchema, utoipa::IntoParams))]
pub struct TailParams {
    pub lines: Option<usize>,
}

#[derive(Clone, Copy)]
enum Window {
    Head,
    Tail,
}

async fn read_log_window(state: &AppState, params: &TailParams, window: Window) -> Response {
    let max_lines = params.lines.unwrap_or(DEFAULT_LINES).min(MAX_LINES);
    let Some(path) = resolve_log_file_path(&state.config.logging.file).await else {
        return (StatusCode::NOT_FOUND, "Log file not available").into_response();
    };
    let Ok(contents) = fs::read_to_string(&path).await else {
        return (StatusCode::NOT_FOUND, "Log file not available").into_response();
    };
    let lines: Vec<&str> = contents.lines().collect();
    let picked = match window {
        Window::Head => &lines[..lines.len().min(max_lines)],
        Window::Tail => &lines[lines.len().saturating_sub(max_lines)..],
    };
    (
        [(header::CONTENT_TYPE, "text/plain; charset=utf-8")],
        picked.join("\n"),
    )
        .into_response()
}

#[cfg_attr(feature = "openapi", utoipa::path(get, path = "/api/logs/tail", params(TailParams), responses((status = 200), (status = 404))))]
pub async fn logs_tail(
    State(state): State<AppState>,
    Query(params): Query<TailParams>,
) -> Response {
    read_log_window(&state, &params, Window::Tail).await
}

#[cfg_attr(feature = "openapi", utoipa::path(get, path = "/api/logs/head", params(TailParams), responses((status = 200), (status = 404))))]
pub async fn logs_head(
    State(state): State<AppState>,
    Query(params): Query<TailParams>,
) -> Response {
    read_log_window(&state, &params, Window::Head).await
}

#[cfg_attr(feature = "openapi", utoipa::path(get, path = "/api/logs/stream", responses((status = 200))))]
pub async fn logs_stream() -> impl IntoResponse {
    let rx = crate::logging::subscribe_log_lines();
    let stream = BroadcastStream::new(rx).filter_map(|res| match res {
        Ok(line) if crate::logging::should_emit_to_web(&line) => {
            Some(Ok::<Event, std::convert::Infallible>(
                Event::default().event("log").data(line),
            ))
        }
        _ => None,
    });
    Sse::new(stream).keep_alive(KeepAlive::default())
}

#[cfg_attr(feature = "openapi", utoipa::path(get, path = "/api/logs/download", responses((status = 200))))]
pub async fn logs_download(State(state): State<AppState>) -> Response {
    let Some(path) = resolve_log_file_path(&state.config.logging.file).await else {
        return (StatusCode::NOT_FOUND, "Log file not available").into_response();
    };
    match fs::read(&path).await {
        Ok(bytes) => (
            [
                (header::CONTENT_TYPE, "application/octet-stream"),
                (
                    header::CONTENT_DISPOSITION,
                    "attachment; filename=\"chargedeck.log\"",
                ),
            ],
            bytes,
        )
            .into_response(),
        Err(_) => (StatusCode::NOT_FOUND, "Log file not available").into_response(),
    }
}

fn name_matches(file_name: &str, prefix: &str, suffix: &str) -> bool {
    if file_name == format!("{}.{}", prefix, suffix) {
        return true;
    }
    (file_name.starts_with(prefix) && file_name.ends_with(&format!(".{suffix}")))
        || (file_name.starts_with(&format!("{}.", prefix))
            && file_name.contains(&format!(".{suffix}.")))
}

fn derive_search_spec(configured: &Path) -> (PathBuf, String, String) {
    if configured.extension().is_some() {
        let dir = configured.parent().unwrap_or_else(|| Path::new("."));
        let stem = configured
            .file_stem()
            .and_then(|s| s.to_str())
            .unwrap_or("chargedeck")
            .to_string();
        let ext = configured
            .extension()
            .and_then(|s| s.to_str())
            .unwrap_or("log")
            .to_string();
        (dir.to_path_buf(), stem, ext)
    } else {
        (
            configured.to_path_buf(),
            "chargedeck".to_string(),
            "log".to_string(),
        )
    }
}

async fn configured_file_if_exists(configured: &Path) -> Option<PathBuf> {
    if let Ok(md) = fs::metadata(configured).await
        && md.is_file()
    {
        Some(configured.to_path_buf())
    } else {
        None
    }
}

async fn find_latest_matching(search_dir: &Path, prefix: &str, suffix: &str) -> Option<PathBuf> {
    let mut best_path: Option<PathBuf> = None;
    let mut best_mtime: SystemTime = SystemTime::UNIX_EPOCH;
    let mut stack: Vec<PathBuf> = vec![search_dir.to_path_buf()];
    while let Some(dir) = stack.pop() {
        let mut rd = match fs::read_dir(&dir).await {
            Ok(v) => v,
            Err(_) => continue,
        };
        while let Ok(Some(entry)) = rd.next_entry().await {
            let ft = match entry.file_type().await {
                Ok(v) => v,
                Err(_) => continue,
            };
            if ft.is_file() {
                if let Some(name) = entry.file_name().to_str()
                    && name_matches(name, prefix, suffix)
                    && let Ok(md) = entry.metadata().await
                    && let Ok(modified) = md.modified()
                    && modified > best_mtime
                {
                    best_mtime = modified;
                    best_path = Some(entry.path());
                }
            } else if ft.is_dir() {
                stack.push(entry.path());
            }
        }
    }
    best_path
}

// Daily rotation appends a date to the file name, so the configured path may
// not exist; fall back to the newest rotated sibling.
async fn resolve_log_file_path(configured_path: &str) -> Option<PathBuf> {
    let configured = Path::new(configured_path);
    if let Some(p) = configured_file_if_exists(configured).await {
        return Some(p);
    }
    let (search_dir, prefix, suffix) = derive_search_spec(configured);
    find_latest_matching(&search_dir, &prefix, &suffix).await
}

#[derive(Deserialize)]
#[cfg_attr(feature = "openapi", derive(utoipa::ToSchema, utoipa::IntoParams))]
pub struct WebLevelQuery {
    pub level: String,
}

#[cfg_attr(feature = "openapi", utoipa::path(post, path = "/api/logs/web_level", params(WebLevelQuery), responses((status = 200))))]
pub async fn set_web_log_level(Query(q): Query<WebLevelQuery>) -> impl IntoResponse {
    match crate::logging::set_web_log_level_str(&q.level) {
        Ok(_) => (
            StatusCode::OK,
            Json(serde_json::json!({"ok": true, "level": q.level})),
        ),
        Err(e) => (
            StatusCode::BAD_REQUEST,
            Json(serde_json::json!({"ok": false, "error": e.to_string()})),
        ),
    }
}

#[cfg_attr(feature = "openapi", utoipa::path(get, path = "/api/logs/web_level", responses((status = 200))))]
pub async fn get_web_log_level() -> impl IntoResponse {
    let level = crate::logging::get_web_log_level();
    Json(serde_json::json!({"level": level.to_string()}))
}

pub fn routes() -> Router<AppState> {
    Router::new()
        .route("/api/logs/tail", get(logs_tail))
        .route("/api/logs/head", get(logs_head))
        .route("/api/logs/download", get(logs_download))
        .route("/api/logs/stream", get(logs_stream))
        .route(
            "/api/logs/web_level",
            post(set_web_log_level).get(get_web_log_level),
        )
}
