//! # 请求处理

use std::path::Path;

use anyhow::anyhow;
use axum::body::Bytes;
use axum::extract::State;
use axum::http::{header, HeaderMap, StatusCode};
use axum::response::{IntoResponse, Response};
use axum::Json;
use chrono::Local;
use serde::{Deserialize, Serialize};

use crate::config::Settings;
use crate::service::{Status, UpdateOutcome};

use super::signature;
use super::AppState;

const SIGNATURE_HEADER: &str = "x-hub-signature-256";
const EVENT_HEADER: &str = "x-github-event";

/// 只有推送到这些分支才触发更新
const MAIN_REFS: [&str; 2] = ["refs/heads/main", "refs/heads/master"];

// ========================================
// 响应类型
// ========================================

/// 处理失败时的 JSON 错误
#[derive(Debug)]
pub struct ApiError {
    status: StatusCode,
    message: String,
}

impl ApiError {
    fn new(status: StatusCode, message: impl Into<String>) -> Self {
        Self {
            status,
            message: message.into(),
        }
    }
}

impl From<anyhow::Error> for ApiError {
    fn from(e: anyhow::Error) -> Self {
        tracing::error!("request failed: {:#}", e);
        Self::new(StatusCode::INTERNAL_SERVER_ERROR, format!("{:#}", e))
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let body = serde_json::json!({ "error": self.message });
        (self.status, Json(body)).into_response()
    }
}

/// 更新类接口的统一回复
#[derive(Debug, Serialize)]
pub struct Reply {
    /// `success` / `skipped` / `ignored` / `error`
    status: &'static str,
    message: String,
    timestamp: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    groups: Option<usize>,
    #[serde(skip_serializing_if = "Option::is_none")]
    rules: Option<usize>,
}

impl Reply {
    fn new(status: &'static str, message: impl Into<String>) -> Self {
        Self {
            status,
            message: message.into(),
            timestamp: Local::now().to_rfc3339(),
            groups: None,
            rules: None,
        }
    }

    fn from_outcome(outcome: UpdateOutcome) -> Self {
        match outcome {
            UpdateOutcome::Fresh => Self::new("skipped", "Profile is still fresh"),
            UpdateOutcome::Updated { groups, rules, .. } => Self {
                groups: Some(groups),
                rules: Some(rules),
                ..Self::new("success", "Profile updated successfully")
            },
        }
    }
}

#[derive(Debug, Serialize)]
pub struct ServerStatus {
    server: &'static str,
    status: &'static str,
    timestamp: String,
    last_update: Option<String>,
    webhook_secret_configured: bool,
    #[serde(flatten)]
    profile: Status,
}

/// 在阻塞线程池中执行文件 I/O 与生成
async fn blocking<T, F>(f: F) -> Result<T, ApiError>
where
    F: FnOnce() -> anyhow::Result<T> + Send + 'static,
    T: Send + 'static,
{
    tokio::task::spawn_blocking(f)
        .await
        .map_err(|e| ApiError::from(anyhow!(e)))?
        .map_err(ApiError::from)
}

fn load_settings(state: &AppState) -> impl FnOnce() -> anyhow::Result<Settings> {
    let path = state.updater.config_path().to_path_buf();
    move || Ok(Settings::load(&path)?)
}

// ========================================
// 处理器
// ========================================

/// GET /clash_profile.yaml
pub async fn profile(State(state): State<AppState>) -> Result<Response, ApiError> {
    let settings = blocking(load_settings(&state)).await?;
    let path = settings.files.output;

    match tokio::fs::read(&path).await {
        Ok(bytes) => Ok((
            [(header::CONTENT_TYPE, "text/yaml; charset=utf-8")],
            bytes,
        )
            .into_response()),
        Err(e) if e.kind() == std::io::ErrorKind::NotFound => Err(ApiError::new(
            StatusCode::NOT_FOUND,
            "profile has not been generated yet",
        )),
        Err(e) => Err(anyhow!(e)
            .context(format!("Failed to read {}", path.display()))
            .into()),
    }
}

/// GET /status
pub async fn status(State(state): State<AppState>) -> Result<Json<ServerStatus>, ApiError> {
    let load = load_settings(&state);
    let profile = blocking(move || Status::collect(&load()?)).await?;

    Ok(Json(ServerStatus {
        server: env!("CARGO_PKG_NAME"),
        status: "running",
        timestamp: Local::now().to_rfc3339(),
        last_update: state.updater.last_update().map(|t| t.to_rfc3339()),
        webhook_secret_configured: !state.webhook_secret.is_empty(),
        profile,
    }))
}

/// POST /manual-update
pub async fn manual_update(State(state): State<AppState>) -> (StatusCode, Json<Reply>) {
    tracing::info!("manual update requested");
    force_update(&state).await
}

/// 强制更新；失败时回复 500 而不是错误体
async fn force_update(state: &AppState) -> (StatusCode, Json<Reply>) {
    let updater = state.updater.clone();
    match blocking(move || updater.run_once(true)).await {
        Ok(outcome) => (StatusCode::OK, Json(Reply::from_outcome(outcome))),
        Err(e) => (
            StatusCode::INTERNAL_SERVER_ERROR,
            Json(Reply::new("error", format!("Profile update failed: {}", e.message))),
        ),
    }
}

// ========================================
// Webhook
// ========================================

#[derive(Debug, Default, Deserialize)]
struct PushEvent {
    #[serde(default, rename = "ref")]
    git_ref: String,
    #[serde(default)]
    commits: Vec<Commit>,
}

#[derive(Debug, Default, Deserialize)]
struct Commit {
    #[serde(default)]
    added: Vec<String>,
    #[serde(default)]
    modified: Vec<String>,
}

/// 第一个文件名在 `watched` 中的变更文件
fn relevant_change<'e>(event: &'e PushEvent, watched: &[String]) -> Option<&'e str> {
    event
        .commits
        .iter()
        .flat_map(|c| c.added.iter().chain(&c.modified))
        .map(String::as_str)
        .find(|file| {
            Path::new(file)
                .file_name()
                .map(|name| watched.iter().any(|w| name.to_string_lossy() == w.as_str()))
                .unwrap_or(false)
        })
}

fn header_str<'h>(headers: &'h HeaderMap, name: &str) -> Option<&'h str> {
    headers.get(name).and_then(|v| v.to_str().ok())
}

/// 设置文件与模板文件的文件名
fn watched_files(state: &AppState, settings: &Settings) -> Vec<String> {
    [state.updater.config_path(), settings.files.rules_config.as_path()]
        .iter()
        .filter_map(|p| p.file_name())
        .map(|n| n.to_string_lossy().into_owned())
        .collect()
}

/// POST /webhook
pub async fn webhook(
    State(state): State<AppState>,
    headers: HeaderMap,
    body: Bytes,
) -> Result<(StatusCode, Json<Reply>), ApiError> {
    let event = header_str(&headers, EVENT_HEADER).unwrap_or_default();
    tracing::info!(event, "webhook received");

    if !state.webhook_secret.is_empty() {
        let sig = header_str(&headers, SIGNATURE_HEADER).unwrap_or_default();
        if !signature::verify(&state.webhook_secret, sig, &body) {
            tracing::warn!("webhook signature rejected");
            return Err(ApiError::new(StatusCode::FORBIDDEN, "invalid signature"));
        }
    }

    let payload: serde_json::Value = serde_json::from_slice(&body)
        .map_err(|e| ApiError::new(StatusCode::BAD_REQUEST, format!("invalid JSON: {}", e)))?;

    match event {
        "ping" => Ok((StatusCode::OK, Json(Reply::new("success", "Webhook server is running")))),
        "push" => {
            let push: PushEvent = serde_json::from_value(payload).map_err(|e| {
                ApiError::new(StatusCode::BAD_REQUEST, format!("invalid push event: {}", e))
            })?;
            handle_push(&state, &push).await
        }
        other => Ok((
            StatusCode::OK,
            Json(Reply::new("ignored", format!("Event type '{}' not handled", other))),
        )),
    }
}

async fn handle_push(
    state: &AppState,
    push: &PushEvent,
) -> Result<(StatusCode, Json<Reply>), ApiError> {
    if !MAIN_REFS.contains(&push.git_ref.as_str()) {
        tracing::info!(git_ref = %push.git_ref, "push to non-main branch ignored");
        return Ok((
            StatusCode::OK,
            Json(Reply::new("skipped", format!("Ref '{}' is not a main branch", push.git_ref))),
        ));
    }

    let settings = blocking(load_settings(state)).await?;
    let watched = watched_files(state, &settings);
    match relevant_change(push, &watched) {
        Some(file) => tracing::info!(file, "relevant change detected"),
        None => {
            return Ok((
                StatusCode::OK,
                Json(Reply::new("skipped", "No relevant changes detected")),
            ))
        }
    }

    Ok(force_update(state).await)
}
