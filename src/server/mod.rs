//! # HTTP 服务
//!
//! 为客户端提供订阅地址，并暴露状态查询与更新触发接口：
//! - `GET  /clash_profile.yaml`: 当前产物
//! - `GET  /status`: 服务与产物状态（JSON）
//! - `POST /manual-update`: 立即强制更新
//! - `POST /webhook`: GitHub webhook（HMAC-SHA256 签名校验）
//!
//! 所有更新都经由同一个 `Updater`，与定时更新严格串行。

mod routes;
mod signature;

use std::sync::Arc;

use anyhow::{Context, Result};
use axum::routing::{get, post};
use axum::Router;
use tokio::net::TcpListener;
use tokio::signal;
use tower_http::trace::TraceLayer;

use crate::service::Updater;

/// 处理器共享的状态
#[derive(Debug, Clone)]
pub struct AppState {
    updater: Arc<Updater>,
    /// 为空时不校验签名
    webhook_secret: Arc<str>,
}

impl AppState {
    pub fn new(updater: Arc<Updater>, webhook_secret: &str) -> Self {
        Self {
            updater,
            webhook_secret: Arc::from(webhook_secret),
        }
    }
}

pub fn router(state: AppState) -> Router {
    Router::new()
        .route("/clash_profile.yaml", get(routes::profile))
        .route("/status", get(routes::status))
        .route("/manual-update", post(routes::manual_update))
        .route("/webhook", post(routes::webhook))
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}

/// 监听并服务，直到收到 Ctrl+C / SIGTERM
pub async fn run(state: AppState, host: &str, port: u16) -> Result<()> {
    let listener = TcpListener::bind((host, port))
        .await
        .with_context(|| format!("Failed to bind {}:{}", host, port))?;
    let address = listener.local_addr()?;

    if state.webhook_secret.is_empty() {
        tracing::warn!("webhook_secret not configured, webhook signatures will not be checked");
    }
    tracing::info!(%address, "HTTP server listening");

    axum::serve(listener, router(state))
        .with_graceful_shutdown(shutdown_signal())
        .await
        .context("HTTP server failed")?;

    tracing::info!("HTTP server stopped");
    Ok(())
}

async fn shutdown_signal() {
    let ctrl_c = async {
        if let Err(e) = signal::ctrl_c().await {
            tracing::error!("Failed to install Ctrl+C handler: {}", e);
            std::future::pending::<()>().await;
        }
    };

    #[cfg(unix)]
    let terminate = async {
        match signal::unix::signal(signal::unix::SignalKind::terminate()) {
            Ok(mut sig) => {
                sig.recv().await;
            }
            Err(e) => {
                tracing::error!("Failed to install SIGTERM handler: {}", e);
                std::future::pending::<()>().await;
            }
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => {},
        _ = terminate => {},
    }
    tracing::info!("shutdown signal received");
}
