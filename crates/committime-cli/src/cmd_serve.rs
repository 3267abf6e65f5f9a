use anyhow::{Context, Result};
use axum::extract::State;
use axum::http::{header, StatusCode};
use axum::response::{IntoResponse, Response};
use axum::routing::get;
use axum::Router;
use std::net::SocketAddr;
use std::sync::Arc;
use tokio::net::TcpListener;
use tokio::sync::Mutex;
use tracing::{error, info};

use committime::collector::Collector;
use committime::exposition;

use crate::args::{GlobalArgs, ServeArgs};
use crate::setup::{make_collector, runtime};

const PROMETHEUS_TEXT_FORMAT: &str = "text/plain; version=0.0.4; charset=utf-8";

/// Shared state of the scrape endpoint.
struct AppState {
    /// Passes are serialized so that the commit-time cache has one writer.
    collector: Mutex<Collector>,
    namespaces: Option<Vec<String>>,
}

pub fn run(_global_args: &GlobalArgs, args: &ServeArgs) -> Result<()> {
    let runtime = runtime()?;
    runtime.block_on(async {
        let state = AppState {
            collector: Mutex::new(make_collector(&args.collector)?),
            namespaces: args.collector.namespaces(),
        };
        serve(state, args.listen).await
    })
}

fn router(state: AppState) -> Router {
    Router::new()
        .route("/metrics", get(metrics))
        .route("/healthz", get(healthz))
        .with_state(Arc::new(state))
}

async fn serve(state: AppState, addr: SocketAddr) -> Result<()> {
    match &state.namespaces {
        Some(namespaces) => info!("Watching namespaces: {}", namespaces.join(", ")),
        None => info!("No namespaces specified, watching all namespaces"),
    }

    let listener = TcpListener::bind(addr)
        .await
        .with_context(|| format!("Failed to listen on {addr}"))?;
    info!("Serving metrics at http://{}/metrics", listener.local_addr()?);

    axum::serve(listener, router(state))
        .with_graceful_shutdown(shutdown_signal())
        .await
        .context("Metrics server failed")?;
    info!("Shut down");
    Ok(())
}

async fn shutdown_signal() {
    if let Err(e) = tokio::signal::ctrl_c().await {
        error!("Failed to listen for shutdown signal: {e}");
        std::future::pending::<()>().await;
    }
}

async fn metrics(State(state): State<Arc<AppState>>) -> Response {
    let mut collector = state.collector.lock().await;
    let metrics = match collector.collect_all(state.namespaces.as_deref()).await {
        Ok(metrics) => metrics,
        Err(e) => {
            error!("Collection failed: {e}");
            let body = format!("collection failed: {e}\n");
            return (StatusCode::INTERNAL_SERVER_ERROR, body).into_response();
        }
    };
    drop(collector);

    match exposition::render(&metrics) {
        Ok(text) => ([(header::CONTENT_TYPE, PROMETHEUS_TEXT_FORMAT)], text).into_response(),
        Err(e) => {
            error!("Failed to render metrics: {e}");
            let body = format!("failed to render metrics: {e}\n");
            (StatusCode::INTERNAL_SERVER_ERROR, body).into_response()
        }
    }
}

async fn healthz() -> &'static str {
    "ok"
}
