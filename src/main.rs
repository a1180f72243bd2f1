//! campus-gate server
//!
//! Serves the role-gated dashboard shell and the two natural-language
//! endpoints (`/filter-translate`, `/navigate-translate`) backed by an
//! OpenAI-compatible chat-completions provider.
//!
//! Usage:
//!   campus-gate --listen 0.0.0.0:3000 --nlu-endpoint http://localhost:8080/v1/chat/completions

use std::sync::Arc;

use anyhow::{Context, Result};
use campus_gate::web::{build_router, AppState};
use campus_gate::Config;
use clap::Parser;
use tracing::info;

#[tokio::main]
async fn main() -> Result<()> {
    let config = Config::parse();
    campus_gate::logging::init(config.verbose, config.log_json)?;
    config.validate()?;

    info!(
        listen = %config.listen,
        endpoint = %config.nlu_endpoint,
        model = %config.nlu_model,
        timeout_secs = config.nlu_timeout_secs,
        authenticated = config.nlu_api_key.is_some(),
        "starting campus-gate"
    );

    let nlu = config.build_nlu()?;
    let state = AppState::new(Arc::new(nlu))
        .with_nlu_timeout(config.nlu_timeout())
        .with_max_query_len(config.max_query_len);
    let app = build_router(state);

    let listener = tokio::net::TcpListener::bind(config.listen)
        .await
        .with_context(|| format!("failed to bind {}", config.listen))?;
    info!(addr = %config.listen, "listening");

    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await
        .context("server error")?;

    info!("shut down");
    Ok(())
}

async fn shutdown_signal() {
    if let Err(err) = tokio::signal::ctrl_c().await {
        tracing::warn!(error = %err, "could not listen for ctrl-c");
        std::future::pending::<()>().await;
    }
}
