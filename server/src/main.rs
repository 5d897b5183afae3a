mod app;
mod config;
mod routes;
mod services;
mod state;

use std::sync::Arc;

use tokio::signal;
use tracing_subscriber::EnvFilter;

use crate::state::AppState;

#[tokio::main]
async fn main() {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| "info".into()))
        .init();

    let state = match AppState::from_env() {
        Ok(state) => state,
        Err(e) => {
            tracing::error!(error = %e, "failed to build upstream HTTP client");
            return;
        }
    };
    if config::supabase_url().is_none() {
        tracing::warn!("SUPABASE_URL is not set; every county will render as no data");
    }

    // Boundaries are fetched once per process; the loader only holds a weak handle.
    let boundary_url = config::boundary_geojson_url();
    tracing::info!(url = %boundary_url, "loading county boundaries");
    tokio::spawn(services::boundary_loader::run(
        Arc::downgrade(&state.boundaries),
        state.boundary_client.clone(),
        boundary_url,
    ));

    let static_dir = state.static_dir.clone();
    let app = app::build_app(state);

    let addr = format!("0.0.0.0:{}", config::server_port());
    tracing::info!(static_dir = %static_dir.display(), "NDC tracker server listening on {addr}");

    let listener = match tokio::net::TcpListener::bind(&addr).await {
        Ok(listener) => listener,
        Err(e) => {
            tracing::error!(error = %e, %addr, "failed to bind TCP listener");
            return;
        }
    };
    if let Err(e) = axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await
    {
        tracing::error!(error = %e, "server failed");
    }

    tracing::info!("Server shut down gracefully");
}

async fn shutdown_signal() {
    let ctrl_c = async {
        if let Err(e) = signal::ctrl_c().await {
            tracing::error!(error = %e, "failed to install Ctrl+C handler");
        }
    };

    #[cfg(unix)]
    let terminate = async {
        let mut sigterm = match signal::unix::signal(signal::unix::SignalKind::terminate()) {
            Ok(sigterm) => sigterm,
            Err(e) => {
                tracing::error!(error = %e, "failed to install SIGTERM handler");
                return;
            }
        };
        sigterm.recv().await;
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        () = ctrl_c => {},
        () = terminate => {},
    }

    tracing::info!("Shutdown signal received");
}
