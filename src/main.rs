use std::net::{IpAddr, SocketAddr};
use std::sync::Arc;

use anyhow::Context;
use ergomatrix_backend::{
    config::Config, logging::init_logging, routes::create_router, state::AppState,
};
use tokio::signal;
use tower_http::cors::CorsLayer;
use tracing::info;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    dotenvy::dotenv().ok();

    let config = Config::from_env().context("invalid configuration")?;
    init_logging(&config.logging);

    let state = Arc::new(AppState::from_config(&config).context("failed to build HTTP client")?);

    let cors = CorsLayer::very_permissive();

    let app = create_router(&config.server).with_state(state).layer(cors);

    let addr = SocketAddr::from((
        config
            .server
            .host
            .parse::<IpAddr>()
            .with_context(|| format!("invalid HOST {}", config.server.host))?,
        config.server.port,
    ));
    let listener = tokio::net::TcpListener::bind(addr).await?;

    info!(
        %addr,
        provider = %config.upstream.provider,
        model = %config.upstream.model,
        chat_path = %config.server.chat_path,
        topic_filter = config.topic_filter,
        "ErgoMatrix backend listening"
    );

    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await?;

    info!("server stopped");
    Ok(())
}

async fn shutdown_signal() {
    let ctrl_c = async {
        if let Err(err) = signal::ctrl_c().await {
            tracing::error!(%err, "failed to install Ctrl+C handler");
            std::future::pending::<()>().await;
        }
    };

    #[cfg(unix)]
    let terminate = async {
        match signal::unix::signal(signal::unix::SignalKind::terminate()) {
            Ok(mut sig) => {
                sig.recv().await;
            }
            Err(err) => {
                tracing::error!(%err, "failed to install SIGTERM handler");
                std::future::pending::<()>().await;
            }
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => info!("received Ctrl+C, shutting down"),
        _ = terminate => info!("received SIGTERM, shutting down"),
    }
}
