use anyhow::Context;

use depscope_api::{app, config::ApiConfig};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    depscope_observability::init();

    let config = ApiConfig::from_env().context("invalid configuration")?;

    let services = std::sync::Arc::new(
        app::services::build_services(&config).context("failed to build services")?,
    );
    let purger =
        app::services::spawn_session_purger(services.authority.clone(), config.purge_interval);

    let router = app::router(services, config.max_body_bytes);

    let listener = tokio::net::TcpListener::bind(config.bind_addr)
        .await
        .with_context(|| format!("failed to bind {}", config.bind_addr))?;

    tracing::info!(
        addr = %listener.local_addr()?,
        session_ttl_secs = config.session_ttl.as_secs(),
        max_body_bytes = config.max_body_bytes,
        "listening"
    );

    axum::serve(listener, router)
        .with_graceful_shutdown(shutdown_signal())
        .await
        .context("server error")?;

    purger.abort();
    tracing::info!("shut down");
    Ok(())
}

async fn shutdown_signal() {
    if let Err(e) = tokio::signal::ctrl_c().await {
        tracing::error!(error = %e, "failed to listen for shutdown signal");
    }
}
