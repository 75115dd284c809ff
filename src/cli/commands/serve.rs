use clap::Args;

use crate::app::DataServices;
use crate::config::CONFIG;
use crate::database::DatabaseManager;

#[derive(Args, Debug)]
pub struct ServeArgs {
    #[arg(long, help = "Port to listen on (defaults to the configured API port)")]
    pub port: Option<u16>,

    #[arg(long, help = "Serve from process-local stores instead of PostgreSQL")]
    pub in_memory: bool,

    #[arg(long, help = "Apply pending migrations before accepting requests")]
    pub migrate: bool,
}

pub async fn handle(args: ServeArgs) -> anyhow::Result<()> {
    tracing::info!("Starting cohort data services in {:?} mode", CONFIG.environment);

    if args.in_memory && crate::is_production!() {
        anyhow::bail!("in-memory stores cannot be served in production");
    }
    if CONFIG.security.jwt_secret.is_empty() {
        tracing::warn!("No JWT secret configured; bearer-gated operations will be denied");
    } else if crate::is_development!() {
        tracing::debug!("Using development JWT secret unless JWT_SECRET overrides it");
    }

    let services = if args.in_memory {
        tracing::warn!("Serving from in-memory stores; data is lost on exit");
        DataServices::in_memory()
    } else {
        if args.migrate {
            DatabaseManager::migrate().await?;
        }
        DataServices::postgres(DatabaseManager::pool().await?)
    };

    let port = args.port.unwrap_or(CONFIG.api.port);
    let bind_addr = format!("0.0.0.0:{}", port);
    let listener = tokio::net::TcpListener::bind(&bind_addr)
        .await
        .map_err(|e| anyhow::anyhow!("failed to bind {}: {}", bind_addr, e))?;

    tracing::info!("Listening on http://{}", bind_addr);

    axum::serve(listener, services.router())
        .with_graceful_shutdown(shutdown_signal())
        .await?;

    DatabaseManager::close().await;
    tracing::info!("Shut down cleanly");
    Ok(())
}

async fn shutdown_signal() {
    if let Err(e) = tokio::signal::ctrl_c().await {
        tracing::error!("Failed to listen for shutdown signal: {}", e);
    }
}
