use std::sync::Arc;

use anyhow::Context;

use study_tracker::clock::SystemClock;
use study_tracker::config::ServerConfig;
use study_tracker::store::{LibSqlBackend, TopicStore};
use study_tracker::topics::{AppState, topic_routes};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Initialize tracing
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("info")),
        )
        .with_target(false)
        .init();

    let config = ServerConfig::from_env().context("invalid configuration")?;
    let addr = config.bind_addr()?;

    eprintln!("📚 Study Tracker v{}", env!("CARGO_PKG_VERSION"));
    eprintln!("   Database: {}", config.database.describe());
    eprintln!("   Listening: http://{}", addr);

    // ── Database ─────────────────────────────────────────────────────────
    let store: Arc<dyn TopicStore> = Arc::new(
        LibSqlBackend::open(&config.database)
            .await
            .with_context(|| format!("failed to open database {}", config.database.describe()))?,
    );

    let app = topic_routes(AppState::new(store, Arc::new(SystemClock)));

    let listener = tokio::net::TcpListener::bind(addr)
        .await
        .with_context(|| format!("failed to bind {addr}"))?;
    tracing::info!(%addr, "Study tracker server started");
    axum::serve(listener, app).await?;

    Ok(())
}
