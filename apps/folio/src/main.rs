mod config;
mod debounce;
mod errors;
mod export;
mod form;
mod models;
mod preview;
mod routes;
mod session;
mod state;
mod storage;

use std::net::SocketAddr;
use std::sync::Arc;
use std::time::Duration;

use anyhow::{Context, Result};
use tower_http::{cors::CorsLayer, trace::TraceLayer};
use tracing::info;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

use crate::config::Config;
use crate::export::services::{HttpPdfService, HttpRasterizer};
use crate::export::{PdfExporter, PdfSettings};
use crate::routes::build_router;
use crate::session::{SessionRegistry, SessionSettings};
use crate::state::AppState;
use crate::storage::{KvStore, MemoryStore, RedisStore};

#[tokio::main]
async fn main() -> Result<()> {
    // Load configuration first (fails on missing required env vars)
    let config = Config::from_env()?;

    // Initialize structured logging
    tracing_subscriber::registry()
        .with(EnvFilter::try_from_default_env().unwrap_or_else(|_| {
            EnvFilter::new(format!("{}={}", env!("CARGO_PKG_NAME"), &config.rust_log))
        }))
        .with(tracing_subscriber::fmt::layer())
        .init();

    info!("Starting Folio v{}", env!("CARGO_PKG_VERSION"));

    // Snapshot store: Redis when configured, process memory otherwise
    let store: Arc<dyn KvStore> = match &config.redis_url {
        Some(url) => {
            let redis = RedisStore::connect(url)
                .await
                .context("Failed to connect to Redis")?;
            info!("Redis snapshot store initialized");
            Arc::new(redis)
        }
        None => {
            info!("REDIS_URL not set, keeping snapshots in memory");
            Arc::new(MemoryStore::new())
        }
    };

    // PDF export collaborators
    let timeout = Duration::from_secs(config.service_timeout_secs);
    let rasterizer = HttpRasterizer::new(&config.rasterizer_url, timeout)
        .context("Failed to build rasterizer client")?;
    let author = HttpPdfService::new(&config.pdf_service_url, timeout)
        .context("Failed to build PDF service client")?;
    let pdf = PdfExporter::new(
        Arc::new(rasterizer),
        Arc::new(author),
        PdfSettings {
            settle_delay: Duration::from_millis(config.pdf_settle_delay_ms),
            ..PdfSettings::default()
        },
    );
    info!(
        rasterizer = %config.rasterizer_url,
        pdf_service = %config.pdf_service_url,
        "Export services configured"
    );

    let sessions = SessionRegistry::new(
        store,
        SessionSettings {
            gating: config.section_gating,
            preview_delay: Duration::from_millis(config.preview_debounce_ms),
            persist_delay: Duration::from_millis(config.persist_debounce_ms),
            idle_timeout: Duration::from_secs(config.session_idle_secs),
        },
    );
    let sessions = Arc::new(sessions);
    info!(gating = ?config.section_gating, "Session registry ready");

    // Reclaim abandoned sessions in the background
    let sweep_period = Duration::from_secs(config.session_sweep_secs.max(1));
    tokio::spawn(sessions.clone().sweep_idle(sweep_period));
    info!(
        idle_secs = config.session_idle_secs,
        sweep_secs = sweep_period.as_secs(),
        "Idle session sweep started"
    );

    // Build app state
    let state = AppState {
        sessions,
        pdf: Arc::new(pdf),
    };

    // Build router
    let app = build_router(state)
        .layer(TraceLayer::new_for_http())
        .layer(CorsLayer::permissive());

    let addr: SocketAddr = format!("0.0.0.0:{}", config.port).parse()?;
    info!("Listening on {addr}");

    let listener = tokio::net::TcpListener::bind(addr).await?;
    axum::serve(listener, app).await?;

    Ok(())
}
