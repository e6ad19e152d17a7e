//! HTTP boundary for the nanolog storage core: an `actix-web` server whose
//! role (`standalone` / `console` / `ingester`) decides whether it hosts a
//! local `Engine`, a peer-fanning `Aggregator`, or both.

use actix_cors::Cors;
use actix_web::{web, App, HttpServer};
use aggregator::Aggregator;
use anyhow::{Context as _, Result};
use clap::Parser;
use config::{EngineConfig, Role, ServerConfig, DEFAULT_DATA_DIR, DEFAULT_FLUSH_THRESHOLD, DEFAULT_PORT, DEFAULT_RETENTION};
use engine::{run_cleaner, Engine};
use std::path::PathBuf;
use std::sync::Arc;
use std::time::Duration;
use tokio_util::sync::CancellationToken;

use server::{api, state::AppState};

/// Starts a nanolog storage/query node.
#[derive(Debug, Parser)]
#[command(name = "nanolog-server", about = "nanolog storage and query boundary server")]
struct Cli {
    /// HTTP listen port.
    #[arg(long, default_value_t = DEFAULT_PORT)]
    port: u16,

    /// Data directory (WAL, sealed segments, persistent stats).
    #[arg(long, default_value = DEFAULT_DATA_DIR)]
    data: PathBuf,

    /// Retention window as a duration string (e.g. "168h").
    #[arg(long, default_value = DEFAULT_RETENTION)]
    retention: String,

    /// Operational role: standalone, console, or ingester.
    #[arg(long, default_value = "standalone")]
    role: String,

    /// Comma-separated peer base URLs, used by console/standalone roles.
    #[arg(long, default_value = "")]
    data_nodes: String,
}

#[actix_web::main]
async fn main() -> Result<()> {
    tracing_subscriber::fmt().with_target(false).with_level(true).init();

    let cli = Cli::parse();
    let role = Role::parse(&cli.role)?;
    let retention = config::parse_duration(&cli.retention).context("invalid --retention")?;
    let data_nodes: Vec<String> = cli.data_nodes.split(',').map(str::trim).filter(|s| !s.is_empty()).map(str::to_string).collect();

    let engine_config = EngineConfig {
        data_dir: cli.data.clone(),
        flush_threshold: DEFAULT_FLUSH_THRESHOLD,
        retention,
        cleaner_interval: Duration::from_secs(3600),
    };
    engine_config.validate()?;

    let server_config = ServerConfig {
        host: "0.0.0.0".to_string(),
        port: cli.port,
        role,
        data_nodes: data_nodes.clone(),
    };

    let engine = if role.hosts_engine() {
        Some(Arc::new(Engine::new(&engine_config).context("failed to open engine")?))
    } else {
        None
    };
    let aggregator = if role.hosts_aggregator() { Some(Arc::new(Aggregator::new(data_nodes))) } else { None };

    let shutdown = CancellationToken::new();
    let cleaner_handle = engine.clone().map(|e| {
        tokio::spawn(run_cleaner(e, engine_config.cleaner_interval, shutdown.clone()))
    });

    tracing::info!(role = cli.role.as_str(), port = server_config.port, data = %cli.data.display(), "starting nanolog server");

    let host = server_config.host.clone();
    let port = server_config.port;
    let srv = HttpServer::new(move || {
        let cors = Cors::default().allow_any_origin().allow_any_method().allow_any_header();
        App::new()
            .wrap(cors)
            .app_data(web::Data::new(AppState { engine: engine.clone(), aggregator: aggregator.clone() }))
            .configure(api::configure)
    })
    .bind((host.as_str(), port))
    .with_context(|| format!("failed to bind {host}:{port}"))?
    .run();

    let handle = srv.handle();
    let ctrl_c_shutdown = shutdown.clone();
    tokio::spawn(async move {
        if tokio::signal::ctrl_c().await.is_ok() {
            tracing::info!("shutdown signal received");
            ctrl_c_shutdown.cancel();
            handle.stop(true).await;
        }
    });

    srv.await.context("server task failed")?;
    shutdown.cancel();
    if let Some(handle) = cleaner_handle {
        handle.await.ok();
    }

    Ok(())
}
