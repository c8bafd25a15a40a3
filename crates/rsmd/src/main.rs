//! rsmd — the RAN slice manager daemon.
//!
//! Single binary that assembles the slice manager:
//! - State store (redb, or in-memory without a data dir)
//! - Topology registry seeded from the config file
//! - Slice orchestrator with per-node queues
//! - Loopback RAN programmer
//! - REST API
//!
//! # Usage
//!
//! ```text
//! rsmd serve --config /etc/rsm/rsmd.toml --port 8443
//! ```

mod config;

use std::collections::BTreeMap;
use std::net::SocketAddr;
use std::path::PathBuf;
use std::sync::Arc;

use clap::{Parser, Subcommand};
use tokio::sync::watch;
use tracing::{info, warn};

use rsm_slicing::{Collaborators, LoopbackRan, Orchestrator};
use rsm_state::StateStore;
use rsm_topo::{NodeDirectory, TopoRegistry};

use config::RsmConfig;

#[derive(Parser)]
#[command(name = "rsmd", about = "RAN slice manager daemon")]
struct Cli {
    /// Emit logs as JSON lines.
    #[arg(long, global = true)]
    log_json: bool,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand)]
enum Command {
    /// Run the slice manager and its REST API.
    Serve {
        /// Path to rsmd.toml.
        #[arg(long)]
        config: Option<PathBuf>,

        /// Port to listen on (overrides the config file).
        #[arg(long)]
        port: Option<u16>,

        /// Data directory for persistent state (overrides the config file).
        #[arg(long)]
        data_dir: Option<PathBuf>,
    },
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();

    let filter = tracing_subscriber::EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("info,rsmd=debug,rsm=debug"));
    if cli.log_json {
        tracing_subscriber::fmt()
            .json()
            .with_env_filter(filter)
            .init();
    } else {
        tracing_subscriber::fmt().with_env_filter(filter).init();
    }

    match cli.command {
        Command::Serve {
            config,
            port,
            data_dir,
        } => {
            let mut cfg = match config {
                Some(path) => RsmConfig::from_file(&path)?,
                None => RsmConfig::default(),
            };
            if let Some(port) = port {
                cfg.server.port = port;
            }
            if data_dir.is_some() {
                cfg.state.data_dir = data_dir;
            }
            run_serve(cfg).await
        }
    }
}

async fn run_serve(cfg: RsmConfig) -> anyhow::Result<()> {
    info!("RAN slice manager starting");

    // ── Initialize subsystems ──────────────────────────────────

    let state = match &cfg.state.data_dir {
        Some(dir) => {
            std::fs::create_dir_all(dir)?;
            let db_path = dir.join("rsm.redb");
            let state = StateStore::open(&db_path)?;
            info!(path = ?db_path, "state store opened");
            state
        }
        None => {
            warn!("no data dir configured, slice state is kept in memory");
            StateStore::open_in_memory()?
        }
    };

    let topology = Arc::new(TopoRegistry::new(state.clone()));
    for node in &cfg.nodes {
        topology.register(&node.id, &node.address, BTreeMap::new())?;
    }
    info!(nodes = cfg.nodes.len(), "topology loaded");

    let ran = LoopbackRan::new().with_latency(cfg.ran_latency());
    let orchestrator = Arc::new(Orchestrator::new(
        Collaborators {
            directory: topology.clone(),
            slices: Arc::new(state.clone()),
            associations: Arc::new(state),
            ran: Arc::new(ran),
        },
        cfg.orchestrator(),
    ));
    info!(
        queue_capacity = cfg.slicing.queue_capacity,
        request_timeout_ms = cfg.slicing.request_timeout_ms,
        "orchestrator initialized"
    );

    // ── Shutdown signal ────────────────────────────────────────

    let (shutdown_tx, shutdown_rx) = watch::channel(false);

    // ── Start background tasks ─────────────────────────────────

    let watch_handle = {
        let orchestrator = orchestrator.clone();
        let events = topology.watch();
        tokio::spawn(async move { orchestrator.watch_nodes(events, shutdown_rx).await })
    };

    // ── Start API server ───────────────────────────────────────

    let router = rsm_api::build_router(orchestrator.clone(), topology);
    let addr = SocketAddr::from(([0, 0, 0, 0], cfg.server.port));

    info!(%addr, "API server starting");

    let listener = tokio::net::TcpListener::bind(addr).await?;

    let server = axum::serve(listener, router).with_graceful_shutdown(async move {
        if let Err(e) = tokio::signal::ctrl_c().await {
            warn!(error = %e, "failed to listen for ctrl-c");
        }
        info!("shutdown signal received");
        let _ = shutdown_tx.send(true);
    });

    server.await?;

    if let Err(e) = watch_handle.await {
        warn!(error = %e, "node watch task failed");
    }
    orchestrator.shutdown().await;

    info!("RAN slice manager stopped");
    Ok(())
}
