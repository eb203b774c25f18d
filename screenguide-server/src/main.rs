use std::path::PathBuf;
use std::sync::Arc;

use anyhow::Context;
use clap::Parser;
use tracing_subscriber::EnvFilter;

use screenguide_runtime::config_store::ConfigStore;
use screenguide_runtime::debug_store::DebugStore;
use screenguide_runtime::defaults::default_config_path;
use screenguide_runtime::secrets::{Secrets, load_dotenv};
use screenguide_runtime::{build_engine_from_config, prior_context_from_config};
use screenguide_server::{AppState, router};

#[derive(Debug, Parser)]
#[command(
    name = "screenguide-server",
    about = "Voice-driven next-step advice for phone screens"
)]
struct Args {
    /// Config JSON (default: $SCREENGUIDE_CONFIG or ./screenguide.json).
    #[arg(long)]
    config: Option<PathBuf>,

    /// Listen address, overriding config and $SCREENGUIDE_BIND.
    #[arg(long)]
    bind: Option<String>,

    /// Save every request's uploads and results under this directory.
    #[arg(long)]
    debug_dir: Option<PathBuf>,
}

fn init_tracing() {
    // `log` records from the library crates are forwarded by the subscriber.
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .init();
}

async fn shutdown_signal() {
    if let Err(e) = tokio::signal::ctrl_c().await {
        tracing::error!("failed to listen for ctrl-c: {e}");
        std::future::pending::<()>().await;
    }
    tracing::info!("shutting down");
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Before tracing so RUST_LOG may come from .env.
    load_dotenv();
    init_tracing();
    let args = Args::parse();

    let store = ConfigStore::at_path(args.config.unwrap_or_else(default_config_path));
    let mut cfg = store.load_with_env()?;
    if let Some(bind) = args.bind {
        cfg.server.bind_addr = bind;
    }
    if let Some(dir) = args.debug_dir {
        cfg.debug.enabled = true;
        cfg.debug.dir = dir;
    }

    let secrets = Secrets::from_env();
    tracing::info!(
        ?secrets,
        language = %cfg.defaults.language,
        model = %cfg.defaults.reasoning_model,
        "configuration loaded"
    );

    let debug = DebugStore::from_config(&cfg.debug);
    if let Some(d) = &debug {
        tracing::info!("debug artifacts go to {}", d.dir().display());
    }

    let state = AppState {
        engine: Arc::new(build_engine_from_config(&cfg, &secrets)),
        prior_context: prior_context_from_config(&cfg)?,
        debug,
    };
    let app = router(state, &cfg.server);

    let listener = tokio::net::TcpListener::bind(&cfg.server.bind_addr)
        .await
        .with_context(|| format!("bind {}", cfg.server.bind_addr))?;
    tracing::info!("listening on {}", listener.local_addr()?);

    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await
        .context("serve")?;
    Ok(())
}
