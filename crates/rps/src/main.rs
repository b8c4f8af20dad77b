//! Game Lab RPS - terminal entry point.

use std::cell::RefCell;
use std::rc::Rc;

use anyhow::Context;
use gamelab_engine::host::GameHost;
use gamelab_engine::infrastructure::RuntimeConfig;
use gamelab_rps::{handle_input, InputOutcome, RandomMoves, RpsConfig, RpsFactory, StdoutSink};
use tokio::io::{AsyncBufReadExt, BufReader};
use tokio::task::LocalSet;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

fn main() -> anyhow::Result<()> {
    load_dotenv_from_repo_root();

    // Logs go to stderr so they do not interleave with the game on stdout
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "gamelab_rps=info,gamelab_engine=info".into()),
        )
        .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
        .init();

    let runtime_config = RuntimeConfig::from_env()?;
    let rps_config = RpsConfig::from_env()?;
    tracing::info!(
        best_of = rps_config.best_of,
        history = runtime_config.history_capacity,
        "Starting rock-paper-scissors"
    );

    // Game state is Rc-based, so everything runs on one thread
    let runtime = tokio::runtime::Builder::new_current_thread()
        .enable_all()
        .build()
        .context("building tokio runtime")?;
    LocalSet::new().block_on(&runtime, run(runtime_config, rps_config))
}

async fn run(runtime_config: RuntimeConfig, rps_config: RpsConfig) -> anyhow::Result<()> {
    let factory = RpsFactory::new(
        rps_config,
        Rc::new(StdoutSink),
        Rc::new(RefCell::new(RandomMoves::new())),
    );
    let host = GameHost::new(factory, runtime_config);

    let cancel_token = host.cancellation_token();
    tokio::task::spawn_local({
        let cancel_token = cancel_token.clone();
        async move {
            if tokio::signal::ctrl_c().await.is_ok() {
                tracing::info!("Interrupted, shutting down");
                cancel_token.cancel();
            }
        }
    });

    if host.init().await?.is_none() {
        tracing::info!("Setup cancelled before the game started");
        return Ok(());
    }

    let mut lines = BufReader::new(tokio::io::stdin()).lines();
    loop {
        let line = tokio::select! {
            _ = cancel_token.cancelled() => break,
            line = lines.next_line() => line.context("reading stdin")?,
        };
        let Some(line) = line else {
            break;
        };
        match handle_input(&host, &line) {
            Ok(InputOutcome::Continue) => {}
            Ok(InputOutcome::Quit) => break,
            Err(err) if err.is_recoverable() => {
                tracing::warn!(error = %err, "Input rejected");
            }
            Err(err) => {
                host.destroy()?;
                return Err(err.into());
            }
        }
    }

    host.destroy()?;
    tracing::info!("Goodbye");
    Ok(())
}

fn load_dotenv_from_repo_root() {
    let repo_root = std::path::Path::new(env!("CARGO_MANIFEST_DIR"))
        .join("..")
        .join("..");

    // Prefer local overrides.
    for filename in [".env.local", ".env"] {
        let path = repo_root.join(filename);
        if path.exists() {
            let _ = dotenvy::from_path(path);
        }
    }
}
