mod audio;
pub mod config;
pub mod coordinator;
pub mod host;
pub mod location;
pub mod messages;
pub mod popup;
mod power;
pub mod runtime;
pub mod settings;
mod utils;
pub mod watcher;

use std::sync::Arc;

use anyhow::{Context, Result};
use tokio::io::{AsyncWriteExt, BufReader};

pub use audio::AlertPlayer;
pub use config::RuntimeConfig;
pub use power::ProcessKeepAwake;
use runtime::{Emitter, ExtensionRuntime};
use settings::JsonStateStore;

/// Runs the native host: events on stdin, outputs on stdout, logs on stderr.
pub fn run() -> Result<()> {
    let config = RuntimeConfig::from_env();

    // Initialize logging (reads RUST_LOG env var)
    env_logger::Builder::from_default_env()
        .filter_level(if config.debug {
            log::LevelFilter::Debug
        } else {
            log::LevelFilter::Info
        })
        .init();

    log::info!("orderbell starting up...");

    let runtime = tokio::runtime::Builder::new_multi_thread()
        .enable_all()
        .build()
        .context("Failed to start tokio runtime")?;
    runtime.block_on(serve(config))
}

async fn serve(config: RuntimeConfig) -> Result<()> {
    let store = Arc::new(JsonStateStore::new(config.state_path.clone())?);
    let sound = Arc::new(AlertPlayer::from_file(&config.alert_path, config.alert_volume)?);
    let power = Arc::new(ProcessKeepAwake::new());

    let (emitter, mut outputs) = Emitter::channel();
    let writer = tokio::spawn(async move {
        let mut stdout = tokio::io::stdout();
        while let Some(output) = outputs.recv().await {
            let mut line = serde_json::to_vec(&output)?;
            line.push(b'\n');
            stdout.write_all(&line).await?;
            stdout.flush().await?;
        }
        Ok::<(), anyhow::Error>(())
    });

    let mut host = ExtensionRuntime::new(store, power, sound, emitter);
    host.start().await;
    host.run_lines(BufReader::new(tokio::io::stdin())).await?;

    // Dropping the host closes the output channel once spawned handlers finish.
    drop(host);
    writer.await.context("output writer task failed to join")??;
    log::info!("orderbell shutting down");
    Ok(())
}
