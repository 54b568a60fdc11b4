//! Command-line client entry point.
mod app;
mod command;

use std::path::PathBuf;

use anyhow::Result;
use tracing_subscriber::layer::SubscriberExt;
use tracing_subscriber::util::SubscriberInitExt;

use app::WardrobeApp;
use command::{Command, USAGE};
use wardrobe_core::UserUid;
use wardrobe_runtime::{Clock, Runtime, RuntimeConfig};

#[tokio::main]
async fn main() -> Result<()> {
    // Load .env file if it exists (silently ignore if not found)
    let _ = dotenvy::dotenv();

    let command = match Command::parse(std::env::args().skip(1)) {
        Ok(command) => command,
        Err(err) => {
            eprintln!("{err}\n\n{USAGE}");
            std::process::exit(2);
        }
    };

    let mut config = RuntimeConfig::from_env();
    // One-shot commands do not need the background sweep; expired locks are
    // released by the next command that runs one.
    config.expiry_interval = std::time::Duration::ZERO;

    setup_logging()?;

    let enactor = std::env::var("WARDROBE_ENACTOR")
        .map(UserUid::new)
        .unwrap_or_else(|_| UserUid::new("self"));

    let runtime = Runtime::builder().config(config).build().await?;
    let pipeline = runtime.pipeline();
    pipeline.expire_due(pipeline.clock().now()).await?;

    WardrobeApp::new(runtime, enactor).execute(command).await
}

/// Setup logging to a file under the cache directory
fn setup_logging() -> Result<()> {
    let log_dir = get_log_directory();
    std::fs::create_dir_all(&log_dir)?;

    let file_appender = tracing_appender::rolling::never(&log_dir, "wardrobe.log");
    let (non_blocking_file, _guard) = tracing_appender::non_blocking(file_appender);

    let env_filter = tracing_subscriber::EnvFilter::from_default_env()
        .add_directive(tracing::Level::INFO.into());

    let file_layer = tracing_subscriber::fmt::layer()
        .with_writer(non_blocking_file)
        .with_ansi(false);

    // stdout is reserved for command output
    tracing_subscriber::registry()
        .with(env_filter)
        .with(file_layer)
        .init();

    // Leak the guard to keep file writer alive
    std::mem::forget(_guard);

    tracing::info!("Log file: {}/wardrobe.log", log_dir.display());

    Ok(())
}

/// Get the platform-specific log directory
fn get_log_directory() -> PathBuf {
    match directories::ProjectDirs::from("", "", "wardrobe") {
        Some(dirs) => dirs.cache_dir().join("logs"),
        None => PathBuf::from(".wardrobe").join("logs"),
    }
}
