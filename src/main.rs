use std::path::PathBuf;

use rmcp::{ServiceExt, transport::stdio};

use vidshift::config::Config;
use vidshift::server::VidshiftServer;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // stdout carries the MCP transport; logs go to stderr.
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::from_default_env()
                .add_directive(tracing::Level::INFO.into()),
        )
        .with_writer(std::io::stderr)
        .with_ansi(false)
        .init();

    load_dotenv();

    tracing::info!("vidshift starting");

    let config = Config::load()?;
    tracing::info!(
        api_base = config.api.base_url,
        interval_ms = config.poll.interval().as_millis() as u64,
        max_attempts = config.poll.max_attempts(),
        "configuration loaded"
    );
    let server = VidshiftServer::new(config)?;

    let service = server
        .serve(stdio())
        .await
        .inspect_err(|e| tracing::error!("serving error: {e:?}"))?;

    service.waiting().await?;

    tracing::info!("vidshift shutting down");
    Ok(())
}

/// MCP hosts launch servers from arbitrary working directories, so look for
/// `.env` beside the binary first, then at the project root of a `target/<profile>`
/// build, and only then in the current directory.
fn load_dotenv() {
    let beside_binary: Vec<PathBuf> = std::env::current_exe()
        .ok()
        .and_then(|exe| exe.parent().map(|dir| vec![dir.join(".env"), dir.join("../../.env")]))
        .unwrap_or_default();

    let loaded = match beside_binary.iter().find(|path| path.exists()) {
        Some(path) => dotenvy::from_path(path).map(|()| path.clone()),
        None => dotenvy::dotenv(),
    };
    match loaded {
        Ok(path) => tracing::debug!(path = %path.display(), "loaded .env"),
        Err(e) if e.not_found() => {}
        Err(e) => tracing::warn!("ignoring unreadable .env: {e}"),
    }
}
