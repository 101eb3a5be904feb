#![forbid(unsafe_code)]

use anyhow::Context as _;
use clap::Parser as _;
use std::sync::Arc;
use tracing_subscriber::{EnvFilter, fmt, prelude::*};
use tt_mcp::{Backend, Config, HttpState, McpServer, Transport};
use tt_storage::{
    DocumentStorage, FsDocumentStore, MarkdownRenderer, MemoryDocumentStore, SessionStore,
    SqliteDocumentStore, Storage, TracingEventSink,
};

fn init_tracing(config: &Config) {
    // stdout carries the stdio protocol; logs only ever go to stderr, and only when asked.
    if !config.log_console {
        return;
    }
    let env_filter = EnvFilter::try_new(&config.log_level)
        .or_else(|_| EnvFilter::try_new("info"))
        .unwrap_or_default();
    tracing_subscriber::registry()
        .with(
            fmt::layer()
                .with_writer(std::io::stderr)
                .with_ansi(false)
                .with_target(false),
        )
        .with(env_filter)
        .init();
}

fn open_storage(config: &Config) -> anyhow::Result<Arc<dyn Storage>> {
    let dir = &config.storage_dir;
    let storage: Arc<dyn Storage> = match config.backend {
        Backend::Fs => Arc::new(DocumentStorage::new(
            FsDocumentStore::open(dir)
                .with_context(|| format!("open fs storage at {}", dir.display()))?,
        )),
        Backend::Sqlite => Arc::new(DocumentStorage::new(
            SqliteDocumentStore::open(dir)
                .with_context(|| format!("open sqlite storage at {}", dir.display()))?,
        )),
        Backend::Memory => Arc::new(DocumentStorage::new(MemoryDocumentStore::new())),
    };
    Ok(storage)
}

fn main() -> anyhow::Result<()> {
    let config = Config::parse();
    init_tracing(&config);
    tt_mcp::install_crash_reporter(config.storage_dir.clone());

    tracing::info!(
        build = %tt_mcp::build_fingerprint(),
        transport = ?config.transport,
        backend = ?config.backend,
        storage_dir = %config.storage_dir.display(),
        "starting"
    );

    let store = Arc::new(SessionStore::new(
        open_storage(&config)?,
        Arc::new(TracingEventSink),
    ));
    let renderer = Arc::new(MarkdownRenderer);

    match config.transport {
        Transport::Stdio => {
            let mut server = McpServer::new(store, renderer);
            tt_mcp::run_stdio(&mut server).context("stdio transport failed")?;
        }
        Transport::Http => {
            let runtime = tokio::runtime::Builder::new_multi_thread()
                .enable_all()
                .build()
                .context("build tokio runtime")?;
            let state = HttpState::new(store, renderer);
            runtime.block_on(tt_mcp::serve_http(
                &config.host,
                config.port,
                state,
                config.idle_timeout(),
            ))?;
        }
    }

    tracing::info!("stopped");
    Ok(())
}
