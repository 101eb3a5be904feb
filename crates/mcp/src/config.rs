#![forbid(unsafe_code)]

use clap::{Parser, ValueEnum};
use std::path::PathBuf;
use std::time::Duration;

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, ValueEnum)]
pub enum Transport {
    /// One implicit session over stdin/stdout.
    #[default]
    Stdio,
    /// Multiplexed sessions over `/mcp`.
    Http,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, ValueEnum)]
pub enum Backend {
    /// `<storage-dir>/sessions/<id>/*.json`
    #[default]
    Fs,
    /// `<storage-dir>/thinktrail.db`
    Sqlite,
    /// Nothing survives the process.
    Memory,
}

/// Process configuration, read once at startup.
#[derive(Debug, Clone, Parser)]
#[command(
    name = "tt_mcp",
    version,
    about = "ThinkTrail MCP server: sequential thinking with durable sessions"
)]
pub struct Config {
    #[arg(long, value_enum, env = "THINKTRAIL_TRANSPORT", default_value_t = Transport::Stdio)]
    pub transport: Transport,

    #[arg(long, env = "THINKTRAIL_HOST", default_value = "127.0.0.1")]
    pub host: String,

    #[arg(long, env = "THINKTRAIL_PORT", default_value_t = 3000)]
    pub port: u16,

    #[arg(long, env = "THINKTRAIL_STORAGE_DIR", default_value = ".thinktrail")]
    pub storage_dir: PathBuf,

    #[arg(long, value_enum, env = "THINKTRAIL_BACKEND", default_value_t = Backend::Fs)]
    pub backend: Backend,

    /// Log to stderr. Off by default so stdio clients see a quiet process.
    #[arg(long, env = "THINKTRAIL_LOG_CONSOLE")]
    pub log_console: bool,

    /// `tracing` filter directive, e.g. `info` or `tt_storage=debug`.
    #[arg(long, env = "THINKTRAIL_LOG", default_value = "info")]
    pub log_level: String,

    /// Close HTTP sessions idle for longer than this. Unset or 0 keeps sessions until closed.
    #[arg(long, env = "THINKTRAIL_IDLE_TIMEOUT_SECS")]
    pub idle_timeout_secs: Option<u64>,
}

impl Config {
    pub fn idle_timeout(&self) -> Option<Duration> {
        self.idle_timeout_secs
            .filter(|secs| *secs > 0)
            .map(Duration::from_secs)
    }
}
