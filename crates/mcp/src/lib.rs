#![forbid(unsafe_code)]

//! ThinkTrail MCP server: a sequential-thinking tool surface over durable sessions, served on
//! stdio (one implicit session) or HTTP (one isolated session per `mcp-session-id`).

pub mod config;
mod entry;
mod handlers;
mod server;
mod support;

pub use config::{Backend, Config, Transport};
pub use entry::http::{HttpState, ServeError, router, serve_http, spawn_idle_reaper};
pub use entry::stdio::{run_stdio, serve_stream};
pub use server::McpServer;
pub use support::{JsonRpcRequest, build_fingerprint, install_crash_reporter};

pub(crate) use support::*;

// Kept at the widely deployed baseline; clients negotiate down to it.
pub const MCP_VERSION: &str = "2024-11-05";
pub const SERVER_NAME: &str = "thinktrail-mcp";
pub const SERVER_VERSION: &str = env!("CARGO_PKG_VERSION");

pub const SESSION_HEADER: &str = "mcp-session-id";
