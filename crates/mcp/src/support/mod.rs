#![forbid(unsafe_code)]

mod ai;
mod args;
mod build_info;
mod crash;
mod jsonrpc;

pub(crate) use ai::*;
pub(crate) use args::*;
pub use build_info::build_fingerprint;
pub use crash::install_crash_reporter;
pub use jsonrpc::JsonRpcRequest;
pub(crate) use jsonrpc::*;
