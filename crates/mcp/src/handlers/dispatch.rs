#![forbid(unsafe_code)]

use crate::McpServer;
use serde_json::Value;

use super::{sessions, tasks, thinking};

pub(crate) fn dispatch_tool(server: &mut McpServer, name: &str, args: Value) -> Option<Value> {
    let resp = match name {
        "sequential_thinking" => thinking::handle_sequential_thinking(server, args),
        "get_context" => sessions::handle_get_context(server, args),
        "list_sessions" => sessions::handle_list_sessions(server),
        "finalize_session" => sessions::handle_finalize_session(server, args),
        "create_task" => tasks::handle_create_task(server, args),
        "update_task" => tasks::handle_update_task(server, args),
        _ => return None,
    };
    tracing::debug!(
        tool = name,
        success = resp.get("success").and_then(|v| v.as_bool()).unwrap_or(false),
        "tool call"
    );
    Some(resp)
}
