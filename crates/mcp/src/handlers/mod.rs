#![forbid(unsafe_code)]

mod definitions;
mod dispatch;
mod sessions;
mod tasks;
mod thinking;

pub(crate) use definitions::tool_definitions;
pub(crate) use dispatch::dispatch_tool;

use crate::McpServer;
use serde_json::Value;
use tt_core::SessionId;

/// Explicit `sessionId` argument, else the session this server last wrote to.
pub(super) fn resolve_session(
    server: &McpServer,
    args: &crate::Args,
) -> Result<SessionId, Value> {
    match crate::optional_string(args, "sessionId")? {
        Some(raw) => SessionId::try_new(&raw)
            .map_err(|err| crate::ai_error("INVALID_INPUT", &format!("sessionId: {err}"))),
        None => server.session_id.clone().ok_or_else(|| {
            crate::ai_error_with(
                "INVALID_INPUT",
                "sessionId is required",
                Some("Pass a sessionId from list_sessions, or submit a thought first."),
            )
        }),
    }
}
