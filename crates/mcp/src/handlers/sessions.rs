#![forbid(unsafe_code)]

use crate::McpServer;
use serde_json::{Value, json};
use tt_storage::{DocumentationArtifact, rfc3339_from_ms};

fn documentation_json(doc: &DocumentationArtifact) -> Value {
    json!({
        "summary": doc.summary,
        "generatedAt": rfc3339_from_ms(doc.generated_at_ms),
        "thoughtCount": doc.thought_count,
        "completedTaskCount": doc.completed_task_count,
        "openTaskCount": doc.open_task_count,
        "branches": doc.branches,
        "body": doc.body,
    })
}

pub(super) fn handle_get_context(server: &mut McpServer, args: Value) -> Value {
    let session_id =
        match crate::args_object(&args).and_then(|obj| super::resolve_session(server, obj)) {
            Ok(v) => v,
            Err(resp) => return resp,
        };
    match server.store.get_context(&session_id) {
        Ok(context) => match serde_json::to_value(&context) {
            Ok(value) => crate::ai_ok("get_context", value),
            Err(err) => crate::ai_error("STORE_ERROR", &format!("serialize context: {err}")),
        },
        Err(err) => crate::store_error(&err),
    }
}

pub(super) fn handle_list_sessions(server: &mut McpServer) -> Value {
    let sessions = server
        .store
        .list_sessions()
        .into_iter()
        .map(|s| {
            json!({
                "id": s.id.as_str(),
                "createdAt": rfc3339_from_ms(s.created_at_ms),
                "thoughtCount": s.thought_count,
                "taskCount": s.task_count,
                "status": s.status.as_str(),
            })
        })
        .collect::<Vec<_>>();
    crate::ai_ok(
        "list_sessions",
        json!({ "count": sessions.len(), "sessions": sessions }),
    )
}

pub(super) fn handle_finalize_session(server: &mut McpServer, args: Value) -> Value {
    let session_id =
        match crate::args_object(&args).and_then(|obj| super::resolve_session(server, obj)) {
            Ok(v) => v,
            Err(resp) => return resp,
        };
    match server
        .store
        .finalize_session(&session_id, server.renderer.as_ref())
    {
        Ok(doc) => crate::ai_ok(
            "finalize_session",
            json!({
                "sessionId": session_id.as_str(),
                "status": tt_core::SessionStatus::Completed.as_str(),
                "documentation": documentation_json(&doc),
            }),
        ),
        Err(err) => crate::store_error(&err),
    }
}
