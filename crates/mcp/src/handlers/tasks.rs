#![forbid(unsafe_code)]

use crate::McpServer;
use serde_json::{Value, json};
use tt_core::{TaskId, TaskStatus};
use tt_storage::TaskRecord;

fn task_json(task: &TaskRecord) -> Value {
    serde_json::to_value(task).unwrap_or_else(|_| json!({ "taskId": task.task_id.as_str() }))
}

pub(super) fn handle_create_task(server: &mut McpServer, args: Value) -> Value {
    let parsed = crate::args_object(&args).and_then(|obj| {
        Ok((
            super::resolve_session(server, obj)?,
            crate::require_string(obj, "title")?,
            crate::optional_string(obj, "description")?,
        ))
    });
    let (session_id, title, description) = match parsed {
        Ok(v) => v,
        Err(resp) => return resp,
    };
    match server.store.create_task(&session_id, &title, description) {
        Ok(task) => crate::ai_ok("create_task", json!({ "task": task_json(&task) })),
        Err(err) => crate::store_error(&err),
    }
}

pub(super) fn handle_update_task(server: &mut McpServer, args: Value) -> Value {
    let parsed = crate::args_object(&args).and_then(|obj| {
        let task_id = crate::require_string(obj, "taskId")?;
        let task_id = TaskId::try_new(&task_id)
            .map_err(|err| crate::ai_error("INVALID_INPUT", &format!("taskId: {err}")))?;
        let status = crate::require_string(obj, "status")?;
        let Some(status) = TaskStatus::parse(&status) else {
            return Err(crate::ai_error(
                "INVALID_INPUT",
                "status must be one of: pending|in_progress|completed",
            ));
        };
        Ok((
            super::resolve_session(server, obj)?,
            task_id,
            status,
            crate::optional_positive_u32(obj, "completedAtThought")?,
        ))
    });
    let (session_id, task_id, status, completed_at_thought) = match parsed {
        Ok(v) => v,
        Err(resp) => return resp,
    };

    match server
        .store
        .update_task_status(&session_id, &task_id, status, completed_at_thought)
    {
        Ok(true) => crate::ai_ok(
            "update_task",
            json!({ "updated": true, "taskId": task_id.as_str(), "status": status.as_str() }),
        ),
        Ok(false) => crate::ai_ok_with_warnings(
            "update_task",
            json!({ "updated": false, "taskId": task_id.as_str() }),
            vec![crate::warning(
                "TASK_NOT_UPDATED",
                "task not found, or the status change would move it backwards",
                "Task status only moves forward: pending, in_progress, completed.",
            )],
        ),
        Err(err) => crate::store_error(&err),
    }
}
