#![forbid(unsafe_code)]

use crate::McpServer;
use serde_json::{Value, json};
use tt_core::{SessionId, TaskId};
use tt_storage::{StoreError, TaskCommit};

fn parse_task_commit(args: &crate::Args) -> Result<Option<TaskCommit>, Value> {
    let Some(obj) = crate::optional_object(args, "taskCommit")? else {
        return Ok(None);
    };
    let task_id = match crate::optional_string(obj, "taskId")? {
        Some(raw) => Some(
            TaskId::try_new(&raw)
                .map_err(|err| crate::ai_error("INVALID_INPUT", &format!("taskId: {err}")))?,
        ),
        None => None,
    };
    Ok(Some(TaskCommit {
        task_id,
        title: crate::optional_string(obj, "title")?,
        description: crate::optional_string(obj, "description")?,
    }))
}

fn store_warning(session_id: &SessionId, err: &StoreError, what: &str) -> Value {
    tracing::warn!(session_id = %session_id, error = %err, "{what} failed");
    crate::warning(
        err.code(),
        &format!("{what} failed: {}", crate::format_store_error(err)),
        "The reasoning step was accepted; resubmit later to persist it.",
    )
}

/// Engine first, then persistence. A store failure never discards the reasoning result: it is
/// reported as `persisted: false` with a warning.
pub(super) fn handle_sequential_thinking(server: &mut McpServer, args: Value) -> Value {
    let obj = match crate::args_object(&args) {
        Ok(v) => v,
        Err(resp) => return resp,
    };
    let requested_session = match crate::optional_string(obj, "sessionId") {
        Ok(v) => v,
        Err(resp) => return resp,
    };
    let task_commit = match parse_task_commit(obj) {
        Ok(v) => v,
        Err(resp) => return resp,
    };

    let outcome = match server.engine.submit_json(&args) {
        Ok(v) => v,
        Err(err) => {
            tracing::debug!(error = %err, "thought rejected");
            return crate::validation_error(&err);
        }
    };

    let requested = requested_session
        .or_else(|| server.session_id.as_ref().map(|id| id.to_string()));
    let session_id = server.store.ensure_session(requested.as_deref());
    server.session_id = Some(session_id.clone());

    let mut warnings = Vec::new();
    let mut persisted = true;

    if let Err(err) = server.store.persist_thought(&session_id, &outcome.recorded) {
        warnings.push(store_warning(&session_id, &err, "persisting thought"));
        persisted = false;
    }

    let mut task = None;
    if let Some(commit) = task_commit {
        match server
            .store
            .commit_task(&session_id, commit, Some(outcome.thought_number))
        {
            Ok(record) => task = Some(record),
            Err(StoreError::InvalidInput(msg)) => warnings.push(crate::warning(
                "TASK_NOT_COMMITTED",
                msg,
                "Pass taskCommit.title, or the taskId of an existing task.",
            )),
            Err(err) => {
                warnings.push(store_warning(&session_id, &err, "committing task"));
                persisted = false;
            }
        }
    }

    let mut documentation = None;
    if !outcome.next_thought_needed {
        match server
            .store
            .finalize_session(&session_id, server.renderer.as_ref())
        {
            Ok(artifact) => documentation = Some(artifact),
            Err(err) => {
                warnings.push(store_warning(&session_id, &err, "finalizing session"));
                persisted = false;
            }
        }
    }

    let mut result = json!({
        "thoughtNumber": outcome.thought_number,
        "totalThoughts": outcome.total_thoughts,
        "nextThoughtNeeded": outcome.next_thought_needed,
        "branches": outcome.branches,
        "thoughtHistoryLength": outcome.thought_history_length,
        "sessionId": session_id.as_str(),
        "persisted": persisted,
    });
    if let Some(obj) = result.as_object_mut() {
        if let Some(task) = task {
            obj.insert(
                "task".to_string(),
                json!({
                    "taskId": task.task_id.as_str(),
                    "title": task.task_title,
                    "status": task.status.as_str(),
                }),
            );
        }
        if let Some(doc) = documentation {
            obj.insert(
                "documentation".to_string(),
                json!({
                    "summary": doc.summary,
                    "generatedAt": tt_storage::rfc3339_from_ms(doc.generated_at_ms),
                }),
            );
        }
    }

    crate::ai_ok_with_warnings("sequential_thinking", result, warnings)
}
