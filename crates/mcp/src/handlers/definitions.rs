#![forbid(unsafe_code)]

use serde_json::{Value, json};

fn session_id_property() -> Value {
    json!({
        "type": "string",
        "description": "Store session id. Defaults to the session of the last submitted thought."
    })
}

fn sequential_thinking_schema() -> Value {
    json!({
        "type": "object",
        "properties": {
            "thought": { "type": "string", "description": "The current thinking step." },
            "thoughtNumber": { "type": "integer", "minimum": 1 },
            "totalThoughts": { "type": "integer", "minimum": 1, "description": "Current estimate; widened automatically when exceeded." },
            "nextThoughtNeeded": { "type": "boolean" },
            "isRevision": { "type": "boolean" },
            "revisesThought": { "type": "integer", "minimum": 1 },
            "branchFromThought": { "type": "integer", "minimum": 1 },
            "branchId": { "type": "string" },
            "needsMoreThoughts": { "type": "boolean" },
            "sessionId": session_id_property(),
            "taskCommit": {
                "type": "object",
                "description": "Marks a task completed at this thought. Without a known taskId a title is required.",
                "properties": {
                    "taskId": { "type": "string" },
                    "title": { "type": "string" },
                    "description": { "type": "string" }
                }
            }
        },
        "required": ["thought", "thoughtNumber", "totalThoughts", "nextThoughtNeeded"]
    })
}

pub(crate) fn tool_definitions() -> Vec<Value> {
    vec![
        json!({
            "name": "sequential_thinking",
            "description": "Record one step of a reflective, revisable reasoning process. Steps may revise earlier thoughts or branch from them; the session is finalized into a summary once nextThoughtNeeded is false.",
            "inputSchema": sequential_thinking_schema(),
        }),
        json!({
            "name": "get_context",
            "description": "Session metadata with every persisted thought, task and the generated documentation.",
            "inputSchema": {
                "type": "object",
                "properties": { "sessionId": session_id_property() }
            },
        }),
        json!({
            "name": "list_sessions",
            "description": "Summaries of all stored sessions, oldest first.",
            "inputSchema": { "type": "object", "properties": {} },
        }),
        json!({
            "name": "create_task",
            "description": "Add a pending task to a session.",
            "inputSchema": {
                "type": "object",
                "properties": {
                    "sessionId": session_id_property(),
                    "title": { "type": "string" },
                    "description": { "type": "string" }
                },
                "required": ["title"]
            },
        }),
        json!({
            "name": "update_task",
            "description": "Move a task forward: pending, in_progress, completed.",
            "inputSchema": {
                "type": "object",
                "properties": {
                    "sessionId": session_id_property(),
                    "taskId": { "type": "string" },
                    "status": { "type": "string", "enum": ["pending", "in_progress", "completed"] },
                    "completedAtThought": { "type": "integer", "minimum": 1 }
                },
                "required": ["taskId", "status"]
            },
        }),
        json!({
            "name": "finalize_session",
            "description": "Generate the session documentation and mark the session completed. Safe to repeat.",
            "inputSchema": {
                "type": "object",
                "properties": { "sessionId": session_id_property() }
            },
        }),
    ]
}
