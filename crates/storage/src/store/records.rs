#![forbid(unsafe_code)]

use serde::{Deserialize, Serialize};
use serde_json::Value;
use tt_core::{SessionId, SessionStatus, TaskId, TaskStatus, Thought};

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SessionRecord {
    pub id: SessionId,
    pub created_at_ms: i64,
    pub updated_at_ms: i64,
    pub status: SessionStatus,
    pub thought_count: u64,
    pub task_count: u64,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub metadata: Option<Value>,
}

impl SessionRecord {
    pub fn new(id: SessionId, now_ms: i64) -> Self {
        Self {
            id,
            created_at_ms: now_ms,
            updated_at_ms: now_ms,
            status: SessionStatus::Active,
            thought_count: 0,
            task_count: 0,
            metadata: None,
        }
    }

    pub fn summary(&self) -> SessionSummary {
        SessionSummary {
            id: self.id.clone(),
            created_at_ms: self.created_at_ms,
            thought_count: self.thought_count,
            task_count: self.task_count,
            status: self.status,
        }
    }
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SessionSummary {
    pub id: SessionId,
    pub created_at_ms: i64,
    pub thought_count: u64,
    pub task_count: u64,
    pub status: SessionStatus,
}

/// A thought as persisted in a session's thought log.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ThoughtRecord {
    pub session_id: SessionId,
    pub seq: u64,
    pub recorded_at_ms: i64,
    #[serde(flatten)]
    pub thought: Thought,
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TaskRecord {
    pub session_id: SessionId,
    pub task_id: TaskId,
    pub task_title: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    pub status: TaskStatus,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub completed_at_thought: Option<u32>,
    pub created_at_ms: i64,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub completed_at_ms: Option<i64>,
}

/// Completion request for [`SessionStore::commit_task`](super::SessionStore::commit_task).
///
/// With a `task_id` that already exists the task is reused; otherwise a new task is allocated
/// (under the given id when one is supplied) and `title` is required.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct TaskCommit {
    pub task_id: Option<TaskId>,
    pub title: Option<String>,
    pub description: Option<String>,
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DocumentationArtifact {
    pub session_id: SessionId,
    pub generated_at_ms: i64,
    pub summary: String,
    pub thought_count: u64,
    pub completed_task_count: u64,
    pub open_task_count: u64,
    pub branches: Vec<String>,
    pub body: String,
}

#[derive(Clone, Debug, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct SessionContext {
    pub session: SessionRecord,
    pub thoughts: Vec<ThoughtRecord>,
    pub tasks: Vec<TaskRecord>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub documentation: Option<DocumentationArtifact>,
}
