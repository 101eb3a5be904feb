#![forbid(unsafe_code)]

use super::{SessionStore, StoreError, TaskCommit, TaskRecord};
use crate::events::StoreEvent;
use tt_core::{SessionId, TaskId, TaskStatus};

fn non_empty(value: Option<String>) -> Option<String> {
    value
        .map(|s| s.trim().to_string())
        .filter(|s| !s.is_empty())
}

impl SessionStore {
    /// Allocates a pending task. `taskCount` is left alone: it counts completions.
    pub fn create_task(
        &self,
        id: &SessionId,
        title: &str,
        description: Option<String>,
    ) -> Result<TaskRecord, StoreError> {
        let title = title.trim();
        if title.is_empty() {
            return Err(StoreError::InvalidInput("task title must not be empty"));
        }
        self.with_session_lock(id, || {
            let mut session = self.require_session(id)?;
            let now = crate::unix_ms_now();
            let task = TaskRecord {
                session_id: id.clone(),
                task_id: TaskId::generate(),
                task_title: title.to_string(),
                description: non_empty(description),
                status: TaskStatus::Pending,
                completed_at_thought: None,
                created_at_ms: now,
                completed_at_ms: None,
            };
            self.storage.create_task(&task)?;
            session.updated_at_ms = now;
            self.storage.update_session(&session)?;

            self.emit(StoreEvent::TaskCreated {
                session_id: id.clone(),
                task_id: task.task_id.clone(),
            });
            Ok(task)
        })
    }

    /// Completes a task (reusing `commit.task_id` when it exists) and increments `taskCount` by
    /// exactly one per call.
    pub fn commit_task(
        &self,
        id: &SessionId,
        commit: TaskCommit,
        completed_at_thought: Option<u32>,
    ) -> Result<TaskRecord, StoreError> {
        self.with_session_lock(id, || {
            let mut session = self.require_session(id)?;
            let now = crate::unix_ms_now();
            let title = non_empty(commit.title);
            let description = non_empty(commit.description);

            let existing = match commit.task_id.as_ref() {
                Some(task_id) => self.storage.get_task(id, task_id)?,
                None => None,
            };
            let task = match existing {
                Some(mut task) => {
                    if let Some(title) = title {
                        task.task_title = title;
                    }
                    if description.is_some() {
                        task.description = description;
                    }
                    task.status = TaskStatus::Completed;
                    task.completed_at_ms = Some(now);
                    if completed_at_thought.is_some() {
                        task.completed_at_thought = completed_at_thought;
                    }
                    self.storage.update_task(&task)?;
                    task
                }
                None => {
                    let Some(title) = title else {
                        return Err(StoreError::InvalidInput(
                            "task title is required when committing a new task",
                        ));
                    };
                    let task = TaskRecord {
                        session_id: id.clone(),
                        task_id: commit.task_id.unwrap_or_else(TaskId::generate),
                        task_title: title,
                        description,
                        status: TaskStatus::Completed,
                        completed_at_thought,
                        created_at_ms: now,
                        completed_at_ms: Some(now),
                    };
                    self.storage.create_task(&task)?;
                    task
                }
            };

            session.task_count += 1;
            session.updated_at_ms = now;
            self.storage.update_session(&session)?;

            tracing::info!(
                session_id = %id,
                task_id = %task.task_id,
                task_count = session.task_count,
                "task committed"
            );
            self.emit(StoreEvent::TaskCommitted {
                session_id: id.clone(),
                task_id: task.task_id.clone(),
                task_count: session.task_count,
            });
            Ok(task)
        })
    }

    /// Moves a task forward. Returns `Ok(false)` without writing when the task is unknown or
    /// the move would go backwards. Does not touch `taskCount`.
    pub fn update_task_status(
        &self,
        id: &SessionId,
        task_id: &TaskId,
        status: TaskStatus,
        completed_at_thought: Option<u32>,
    ) -> Result<bool, StoreError> {
        self.with_session_lock(id, || {
            self.require_session(id)?;
            let Some(mut task) = self.storage.get_task(id, task_id)? else {
                return Ok(false);
            };
            if !task.status.can_move_to(status) {
                tracing::debug!(
                    session_id = %id,
                    task_id = %task_id,
                    from = task.status.as_str(),
                    to = status.as_str(),
                    "ignoring backward task status change"
                );
                return Ok(false);
            }
            task.status = status;
            if status == TaskStatus::Completed && task.completed_at_ms.is_none() {
                task.completed_at_ms = Some(crate::unix_ms_now());
            }
            if completed_at_thought.is_some() {
                task.completed_at_thought = completed_at_thought;
            }
            if !self.storage.update_task(&task)? {
                return Ok(false);
            }
            self.emit(StoreEvent::TaskStatusChanged {
                session_id: id.clone(),
                task_id: task_id.clone(),
                status,
            });
            Ok(true)
        })
    }

    pub fn list_tasks(&self, id: &SessionId) -> Result<Vec<TaskRecord>, StoreError> {
        self.storage.list_tasks(id)
    }
}
