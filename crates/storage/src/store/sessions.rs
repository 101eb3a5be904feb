#![forbid(unsafe_code)]

use super::{
    DocumentationArtifact, SessionContext, SessionRecord, SessionStore, SessionSummary, StoreError,
};
use crate::events::StoreEvent;
use crate::render::DocumentationRenderer;
use tt_core::{SessionId, SessionStatus};

impl SessionStore {
    /// Returns `requested` when it names a stored session; otherwise creates a fresh session
    /// under a newly generated id. Never fails: storage trouble is logged, and a failed create
    /// surfaces later as an unknown session on the first write.
    pub fn ensure_session(&self, requested: Option<&str>) -> SessionId {
        if let Some(raw) = requested {
            match SessionId::try_new(raw) {
                Ok(id) => match self.storage.get_session(&id) {
                    Ok(Some(_)) => return id,
                    Ok(None) => {
                        tracing::debug!(requested = %id, "requested session not found; creating a new one");
                    }
                    Err(err) => {
                        tracing::warn!(requested = %id, error = %err, "session lookup failed; creating a new one");
                    }
                },
                Err(err) => {
                    tracing::debug!(requested = raw, error = %err, "malformed session id; creating a new one");
                }
            }
        }

        let id = SessionId::generate();
        let record = SessionRecord::new(id.clone(), crate::unix_ms_now());
        match self.storage.create_session(&record) {
            Ok(()) => {
                tracing::info!(session_id = %id, "session created");
                self.emit(StoreEvent::SessionCreated {
                    session_id: id.clone(),
                });
            }
            Err(err) => {
                tracing::warn!(session_id = %id, error = %err, "failed to create session");
            }
        }
        id
    }

    pub fn get_session(&self, id: &SessionId) -> Result<Option<SessionRecord>, StoreError> {
        self.storage.get_session(id)
    }

    pub fn get_context(&self, id: &SessionId) -> Result<SessionContext, StoreError> {
        let session = self.require_session(id)?;
        Ok(SessionContext {
            thoughts: self.storage.list_thoughts(id)?,
            tasks: self.storage.list_tasks(id)?,
            documentation: self.storage.get_documentation(id)?,
            session,
        })
    }

    /// Summaries ordered by creation time, then id.
    ///
    /// Enumeration failures degrade to an empty list (logged at warn) rather than an error.
    pub fn list_sessions(&self) -> Vec<SessionSummary> {
        let mut sessions = match self.storage.list_sessions() {
            Ok(v) => v,
            Err(err) => {
                tracing::warn!(error = %err, "listing sessions failed; returning an empty list");
                return Vec::new();
            }
        };
        sessions.sort_by(|a, b| {
            a.created_at_ms
                .cmp(&b.created_at_ms)
                .then_with(|| a.id.cmp(&b.id))
        });
        sessions.iter().map(SessionRecord::summary).collect()
    }

    /// Marks the session completed. Completion is terminal and repeat calls are no-ops.
    pub fn complete_session(&self, id: &SessionId) -> Result<SessionRecord, StoreError> {
        self.with_session_lock(id, || {
            let mut session = self.require_session(id)?;
            if session.status == SessionStatus::Completed {
                return Ok(session);
            }
            session.status = SessionStatus::Completed;
            session.updated_at_ms = crate::unix_ms_now();
            self.storage.update_session(&session)?;
            tracing::info!(session_id = %id, "session completed");
            self.emit(StoreEvent::SessionCompleted {
                session_id: id.clone(),
            });
            Ok(session)
        })
    }

    pub fn save_documentation(&self, artifact: &DocumentationArtifact) -> Result<(), StoreError> {
        self.with_session_lock(&artifact.session_id, || {
            self.require_session(&artifact.session_id)?;
            self.storage.save_documentation(artifact)
        })
    }

    pub fn get_documentation(
        &self,
        id: &SessionId,
    ) -> Result<Option<DocumentationArtifact>, StoreError> {
        self.storage.get_documentation(id)
    }

    /// Renders the session's history, stores the artifact (replacing any earlier one) and
    /// completes the session.
    pub fn finalize_session(
        &self,
        id: &SessionId,
        renderer: &dyn DocumentationRenderer,
    ) -> Result<DocumentationArtifact, StoreError> {
        let context = self.get_context(id)?;
        let artifact = renderer.render(&context, crate::unix_ms_now());
        self.save_documentation(&artifact)?;
        self.emit(StoreEvent::DocumentationGenerated {
            session_id: id.clone(),
        });
        self.complete_session(id)?;
        Ok(artifact)
    }
}
