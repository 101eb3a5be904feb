#![forbid(unsafe_code)]

use super::{SessionStore, StoreError, ThoughtRecord};
use crate::events::StoreEvent;
use tt_core::{SessionId, Thought};

impl SessionStore {
    /// Appends to the session's thought log and bumps `thoughtCount`.
    ///
    /// `seq` follows the stored log, so a counter left behind by a failed update is caught up on
    /// the next append. Nothing checks the counter against a live engine history.
    pub fn persist_thought(
        &self,
        id: &SessionId,
        thought: &Thought,
    ) -> Result<ThoughtRecord, StoreError> {
        self.with_session_lock(id, || {
            let mut session = self.require_session(id)?;
            let logged = self.storage.list_thoughts(id)?.len() as u64;
            let seq = logged.max(session.thought_count) + 1;
            let now = crate::unix_ms_now();
            let record = ThoughtRecord {
                session_id: id.clone(),
                seq,
                recorded_at_ms: now,
                thought: thought.clone(),
            };
            self.storage.append_thought(&record)?;

            session.thought_count = seq;
            session.updated_at_ms = now;
            self.storage.update_session(&session)?;

            tracing::debug!(
                session_id = %id,
                thought_number = thought.thought_number,
                seq = record.seq,
                "thought persisted"
            );
            self.emit(StoreEvent::ThoughtRecorded {
                session_id: id.clone(),
                seq: record.seq,
                thought_number: thought.thought_number,
            });
            Ok(record)
        })
    }

    pub fn list_thoughts(&self, id: &SessionId) -> Result<Vec<ThoughtRecord>, StoreError> {
        self.storage.list_thoughts(id)
    }
}
