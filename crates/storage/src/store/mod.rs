#![forbid(unsafe_code)]

mod error;
mod records;
mod sessions;
mod tasks;
mod thoughts;

pub use error::StoreError;
pub use records::*;

use crate::events::{EventSink, StoreEvent};
use crate::storage::Storage;
use std::collections::HashMap;
use std::sync::{Arc, Mutex, PoisonError};
use tt_core::SessionId;

/// Session, thought and task bookkeeping on top of a [`Storage`].
///
/// Storage does whole-document rewrites with no locking, so every mutation of a session runs
/// under that session's mutex. Different sessions never contend. Reads are not serialized.
pub struct SessionStore {
    storage: Arc<dyn Storage>,
    events: Arc<dyn EventSink>,
    locks: Mutex<HashMap<SessionId, Arc<Mutex<()>>>>,
}

impl SessionStore {
    pub fn new(storage: Arc<dyn Storage>, events: Arc<dyn EventSink>) -> Self {
        Self {
            storage,
            events,
            locks: Mutex::new(HashMap::new()),
        }
    }

    fn session_lock(&self, id: &SessionId) -> Arc<Mutex<()>> {
        let mut locks = self.locks.lock().unwrap_or_else(PoisonError::into_inner);
        Arc::clone(locks.entry(id.clone()).or_default())
    }

    /// Runs `f` while holding the mutation lock of `id`.
    ///
    /// The table entry is dropped again once no other caller holds or waits on it.
    fn with_session_lock<T>(&self, id: &SessionId, f: impl FnOnce() -> T) -> T {
        let lock = self.session_lock(id);
        let out = {
            let _guard = lock.lock().unwrap_or_else(PoisonError::into_inner);
            f()
        };
        let mut locks = self.locks.lock().unwrap_or_else(PoisonError::into_inner);
        // Clones are only taken under the table mutex: two owners means the table and us.
        if Arc::strong_count(&lock) == 2 {
            locks.remove(id);
        }
        out
    }

    #[cfg(test)]
    fn lock_table_len(&self) -> usize {
        self.locks.lock().unwrap_or_else(PoisonError::into_inner).len()
    }

    fn require_session(&self, id: &SessionId) -> Result<SessionRecord, StoreError> {
        self.storage
            .get_session(id)?
            .ok_or_else(|| StoreError::UnknownSession(id.clone()))
    }

    fn emit(&self, event: StoreEvent) {
        self.events.emit(&event);
    }
}
