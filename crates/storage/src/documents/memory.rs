#![forbid(unsafe_code)]

use super::{Collection, DocumentStore};
use crate::store::StoreError;
use std::collections::{BTreeSet, HashMap};
use std::sync::{Mutex, PoisonError};
use tt_core::SessionId;

/// Ephemeral backend: documents vanish with the process.
#[derive(Debug, Default)]
pub struct MemoryDocumentStore {
    documents: Mutex<HashMap<(SessionId, Collection), String>>,
}

impl MemoryDocumentStore {
    pub fn new() -> Self {
        Self::default()
    }
}

impl DocumentStore for MemoryDocumentStore {
    fn read(
        &self,
        partition: &SessionId,
        collection: Collection,
    ) -> Result<Option<String>, StoreError> {
        let documents = self.documents.lock().unwrap_or_else(PoisonError::into_inner);
        Ok(documents.get(&(partition.clone(), collection)).cloned())
    }

    fn write(
        &self,
        partition: &SessionId,
        collection: Collection,
        body: &str,
    ) -> Result<(), StoreError> {
        let mut documents = self.documents.lock().unwrap_or_else(PoisonError::into_inner);
        documents.insert((partition.clone(), collection), body.to_string());
        Ok(())
    }

    fn remove_partition(&self, partition: &SessionId) -> Result<(), StoreError> {
        let mut documents = self.documents.lock().unwrap_or_else(PoisonError::into_inner);
        documents.retain(|(id, _), _| id != partition);
        Ok(())
    }

    fn partitions(&self) -> Result<Vec<SessionId>, StoreError> {
        let documents = self.documents.lock().unwrap_or_else(PoisonError::into_inner);
        let ids = documents
            .keys()
            .filter(|(_, collection)| *collection == Collection::Session)
            .map(|(id, _)| id.clone())
            .collect::<BTreeSet<_>>();
        Ok(ids.into_iter().collect())
    }
}
