#![forbid(unsafe_code)]

//! Whole-document persistence: one partition per session, one serialized document per
//! collection. Backends know nothing about the shape of the documents they hold.

mod fs;
mod memory;
mod sqlite;

pub use fs::FsDocumentStore;
pub use memory::MemoryDocumentStore;
pub use sqlite::SqliteDocumentStore;

use crate::store::StoreError;
use tt_core::SessionId;

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum Collection {
    Session,
    Thoughts,
    Tasks,
    Documentation,
}

impl Collection {
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Session => "session",
            Self::Thoughts => "thoughts",
            Self::Tasks => "tasks",
            Self::Documentation => "documentation",
        }
    }
}

/// Raw document access. No locking and no transactions: a `write` replaces the whole document,
/// so two read-modify-write cycles racing on one document keep only the later write.
pub trait DocumentStore: Send + Sync {
    fn read(
        &self,
        partition: &SessionId,
        collection: Collection,
    ) -> Result<Option<String>, StoreError>;

    fn write(
        &self,
        partition: &SessionId,
        collection: Collection,
        body: &str,
    ) -> Result<(), StoreError>;

    fn remove_partition(&self, partition: &SessionId) -> Result<(), StoreError>;

    /// Partitions holding a session document.
    fn partitions(&self) -> Result<Vec<SessionId>, StoreError>;
}
