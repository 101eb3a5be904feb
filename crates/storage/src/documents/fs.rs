#![forbid(unsafe_code)]

use super::{Collection, DocumentStore};
use crate::store::StoreError;
use std::io::ErrorKind;
use std::path::{Path, PathBuf};
use tt_core::SessionId;

/// `<root>/sessions/<session id>/<collection>.json`
#[derive(Clone, Debug)]
pub struct FsDocumentStore {
    root: PathBuf,
}

impl FsDocumentStore {
    pub fn open(root: impl AsRef<Path>) -> Result<Self, StoreError> {
        let root = root.as_ref().to_path_buf();
        std::fs::create_dir_all(root.join("sessions"))?;
        Ok(Self { root })
    }

    fn partition_dir(&self, partition: &SessionId) -> PathBuf {
        self.root.join("sessions").join(partition.as_str())
    }

    fn document_path(&self, partition: &SessionId, collection: Collection) -> PathBuf {
        self.partition_dir(partition)
            .join(format!("{}.json", collection.as_str()))
    }
}

impl DocumentStore for FsDocumentStore {
    fn read(
        &self,
        partition: &SessionId,
        collection: Collection,
    ) -> Result<Option<String>, StoreError> {
        match std::fs::read_to_string(self.document_path(partition, collection)) {
            Ok(body) => Ok(Some(body)),
            Err(err) if err.kind() == ErrorKind::NotFound => Ok(None),
            Err(err) => Err(err.into()),
        }
    }

    fn write(
        &self,
        partition: &SessionId,
        collection: Collection,
        body: &str,
    ) -> Result<(), StoreError> {
        let dir = self.partition_dir(partition);
        std::fs::create_dir_all(&dir)?;
        let path = self.document_path(partition, collection);
        // Write aside then rename, so a torn write never replaces a good document.
        let tmp = dir.join(format!(".{}.json.tmp", collection.as_str()));
        std::fs::write(&tmp, body)?;
        std::fs::rename(&tmp, &path)?;
        Ok(())
    }

    fn remove_partition(&self, partition: &SessionId) -> Result<(), StoreError> {
        match std::fs::remove_dir_all(self.partition_dir(partition)) {
            Ok(()) => Ok(()),
            Err(err) if err.kind() == ErrorKind::NotFound => Ok(()),
            Err(err) => Err(err.into()),
        }
    }

    fn partitions(&self) -> Result<Vec<SessionId>, StoreError> {
        let sessions_dir = self.root.join("sessions");
        let entries = match std::fs::read_dir(&sessions_dir) {
            Ok(entries) => entries,
            Err(err) if err.kind() == ErrorKind::NotFound => return Ok(Vec::new()),
            Err(err) => return Err(err.into()),
        };

        let mut out = Vec::new();
        for entry in entries {
            let entry = entry?;
            if !entry.file_type()?.is_dir() {
                continue;
            }
            let Some(name) = entry.file_name().to_str().map(str::to_string) else {
                continue;
            };
            let Ok(id) = SessionId::try_new(name) else {
                continue;
            };
            if entry.path().join("session.json").is_file() {
                out.push(id);
            }
        }
        out.sort();
        Ok(out)
    }
}
