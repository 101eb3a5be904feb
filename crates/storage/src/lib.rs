#![forbid(unsafe_code)]

mod clock;
mod documents;
mod events;
mod render;
mod storage;
mod store;

pub use clock::{rfc3339_from_ms, unix_ms_now};
pub use documents::{
    Collection, DocumentStore, FsDocumentStore, MemoryDocumentStore, SqliteDocumentStore,
};
pub use events::{EventSink, NoopEventSink, RecordingEventSink, StoreEvent, TracingEventSink};
pub use render::{DocumentationRenderer, MarkdownRenderer};
pub use storage::{DocumentStorage, Storage};
pub use store::{
    DocumentationArtifact, SessionContext, SessionRecord, SessionStore, SessionSummary,
    StoreError, TaskCommit, TaskRecord, ThoughtRecord,
};
