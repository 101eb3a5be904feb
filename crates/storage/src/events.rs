#![forbid(unsafe_code)]

use serde::Serialize;
use std::sync::{Mutex, PoisonError};
use tt_core::{SessionId, TaskId, TaskStatus};

#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum StoreEvent {
    SessionCreated {
        session_id: SessionId,
    },
    ThoughtRecorded {
        session_id: SessionId,
        seq: u64,
        thought_number: u32,
    },
    TaskCreated {
        session_id: SessionId,
        task_id: TaskId,
    },
    TaskCommitted {
        session_id: SessionId,
        task_id: TaskId,
        task_count: u64,
    },
    TaskStatusChanged {
        session_id: SessionId,
        task_id: TaskId,
        status: TaskStatus,
    },
    SessionCompleted {
        session_id: SessionId,
    },
    DocumentationGenerated {
        session_id: SessionId,
    },
}

impl StoreEvent {
    pub fn session_id(&self) -> &SessionId {
        match self {
            Self::SessionCreated { session_id }
            | Self::ThoughtRecorded { session_id, .. }
            | Self::TaskCreated { session_id, .. }
            | Self::TaskCommitted { session_id, .. }
            | Self::TaskStatusChanged { session_id, .. }
            | Self::SessionCompleted { session_id }
            | Self::DocumentationGenerated { session_id } => session_id,
        }
    }
}

/// Downstream fan-out for store mutations. Emission happens after the write succeeded and must
/// not fail the mutation.
pub trait EventSink: Send + Sync {
    fn emit(&self, event: &StoreEvent);
}

#[derive(Clone, Copy, Debug, Default)]
pub struct NoopEventSink;

impl EventSink for NoopEventSink {
    fn emit(&self, _event: &StoreEvent) {}
}

#[derive(Clone, Copy, Debug, Default)]
pub struct TracingEventSink;

impl EventSink for TracingEventSink {
    fn emit(&self, event: &StoreEvent) {
        tracing::debug!(session_id = %event.session_id(), ?event, "store event");
    }
}

/// Keeps every event in memory.
#[derive(Debug, Default)]
pub struct RecordingEventSink {
    events: Mutex<Vec<StoreEvent>>,
}

impl RecordingEventSink {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn events(&self) -> Vec<StoreEvent> {
        self.events
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .clone()
    }
}

impl EventSink for RecordingEventSink {
    fn emit(&self, event: &StoreEvent) {
        self.events
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .push(event.clone());
    }
}
