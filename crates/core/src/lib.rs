#![forbid(unsafe_code)]

pub mod ids;
pub mod model;
pub mod thought;

pub use ids::{IdError, SessionId, TaskId};
pub use model::{SessionStatus, TaskStatus, Thought};
pub use thought::{EngineSnapshot, SubmitOutcome, ThoughtEngine, ThoughtInput, ValidationError};
