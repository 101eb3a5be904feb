#![forbid(unsafe_code)]

use crate::model::Thought;
use serde_json::Value;

#[derive(Clone, Debug, PartialEq, Eq, thiserror::Error)]
pub enum ValidationError {
    #[error("arguments must be an object")]
    NotAnObject,
    #[error("{field} is required")]
    Missing { field: &'static str },
    #[error("{field} must be {expected}")]
    WrongType {
        field: &'static str,
        expected: &'static str,
    },
    #[error("{field} must not be empty")]
    Empty { field: &'static str },
    #[error("{field} must be a positive integer")]
    NotPositive { field: &'static str },
    #[error("revisesThought is required when isRevision is true")]
    RevisionWithoutTarget,
    #[error("{field} references thought {thought}, which is not in the history")]
    DanglingReference { field: &'static str, thought: u32 },
}

impl ValidationError {
    pub fn code(&self) -> &'static str {
        match self {
            Self::DanglingReference { .. } => "UNKNOWN_REFERENCE",
            _ => "INVALID_INPUT",
        }
    }
}

/// Loosely shaped tool arguments after strict per-field type checks.
///
/// Every field is optional here; [`ThoughtInput::validate`] decides what is required. Values are
/// never coerced: `"5"` is not an integer and `"true"` is not a boolean.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct ThoughtInput {
    pub thought: Option<String>,
    pub thought_number: Option<i64>,
    pub total_thoughts: Option<i64>,
    pub next_thought_needed: Option<bool>,
    pub is_revision: Option<bool>,
    pub revises_thought: Option<i64>,
    pub branch_from_thought: Option<i64>,
    pub branch_id: Option<String>,
    pub needs_more_thoughts: Option<bool>,
}

impl ThoughtInput {
    pub fn from_json(value: &Value) -> Result<Self, ValidationError> {
        let Some(obj) = value.as_object() else {
            return Err(ValidationError::NotAnObject);
        };
        Ok(Self {
            thought: string_field(obj, "thought")?,
            thought_number: integer_field(obj, "thoughtNumber")?,
            total_thoughts: integer_field(obj, "totalThoughts")?,
            next_thought_needed: bool_field(obj, "nextThoughtNeeded")?,
            is_revision: bool_field(obj, "isRevision")?,
            revises_thought: integer_field(obj, "revisesThought")?,
            branch_from_thought: integer_field(obj, "branchFromThought")?,
            branch_id: string_field(obj, "branchId")?,
            needs_more_thoughts: bool_field(obj, "needsMoreThoughts")?,
        })
    }

    pub fn validate(self) -> Result<Thought, ValidationError> {
        let thought = self
            .thought
            .ok_or(ValidationError::Missing { field: "thought" })?;
        if thought.trim().is_empty() {
            return Err(ValidationError::Empty { field: "thought" });
        }
        let thought_number = required_positive("thoughtNumber", self.thought_number)?;
        let total_thoughts = required_positive("totalThoughts", self.total_thoughts)?;
        let next_thought_needed = self.next_thought_needed.ok_or(ValidationError::Missing {
            field: "nextThoughtNeeded",
        })?;

        let revises_thought = optional_positive("revisesThought", self.revises_thought)?;
        let branch_from_thought = optional_positive("branchFromThought", self.branch_from_thought)?;
        if self.is_revision == Some(true) && revises_thought.is_none() {
            return Err(ValidationError::RevisionWithoutTarget);
        }

        let branch_id = match self.branch_id {
            Some(raw) if raw.trim().is_empty() => {
                return Err(ValidationError::Empty { field: "branchId" });
            }
            Some(raw) => Some(raw.trim().to_string()),
            None => None,
        };

        Ok(Thought {
            thought,
            thought_number,
            total_thoughts,
            next_thought_needed,
            is_revision: self.is_revision,
            revises_thought,
            branch_from_thought,
            branch_id,
            needs_more_thoughts: self.needs_more_thoughts,
        })
    }
}

/// Parses and validates a raw submission in one step.
pub fn parse_thought(value: &Value) -> Result<Thought, ValidationError> {
    ThoughtInput::from_json(value)?.validate()
}

fn string_field(
    obj: &serde_json::Map<String, Value>,
    field: &'static str,
) -> Result<Option<String>, ValidationError> {
    match obj.get(field) {
        None | Some(Value::Null) => Ok(None),
        Some(Value::String(v)) => Ok(Some(v.clone())),
        Some(_) => Err(ValidationError::WrongType {
            field,
            expected: "a string",
        }),
    }
}

fn integer_field(
    obj: &serde_json::Map<String, Value>,
    field: &'static str,
) -> Result<Option<i64>, ValidationError> {
    match obj.get(field) {
        None | Some(Value::Null) => Ok(None),
        Some(Value::Number(n)) => n.as_i64().map(Some).ok_or(ValidationError::WrongType {
            field,
            expected: "an integer",
        }),
        Some(_) => Err(ValidationError::WrongType {
            field,
            expected: "an integer",
        }),
    }
}

fn bool_field(
    obj: &serde_json::Map<String, Value>,
    field: &'static str,
) -> Result<Option<bool>, ValidationError> {
    match obj.get(field) {
        None | Some(Value::Null) => Ok(None),
        Some(Value::Bool(v)) => Ok(Some(*v)),
        Some(_) => Err(ValidationError::WrongType {
            field,
            expected: "a boolean",
        }),
    }
}

fn required_positive(field: &'static str, value: Option<i64>) -> Result<u32, ValidationError> {
    let value = value.ok_or(ValidationError::Missing { field })?;
    to_positive(field, value)
}

fn optional_positive(
    field: &'static str,
    value: Option<i64>,
) -> Result<Option<u32>, ValidationError> {
    value.map(|v| to_positive(field, v)).transpose()
}

fn to_positive(field: &'static str, value: i64) -> Result<u32, ValidationError> {
    u32::try_from(value)
        .ok()
        .filter(|v| *v > 0)
        .ok_or(ValidationError::NotPositive { field })
}
