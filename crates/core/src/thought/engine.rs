#![forbid(unsafe_code)]

use super::input::{ValidationError, parse_thought};
use crate::model::Thought;
use serde::Serialize;
use serde_json::Value;
use std::collections::HashMap;

#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct SubmitOutcome {
    pub thought_number: u32,
    pub total_thoughts: u32,
    pub next_thought_needed: bool,
    pub branches: Vec<String>,
    pub thought_history_length: usize,
    /// The thought as appended to history (with the widened total).
    #[serde(skip)]
    pub recorded: Thought,
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct EngineSnapshot {
    pub thought_history_length: usize,
    pub total_thoughts: u32,
    pub branches: Vec<String>,
    pub last_thought_number: Option<u32>,
    pub next_thought_needed: Option<bool>,
}

/// In-memory reasoning state for one live session.
///
/// History is append-only. A failed submission leaves every field untouched.
#[derive(Clone, Debug, Default)]
pub struct ThoughtEngine {
    history: Vec<Thought>,
    branch_order: Vec<String>,
    branches: HashMap<String, Vec<Thought>>,
    total_thoughts: u32,
}

impl ThoughtEngine {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn submit_json(&mut self, args: &Value) -> Result<SubmitOutcome, ValidationError> {
        let thought = parse_thought(args)?;
        self.submit(thought)
    }

    pub fn submit(&mut self, mut thought: Thought) -> Result<SubmitOutcome, ValidationError> {
        self.check_reference("revisesThought", thought.revises_thought)?;
        self.check_reference("branchFromThought", thought.branch_from_thought)?;

        // The estimate may grow (client raised it or a thought ran past it) but never shrinks.
        let total = self
            .total_thoughts
            .max(thought.total_thoughts)
            .max(thought.thought_number);
        self.total_thoughts = total;
        thought.total_thoughts = total;

        if let Some(tag) = thought.branch_id.clone() {
            if !self.branches.contains_key(&tag) {
                self.branch_order.push(tag.clone());
            }
            self.branches.entry(tag).or_default().push(thought.clone());
        }
        self.history.push(thought.clone());

        Ok(SubmitOutcome {
            thought_number: thought.thought_number,
            total_thoughts: total,
            next_thought_needed: thought.next_thought_needed,
            branches: self.branch_order.clone(),
            thought_history_length: self.history.len(),
            recorded: thought,
        })
    }

    fn check_reference(
        &self,
        field: &'static str,
        target: Option<u32>,
    ) -> Result<(), ValidationError> {
        let Some(target) = target else {
            return Ok(());
        };
        if self.history.iter().any(|t| t.thought_number == target) {
            return Ok(());
        }
        Err(ValidationError::DanglingReference {
            field,
            thought: target,
        })
    }

    pub fn history(&self) -> &[Thought] {
        &self.history
    }

    pub fn len(&self) -> usize {
        self.history.len()
    }

    pub fn is_empty(&self) -> bool {
        self.history.is_empty()
    }

    pub fn total_thoughts(&self) -> u32 {
        self.total_thoughts
    }

    /// Distinct branch tags in order of first appearance.
    pub fn branches(&self) -> &[String] {
        &self.branch_order
    }

    pub fn branch(&self, tag: &str) -> Option<&[Thought]> {
        self.branches.get(tag).map(Vec::as_slice)
    }

    pub fn snapshot(&self) -> EngineSnapshot {
        let last = self.history.last();
        EngineSnapshot {
            thought_history_length: self.history.len(),
            total_thoughts: self.total_thoughts,
            branches: self.branch_order.clone(),
            last_thought_number: last.map(|t| t.thought_number),
            next_thought_needed: last.map(|t| t.next_thought_needed),
        }
    }
}
