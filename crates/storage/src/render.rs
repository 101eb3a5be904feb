#![forbid(unsafe_code)]

use crate::store::{DocumentationArtifact, SessionContext};
use std::fmt::Write as _;
use tt_core::TaskStatus;

pub trait DocumentationRenderer: Send + Sync {
    fn render(&self, context: &SessionContext, generated_at_ms: i64) -> DocumentationArtifact;
}

#[derive(Clone, Copy, Debug, Default)]
pub struct MarkdownRenderer;

fn plural(count: u64, one: &str, many: &str) -> String {
    if count == 1 {
        format!("{count} {one}")
    } else {
        format!("{count} {many}")
    }
}

fn distinct_branches(context: &SessionContext) -> Vec<String> {
    let mut out: Vec<String> = Vec::new();
    for record in &context.thoughts {
        if let Some(tag) = record.thought.branch_id.as_ref()
            && !out.contains(tag)
        {
            out.push(tag.clone());
        }
    }
    out
}

impl DocumentationRenderer for MarkdownRenderer {
    fn render(&self, context: &SessionContext, generated_at_ms: i64) -> DocumentationArtifact {
        let session = &context.session;
        let branches = distinct_branches(context);
        let open_tasks = context
            .tasks
            .iter()
            .filter(|t| t.status != TaskStatus::Completed)
            .count() as u64;

        // Counts come from the durable session counters, not from the thought log length.
        let mut summary = format!(
            "Session {} recorded {} across {} with {}.",
            session.id,
            plural(session.thought_count, "thought", "thoughts"),
            plural(branches.len() as u64, "branch", "branches"),
            plural(session.task_count, "completed task", "completed tasks"),
        );
        if open_tasks > 0 {
            let _ = write!(summary, " {} still open.", plural(open_tasks, "task", "tasks"));
        }

        let mut body = String::new();
        let _ = writeln!(body, "# Reasoning session {}\n", session.id);
        let _ = writeln!(body, "_Generated {}_\n", crate::rfc3339_from_ms(generated_at_ms));
        let _ = writeln!(body, "## Summary\n\n{summary}\n");

        let _ = writeln!(body, "## Thoughts\n");
        if context.thoughts.is_empty() {
            let _ = writeln!(body, "_No thoughts recorded._");
        }
        for record in &context.thoughts {
            let t = &record.thought;
            let mut tags = Vec::new();
            if let Some(target) = t.revises_thought {
                tags.push(format!("revises {target}"));
            }
            if let Some(tag) = t.branch_id.as_deref() {
                match t.branch_from_thought {
                    Some(from) => tags.push(format!("branch {tag} from {from}")),
                    None => tags.push(format!("branch {tag}")),
                }
            }
            let suffix = if tags.is_empty() {
                String::new()
            } else {
                format!(" _({})_", tags.join(", "))
            };
            let _ = writeln!(
                body,
                "{}. **{}/{}**{} {}",
                record.seq,
                t.thought_number,
                t.total_thoughts,
                suffix,
                t.thought.trim()
            );
        }

        if !branches.is_empty() {
            let _ = writeln!(body, "\n## Branches\n");
            for tag in &branches {
                let _ = writeln!(body, "- {tag}");
            }
        }

        let _ = writeln!(body, "\n## Tasks\n");
        if context.tasks.is_empty() {
            let _ = writeln!(body, "_No tasks._");
        }
        for task in &context.tasks {
            let mark = if task.status == TaskStatus::Completed {
                "x"
            } else {
                " "
            };
            let _ = write!(body, "- [{mark}] {}", task.task_title);
            if let Some(n) = task.completed_at_thought {
                let _ = write!(body, " (thought {n})");
            }
            let _ = writeln!(body);
            if let Some(description) = task.description.as_deref() {
                let _ = writeln!(body, "  {}", description.trim());
            }
        }

        DocumentationArtifact {
            session_id: session.id.clone(),
            generated_at_ms,
            summary,
            thought_count: session.thought_count,
            completed_task_count: session.task_count,
            open_task_count: open_tasks,
            branches,
            body,
        }
    }
}
