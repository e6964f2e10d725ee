//! Progress events emitted while a crew runs

use super::tasks::TaskKind;
use serde::Serialize;
use std::sync::Arc;

/// Events emitted during a kickoff, in execution order
#[derive(Debug, Clone, Serialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum CrewEvent {
    KickoffStarted {
        run_id: String,
        topic: String,
    },
    TaskStarted {
        task_id: String,
        task: TaskKind,
        agent: String,
    },
    /// Text the model produced alongside tool calls
    AgentThought {
        agent: String,
        text: String,
    },
    ToolCalled {
        agent: String,
        tool: String,
        input: serde_json::Value,
    },
    ToolFinished {
        agent: String,
        tool: String,
        success: bool,
        preview: String,
    },
    TaskCompleted {
        task_id: String,
        task: TaskKind,
        agent: String,
        output: String,
    },
    KickoffCompleted {
        run_id: String,
    },
}

impl CrewEvent {
    /// One-line human readable form for console and the web conversation panel
    pub fn summary(&self) -> String {
        match self {
            CrewEvent::KickoffStarted { topic, .. } => {
                format!("Crew started on: {}", first_line(topic))
            }
            CrewEvent::TaskStarted { task, agent, .. } => {
                format!("[{}] Working on {}", agent, task.heading())
            }
            CrewEvent::AgentThought { agent, text } => format!("[{}] Thought: {}", agent, text),
            CrewEvent::ToolCalled { agent, tool, input } => {
                format!("[{}] Using tool {} with {}", agent, tool, input)
            }
            CrewEvent::ToolFinished {
                agent,
                tool,
                success,
                preview,
            } => {
                let status = if *success { "returned" } else { "failed" };
                format!("[{}] Tool {} {}: {}", agent, tool, status, preview)
            }
            CrewEvent::TaskCompleted { task, agent, .. } => {
                format!("[{}] Finished {}", agent, task.heading())
            }
            CrewEvent::KickoffCompleted { .. } => "Crew finished".to_string(),
        }
    }
}

/// Callback invoked for every event; must be fast and non-blocking
pub type EventCallback = Arc<dyn Fn(CrewEvent) + Send + Sync>;

/// Callback that drops every event
pub fn silent() -> EventCallback {
    Arc::new(|_| {})
}

fn first_line(text: &str) -> &str {
    text.lines().next().unwrap_or("").trim()
}

/// Shorten tool output for progress display without splitting UTF-8 characters
pub(crate) fn preview(text: &str, max_chars: usize) -> String {
    let flat = text.replace('\n', " ");
    if flat.chars().count() <= max_chars {
        return flat;
    }
    let truncated: String = flat.chars().take(max_chars).collect();
    format!("{}...", truncated)
}
