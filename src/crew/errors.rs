//! Errors raised by the crew

use super::tasks::TaskKind;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum CrewError {
    #[error("Please enter a topic before proceeding.")]
    EmptyTopic,

    /// A task failed; the whole run is abandoned
    #[error("{task} failed: {source:#}")]
    Task {
        task: TaskKind,
        #[source]
        source: anyhow::Error,
    },

    #[error("Unexpected crew output: expected {expected} task results, got {actual}")]
    ResultShape { expected: usize, actual: usize },

    #[error("Task {0} not found in the latest kickoff")]
    UnknownTask(String),
}
