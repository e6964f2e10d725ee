//! Task agents with tool execution

mod context;
mod executor;

pub use context::TaskConversation;
pub use executor::{AgentOutcome, TaskAgent};
