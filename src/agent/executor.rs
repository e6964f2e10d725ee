//! Tool-calling agent that works one task for one role

use super::context::TaskConversation;
use crate::crew::events::{preview, CrewEvent, EventCallback};
use crate::crew::{Role, Task, TaskKind};
use crate::llm::{LlmError, LlmProvider, LlmResponse, TokenUsage};
use crate::tools::ToolRegistry;
use anyhow::Result;
use std::sync::Arc;

/// Tool calls honoured from a single model turn
const MAX_TOOL_CALLS_PER_ROUND: usize = 3;

/// Characters of tool output shown in progress events
const TOOL_PREVIEW_CHARS: usize = 160;

/// Final answer of an agent for one task
#[derive(Debug, Clone)]
pub struct AgentOutcome {
    pub text: String,
    pub tool_calls_made: usize,
    pub usage: TokenUsage,
}

pub struct TaskAgent {
    role: Role,
    llm: Arc<dyn LlmProvider>,
    tools: Arc<ToolRegistry>,
    max_tool_rounds: usize,
    guidance: Vec<String>,
}

impl TaskAgent {
    pub fn new(role: Role, llm: Arc<dyn LlmProvider>, tools: Arc<ToolRegistry>) -> Self {
        Self {
            role,
            llm,
            tools,
            max_tool_rounds: 2,
            guidance: Vec::new(),
        }
    }

    pub fn with_max_tool_rounds(mut self, rounds: usize) -> Self {
        self.max_tool_rounds = rounds;
        self
    }

    pub fn with_guidance(mut self, guidance: Vec<String>) -> Self {
        self.guidance = guidance;
        self
    }

    pub fn role(&self) -> &Role {
        &self.role
    }

    /// Work a task: the task prompt carries the topic and earlier outputs
    pub async fn execute(
        &self,
        task: &Task,
        topic: &str,
        context: &[(TaskKind, &str)],
        events: &EventCallback,
    ) -> Result<AgentOutcome> {
        let conversation = TaskConversation::new(
            self.role.system_prompt(&self.guidance),
            task.prompt(topic, context),
        );
        self.run(conversation, events).await
    }

    /// Rework an earlier answer to address reviewer feedback
    ///
    /// The original prompt is rebuilt with the same `context` so the
    /// revision still sees the earlier task outputs.
    pub async fn revise(
        &self,
        task: &Task,
        topic: &str,
        context: &[(TaskKind, &str)],
        previous: &str,
        feedback: &str,
        events: &EventCallback,
    ) -> Result<AgentOutcome> {
        let mut conversation = TaskConversation::new(
            self.role.system_prompt(&self.guidance),
            task.prompt(topic, context),
        );
        conversation.add_assistant(previous);
        conversation.add_user(format!(
            "A reviewer gave this feedback on your answer:\n{}\n\n\
             Rewrite your answer to address it, keeping the same format.",
            feedback
        ));
        self.run(conversation, events).await
    }

    async fn run(
        &self,
        mut conversation: TaskConversation,
        events: &EventCallback,
    ) -> Result<AgentOutcome> {
        let agent = self.role.title().to_string();
        let definitions = self.tools.definitions();
        let mut rounds = 0;
        let mut tool_calls_made = 0;
        let mut usage = TokenUsage::default();

        loop {
            let offer_tools = rounds < self.max_tool_rounds && !definitions.is_empty();
            let response = self
                .llm
                .chat(
                    conversation.messages(),
                    offer_tools.then_some(definitions.as_slice()),
                )
                .await?;

            if let Some(u) = response.usage() {
                usage.add(u);
            }

            if response.tool_calls().is_empty() {
                let text = response.text().unwrap_or("").trim().to_string();
                if text.is_empty() {
                    return Err(LlmError::MalformedResponse(
                        "model returned an empty answer".to_string(),
                    )
                    .into());
                }
                return Ok(AgentOutcome {
                    text,
                    tool_calls_made,
                    usage,
                });
            }

            if !offer_tools {
                // Tools were withheld; accept any text, otherwise the model is stuck
                if let Some(text) = response.text().map(str::trim).filter(|t| !t.is_empty()) {
                    return Ok(AgentOutcome {
                        text: text.to_string(),
                        tool_calls_made,
                        usage,
                    });
                }
                return Err(LlmError::MalformedResponse(
                    "model requested tools after its tool budget was spent".to_string(),
                )
                .into());
            }

            rounds += 1;
            let thought = match &response {
                LlmResponse::Mixed { text, .. } => text.as_deref(),
                _ => None,
            };
            if let Some(text) = thought.map(str::trim).filter(|t| !t.is_empty()) {
                events(CrewEvent::AgentThought {
                    agent: agent.clone(),
                    text: text.to_string(),
                });
            }

            let calls = response.tool_calls();
            if calls.len() > MAX_TOOL_CALLS_PER_ROUND {
                tracing::warn!(
                    agent = agent.as_str(),
                    "Model requested {} tools in one turn, limiting to {}",
                    calls.len(),
                    MAX_TOOL_CALLS_PER_ROUND
                );
            }
            let calls = &calls[..calls.len().min(MAX_TOOL_CALLS_PER_ROUND)];
            conversation.add_assistant_tool_calls(thought, calls);

            for call in calls {
                events(CrewEvent::ToolCalled {
                    agent: agent.clone(),
                    tool: call.name.clone(),
                    input: call.arguments.clone(),
                });
                tracing::debug!(
                    agent = agent.as_str(),
                    tool = call.name.as_str(),
                    "Executing tool with args: {}",
                    call.arguments
                );

                let result = self.tools.execute(&call.name, call.arguments.clone()).await;
                tool_calls_made += 1;

                events(CrewEvent::ToolFinished {
                    agent: agent.clone(),
                    tool: call.name.clone(),
                    success: result.success,
                    preview: preview(&result.output, TOOL_PREVIEW_CHARS),
                });
                conversation.add_tool_result(&call.id, &result.output);
            }

            if rounds == self.max_tool_rounds {
                conversation.add_user(
                    "You have used all your searches. Give your final answer now.",
                );
            }
        }
    }
}
