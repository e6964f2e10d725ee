//! Sequential crew runner: three tasks, three agents, fixed order

use super::errors::CrewError;
use super::events::{CrewEvent, EventCallback};
use super::roles::{Role, RoleKind};
use super::tasks::{Task, TaskKind};
use crate::agent::TaskAgent;
use crate::config::{Config, Credentials};
use crate::llm::{self, LlmProvider, TokenUsage};
use crate::tools::{SerperSearchTool, ToolRegistry};
use crate::training::TrainedGuidance;
use anyhow::Result;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use uuid::Uuid;

/// Topic supplied by the caller, trimmed and non-empty
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Topic(String);

impl Topic {
    pub fn new(raw: &str) -> Result<Self, CrewError> {
        let trimmed = raw.trim();
        if trimmed.is_empty() {
            return Err(CrewError::EmptyTopic);
        }
        Ok(Self(trimmed.to_string()))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

/// Output of one task
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TaskOutput {
    pub task_id: Uuid,
    pub task: TaskKind,
    pub agent: String,
    pub raw: String,
    #[serde(default)]
    pub usage: TokenUsage,
}

/// Ordered results of one kickoff
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CrewOutput {
    pub run_id: Uuid,
    pub topic: String,
    pub started_at: DateTime<Utc>,
    pub finished_at: DateTime<Utc>,
    pub tasks_output: Vec<TaskOutput>,
    #[serde(default)]
    pub usage: TokenUsage,
}

impl CrewOutput {
    pub fn get(&self, kind: TaskKind) -> Option<&TaskOutput> {
        self.tasks_output.iter().find(|o| o.task == kind)
    }

    /// Position of a task id within this run
    pub fn position(&self, task_id: &str) -> Option<usize> {
        self.tasks_output
            .iter()
            .position(|o| o.task_id.to_string() == task_id)
    }
}

/// The product-design crew
///
/// Holds only immutable handles; agents and tasks are rebuilt per run.
pub struct Crew {
    llm: Arc<dyn LlmProvider>,
    tools: Arc<ToolRegistry>,
    max_tool_rounds: usize,
    guidance: TrainedGuidance,
}

impl Crew {
    pub fn new(llm: Arc<dyn LlmProvider>, tools: Arc<ToolRegistry>) -> Self {
        Self {
            llm,
            tools,
            max_tool_rounds: 2,
            guidance: TrainedGuidance::default(),
        }
    }

    pub fn with_max_tool_rounds(mut self, rounds: usize) -> Self {
        self.max_tool_rounds = rounds;
        self
    }

    pub fn with_guidance(mut self, guidance: TrainedGuidance) -> Self {
        self.guidance = guidance;
        self
    }

    /// Wire the OpenAI provider and Serper search from validated credentials
    pub fn from_config(config: &Config, credentials: &Credentials) -> Result<Self> {
        let llm = llm::create_provider(&credentials.openai_api_key, &config.llm, None)?;

        let mut tools = ToolRegistry::new().with_timeout(config.search.request_timeout_secs + 5);
        tools.register(Arc::new(SerperSearchTool::new(
            &credentials.serper_api_key,
            &config.search,
        )?));

        let guidance = match &config.crew.guidance_file {
            Some(path) if path.exists() => TrainedGuidance::load(path)?,
            Some(path) => {
                tracing::warn!("Guidance file {} not found, ignoring", path.display());
                TrainedGuidance::default()
            }
            None => TrainedGuidance::default(),
        };

        Ok(Self::new(llm, Arc::new(tools))
            .with_max_tool_rounds(config.crew.max_tool_rounds)
            .with_guidance(guidance))
    }

    pub fn agent_for(&self, role: RoleKind) -> TaskAgent {
        TaskAgent::new(Role::new(role), self.llm.clone(), self.tools.clone())
            .with_max_tool_rounds(self.max_tool_rounds)
            .with_guidance(self.guidance.for_role(role).to_vec())
    }

    /// Run all three tasks in order
    pub async fn kickoff(
        &self,
        topic: &Topic,
        events: &EventCallback,
    ) -> Result<CrewOutput, CrewError> {
        self.kickoff_from(topic, 0, Vec::new(), events).await
    }

    /// Run the chain from task `start`, reusing `prior` as the earlier outputs
    pub async fn kickoff_from(
        &self,
        topic: &Topic,
        start: usize,
        prior: Vec<TaskOutput>,
        events: &EventCallback,
    ) -> Result<CrewOutput, CrewError> {
        let mut outputs: Vec<TaskOutput> = prior.into_iter().take(start).collect();
        if outputs.len() != start {
            return Err(CrewError::ResultShape {
                expected: start,
                actual: outputs.len(),
            });
        }

        let run_id = Uuid::new_v4();
        let started_at = Utc::now();
        let mut usage = TokenUsage::default();

        tracing::info!(%run_id, start, "Crew kickoff started");
        events(CrewEvent::KickoffStarted {
            run_id: run_id.to_string(),
            topic: topic.as_str().to_string(),
        });

        for kind in TaskKind::ALL.into_iter().skip(start) {
            let output = self.run_task(topic, kind, &outputs, events).await?;
            usage.add(&output.usage);
            outputs.push(output);
        }

        events(CrewEvent::KickoffCompleted {
            run_id: run_id.to_string(),
        });

        Ok(CrewOutput {
            run_id,
            topic: topic.as_str().to_string(),
            started_at,
            finished_at: Utc::now(),
            tasks_output: outputs,
            usage,
        })
    }

    /// Run one task with a fresh task instance and agent
    pub async fn run_task(
        &self,
        topic: &Topic,
        kind: TaskKind,
        earlier: &[TaskOutput],
        events: &EventCallback,
    ) -> Result<TaskOutput, CrewError> {
        let task = Task::new(kind);
        let agent = self.agent_for(kind.role());
        let agent_name = agent.role().title().to_string();

        tracing::info!(task = %kind, agent = agent_name.as_str(), "Task started");
        events(CrewEvent::TaskStarted {
            task_id: task.id.to_string(),
            task: kind,
            agent: agent_name.clone(),
        });

        let context: Vec<(TaskKind, &str)> =
            earlier.iter().map(|o| (o.task, o.raw.as_str())).collect();
        let outcome = agent
            .execute(&task, topic.as_str(), &context, events)
            .await
            .map_err(|source| {
                tracing::error!(task = %kind, "Task failed: {:#}", source);
                CrewError::Task { task: kind, source }
            })?;

        tracing::info!(
            task = %kind,
            tool_calls = outcome.tool_calls_made,
            "Task completed"
        );
        events(CrewEvent::TaskCompleted {
            task_id: task.id.to_string(),
            task: kind,
            agent: agent_name.clone(),
            output: outcome.text.clone(),
        });

        Ok(TaskOutput {
            task_id: task.id,
            task: kind,
            agent: agent_name,
            raw: outcome.text,
            usage: outcome.usage,
        })
    }

    /// Have the owning agent rework one output given reviewer feedback
    ///
    /// `earlier` holds the outputs that preceded it in the chain.
    pub async fn revise(
        &self,
        topic: &Topic,
        output: &TaskOutput,
        earlier: &[TaskOutput],
        feedback: &str,
        events: &EventCallback,
    ) -> Result<TaskOutput, CrewError> {
        let task = Task {
            id: output.task_id,
            kind: output.task,
        };
        let agent = self.agent_for(output.task.role());
        let context: Vec<(TaskKind, &str)> =
            earlier.iter().map(|o| (o.task, o.raw.as_str())).collect();
        let outcome = agent
            .revise(&task, topic.as_str(), &context, &output.raw, feedback, events)
            .await
            .map_err(|source| CrewError::Task {
                task: output.task,
                source,
            })?;

        Ok(TaskOutput {
            task_id: output.task_id,
            task: output.task,
            agent: output.agent.clone(),
            raw: outcome.text,
            usage: outcome.usage,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn topic_is_trimmed() {
        let topic = Topic::new("  Smart Modular Storage System \n").unwrap();
        assert_eq!(topic.as_str(), "Smart Modular Storage System");
    }

    #[test]
    fn blank_topic_is_rejected() {
        assert!(matches!(Topic::new(""), Err(CrewError::EmptyTopic)));
        assert!(matches!(Topic::new(" \t\n "), Err(CrewError::EmptyTopic)));
    }

    #[test]
    fn position_finds_task_ids() {
        let id = Uuid::new_v4();
        let output = CrewOutput {
            run_id: Uuid::new_v4(),
            topic: "t".to_string(),
            started_at: Utc::now(),
            finished_at: Utc::now(),
            tasks_output: vec![TaskOutput {
                task_id: id,
                task: TaskKind::MarketAnalysis,
                agent: "a".to_string(),
                raw: "r".to_string(),
                usage: TokenUsage::default(),
            }],
            usage: TokenUsage::default(),
        };
        assert_eq!(output.position(&id.to_string()), Some(0));
        assert_eq!(output.position("missing"), None);
        assert!(output.get(TaskKind::FeasibilityEvaluation).is_none());
    }
}
