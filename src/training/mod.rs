//! Human-in-the-loop training
//!
//! Each iteration runs the three tasks in order. After every task a reviewer
//! may give one line of feedback; non-empty feedback makes the owning agent
//! revise its answer, and the revised answer is what later tasks see.
//! Feedback is distilled into per-role guidance saved as JSON.

use crate::crew::{Crew, CrewError, EventCallback, RoleKind, TaskKind, TaskOutput, Topic};
use anyhow::{Context, Result};
use async_trait::async_trait;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::path::Path;
use tokio::io::{AsyncBufReadExt, BufReader, Lines, Stdin};

/// Topic used by the `train` and `test` modes
pub const TRAINING_TOPIC: &str = "Smart Modular Storage System";

/// Per-role suggestions distilled from reviewer feedback
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct TrainedGuidance {
    #[serde(default)]
    pub trained_at: Option<DateTime<Utc>>,
    #[serde(default)]
    pub roles: BTreeMap<RoleKind, Vec<String>>,
}

impl TrainedGuidance {
    pub fn load(path: &Path) -> Result<Self> {
        let content = std::fs::read_to_string(path)
            .with_context(|| format!("Failed to read guidance file {}", path.display()))?;
        serde_json::from_str(&content)
            .with_context(|| format!("Failed to parse guidance file {}", path.display()))
    }

    pub fn save(&self, path: &Path) -> Result<()> {
        if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
            std::fs::create_dir_all(parent)?;
        }
        let content = serde_json::to_string_pretty(self)?;
        std::fs::write(path, content)
            .with_context(|| format!("Failed to write guidance file {}", path.display()))
    }

    pub fn for_role(&self, role: RoleKind) -> &[String] {
        self.roles.get(&role).map(Vec::as_slice).unwrap_or(&[])
    }

    /// Add a suggestion, ignoring blanks and exact repeats
    pub fn add(&mut self, role: RoleKind, suggestion: &str) {
        let suggestion = suggestion.trim();
        if suggestion.is_empty() {
            return;
        }
        let entries = self.roles.entry(role).or_default();
        if !entries.iter().any(|e| e == suggestion) {
            entries.push(suggestion.to_string());
        }
    }

    pub fn is_empty(&self) -> bool {
        self.roles.values().all(Vec::is_empty)
    }
}

/// Where reviewer feedback comes from
#[async_trait]
pub trait FeedbackSource: Send {
    /// Feedback on one task output; `None` accepts it as is
    async fn feedback(&mut self, iteration: usize, output: &TaskOutput) -> Result<Option<String>>;
}

/// Reads one line of feedback per task from stdin
pub struct StdinFeedback {
    lines: Lines<BufReader<Stdin>>,
}

impl StdinFeedback {
    pub fn new() -> Self {
        Self {
            lines: BufReader::new(tokio::io::stdin()).lines(),
        }
    }
}

impl Default for StdinFeedback {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl FeedbackSource for StdinFeedback {
    async fn feedback(&mut self, iteration: usize, output: &TaskOutput) -> Result<Option<String>> {
        println!(
            "\n## {} (iteration {}, {})\n{}\n",
            output.task.heading(),
            iteration + 1,
            output.agent,
            output.raw
        );
        println!("Feedback for this answer (press Enter to accept):");
        let line = self.lines.next_line().await?;
        Ok(line
            .map(|l| l.trim().to_string())
            .filter(|l| !l.is_empty()))
    }
}

/// One reviewed task output
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TrainingRecord {
    pub iteration: usize,
    pub task: TaskKind,
    pub initial: String,
    pub feedback: Option<String>,
    pub revised: Option<String>,
}

#[derive(Debug, Clone)]
pub struct TrainingOutcome {
    pub records: Vec<TrainingRecord>,
    pub guidance: TrainedGuidance,
}

/// Run `n_iterations` reviewed passes over the topic
pub async fn train(
    crew: &Crew,
    topic: &Topic,
    n_iterations: usize,
    feedback: &mut dyn FeedbackSource,
    events: &EventCallback,
) -> Result<TrainingOutcome, CrewError> {
    let mut records = Vec::new();
    let mut guidance = TrainedGuidance::default();

    for iteration in 0..n_iterations {
        tracing::info!(iteration = iteration + 1, n_iterations, "Training iteration");
        let mut outputs: Vec<TaskOutput> = Vec::with_capacity(TaskKind::ALL.len());

        for kind in TaskKind::ALL {
            let output = crew.run_task(topic, kind, &outputs, events).await?;
            let note = feedback
                .feedback(iteration, &output)
                .await
                .map_err(|source| CrewError::Task { task: kind, source })?;

            let mut record = TrainingRecord {
                iteration,
                task: kind,
                initial: output.raw.clone(),
                feedback: note.clone(),
                revised: None,
            };

            let kept = match note {
                Some(note) => {
                    guidance.add(kind.role(), &note);
                    let revised = crew.revise(topic, &output, &outputs, &note, events).await?;
                    record.revised = Some(revised.raw.clone());
                    revised
                }
                None => output,
            };

            records.push(record);
            outputs.push(kept);
        }
    }

    guidance.trained_at = Some(Utc::now());
    Ok(TrainingOutcome { records, guidance })
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[test]
    fn add_skips_blank_and_duplicate_suggestions() {
        let mut guidance = TrainedGuidance::default();
        guidance.add(RoleKind::TechSpecialist, "Mention load-bearing limits");
        guidance.add(RoleKind::TechSpecialist, "  Mention load-bearing limits ");
        guidance.add(RoleKind::TechSpecialist, "   ");

        assert_eq!(
            guidance.for_role(RoleKind::TechSpecialist),
            ["Mention load-bearing limits".to_string()]
        );
        assert!(guidance.for_role(RoleKind::MarketAnalyst).is_empty());
    }

    #[test]
    fn guidance_round_trips_through_json_file() {
        let tmp = TempDir::new().unwrap();
        let path = tmp.path().join("nested").join("trained.json");

        let mut guidance = TrainedGuidance::default();
        guidance.add(RoleKind::FeasibilityAssessor, "Estimate payback period");
        guidance.save(&path).unwrap();

        let content = std::fs::read_to_string(&path).unwrap();
        assert!(content.contains("feasibility_assessor"));

        let loaded = TrainedGuidance::load(&path).unwrap();
        assert_eq!(
            loaded.for_role(RoleKind::FeasibilityAssessor),
            ["Estimate payback period".to_string()]
        );
    }

    #[test]
    fn missing_guidance_file_is_an_error() {
        let tmp = TempDir::new().unwrap();
        assert!(TrainedGuidance::load(&tmp.path().join("nope.json")).is_err());
    }
}
