//! Crew evaluation for the `test` mode
//!
//! Runs the crew several times and has a separate model score every task
//! output from 1 to 10.

use crate::crew::{Crew, CrewError, EventCallback, TaskKind, TaskOutput, Topic};
use crate::llm::{LlmProvider, Message};
use anyhow::{Context, Result};
use once_cell::sync::Lazy;
use regex::Regex;
use serde::Deserialize;
use std::sync::Arc;
use std::time::{Duration, Instant};
use tabled::builder::Builder;
use tabled::settings::Style;

const EVALUATOR_PROMPT: &str = "You are an expert reviewer of product innovation research. \
Score how well an answer fulfils its task on a scale from 1 (useless) to 10 (excellent), \
considering relevance, correctness, concision and whether it follows the expected output. \
Reply only with JSON of the form {\"quality\": <score>}.";

#[derive(Deserialize)]
struct Verdict {
    quality: f64,
}

/// Scores task outputs with an LLM
pub struct TaskEvaluator {
    llm: Arc<dyn LlmProvider>,
}

impl TaskEvaluator {
    pub fn new(llm: Arc<dyn LlmProvider>) -> Self {
        Self { llm }
    }

    pub async fn score(&self, topic: &Topic, output: &TaskOutput) -> Result<u8> {
        let messages = [
            Message::system(EVALUATOR_PROMPT),
            Message::user(format!(
                "Task: {}\nExpected output: {}\nTopic: {}\n\nAnswer from the {}:\n{}",
                output.task.description(),
                output.task.expected_output(),
                topic.as_str(),
                output.agent,
                output.raw
            )),
        ];
        let response = self.llm.chat(&messages, None).await?;
        let text = response.text().unwrap_or("");
        parse_score(text).with_context(|| format!("Evaluator reply had no score: {}", text))
    }
}

/// Pull a 1-10 score from the evaluator reply
///
/// Accepts the JSON verdict (bare or inside a code fence) and falls back to
/// the first standalone number in the text.
pub fn parse_score(text: &str) -> Option<u8> {
    static VERDICT_PATTERN: Lazy<Regex> =
        Lazy::new(|| Regex::new(r"(?s)\{.*?\}").expect("valid regex"));
    static NUMBER_PATTERN: Lazy<Regex> =
        Lazy::new(|| Regex::new(r"\b(\d+(?:\.\d+)?)\b").expect("valid regex"));

    if let Some(m) = VERDICT_PATTERN.find(text) {
        if let Ok(verdict) = serde_json::from_str::<Verdict>(m.as_str()) {
            return Some(clamp_score(verdict.quality));
        }
    }

    NUMBER_PATTERN
        .captures(text)
        .and_then(|c| c[1].parse::<f64>().ok())
        .map(clamp_score)
}

fn clamp_score(value: f64) -> u8 {
    value.round().clamp(1.0, 10.0) as u8
}

/// Scores of one crew run, in task order
#[derive(Debug, Clone)]
pub struct IterationResult {
    pub scores: Vec<(TaskKind, u8)>,
    pub duration: Duration,
}

#[derive(Debug, Clone, Default)]
pub struct TestReport {
    pub model: String,
    pub iterations: Vec<IterationResult>,
}

impl TestReport {
    pub fn task_average(&self, kind: TaskKind) -> Option<f64> {
        let scores: Vec<f64> = self
            .iterations
            .iter()
            .flat_map(|i| i.scores.iter())
            .filter(|(k, _)| *k == kind)
            .map(|(_, s)| f64::from(*s))
            .collect();
        (!scores.is_empty()).then(|| scores.iter().sum::<f64>() / scores.len() as f64)
    }

    pub fn iteration_average(&self, index: usize) -> Option<f64> {
        let iteration = self.iterations.get(index)?;
        if iteration.scores.is_empty() {
            return None;
        }
        let total: f64 = iteration.scores.iter().map(|(_, s)| f64::from(*s)).sum();
        Some(total / iteration.scores.len() as f64)
    }

    /// Table with one column per run plus an average column
    pub fn to_table(&self) -> String {
        let mut builder = Builder::default();

        let mut header = vec!["Task".to_string()];
        header.extend((1..=self.iterations.len()).map(|i| format!("Run {}", i)));
        header.push("Avg. Total".to_string());
        builder.push_record(header);

        for kind in TaskKind::ALL {
            let mut row = vec![kind.heading().to_string()];
            for iteration in &self.iterations {
                let score = iteration
                    .scores
                    .iter()
                    .find(|(k, _)| *k == kind)
                    .map(|(_, s)| s.to_string())
                    .unwrap_or_else(|| "-".to_string());
                row.push(score);
            }
            row.push(format_average(self.task_average(kind)));
            builder.push_record(row);
        }

        let mut crew_row = vec!["Crew".to_string()];
        crew_row.extend((0..self.iterations.len()).map(|i| format_average(self.iteration_average(i))));
        let overall: Vec<f64> = TaskKind::ALL
            .iter()
            .filter_map(|k| self.task_average(*k))
            .collect();
        crew_row.push(format_average(
            (!overall.is_empty()).then(|| overall.iter().sum::<f64>() / overall.len() as f64),
        ));
        builder.push_record(crew_row);

        let mut time_row = vec!["Execution Time (s)".to_string()];
        time_row.extend(
            self.iterations
                .iter()
                .map(|i| format!("{:.0}", i.duration.as_secs_f64())),
        );
        time_row.push(String::new());
        builder.push_record(time_row);

        let mut table = builder.build();
        table.with(Style::rounded());
        table.to_string()
    }
}

fn format_average(value: Option<f64>) -> String {
    value.map(|v| format!("{:.1}", v)).unwrap_or_else(|| "-".to_string())
}

/// Run the crew `n_iterations` times and score every output
pub async fn test_crew(
    crew: &Crew,
    evaluator: &TaskEvaluator,
    topic: &Topic,
    n_iterations: usize,
    model: &str,
    events: &EventCallback,
) -> Result<TestReport, CrewError> {
    let mut report = TestReport {
        model: model.to_string(),
        iterations: Vec::with_capacity(n_iterations),
    };

    for iteration in 0..n_iterations {
        let started = Instant::now();
        let output = crew.kickoff(topic, events).await?;
        let duration = started.elapsed();

        let mut scores = Vec::with_capacity(output.tasks_output.len());
        for task_output in &output.tasks_output {
            let score = evaluator
                .score(topic, task_output)
                .await
                .map_err(|source| CrewError::Task {
                    task: task_output.task,
                    source,
                })?;
            tracing::info!(
                iteration = iteration + 1,
                task = %task_output.task,
                score,
                "Scored task output"
            );
            scores.push((task_output.task, score));
        }

        report.iterations.push(IterationResult { scores, duration });
    }

    Ok(report)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_json_verdicts() {
        assert_eq!(parse_score(r#"{"quality": 8}"#), Some(8));
        assert_eq!(parse_score("```json\n{\"quality\": 7.6}\n```"), Some(8));
    }

    #[test]
    fn falls_back_to_first_number() {
        assert_eq!(parse_score("I would give this a 6 out of 10"), Some(6));
        assert_eq!(parse_score("Score: 42"), Some(10));
        assert_eq!(parse_score("no score here"), None);
    }

    #[test]
    fn scores_are_clamped() {
        assert_eq!(parse_score(r#"{"quality": 0}"#), Some(1));
        assert_eq!(parse_score(r#"{"quality": 15}"#), Some(10));
    }

    #[test]
    fn unparseable_verdict_falls_back_per_reply() {
        let replies = [
            (r#"{"quality": "high"} overall 9"#, Some(9)),
            ("{not json} 3 of 10", Some(3)),
            (r#"{"quality": 5}"#, Some(5)),
        ];
        for (reply, expected) in replies {
            assert_eq!(parse_score(reply), expected, "{}", reply);
        }
    }

    fn report() -> TestReport {
        TestReport {
            model: "gpt-4o-mini".to_string(),
            iterations: vec![
                IterationResult {
                    scores: vec![
                        (TaskKind::MarketAnalysis, 8),
                        (TaskKind::TechnicalAssessment, 6),
                        (TaskKind::FeasibilityEvaluation, 7),
                    ],
                    duration: Duration::from_secs(30),
                },
                IterationResult {
                    scores: vec![
                        (TaskKind::MarketAnalysis, 9),
                        (TaskKind::TechnicalAssessment, 7),
                        (TaskKind::FeasibilityEvaluation, 8),
                    ],
                    duration: Duration::from_secs(41),
                },
            ],
        }
    }

    #[test]
    fn averages_per_task_and_run() {
        let report = report();
        assert_eq!(report.task_average(TaskKind::MarketAnalysis), Some(8.5));
        assert_eq!(report.iteration_average(0), Some(7.0));
        assert_eq!(report.iteration_average(5), None);
    }

    #[test]
    fn table_lists_every_task_and_run() {
        let table = report().to_table();
        assert!(table.contains("Run 1"));
        assert!(table.contains("Run 2"));
        assert!(table.contains("Market Analysis"));
        assert!(table.contains("Feasibility Evaluation"));
        assert!(table.contains("8.5"));
        assert!(table.contains("Execution Time (s)"));
    }
}
