//! The three analysis tasks, each bound to one role

use super::roles::RoleKind;
use serde::{Deserialize, Serialize};
use std::fmt;
use uuid::Uuid;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TaskKind {
    MarketAnalysis,
    TechnicalAssessment,
    FeasibilityEvaluation,
}

impl TaskKind {
    /// Execution order of a kickoff
    pub const ALL: [TaskKind; 3] = [
        TaskKind::MarketAnalysis,
        TaskKind::TechnicalAssessment,
        TaskKind::FeasibilityEvaluation,
    ];

    pub fn role(self) -> RoleKind {
        match self {
            TaskKind::MarketAnalysis => RoleKind::MarketAnalyst,
            TaskKind::TechnicalAssessment => RoleKind::TechSpecialist,
            TaskKind::FeasibilityEvaluation => RoleKind::FeasibilityAssessor,
        }
    }

    /// Section heading used when rendering results
    pub fn heading(self) -> &'static str {
        match self {
            TaskKind::MarketAnalysis => "Market Analysis",
            TaskKind::TechnicalAssessment => "Technical Assessment",
            TaskKind::FeasibilityEvaluation => "Feasibility Evaluation",
        }
    }

    pub fn description(self) -> &'static str {
        match self {
            TaskKind::MarketAnalysis => {
                "Provide a quick market overview with 3-4 key points about market potential \
                 and target audience.\n\
                 Important: Do not include or reference any images, graphs, or visual content \
                 from the internet.\n\
                 Focus on clear, text-based bullet points and concise analysis."
            }
            TaskKind::TechnicalAssessment => {
                "List 3-4 key technical requirements and potential challenges. Keep it brief \
                 and focused.\n\
                 Important: Do not include or reference any images, graphs, or visual content \
                 from the internet.\n\
                 Present all technical information in text format using clear bullet points."
            }
            TaskKind::FeasibilityEvaluation => {
                "Give a quick feasibility assessment with 3-4 main points about viability and \
                 implementation.\n\
                 Important: Do not include or reference any images, graphs, or visual content \
                 from the internet.\n\
                 Present all evaluation data in text format using clear bullet points."
            }
        }
    }

    pub fn expected_output(self) -> &'static str {
        match self {
            TaskKind::MarketAnalysis => {
                "3-4 bullet points on market potential and target audience"
            }
            TaskKind::TechnicalAssessment => {
                "3-4 bullet points on technical requirements and challenges"
            }
            TaskKind::FeasibilityEvaluation => {
                "3-4 bullet points on viability and implementation"
            }
        }
    }
}

impl fmt::Display for TaskKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.heading())
    }
}

/// One task instance, created fresh for every run
#[derive(Debug, Clone)]
pub struct Task {
    pub id: Uuid,
    pub kind: TaskKind,
}

impl Task {
    pub fn new(kind: TaskKind) -> Self {
        Self {
            id: Uuid::new_v4(),
            kind,
        }
    }

    /// Render the user prompt: task, topic and the outputs of earlier tasks
    pub fn prompt(&self, topic: &str, context: &[(TaskKind, &str)]) -> String {
        let mut prompt = format!(
            "{}\n\nInnovation topic:\n{}\n",
            self.kind.description(),
            topic
        );

        if !context.is_empty() {
            prompt.push_str("\nContext from earlier analysis:\n");
            for (kind, output) in context {
                prompt.push_str(&format!("\n## {}\n{}\n", kind.heading(), output.trim()));
            }
        }

        prompt.push_str(&format!(
            "\nExpected output: {}",
            self.kind.expected_output()
        ));
        prompt
    }
}
