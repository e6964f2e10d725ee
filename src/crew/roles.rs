//! The three crew roles and their instruction templates

use serde::{Deserialize, Serialize};
use std::fmt;

/// Formatting reminders closing every role's instructions
pub const FORMAT_REMINDERS: [&str; 4] = [
    "Be concise and direct",
    "Use bullet points",
    "Maximum 3-4 key points per section",
    "Focus on immediate actionable insights",
];

/// Build the instruction template for a role title
///
/// Pure and deterministic: the same title always yields the same prompt.
pub fn base_prompt(role_title: &str) -> String {
    let mut prompt = format!(
        "You are a {role_title}. Provide brief, focused analysis in bullet points.\n\
         Keep responses concise and highlight only the most important points.\n\
         Focus on quick, actionable insights rather than extensive details.\n\
         \n\
         Use the search tool when current market or technology facts would \
         sharpen your answer, then answer directly.\n\
         \n\
         Final Answer format:\n\
         - Key Point 1\n\
         - Key Point 2\n\
         - Key Point 3\n\
         \n\
         Remember:\n"
    );
    for (i, reminder) in FORMAT_REMINDERS.iter().enumerate() {
        prompt.push_str(&format!("{}. {}\n", i + 1, reminder));
    }
    prompt
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RoleKind {
    MarketAnalyst,
    TechSpecialist,
    FeasibilityAssessor,
}

impl RoleKind {
    pub const ALL: [RoleKind; 3] = [
        RoleKind::MarketAnalyst,
        RoleKind::TechSpecialist,
        RoleKind::FeasibilityAssessor,
    ];

    pub fn title(self) -> &'static str {
        match self {
            RoleKind::MarketAnalyst => "Market Intelligence Analyst",
            RoleKind::TechSpecialist => "Technology Specialist",
            RoleKind::FeasibilityAssessor => "Product Feasibility Expert",
        }
    }

    pub fn goal(self) -> &'static str {
        match self {
            RoleKind::MarketAnalyst => {
                "Size the market opportunity for the concept and identify who would buy it"
            }
            RoleKind::TechSpecialist => {
                "Identify the key technical requirements and risks of building the concept"
            }
            RoleKind::FeasibilityAssessor => {
                "Judge whether the concept is viable to launch and how to implement it"
            }
        }
    }

    pub fn backstory(self) -> &'static str {
        match self {
            RoleKind::MarketAnalyst => {
                "You track home furnishing trends, competitor launches and consumer \
                 behaviour for a global furniture retailer's innovation team."
            }
            RoleKind::TechSpecialist => {
                "You are an engineer who has shipped flat-pack, connected and \
                 sustainable products from prototype to mass production."
            }
            RoleKind::FeasibilityAssessor => {
                "You have evaluated hundreds of product pitches, weighing cost, \
                 supply chain, regulation and brand fit before they go to market."
            }
        }
    }
}

impl fmt::Display for RoleKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.title())
    }
}

/// A role as presented to the model
#[derive(Debug, Clone)]
pub struct Role {
    pub kind: RoleKind,
    pub instructions: String,
}

impl Role {
    pub fn new(kind: RoleKind) -> Self {
        Self {
            kind,
            instructions: base_prompt(kind.title()),
        }
    }

    pub fn title(&self) -> &'static str {
        self.kind.title()
    }

    /// System prompt: instructions, goal, backstory and any trained guidance
    pub fn system_prompt(&self, guidance: &[String]) -> String {
        let mut prompt = format!(
            "{}\nYour goal: {}\n\nBackground: {}\n",
            self.instructions,
            self.kind.goal(),
            self.kind.backstory()
        );
        if !guidance.is_empty() {
            prompt.push_str("\nReviewer feedback from earlier sessions:\n");
            for item in guidance {
                prompt.push_str(&format!("- {}\n", item));
            }
        }
        prompt
    }
}
