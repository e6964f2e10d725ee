//! Rendering of crew results as headed sections

use crate::crew::{CrewError, CrewOutput, TaskKind};
use pulldown_cmark::{html, CowStr, Event, Options, Parser, Tag};
use serde::Serialize;

/// Section title shown above a task's output
pub fn section_title(kind: TaskKind) -> String {
    let icon = match kind {
        TaskKind::MarketAnalysis => "🎯",
        TaskKind::TechnicalAssessment => "🔧",
        TaskKind::FeasibilityEvaluation => "📊",
    };
    format!("{} {}", icon, kind.heading())
}

#[derive(Debug, Clone, Serialize)]
pub struct ReportSection {
    pub task: TaskKind,
    pub title: String,
    pub agent: String,
    pub task_id: String,
    pub markdown: String,
    pub html: String,
}

/// The three analysis sections of one run
#[derive(Debug, Clone, Serialize)]
pub struct AnalysisReport {
    pub run_id: String,
    pub topic: String,
    pub sections: Vec<ReportSection>,
}

impl AnalysisReport {
    /// Build a report, requiring exactly one output per task in run order
    pub fn from_output(output: &CrewOutput) -> Result<Self, CrewError> {
        let expected = TaskKind::ALL.len();
        let in_order = output
            .tasks_output
            .iter()
            .map(|o| o.task)
            .eq(TaskKind::ALL.iter().copied());
        if output.tasks_output.len() != expected || !in_order {
            return Err(CrewError::ResultShape {
                expected,
                actual: output.tasks_output.len(),
            });
        }

        let sections = output
            .tasks_output
            .iter()
            .map(|o| ReportSection {
                task: o.task,
                title: section_title(o.task),
                agent: o.agent.clone(),
                task_id: o.task_id.to_string(),
                markdown: o.raw.clone(),
                html: markdown_to_html(&o.raw),
            })
            .collect();

        Ok(Self {
            run_id: output.run_id.to_string(),
            topic: output.topic.clone(),
            sections,
        })
    }

    pub fn to_markdown(&self) -> String {
        let mut out = String::new();
        for section in &self.sections {
            out.push_str(&format!(
                "### {}\n\n{}\n\n",
                section.title,
                section.markdown.trim()
            ));
        }
        out.trim_end().to_string()
    }

    pub fn to_html(&self) -> String {
        self.sections
            .iter()
            .map(|s| {
                format!(
                    "<section class=\"analysis\">\n<h3>{}</h3>\n{}</section>\n",
                    s.title, s.html
                )
            })
            .collect()
    }
}

/// Markdown to HTML
///
/// Raw HTML from the model is escaped rather than passed through, and link
/// or image targets outside http, https and mailto are blanked.
pub fn markdown_to_html(markdown: &str) -> String {
    let parser = Parser::new_ext(markdown, Options::ENABLE_STRIKETHROUGH).map(|event| match event {
        Event::Html(raw) | Event::InlineHtml(raw) => Event::Text(raw),
        Event::Start(Tag::Link {
            link_type,
            dest_url,
            title,
            id,
        }) => Event::Start(Tag::Link {
            link_type,
            dest_url: safe_url(dest_url),
            title,
            id,
        }),
        Event::Start(Tag::Image {
            link_type,
            dest_url,
            title,
            id,
        }) => Event::Start(Tag::Image {
            link_type,
            dest_url: safe_url(dest_url),
            title,
            id,
        }),
        other => other,
    });
    let mut out = String::new();
    html::push_html(&mut out, parser);
    out
}

/// Keep scheme-less targets and http, https or mailto; anything else becomes empty
fn safe_url(url: CowStr<'_>) -> CowStr<'_> {
    let lowered = url.trim().to_ascii_lowercase();
    let allowed = ["http://", "https://", "mailto:"]
        .iter()
        .any(|scheme| lowered.starts_with(scheme));
    if allowed || !lowered.contains(':') {
        url
    } else {
        CowStr::Borrowed("")
    }
}
