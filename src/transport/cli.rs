//! CLI transport: run, train, replay and test from the terminal

use crate::config::{Config, Credentials};
use crate::crew::{Crew, CrewEvent, EventCallback, Topic};
use crate::evaluation::{self, TaskEvaluator};
use crate::llm;
use crate::report::AnalysisReport;
use crate::storage::CrewStorage;
use crate::training::{self, StdinFeedback, TRAINING_TOPIC};
use anyhow::{Context, Result};
use colored::Colorize;
use std::path::Path;
use std::sync::Arc;
use tabled::{settings::Style, Table, Tabled};

/// Topic used by `run` when none is given
pub const SAMPLE_TOPIC: &str = "Upcycling-as-a-Service for Used IKEA Furniture
We are exploring the feasibility of a furniture upcycling service where customers can return their used IKEA furniture for refurbishment, redesign, or recycling. The upcycled items would either be resold or given back to the original owner after enhancement. The initiative targets eco-conscious customers and aligns with IKEA's sustainability goals. Key focus areas include promoting circular economy, minimizing waste, and creating a new revenue stream.
Key Focus Areas:
- Developing a scalable logistics process for furniture returns and refurbishment.
- Leveraging modular design to ease the upcycling process.
- Promoting customer incentives like discounts or loyalty programs for returned furniture.";

/// Print progress to stderr when verbose, otherwise drop it
pub fn console_events(verbose: bool) -> EventCallback {
    Arc::new(move |event: CrewEvent| {
        if !verbose {
            return;
        }
        let line = event.summary();
        let styled = match &event {
            CrewEvent::KickoffStarted { .. } | CrewEvent::KickoffCompleted { .. } => {
                line.bold().to_string()
            }
            CrewEvent::TaskStarted { .. } => line.cyan().bold().to_string(),
            CrewEvent::TaskCompleted { .. } => line.green().to_string(),
            CrewEvent::ToolFinished { success: false, .. } => line.yellow().to_string(),
            _ => line.dimmed().to_string(),
        };
        eprintln!("{}", styled);
    })
}

#[derive(Tabled)]
struct TaskRow {
    #[tabled(rename = "Task")]
    task: String,
    #[tabled(rename = "Agent")]
    agent: String,
    #[tabled(rename = "Task ID")]
    task_id: String,
}

fn print_report(report: &AnalysisReport) {
    println!("\n{}\n", "=== INNOVATION ANALYSIS ===".bold().cyan());
    println!("{}\n", report.to_markdown());

    let rows: Vec<TaskRow> = report
        .sections
        .iter()
        .map(|s| TaskRow {
            task: s.title.clone(),
            agent: s.agent.clone(),
            task_id: s.task_id.clone(),
        })
        .collect();
    let mut table = Table::new(rows);
    table.with(Style::rounded());
    println!("{}", table);
    println!(
        "{}",
        "Use `product-design replay <task_id>` to re-run from a task.".dimmed()
    );
}

/// Run the crew once and save the kickoff log for replay
pub async fn run_kickoff(config: &Config, credentials: &Credentials, topic: Topic) -> Result<()> {
    let crew = Crew::from_config(config, credentials)?;
    let storage = CrewStorage::new(&config.crew.data_dir)?;
    let events = console_events(config.crew.verbose);

    let output = crew
        .kickoff(&topic, &events)
        .await
        .context("An error occurred while running the crew")?;
    let path = storage.save_kickoff(&output)?;
    tracing::info!("Kickoff log saved to {}", path.display());

    print_report(&AnalysisReport::from_output(&output)?);
    Ok(())
}

/// Interactive training; writes distilled guidance to `filename`
pub async fn run_train(
    config: &Config,
    credentials: &Credentials,
    n_iterations: usize,
    filename: &Path,
) -> Result<()> {
    let crew = Crew::from_config(config, credentials)?;
    let topic = Topic::new(TRAINING_TOPIC)?;
    let events = console_events(config.crew.verbose);
    let mut feedback = StdinFeedback::new();

    let outcome = training::train(&crew, &topic, n_iterations, &mut feedback, &events)
        .await
        .context("An error occurred while training the crew")?;
    outcome.guidance.save(filename)?;

    let revised = outcome.records.iter().filter(|r| r.revised.is_some()).count();
    println!(
        "\n{} {} iteration(s), {} of {} answers revised. Guidance saved to {}",
        "Training complete:".green().bold(),
        n_iterations,
        revised,
        outcome.records.len(),
        filename.display()
    );
    if outcome.guidance.is_empty() {
        println!("{}", "No feedback was given; guidance is empty.".dimmed());
    }
    Ok(())
}

/// Re-run the latest kickoff from the given task
pub async fn run_replay(config: &Config, credentials: &Credentials, task_id: &str) -> Result<()> {
    let storage = CrewStorage::new(&config.crew.data_dir)?;
    let (previous, start) = storage
        .find_task(task_id)
        .context("An error occurred while replaying the crew")?;
    let topic = Topic::new(&previous.topic)?;

    let crew = Crew::from_config(config, credentials)?;
    let events = console_events(config.crew.verbose);

    println!(
        "Replaying run {} from {}",
        previous.run_id,
        previous.tasks_output[start].task.heading().bold()
    );
    let output = crew
        .kickoff_from(&topic, start, previous.tasks_output, &events)
        .await
        .context("An error occurred while replaying the crew")?;
    storage.save_kickoff(&output)?;

    print_report(&AnalysisReport::from_output(&output)?);
    Ok(())
}

/// Run the crew repeatedly and score each task with `model`
pub async fn run_test(
    config: &Config,
    credentials: &Credentials,
    n_iterations: usize,
    model: &str,
) -> Result<()> {
    let crew = Crew::from_config(config, credentials)?;
    let judge = llm::create_provider(&credentials.openai_api_key, &config.llm, Some(model))?;
    let evaluator = TaskEvaluator::new(judge);
    let topic = Topic::new(TRAINING_TOPIC)?;
    let events = console_events(config.crew.verbose);

    let report = evaluation::test_crew(&crew, &evaluator, &topic, n_iterations, model, &events)
        .await
        .context("An error occurred while testing the crew")?;

    println!(
        "\n{}\n",
        format!("=== TASK SCORES ({}) ===", report.model).bold().cyan()
    );
    println!("{}", report.to_table());
    Ok(())
}
