use anyhow::Result;
use clap::{Parser, Subcommand};
use product_design::config::{Config, Credentials};
use product_design::crew::{Crew, Topic};
use product_design::transport::{cli, http};
use std::path::{Path, PathBuf};
use std::sync::Arc;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

#[derive(Parser)]
#[command(name = "product-design")]
#[command(author, version, about = "Product innovation analysis with market, technology and feasibility agents", long_about = None)]
struct Cli {
    #[command(subcommand)]
    command: Commands,

    /// Enable verbose logging
    #[arg(short, long, global = true)]
    verbose: bool,

    /// Config file (default: platform config dir)
    #[arg(long, global = true)]
    config: Option<PathBuf>,

    /// Secrets file holding OPENAI_API_KEY and SERPER_API_KEY
    #[arg(long, global = true, default_value = "secrets.toml")]
    secrets: PathBuf,
}

#[derive(Subcommand)]
enum Commands {
    /// Analyse a topic once and print the three sections
    Run {
        /// Innovation topic (default: the upcycling service sample)
        topic: Vec<String>,
    },

    /// Start the web form
    Serve {
        /// Host to bind to
        #[arg(long)]
        host: Option<String>,

        /// Port to listen on
        #[arg(short, long)]
        port: Option<u16>,
    },

    /// Train the crew with reviewer feedback read from stdin
    Train {
        /// Number of training iterations
        n_iterations: usize,

        /// File the trained guidance is written to
        filename: PathBuf,
    },

    /// Re-run the latest kickoff from a task
    Replay {
        /// Task ID printed by `run`
        task_id: String,
    },

    /// Run the crew repeatedly and score each task
    Test {
        /// Number of test iterations
        n_iterations: usize,

        /// Model used to score the outputs
        model: String,
    },
}

fn load_credentials(secrets: &Path) -> Result<Credentials> {
    let working_dir = std::env::current_dir()?;
    Ok(Credentials::resolve(&working_dir, secrets)?)
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    let filter = if cli.verbose {
        "product_design=debug"
    } else {
        "product_design=info"
    };

    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env().unwrap_or_else(|_| filter.into()),
        )
        .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
        .init();

    let config = match &cli.config {
        Some(path) => Config::load_from(path)?,
        None => Config::load()?,
    };

    match cli.command {
        Commands::Run { topic } => {
            let topic = if topic.is_empty() {
                Topic::new(cli::SAMPLE_TOPIC)?
            } else {
                Topic::new(&topic.join(" "))?
            };
            let credentials = load_credentials(&cli.secrets)?;
            cli::run_kickoff(&config, &credentials, topic).await?;
        }
        Commands::Serve { host, port } => {
            let credentials = load_credentials(&cli.secrets)?;
            let host = host.unwrap_or_else(|| config.server.host.clone());
            let port = port.unwrap_or(config.server.port);
            let crew = Arc::new(Crew::from_config(&config, &credentials)?);
            http::run_http_server(crew, &config.llm.model, &host, port).await?;
        }
        Commands::Train {
            n_iterations,
            filename,
        } => {
            let credentials = load_credentials(&cli.secrets)?;
            cli::run_train(&config, &credentials, n_iterations, &filename).await?;
        }
        Commands::Replay { task_id } => {
            let credentials = load_credentials(&cli.secrets)?;
            cli::run_replay(&config, &credentials, &task_id).await?;
        }
        Commands::Test {
            n_iterations,
            model,
        } => {
            let credentials = load_credentials(&cli.secrets)?;
            cli::run_test(&config, &credentials, n_iterations, &model).await?;
        }
    }

    Ok(())
}
