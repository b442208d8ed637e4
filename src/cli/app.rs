//! Main CLI application structure

use anyhow::Result;
use clap::{Parser, Subcommand};

use super::output::{Output, OutputFormat};
use super::{dep, query, task, watch};
use crate::storage::{Config, Project};

#[derive(Parser)]
#[command(name = "taskdag")]
#[command(author, version, about = "Local-first task dependency tracking")]
#[command(propagate_version = true)]
pub struct Cli {
    /// Output format (defaults to the global config, then text)
    #[arg(long, short = 'f', global = true)]
    pub format: Option<OutputFormat>,

    /// Enable debug logging on stderr
    #[arg(long, short = 'v', global = true)]
    pub verbose: bool,

    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand)]
pub enum Commands {
    /// Initialize a new taskdag project
    Init {
        /// Path to initialize (defaults to current directory)
        #[arg(default_value = ".")]
        path: String,
    },

    /// Manage tasks
    #[command(subcommand)]
    Task(task::TaskCommands),

    /// Manage dependencies between tasks
    #[command(subcommand)]
    Dep(dep::DepCommands),

    /// Show tasks ready to start
    Ready,

    /// Show tasks waiting on prerequisites
    Blocked,

    /// Show tasks grouped by topological level
    Levels,

    /// Show a task with its prerequisites and dependents
    Show {
        /// Task ID
        id: String,
    },

    /// Reload the graph from disk and check it for corruption and cycles
    Verify,

    /// Watch the stores and report ready-set changes
    Watch,
}

/// Main entry point for the CLI
pub fn run() -> Result<()> {
    let cli = Cli::parse();
    crate::logging::init(cli.verbose)?;

    let format = match cli.format {
        Some(format) => format,
        None => Config::load_global()?.default_format.into(),
    };
    let output = Output::new(format);

    tracing::debug!("taskdag starting");

    match cli.command {
        Commands::Init { path } => {
            let project = Project::init(&path)?;
            tracing::debug!(dir = %project.data_dir().display(), "created project directory");
            output.success(&format!(
                "Initialized taskdag project at {}",
                project.root().display()
            ));
        }

        Commands::Task(cmd) => task::run(cmd, &output)?,
        Commands::Dep(cmd) => dep::run(cmd, &output)?,

        Commands::Ready => query::ready(&output)?,
        Commands::Blocked => query::blocked(&output)?,
        Commands::Levels => query::levels(&output)?,
        Commands::Show { id } => query::show(&output, &id)?,
        Commands::Verify => query::verify(&output)?,

        Commands::Watch => watch::run(&output)?,
    }

    tracing::debug!("command completed");
    Ok(())
}
