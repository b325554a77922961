use std::path::PathBuf;

use clap::{Args, Parser, Subcommand};

/// Command line client for the Forge build service.
#[derive(Debug, Parser)]
#[command(name = "forge", version, about)]
pub struct Cli {
    /// RON config file; defaults to ./forge.ron when present.
    #[arg(long, global = true)]
    pub config: Option<PathBuf>,

    /// Base url of the service, overriding the config file.
    #[arg(long, global = true)]
    pub api_url: Option<String>,

    /// Poll interval in milliseconds, overriding the config file.
    #[arg(long = "poll-ms", global = true)]
    pub poll_ms: Option<u64>,

    #[command(subcommand)]
    pub command: Command,
}

#[derive(Debug, Subcommand)]
pub enum Command {
    /// Submit a new build.
    Submit(SubmitArgs),
    /// Poll the job list and print changes.
    Watch {
        /// Follow this job's details as well.
        #[arg(long)]
        job: Option<String>,
        /// Stop after this many poll ticks.
        #[arg(long)]
        ticks: Option<u64>,
    },
    /// List the workspace of a finished job, or print one file.
    Files {
        #[arg(long)]
        job: String,
        /// Workspace-relative path to print.
        #[arg(long)]
        read: Option<String>,
    },
    /// Ask for a change to an existing project.
    Chat {
        #[arg(long)]
        project: String,
        #[arg(long)]
        message: String,
    },
    /// Print a project's chat history.
    Messages {
        #[arg(long)]
        project: String,
    },
    /// Switch the generation provider.
    Provider { name: String },
    /// List known projects.
    Projects,
    /// Check that the service answers.
    Health,
}

#[derive(Debug, Args)]
pub struct SubmitArgs {
    #[arg(long)]
    pub name: String,

    /// Specification text.
    #[arg(long, conflicts_with = "spec_file", required_unless_present = "spec_file")]
    pub spec: Option<String>,

    /// Read the specification from a file.
    #[arg(long)]
    pub spec_file: Option<PathBuf>,

    #[arg(long)]
    pub stack: Option<String>,

    #[arg(long)]
    pub max_iters: Option<u32>,

    /// Keep polling until the job finishes.
    #[arg(long)]
    pub wait: bool,
}
