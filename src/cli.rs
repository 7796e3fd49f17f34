use clap::{Parser, Subcommand, ValueEnum};
use std::path::PathBuf;

fn get_version() -> &'static str {
    const BASE_VERSION: &str = env!("CARGO_PKG_VERSION");

    // Tagged HEAD means a release build
    if let Some(tag) = option_env!("COWALE_KIT_GIT_TAG") {
        return tag;
    }

    let commit = option_env!("COWALE_KIT_GIT_COMMIT").unwrap_or("unknown");
    let branch = option_env!("COWALE_KIT_GIT_BRANCH").unwrap_or("unknown");

    // Computed once at startup
    let version = format!("v{}-{} ({})", BASE_VERSION, commit, branch);
    Box::leak(version.into_boxed_str())
}

#[derive(Parser, Debug)]
#[command(name = "cowale-kit")]
#[command(about = "AI Agent templates: Skills, Agents, and Workflows")]
#[command(version = get_version(), propagate_version = true)]
#[command(after_help = "Examples:\n  cowale-kit init\n  cowale-kit init --force\n  cowale-kit init --path=./myproject\n  cowale-kit update\n  cowale-kit status")]
pub struct Cli {
    /// Overwrite existing .agent/ folder
    #[arg(long, global = true)]
    pub force: bool,

    /// Install in a specific directory
    #[arg(long, value_name = "DIR", default_value = ".", global = true)]
    pub path: PathBuf,

    /// Use a specific branch (default: configured branch, usually 'main')
    #[arg(long, value_name = "NAME", global = true)]
    pub branch: Option<String>,

    /// Suppress output
    #[arg(short, long, global = true)]
    pub quiet: bool,

    /// Preview actions without executing
    #[arg(long, global = true)]
    pub dry_run: bool,

    /// Increase log verbosity (use multiple times for more detail)
    #[arg(short, long, action = clap::ArgAction::Count, global = true)]
    pub verbose: u8,

    #[command(subcommand)]
    pub command: Option<Commands>,
}

#[derive(Subcommand, Debug, Clone, PartialEq, Eq)]
pub enum Commands {
    /// Install .agent/ folder into your project
    Init,

    /// Update to the latest version from GitHub
    Update,

    /// Check installation status
    Status {
        /// Output format
        #[arg(long, value_enum, default_value_t = StatusFormat::Plain)]
        format: StatusFormat,
    },
}

#[derive(ValueEnum, Debug, Clone, Copy, PartialEq, Eq)]
pub enum StatusFormat {
    Plain,
    Json,
    Yaml,
}
