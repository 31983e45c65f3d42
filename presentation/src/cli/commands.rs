//! CLI command definitions

use clap::{Args, Parser, Subcommand, ValueEnum};
use std::path::PathBuf;

/// Output format for command results
#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum OutputFormat {
    /// Human-readable, colored text
    Text,
    /// Pretty-printed JSON
    Json,
}

impl From<OutputFormat> for dispatch_domain::OutputFormat {
    fn from(format: OutputFormat) -> Self {
        match format {
            OutputFormat::Text => dispatch_domain::OutputFormat::Text,
            OutputFormat::Json => dispatch_domain::OutputFormat::Json,
        }
    }
}

/// Task status filter for `tasks`
#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum StatusFilter {
    Pending,
    Running,
    Completed,
    Failed,
}

impl From<StatusFilter> for dispatch_domain::TaskStatus {
    fn from(filter: StatusFilter) -> Self {
        match filter {
            StatusFilter::Pending => dispatch_domain::TaskStatus::Pending,
            StatusFilter::Running => dispatch_domain::TaskStatus::Running,
            StatusFilter::Completed => dispatch_domain::TaskStatus::Completed,
            StatusFilter::Failed => dispatch_domain::TaskStatus::Failed,
        }
    }
}

/// CLI arguments for agent-dispatch
#[derive(Parser, Debug)]
#[command(name = "agent-dispatch")]
#[command(author, version, about = "Route requests to agents and run background work")]
#[command(long_about = r#"
agent-dispatch classifies free-text requests, routes them to one of six agents
(research, navigation, shopping, communication, automation, analysis), builds
an execution plan, and runs deferred work through a persistent priority queue
with retry and exponential backoff.

Configuration files are loaded from (in priority order):
1. AGENT_DISPATCH_* environment variables
2. --config <path>     Explicit config file
3. ./dispatch.toml     Project-level config
4. ~/.config/agent-dispatch/config.toml   Global config

Example:
  agent-dispatch classify "find best laptop deals"
  agent-dispatch submit --dispatch "keep me updated on rust releases"
  agent-dispatch schedule data_maintenance --priority 5 --delay 60
  agent-dispatch work --until-idle
"#)]
pub struct Cli {
    /// Required unless `--show-config` is given
    #[command(subcommand)]
    pub command: Option<Command>,

    /// Output format
    #[arg(short, long, value_enum, global = true)]
    pub output: Option<OutputFormat>,

    /// Verbosity level (-v = info, -vv = debug, -vvv = trace)
    #[arg(short, long, action = clap::ArgAction::Count, global = true)]
    pub verbose: u8,

    /// Also write logs to daily-rotated files in this directory
    #[arg(long, value_name = "DIR", global = true)]
    pub log_dir: Option<PathBuf>,

    /// Path to configuration file
    #[arg(long, value_name = "PATH", global = true)]
    pub config: Option<PathBuf>,

    /// Disable loading of configuration files
    #[arg(long, global = true)]
    pub no_config: bool,

    /// Task store file (overrides storage.path)
    #[arg(long, value_name = "PATH", global = true)]
    pub store: Option<PathBuf>,

    /// Show configuration file locations and exit
    #[arg(long)]
    pub show_config: bool,
}

#[derive(Subcommand, Debug)]
pub enum Command {
    /// Score a request against every agent
    Classify(RequestArgs),

    /// Build the execution plan for a request
    Plan(RequestArgs),

    /// Plan a request and schedule its deferred work
    Submit {
        #[command(flatten)]
        request: RequestArgs,

        /// Also run the plan's immediate steps (dry run)
        #[arg(long)]
        dispatch: bool,
    },

    /// Schedule a background task directly
    Schedule(ScheduleArgs),

    /// Run queued tasks (dry run)
    Work(WorkArgs),

    /// List background tasks
    Tasks {
        /// Only tasks in this status
        #[arg(short, long, value_enum)]
        status: Option<StatusFilter>,

        /// Show one task by id
        #[arg(long, value_name = "ID", conflicts_with = "status")]
        id: Option<String>,
    },

    /// Outcome statistics and queue counts
    Stats {
        /// Restrict statistics to one agent id
        #[arg(short, long, value_name = "AGENT")]
        agent: Option<String>,
    },
}

#[derive(Args, Debug, Clone)]
pub struct RequestArgs {
    /// The request text
    #[arg(required = true, num_args = 1..)]
    pub text: Vec<String>,
}

impl RequestArgs {
    /// Words joined back into one request.
    pub fn request(&self) -> String {
        self.text.join(" ")
    }
}

#[derive(Args, Debug, Clone)]
pub struct ScheduleArgs {
    /// Task type (autonomous_goal_execution, research_monitoring,
    /// price_monitoring, data_maintenance, agent_learning)
    pub task_type: String,

    /// Lower runs first
    #[arg(short, long, default_value_t = 5, allow_negative_numbers = true)]
    pub priority: i32,

    /// JSON payload
    #[arg(long, value_name = "JSON")]
    pub payload: Option<String>,

    /// Seconds from now before the task becomes eligible
    #[arg(long, value_name = "SECS", conflicts_with = "at")]
    pub delay: Option<u64>,

    /// RFC 3339 time at which the task becomes eligible
    #[arg(long, value_name = "TIME")]
    pub at: Option<String>,

    /// Owning agent id (default: system)
    #[arg(long, value_name = "AGENT")]
    pub agent: Option<String>,

    /// Retries before the task fails permanently
    #[arg(long, value_name = "N")]
    pub max_retries: Option<u32>,
}

#[derive(Args, Debug, Clone)]
pub struct WorkArgs {
    /// Stop once nothing is eligible instead of waiting for new work
    #[arg(long)]
    pub until_idle: bool,

    /// Maximum concurrent tasks (overrides scheduler.concurrency)
    #[arg(short = 'j', long, value_name = "N")]
    pub concurrency: Option<usize>,

    /// Simulated execution time per task, in milliseconds
    #[arg(long, value_name = "MS", default_value_t = 0)]
    pub latency_ms: u64,
}
