//! Console output formatter for routing and scheduling results

use colored::Colorize;
use dispatch_application::{DispatchReport, RoutedRequest, WorkerSummary};
use dispatch_domain::{
    AgentType, BackgroundTask, Classification, ExecutionPlan, QueueOverview, TaskId, TaskStats,
    TaskStatus, truncate,
};
use serde::Serialize;

/// Formats results for console display
pub struct ConsoleFormatter;

impl ConsoleFormatter {
    /// Format any serializable result as pretty JSON
    pub fn format_json<T: Serialize + ?Sized>(value: &T) -> String {
        serde_json::to_string_pretty(value).unwrap_or_else(|_| "{}".to_string())
    }

    /// Scores for every agent, primary first
    pub fn format_classification(c: &Classification) -> String {
        let mut output = String::new();

        output.push_str(&Self::header("Classification"));
        output.push('\n');
        output.push_str(&format!("{} {}\n", "Request:".cyan().bold(), c.request));
        output.push_str(&format!(
            "{} {} (confidence {})\n",
            "Primary:".cyan().bold(),
            c.primary_agent.display_name().green().bold(),
            c.confidence
        ));
        if !c.supporting_agents.is_empty() {
            let supporting: Vec<&str> = c.supporting_agents.iter().map(|a| a.as_str()).collect();
            output.push_str(&format!(
                "{} {}\n",
                "Supporting:".cyan().bold(),
                supporting.join(", ")
            ));
        }
        output.push_str(&format!(
            "{} {}  {} {}\n",
            "Complexity:".cyan().bold(),
            c.complexity,
            "Multi-agent:".cyan().bold(),
            c.needs_multiple_agents
        ));

        output.push_str(&Self::section_header("Scores"));
        for (agent, score) in c.scores.ranked() {
            output.push_str(&Self::score_line(agent, score, agent == c.primary_agent));
        }

        if !c.fired_overrides.is_empty() {
            output.push_str(&format!(
                "\n{} {}\n",
                "Overrides:".yellow().bold(),
                c.fired_overrides.join(", ")
            ));
        }
        if c.is_indeterminate() {
            output.push_str(&format!(
                "\n{}\n",
                "No keyword matched; using the default agent.".dimmed()
            ));
        }
        if let Some(deferred) = &c.deferred {
            output.push_str(&format!(
                "\n{} {} (priority {}, rule {})\n",
                "Deferred:".magenta().bold(),
                deferred.task_type,
                deferred.priority,
                deferred.rule
            ));
        }

        output
    }

    pub fn format_plan(plan: &ExecutionPlan) -> String {
        let mut output = String::new();

        output.push_str(&Self::header("Execution Plan"));
        output.push('\n');
        output.push_str(&format!("{} {}\n", "Plan:".cyan().bold(), plan.plan_id));
        output.push_str(&format!("{} {}\n", "Request:".cyan().bold(), plan.request));
        output.push_str(&format!(
            "{} {}  {} {}\n",
            "Complexity:".cyan().bold(),
            plan.complexity,
            "Confidence:".cyan().bold(),
            plan.confidence
        ));

        output.push_str(&Self::section_header("Steps"));
        for (i, step) in plan.steps.iter().enumerate() {
            output.push_str(&format!(
                "  {}. {:<20} {:<10} {}s\n",
                i + 1,
                step.agent.display_name(),
                step.role,
                step.timeout_budget.as_secs()
            ));
        }
        if plan.is_multi_agent() {
            output.push_str(&format!(
                "  {} {}s\n",
                "Total budget:".dimmed(),
                plan.total_budget().as_secs()
            ));
        }

        if let Some(deferred) = &plan.deferred {
            output.push_str(&format!(
                "\n{} {} (priority {})\n",
                "Deferred:".magenta().bold(),
                deferred.task_type,
                deferred.priority
            ));
        }

        output
    }

    pub fn format_routed(routed: &RoutedRequest) -> String {
        let mut output = Self::format_plan(&routed.plan);
        match &routed.scheduled_task {
            Some(id) => output.push_str(&format!(
                "{} {}\n",
                "Scheduled task:".green().bold(),
                id
            )),
            None if routed.plan.deferred.is_some() => output.push_str(&format!(
                "{}\n",
                "Deferred work was not scheduled.".yellow()
            )),
            None => {}
        }
        output
    }

    pub fn format_dispatch(report: &DispatchReport) -> String {
        let mut output = Self::section_header("Dispatch");
        for step in &report.steps {
            let label = format!("{} ({})", step.agent.display_name(), step.role);
            if step.success {
                output.push_str(&format!(
                    "  {} {} [{}ms]\n",
                    "✓".green(),
                    label.bold(),
                    step.duration_ms
                ));
                if let Some(content) = &step.content {
                    output.push_str(&Self::indent(content, "      "));
                    output.push('\n');
                }
            } else {
                output.push_str(&format!(
                    "  {} {}: {}\n",
                    "✗".red(),
                    label.bold(),
                    step.error.as_deref().unwrap_or("Unknown")
                ));
            }
        }
        output
    }

    pub fn format_scheduled(id: &TaskId, task: &BackgroundTask) -> String {
        format!(
            "{} {} ({}, priority {}, eligible at {})\n",
            "Scheduled:".green().bold(),
            id,
            task.task_type,
            task.priority,
            task.scheduled_for.to_rfc3339()
        )
    }

    /// One row per task, in claim order
    pub fn format_task_list(tasks: &[BackgroundTask]) -> String {
        if tasks.is_empty() {
            return format!("{}\n", "No tasks.".dimmed());
        }

        let mut output = format!(
            "{}\n",
            format!(
                "{:<36}  {:<26}  {:>4}  {:<9}  {:>5}  {}",
                "ID", "TYPE", "PRIO", "STATUS", "TRIES", "ELIGIBLE AT"
            )
            .bold()
        );
        for task in tasks {
            output.push_str(&format!(
                "{:<36}  {:<26}  {:>4}  {}  {:>5}  {}\n",
                task.id,
                task.task_type,
                task.priority,
                Self::status_label(task.status),
                format!("{}/{}", task.retry_count, task.max_retries),
                task.scheduled_for.format("%Y-%m-%d %H:%M:%S")
            ));
        }
        output
    }

    pub fn format_task(task: &BackgroundTask) -> String {
        let mut output = String::new();
        output.push_str(&Self::header("Background Task"));
        output.push('\n');

        let rows = [
            ("ID", task.id.to_string()),
            ("Type", task.task_type.to_string()),
            ("Agent", task.agent_id.to_string()),
            ("Priority", task.priority.to_string()),
            ("Retries", format!("{}/{}", task.retry_count, task.max_retries)),
            ("Created", task.created_at.to_rfc3339()),
            ("Eligible", task.scheduled_for.to_rfc3339()),
        ];
        output.push_str(&format!(
            "{:<10} {}\n",
            "Status".cyan().bold(),
            Self::status_label(task.status)
        ));
        for (label, value) in rows {
            output.push_str(&format!("{:<10} {}\n", label.cyan().bold(), value));
        }
        if let Some(started) = task.started_at {
            output.push_str(&format!("{:<10} {}\n", "Started".cyan().bold(), started.to_rfc3339()));
        }
        if let Some(finished) = task.completed_at {
            output.push_str(&format!("{:<10} {}\n", "Finished".cyan().bold(), finished.to_rfc3339()));
        }
        if let Some(error) = &task.last_error {
            output.push_str(&format!("{:<10} {}\n", "Error".red().bold(), error));
        }
        if !task.payload.is_null() {
            output.push_str(&format!("{}\n", "Payload".cyan().bold()));
            output.push_str(&Self::indent(&Self::format_json(&task.payload), "  "));
            output.push('\n');
        }
        output
    }

    pub fn format_stats(stats: &TaskStats, overview: &QueueOverview, agent: Option<&str>) -> String {
        let mut output = String::new();
        let title = match agent {
            Some(agent) => format!("Task Statistics: {}", truncate(agent, 30)),
            None => "Task Statistics".to_string(),
        };
        output.push_str(&Self::header(&title));
        output.push('\n');

        output.push_str(&format!(
            "{} {} finished ({} completed, {} failed)\n",
            "Total:".cyan().bold(),
            stats.total,
            stats.completed,
            stats.failed
        ));
        output.push_str(&format!(
            "{} {:.1}%\n",
            "Success rate:".cyan().bold(),
            stats.success_rate * 100.0
        ));
        output.push_str(&format!(
            "{} {:.0}ms\n",
            "Avg duration:".cyan().bold(),
            stats.avg_duration_ms
        ));
        output.push_str(&format!(
            "{} {}\n",
            "Avg quality:".cyan().bold(),
            stats
                .avg_quality
                .map(|q| format!("{:.2}", q))
                .unwrap_or_else(|| "n/a".to_string())
        ));

        output.push_str(&Self::section_header("Queue"));
        output.push_str(&format!(
            "  pending {}  running {}  completed {}  failed {}\n",
            overview.pending, overview.running, overview.completed, overview.failed
        ));
        output
    }

    pub fn format_worker_summary(summary: &WorkerSummary) -> String {
        let mut output = format!(
            "{} {} processed: {} completed, {} retrying, {} failed",
            "Worker:".cyan().bold(),
            summary.processed(),
            summary.completed.to_string().green(),
            summary.retried.to_string().yellow(),
            summary.failed.to_string().red()
        );
        if summary.unreported > 0 {
            output.push_str(&format!(", {} unreported", summary.unreported));
        }
        output.push('\n');
        output
    }

    fn score_line(agent: AgentType, score: u32, primary: bool) -> String {
        let bar = "█".repeat(score.min(40) as usize);
        let line = format!("  {:<14} {:>3} {}", agent.as_str(), score, bar);
        if primary {
            format!("{}\n", line.green().bold())
        } else if score == 0 {
            format!("{}\n", line.dimmed())
        } else {
            format!("{}\n", line)
        }
    }

    fn status_label(status: TaskStatus) -> String {
        let label = format!("{:<9}", status.as_str());
        match status {
            TaskStatus::Pending => label.yellow().to_string(),
            TaskStatus::Running => label.blue().to_string(),
            TaskStatus::Completed => label.green().to_string(),
            TaskStatus::Failed => label.red().to_string(),
        }
    }

    fn header(title: &str) -> String {
        let line = "=".repeat(60);
        format!("{}\n{:^60}\n{}", line.cyan(), title.bold(), line.cyan())
    }

    fn section_header(title: &str) -> String {
        format!("\n{}\n{}\n", title.cyan().bold(), "-".repeat(40))
    }

    /// Indent a multi-line string
    pub fn indent(text: &str, prefix: &str) -> String {
        text.lines()
            .map(|line| format!("{}{}", prefix, line))
            .collect::<Vec<_>>()
            .join("\n")
    }
}
