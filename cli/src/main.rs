//! CLI entrypoint for agent-dispatch
//!
//! This is the main binary that wires together all layers using
//! dependency injection.

use anyhow::{Context, Result, anyhow, bail};
use chrono::{DateTime, Utc};
use clap::{CommandFactory, Parser};
use dispatch_application::{
    ClassifyAndPlanUseCase, DispatchPlanUseCase, NoTelemetry, PerformanceSink, ScheduleRequest,
    Scheduler, SchedulerParams, WorkerPool,
};
use dispatch_domain::{AgentId, Lexicon, OutputFormat, TaskId, TaskRepository};
use dispatch_infrastructure::{
    ConfigLoader, DryRunExecutor, FileConfig, InMemoryTaskRepository, JsonFileTaskRepository,
    JsonlPerformanceSink, StorageBackend, load_lexicon,
};
use dispatch_presentation::{Cli, Command, ConsoleFormatter, ScheduleArgs, WorkArgs};
use std::sync::Arc;
use std::time::Duration;
use tokio_util::sync::CancellationToken;
use tracing::{info, warn};
use tracing_appender::non_blocking::WorkerGuard;
use tracing_subscriber::{EnvFilter, Layer, fmt, layer::SubscriberExt, util::SubscriberInitExt};

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    let _log_guard = init_logging(&cli)?;

    if cli.show_config {
        for line in ConfigLoader::describe_sources(cli.config.as_ref()) {
            println!("{}", line);
        }
        return Ok(());
    }

    let Some(command) = cli.command.as_ref() else {
        Cli::command().print_help()?;
        println!();
        bail!("A subcommand is required");
    };

    let config = load_config(&cli)?;
    let format = config.output.resolve_format(cli.output.map(Into::into));
    if !config.output.use_color(format) {
        colored::control::set_override(false);
    }

    info!("Starting agent-dispatch");

    // === Dependency Injection ===
    let routing = config.routing_params();
    let lexicon = match &config.classifier.lexicon {
        Some(path) => load_lexicon(path)?,
        None => Lexicon::default(),
    };
    let classifier = Arc::new(routing.classifier_for(Arc::new(lexicon)));
    info!(lexicon_version = %classifier.lexicon().version, "Classifier ready");
    let router = ClassifyAndPlanUseCase::new(classifier, routing.plan_builder());

    match command {
        Command::Classify(args) => {
            let classification = router.classify(&args.request());
            emit(format, &classification, || {
                ConsoleFormatter::format_classification(&classification)
            });
        }
        Command::Plan(args) => {
            let plan = router.plan(&args.request());
            emit(format, &plan, || ConsoleFormatter::format_plan(&plan));
        }
        Command::Submit { request, dispatch } => {
            let scheduler = Arc::new(open_scheduler(&cli, &config).await?);
            let routed = router
                .with_scheduler(scheduler)
                .submit(&request.request())
                .await?;

            if *dispatch {
                let use_case = DispatchPlanUseCase::new(Arc::new(DryRunExecutor::new()))
                    .with_telemetry(telemetry_sink(&config));
                let report = use_case.execute(&routed.plan).await;
                let value = serde_json::json!({ "routed": routed, "dispatch": report });
                emit(format, &value, || {
                    let mut output = ConsoleFormatter::format_routed(&routed);
                    output.push_str(&ConsoleFormatter::format_dispatch(&report));
                    output
                });
                if !report.is_success() {
                    warn!(plan_id = %report.plan_id, "Primary step failed");
                }
            } else {
                emit(format, &routed, || ConsoleFormatter::format_routed(&routed));
            }
        }
        Command::Schedule(args) => {
            let scheduler = open_scheduler(&cli, &config).await?;
            let id = scheduler.schedule(schedule_request(args)?).await?;
            let task = scheduler.task(&id).await?;
            emit(format, &task, || ConsoleFormatter::format_scheduled(&id, &task));
        }
        Command::Work(args) => {
            let scheduler = Arc::new(open_scheduler(&cli, &config).await?);
            run_workers(scheduler, &config, args, format).await?;
        }
        Command::Tasks { status, id } => {
            let scheduler = open_scheduler(&cli, &config).await?;
            match id {
                Some(id) => {
                    let task = scheduler.task(&TaskId::new(id.as_str())).await?;
                    emit(format, &task, || ConsoleFormatter::format_task(&task));
                }
                None => {
                    let tasks = scheduler.list(status.map(Into::into)).await?;
                    emit(format, &tasks, || ConsoleFormatter::format_task_list(&tasks));
                }
            }
        }
        Command::Stats { agent } => {
            let scheduler = open_scheduler(&cli, &config).await?;
            let agent_id = agent.as_deref().map(AgentId::new);
            let stats = scheduler.stats(agent_id.as_ref()).await?;
            let overview = scheduler.overview().await?;
            let value = serde_json::json!({ "stats": stats, "queue": overview });
            emit(format, &value, || {
                ConsoleFormatter::format_stats(&stats, &overview, agent.as_deref())
            });
        }
    }

    Ok(())
}

/// Console logging from the verbosity flag, plus an optional daily file.
///
/// The returned guard must live until exit so buffered file logs flush.
fn init_logging(cli: &Cli) -> Result<Option<WorkerGuard>> {
    let level = match cli.verbose {
        0 => "warn",
        1 => "info",
        2 => "debug",
        _ => "trace", // -vvv or more
    };

    let console = fmt::layer()
        .with_target(false)
        .with_writer(std::io::stderr)
        .with_filter(EnvFilter::new(level));

    let (file, guard) = match &cli.log_dir {
        Some(dir) => {
            std::fs::create_dir_all(dir)
                .with_context(|| format!("Failed to create log directory {}", dir.display()))?;
            let appender = tracing_appender::rolling::daily(dir, "agent-dispatch.log");
            let (writer, guard) = tracing_appender::non_blocking(appender);
            let layer = fmt::layer()
                .with_ansi(false)
                .with_writer(writer)
                .with_filter(EnvFilter::new("debug"));
            (Some(layer), Some(guard))
        }
        None => (None, None),
    };

    tracing_subscriber::registry()
        .with(console)
        .with(file)
        .init();

    Ok(guard)
}

fn load_config(cli: &Cli) -> Result<FileConfig> {
    let config = if cli.no_config {
        ConfigLoader::load_defaults()
    } else {
        if let Some(path) = &cli.config
            && !path.exists()
        {
            bail!("Config file not found: {}", path.display());
        }
        ConfigLoader::load(cli.config.as_ref())
            .map_err(|e| anyhow!("Failed to load configuration: {}", e))?
    };

    let errors = config.validate();
    if !errors.is_empty() {
        let messages: Vec<String> = errors.iter().map(|e| format!("  - {}", e)).collect();
        bail!("Invalid configuration:\n{}", messages.join("\n"));
    }
    Ok(config)
}

async fn open_scheduler(cli: &Cli, config: &FileConfig) -> Result<Scheduler> {
    let options = config.storage.to_store_options();
    let repository: Arc<dyn TaskRepository> = match (&cli.store, config.storage.backend) {
        (Some(path), _) => Arc::new(JsonFileTaskRepository::open_with(path, options).await?),
        (None, StorageBackend::File) => {
            let path = config.storage.resolved_path();
            Arc::new(
                JsonFileTaskRepository::open_with(&path, options)
                    .await
                    .with_context(|| format!("Failed to open task store {}", path.display()))?,
            )
        }
        (None, StorageBackend::Memory) => {
            warn!("Using in-memory task store; tasks are discarded on exit");
            Arc::new(InMemoryTaskRepository::new())
        }
    };

    let params = config.scheduler.to_scheduler_params()?;
    Ok(Scheduler::new(repository).with_params(&params))
}

fn telemetry_sink(config: &FileConfig) -> Arc<dyn PerformanceSink> {
    match config
        .telemetry
        .resolved_path()
        .and_then(JsonlPerformanceSink::new)
    {
        Some(sink) => Arc::new(sink),
        None => Arc::new(NoTelemetry),
    }
}

fn schedule_request(args: &ScheduleArgs) -> Result<ScheduleRequest> {
    let mut request = ScheduleRequest::new(args.task_type.as_str(), args.priority);

    if let Some(raw) = &args.payload {
        let payload: serde_json::Value =
            serde_json::from_str(raw).context("--payload is not valid JSON")?;
        request = request.with_payload(payload);
    }
    if let Some(secs) = args.delay {
        request = request.after(Duration::from_secs(secs));
    }
    if let Some(at) = &args.at {
        let when = DateTime::parse_from_rfc3339(at)
            .with_context(|| format!("--at is not an RFC 3339 time: {}", at))?
            .with_timezone(&Utc);
        request = request.at(when);
    }
    if let Some(agent) = &args.agent {
        request = request.with_agent(agent.as_str());
    }
    if let Some(max_retries) = args.max_retries {
        request = request.with_max_retries(max_retries);
    }
    Ok(request)
}

async fn run_workers(
    scheduler: Arc<Scheduler>,
    config: &FileConfig,
    args: &WorkArgs,
    format: OutputFormat,
) -> Result<()> {
    let mut params: SchedulerParams = config.scheduler.to_scheduler_params()?;
    if let Some(concurrency) = args.concurrency {
        params = params.with_concurrency(concurrency);
    }

    let executor =
        Arc::new(DryRunExecutor::new().with_latency(Duration::from_millis(args.latency_ms)));
    let pool = WorkerPool::new(scheduler, executor)
        .with_telemetry(telemetry_sink(config))
        .with_params(params);

    let summary = if args.until_idle {
        pool.run_until_idle().await?
    } else {
        let cancel = CancellationToken::new();
        let on_signal = cancel.clone();
        tokio::spawn(async move {
            if tokio::signal::ctrl_c().await.is_ok() {
                info!("Interrupt received, draining in-flight tasks");
            }
            on_signal.cancel();
        });
        eprintln!("Waiting for tasks (Ctrl-C to stop)...");
        pool.run(cancel).await
    };

    emit(format, &summary, || ConsoleFormatter::format_worker_summary(&summary));
    Ok(())
}

fn emit<T: serde::Serialize + ?Sized>(
    format: OutputFormat,
    value: &T,
    text: impl FnOnce() -> String,
) {
    match format {
        OutputFormat::Json => println!("{}", ConsoleFormatter::format_json(value)),
        OutputFormat::Text => print!("{}", text()),
    }
}
