//! taskshot: activity tracker CLI
//!
//! Configure a provider, manage projects, track a frame source and export
//! timesheets from the local database.

use std::path::{Path, PathBuf};
use std::sync::Arc;

use chrono::{DateTime, Local, TimeZone, Utc};
use clap::{Parser, Subcommand};
use tokio::sync::watch;

use taskshot::classifier::TaskClassifier;
use taskshot::store::{ensure_default_project, save_project};
use taskshot::timesheet::{self, DateRange, TimeSummary};
use taskshot::{
    ActiveConfiguration, AppConfig, CaptureOrchestrator, ClassificationGateway, FileCaptureSource,
    FileCredentialStore, FileSettingsStore, Project, ProjectStore, ProviderGateway,
    ProviderRegistry, SqliteStore, Task, TaskStore, TrackerEvents, TrackingState,
};

/// Taskshot activity tracker
#[derive(Parser)]
#[command(name = "taskshot")]
#[command(version = taskshot::version::PKG_VERSION)]
#[command(about = "Screen-capture activity tracker")]
struct Args {
    /// Config file (default: ~/.taskshot/config.toml)
    #[arg(short, long, env = "TASKSHOT_CONFIG")]
    config: Option<PathBuf>,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand)]
enum Command {
    /// List providers and their models
    Providers,

    /// Select the active provider and models
    Configure {
        #[arg(long)]
        provider: String,
        #[arg(long)]
        vision_model: String,
        #[arg(long)]
        text_model: String,
        /// Credential for providers that need one
        #[arg(long, env = "TASKSHOT_API_KEY", hide_env_values = true)]
        api_key: Option<String>,
    },

    /// Show the active provider and gateway state
    Status,

    /// Manage projects
    Projects {
        #[command(subcommand)]
        command: ProjectsCommand,
    },

    /// Classify a description of on-screen activity
    Classify {
        description: String,
    },

    /// Track activity from an image file until Ctrl-C
    Track {
        /// Image file re-read on every capture
        #[arg(long)]
        frame: PathBuf,
        /// Minutes between captures (default: from config)
        #[arg(long)]
        interval: Option<u64>,
    },

    /// Export tasks as a CSV timesheet
    Export {
        /// today, yesterday, week, month or all
        #[arg(long, default_value = "all")]
        range: DateRange,
        /// Output file (default: taskshot_timesheet_<date>.csv)
        #[arg(long)]
        out: Option<PathBuf>,
    },

    /// Summarize tracked time
    Summary {
        #[arg(long, default_value = "today")]
        range: DateRange,
    },

    /// Print version information
    Version,
}

#[derive(Subcommand)]
enum ProjectsCommand {
    /// List projects (seeds a default project into an empty catalog)
    List,

    /// Add a project
    Add {
        name: String,
        #[arg(long, default_value = "")]
        description: String,
        /// Hourly rate; makes the project billable
        #[arg(long)]
        rate: Option<f64>,
        /// Supported category (repeatable)
        #[arg(long = "category")]
        categories: Vec<String>,
        /// Make this the default project
        #[arg(long)]
        default: bool,
    },
}

/// Prints tracker events to the terminal and mirrors the state into a watch channel.
struct ConsoleEvents {
    state: watch::Sender<TrackingState>,
}

impl TrackerEvents for ConsoleEvents {
    fn task_recorded(&self, task: &Task) {
        println!(
            "{}  {:<30} {:>3}%  {}",
            task.end_time.with_timezone(&Local).format("%H:%M"),
            task.name,
            (task.confidence * 100.0).round(),
            task.project
        );
    }

    fn alert(&self, message: &str) {
        eprintln!("taskshot: {message}");
    }

    fn state_changed(&self, state: TrackingState) {
        self.state.send_replace(state);
    }
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    // Initialise tracing (default: taskshot=info; override with RUST_LOG).
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("taskshot=info")),
        )
        .init();

    let args = Args::parse();

    if let Command::Version = args.command {
        println!("taskshot {}", taskshot::version::version_string());
        return Ok(());
    }

    let config = AppConfig::load(args.config.as_deref())?;
    let gateway = Arc::new(build_gateway(&config)?);
    let store = Arc::new(SqliteStore::open(config.database_path())?);

    match args.command {
        Command::Providers => {
            for provider in gateway.available_providers() {
                let credential = if provider.requires_credential {
                    "credential required"
                } else {
                    "no credential"
                };
                println!("{} ({}, {credential})", provider.id, provider.name);
                for model in provider.models {
                    println!("  {:<28} {:<7} {}", model.id, model.capability, model.name);
                }
            }
        }

        Command::Configure {
            provider,
            vision_model,
            text_model,
            api_key,
        } => {
            let selection = ActiveConfiguration::new(provider, vision_model, text_model);
            let state = gateway.save_settings(selection, api_key.as_deref()).await?;
            println!("saved; gateway {state}");
        }

        Command::Status => {
            let state = match gateway.initialize().await {
                Ok(state) => state,
                Err(e) => {
                    eprintln!("taskshot: {e}");
                    gateway.state()
                }
            };
            match gateway.active_configuration() {
                Some(active) => println!(
                    "provider {} (vision {}, text {})",
                    active.provider_id, active.vision_model_id, active.text_model_id
                ),
                None => println!("no provider configured"),
            }
            println!("gateway {state}");
        }

        Command::Projects { command } => match command {
            ProjectsCommand::List => {
                for project in ensure_default_project(store.as_ref()).await? {
                    print_project(&project);
                }
            }
            ProjectsCommand::Add {
                name,
                description,
                rate,
                categories,
                default,
            } => {
                let mut project = Project::new(name).description(description);
                if let Some(rate) = rate {
                    project = project.billable(rate);
                }
                for category in categories {
                    project = project.category(category);
                }
                if default {
                    project = project.as_default();
                }
                save_project(store.as_ref(), &project).await?;
                print_project(&project);
            }
        },

        Command::Classify { description } => {
            gateway.initialize().await?;
            let classifier = classifier(&config, gateway.clone());
            let catalog = ensure_default_project(store.as_ref()).await?;
            let recent = store
                .get_recent_tasks(config.tracking.context_task_limit)
                .await?;
            let result = classifier.classify(&description, &catalog, &recent).await?;
            println!("{}", serde_json::to_string_pretty(&result)?);
        }

        Command::Track { frame, interval } => {
            gateway.initialize().await?;
            ensure_default_project(store.as_ref()).await?;
            track(&config, gateway, store, &frame, interval).await?;
        }

        Command::Export { range, out } => {
            let tasks = tasks_in_range(store.as_ref(), range).await?;
            let projects = store.get_all_projects().await?;
            let csv = timesheet::to_csv(&tasks, &projects, &Local);
            let path = out.unwrap_or_else(|| {
                PathBuf::from(timesheet::default_filename(Local::now().date_naive()))
            });
            std::fs::write(&path, csv)?;
            println!("exported {} tasks to {}", tasks.len(), path.display());
        }

        Command::Summary { range } => {
            let tasks = tasks_in_range(store.as_ref(), range).await?;
            let summary = TimeSummary::from_tasks(&tasks);
            println!(
                "Total Time: {}h ({}h billable)",
                summary.total_hours(),
                summary.billable_hours()
            );
            for (project, hours) in summary.project_hours() {
                println!("  {project}: {hours}h");
            }
        }

        Command::Version => println!("taskshot {}", taskshot::version::version_string()),
    }

    Ok(())
}

fn build_gateway(config: &AppConfig) -> taskshot::Result<ProviderGateway> {
    let registry = match config.registry_path() {
        Some(path) => ProviderRegistry::load(&path)?,
        None => ProviderRegistry::with_embedded_seed()?,
    };
    let mut builder = ProviderGateway::builder()
        .registry(registry)
        .settings_store(Arc::new(FileSettingsStore::new(config.settings_path())))
        .credential_store(Arc::new(FileCredentialStore::new(config.secrets_path())))
        .defaults(config.active_defaults());
    if let Some(timeout) = config.http_timeout() {
        builder = builder.timeout(timeout);
    }
    builder.build()
}

fn classifier(config: &AppConfig, gateway: Arc<ProviderGateway>) -> TaskClassifier {
    TaskClassifier::new(gateway)
        .with_categories(config.classifier.categories.clone())
        .with_history_lines(config.tracking.history_lines)
}

async fn track(
    config: &AppConfig,
    gateway: Arc<ProviderGateway>,
    store: Arc<SqliteStore>,
    frame: &Path,
    interval: Option<u64>,
) -> Result<(), Box<dyn std::error::Error>> {
    let (state_tx, mut state_rx) = watch::channel(TrackingState::Idle);
    let tracker = CaptureOrchestrator::builder(
        classifier(config, gateway),
        store.clone(),
        store,
        Arc::new(FileCaptureSource::new(frame)),
    )
    .events(Arc::new(ConsoleEvents { state: state_tx }))
    .options(config.tracker_options())
    .build();
    if let Some(minutes) = interval {
        tracker.set_capture_interval(minutes)?;
    }

    tracker.start().await?;
    println!("tracking {} (Ctrl-C to stop)", frame.display());

    tokio::select! {
        _ = tokio::signal::ctrl_c() => {}
        _ = state_rx.wait_for(|state| *state != TrackingState::Tracking) => {}
    }
    tracker.stop();
    Ok(())
}

/// Tasks whose timestamp falls in `range`, oldest first.
async fn tasks_in_range(store: &SqliteStore, range: DateRange) -> taskshot::Result<Vec<Task>> {
    let now = Local::now();
    let (start, end) = range.bounds(&now);
    let start = start.unwrap_or(DateTime::<Utc>::UNIX_EPOCH);
    // Open-ended ranges query up to the end of year 9999.
    let end = end
        .or_else(|| Utc.with_ymd_and_hms(9999, 12, 31, 0, 0, 0).single())
        .unwrap_or(now.with_timezone(&Utc));
    let tasks = store.tasks_between(start, end).await?;
    Ok(range.filter(&tasks, &now).into_iter().cloned().collect())
}

fn print_project(project: &Project) {
    let marker = if project.is_default_project { "*" } else { " " };
    let rate = if project.default_billable {
        format!("${}/hour", project.billable_rate)
    } else {
        "non-billable".to_string()
    };
    println!("{marker} {:<36} {:<24} {rate}", project.id, project.name);
}
