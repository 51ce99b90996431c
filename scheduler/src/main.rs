//! `geo-tracker` command line entry point
//!
//! Wires the store, provider registry, batch runner, keyword analytics and
//! scheduler together, then runs one subcommand or the scheduling daemon.

use anyhow::{anyhow, Context};
use clap::{Parser, Subcommand};
use std::path::PathBuf;
use std::sync::Arc;
use tokio::signal;
use tokio_util::sync::CancellationToken;
use uuid::Uuid;

use analytics::{ExclusionList, KeywordEngine, StatsAggregator};
use executor::{bootstrap_registry, BatchRunner, Coordinator, ProviderKeys};
use scheduler::{AppConfig, Scheduler, SchedulerOptions};
use shared::logging::{self, init_tracing, Component};
use shared::{component_debug, LlmConfig, MemoryStore, Prompt, Schedule, Store, TemperatureSetting, TimeWindow};

/// Track how generative models mention brands over time
#[derive(Parser)]
#[command(name = "geo-tracker")]
#[command(about = "Runs prompts against LLM providers on cron schedules and reports keyword statistics")]
struct Args {
    /// JSON configuration file (GEO_* environment variables override it)
    #[arg(long)]
    config: Option<PathBuf>,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand)]
enum Command {
    /// Run the scheduler until Ctrl+C; SIGHUP reloads the exclusion words
    Daemon,
    /// Run one schedule immediately
    ExecuteNow { schedule_id: Uuid },
    /// Run every enabled prompt against every enabled LLM once
    RunOnce {
        /// Only prompts without any stored response
        #[arg(long)]
        new_only: bool,
        /// Fixed value between 0.0 and 2.0, or "random"
        #[arg(long, default_value = "0.7")]
        temperature: TemperatureSetting,
    },
    /// Store a prompt
    AddPrompt {
        text: String,
        #[arg(long = "tag")]
        tags: Vec<String>,
    },
    /// Store an LLM configuration
    AddLlm {
        name: String,
        provider: String,
        model: String,
        #[arg(long)]
        credential: Option<String>,
        #[arg(long)]
        base_url: Option<String>,
    },
    /// Register a cron schedule over stored prompts and LLMs
    AddSchedule {
        name: String,
        /// Five-field cron expression, e.g. "0 9 * * 1-5"
        cron: String,
        #[arg(long = "prompt", required = true)]
        prompts: Vec<Uuid>,
        #[arg(long = "llm", required = true)]
        llms: Vec<Uuid>,
        #[arg(long, default_value = "0.7")]
        temperature: TemperatureSetting,
    },
    /// Most mentioned keywords
    TopKeywords {
        #[arg(long, default_value = "20")]
        limit: usize,
        /// Only responses from the last N days
        #[arg(long)]
        days: Option<i64>,
    },
    /// Breakdown of one keyword
    Keyword {
        name: String,
        #[arg(long)]
        days: Option<i64>,
    },
    /// Models offered by the provider behind a stored LLM
    ListModels { llm_id: Uuid },
    /// Validate and count the configured exclusion word file
    ReloadExclusions,
}

struct App {
    config: AppConfig,
    store: Arc<dyn Store>,
    runner: Arc<BatchRunner>,
    coordinator: Arc<Coordinator>,
    engine: Arc<KeywordEngine>,
}

impl App {
    async fn build(config: AppConfig) -> anyhow::Result<Self> {
        let store: Arc<dyn Store> = match &config.store_path {
            Some(path) => Arc::new(
                MemoryStore::open(path)
                    .await
                    .with_context(|| format!("opening store {}", path.display()))?,
            ),
            None => Arc::new(MemoryStore::new()),
        };

        let exclusions = match &config.exclusion_words {
            Some(path) => ExclusionList::from_file(path).await?,
            None => ExclusionList::builtin(),
        };

        let registry = Arc::new(bootstrap_registry(ProviderKeys::from_env()));
        component_debug!(Component::Executor, "Providers: {}", registry.names().join(", "));
        let coordinator = Arc::new(Coordinator::new(store.clone(), registry));
        let runner = Arc::new(BatchRunner::new(coordinator.clone(), store.clone()));

        Ok(Self {
            config,
            store,
            runner,
            coordinator,
            engine: Arc::new(KeywordEngine::new(Arc::new(exclusions))),
        })
    }

    fn stats(&self) -> StatsAggregator {
        StatsAggregator::new(self.store.clone(), self.engine.clone())
    }

    fn scheduler(&self) -> Scheduler {
        Scheduler::start(
            self.store.clone(),
            self.runner.clone(),
            SchedulerOptions {
                tick_interval: self.config.tick_interval(),
                batch: self.config.batch_options(),
            },
        )
    }
}

fn window(days: Option<i64>) -> TimeWindow {
    match days {
        Some(days) => TimeWindow::last(chrono::Duration::days(days), chrono::Utc::now()),
        None => TimeWindow::all(),
    }
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let _ = dotenv::dotenv();
    let args = Args::parse();

    let config = AppConfig::load(args.config.as_deref())?;
    init_tracing(Some(&config.log_level));

    let app = App::build(config).await?;

    match args.command {
        Command::Daemon => run_daemon(&app).await?,
        Command::ExecuteNow { schedule_id } => {
            let scheduler = app.scheduler();
            let result = scheduler.execute_now(schedule_id).await;
            scheduler.shutdown().await;
            println!("{}", result?);
        }
        Command::RunOnce { new_only, temperature } => {
            let options = executor::BatchOptions {
                new_only,
                temperature,
                ..app.config.batch_options()
            };
            let cancel = CancellationToken::new();
            let ctrl_c = cancel.clone();
            tokio::spawn(async move {
                if signal::ctrl_c().await.is_ok() {
                    logging::log_shutdown(Component::Executor, "Received Ctrl+C signal");
                    ctrl_c.cancel();
                }
            });
            let summary = app.runner.run_enabled(&options, &cancel).await?;
            println!("{}", summary);
            for failure in &summary.failures {
                println!("  {} / {}: {}", failure.prompt_id, failure.llm_name, failure.error);
            }
        }
        Command::AddPrompt { text, tags } => {
            let mut prompt = Prompt::new(text);
            prompt.tags = tags;
            app.store.create_prompt(prompt.clone()).await?;
            println!("{}", prompt.id);
        }
        Command::AddLlm {
            name,
            provider,
            model,
            credential,
            base_url,
        } => {
            if app.coordinator.registry().get(&provider).is_none() {
                return Err(anyhow!(
                    "unknown provider '{}' (available: {})",
                    provider,
                    app.coordinator.registry().names().join(", ")
                ));
            }
            let mut llm = LlmConfig::new(name, provider, model);
            if let Some(credential) = credential {
                llm = llm.with_credential(credential);
            }
            if let Some(base_url) = base_url {
                llm = llm.with_base_url(base_url);
            }
            app.store.create_llm(llm.clone()).await?;
            println!("{}", llm.id);
        }
        Command::AddSchedule {
            name,
            cron,
            prompts,
            llms,
            temperature,
        } => {
            let scheduler = app.scheduler();
            let schedule = Schedule::new(name, cron)
                .with_prompts(prompts)
                .with_llms(llms)
                .with_temperature(temperature);
            let result = scheduler.register_schedule(schedule).await;
            scheduler.shutdown().await;
            let schedule = result?;
            println!("{} next run: {:?}", schedule.id, schedule.next_run);
        }
        Command::TopKeywords { limit, days } => {
            for (keyword, count) in app.stats().top_keywords(limit, window(days)).await? {
                println!("{:>6}  {}", count, keyword);
            }
        }
        Command::Keyword { name, days } => match app.stats().keyword_detail(&name, window(days)).await? {
            Some(detail) => println!("{}", serde_json::to_string_pretty(&detail)?),
            None => println!("'{}' not mentioned", name),
        },
        Command::ListModels { llm_id } => {
            let llm = app
                .store
                .get_llm(llm_id)
                .await?
                .ok_or_else(|| anyhow!("llm {} not found", llm_id))?;
            let provider = app
                .coordinator
                .registry()
                .get(&llm.provider)
                .ok_or_else(|| anyhow!("unknown provider '{}'", llm.provider))?;
            let models = provider
                .list_models(&llm.credential, llm.base_url.clone())
                .await
                .map_err(|e| anyhow!("listing {} models: {}", llm.provider, e))?;
            for model in models {
                match model.display_name {
                    Some(display) => println!("{}  ({})", model.id, display),
                    None => println!("{}", model.id),
                }
            }
        }
        Command::ReloadExclusions => {
            let count = app.engine.reload_exclusion_words().await?;
            println!("{} exclusion words", count);
        }
    }

    Ok(())
}

async fn run_daemon(app: &App) -> anyhow::Result<()> {
    logging::log_startup(Component::Scheduler, "geo-tracker daemon");
    let scheduler = Arc::new(app.scheduler());
    let ticker = scheduler.spawn_ticker();

    #[cfg(unix)]
    {
        let engine = app.engine.clone();
        let mut hangup = signal::unix::signal(signal::unix::SignalKind::hangup())?;
        tokio::spawn(async move {
            while hangup.recv().await.is_some() {
                if let Err(e) = engine.reload_exclusion_words().await {
                    logging::log_error(Component::Analytics, "Exclusion reload", &e);
                }
            }
        });
    }

    match signal::ctrl_c().await {
        Ok(()) => logging::log_shutdown(Component::Scheduler, "Received Ctrl+C signal"),
        Err(err) => logging::log_error(Component::Scheduler, "Signal handling", &err),
    }

    scheduler.shutdown().await;
    if let Err(e) = ticker.await {
        logging::log_error(Component::Scheduler, "Ticker task", &e);
    }
    logging::log_success(Component::Scheduler, "geo-tracker stopped gracefully");
    Ok(())
}
