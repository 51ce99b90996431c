//! Test helpers: a provider that blocks until released, and a wired scheduler

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use std::sync::atomic::{AtomicU32, Ordering};
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::{Notify, Semaphore};

use executor::{BatchRunner, Coordinator, GenerationRequest, ModelInfo, Provider, ProviderRegistry, ProviderResponse};
use scheduler::{Scheduler, SchedulerOptions};
use shared::{ApiFailure, LlmConfig, MemoryStore, Prompt, Schedule, ScheduleId, Store};

use super::fixtures::TestFixtures;

/// Provider whose calls wait on a gate; opening the gate lets every call through
pub struct GatedProvider {
    gate: Semaphore,
    started: Notify,
    calls: AtomicU32,
}

impl GatedProvider {
    pub fn closed() -> Self {
        Self {
            gate: Semaphore::new(0),
            started: Notify::new(),
            calls: AtomicU32::new(0),
        }
    }

    pub fn open() -> Self {
        let provider = Self::closed();
        provider.release();
        provider
    }

    /// Let current and future calls complete
    pub fn release(&self) {
        self.gate.close();
    }

    /// Resolves once a call has reached the gate
    pub async fn wait_started(&self) {
        self.started.notified().await;
    }

    pub fn calls(&self) -> u32 {
        self.calls.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl Provider for GatedProvider {
    fn name(&self) -> String {
        TestFixtures::PROVIDER.to_string()
    }

    async fn generate(&self, _request: &GenerationRequest) -> Result<ProviderResponse, ApiFailure> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        self.started.notify_one();
        // A closed semaphore fails every acquire immediately
        let _ = self.gate.acquire().await;
        Ok(TestFixtures::answer())
    }

    async fn list_models(&self, _credential: &str, _endpoint: Option<String>) -> Result<Vec<ModelInfo>, ApiFailure> {
        Ok(vec![ModelInfo::new("gated-model")])
    }
}

/// Scheduler over an in-memory store with one prompt and one LLM
pub struct Harness {
    pub store: Arc<MemoryStore>,
    pub provider: Arc<GatedProvider>,
    pub scheduler: Arc<Scheduler>,
    pub prompt: Prompt,
    pub llm: LlmConfig,
}

impl Harness {
    pub async fn new(provider: GatedProvider) -> Self {
        Self::with_store(provider, Arc::new(MemoryStore::new())).await
    }

    /// Harness over an existing store, e.g. one opened on a snapshot file
    pub async fn with_store(provider: GatedProvider, store: Arc<MemoryStore>) -> Self {
        let provider = Arc::new(provider);
        let registry = Arc::new(ProviderRegistry::new());
        registry.register(TestFixtures::PROVIDER, provider.clone());

        let dyn_store: Arc<dyn Store> = store.clone();
        let coordinator = Arc::new(Coordinator::new(dyn_store.clone(), registry));
        let runner = Arc::new(BatchRunner::new(coordinator, dyn_store.clone()));
        let scheduler = Arc::new(Scheduler::start(
            dyn_store,
            runner,
            SchedulerOptions {
                tick_interval: Duration::from_secs(60),
                batch: TestFixtures::batch_options(),
            },
        ));

        let prompt = TestFixtures::prompt("best project tracker");
        let llm = TestFixtures::llm("gated-llm");
        store.create_prompt(prompt.clone()).await.unwrap();
        store.create_llm(llm.clone()).await.unwrap();

        Self {
            store,
            provider,
            scheduler,
            prompt,
            llm,
        }
    }

    /// Daily schedule over the harness prompt and LLM
    pub fn schedule(&self, name: &str) -> Schedule {
        Schedule::new(name, TestFixtures::DAILY_NINE)
            .with_prompts([self.prompt.id])
            .with_llms([self.llm.id])
    }

    /// Register `schedule` and move its `next_run` to `due_at`
    pub async fn register_due(&self, schedule: Schedule, due_at: DateTime<Utc>) -> Schedule {
        let mut schedule = self.scheduler.register_schedule(schedule).await.unwrap();
        schedule.next_run = Some(due_at);
        self.store.update_schedule(schedule.clone()).await.unwrap();
        schedule
    }

    pub async fn stored(&self, id: ScheduleId) -> Schedule {
        self.store.get_schedule(id).await.unwrap().unwrap()
    }

    /// Wait until no schedule is running
    pub async fn wait_idle(&self) {
        for _ in 0..500 {
            if self.scheduler.running_schedules().await.unwrap().is_empty() {
                return;
            }
            tokio::time::sleep(Duration::from_millis(10)).await;
        }
        panic!("schedules still running");
    }
}
