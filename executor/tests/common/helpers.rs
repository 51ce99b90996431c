//! Test helpers: scripted providers and a ready-wired pipeline

use async_trait::async_trait;
use std::collections::VecDeque;
use std::sync::atomic::{AtomicU32, Ordering};
use std::sync::{Arc, Mutex};
use std::time::Duration;

use executor::{
    BatchRunner, Coordinator, GenerationRequest, ModelInfo, Provider, ProviderRegistry, ProviderResponse,
};
use shared::{ApiFailure, MemoryStore, Store};

use super::fixtures::TestFixtures;

/// Scripted step of a provider
#[derive(Clone)]
pub enum Step {
    Reply(Result<ProviderResponse, ApiFailure>),
    /// Never completes; only cancellation or the call timeout ends it
    Hang,
}

/// Provider that replays a queue of outcomes and records every call
pub struct ScriptedProvider {
    script: Mutex<VecDeque<Step>>,
    fallback: Step,
    calls: AtomicU32,
    temperatures: Mutex<Vec<f32>>,
}

impl ScriptedProvider {
    /// Replays `steps`, then keeps answering successfully
    pub fn new(steps: Vec<Step>) -> Self {
        Self {
            script: Mutex::new(steps.into()),
            fallback: Step::Reply(Ok(TestFixtures::answer("Acme beats Globex."))),
            calls: AtomicU32::new(0),
            temperatures: Mutex::new(Vec::new()),
        }
    }

    pub fn always_ok() -> Self {
        Self::new(Vec::new())
    }

    pub fn always(step: Step) -> Self {
        let mut provider = Self::new(Vec::new());
        provider.fallback = step;
        provider
    }

    pub fn calls(&self) -> u32 {
        self.calls.load(Ordering::SeqCst)
    }

    pub fn temperatures(&self) -> Vec<f32> {
        self.temperatures.lock().unwrap().clone()
    }
}

#[async_trait]
impl Provider for ScriptedProvider {
    fn name(&self) -> String {
        TestFixtures::SCRIPTED_PROVIDER.to_string()
    }

    async fn generate(&self, request: &GenerationRequest) -> Result<ProviderResponse, ApiFailure> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        self.temperatures.lock().unwrap().push(request.temperature);
        let step = self.script.lock().unwrap().pop_front().unwrap_or_else(|| self.fallback.clone());
        match step {
            Step::Reply(result) => result,
            Step::Hang => std::future::pending().await,
        }
    }

    async fn list_models(&self, _credential: &str, _endpoint: Option<String>) -> Result<Vec<ModelInfo>, ApiFailure> {
        Ok(vec![ModelInfo::new("scripted-model")])
    }
}

/// Provider that records how many calls overlap
pub struct OverlapProvider {
    hold: Duration,
    in_flight: AtomicU32,
    peak: AtomicU32,
    calls: AtomicU32,
}

impl OverlapProvider {
    /// Each call stays in flight for `hold`
    pub fn new(hold: Duration) -> Self {
        Self {
            hold,
            in_flight: AtomicU32::new(0),
            peak: AtomicU32::new(0),
            calls: AtomicU32::new(0),
        }
    }

    pub fn peak(&self) -> u32 {
        self.peak.load(Ordering::SeqCst)
    }

    pub fn calls(&self) -> u32 {
        self.calls.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl Provider for OverlapProvider {
    fn name(&self) -> String {
        TestFixtures::SCRIPTED_PROVIDER.to_string()
    }

    async fn generate(&self, _request: &GenerationRequest) -> Result<ProviderResponse, ApiFailure> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        let now = self.in_flight.fetch_add(1, Ordering::SeqCst) + 1;
        self.peak.fetch_max(now, Ordering::SeqCst);
        tokio::time::sleep(self.hold).await;
        self.in_flight.fetch_sub(1, Ordering::SeqCst);
        Ok(TestFixtures::answer("Acme and Globex."))
    }

    async fn list_models(&self, _credential: &str, _endpoint: Option<String>) -> Result<Vec<ModelInfo>, ApiFailure> {
        Ok(Vec::new())
    }
}

/// Store, registry, coordinator and batch runner wired together
pub struct Pipeline {
    pub store: Arc<MemoryStore>,
    pub registry: Arc<ProviderRegistry>,
    pub coordinator: Arc<Coordinator>,
    pub runner: BatchRunner,
}

impl Pipeline {
    pub fn with_provider<P: Provider + 'static>(provider: Arc<P>) -> Self {
        let store = Arc::new(MemoryStore::new());
        let registry = Arc::new(ProviderRegistry::new());
        registry.register(TestFixtures::SCRIPTED_PROVIDER, provider);

        let dyn_store: Arc<dyn Store> = store.clone();
        let coordinator = Arc::new(Coordinator::new(dyn_store.clone(), registry.clone()));
        let runner = BatchRunner::new(coordinator.clone(), dyn_store);
        Self {
            store,
            registry,
            coordinator,
            runner,
        }
    }
}
