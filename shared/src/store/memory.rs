//! In-memory store with optional JSON snapshot persistence
//!
//! A file-backed store may be opened by several processes at once (the
//! daemon and one-shot CLI commands). Reads reload the snapshot under a
//! shared file lock; writes reload, apply and persist under an exclusive one,
//! so a write never drops records another process added.

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use std::collections::{HashMap, HashSet};
use std::path::{Path, PathBuf};
use std::sync::{Arc, Mutex};
use tokio::sync::{RwLock, RwLockReadGuard};
use tracing::{debug, info};

use super::lock::{sibling, FileLock, LockMode, RunLease};
use super::Store;
use crate::errors::{SharedError, SharedResult};
use crate::types::{
    LlmConfig, LlmId, Prompt, PromptId, Response, ResponseFilter, ResponseId, Schedule, ScheduleId,
};

/// Everything the store holds, in its on-disk snapshot layout
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct StoreData {
    #[serde(default)]
    pub prompts: HashMap<PromptId, Prompt>,
    #[serde(default)]
    pub llms: HashMap<LlmId, LlmConfig>,
    #[serde(default)]
    pub schedules: HashMap<ScheduleId, Schedule>,
    #[serde(default)]
    pub responses: Vec<Response>,
}

/// Store backed by process memory, optionally mirrored to a JSON file
pub struct MemoryStore {
    data: Arc<RwLock<StoreData>>,
    snapshot_path: Option<PathBuf>,
    leases: Arc<Mutex<HashSet<ScheduleId>>>,
}

impl MemoryStore {
    /// Create an empty, purely in-memory store
    pub fn new() -> Self {
        Self {
            data: Arc::new(RwLock::new(StoreData::default())),
            snapshot_path: None,
            leases: Arc::new(Mutex::new(HashSet::new())),
        }
    }

    /// Open a store mirrored to `path`, loading the snapshot if it exists
    pub async fn open<P: AsRef<Path>>(path: P) -> SharedResult<Self> {
        let path = path.as_ref().to_path_buf();
        let _lock = FileLock::acquire(sibling(&path, ".lock"), LockMode::Shared).await?;
        let data = if let Some(data) = Self::load(&path).await? {
            info!(
                "📂 Loaded store snapshot {} ({} prompts, {} llms, {} schedules, {} responses)",
                path.display(),
                data.prompts.len(),
                data.llms.len(),
                data.schedules.len(),
                data.responses.len()
            );
            data
        } else {
            debug!("No store snapshot at {}, starting empty", path.display());
            StoreData::default()
        };

        Ok(Self {
            data: Arc::new(RwLock::new(data)),
            snapshot_path: Some(path),
            leases: Arc::new(Mutex::new(HashSet::new())),
        })
    }

    /// Copy of the full store contents
    pub async fn snapshot(&self) -> SharedResult<StoreData> {
        Ok(self.read().await?.clone())
    }

    async fn load(path: &Path) -> SharedResult<Option<StoreData>> {
        if !tokio::fs::try_exists(path).await? {
            return Ok(None);
        }
        let raw = tokio::fs::read(path).await?;
        Ok(Some(serde_json::from_slice(&raw)?))
    }

    /// Current contents, reloaded from the snapshot file when there is one
    async fn read(&self) -> SharedResult<RwLockReadGuard<'_, StoreData>> {
        if let Some(path) = &self.snapshot_path {
            let _lock = FileLock::acquire(sibling(path, ".lock"), LockMode::Shared).await?;
            if let Some(fresh) = Self::load(path).await? {
                *self.data.write().await = fresh;
            }
        }
        Ok(self.data.read().await)
    }

    /// Apply `change` to the latest contents and persist them if it succeeds
    ///
    /// Lock order is file lock first, then the in-memory lock.
    async fn write<T>(&self, change: impl FnOnce(&mut StoreData) -> SharedResult<T>) -> SharedResult<T> {
        let _lock = match &self.snapshot_path {
            Some(path) => Some(FileLock::acquire(sibling(path, ".lock"), LockMode::Exclusive).await?),
            None => None,
        };
        let mut data = self.data.write().await;
        if let Some(path) = &self.snapshot_path {
            if let Some(fresh) = Self::load(path).await? {
                *data = fresh;
            }
        }
        let outcome = change(&mut *data)?;
        self.persist(&data).await?;
        Ok(outcome)
    }

    /// Write the snapshot file (temp file + rename) if persistence is enabled
    async fn persist(&self, data: &StoreData) -> SharedResult<()> {
        let Some(path) = &self.snapshot_path else {
            return Ok(());
        };

        let serialized = serde_json::to_vec_pretty(data)?;
        let tmp_path = path.with_extension("json.tmp");
        tokio::fs::write(&tmp_path, serialized)
            .await
            .map_err(|e| SharedError::storage("write snapshot", e.to_string()))?;
        tokio::fs::rename(&tmp_path, path)
            .await
            .map_err(|e| SharedError::storage("rename snapshot", e.to_string()))?;
        Ok(())
    }

    fn sorted<T: Clone, K: Ord>(items: impl Iterator<Item = T>, key: impl Fn(&T) -> K) -> Vec<T> {
        let mut items: Vec<T> = items.collect();
        items.sort_by_key(|item| key(item));
        items
    }
}

impl Default for MemoryStore {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl Store for MemoryStore {
    async fn list_prompts(&self, enabled_only: bool) -> SharedResult<Vec<Prompt>> {
        let data = self.read().await?;
        let prompts = data.prompts.values().filter(|p| !enabled_only || p.enabled).cloned();
        Ok(Self::sorted(prompts, |p| (p.created_at, p.id)))
    }

    async fn list_llms(&self, enabled_only: bool) -> SharedResult<Vec<LlmConfig>> {
        let data = self.read().await?;
        let llms = data.llms.values().filter(|l| !enabled_only || l.enabled).cloned();
        Ok(Self::sorted(llms, |l| (l.created_at, l.id)))
    }

    async fn list_schedules(&self, enabled_only: bool) -> SharedResult<Vec<Schedule>> {
        let data = self.read().await?;
        let schedules = data.schedules.values().filter(|s| !enabled_only || s.enabled).cloned();
        Ok(Self::sorted(schedules, |s| (s.created_at, s.id)))
    }

    async fn get_prompt(&self, id: PromptId) -> SharedResult<Option<Prompt>> {
        Ok(self.read().await?.prompts.get(&id).cloned())
    }

    async fn get_llm(&self, id: LlmId) -> SharedResult<Option<LlmConfig>> {
        Ok(self.read().await?.llms.get(&id).cloned())
    }

    async fn get_schedule(&self, id: ScheduleId) -> SharedResult<Option<Schedule>> {
        Ok(self.read().await?.schedules.get(&id).cloned())
    }

    async fn create_prompt(&self, prompt: Prompt) -> SharedResult<()> {
        self.write(|data| {
            if data.prompts.contains_key(&prompt.id) {
                return Err(SharedError::AlreadyExists { entity: "prompt", id: prompt.id });
            }
            data.prompts.insert(prompt.id, prompt);
            Ok(())
        })
        .await
    }

    async fn create_llm(&self, llm: LlmConfig) -> SharedResult<()> {
        self.write(|data| {
            if data.llms.contains_key(&llm.id) {
                return Err(SharedError::AlreadyExists { entity: "llm", id: llm.id });
            }
            data.llms.insert(llm.id, llm);
            Ok(())
        })
        .await
    }

    async fn create_schedule(&self, schedule: Schedule) -> SharedResult<()> {
        self.write(|data| {
            if data.schedules.contains_key(&schedule.id) {
                return Err(SharedError::AlreadyExists { entity: "schedule", id: schedule.id });
            }
            data.schedules.insert(schedule.id, schedule);
            Ok(())
        })
        .await
    }

    async fn update_schedule(&self, schedule: Schedule) -> SharedResult<()> {
        self.write(|data| match data.schedules.get_mut(&schedule.id) {
            Some(existing) => {
                *existing = schedule;
                Ok(())
            }
            None => Err(SharedError::NotFound { entity: "schedule", id: schedule.id }),
        })
        .await
    }

    async fn create_response(&self, response: Response) -> SharedResult<()> {
        self.write(|data| {
            if data.responses.iter().any(|r| r.id == response.id) {
                return Err(SharedError::AlreadyExists { entity: "response", id: response.id });
            }
            data.responses.push(response);
            Ok(())
        })
        .await
    }

    async fn delete_response(&self, id: ResponseId) -> SharedResult<bool> {
        self.write(|data| {
            let before = data.responses.len();
            data.responses.retain(|r| r.id != id);
            Ok(data.responses.len() != before)
        })
        .await
    }

    async fn list_responses(&self, filter: ResponseFilter) -> SharedResult<Vec<Response>> {
        let data = self.read().await?;
        let matching = data.responses.iter().filter(|r| filter.matches(r)).cloned();
        let mut responses = Self::sorted(matching, |r| (r.created_at, r.id));
        if let Some(limit) = filter.limit {
            responses.truncate(limit);
        }
        Ok(responses)
    }

    async fn has_responses_for_prompt(&self, prompt_id: PromptId) -> SharedResult<bool> {
        let data = self.read().await?;
        Ok(data.responses.iter().any(|r| r.prompt_id == prompt_id))
    }

    async fn acquire_run_lease(&self, schedule_id: ScheduleId) -> SharedResult<Option<RunLease>> {
        let lock_path = self
            .snapshot_path
            .as_ref()
            .map(|path| sibling(path, &format!(".{}.run.lock", schedule_id)));
        RunLease::try_acquire(schedule_id, &self.leases, lock_path)
    }
}
