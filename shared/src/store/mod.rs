//! Storage capability consumed by the executor, scheduler and analytics crates
//!
//! The physical storage engine is an external collaborator; everything in the
//! pipeline talks to it through the [`Store`] trait. [`MemoryStore`] is the
//! bundled implementation: in-memory with an optional JSON snapshot file.

mod lock;
pub mod memory;

pub use lock::RunLease;
pub use memory::MemoryStore;

use async_trait::async_trait;

use crate::errors::SharedResult;
use crate::types::{
    LlmConfig, LlmId, Prompt, PromptId, Response, ResponseFilter, ResponseId, Schedule, ScheduleId,
};

/// CRUD and filtered-query contract of the backing store
#[mockall::automock]
#[async_trait]
pub trait Store: Send + Sync {
    /// List prompts, optionally only the enabled ones
    async fn list_prompts(&self, enabled_only: bool) -> SharedResult<Vec<Prompt>>;

    /// List LLM configurations, optionally only the enabled ones
    async fn list_llms(&self, enabled_only: bool) -> SharedResult<Vec<LlmConfig>>;

    /// List schedules, optionally only the enabled ones
    async fn list_schedules(&self, enabled_only: bool) -> SharedResult<Vec<Schedule>>;

    async fn get_prompt(&self, id: PromptId) -> SharedResult<Option<Prompt>>;

    async fn get_llm(&self, id: LlmId) -> SharedResult<Option<LlmConfig>>;

    async fn get_schedule(&self, id: ScheduleId) -> SharedResult<Option<Schedule>>;

    async fn create_prompt(&self, prompt: Prompt) -> SharedResult<()>;

    async fn create_llm(&self, llm: LlmConfig) -> SharedResult<()>;

    async fn create_schedule(&self, schedule: Schedule) -> SharedResult<()>;

    /// Replace an existing schedule; fails with `NotFound` if it was deleted
    async fn update_schedule(&self, schedule: Schedule) -> SharedResult<()>;

    /// Persist one self-contained response record
    async fn create_response(&self, response: Response) -> SharedResult<()>;

    async fn delete_response(&self, id: ResponseId) -> SharedResult<bool>;

    /// Responses matching `filter`, oldest first, truncated to `filter.limit`
    async fn list_responses(&self, filter: ResponseFilter) -> SharedResult<Vec<Response>>;

    /// Whether at least one response (successful or not) exists for the prompt
    async fn has_responses_for_prompt(&self, prompt_id: PromptId) -> SharedResult<bool>;

    /// Claim the right to run a schedule; `None` while another holder has it.
    /// The claim lasts until the returned lease is dropped.
    async fn acquire_run_lease(&self, schedule_id: ScheduleId) -> SharedResult<Option<RunLease>>;
}
