//! Supervisor task owning the set of running schedules
//!
//! All trigger decisions go through one task that receives [`Command`]s over an
//! unbounded channel. Each triggered run executes in its own worker task and
//! reports back with `RunFinished`, which keeps triggers serialized per
//! schedule while different schedules run concurrently. A run also holds the
//! store's [`RunLease`] for its schedule, which serializes it against other
//! schedulers sharing the same store.

use chrono::{DateTime, Utc};
use std::collections::HashSet;
use std::sync::Arc;
use tokio::sync::{mpsc, oneshot};
use tokio::task::JoinSet;
use tokio_util::sync::CancellationToken;

use executor::{BatchOptions, BatchRunner, BatchSummary};
use shared::logging::{log_error, Component};
use shared::{component_debug, component_info, component_warn, RunLease, Schedule, ScheduleId, Store};

use crate::core::cron::CronSchedule;
use crate::error::{SchedulerError, SchedulerResult};

/// Messages handled by the supervisor
pub(crate) enum Command {
    /// Trigger every enabled schedule due at `now`; replies with the triggered ids
    Tick {
        now: DateTime<Utc>,
        reply: oneshot::Sender<SchedulerResult<Vec<ScheduleId>>>,
    },
    /// Run a schedule immediately; replies with the batch outcome once it completes
    ExecuteNow {
        schedule_id: ScheduleId,
        reply: oneshot::Sender<SchedulerResult<BatchSummary>>,
    },
    RunFinished {
        schedule_id: ScheduleId,
    },
    Running {
        reply: oneshot::Sender<Vec<ScheduleId>>,
    },
    Shutdown {
        reply: oneshot::Sender<()>,
    },
}

/// Collaborators shared by every run
pub(crate) struct RunContext {
    pub store: Arc<dyn Store>,
    pub runner: Arc<BatchRunner>,
    pub options: BatchOptions,
    pub cancel: CancellationToken,
}

/// Reports `RunFinished` when a worker ends, including by panic
struct RunGuard {
    schedule_id: ScheduleId,
    commands: mpsc::UnboundedSender<Command>,
}

impl Drop for RunGuard {
    fn drop(&mut self) {
        let _ = self.commands.send(Command::RunFinished {
            schedule_id: self.schedule_id,
        });
    }
}

pub(crate) struct Supervisor {
    ctx: Arc<RunContext>,
    running: HashSet<ScheduleId>,
    workers: JoinSet<()>,
    commands: mpsc::UnboundedSender<Command>,
    inbox: mpsc::UnboundedReceiver<Command>,
}

impl Supervisor {
    pub fn new(
        ctx: Arc<RunContext>,
        commands: mpsc::UnboundedSender<Command>,
        inbox: mpsc::UnboundedReceiver<Command>,
    ) -> Self {
        Self {
            ctx,
            running: HashSet::new(),
            workers: JoinSet::new(),
            commands,
            inbox,
        }
    }

    pub async fn run(mut self) {
        loop {
            tokio::select! {
                command = self.inbox.recv() => {
                    let Some(command) = command else { break };
                    if let Some(reply) = self.handle(command).await {
                        self.drain_workers().await;
                        let _ = reply.send(());
                        break;
                    }
                }
                Some(joined) = self.workers.join_next(), if !self.workers.is_empty() => {
                    if let Err(e) = joined {
                        log_error(Component::Scheduler, "Schedule worker", &e);
                    }
                }
            }
        }
        component_debug!(Component::Scheduler, "Supervisor stopped");
    }

    /// Handle one command; returns the shutdown reply when asked to stop
    async fn handle(&mut self, command: Command) -> Option<oneshot::Sender<()>> {
        match command {
            Command::Tick { now, reply } => {
                let _ = reply.send(self.tick(now).await);
            }
            Command::ExecuteNow { schedule_id, reply } => self.execute_now(schedule_id, reply).await,
            Command::RunFinished { schedule_id } => {
                self.running.remove(&schedule_id);
                component_debug!(Component::Scheduler, "Schedule {} finished", schedule_id);
            }
            Command::Running { reply } => {
                let _ = reply.send(self.running.iter().copied().collect());
            }
            Command::Shutdown { reply } => return Some(reply),
        }
        None
    }

    async fn tick(&mut self, now: DateTime<Utc>) -> SchedulerResult<Vec<ScheduleId>> {
        let schedules = self.ctx.store.list_schedules(true).await?;
        let mut triggered = Vec::new();

        for schedule in schedules.into_iter().filter(|s| s.is_due(now)) {
            if self.running.contains(&schedule.id) {
                component_debug!(
                    Component::Scheduler,
                    "Schedule '{}' still running, not re-triggering",
                    schedule.name
                );
                continue;
            }
            let lease = match self.ctx.store.acquire_run_lease(schedule.id).await {
                Ok(Some(lease)) => lease,
                Ok(None) => {
                    component_debug!(
                        Component::Scheduler,
                        "Schedule '{}' is running elsewhere, not re-triggering",
                        schedule.name
                    );
                    continue;
                }
                Err(e) => {
                    log_error(Component::Scheduler, "Run lease", &e);
                    continue;
                }
            };
            component_info!(Component::Scheduler, "⏰ Schedule '{}' is due", schedule.name);
            triggered.push(schedule.id);
            self.spawn_run(schedule, lease, None);
        }
        Ok(triggered)
    }

    async fn execute_now(
        &mut self,
        schedule_id: ScheduleId,
        reply: oneshot::Sender<SchedulerResult<BatchSummary>>,
    ) {
        if self.running.contains(&schedule_id) {
            let _ = reply.send(Err(SchedulerError::AlreadyRunning { id: schedule_id }));
            return;
        }
        let schedule = match self.ctx.store.get_schedule(schedule_id).await {
            Ok(Some(schedule)) => schedule,
            Ok(None) => {
                let _ = reply.send(Err(SchedulerError::NotFound { id: schedule_id }));
                return;
            }
            Err(e) => {
                let _ = reply.send(Err(e.into()));
                return;
            }
        };
        match self.ctx.store.acquire_run_lease(schedule_id).await {
            Ok(Some(lease)) => {
                component_info!(Component::Scheduler, "▶️ Executing schedule '{}' now", schedule.name);
                self.spawn_run(schedule, lease, Some(reply));
            }
            Ok(None) => {
                let _ = reply.send(Err(SchedulerError::AlreadyRunning { id: schedule_id }));
            }
            Err(e) => {
                let _ = reply.send(Err(e.into()));
            }
        }
    }

    fn spawn_run(
        &mut self,
        schedule: Schedule,
        lease: RunLease,
        reply: Option<oneshot::Sender<SchedulerResult<BatchSummary>>>,
    ) {
        self.running.insert(schedule.id);
        let guard = RunGuard {
            schedule_id: schedule.id,
            commands: self.commands.clone(),
        };
        let ctx = self.ctx.clone();

        self.workers.spawn(async move {
            let result = run_schedule(&ctx, schedule).await;
            // Lease released and RunFinished queued before the caller learns the outcome
            drop(lease);
            drop(guard);
            match reply {
                Some(reply) => {
                    let _ = reply.send(result);
                }
                None => {
                    if let Err(e) = result {
                        log_error(Component::Scheduler, "Scheduled run", &e);
                    }
                }
            }
        });
    }

    async fn drain_workers(&mut self) {
        while let Some(joined) = self.workers.join_next().await {
            if let Err(e) = joined {
                log_error(Component::Scheduler, "Schedule worker", &e);
            }
        }
        self.running.clear();
    }
}

/// One run of `schedule`: stamp `last_run`, execute the product, recompute `next_run`
///
/// `triggered` is the copy read when the run was triggered; the stored copy is
/// re-read before stamping so concurrent edits are kept.
pub(crate) async fn run_schedule(ctx: &RunContext, triggered: Schedule) -> SchedulerResult<BatchSummary> {
    let started = Utc::now();
    let mut schedule = ctx
        .store
        .get_schedule(triggered.id)
        .await?
        .ok_or(SchedulerError::NotFound { id: triggered.id })?;
    schedule.last_run = Some(started);
    schedule.updated_at = started;
    ctx.store.update_schedule(schedule.clone()).await?;

    let outcome = execute_product(ctx, &schedule).await;
    let finished = Utc::now();

    // Re-read so an enable/disable issued during the run is respected
    match ctx.store.get_schedule(schedule.id).await? {
        Some(mut latest) => {
            latest.last_run = Some(started);
            latest.next_run = if latest.enabled {
                CronSchedule::parse(&latest.cron)
                    .ok()
                    .and_then(|cron| cron.next_due(started, finished))
            } else {
                None
            };
            latest.updated_at = finished;
            ctx.store.update_schedule(latest.clone()).await?;
            component_debug!(
                Component::Scheduler,
                "Schedule '{}' next run: {:?}",
                latest.name,
                latest.next_run
            );
        }
        None => component_warn!(
            Component::Scheduler,
            "⚠️ Schedule '{}' was deleted during its run",
            schedule.name
        ),
    }

    outcome
}

async fn execute_product(ctx: &RunContext, schedule: &Schedule) -> SchedulerResult<BatchSummary> {
    let mut prompts = Vec::with_capacity(schedule.prompt_ids.len());
    for id in &schedule.prompt_ids {
        match ctx.store.get_prompt(*id).await? {
            Some(prompt) if prompt.enabled => prompts.push(prompt),
            Some(_) => component_debug!(Component::Scheduler, "Skipping disabled prompt {}", id),
            None => component_warn!(Component::Scheduler, "⚠️ Schedule '{}' references missing prompt {}", schedule.name, id),
        }
    }

    let mut llms = Vec::with_capacity(schedule.llm_ids.len());
    for id in &schedule.llm_ids {
        match ctx.store.get_llm(*id).await? {
            Some(llm) if llm.enabled => llms.push(llm),
            Some(_) => component_debug!(Component::Scheduler, "Skipping disabled llm {}", id),
            None => component_warn!(Component::Scheduler, "⚠️ Schedule '{}' references missing llm {}", schedule.name, id),
        }
    }

    let options = BatchOptions {
        temperature: schedule.temperature,
        ..ctx.options.clone()
    };
    let summary = ctx.runner.run_once(prompts, llms, &options, &ctx.cancel).await?;
    component_info!(Component::Scheduler, "📊 Schedule '{}' run finished: {}", schedule.name, summary);
    Ok(summary)
}
