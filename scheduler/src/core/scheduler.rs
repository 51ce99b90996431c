//! Public handle over the schedule supervisor

use chrono::{DateTime, Utc};
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::{mpsc, oneshot};
use tokio::task::JoinHandle;
use tokio::time::MissedTickBehavior;
use tokio_util::sync::CancellationToken;

use executor::{BatchOptions, BatchRunner, BatchSummary};
use shared::logging::{log_error, log_shutdown, log_startup, Component};
use shared::{component_info, Schedule, ScheduleId, Store};

use crate::core::cron::CronSchedule;
use crate::core::supervisor::{Command, RunContext, Supervisor};
use crate::error::{SchedulerError, SchedulerResult};

/// Scheduler tuning
#[derive(Debug, Clone)]
pub struct SchedulerOptions {
    pub tick_interval: Duration,
    /// Template for every run; the schedule's temperature replaces its own
    pub batch: BatchOptions,
}

impl Default for SchedulerOptions {
    fn default() -> Self {
        Self {
            tick_interval: Duration::from_secs(60),
            batch: BatchOptions::default(),
        }
    }
}

/// Registers schedules and triggers their runs
pub struct Scheduler {
    store: Arc<dyn Store>,
    commands: mpsc::UnboundedSender<Command>,
    cancel: CancellationToken,
    tick_interval: Duration,
    supervisor: std::sync::Mutex<Option<JoinHandle<()>>>,
}

impl Scheduler {
    /// Spawn the supervisor task; ticking is started separately with [`Scheduler::spawn_ticker`]
    pub fn start(store: Arc<dyn Store>, runner: Arc<BatchRunner>, options: SchedulerOptions) -> Self {
        let cancel = CancellationToken::new();
        let (commands, inbox) = mpsc::unbounded_channel();
        let ctx = Arc::new(RunContext {
            store: store.clone(),
            runner,
            options: options.batch,
            cancel: cancel.clone(),
        });
        let handle = tokio::spawn(Supervisor::new(ctx, commands.clone(), inbox).run());
        log_startup(Component::Scheduler, "schedule supervisor");

        Self {
            store,
            commands,
            cancel,
            tick_interval: options.tick_interval,
            supervisor: std::sync::Mutex::new(Some(handle)),
        }
    }

    /// Validate and store a new schedule, computing its first `next_run`
    pub async fn register_schedule(&self, mut schedule: Schedule) -> SchedulerResult<Schedule> {
        let cron = CronSchedule::parse(&schedule.cron)?;
        let now = Utc::now();
        schedule.cron = cron.expression().to_string();
        schedule.next_run = if schedule.enabled { cron.next_after(now) } else { None };
        schedule.updated_at = now;

        self.store.create_schedule(schedule.clone()).await?;
        component_info!(
            Component::Scheduler,
            "📅 Registered schedule '{}' ({}), next run {:?}",
            schedule.name,
            schedule.cron,
            schedule.next_run
        );
        Ok(schedule)
    }

    /// Enable or disable a schedule; enabling recomputes `next_run` from now
    pub async fn set_enabled(&self, id: ScheduleId, enabled: bool) -> SchedulerResult<Schedule> {
        let mut schedule = self
            .store
            .get_schedule(id)
            .await?
            .ok_or(SchedulerError::NotFound { id })?;

        let now = Utc::now();
        schedule.enabled = enabled;
        schedule.next_run = if enabled {
            CronSchedule::parse(&schedule.cron)?.next_after(now)
        } else {
            None
        };
        schedule.updated_at = now;
        self.store.update_schedule(schedule.clone()).await?;
        Ok(schedule)
    }

    /// Run a schedule immediately and wait for its batch to finish
    pub async fn execute_now(&self, id: ScheduleId) -> SchedulerResult<BatchSummary> {
        self.request(|reply| Command::ExecuteNow { schedule_id: id, reply })
            .await?
    }

    /// Trigger every schedule due at `now`; returns the ids that were started
    pub async fn tick_at(&self, now: DateTime<Utc>) -> SchedulerResult<Vec<ScheduleId>> {
        self.request(|reply| Command::Tick { now, reply }).await?
    }

    pub async fn tick(&self) -> SchedulerResult<Vec<ScheduleId>> {
        self.tick_at(Utc::now()).await
    }

    /// Schedules with a run in progress
    pub async fn running_schedules(&self) -> SchedulerResult<Vec<ScheduleId>> {
        self.request(|reply| Command::Running { reply }).await
    }

    /// Tick every `tick_interval` until shutdown
    pub fn spawn_ticker(self: &Arc<Self>) -> JoinHandle<()> {
        let scheduler = Arc::clone(self);
        tokio::spawn(async move {
            let mut interval = tokio::time::interval(scheduler.tick_interval);
            interval.set_missed_tick_behavior(MissedTickBehavior::Skip);
            loop {
                tokio::select! {
                    _ = scheduler.cancel.cancelled() => break,
                    _ = interval.tick() => {
                        match scheduler.tick().await {
                            Ok(_) => {}
                            Err(SchedulerError::ShuttingDown) => break,
                            Err(e) => log_error(Component::Scheduler, "Schedule tick", &e),
                        }
                    }
                }
            }
        })
    }

    /// Cancel in-flight runs and wait for the supervisor to drain its workers
    pub async fn shutdown(&self) {
        self.cancel.cancel();
        let (reply, done) = oneshot::channel();
        if self.commands.send(Command::Shutdown { reply }).is_ok() {
            let _ = done.await;
        }
        let handle = self.supervisor.lock().unwrap_or_else(|e| e.into_inner()).take();
        if let Some(handle) = handle {
            if let Err(e) = handle.await {
                log_error(Component::Scheduler, "Supervisor task", &e);
            }
        }
        log_shutdown(Component::Scheduler, "schedule supervisor stopped");
    }

    async fn request<T>(&self, build: impl FnOnce(oneshot::Sender<T>) -> Command) -> SchedulerResult<T> {
        let (reply, response) = oneshot::channel();
        self.commands
            .send(build(reply))
            .map_err(|_| SchedulerError::ShuttingDown)?;
        response.await.map_err(|_| SchedulerError::ShuttingDown)
    }
}
