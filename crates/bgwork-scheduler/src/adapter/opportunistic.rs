use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, PoisonError};

use async_trait::async_trait;
use bgwork_core::{JobConfiguration, JobIdentifier, Platform};
use chrono::Utc;
use dashmap::{DashMap, DashSet};
use tokio::runtime::Handle;
use tokio::sync::Mutex;
use tokio::task::JoinHandle;
use tokio_util::sync::CancellationToken;
use tracing::{debug, error, info, warn};

use super::{is_supported_on, SchedulingAdapter};
use crate::error::Result;
use crate::native::{BackgroundTask, OpportunisticScheduler, WakeUpHandler};
use crate::provider::JobProvider;
use crate::registry::JobRegistry;
use crate::runner::JobRunner;
use crate::schedule::next_trigger;
use crate::types::JobState;

/// Adapter for schedulers that only grant single opportunistic wake-ups.
///
/// Periodicity is simulated: every execution, successful or not, ends by
/// arming exactly one new wake-up at `now + interval`. Per identifier:
///
/// ```text
/// Unscheduled -> Armed -> Running -> Armed        (next cycle)
///                                 -> Unscheduled  (cancelled meanwhile)
///                                 -> Expired -> Armed
/// ```
#[derive(Clone)]
pub struct OpportunisticAdapter {
    inner: Arc<Inner>,
}

struct Inner {
    scheduler: Arc<dyn OpportunisticScheduler>,
    registry: Arc<JobRegistry>,
    provider: Arc<dyn JobProvider>,
    runner: JobRunner,
    states: DashMap<JobIdentifier, JobState>,
    /// Bumped by every cancel; a cycle that sees it change does not re-arm.
    cancel_epochs: DashMap<JobIdentifier, u64>,
    /// At most one execution per identifier, whatever the native layer does.
    execution_locks: DashMap<JobIdentifier, Arc<Mutex<()>>>,
    /// Serializes cancel/submit pairs and cancels for one identifier.
    arming_locks: DashMap<JobIdentifier, Arc<Mutex<()>>>,
    /// Identifiers whose native callback is installed (register-once).
    callbacks: DashSet<JobIdentifier>,
}

type RearmSlot = Arc<std::sync::Mutex<Option<JoinHandle<()>>>>;

impl OpportunisticAdapter {
    /// Current state of `id`. Identifiers never scheduled are `Unscheduled`.
    pub fn state(&self, id: &JobIdentifier) -> JobState {
        self.inner.state(id)
    }

    /// Cancel any outstanding request for `id` and arm a new one at
    /// `now + interval`. Native failures are logged, never returned.
    pub async fn schedule_next_attempt(&self, id: &JobIdentifier) {
        self.inner.arm_next_attempt(id, None).await;
    }

    /// The handler installed with the native scheduler for every identifier.
    pub fn wake_up_handler(&self) -> Arc<dyn WakeUpHandler> {
        Arc::new(self.clone())
    }
}

fn lock_for(locks: &DashMap<JobIdentifier, Arc<Mutex<()>>>, id: &JobIdentifier) -> Arc<Mutex<()>> {
    Arc::clone(&*locks.entry(id.clone()).or_default())
}

impl Inner {
    fn state(&self, id: &JobIdentifier) -> JobState {
        self.states
            .get(id)
            .map(|s| *s)
            .unwrap_or(JobState::Unscheduled)
    }

    fn set_state(&self, id: &JobIdentifier, state: JobState) {
        self.states.insert(id.clone(), state);
    }

    fn cancel_epoch(&self, id: &JobIdentifier) -> u64 {
        self.cancel_epochs.get(id).map(|e| *e).unwrap_or(0)
    }

    /// Run `id` once while holding its execution lock.
    async fn execute(&self, id: &JobIdentifier) -> bool {
        let lock = lock_for(&self.execution_locks, id);
        let _guard = lock.lock().await;
        self.set_state(id, JobState::Running);
        self.runner
            .execute_identifier(self.provider.as_ref(), id)
            .await
    }

    /// Replace any outstanding request for `id` with one at `now + interval`.
    ///
    /// With `since_epoch`, nothing is armed if `id` was cancelled after that
    /// epoch was read. The check and the native calls happen under the
    /// arming lock, which `cancel` also takes.
    async fn arm_next_attempt(&self, id: &JobIdentifier, since_epoch: Option<u64>) {
        let lock = lock_for(&self.arming_locks, id);
        let _guard = lock.lock().await;

        if since_epoch.is_some_and(|epoch| epoch != self.cancel_epoch(id)) {
            info!(job_id = %id, "job cancelled during execution; not re-arming");
            self.set_state(id, JobState::Unscheduled);
            return;
        }

        // The platform usually keeps one request per identifier, but a stale
        // one must never survive next to the new one.
        if let Err(e) = self.scheduler.cancel_request(id.as_str()).await {
            warn!(job_id = %id, error = %e, "failed to cancel outstanding request");
        }

        let config = match self.registry.get_configuration(id) {
            Ok(config) => config,
            Err(e) => {
                error!(job_id = %id, error = %e, "cannot arm next attempt");
                self.set_state(id, JobState::Unscheduled);
                return;
            }
        };
        let next = next_trigger(&config, Utc::now());

        debug!(job_id = %id, next_trigger = %next.to_rfc3339(), "arming next attempt");
        match self
            .scheduler
            .submit_earliest_begin_request(id.as_str(), next)
            .await
        {
            Ok(()) => self.set_state(id, JobState::Armed),
            Err(e) => {
                error!(job_id = %id, error = %e, "failed to submit wake-up request");
                self.set_state(id, JobState::Unscheduled);
            }
        }
    }

    async fn cancel(&self, id: &JobIdentifier) {
        let lock = lock_for(&self.arming_locks, id);
        let _guard = lock.lock().await;

        *self.cancel_epochs.entry(id.clone()).or_insert(0) += 1;
        if let Err(e) = self.scheduler.cancel_request(id.as_str()).await {
            warn!(job_id = %id, error = %e, "failed to cancel wake-up request");
        }
        self.set_state(id, JobState::Unscheduled);
    }
}

#[async_trait]
impl WakeUpHandler for OpportunisticAdapter {
    async fn on_wake_up(&self, task: Arc<dyn BackgroundTask>) {
        let inner = &self.inner;
        let Some(id) = inner.registry.get_identifier_for(task.identifier()) else {
            warn!(job_tag = %task.identifier(), "wake-up for unregistered job");
            task.set_task_completed(false);
            return;
        };
        let epoch = inner.cancel_epoch(&id);
        info!(job_id = %id, "wake-up received");

        // Whichever path flips this first reports to the task and re-arms.
        let reported = Arc::new(AtomicBool::new(false));
        let expired = CancellationToken::new();
        let rearm: RearmSlot = Arc::default();

        // Installed before anything runs. The OS may call it from any thread,
        // so it reports and re-arms itself instead of waiting for this future.
        {
            let inner = Arc::clone(inner);
            let id = id.clone();
            let reported = Arc::clone(&reported);
            let expired = expired.clone();
            let rearm = Arc::clone(&rearm);
            let window = Arc::downgrade(&task);
            let runtime = Handle::try_current().ok();
            task.set_expiration_handler(Box::new(move || {
                if reported.swap(true, Ordering::SeqCst) {
                    return;
                }
                warn!(job_id = %id, "execution window expired before completion");
                if let Some(task) = window.upgrade() {
                    task.set_task_completed(false);
                }
                inner.set_state(&id, JobState::Expired);
                if let Some(runtime) = runtime {
                    let handle = runtime.spawn(async move {
                        inner.arm_next_attempt(&id, Some(epoch)).await;
                    });
                    *rearm.lock().unwrap_or_else(PoisonError::into_inner) = Some(handle);
                }
                expired.cancel();
            }));
        }

        let completion = tokio::select! {
            biased;
            _ = expired.cancelled() => None,
            success = inner.execute(&id) => Some(success),
        };

        if let Some(success) = completion {
            if !reported.swap(true, Ordering::SeqCst) {
                info!(job_id = %id, success, "wake-up execution finished");
                task.set_task_completed(success);
                inner.arm_next_attempt(&id, Some(epoch)).await;
                return;
            }
        }

        // Expiration reported; wait for its re-arm so the cycle ends armed.
        let pending = rearm.lock().unwrap_or_else(PoisonError::into_inner).take();
        match pending {
            Some(handle) => {
                if let Err(e) = handle.await {
                    error!(job_id = %id, error = %e, "re-arm after expiration failed");
                }
            }
            None => inner.arm_next_attempt(&id, Some(epoch)).await,
        }
    }
}

#[async_trait]
impl SchedulingAdapter for OpportunisticAdapter {
    type Context = Arc<dyn OpportunisticScheduler>;

    fn new(
        context: Self::Context,
        registry: Arc<JobRegistry>,
        provider: Arc<dyn JobProvider>,
    ) -> Self {
        Self {
            inner: Arc::new(Inner {
                scheduler: context,
                registry,
                provider,
                runner: JobRunner::new(),
                states: DashMap::new(),
                cancel_epochs: DashMap::new(),
                execution_locks: DashMap::new(),
                arming_locks: DashMap::new(),
                callbacks: DashSet::new(),
            }),
        }
    }

    fn platform(&self) -> Platform {
        Platform::Ios
    }

    /// Install the native callback for every identifier not seen before.
    /// Repeats are no-ops; the platform does not allow re-registration.
    async fn on_jobs_registered(&self, ids: &[JobIdentifier]) -> Result<()> {
        for id in ids {
            if !self.inner.callbacks.insert(id.clone()) {
                debug!(job_id = %id, "wake-up callback already registered");
                continue;
            }
            match self
                .inner
                .scheduler
                .register_callback(id.as_str(), self.wake_up_handler())
            {
                Ok(()) => info!(job_id = %id, "wake-up callback registered"),
                Err(e) => {
                    self.inner.callbacks.remove(id);
                    error!(job_id = %id, error = %e, "failed to register wake-up callback");
                }
            }
        }
        Ok(())
    }

    async fn schedule_job(&self, id: &JobIdentifier, config: &JobConfiguration) -> Result<()> {
        if !is_supported_on(id, config, self.platform()) {
            return Ok(());
        }

        // No native timer can defer the first run here, so it happens now.
        let epoch = self.inner.cancel_epoch(id);
        let success = self.inner.execute(id).await;
        info!(job_id = %id, success, "immediate execution finished");

        self.inner.arm_next_attempt(id, Some(epoch)).await;
        Ok(())
    }

    async fn cancel_job(&self, id: &JobIdentifier) -> Result<()> {
        self.inner.cancel(id).await;
        info!(job_id = %id, "job cancelled");
        Ok(())
    }
}
