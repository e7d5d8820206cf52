// In-memory stand-ins for the native schedulers and a few scripted jobs.
#![allow(dead_code)]

use std::collections::HashMap;
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};
use std::time::Duration;

use async_trait::async_trait;
use bgwork_core::JobIdentifier;
use bgwork_scheduler::{
    BackgroundJob, BackgroundTask, DirectScheduler, ExpirationHandler, FactoryJobProvider,
    JobError, NativeError, OpportunisticScheduler, WakeUpHandler, WorkPayload,
};
use chrono::{DateTime, Utc};
use tokio::sync::Notify;

// ---------------------------------------------------------------------------
// Direct scheduler
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, PartialEq)]
pub enum EnqueuedWork {
    OneTime { id: String, payload: WorkPayload },
    Periodic { id: String, interval: Duration, payload: WorkPayload },
}

impl EnqueuedWork {
    pub fn id(&self) -> &str {
        match self {
            EnqueuedWork::OneTime { id, .. } | EnqueuedWork::Periodic { id, .. } => id,
        }
    }
}

#[derive(Default)]
pub struct FakeDirectScheduler {
    pub active: Mutex<Vec<EnqueuedWork>>,
    pub calls: AtomicUsize,
    pub fail_enqueue: AtomicBool,
}

impl FakeDirectScheduler {
    pub fn active(&self) -> Vec<EnqueuedWork> {
        self.active.lock().unwrap().clone()
    }

    pub fn calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }

    fn enqueue(&self, work: EnqueuedWork) -> Result<(), NativeError> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        if self.fail_enqueue.load(Ordering::SeqCst) {
            return Err(NativeError::SubmitFailed("work queue unavailable".to_string()));
        }
        self.active.lock().unwrap().push(work);
        Ok(())
    }
}

#[async_trait]
impl DirectScheduler for FakeDirectScheduler {
    async fn enqueue_one_time(&self, id: &str, payload: WorkPayload) -> Result<(), NativeError> {
        self.enqueue(EnqueuedWork::OneTime {
            id: id.to_string(),
            payload,
        })
    }

    async fn enqueue_periodic(
        &self,
        id: &str,
        interval: Duration,
        payload: WorkPayload,
    ) -> Result<(), NativeError> {
        self.enqueue(EnqueuedWork::Periodic {
            id: id.to_string(),
            interval,
            payload,
        })
    }

    async fn cancel_by_tag(&self, tag: &str) -> Result<(), NativeError> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        self.active.lock().unwrap().retain(|w| w.id() != tag);
        Ok(())
    }
}

// ---------------------------------------------------------------------------
// Opportunistic scheduler
// ---------------------------------------------------------------------------

/// Keeps every submitted request, so duplicates are visible rather than
/// silently replaced.
#[derive(Default)]
pub struct FakeOpportunisticScheduler {
    pub pending: Mutex<Vec<(String, DateTime<Utc>)>>,
    pub callbacks: Mutex<HashMap<String, Arc<dyn WakeUpHandler>>>,
    pub registrations: AtomicUsize,
    pub calls: AtomicUsize,
    pub fail_submit: AtomicBool,
    /// Yield to the executor inside every request call, like a real IPC hop,
    /// so concurrent cycles interleave.
    pub yielding: AtomicBool,
}

impl FakeOpportunisticScheduler {
    pub fn yielding() -> Self {
        Self {
            yielding: AtomicBool::new(true),
            ..Self::default()
        }
    }

    async fn maybe_yield(&self) {
        if self.yielding.load(Ordering::SeqCst) {
            tokio::task::yield_now().await;
        }
    }

    pub fn pending_for(&self, id: &str) -> Vec<DateTime<Utc>> {
        self.pending
            .lock()
            .unwrap()
            .iter()
            .filter(|(pending_id, _)| pending_id == id)
            .map(|(_, at)| *at)
            .collect()
    }

    pub fn calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }

    pub fn handler_for(&self, id: &str) -> Arc<dyn WakeUpHandler> {
        Arc::clone(&self.callbacks.lock().unwrap()[id])
    }
}

#[async_trait]
impl OpportunisticScheduler for FakeOpportunisticScheduler {
    async fn submit_earliest_begin_request(
        &self,
        id: &str,
        earliest_begin: DateTime<Utc>,
    ) -> Result<(), NativeError> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        self.maybe_yield().await;
        if self.fail_submit.load(Ordering::SeqCst) {
            return Err(NativeError::SubmitFailed("too many pending requests".to_string()));
        }
        self.pending
            .lock()
            .unwrap()
            .push((id.to_string(), earliest_begin));
        Ok(())
    }

    async fn cancel_request(&self, id: &str) -> Result<(), NativeError> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        self.maybe_yield().await;
        self.pending.lock().unwrap().retain(|(pending_id, _)| pending_id != id);
        Ok(())
    }

    fn register_callback(
        &self,
        id: &str,
        handler: Arc<dyn WakeUpHandler>,
    ) -> Result<(), NativeError> {
        self.registrations.fetch_add(1, Ordering::SeqCst);
        let mut callbacks = self.callbacks.lock().unwrap();
        if callbacks.contains_key(id) {
            return Err(NativeError::RegistrationFailed(format!(
                "{id} already registered"
            )));
        }
        callbacks.insert(id.to_string(), handler);
        Ok(())
    }
}

/// One granted execution window.
pub struct FakeTask {
    id: String,
    expiration: Mutex<Option<ExpirationHandler>>,
    pub completed: Mutex<Vec<bool>>,
}

impl FakeTask {
    pub fn new(id: &str) -> Arc<Self> {
        Arc::new(Self {
            id: id.to_string(),
            expiration: Mutex::new(None),
            completed: Mutex::new(Vec::new()),
        })
    }

    /// Revoke the window the way the OS would.
    pub fn expire(&self) {
        let handler = self.expiration.lock().unwrap().take();
        if let Some(handler) = handler {
            handler();
        }
    }

    pub fn completions(&self) -> Vec<bool> {
        self.completed.lock().unwrap().clone()
    }
}

impl BackgroundTask for FakeTask {
    fn identifier(&self) -> &str {
        &self.id
    }

    fn set_expiration_handler(&self, handler: ExpirationHandler) {
        *self.expiration.lock().unwrap() = Some(handler);
    }

    fn set_task_completed(&self, success: bool) {
        self.completed.lock().unwrap().push(success);
    }
}

// ---------------------------------------------------------------------------
// Jobs
// ---------------------------------------------------------------------------

pub struct CountingJob {
    pub validate_result: bool,
    pub run_result: bool,
    pub runs: AtomicUsize,
}

impl CountingJob {
    pub fn new(validate_result: bool, run_result: bool) -> Arc<Self> {
        Arc::new(Self {
            validate_result,
            run_result,
            runs: AtomicUsize::new(0),
        })
    }

    pub fn runs(&self) -> usize {
        self.runs.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl BackgroundJob for CountingJob {
    async fn validate(&self) -> Result<bool, JobError> {
        Ok(self.validate_result)
    }

    async fn run(&self) -> Result<bool, JobError> {
        self.runs.fetch_add(1, Ordering::SeqCst);
        Ok(self.run_result)
    }
}

pub struct FaultyJob;

#[async_trait]
impl BackgroundJob for FaultyJob {
    async fn validate(&self) -> Result<bool, JobError> {
        Ok(true)
    }

    async fn run(&self) -> Result<bool, JobError> {
        Err(JobError::ExecutionFailed("disk full".to_string()))
    }
}

/// Signals when it starts, then waits until released.
#[derive(Default)]
pub struct BlockingJob {
    pub started: Notify,
    pub release: Notify,
}

#[async_trait]
impl BackgroundJob for BlockingJob {
    async fn validate(&self) -> Result<bool, JobError> {
        Ok(true)
    }

    async fn run(&self) -> Result<bool, JobError> {
        self.started.notify_one();
        self.release.notified().await;
        Ok(true)
    }
}

pub fn id(s: &str) -> JobIdentifier {
    JobIdentifier::new(s)
}

pub fn provider_with(id: &str, job: Arc<dyn BackgroundJob>) -> Arc<FactoryJobProvider> {
    Arc::new(FactoryJobProvider::new().with_instance(id, job))
}
