use std::any::Any;
use std::panic::AssertUnwindSafe;

use bgwork_core::JobIdentifier;
use futures_util::FutureExt;
use tracing::{debug, info, warn};

use crate::job::BackgroundJob;
use crate::provider::JobProvider;
use crate::types::RunOutcome;

/// Executes a job's validate/run contract and folds every outcome into a
/// boolean.
///
/// This is the containment boundary for job-author bugs: errors and panics
/// from `validate` or `run` stop here. Native callback threads never see them.
#[derive(Debug, Clone, Copy, Default)]
pub struct JobRunner;

impl JobRunner {
    pub fn new() -> Self {
        Self
    }

    /// Run `job` and report only whether it succeeded.
    pub async fn execute(&self, job: &dyn BackgroundJob) -> bool {
        self.evaluate(job).await.is_success()
    }

    /// Run `job` and report the detailed outcome.
    pub async fn evaluate(&self, job: &dyn BackgroundJob) -> RunOutcome {
        match AssertUnwindSafe(job.validate()).catch_unwind().await {
            Ok(Ok(true)) => {}
            Ok(Ok(false)) => {
                info!("validation declined execution; run skipped");
                return RunOutcome::Skipped;
            }
            Ok(Err(e)) => {
                warn!(error = %e, "job validation returned an error");
                return RunOutcome::Faulted;
            }
            Err(panic) => {
                warn!(panic = %panic_message(panic.as_ref()), "job validation panicked");
                return RunOutcome::Faulted;
            }
        }

        match AssertUnwindSafe(job.run()).catch_unwind().await {
            Ok(Ok(true)) => RunOutcome::Succeeded,
            Ok(Ok(false)) => {
                warn!("job run reported failure");
                RunOutcome::Failed
            }
            Ok(Err(e)) => {
                warn!(error = %e, "job run returned an error");
                RunOutcome::Faulted
            }
            Err(panic) => {
                warn!(panic = %panic_message(panic.as_ref()), "job run panicked");
                RunOutcome::Faulted
            }
        }
    }

    /// Resolve `id` through `provider` and run it. A provider failure is an
    /// unsuccessful execution, not an error.
    pub async fn execute_identifier(&self, provider: &dyn JobProvider, id: &JobIdentifier) -> bool {
        let job = match provider.get_job(id) {
            Ok(job) => job,
            Err(e) => {
                warn!(job_id = %id, error = %e, "could not resolve job");
                return false;
            }
        };
        let outcome = self.evaluate(job.as_ref()).await;
        debug!(job_id = %id, %outcome, "job execution finished");
        outcome.is_success()
    }
}

fn panic_message(panic: &(dyn Any + Send)) -> String {
    if let Some(s) = panic.downcast_ref::<&str>() {
        (*s).to_string()
    } else if let Some(s) = panic.downcast_ref::<String>() {
        s.clone()
    } else {
        "non-string panic payload".to_string()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::{JobError, ProviderError};
    use async_trait::async_trait;
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::sync::Arc;

    #[derive(Default)]
    struct ScriptedJob {
        validate: Option<bool>,
        run: Option<bool>,
        panic_in_run: bool,
        validate_calls: AtomicUsize,
        run_calls: AtomicUsize,
    }

    impl ScriptedJob {
        fn new(validate: Option<bool>, run: Option<bool>) -> Self {
            Self {
                validate,
                run,
                ..Default::default()
            }
        }
    }

    #[async_trait]
    impl BackgroundJob for ScriptedJob {
        async fn validate(&self) -> Result<bool, JobError> {
            self.validate_calls.fetch_add(1, Ordering::SeqCst);
            self.validate
                .ok_or_else(|| JobError::ExecutionFailed("validate blew up".to_string()))
        }

        async fn run(&self) -> Result<bool, JobError> {
            self.run_calls.fetch_add(1, Ordering::SeqCst);
            if self.panic_in_run {
                panic!("run panicked");
            }
            self.run
                .ok_or_else(|| JobError::ExecutionFailed("run blew up".to_string()))
        }
    }

    #[tokio::test]
    async fn success_when_both_steps_pass() {
        let job = ScriptedJob::new(Some(true), Some(true));
        assert!(JobRunner::new().execute(&job).await);
        assert_eq!(job.run_calls.load(Ordering::SeqCst), 1);
    }

    #[tokio::test]
    async fn failed_validation_never_runs() {
        let job = ScriptedJob::new(Some(false), Some(true));
        assert_eq!(JobRunner::new().evaluate(&job).await, RunOutcome::Skipped);
        assert!(!JobRunner::new().execute(&job).await);
        assert_eq!(job.run_calls.load(Ordering::SeqCst), 0);
    }

    #[tokio::test]
    async fn run_returning_false_is_failure() {
        let job = ScriptedJob::new(Some(true), Some(false));
        assert_eq!(JobRunner::new().evaluate(&job).await, RunOutcome::Failed);
    }

    #[tokio::test]
    async fn validate_error_is_contained() {
        let job = ScriptedJob::new(None, Some(true));
        assert_eq!(JobRunner::new().evaluate(&job).await, RunOutcome::Faulted);
        assert_eq!(job.run_calls.load(Ordering::SeqCst), 0);
    }

    #[tokio::test]
    async fn run_error_is_contained() {
        let job = ScriptedJob::new(Some(true), None);
        assert!(!JobRunner::new().execute(&job).await);
    }

    #[tokio::test]
    async fn run_panic_is_contained() {
        let job = ScriptedJob {
            validate: Some(true),
            run: Some(true),
            panic_in_run: true,
            ..Default::default()
        };
        assert_eq!(JobRunner::new().evaluate(&job).await, RunOutcome::Faulted);
    }

    #[tokio::test]
    async fn provider_failure_is_unsuccessful_execution() {
        let provider = |id: &JobIdentifier| -> Result<Arc<dyn BackgroundJob>, ProviderError> {
            Err(ProviderError::NotFound { id: id.clone() })
        };
        let ok = JobRunner::new()
            .execute_identifier(&provider, &JobIdentifier::new("SYNC"))
            .await;
        assert!(!ok);
    }
}
