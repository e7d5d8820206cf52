use bgwork_core::{CoreError, JobIdentifier};
use thiserror::Error;

/// Errors surfaced to callers of the scheduling facade.
#[derive(Debug, Error)]
pub enum WorkError {
    /// The identifier was never passed to `register_jobs`.
    #[error("Job not registered: {id}. Register it first using register_jobs()")]
    NotRegistered { id: JobIdentifier },

    /// `get_instance` was called before `initialize`.
    #[error("Background work repository not initialized: call initialize() first")]
    NotInitialized,

    /// The native scheduler rejected an enqueue or cancel request.
    #[error("Native scheduler error: {0}")]
    Native(#[from] NativeError),

    #[error(transparent)]
    Core(#[from] CoreError),
}

impl WorkError {
    pub fn code(&self) -> &'static str {
        match self {
            WorkError::NotRegistered { .. } => "NOT_REGISTERED",
            WorkError::NotInitialized => "NOT_INITIALIZED",
            WorkError::Native(_) => "NATIVE_ERROR",
            WorkError::Core(e) => e.code(),
        }
    }
}

/// Failures reported by a native scheduler capability.
#[derive(Debug, Error)]
pub enum NativeError {
    #[error("Request submission failed: {0}")]
    SubmitFailed(String),

    #[error("Cancellation failed: {0}")]
    CancelFailed(String),

    /// The platform refused to install a wake-up callback.
    #[error("Callback registration failed: {0}")]
    RegistrationFailed(String),

    #[error("Native scheduler unavailable: {0}")]
    Unavailable(String),
}

/// Faults raised by job code. Always contained by the runner.
#[derive(Debug, Error)]
pub enum JobError {
    #[error("Execution failed: {0}")]
    ExecutionFailed(String),

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}

/// A provider could not hand out a job for an identifier.
#[derive(Debug, Error)]
pub enum ProviderError {
    #[error("No job bound to identifier: {id}")]
    NotFound { id: JobIdentifier },

    #[error("Job construction failed: {0}")]
    Construction(String),
}

pub type Result<T> = std::result::Result<T, WorkError>;
