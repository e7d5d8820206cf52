use std::collections::BTreeMap;

use bgwork_core::JobIdentifier;
use serde::{Deserialize, Serialize};

/// Key under which the job identifier travels in a [`WorkPayload`].
pub const JOB_TAG_KEY: &str = "bg_job_tag";

/// Lifecycle state of an identifier on the self-rescheduling platform.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum JobState {
    /// No native request is outstanding.
    Unscheduled,
    /// Exactly one native wake-up request is outstanding.
    Armed,
    /// The job is executing (immediate run or wake-up).
    Running,
    /// The OS revoked the execution window; re-arm follows.
    Expired,
}

impl std::fmt::Display for JobState {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let s = match self {
            JobState::Unscheduled => "unscheduled",
            JobState::Armed => "armed",
            JobState::Running => "running",
            JobState::Expired => "expired",
        };
        write!(f, "{s}")
    }
}

/// Detailed result of one runner invocation.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RunOutcome {
    /// `validate` and `run` both returned true.
    Succeeded,
    /// `validate` returned false; `run` was not attempted.
    Skipped,
    /// `run` returned false.
    Failed,
    /// A step returned an error or panicked.
    Faulted,
}

impl RunOutcome {
    pub fn is_success(self) -> bool {
        self == RunOutcome::Succeeded
    }
}

impl std::fmt::Display for RunOutcome {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let s = match self {
            RunOutcome::Succeeded => "succeeded",
            RunOutcome::Skipped => "skipped",
            RunOutcome::Failed => "failed",
            RunOutcome::Faulted => "faulted",
        };
        write!(f, "{s}")
    }
}

/// Result a direct-scheduling worker hands back to the native layer.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum WorkResult {
    Success,
    Failure,
}

impl From<bool> for WorkResult {
    fn from(success: bool) -> Self {
        if success {
            WorkResult::Success
        } else {
            WorkResult::Failure
        }
    }
}

/// String key/value input data attached to native work.
///
/// Mirrors the flat input-data maps native schedulers persist alongside a
/// request; the job tag is the only key the scheduler itself reads.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct WorkPayload(BTreeMap<String, String>);

impl WorkPayload {
    pub fn for_job(id: &JobIdentifier) -> Self {
        let mut data = BTreeMap::new();
        data.insert(JOB_TAG_KEY.to_string(), id.as_str().to_string());
        Self(data)
    }

    /// The identifier string the native layer echoed back, if present.
    pub fn job_tag(&self) -> Option<&str> {
        self.get(JOB_TAG_KEY)
    }

    pub fn get(&self, key: &str) -> Option<&str> {
        self.0.get(key).map(String::as_str)
    }

    pub fn insert(&mut self, key: impl Into<String>, value: impl Into<String>) {
        self.0.insert(key.into(), value.into());
    }
}
