use std::collections::HashMap;
use std::sync::{Arc, PoisonError, RwLock};

use bgwork_core::{JobConfiguration, JobIdentifier};
use tracing::{debug, info};

use crate::error::{Result, WorkError};

type JobTable = HashMap<JobIdentifier, JobConfiguration>;

/// Mapping from job identifier to execution configuration.
///
/// Every scheduling operation reads from here; only [`register_jobs`](Self::register_jobs)
/// writes. Writers build a complete new table and swap the `Arc`, so readers
/// always see either the old table or the new one, never a mix.
pub struct JobRegistry {
    jobs: RwLock<Arc<JobTable>>,
}

impl JobRegistry {
    pub fn new() -> Self {
        Self {
            jobs: RwLock::new(Arc::new(HashMap::new())),
        }
    }

    /// Replace the whole table with `jobs`. Callers pass the complete desired
    /// set; anything not in `jobs` is dropped.
    pub fn register_jobs<I>(&self, jobs: I)
    where
        I: IntoIterator<Item = (JobIdentifier, JobConfiguration)>,
    {
        let table: JobTable = jobs.into_iter().collect();
        let count = table.len();
        let next = Arc::new(table);
        *self.jobs.write().unwrap_or_else(PoisonError::into_inner) = next;
        info!(count, "job registry replaced");
    }

    /// Configuration for `id`, or [`WorkError::NotRegistered`] so that a
    /// mistyped identifier fails loudly instead of scheduling nothing.
    pub fn get_configuration(&self, id: &JobIdentifier) -> Result<JobConfiguration> {
        self.snapshot().get(id).copied().ok_or_else(|| {
            debug!(job_id = %id, "lookup of unregistered job");
            WorkError::NotRegistered { id: id.clone() }
        })
    }

    /// Reverse lookup for native callbacks that only hand back a string tag.
    pub fn get_identifier_for(&self, tag: &str) -> Option<JobIdentifier> {
        self.snapshot().get_key_value(tag).map(|(id, _)| id.clone())
    }

    pub fn contains(&self, id: &JobIdentifier) -> bool {
        self.snapshot().contains_key(id)
    }

    /// All registered identifiers, sorted for deterministic iteration.
    pub fn identifiers(&self) -> Vec<JobIdentifier> {
        let mut ids: Vec<JobIdentifier> = self.snapshot().keys().cloned().collect();
        ids.sort();
        ids
    }

    /// The current table. Cheap: clones the `Arc`, not the map.
    pub fn snapshot(&self) -> Arc<JobTable> {
        let jobs = self.jobs.read().unwrap_or_else(PoisonError::into_inner);
        Arc::clone(&*jobs)
    }

    pub fn len(&self) -> usize {
        self.snapshot().len()
    }

    pub fn is_empty(&self) -> bool {
        self.snapshot().is_empty()
    }
}

impl Default for JobRegistry {
    fn default() -> Self {
        Self::new()
    }
}
