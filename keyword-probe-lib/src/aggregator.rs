//! Thread-safe collection of verdicts.

use crate::types::{ResultSet, Verdict};
use std::sync::{Arc, Mutex, PoisonError};

/// Shared sink that every fetch worker records its verdict into.
///
/// Clones share the same storage. Each `record` appends under the lock, so
/// concurrent workers never interleave partial writes.
#[derive(Debug, Clone, Default)]
pub struct ResultAggregator {
    verdicts: Arc<Mutex<Vec<Verdict>>>,
}

impl ResultAggregator {
    pub fn new() -> Self {
        Self::default()
    }

    /// Pre-size the storage for an expected number of verdicts.
    pub fn with_capacity(capacity: usize) -> Self {
        Self {
            verdicts: Arc::new(Mutex::new(Vec::with_capacity(capacity))),
        }
    }

    /// Append one verdict.
    pub fn record(&self, verdict: Verdict) {
        // push is the only write under the lock; a poisoned Vec is still whole.
        let mut verdicts = self.verdicts.lock().unwrap_or_else(PoisonError::into_inner);
        verdicts.push(verdict);
    }

    /// Number of verdicts recorded so far.
    pub fn len(&self) -> usize {
        self.verdicts
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Take the collected verdicts.
    ///
    /// Call this once every worker has finished. If other clones are still
    /// alive the verdicts are moved out of the shared storage, leaving it empty.
    pub fn into_result_set(self) -> ResultSet {
        let verdicts = match Arc::try_unwrap(self.verdicts) {
            Ok(mutex) => mutex.into_inner().unwrap_or_else(PoisonError::into_inner),
            Err(shared) => {
                let mut guard = shared.lock().unwrap_or_else(PoisonError::into_inner);
                std::mem::take(&mut *guard)
            }
        };
        ResultSet::new(verdicts)
    }
}
