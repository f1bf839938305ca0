//! Admission control for concurrent fetches.
//!
//! A fixed number of slots gate how many fetches may be in flight. A slot is
//! held by an [`AdmissionPermit`] and given back when the permit is dropped,
//! whichever way the worker exits.

use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;
use tokio::sync::{OwnedSemaphorePermit, Semaphore};

/// Caps the number of fetch workers running at the same time.
#[derive(Debug, Clone)]
pub struct AdmissionController {
    semaphore: Arc<Semaphore>,
    capacity: usize,
    counters: Arc<Counters>,
}

#[derive(Debug, Default)]
struct Counters {
    in_flight: AtomicUsize,
    peak: AtomicUsize,
    admitted: AtomicUsize,
}

/// One admission slot. Dropping it frees the slot.
#[derive(Debug)]
pub struct AdmissionPermit {
    _permit: OwnedSemaphorePermit,
    counters: Arc<Counters>,
}

impl AdmissionController {
    /// Create a controller with `capacity` slots (at least one).
    pub fn new(capacity: usize) -> Self {
        let capacity = capacity.max(1);
        Self {
            semaphore: Arc::new(Semaphore::new(capacity)),
            capacity,
            counters: Arc::new(Counters::default()),
        }
    }

    /// Wait for a free slot.
    ///
    /// There is no timeout on the wait; slot holders are bounded by the
    /// per-fetch timeout.
    pub async fn acquire(&self) -> AdmissionPermit {
        // The semaphore lives as long as self and is never closed.
        let permit = match Arc::clone(&self.semaphore).acquire_owned().await {
            Ok(permit) => permit,
            Err(_) => unreachable!("admission semaphore is never closed"),
        };

        let now = self.counters.in_flight.fetch_add(1, Ordering::SeqCst) + 1;
        self.counters.peak.fetch_max(now, Ordering::SeqCst);
        self.counters.admitted.fetch_add(1, Ordering::Relaxed);

        AdmissionPermit {
            _permit: permit,
            counters: Arc::clone(&self.counters),
        }
    }

    /// Total number of slots.
    pub fn capacity(&self) -> usize {
        self.capacity
    }

    /// Slots currently free.
    pub fn available(&self) -> usize {
        self.semaphore.available_permits()
    }

    /// Permits currently held.
    pub fn in_flight(&self) -> usize {
        self.counters.in_flight.load(Ordering::SeqCst)
    }

    /// Highest number of permits ever held at once.
    pub fn peak_in_flight(&self) -> usize {
        self.counters.peak.load(Ordering::SeqCst)
    }

    /// Number of permits handed out so far.
    pub fn admitted(&self) -> usize {
        self.counters.admitted.load(Ordering::Relaxed)
    }
}

impl Drop for AdmissionPermit {
    fn drop(&mut self) {
        // Runs before `_permit` is dropped: the counter goes down before the
        // slot is handed to a waiter, so in_flight never overshoots capacity.
        self.counters.in_flight.fetch_sub(1, Ordering::SeqCst);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::time::Duration;

    #[tokio::test]
    async fn test_acquire_and_release() {
        let controller = AdmissionController::new(2);
        assert_eq!(controller.capacity(), 2);
        assert_eq!(controller.available(), 2);

        let first = controller.acquire().await;
        let second = controller.acquire().await;
        assert_eq!(controller.in_flight(), 2);
        assert_eq!(controller.available(), 0);

        drop(first);
        assert_eq!(controller.in_flight(), 1);
        assert_eq!(controller.available(), 1);

        drop(second);
        assert_eq!(controller.in_flight(), 0);
        assert_eq!(controller.peak_in_flight(), 2);
        assert_eq!(controller.admitted(), 2);
    }

    #[tokio::test]
    async fn test_zero_capacity_becomes_one() {
        let controller = AdmissionController::new(0);
        assert_eq!(controller.capacity(), 1);
        let _permit = controller.acquire().await;
        assert_eq!(controller.available(), 0);
    }

    #[tokio::test]
    async fn test_waiter_blocks_until_release() {
        let controller = AdmissionController::new(1);
        let held = controller.acquire().await;

        let waiter = {
            let controller = controller.clone();
            tokio::spawn(async move {
                let _permit = controller.acquire().await;
            })
        };

        tokio::time::sleep(Duration::from_millis(50)).await;
        assert!(!waiter.is_finished());

        drop(held);
        waiter.await.unwrap();
        assert_eq!(controller.in_flight(), 0);
    }

    #[tokio::test]
    async fn test_permit_released_on_error_path() {
        let controller = AdmissionController::new(1);

        async fn failing_work(controller: &AdmissionController) -> Result<(), String> {
            let _permit = controller.acquire().await;
            Err("connection refused".to_string())
        }

        assert!(failing_work(&controller).await.is_err());
        assert_eq!(controller.in_flight(), 0);
        assert_eq!(controller.available(), 1);
    }

    #[tokio::test]
    async fn test_permit_released_when_task_panics() {
        let controller = AdmissionController::new(1);
        let task = {
            let controller = controller.clone();
            tokio::spawn(async move {
                let _permit = controller.acquire().await;
                panic!("worker blew up");
            })
        };
        assert!(task.await.is_err());
        assert_eq!(controller.available(), 1);
        assert_eq!(controller.in_flight(), 0);
    }

    #[tokio::test(flavor = "multi_thread", worker_threads = 4)]
    async fn test_in_flight_never_exceeds_capacity() {
        let controller = AdmissionController::new(5);
        let mut handles = Vec::new();

        for _ in 0..40 {
            let controller = controller.clone();
            handles.push(tokio::spawn(async move {
                let _permit = controller.acquire().await;
                assert!(controller.in_flight() <= controller.capacity());
                tokio::time::sleep(Duration::from_millis(10)).await;
            }));
        }

        for handle in handles {
            handle.await.unwrap();
        }

        assert!(controller.peak_in_flight() <= 5);
        assert_eq!(controller.admitted(), 40);
        assert_eq!(controller.in_flight(), 0);
    }
}
