//! WorkerPool - Bounded fan-out for independent units of work.
//!
//! Work items go into an explicit queue. A fixed number of workers pull from
//! it and write outcomes into a collector keyed by item id, so callers get
//! results in key order no matter which worker finished first.
//!
//! ## Cancellation
//!
//! Cooperative, through a `watch` channel. Once the signal reads `true`,
//! workers stop taking new items; items already started run to completion.
//! Items never started are reported as `TaskOutcome::Cancelled`.

use futures::future::join_all;
use std::collections::{BTreeMap, VecDeque};
use std::future::Future;
use std::sync::{Mutex, MutexGuard, PoisonError};

use tokio::sync::watch;

/// Configuration for the pool.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct WorkerPoolConfig {
    /// Maximum number of items in flight. Zero is treated as one.
    pub workers: usize,
}

impl Default for WorkerPoolConfig {
    fn default() -> Self {
        Self { workers: 10 }
    }
}

/// What happened to one queued item.
#[derive(Debug, Clone, PartialEq)]
pub enum TaskOutcome<T> {
    Completed(T),
    /// Never started because the run was cancelled.
    Cancelled,
}

/// Outcomes of one pool run, keyed and ordered by item id.
#[derive(Debug, Clone, PartialEq)]
pub struct PoolResults<K: Ord, T> {
    outcomes: BTreeMap<K, TaskOutcome<T>>,
}

impl<K: Ord, T> PoolResults<K, T> {
    pub fn len(&self) -> usize {
        self.outcomes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.outcomes.is_empty()
    }

    pub fn get(&self, key: &K) -> Option<&TaskOutcome<T>> {
        self.outcomes.get(key)
    }

    pub fn cancelled_count(&self) -> usize {
        self.outcomes
            .values()
            .filter(|o| matches!(o, TaskOutcome::Cancelled))
            .count()
    }

    /// Consumes the results in key order.
    pub fn into_outcomes(self) -> impl Iterator<Item = (K, TaskOutcome<T>)> {
        self.outcomes.into_iter()
    }
}

/// Bounded worker pool.
#[derive(Debug, Clone, Default)]
pub struct WorkerPool {
    config: WorkerPoolConfig,
}

fn lock<T>(mutex: &Mutex<T>) -> MutexGuard<'_, T> {
    mutex.lock().unwrap_or_else(PoisonError::into_inner)
}

fn is_cancelled(shutdown: Option<&watch::Receiver<bool>>) -> bool {
    shutdown.map(|rx| *rx.borrow()).unwrap_or(false)
}

impl WorkerPool {
    pub fn new(config: WorkerPoolConfig) -> Self {
        Self { config }
    }

    pub fn with_workers(workers: usize) -> Self {
        Self::new(WorkerPoolConfig { workers })
    }

    pub fn workers(&self) -> usize {
        self.config.workers.max(1)
    }

    /// Runs `work` over every item with at most `workers` in flight.
    ///
    /// Keys must be unique; a duplicate key overwrites the earlier outcome.
    pub async fn run<K, I, T, F, Fut>(
        &self,
        items: Vec<(K, I)>,
        shutdown: Option<watch::Receiver<bool>>,
        work: F,
    ) -> PoolResults<K, T>
    where
        K: Ord + Clone,
        F: Fn(K, I) -> Fut,
        Fut: Future<Output = T>,
    {
        let total = items.len();
        let worker_count = self.workers().min(total.max(1));
        let queue = Mutex::new(items.into_iter().collect::<VecDeque<_>>());
        let collector = Mutex::new(BTreeMap::new());

        let queue_ref = &queue;
        let collector_ref = &collector;
        let work_ref = &work;
        let shutdown_ref = shutdown.as_ref();
        let worker = move |_index: usize| async move {
            loop {
                if is_cancelled(shutdown_ref) {
                    break;
                }
                let next = lock(queue_ref).pop_front();
                let Some((key, item)) = next else {
                    break;
                };
                let output = work_ref(key.clone(), item).await;
                lock(collector_ref).insert(key, TaskOutcome::Completed(output));
            }
        };

        join_all((0..worker_count).map(worker)).await;

        let mut outcomes = collector.into_inner().unwrap_or_else(PoisonError::into_inner);
        let remaining = queue.into_inner().unwrap_or_else(PoisonError::into_inner);
        if !remaining.is_empty() {
            tracing::info!(
                cancelled = remaining.len(),
                completed = outcomes.len(),
                "Worker pool cancelled before draining its queue"
            );
        }
        for (key, _) in remaining {
            outcomes.insert(key, TaskOutcome::Cancelled);
        }

        tracing::debug!(total, workers = worker_count, "Worker pool run finished");
        PoolResults { outcomes }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::sync::Arc;
    use std::time::Duration;

    #[tokio::test]
    async fn collects_all_results_in_key_order() {
        let pool = WorkerPool::with_workers(3);
        let items: Vec<(usize, u64)> = (0..10).map(|i| (i, (10 - i) as u64)).collect();

        let results = pool
            .run(items, None, |key, delay| async move {
                tokio::time::sleep(Duration::from_millis(delay)).await;
                key * 2
            })
            .await;

        let collected: Vec<(usize, usize)> = results
            .into_outcomes()
            .map(|(k, o)| match o {
                TaskOutcome::Completed(v) => (k, v),
                TaskOutcome::Cancelled => panic!("unexpected cancellation"),
            })
            .collect();
        assert_eq!(collected, (0..10).map(|i| (i, i * 2)).collect::<Vec<_>>());
    }

    #[tokio::test]
    async fn never_exceeds_worker_count() {
        let pool = WorkerPool::with_workers(2);
        let in_flight = Arc::new(AtomicUsize::new(0));
        let peak = Arc::new(AtomicUsize::new(0));

        let items: Vec<(usize, ())> = (0..8).map(|i| (i, ())).collect();
        pool.run(items, None, |_, _| {
            let in_flight = in_flight.clone();
            let peak = peak.clone();
            async move {
                let now = in_flight.fetch_add(1, Ordering::SeqCst) + 1;
                peak.fetch_max(now, Ordering::SeqCst);
                tokio::time::sleep(Duration::from_millis(5)).await;
                in_flight.fetch_sub(1, Ordering::SeqCst);
            }
        })
        .await;

        assert_eq!(peak.load(Ordering::SeqCst), 2);
    }

    #[tokio::test]
    async fn shutdown_stops_new_work_but_finishes_started_items() {
        let pool = WorkerPool::with_workers(1);
        let (tx, rx) = watch::channel(false);
        let tx = Arc::new(tx);

        let items: Vec<(usize, ())> = (0..5).map(|i| (i, ())).collect();
        let results = pool
            .run(items, Some(rx), |key, _| {
                let tx = tx.clone();
                async move {
                    if key == 1 {
                        tx.send(true).unwrap();
                    }
                    key
                }
            })
            .await;

        assert_eq!(results.get(&0), Some(&TaskOutcome::Completed(0)));
        assert_eq!(results.get(&1), Some(&TaskOutcome::Completed(1)));
        assert_eq!(results.get(&2), Some(&TaskOutcome::Cancelled));
        assert_eq!(results.cancelled_count(), 3);
    }

    #[tokio::test]
    async fn empty_input_returns_empty_results() {
        let pool = WorkerPool::default();
        let results = pool.run(Vec::<(u8, ())>::new(), None, |_, _| async {}).await;
        assert!(results.is_empty());
    }
}
