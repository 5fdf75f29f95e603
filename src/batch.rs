use anyhow::Result;
use std::sync::Arc;
use tokio::sync::Semaphore;
use tokio::task::JoinSet;
use tracing::{debug, warn};

/// Bounded fan-out for independent per-node work.
///
/// One executor lives as long as its [`crate::MapReader`]; every batch shares
/// its permits, so `width` caps blocking tasks across concurrent requests too.
#[derive(Clone)]
pub struct BatchExecutor {
    permits: Arc<Semaphore>,
    width: usize,
}

impl BatchExecutor {
    pub fn new(width: usize) -> Self {
        let width = width.max(1);
        Self {
            permits: Arc::new(Semaphore::new(width)),
            width,
        }
    }

    pub fn width(&self) -> usize {
        self.width
    }

    /// Run `task(0..count)` on the blocking pool and return the results in
    /// index order.
    ///
    /// A task that errors or panics is replaced by `sentinel(index)`; it never
    /// affects its siblings. Returns only once every task has finished.
    pub async fn run<T, F, S>(&self, count: usize, task: F, sentinel: S) -> Vec<T>
    where
        T: Send + 'static,
        F: Fn(usize) -> Result<T> + Send + Sync + 'static,
        S: Fn(usize) -> T,
    {
        let task = Arc::new(task);
        let mut set = JoinSet::new();

        for index in 0..count {
            let permits = self.permits.clone();
            let task = task.clone();
            set.spawn(async move {
                // The semaphore is never closed
                let _permit = permits.acquire_owned().await.ok();
                let outcome = tokio::task::spawn_blocking(move || task(index)).await;
                (index, outcome)
            });
        }

        let mut slots: Vec<Option<T>> = (0..count).map(|_| None).collect();
        while let Some(joined) = set.join_next().await {
            match joined {
                Ok((index, Ok(Ok(value)))) => slots[index] = Some(value),
                Ok((index, Ok(Err(e)))) => warn!("Batch task {} failed: {:#}", index, e),
                Ok((index, Err(e))) => warn!("Batch task {} panicked: {}", index, e),
                Err(e) => warn!("Batch worker lost: {}", e),
            }
        }

        let failed = slots.iter().filter(|s| s.is_none()).count();
        debug!("Batch of {} finished, {} replaced by sentinel", count, failed);

        slots
            .into_iter()
            .enumerate()
            .map(|(index, slot)| slot.unwrap_or_else(|| sentinel(index)))
            .collect()
    }
}
