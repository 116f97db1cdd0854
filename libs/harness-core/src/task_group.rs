use std::future::Future;
use std::sync::Arc;
use tokio::sync::Semaphore;
use tokio::task::JoinSet;
use tracing::error;

/// One spawned task per job, joined on a barrier that waits for all of them
///
/// Without a limit every task starts at once. With a limit, each task holds a
/// permit for its whole lifetime, so work inside the task (including any
/// timestamps it takes) only begins once a slot is free.
pub struct TaskGroup<R> {
    set: JoinSet<R>,
    permits: Option<Arc<Semaphore>>,
}

impl<R: Send + 'static> TaskGroup<R> {
    pub fn new(max_in_flight: Option<usize>) -> Self {
        Self {
            set: JoinSet::new(),
            permits: max_in_flight.filter(|n| *n > 0).map(|n| Arc::new(Semaphore::new(n))),
        }
    }

    pub fn spawn<F>(&mut self, task: F)
    where
        F: Future<Output = R> + Send + 'static,
    {
        let permits = self.permits.clone();
        self.set.spawn(async move {
            let _permit = match permits {
                Some(permits) => permits.acquire_owned().await.ok(),
                None => None,
            };
            task.await
        });
    }

    pub fn len(&self) -> usize {
        self.set.len()
    }

    pub fn is_empty(&self) -> bool {
        self.set.is_empty()
    }

    /// Wait for every task. Results are in completion order; a task that
    /// panicked is logged and left out.
    pub async fn join_all(mut self) -> Vec<R> {
        let mut results = Vec::with_capacity(self.set.len());
        while let Some(joined) = self.set.join_next().await {
            match joined {
                Ok(result) => results.push(result),
                Err(e) => error!(error = %e, "task ended without a result"),
            }
        }
        results
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::time::Duration;

    #[tokio::test(start_paused = true)]
    async fn test_completion_order() {
        let mut group = TaskGroup::new(None);
        for (id, delay) in [(0u32, 30u64), (1, 10), (2, 20)] {
            group.spawn(async move {
                tokio::time::sleep(Duration::from_millis(delay)).await;
                id
            });
        }
        assert_eq!(group.len(), 3);
        assert_eq!(group.join_all().await, vec![1, 2, 0]);
    }

    #[tokio::test]
    async fn test_limit_caps_in_flight() {
        let running = Arc::new(AtomicUsize::new(0));
        let peak = Arc::new(AtomicUsize::new(0));
        let mut group = TaskGroup::new(Some(2));

        for _ in 0..8 {
            let running = running.clone();
            let peak = peak.clone();
            group.spawn(async move {
                let now = running.fetch_add(1, Ordering::SeqCst) + 1;
                peak.fetch_max(now, Ordering::SeqCst);
                tokio::time::sleep(Duration::from_millis(5)).await;
                running.fetch_sub(1, Ordering::SeqCst);
            });
        }

        assert_eq!(group.join_all().await.len(), 8);
        assert!(peak.load(Ordering::SeqCst) <= 2);
    }

    #[tokio::test]
    async fn test_panicked_task_is_skipped() {
        let mut group = TaskGroup::new(None);
        group.spawn(async { 1 });
        group.spawn(async {
            if true {
                panic!("boom");
            }
            2
        });
        group.spawn(async { 3 });

        let mut results = group.join_all().await;
        results.sort();
        assert_eq!(results, vec![1, 3]);
    }

    #[tokio::test]
    async fn test_empty_group() {
        let group: TaskGroup<()> = TaskGroup::new(Some(4));
        assert!(group.is_empty());
        assert!(group.join_all().await.is_empty());
    }
}
