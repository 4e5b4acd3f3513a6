use std::sync::Arc;
use std::sync::atomic::{AtomicUsize, Ordering};
use tokio::sync::Notify;

/// An async countdown: tasks `add` work, report it `done`, and any number of
/// waiters are released when the count drops to zero.
#[derive(Debug, Default)]
pub struct WaitGroup {
    count: AtomicUsize,
    zero: Notify,
}

impl WaitGroup {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn add(&self, n: usize) {
        self.count.fetch_add(n, Ordering::AcqRel);
    }

    /// Decrements the counter. Returns `true` for the single call that moves
    /// the counter from one to zero.
    pub fn done(&self) -> bool {
        let previous = self
            .count
            .fetch_update(Ordering::AcqRel, Ordering::Acquire, |n| n.checked_sub(1));
        match previous {
            Ok(1) => {
                self.zero.notify_waiters();
                true
            }
            Ok(_) => false,
            Err(_) => {
                tracing::warn!("WaitGroup::done called more times than add");
                false
            }
        }
    }

    pub fn count(&self) -> usize {
        self.count.load(Ordering::Acquire)
    }

    /// Waits until the counter is zero. Returns immediately if it already is.
    pub async fn wait(&self) {
        loop {
            let notified = self.zero.notified();
            tokio::pin!(notified);
            // Register before checking so a concurrent transition to zero
            // cannot slip between the check and the await.
            notified.as_mut().enable();
            if self.count() == 0 {
                return;
            }
            notified.await;
        }
    }

    /// Adds one to the counter and returns a guard that calls `done` on drop.
    pub fn enter(self: &Arc<Self>) -> WaitGuard {
        self.add(1);
        WaitGuard {
            group: Arc::clone(self),
        }
    }
}

#[derive(Debug)]
pub struct WaitGuard {
    group: Arc<WaitGroup>,
}

impl Drop for WaitGuard {
    fn drop(&mut self) {
        self.group.done();
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rand::Rng;
    use std::time::Duration;

    #[tokio::test]
    async fn test_wait_returns_immediately_when_empty() {
        let group = WaitGroup::new();
        tokio::time::timeout(Duration::from_secs(1), group.wait())
            .await
            .expect("wait on an empty group should not block");
    }

    #[tokio::test]
    async fn test_done_without_add_does_not_underflow() {
        let group = WaitGroup::new();
        assert!(!group.done());
        assert_eq!(group.count(), 0);
    }

    #[tokio::test]
    async fn test_guard_releases_on_drop() {
        let group = Arc::new(WaitGroup::new());
        let guard = group.enter();
        assert_eq!(group.count(), 1);
        drop(guard);
        assert_eq!(group.count(), 0);
    }

    #[tokio::test(flavor = "multi_thread", worker_threads = 4)]
    async fn test_reaches_zero_exactly_once_under_concurrent_done() {
        for _ in 0..20 {
            let tasks = 64;
            let group = Arc::new(WaitGroup::new());
            group.add(tasks);
            let transitions = Arc::new(AtomicUsize::new(0));

            let delays: Vec<u64> = {
                let mut rng = rand::thread_rng();
                (0..tasks).map(|_| rng.gen_range(0..3)).collect()
            };

            let waiter = {
                let group = Arc::clone(&group);
                tokio::spawn(async move { group.wait().await })
            };

            let handles: Vec<_> = delays
                .into_iter()
                .map(|delay| {
                    let group = Arc::clone(&group);
                    let transitions = Arc::clone(&transitions);
                    tokio::spawn(async move {
                        tokio::time::sleep(Duration::from_millis(delay)).await;
                        if group.done() {
                            transitions.fetch_add(1, Ordering::SeqCst);
                        }
                    })
                })
                .collect();

            for handle in handles {
                handle.await.unwrap();
            }
            tokio::time::timeout(Duration::from_secs(5), waiter)
                .await
                .expect("waiter should be released")
                .unwrap();

            assert_eq!(group.count(), 0);
            assert_eq!(transitions.load(Ordering::SeqCst), 1);
        }
    }
}
