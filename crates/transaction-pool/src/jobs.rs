//! Name-keyed interval scheduler for the pool's background jobs.

use std::{collections::HashMap, future::Future, time::Duration};

use parking_lot::Mutex;
use tokio::{
    task::JoinHandle,
    time::{interval, MissedTickBehavior},
};

/// Runs named recurring jobs on the tokio runtime.
///
/// Registration is idempotent by name: registering a name that is already
/// taken aborts the previous ticker before spawning the replacement. Aborts
/// take effect at the job's next await point; synchronous state updates are
/// never torn.
#[derive(Debug, Default)]
pub struct JobsQueue {
    jobs: Mutex<HashMap<&'static str, JoinHandle<()>>>,
}

impl JobsQueue {
    pub fn new() -> Self {
        Self::default()
    }

    /// Spawns `job` every `period` under `name`.
    pub fn register<F, Fut>(&self, name: &'static str, period: Duration, mut job: F)
    where
        F: FnMut() -> Fut + Send + 'static,
        Fut: Future<Output = ()> + Send,
    {
        let handle = tokio::spawn(async move {
            let mut ticker = interval(period);
            ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);
            // the first tick of a tokio interval completes immediately
            ticker.tick().await;
            loop {
                ticker.tick().await;
                job().await;
            }
        });
        if let Some(previous) = self.jobs.lock().insert(name, handle) {
            previous.abort();
        }
    }

    /// Whether a job is registered under `name`.
    pub fn is_registered(&self, name: &str) -> bool {
        self.jobs.lock().contains_key(name)
    }

    /// Stops dispatching all registered jobs.
    pub fn shutdown(&self) {
        for (_, handle) in self.jobs.lock().drain() {
            handle.abort();
        }
    }
}

impl Drop for JobsQueue {
    fn drop(&mut self) {
        self.shutdown();
    }
}

#[cfg(test)]
mod tests {
    use std::sync::{
        atomic::{AtomicUsize, Ordering},
        Arc,
    };

    use super::*;

    #[tokio::test(start_paused = true)]
    async fn jobs_tick_on_their_interval() {
        let queue = JobsQueue::new();
        let ticks = Arc::new(AtomicUsize::new(0));

        let counter = Arc::clone(&ticks);
        queue.register("test", Duration::from_millis(10), move || {
            let counter = Arc::clone(&counter);
            async move {
                counter.fetch_add(1, Ordering::SeqCst);
            }
        });

        tokio::time::sleep(Duration::from_millis(35)).await;
        assert!(ticks.load(Ordering::SeqCst) >= 3);
    }

    #[tokio::test(start_paused = true)]
    async fn reregistration_replaces_the_ticker() {
        let queue = JobsQueue::new();
        let first = Arc::new(AtomicUsize::new(0));
        let second = Arc::new(AtomicUsize::new(0));

        let counter = Arc::clone(&first);
        queue.register("test", Duration::from_millis(10), move || {
            let counter = Arc::clone(&counter);
            async move {
                counter.fetch_add(1, Ordering::SeqCst);
            }
        });
        let counter = Arc::clone(&second);
        queue.register("test", Duration::from_millis(10), move || {
            let counter = Arc::clone(&counter);
            async move {
                counter.fetch_add(1, Ordering::SeqCst);
            }
        });

        tokio::time::sleep(Duration::from_millis(35)).await;
        assert_eq!(first.load(Ordering::SeqCst), 0);
        assert!(second.load(Ordering::SeqCst) >= 3);
        assert!(queue.is_registered("test"));

        queue.shutdown();
        assert!(!queue.is_registered("test"));
    }
}
