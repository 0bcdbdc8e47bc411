// src/scheduler.rs
use std::time::Duration;

use tokio::task::JoinHandle;
use tokio::time::{interval_at, Instant, MissedTickBehavior};
use tokio_util::sync::CancellationToken;
use tracing::debug;

/// A repeating callback on the tokio runtime, stopped by its own token.
pub struct PeriodicTask {
    name: &'static str,
    token: CancellationToken,
    handle: JoinHandle<()>,
}

impl PeriodicTask {
    /// Starts ticking one `period` from now, then every `period`.
    pub fn spawn<F>(name: &'static str, period: Duration, mut tick: F) -> Self
    where
        F: FnMut() + Send + 'static,
    {
        let token = CancellationToken::new();
        let child = token.clone();
        let handle = tokio::spawn(async move {
            let mut timer = interval_at(Instant::now() + period, period);
            timer.set_missed_tick_behavior(MissedTickBehavior::Delay);
            loop {
                tokio::select! {
                    _ = child.cancelled() => break,
                    _ = timer.tick() => tick(),
                }
            }
            debug!(task = name, "periodic task stopped");
        });
        PeriodicTask { name, token, handle }
    }

    pub fn cancellation_token(&self) -> CancellationToken {
        self.token.clone()
    }

    pub fn cancel(&self) {
        debug!(task = self.name, "cancelling periodic task");
        self.token.cancel();
    }

    pub fn is_cancelled(&self) -> bool {
        self.token.is_cancelled()
    }

    pub fn is_finished(&self) -> bool {
        self.handle.is_finished()
    }
}

impl Drop for PeriodicTask {
    fn drop(&mut self) {
        self.token.cancel();
    }
}

/// The slow full-snapshot timer and the fast stats timer.
pub struct Timers {
    pub live: PeriodicTask,
    pub stats: PeriodicTask,
}

impl Timers {
    pub fn start<L, S>(live_every: Duration, on_live: L, stats_every: Duration, on_stats: S) -> Self
    where
        L: FnMut() + Send + 'static,
        S: FnMut() + Send + 'static,
    {
        Timers {
            live: PeriodicTask::spawn("live-data", live_every, on_live),
            stats: PeriodicTask::spawn("current-stats", stats_every, on_stats),
        }
    }

    pub fn stop(&self) {
        self.live.cancel();
        self.stats.cancel();
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::sync::Arc;

    #[tokio::test]
    async fn test_ticks_until_cancelled() {
        let hits = Arc::new(AtomicUsize::new(0));
        let counter = hits.clone();
        let task = PeriodicTask::spawn("test", Duration::from_millis(10), move || {
            counter.fetch_add(1, Ordering::SeqCst);
        });

        tokio::time::sleep(Duration::from_millis(55)).await;
        task.cancel();
        tokio::time::sleep(Duration::from_millis(20)).await;
        let seen = hits.load(Ordering::SeqCst);
        assert!(seen >= 2, "expected several ticks, got {}", seen);
        assert!(task.is_finished());

        tokio::time::sleep(Duration::from_millis(30)).await;
        assert_eq!(hits.load(Ordering::SeqCst), seen);
    }

    #[tokio::test]
    async fn test_timers_cancel_independently() {
        let timers = Timers::start(Duration::from_secs(60), || {}, Duration::from_secs(60), || {});
        timers.stats.cancel();
        assert!(timers.stats.is_cancelled());
        assert!(!timers.live.is_cancelled());
        timers.stop();
        assert!(timers.live.is_cancelled());
    }
}
