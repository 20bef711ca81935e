use std::sync::Arc;
use std::time::Duration;

use tokio::task::JoinHandle;
use tokio_util::sync::CancellationToken;
use tracing::{debug, error, info, warn};

use crate::counter::SerialCounter;

/// Longest allowed gap between two reset checks.
pub const MAX_INTERVAL: Duration = Duration::from_secs(60);

/// Configuration for the reset scheduler.
#[derive(Debug, Clone)]
pub struct SchedulerConfig {
    /// How often to check whether the daily reset is due.
    pub interval: Duration,
}

impl Default for SchedulerConfig {
    fn default() -> Self {
        Self {
            interval: Duration::from_secs(30),
        }
    }
}

impl SchedulerConfig {
    /// Interval clamped to `1s..=60s`.
    pub fn effective_interval(&self) -> Duration {
        self.interval.clamp(Duration::from_secs(1), MAX_INTERVAL)
    }
}

/// Background task that drives [`SerialCounter::maybe_reset_now`].
pub struct ResetScheduler {
    cancel: CancellationToken,
    handle: JoinHandle<()>,
}

impl ResetScheduler {
    /// Apply any reset missed while the process was down, then spawn the
    /// periodic check. Checks run on the blocking pool.
    pub async fn start(counter: Arc<SerialCounter>, config: SchedulerConfig) -> Self {
        let cancel = CancellationToken::new();
        let interval = config.effective_interval();

        check(&counter).await;

        let handle = {
            let cancel = cancel.clone();
            tokio::spawn(async move {
                info!("serial reset scheduler started (interval={interval:?})");
                loop {
                    tokio::select! {
                        _ = cancel.cancelled() => {
                            info!("serial reset scheduler stopped");
                            break;
                        }
                        _ = tokio::time::sleep(interval) => {
                            debug!("serial reset check");
                            check(&counter).await;
                        }
                    }
                }
            })
        };

        Self { cancel, handle }
    }

    pub fn cancel_token(&self) -> CancellationToken {
        self.cancel.clone()
    }

    /// Stop the scheduler and wait for its task to finish.
    pub async fn shutdown(self) {
        self.cancel.cancel();
        if let Err(e) = self.handle.await {
            warn!("serial reset scheduler task failed: {e}");
        }
    }
}

async fn check(counter: &Arc<SerialCounter>) {
    let counter = Arc::clone(counter);
    match tokio::task::spawn_blocking(move || counter.maybe_reset_now()).await {
        Ok(Ok(true)) => info!("scheduled serial reset applied"),
        Ok(Ok(false)) => {}
        Ok(Err(e)) => warn!("scheduled serial reset failed, retrying next tick: {e}"),
        Err(e) => error!("serial reset check task failed: {e}"),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::counter::testing::{FixedClock, FlakyKv};
    use crate::counter::CounterOptions;
    use crate::model::SerialCounterState;
    use crate::relay::Outbox;
    use partline_kv::KVStore;

    fn counter_due_for_reset(kv: Arc<FlakyKv>, options: CounterOptions) -> Arc<SerialCounter> {
        let state = SerialCounterState {
            current_value: 99,
            reset_value: 1,
            ..Default::default()
        };
        kv.set(crate::counter::SERIAL_KEY, &serde_json::to_vec(&state).unwrap())
            .unwrap();
        Arc::new(
            SerialCounter::load(
                kv,
                Arc::new(Outbox::default()),
                Arc::new(FixedClock::at("2024-03-01 08:00")),
                options,
            )
            .unwrap(),
        )
    }

    fn single_attempt() -> CounterOptions {
        CounterOptions {
            persist_attempts: 1,
            retry_backoff: Duration::from_millis(1),
        }
    }

    #[test]
    fn interval_is_clamped() {
        let long = SchedulerConfig { interval: Duration::from_secs(600) };
        assert_eq!(long.effective_interval(), MAX_INTERVAL);
        let zero = SchedulerConfig { interval: Duration::ZERO };
        assert_eq!(zero.effective_interval(), Duration::from_secs(1));
    }

    #[tokio::test]
    async fn applies_missed_reset_on_start_and_shuts_down() {
        let counter = counter_due_for_reset(Arc::new(FlakyKv::default()), single_attempt());
        let scheduler = ResetScheduler::start(counter.clone(), SchedulerConfig::default()).await;
        assert_eq!(counter.state().current_value, 1);

        let token = scheduler.cancel_token();
        tokio::time::timeout(Duration::from_secs(1), scheduler.shutdown())
            .await
            .expect("scheduler did not stop");
        assert!(token.is_cancelled());
    }

    #[tokio::test(start_paused = true)]
    async fn failed_check_is_retried_on_next_tick() {
        let kv = Arc::new(FlakyKv::default());
        let counter = counter_due_for_reset(kv.clone(), single_attempt());
        kv.fail_next(1);

        let scheduler = ResetScheduler::start(
            counter.clone(),
            SchedulerConfig { interval: Duration::from_secs(5) },
        )
        .await;
        assert_eq!(counter.state().current_value, 99);

        tokio::time::sleep(Duration::from_secs(6)).await;
        for _ in 0..50 {
            if counter.state().current_value == 1 {
                break;
            }
            tokio::time::sleep(Duration::from_millis(100)).await;
        }
        assert_eq!(counter.state().current_value, 1);
        scheduler.shutdown().await;
    }

    #[tokio::test]
    async fn retrying_store_does_not_stall_the_runtime() {
        let kv = Arc::new(FlakyKv::default());
        let counter = counter_due_for_reset(
            kv.clone(),
            CounterOptions {
                persist_attempts: 3,
                retry_backoff: Duration::from_millis(200),
            },
        );
        kv.fail_next(u32::MAX);

        let starting = tokio::spawn(ResetScheduler::start(counter.clone(), SchedulerConfig::default()));
        tokio::task::yield_now().await;

        let begun = std::time::Instant::now();
        tokio::time::sleep(Duration::from_millis(10)).await;
        let took = begun.elapsed();
        assert!(took < Duration::from_millis(150), "runtime stalled for {took:?}");

        let scheduler = starting.await.unwrap();
        assert_eq!(counter.state().current_value, 99);
        scheduler.shutdown().await;
    }
}
