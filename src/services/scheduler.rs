use log::{error, info, warn};
use std::sync::{Arc, Mutex, PoisonError};
use std::time::Duration;
use tokio::sync::{Mutex as AsyncMutex, watch};
use tokio::task::JoinHandle;
use tokio::time::{Instant, MissedTickBehavior};

use crate::models::SweepResult;
use crate::services::payment::PaymentEngine;

/// Longest timer period accepted; larger settings are capped to it.
pub const MAX_PERIOD: Duration = Duration::from_secs(366 * 86_400);

/// Runs billing sweeps and daily summaries on fixed timers.
///
/// One gate serializes every sweep, timed or manual. A timer tick that finds
/// the gate taken is skipped; a manual trigger waits its turn.
pub struct Scheduler {
    engine: Arc<PaymentEngine>,
    sweep_every: Duration,
    summary_every: Duration,
    sweep_gate: Arc<AsyncMutex<()>>,
    shutdown: watch::Sender<bool>,
    tasks: Mutex<Vec<JoinHandle<()>>>,
}

impl Scheduler {
    pub fn new(engine: Arc<PaymentEngine>, sweep_every: Duration, summary_every: Duration) -> Self {
        let (shutdown, _) = watch::channel(false);

        Scheduler {
            engine,
            sweep_every: bounded(sweep_every),
            summary_every: bounded(summary_every),
            sweep_gate: Arc::new(AsyncMutex::new(())),
            shutdown,
            tasks: Mutex::new(Vec::new()),
        }
    }

    pub fn is_running(&self) -> bool {
        !self
            .tasks
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .is_empty()
    }

    /// Spawns both timers on the current tokio runtime. No-op while running.
    pub fn start(&self) {
        let mut tasks = self.tasks.lock().unwrap_or_else(PoisonError::into_inner);
        if !tasks.is_empty() {
            return;
        }
        self.shutdown.send_replace(false);

        let engine = self.engine.clone();
        let gate = self.sweep_gate.clone();
        tasks.push(spawn_timer(
            "payment sweep",
            self.sweep_every,
            self.shutdown.subscribe(),
            move || {
                let engine = engine.clone();
                let gate = gate.clone();
                async move {
                    let Ok(_guard) = gate.try_lock() else {
                        warn!("Skipping scheduled payment processing: previous sweep still running");
                        return;
                    };
                    info!("Starting scheduled payment processing...");
                    let result = engine.sweep();
                    if result.processed > 0 {
                        info!("Payment processing completed: {}", to_json(&result));
                    }
                }
            },
        ));

        let engine = self.engine.clone();
        tasks.push(spawn_timer(
            "daily summary",
            self.summary_every,
            self.shutdown.subscribe(),
            move || {
                let engine = engine.clone();
                async move {
                    info!("Generating daily payment summary...");
                    info!("Daily Summary: {}", to_json(&engine.statistics()));
                }
            },
        ));

        info!(
            "Background jobs initialized (sweep every {:?}, summary every {:?})",
            self.sweep_every, self.summary_every
        );
    }

    /// Signals both timers to exit and waits for them.
    pub async fn stop(&self) {
        self.shutdown.send_replace(true);

        let tasks: Vec<JoinHandle<()>> = self
            .tasks
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .drain(..)
            .collect();

        for task in tasks {
            if let Err(e) = task.await {
                error!("Background job ended abnormally: {}", e);
            }
        }
        info!("Background jobs stopped");
    }

    /// Sweeps right away, after any sweep already in progress. Timer schedules
    /// are untouched.
    pub async fn trigger_now(&self) -> SweepResult {
        info!("Manually triggering payment processing...");
        let _guard = self.sweep_gate.lock().await;
        self.engine.sweep()
    }
}

fn spawn_timer<F, Fut>(
    name: &'static str,
    every: Duration,
    mut shutdown: watch::Receiver<bool>,
    mut job: F,
) -> JoinHandle<()>
where
    F: FnMut() -> Fut + Send + 'static,
    Fut: std::future::Future<Output = ()> + Send + 'static,
{
    tokio::spawn(async move {
        let mut ticker = tokio::time::interval_at(Instant::now() + every, every);
        ticker.set_missed_tick_behavior(MissedTickBehavior::Skip);

        loop {
            tokio::select! {
                _ = ticker.tick() => job().await,
                changed = shutdown.changed() => {
                    if changed.is_err() || *shutdown.borrow() {
                        break;
                    }
                }
            }
        }
        info!("{} timer stopped", name);
    })
}

fn bounded(period: Duration) -> Duration {
    period.clamp(Duration::from_millis(1), MAX_PERIOD)
}

fn to_json<T: serde::Serialize>(value: &T) -> String {
    serde_json::to_string(value).unwrap_or_else(|e| format!("<unserializable: {}>", e))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::services::clock::ManualClock;
    use crate::services::random::FixedRandom;
    use crate::services::store::{MemoryStore, Store, fixtures::subscription};
    use chrono::{TimeZone, Utc};

    const HOUR: Duration = Duration::from_secs(3600);
    const DAY: Duration = Duration::from_secs(86_400);

    fn setup() -> (Scheduler, Arc<MemoryStore>) {
        let t0 = Utc.with_ymd_and_hms(2025, 7, 1, 0, 0, 0).unwrap();
        let store = Arc::new(MemoryStore::new());
        store.put_subscription(subscription("sub_1", "d", 12.0, t0)).unwrap();

        let engine = Arc::new(PaymentEngine::new(
            store.clone(),
            Arc::new(ManualClock::new(t0)),
            Arc::new(FixedRandom(0.0)),
        ));
        (Scheduler::new(engine, HOUR, DAY), store)
    }

    #[tokio::test]
    async fn trigger_now_sweeps_without_timers() {
        let (scheduler, store) = setup();
        assert!(!scheduler.is_running());

        let result = scheduler.trigger_now().await;
        assert_eq!(result.processed, 1);
        assert_eq!(result.successful, 1);
        assert_eq!(result.total_amount, 12.0);
        assert_eq!(store.count_transactions(), 1);

        // Billing date moved a day past the frozen clock.
        assert_eq!(scheduler.trigger_now().await, SweepResult::default());
    }

    #[tokio::test(start_paused = true)]
    async fn sweep_timer_fires_on_cadence() {
        let (scheduler, store) = setup();
        scheduler.start();
        assert!(scheduler.is_running());

        tokio::time::sleep(HOUR - Duration::from_secs(1)).await;
        assert_eq!(store.count_transactions(), 0);

        tokio::time::sleep(Duration::from_secs(2)).await;
        assert_eq!(store.count_transactions(), 1);

        scheduler.stop().await;
        assert!(!scheduler.is_running());
    }

    #[tokio::test(start_paused = true)]
    async fn tick_is_skipped_while_a_sweep_holds_the_gate() {
        let (scheduler, store) = setup();
        let held = scheduler.sweep_gate.clone().lock_owned().await;
        scheduler.start();

        tokio::time::sleep(HOUR + Duration::from_secs(1)).await;
        assert_eq!(store.count_transactions(), 0);

        drop(held);
        tokio::time::sleep(HOUR).await;
        assert_eq!(store.count_transactions(), 1);

        scheduler.stop().await;
    }

    #[tokio::test(start_paused = true)]
    async fn oversized_periods_are_capped() {
        let (scheduler, store) = setup();
        let scheduler = Scheduler::new(scheduler.engine.clone(), Duration::MAX, Duration::MAX);
        assert_eq!(scheduler.sweep_every, MAX_PERIOD);
        assert_eq!(scheduler.summary_every, MAX_PERIOD);

        scheduler.start();
        tokio::time::sleep(HOUR).await;
        assert_eq!(store.count_transactions(), 0);
        scheduler.stop().await;
    }

    #[tokio::test(start_paused = true)]
    async fn stop_then_start_again() {
        let (scheduler, store) = setup();
        scheduler.start();
        scheduler.start();
        scheduler.stop().await;

        tokio::time::sleep(HOUR * 2).await;
        assert_eq!(store.count_transactions(), 0);

        scheduler.start();
        tokio::time::sleep(HOUR + Duration::from_secs(1)).await;
        assert_eq!(store.count_transactions(), 1);
        scheduler.stop().await;
    }
}
