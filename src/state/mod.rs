use log::{error, info, warn};
use rocket::fairing::AdHoc;
use std::sync::Arc;
use std::time::{Duration, Instant};

use crate::config::Config;
use crate::services::{
    CampaignAnalyzer, Clock, KeywordAnalyzer, MemoryStore, OpenAiAnalyzer, PaymentEngine,
    RandomSource, Scheduler, SeededRandom, Store, SubscriptionService, SystemClock,
    ThreadRandom, TransactionService,
};

/// Every long-lived component, built once at launch and shared through Rocket state.
pub struct AppState {
    pub store: Arc<dyn Store>,
    pub subscriptions: SubscriptionService,
    pub transactions: TransactionService,
    pub payments: Arc<PaymentEngine>,
    pub scheduler: Arc<Scheduler>,
    started_at: Instant,
}

pub struct Components {
    pub store: Arc<dyn Store>,
    pub analyzer: Arc<dyn CampaignAnalyzer>,
    pub clock: Arc<dyn Clock>,
    pub random: Arc<dyn RandomSource>,
    pub sweep_every: Duration,
    pub summary_every: Duration,
}

impl AppState {
    pub fn new(components: Components) -> Self {
        let Components {
            store,
            analyzer,
            clock,
            random,
            sweep_every,
            summary_every,
        } = components;

        let payments = Arc::new(PaymentEngine::new(store.clone(), clock.clone(), random));
        let scheduler = Arc::new(Scheduler::new(payments.clone(), sweep_every, summary_every));

        AppState {
            subscriptions: SubscriptionService::new(store.clone(), analyzer, clock),
            transactions: TransactionService::new(store.clone()),
            store,
            payments,
            scheduler,
            started_at: Instant::now(),
        }
    }

    pub fn from_config() -> Self {
        let api_key = Config::openai_api_key();
        if api_key.is_none() {
            warn!("OpenAI API key not found. LLM features will be disabled.");
        }

        let analyzer: Arc<dyn CampaignAnalyzer> =
            match OpenAiAnalyzer::new(api_key, Config::openai_model(), Config::openai_base_url()) {
                Ok(analyzer) => Arc::new(analyzer),
                Err(e) => {
                    error!("✗ Failed to build campaign analyzer: {}", e);
                    Arc::new(KeywordAnalyzer)
                }
            };

        let random: Arc<dyn RandomSource> = match Config::simulation_seed() {
            Some(seed) => {
                info!("Payment simulation seeded with {}", seed);
                Arc::new(SeededRandom::new(seed))
            }
            None => Arc::new(ThreadRandom),
        };

        AppState::new(Components {
            store: Arc::new(MemoryStore::new()),
            analyzer,
            clock: Arc::new(SystemClock),
            random,
            sweep_every: Config::sweep_interval(),
            summary_every: Config::summary_interval(),
        })
    }

    pub fn uptime_secs(&self) -> f64 {
        self.started_at.elapsed().as_secs_f64()
    }
}

/// Starts the background jobs once the server is listening.
pub fn start_jobs() -> AdHoc {
    AdHoc::on_liftoff("Start background jobs", |rocket| {
        Box::pin(async move {
            if !Config::is_scheduler_enabled() {
                warn!("Scheduler disabled; payments run only on manual trigger");
                return;
            }
            if let Some(state) = rocket.state::<AppState>() {
                state.scheduler.start();
                info!("✓ Background jobs are scheduled");
            }
        })
    })
}

pub fn stop_jobs() -> AdHoc {
    AdHoc::on_shutdown("Stop background jobs", |rocket| {
        Box::pin(async move {
            if let Some(state) = rocket.state::<AppState>() {
                state.scheduler.stop().await;
            }
        })
    })
}
