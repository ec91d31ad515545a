pub mod analyzer;
pub mod clock;
pub mod error;
pub mod payment;
pub mod random;
pub mod scheduler;
pub mod store;
pub mod subscription;
pub mod transaction;

pub use analyzer::{CampaignAnalyzer, KeywordAnalyzer, OpenAiAnalyzer};
pub use clock::{Clock, SystemClock};
pub use error::{AnalyzerError, StoreError};
pub use payment::PaymentEngine;
pub use random::{RandomSource, SeededRandom, ThreadRandom};
pub use scheduler::Scheduler;
pub use store::{MemoryStore, Store};
pub use subscription::SubscriptionService;
pub use transaction::TransactionService;

/// Fresh opaque identifier such as `sub_9f1c...` or `txn_04ab...`.
pub fn new_id(prefix: &str) -> String {
    format!("{}_{}", prefix, uuid::Uuid::new_v4().simple())
}
