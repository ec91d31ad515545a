use log::{error, info, warn};
use std::sync::Arc;

use crate::models::{PaymentStatistics, Subscription, SweepResult, Transaction, TransactionStatus};
use crate::services::clock::Clock;
use crate::services::error::StoreError;
use crate::services::new_id;
use crate::services::random::RandomSource;
use crate::services::store::Store;
use crate::services::transaction::mean_cents;

/// Probability that a simulated charge goes through.
pub const SUCCESS_RATE: f64 = 0.95;

/// Simulated payment processor. Charges subscriptions, advances their billing
/// dates, and sweeps everything that is due.
pub struct PaymentEngine {
    store: Arc<dyn Store>,
    clock: Arc<dyn Clock>,
    random: Arc<dyn RandomSource>,
}

impl PaymentEngine {
    pub fn new(store: Arc<dyn Store>, clock: Arc<dyn Clock>, random: Arc<dyn RandomSource>) -> Self {
        PaymentEngine {
            store,
            clock,
            random,
        }
    }

    /// Attempts one charge. Eligibility is the caller's call.
    ///
    /// On a store failure the transaction is re-saved as failed (best effort)
    /// and the first store error is returned.
    pub fn charge_one(&self, subscription: &Subscription) -> Result<Transaction, StoreError> {
        info!("Processing payment for subscription {}", subscription.id);

        let mut transaction =
            Transaction::pending_for(subscription, new_id("txn"), self.clock.now());

        let succeeded = self.random.next_unit() < SUCCESS_RATE;
        if succeeded {
            transaction.status = TransactionStatus::Completed;
            info!(
                "Payment successful for subscription {}: {} {}",
                subscription.id,
                subscription.amount,
                subscription.currency.as_str()
            );
        } else {
            transaction.status = TransactionStatus::Failed;
            warn!(
                "Payment failed for subscription {}: {} {}",
                subscription.id,
                subscription.amount,
                subscription.currency.as_str()
            );
        }

        if let Err(e) = self.record(&transaction, subscription, succeeded) {
            error!(
                "Error processing payment for subscription {}: {}",
                subscription.id, e
            );
            transaction.status = TransactionStatus::Failed;
            if let Err(retry) = self.store.put_transaction(transaction.clone()) {
                error!("Could not record failed transaction {}: {}", transaction.id, retry);
            }
            return Err(e);
        }

        Ok(transaction)
    }

    fn record(
        &self,
        transaction: &Transaction,
        subscription: &Subscription,
        succeeded: bool,
    ) -> Result<(), StoreError> {
        self.store.put_transaction(transaction.clone())?;

        if succeeded {
            let next = subscription
                .interval
                .next_billing_date(transaction.processed_at);
            // A deactivated subscription keeps its date.
            self.store.update_subscription(&subscription.id, &mut |sub| {
                if sub.is_active {
                    sub.next_billing_date = next;
                }
            })?;
        }

        Ok(())
    }

    /// Charges every active subscription whose billing date has arrived, in
    /// store order. One subscription failing never stops the sweep.
    ///
    /// Each subscription is re-read right before its charge, so one deactivated
    /// or already advanced since the listing is skipped and not counted.
    pub fn sweep(&self) -> SweepResult {
        info!("Starting batch payment processing...");

        let now = self.clock.now();
        let due: Vec<Subscription> = self
            .store
            .list_active_subscriptions()
            .into_iter()
            .filter(|sub| sub.is_due(now))
            .collect();

        if due.is_empty() {
            info!("No subscriptions due for billing");
            return SweepResult::default();
        }

        info!("Processing {} due subscriptions", due.len());

        let mut result = SweepResult::default();

        for listed in &due {
            let subscription = match self.store.get_subscription(&listed.id) {
                Some(current) if current.is_due(now) => current,
                _ => {
                    info!("Skipping subscription {}: no longer due", listed.id);
                    continue;
                }
            };

            result.processed += 1;
            match self.charge_one(&subscription) {
                Ok(txn) if txn.is_completed() => {
                    result.successful += 1;
                    result.total_amount += subscription.amount;
                }
                Ok(_) => result.failed += 1,
                Err(e) => {
                    error!("Failed to process subscription {}: {}", subscription.id, e);
                    result.failed += 1;
                }
            }
        }

        info!(
            "Batch processing completed: processed={} successful={} failed={} total_amount={}",
            result.processed, result.successful, result.failed, result.total_amount
        );
        result
    }

    pub fn statistics(&self) -> PaymentStatistics {
        let all = self.store.list_transactions();

        let successful: Vec<&Transaction> = all.iter().filter(|txn| txn.is_completed()).collect();
        let failed = all
            .iter()
            .filter(|txn| txn.status == TransactionStatus::Failed)
            .count();
        let total_amount_processed: f64 = successful.iter().map(|txn| txn.amount).sum();

        PaymentStatistics {
            total_transactions: all.len(),
            successful_transactions: successful.len(),
            failed_transactions: failed,
            total_amount_processed,
            average_transaction_amount: mean_cents(total_amount_processed, successful.len()),
        }
    }
}
