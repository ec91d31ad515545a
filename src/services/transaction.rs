use std::collections::BTreeMap;
use std::sync::Arc;

use crate::models::{
    DonorTransactionHistory, Transaction, TransactionStatistics, TransactionStatus, round_cents,
};
use crate::services::store::Store;

/// Read-only reporting over stored transactions.
pub struct TransactionService {
    store: Arc<dyn Store>,
}

impl TransactionService {
    pub fn new(store: Arc<dyn Store>) -> Self {
        TransactionService { store }
    }

    pub fn list(&self) -> Vec<Transaction> {
        self.store.list_transactions()
    }

    pub fn get(&self, id: &str) -> Option<Transaction> {
        self.store.get_transaction(id)
    }

    pub fn list_by_subscription(&self, subscription_id: &str) -> Vec<Transaction> {
        self.store.list_transactions_by_subscription(subscription_id)
    }

    pub fn list_by_donor(&self, donor_id: &str) -> Vec<Transaction> {
        self.store.list_transactions_by_donor(donor_id)
    }

    pub fn statistics(&self) -> TransactionStatistics {
        let all = self.store.list_transactions();

        let mut successful = 0;
        let mut failed = 0;
        let mut total_amount_processed = 0.0;
        let mut by_status: BTreeMap<String, usize> = BTreeMap::new();
        let mut by_currency: BTreeMap<String, usize> = BTreeMap::new();

        for txn in &all {
            match txn.status {
                TransactionStatus::Completed => {
                    successful += 1;
                    total_amount_processed += txn.amount;
                }
                TransactionStatus::Failed => failed += 1,
                TransactionStatus::Pending => {}
            }
            *by_status.entry(txn.status.as_str().to_string()).or_insert(0) += 1;
            *by_currency.entry(txn.currency.as_str().to_string()).or_insert(0) += 1;
        }

        TransactionStatistics {
            total_transactions: all.len(),
            successful_transactions: successful,
            failed_transactions: failed,
            total_amount_processed,
            average_transaction_amount: mean_cents(total_amount_processed, successful),
            transactions_by_status: by_status,
            transactions_by_currency: by_currency,
        }
    }

    /// Totals count completed charges only, while first/last donation span every
    /// attempt for the donor, failed ones included.
    pub fn donor_history(&self, donor_id: &str) -> DonorTransactionHistory {
        let mut transactions = self.store.list_transactions_by_donor(donor_id);
        transactions.sort_by_key(|txn| txn.processed_at);

        let completed: Vec<&Transaction> =
            transactions.iter().filter(|txn| txn.is_completed()).collect();
        let total_amount: f64 = completed.iter().map(|txn| txn.amount).sum();

        DonorTransactionHistory {
            donor_id: donor_id.to_string(),
            total_donations: completed.len(),
            total_amount,
            average_donation: mean_cents(total_amount, completed.len()),
            first_donation: transactions.first().map(|txn| txn.processed_at),
            last_donation: transactions.last().map(|txn| txn.processed_at),
            transactions,
        }
    }
}

pub(crate) fn mean_cents(total: f64, count: usize) -> f64 {
    if count == 0 {
        0.0
    } else {
        round_cents(total / count as f64)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::Currency;
    use crate::services::store::{MemoryStore, fixtures::subscription};
    use chrono::{Duration, TimeZone, Utc};

    fn seeded_store() -> Arc<MemoryStore> {
        let store = Arc::new(MemoryStore::new());
        let t0 = Utc.with_ymd_and_hms(2025, 5, 1, 12, 0, 0).unwrap();

        let mut alice = subscription("sub_a", "alice", 10.0, t0);
        let bob = subscription("sub_b", "bob", 7.5, t0);
        let rows = [
            (&alice, "txn_1", 2, TransactionStatus::Completed),
            (&alice, "txn_2", 0, TransactionStatus::Failed),
            (&alice, "txn_3", 5, TransactionStatus::Completed),
            (&bob, "txn_4", 1, TransactionStatus::Completed),
        ];
        for (sub, id, day, status) in rows {
            let mut txn = Transaction::pending_for(sub, id.to_string(), t0 + Duration::days(day));
            txn.status = status;
            store.put_transaction(txn).unwrap();
        }

        alice.currency = Currency::Gbp;
        let mut gbp = Transaction::pending_for(&alice, "txn_5".to_string(), t0);
        gbp.status = TransactionStatus::Failed;
        store.put_transaction(gbp).unwrap();

        store
    }

    #[test]
    fn statistics_break_down_by_status_and_currency() {
        let service = TransactionService::new(seeded_store());
        let stats = service.statistics();

        assert_eq!(stats.total_transactions, 5);
        assert_eq!(stats.successful_transactions, 3);
        assert_eq!(stats.failed_transactions, 2);
        assert_eq!(stats.total_amount_processed, 27.5);
        assert_eq!(stats.average_transaction_amount, 9.17);
        assert_eq!(stats.transactions_by_status.get("completed"), Some(&3));
        assert_eq!(stats.transactions_by_status.get("failed"), Some(&2));
        assert_eq!(stats.transactions_by_currency.get("USD"), Some(&4));
        assert_eq!(stats.transactions_by_currency.get("GBP"), Some(&1));
    }

    #[test]
    fn empty_statistics_are_zero() {
        let service = TransactionService::new(Arc::new(MemoryStore::new()));
        let stats = service.statistics();
        assert_eq!(stats.total_transactions, 0);
        assert_eq!(stats.average_transaction_amount, 0.0);
        assert!(stats.transactions_by_status.is_empty());
    }

    #[test]
    fn donor_history_spans_failed_attempts_but_totals_completed() {
        let service = TransactionService::new(seeded_store());
        let t0 = Utc.with_ymd_and_hms(2025, 5, 1, 12, 0, 0).unwrap();

        let history = service.donor_history("alice");
        assert_eq!(history.total_donations, 2);
        assert_eq!(history.total_amount, 20.0);
        assert_eq!(history.average_donation, 10.0);
        // txn_2 and txn_5 failed at t0 yet still bound the range
        assert_eq!(history.first_donation, Some(t0));
        assert_eq!(history.last_donation, Some(t0 + Duration::days(5)));
        assert_eq!(history.transactions.len(), 4);
        assert!(
            history
                .transactions
                .windows(2)
                .all(|w| w[0].processed_at <= w[1].processed_at)
        );
    }

    #[test]
    fn donor_without_transactions_has_no_dates() {
        let service = TransactionService::new(seeded_store());
        let history = service.donor_history("carol");
        assert_eq!(history.total_donations, 0);
        assert_eq!(history.total_amount, 0.0);
        assert_eq!(history.average_donation, 0.0);
        assert!(history.first_donation.is_none());
        assert!(history.last_donation.is_none());
        assert!(history.transactions.is_empty());
    }

    #[test]
    fn lookups_by_id_subscription_and_donor() {
        let service = TransactionService::new(seeded_store());
        assert_eq!(service.list().len(), 5);
        assert_eq!(service.get("txn_4").unwrap().donor_id, "bob");
        assert!(service.get("txn_404").is_none());
        assert_eq!(service.list_by_subscription("sub_a").len(), 4);
        assert_eq!(service.list_by_donor("bob").len(), 1);
    }
}
