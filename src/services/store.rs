use indexmap::IndexMap;
use std::sync::{PoisonError, RwLock};

use crate::models::{Subscription, Transaction};
use crate::services::error::StoreError;

/// Holder of every subscription and transaction record.
///
/// Writes are upserts keyed by id. Listings come back in insertion order.
pub trait Store: Send + Sync {
    fn put_subscription(&self, subscription: Subscription) -> Result<(), StoreError>;
    fn get_subscription(&self, id: &str) -> Option<Subscription>;
    fn list_subscriptions(&self) -> Vec<Subscription>;
    fn list_active_subscriptions(&self) -> Vec<Subscription>;
    fn count_subscriptions(&self) -> usize;

    /// Applies `mutate` to the stored record under the write lock and returns
    /// the updated copy, or `None` when the id is unknown.
    fn update_subscription(
        &self,
        id: &str,
        mutate: &mut dyn FnMut(&mut Subscription),
    ) -> Result<Option<Subscription>, StoreError>;

    fn put_transaction(&self, transaction: Transaction) -> Result<(), StoreError>;
    fn get_transaction(&self, id: &str) -> Option<Transaction>;
    fn list_transactions(&self) -> Vec<Transaction>;
    fn list_transactions_by_subscription(&self, subscription_id: &str) -> Vec<Transaction>;
    fn list_transactions_by_donor(&self, donor_id: &str) -> Vec<Transaction>;
    fn count_transactions(&self) -> usize;
}

#[derive(Default)]
pub struct MemoryStore {
    subscriptions: RwLock<IndexMap<String, Subscription>>,
    transactions: RwLock<IndexMap<String, Transaction>>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    fn filter_transactions(&self, keep: impl Fn(&Transaction) -> bool) -> Vec<Transaction> {
        self.transactions
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .values()
            .filter(|txn| keep(txn))
            .cloned()
            .collect()
    }
}

impl Store for MemoryStore {
    fn put_subscription(&self, subscription: Subscription) -> Result<(), StoreError> {
        let mut subscriptions = self
            .subscriptions
            .write()
            .map_err(|_| StoreError::Poisoned("subscription"))?;
        subscriptions.insert(subscription.id.clone(), subscription);
        Ok(())
    }

    fn get_subscription(&self, id: &str) -> Option<Subscription> {
        self.subscriptions
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .get(id)
            .cloned()
    }

    fn list_subscriptions(&self) -> Vec<Subscription> {
        self.subscriptions
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .values()
            .cloned()
            .collect()
    }

    fn list_active_subscriptions(&self) -> Vec<Subscription> {
        self.subscriptions
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .values()
            .filter(|sub| sub.is_active)
            .cloned()
            .collect()
    }

    fn count_subscriptions(&self) -> usize {
        self.subscriptions
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .len()
    }

    fn update_subscription(
        &self,
        id: &str,
        mutate: &mut dyn FnMut(&mut Subscription),
    ) -> Result<Option<Subscription>, StoreError> {
        let mut subscriptions = self
            .subscriptions
            .write()
            .map_err(|_| StoreError::Poisoned("subscription"))?;

        Ok(subscriptions.get_mut(id).map(|sub| {
            mutate(sub);
            sub.clone()
        }))
    }

    fn put_transaction(&self, transaction: Transaction) -> Result<(), StoreError> {
        let mut transactions = self
            .transactions
            .write()
            .map_err(|_| StoreError::Poisoned("transaction"))?;
        transactions.insert(transaction.id.clone(), transaction);
        Ok(())
    }

    fn get_transaction(&self, id: &str) -> Option<Transaction> {
        self.transactions
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .get(id)
            .cloned()
    }

    fn list_transactions(&self) -> Vec<Transaction> {
        self.filter_transactions(|_| true)
    }

    fn list_transactions_by_subscription(&self, subscription_id: &str) -> Vec<Transaction> {
        self.filter_transactions(|txn| txn.subscription_id == subscription_id)
    }

    fn list_transactions_by_donor(&self, donor_id: &str) -> Vec<Transaction> {
        self.filter_transactions(|txn| txn.donor_id == donor_id)
    }

    fn count_transactions(&self) -> usize {
        self.transactions
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .len()
    }
}


#[cfg(test)]
mod tests {
    use super::fixtures::subscription;
    use super::*;
    use crate::models::TransactionStatus;
    use chrono::Utc;

    #[test]
    fn put_subscription_upserts_by_id() {
        let store = MemoryStore::new();
        let now = Utc::now();
        store.put_subscription(subscription("sub_a", "d1", 10.0, now)).unwrap();
        store.put_subscription(subscription("sub_b", "d1", 20.0, now)).unwrap();
        store.put_subscription(subscription("sub_a", "d1", 15.0, now)).unwrap();

        assert_eq!(store.count_subscriptions(), 2);
        assert_eq!(store.get_subscription("sub_a").unwrap().amount, 15.0);
        let ids: Vec<_> = store.list_subscriptions().into_iter().map(|s| s.id).collect();
        assert_eq!(ids, vec!["sub_a", "sub_b"]);
    }

    #[test]
    fn active_listing_skips_deactivated() {
        let store = MemoryStore::new();
        let now = Utc::now();
        let mut inactive = subscription("sub_off", "d1", 5.0, now);
        inactive.is_active = false;
        store.put_subscription(inactive).unwrap();
        store.put_subscription(subscription("sub_on", "d1", 5.0, now)).unwrap();

        let active = store.list_active_subscriptions();
        assert_eq!(active.len(), 1);
        assert_eq!(active[0].id, "sub_on");
    }

    #[test]
    fn update_subscription_mutates_in_place() {
        let store = MemoryStore::new();
        store
            .put_subscription(subscription("sub_a", "d1", 10.0, Utc::now()))
            .unwrap();

        let updated = store
            .update_subscription("sub_a", &mut |sub| sub.is_active = false)
            .unwrap()
            .unwrap();
        assert!(!updated.is_active);
        assert!(!store.get_subscription("sub_a").unwrap().is_active);
        assert!(store.update_subscription("missing", &mut |_| {}).unwrap().is_none());
    }

    #[test]
    fn transaction_filters_by_subscription_and_donor() {
        let store = MemoryStore::new();
        let now = Utc::now();
        let a = subscription("sub_a", "donor-1", 10.0, now);
        let b = subscription("sub_b", "donor-2", 20.0, now);
        for (i, sub) in [&a, &a, &b].into_iter().enumerate() {
            let mut txn = Transaction::pending_for(sub, format!("txn_{i}"), now);
            txn.status = TransactionStatus::Completed;
            store.put_transaction(txn).unwrap();
        }

        assert_eq!(store.count_transactions(), 3);
        assert_eq!(store.list_transactions_by_subscription("sub_a").len(), 2);
        assert_eq!(store.list_transactions_by_donor("donor-2").len(), 1);
        assert!(store.list_transactions_by_donor("nobody").is_empty());
        assert_eq!(store.get_transaction("txn_2").unwrap().subscription_id, "sub_b");
        assert!(store.get_transaction("txn_9").is_none());
    }
}
