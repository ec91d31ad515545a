use log::info;
use std::collections::BTreeMap;
use std::sync::Arc;

use crate::models::{CreateSubscriptionDto, Subscription, SubscriptionStatistics, round_cents};
use crate::services::analyzer::{CampaignAnalyzer, analyze_or_fallback};
use crate::services::clock::Clock;
use crate::services::error::StoreError;
use crate::services::new_id;
use crate::services::store::Store;

pub struct SubscriptionService {
    store: Arc<dyn Store>,
    analyzer: Arc<dyn CampaignAnalyzer>,
    clock: Arc<dyn Clock>,
}

impl SubscriptionService {
    pub fn new(
        store: Arc<dyn Store>,
        analyzer: Arc<dyn CampaignAnalyzer>,
        clock: Arc<dyn Clock>,
    ) -> Self {
        SubscriptionService {
            store,
            analyzer,
            clock,
        }
    }

    /// Analyzes the campaign, schedules the first charge one interval out, and stores
    /// the new active subscription. Analyzer failures never fail creation.
    pub async fn create(&self, request: CreateSubscriptionDto) -> Result<Subscription, StoreError> {
        info!("Creating subscription for donor {}", request.donor_id);

        let campaign_analysis =
            analyze_or_fallback(self.analyzer.as_ref(), &request.campaign_description).await;

        let created_at = self.clock.now();
        let subscription = Subscription {
            id: new_id("sub"),
            donor_id: request.donor_id,
            amount: request.amount,
            currency: request.currency,
            interval: request.interval,
            campaign_description: request.campaign_description,
            campaign_analysis,
            is_active: true,
            created_at,
            next_billing_date: request.interval.next_billing_date(created_at),
        };

        self.store.put_subscription(subscription.clone())?;
        info!("Subscription created successfully: {}", subscription.id);

        Ok(subscription)
    }

    pub fn list(&self) -> Vec<Subscription> {
        self.store.list_subscriptions()
    }

    pub fn list_active(&self) -> Vec<Subscription> {
        self.store.list_active_subscriptions()
    }

    pub fn get(&self, id: &str) -> Option<Subscription> {
        self.store.get_subscription(id)
    }

    /// Idempotent; an already inactive subscription is returned unchanged.
    pub fn deactivate(&self, id: &str) -> Result<Option<Subscription>, StoreError> {
        let updated = self
            .store
            .update_subscription(id, &mut |sub| sub.is_active = false)?;

        if updated.is_some() {
            info!("Subscription {} deactivated", id);
        }
        Ok(updated)
    }

    pub fn statistics(&self) -> SubscriptionStatistics {
        let all = self.store.list_subscriptions();

        let mut active = 0;
        let mut total_monthly_value = 0.0;
        let mut by_interval: BTreeMap<String, usize> = BTreeMap::new();

        for sub in all.iter().filter(|s| s.is_active) {
            active += 1;
            *by_interval.entry(sub.interval.as_str().to_string()).or_insert(0) += 1;
            total_monthly_value += sub.interval.monthly_value(sub.amount);
        }

        SubscriptionStatistics {
            total_subscriptions: all.len(),
            active_subscriptions: active,
            inactive_subscriptions: all.len() - active,
            total_monthly_value: round_cents(total_monthly_value),
            subscriptions_by_interval: by_interval,
        }
    }
}
