use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use rocket_okapi::okapi::schemars::JsonSchema;

use super::{Currency, Subscription};

#[derive(Debug, Serialize, Deserialize, Clone, Copy, PartialEq, Eq, Hash, JsonSchema)]
#[serde(rename_all = "lowercase")]
pub enum TransactionStatus {
    /// Initial state only; charges resolve synchronously, so nothing is stored as pending.
    Pending,
    Completed,
    Failed,
}

impl TransactionStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            TransactionStatus::Pending => "pending",
            TransactionStatus::Completed => "completed",
            TransactionStatus::Failed => "failed",
        }
    }
}

#[derive(Debug, Serialize, Deserialize, Clone, PartialEq, JsonSchema)]
#[serde(rename_all = "camelCase")]
pub struct Transaction {
    pub id: String,
    pub subscription_id: String,
    pub donor_id: String,
    pub amount: f64,
    pub currency: Currency,
    pub status: TransactionStatus,
    pub processed_at: DateTime<Utc>,
    pub campaign_description: String,
}

impl Transaction {
    /// A pending charge attempt carrying a snapshot of the subscription's billing fields.
    pub fn pending_for(subscription: &Subscription, id: String, processed_at: DateTime<Utc>) -> Self {
        Transaction {
            id,
            subscription_id: subscription.id.clone(),
            donor_id: subscription.donor_id.clone(),
            amount: subscription.amount,
            currency: subscription.currency,
            status: TransactionStatus::Pending,
            processed_at,
            campaign_description: subscription.campaign_description.clone(),
        }
    }

    pub fn is_completed(&self) -> bool {
        self.status == TransactionStatus::Completed
    }
}
