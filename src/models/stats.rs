use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use rocket_okapi::okapi::schemars::JsonSchema;
use std::collections::BTreeMap;

use super::Transaction;

/// Outcome counters for one billing sweep.
#[derive(Debug, Serialize, Deserialize, Clone, Copy, Default, PartialEq, JsonSchema)]
#[serde(rename_all = "camelCase")]
pub struct SweepResult {
    pub processed: usize,
    pub successful: usize,
    pub failed: usize,
    pub total_amount: f64,
}

#[derive(Debug, Serialize, Deserialize, Clone, Default, PartialEq, JsonSchema)]
#[serde(rename_all = "camelCase")]
pub struct PaymentStatistics {
    pub total_transactions: usize,
    pub successful_transactions: usize,
    pub failed_transactions: usize,
    pub total_amount_processed: f64,
    pub average_transaction_amount: f64,
}

#[derive(Debug, Serialize, Deserialize, Clone, Default, PartialEq, JsonSchema)]
#[serde(rename_all = "camelCase")]
pub struct SubscriptionStatistics {
    pub total_subscriptions: usize,
    pub active_subscriptions: usize,
    pub inactive_subscriptions: usize,
    pub total_monthly_value: f64,
    pub subscriptions_by_interval: BTreeMap<String, usize>,
}

#[derive(Debug, Serialize, Deserialize, Clone, Default, PartialEq, JsonSchema)]
#[serde(rename_all = "camelCase")]
pub struct TransactionStatistics {
    pub total_transactions: usize,
    pub successful_transactions: usize,
    pub failed_transactions: usize,
    pub total_amount_processed: f64,
    pub average_transaction_amount: f64,
    pub transactions_by_status: BTreeMap<String, usize>,
    pub transactions_by_currency: BTreeMap<String, usize>,
}

#[derive(Debug, Serialize, Deserialize, Clone, PartialEq, JsonSchema)]
#[serde(rename_all = "camelCase")]
pub struct DonorTransactionHistory {
    pub donor_id: String,
    pub total_donations: usize,
    pub total_amount: f64,
    pub average_donation: f64,
    pub first_donation: Option<DateTime<Utc>>,
    pub last_donation: Option<DateTime<Utc>>,
    pub transactions: Vec<Transaction>,
}

#[derive(Debug, Serialize, Deserialize, Clone, PartialEq, JsonSchema)]
#[serde(rename_all = "camelCase")]
pub struct HealthData {
    pub subscriptions: usize,
    pub transactions: usize,
    pub payment_stats: PaymentStatistics,
}

#[derive(Debug, Serialize, Deserialize, Clone, PartialEq, JsonSchema)]
#[serde(rename_all = "camelCase")]
pub struct HealthStatus {
    pub status: String,
    pub timestamp: DateTime<Utc>,
    pub uptime: f64,
    pub data: HealthData,
}

#[derive(Debug, Serialize, Deserialize, Clone, PartialEq, JsonSchema)]
#[serde(rename_all = "camelCase")]
pub struct SystemInfo {
    pub uptime: f64,
    pub version: String,
    pub scheduler_running: bool,
}

#[derive(Debug, Serialize, Deserialize, Clone, PartialEq, JsonSchema)]
#[serde(rename_all = "camelCase")]
pub struct SystemStats {
    pub subscriptions: usize,
    pub transactions: usize,
    pub payment_stats: PaymentStatistics,
    pub system: SystemInfo,
}

/// Rounds a display value to cents.
pub fn round_cents(value: f64) -> f64 {
    (value * 100.0).round() / 100.0
}
