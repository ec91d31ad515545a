use chrono::{DateTime, Days, Months, Utc};
use serde::{Deserialize, Serialize};
use rocket_okapi::okapi::schemars::JsonSchema;
use validator::Validate;

use super::CampaignAnalysis;

#[derive(Debug, Serialize, Deserialize, Clone, Copy, PartialEq, Eq, Hash, JsonSchema)]
#[serde(rename_all = "UPPERCASE")]
pub enum Currency {
    Usd,
    Eur,
    Gbp,
    Cad,
    Aud,
}

impl Currency {
    pub fn as_str(&self) -> &'static str {
        match self {
            Currency::Usd => "USD",
            Currency::Eur => "EUR",
            Currency::Gbp => "GBP",
            Currency::Cad => "CAD",
            Currency::Aud => "AUD",
        }
    }
}

#[derive(Debug, Serialize, Deserialize, Clone, Copy, PartialEq, Eq, Hash, JsonSchema)]
#[serde(rename_all = "lowercase")]
pub enum BillingInterval {
    Daily,
    Weekly,
    Monthly,
    Yearly,
}

impl BillingInterval {
    pub fn as_str(&self) -> &'static str {
        match self {
            BillingInterval::Daily => "daily",
            BillingInterval::Weekly => "weekly",
            BillingInterval::Monthly => "monthly",
            BillingInterval::Yearly => "yearly",
        }
    }

    /// Date of the next charge, one interval after `from`.
    ///
    /// Calendar intervals clamp to the last valid day of the target month,
    /// so Jan 31 rolls to Feb 28 (or 29) and Feb 29 rolls to Feb 28 a year on.
    pub fn next_billing_date(&self, from: DateTime<Utc>) -> DateTime<Utc> {
        let next = match self {
            BillingInterval::Daily => from.checked_add_days(Days::new(1)),
            BillingInterval::Weekly => from.checked_add_days(Days::new(7)),
            BillingInterval::Monthly => from.checked_add_months(Months::new(1)),
            BillingInterval::Yearly => from.checked_add_months(Months::new(12)),
        };

        next.unwrap_or(DateTime::<Utc>::MAX_UTC)
    }

    /// Normalizes a per-interval amount to a monthly one.
    pub fn monthly_value(&self, amount: f64) -> f64 {
        match self {
            BillingInterval::Daily => amount * 30.0,
            BillingInterval::Weekly => amount * 4.33, // average weeks per month
            BillingInterval::Monthly => amount,
            BillingInterval::Yearly => amount / 12.0,
        }
    }
}

#[derive(Debug, Serialize, Deserialize, Clone, PartialEq, JsonSchema)]
#[serde(rename_all = "camelCase")]
pub struct Subscription {
    pub id: String,
    pub donor_id: String,
    pub amount: f64,
    pub currency: Currency,
    pub interval: BillingInterval,
    pub campaign_description: String,
    pub campaign_analysis: CampaignAnalysis,
    pub is_active: bool,
    pub created_at: DateTime<Utc>,
    pub next_billing_date: DateTime<Utc>,
}

impl Subscription {
    pub fn is_due(&self, now: DateTime<Utc>) -> bool {
        self.is_active && self.next_billing_date <= now
    }
}

#[derive(Debug, Deserialize, Validate, JsonSchema)]
#[serde(rename_all = "camelCase")]
pub struct CreateSubscriptionDto {
    #[validate(length(min = 1, message = "donorId is required and must be a string"))]
    pub donor_id: String,
    #[validate(range(min = 0.01, message = "amount must be a positive number"))]
    pub amount: f64,
    pub currency: Currency,
    pub interval: BillingInterval,
    #[validate(length(min = 1, message = "campaignDescription is required and must be a string"))]
    pub campaign_description: String,
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    fn at(y: i32, m: u32, d: u32) -> DateTime<Utc> {
        Utc.with_ymd_and_hms(y, m, d, 10, 30, 0).unwrap()
    }

    #[test]
    fn daily_and_weekly_add_fixed_days() {
        let from = at(2025, 3, 30);
        assert_eq!(BillingInterval::Daily.next_billing_date(from), at(2025, 3, 31));
        assert_eq!(BillingInterval::Weekly.next_billing_date(from), at(2025, 4, 6));
    }

    #[test]
    fn monthly_clamps_to_end_of_shorter_month() {
        assert_eq!(
            BillingInterval::Monthly.next_billing_date(at(2025, 1, 31)),
            at(2025, 2, 28)
        );
        assert_eq!(
            BillingInterval::Monthly.next_billing_date(at(2024, 1, 31)),
            at(2024, 2, 29)
        );
        assert_eq!(
            BillingInterval::Monthly.next_billing_date(at(2025, 12, 15)),
            at(2026, 1, 15)
        );
    }

    #[test]
    fn yearly_from_leap_day_clamps() {
        assert_eq!(
            BillingInterval::Yearly.next_billing_date(at(2024, 2, 29)),
            at(2025, 2, 28)
        );
        assert_eq!(
            BillingInterval::Yearly.next_billing_date(at(2025, 6, 1)),
            at(2026, 6, 1)
        );
    }

    #[test]
    fn monthly_value_factors() {
        assert_eq!(BillingInterval::Daily.monthly_value(10.0), 300.0);
        assert!((BillingInterval::Weekly.monthly_value(10.0) - 43.3).abs() < 1e-9);
        assert_eq!(BillingInterval::Monthly.monthly_value(10.0), 10.0);
        assert_eq!(BillingInterval::Yearly.monthly_value(120.0), 10.0);
    }

    #[test]
    fn enums_use_wire_names() {
        assert_eq!(serde_json::to_string(&Currency::Gbp).unwrap(), "\"GBP\"");
        assert_eq!(
            serde_json::from_str::<BillingInterval>("\"weekly\"").unwrap(),
            BillingInterval::Weekly
        );
        assert!(serde_json::from_str::<Currency>("\"JPY\"").is_err());
    }

    #[test]
    fn create_dto_rejects_non_positive_amount() {
        let dto = CreateSubscriptionDto {
            donor_id: "donor-1".to_string(),
            amount: 0.0,
            currency: Currency::Usd,
            interval: BillingInterval::Monthly,
            campaign_description: "Clean water".to_string(),
        };
        assert!(dto.validate().is_err());

        let dto = CreateSubscriptionDto { amount: 0.01, ..dto };
        assert!(dto.validate().is_ok());
    }
}
