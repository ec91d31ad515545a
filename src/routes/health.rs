use chrono::Utc;
use rocket::State;
use rocket::serde::json::Json;
use rocket_okapi::openapi;

use crate::models::{HealthData, HealthStatus, SystemInfo, SystemStats};
use crate::state::AppState;
use crate::utils::ApiResponse;

#[openapi(tag = "Health")]
#[get("/health")]
pub async fn health(state: &State<AppState>) -> Json<ApiResponse<HealthStatus>> {
    Json(ApiResponse::success(HealthStatus {
        status: "healthy".to_string(),
        timestamp: Utc::now(),
        uptime: state.uptime_secs(),
        data: HealthData {
            subscriptions: state.store.count_subscriptions(),
            transactions: state.store.count_transactions(),
            payment_stats: state.payments.statistics(),
        },
    }))
}

#[openapi(tag = "Health")]
#[get("/health/stats")]
pub async fn system_stats(state: &State<AppState>) -> Json<ApiResponse<SystemStats>> {
    Json(ApiResponse::success(SystemStats {
        subscriptions: state.store.count_subscriptions(),
        transactions: state.store.count_transactions(),
        payment_stats: state.payments.statistics(),
        system: SystemInfo {
            uptime: state.uptime_secs(),
            version: env!("CARGO_PKG_VERSION").to_string(),
            scheduler_running: state.scheduler.is_running(),
        },
    }))
}
