use rocket::State;
use rocket::serde::json::Json;
use rocket_okapi::openapi;

use crate::models::SweepResult;
use crate::state::AppState;
use crate::utils::ApiResponse;

/// Runs a billing sweep now instead of waiting for the next timer tick.
#[openapi(tag = "Payment")]
#[post("/payments/process")]
pub async fn process_payments(state: &State<AppState>) -> Json<ApiResponse<SweepResult>> {
    let result = state.scheduler.trigger_now().await;

    Json(ApiResponse::success_with_message(
        "Payment processing completed".to_string(),
        result,
    ))
}
