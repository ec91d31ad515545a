use rocket::State;
use rocket::serde::json::Json;
use rocket_okapi::openapi;

use crate::models::{DonorTransactionHistory, Transaction, TransactionStatistics};
use crate::state::AppState;
use crate::utils::{ApiError, ApiResponse};

#[openapi(tag = "Transaction")]
#[get("/transactions")]
pub async fn list_transactions(state: &State<AppState>) -> Json<ApiResponse<Vec<Transaction>>> {
    Json(ApiResponse::success(state.transactions.list()))
}

#[openapi(tag = "Transaction")]
#[get("/transactions/stats/overview")]
pub async fn get_transaction_statistics(
    state: &State<AppState>,
) -> Json<ApiResponse<TransactionStatistics>> {
    Json(ApiResponse::success(state.transactions.statistics()))
}

#[openapi(tag = "Transaction")]
#[get("/transactions/subscription/<subscription_id>")]
pub async fn list_subscription_transactions(
    state: &State<AppState>,
    subscription_id: String,
) -> Json<ApiResponse<Vec<Transaction>>> {
    Json(ApiResponse::success(
        state.transactions.list_by_subscription(&subscription_id),
    ))
}

#[openapi(tag = "Transaction")]
#[get("/transactions/donor/<donor_id>")]
pub async fn list_donor_transactions(
    state: &State<AppState>,
    donor_id: String,
) -> Json<ApiResponse<Vec<Transaction>>> {
    Json(ApiResponse::success(state.transactions.list_by_donor(&donor_id)))
}

#[openapi(tag = "Transaction")]
#[get("/transactions/donor/<donor_id>/history")]
pub async fn get_donor_history(
    state: &State<AppState>,
    donor_id: String,
) -> Json<ApiResponse<DonorTransactionHistory>> {
    Json(ApiResponse::success(state.transactions.donor_history(&donor_id)))
}

#[openapi(tag = "Transaction")]
#[get("/transactions/<id>")]
pub async fn get_transaction(
    state: &State<AppState>,
    id: String,
) -> Result<Json<ApiResponse<Transaction>>, ApiError> {
    let transaction = state
        .transactions
        .get(&id)
        .ok_or_else(|| ApiError::not_found("Transaction not found"))?;

    Ok(Json(ApiResponse::success(transaction)))
}
