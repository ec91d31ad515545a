use rocket::State;
use rocket::response::status::Created;
use rocket::serde::json::Json;
use rocket_okapi::openapi;

use crate::models::{CreateSubscriptionDto, Subscription, SubscriptionStatistics};
use crate::state::AppState;
use crate::utils::{ApiError, ApiResponse, validate_dto};

#[openapi(tag = "Subscription")]
#[post("/subscriptions", data = "<dto>")]
pub async fn create_subscription(
    state: &State<AppState>,
    dto: Json<CreateSubscriptionDto>,
) -> Result<Created<Json<ApiResponse<Subscription>>>, ApiError> {
    validate_dto(&*dto)?;

    let subscription = state.subscriptions.create(dto.into_inner()).await?;
    let location = format!("/api/v1/subscriptions/{}", subscription.id);

    Ok(Created::new(location).body(Json(ApiResponse::success(subscription))))
}

#[openapi(tag = "Subscription")]
#[get("/subscriptions")]
pub async fn list_subscriptions(
    state: &State<AppState>,
) -> Json<ApiResponse<Vec<Subscription>>> {
    Json(ApiResponse::success(state.subscriptions.list()))
}

#[openapi(tag = "Subscription")]
#[get("/subscriptions/active")]
pub async fn list_active_subscriptions(
    state: &State<AppState>,
) -> Json<ApiResponse<Vec<Subscription>>> {
    Json(ApiResponse::success(state.subscriptions.list_active()))
}

#[openapi(tag = "Subscription")]
#[get("/subscriptions/stats/overview")]
pub async fn get_subscription_statistics(
    state: &State<AppState>,
) -> Json<ApiResponse<SubscriptionStatistics>> {
    Json(ApiResponse::success(state.subscriptions.statistics()))
}

#[openapi(tag = "Subscription")]
#[get("/subscriptions/<id>")]
pub async fn get_subscription(
    state: &State<AppState>,
    id: String,
) -> Result<Json<ApiResponse<Subscription>>, ApiError> {
    let subscription = state
        .subscriptions
        .get(&id)
        .ok_or_else(|| ApiError::not_found("Subscription not found"))?;

    Ok(Json(ApiResponse::success(subscription)))
}

#[openapi(tag = "Subscription")]
#[delete("/subscriptions/<id>")]
pub async fn deactivate_subscription(
    state: &State<AppState>,
    id: String,
) -> Result<Json<ApiResponse<Subscription>>, ApiError> {
    let subscription = state
        .subscriptions
        .deactivate(&id)?
        .ok_or_else(|| ApiError::not_found("Subscription not found"))?;

    Ok(Json(ApiResponse::success_with_message(
        "Subscription deactivated".to_string(),
        subscription,
    )))
}
