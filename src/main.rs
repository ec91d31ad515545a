#[macro_use]
extern crate rocket;

mod config;
mod models;
mod routes;
mod services;
mod state;
mod utils;

use dotenvy::dotenv;
use rocket::fairing::{Fairing, Info, Kind};
use rocket::http::Header;
use rocket::serde::json::{Value, json};
use rocket::{Build, Request, Response, Rocket};
use rocket_okapi::openapi_get_routes;
use rocket_okapi::swagger_ui::{SwaggerUIConfig, make_swagger_ui};

use crate::state::{AppState, start_jobs, stop_jobs};

/* ----------------------------- CORS ----------------------------- */

pub struct CORS;

#[rocket::async_trait]
impl Fairing for CORS {
    fn info(&self) -> Info {
        Info {
            name: "CORS",
            kind: Kind::Response,
        }
    }

    async fn on_response<'r>(&self, request: &'r Request<'_>, response: &mut Response<'r>) {
        let origin = request.headers().get_one("Origin").unwrap_or("*");
        response.set_header(Header::new("Access-Control-Allow-Origin", origin.to_string()));

        response.set_header(Header::new(
            "Access-Control-Allow-Methods",
            "GET, POST, DELETE, OPTIONS",
        ));

        response.set_header(Header::new("Access-Control-Allow-Headers", "Content-Type"));
    }
}

/* ----------------------------- OPTIONS ----------------------------- */

#[options("/<_..>")]
fn options_handler() {}

/* ----------------------------- INDEX ----------------------------- */

#[get("/")]
fn index() -> Value {
    json!({
        "message": "Recurring Donations API",
        "version": env!("CARGO_PKG_VERSION"),
        "endpoints": {
            "subscriptions": "/api/v1/subscriptions",
            "transactions": "/api/v1/transactions",
            "payments": "/api/v1/payments/process",
            "health": "/api/v1/health",
            "docs": "/api/docs"
        }
    })
}

/* ----------------------------- ERRORS ----------------------------- */

#[catch(400)]
fn bad_request() -> Value {
    json!({
        "success": false,
        "message": "Malformed request body"
    })
}

#[catch(404)]
fn not_found() -> Value {
    json!({
        "success": false,
        "message": "Resource not found (check /api/v1 prefix)"
    })
}

#[catch(422)]
fn unprocessable() -> Value {
    json!({
        "success": false,
        "message": "Request body has missing or invalid fields"
    })
}

#[catch(500)]
fn internal_error() -> Value {
    json!({
        "success": false,
        "message": "Internal server error"
    })
}

/* ----------------------------- SWAGGER ----------------------------- */

fn swagger_config() -> SwaggerUIConfig {
    SwaggerUIConfig {
        url: "/api/v1/openapi.json".to_string(),
        ..Default::default()
    }
}

/* ----------------------------- BUILD ----------------------------- */

pub fn build(state: AppState) -> Rocket<Build> {
    rocket::build()
        .manage(state)
        .attach(CORS)
        .mount("/", routes![index, options_handler])
        .mount(
            "/api/v1",
            openapi_get_routes![
                // Subscriptions
                routes::subscription::create_subscription,
                routes::subscription::list_subscriptions,
                routes::subscription::list_active_subscriptions,
                routes::subscription::get_subscription_statistics,
                routes::subscription::get_subscription,
                routes::subscription::deactivate_subscription,
                // Transactions
                routes::transaction::list_transactions,
                routes::transaction::get_transaction_statistics,
                routes::transaction::list_subscription_transactions,
                routes::transaction::list_donor_transactions,
                routes::transaction::get_donor_history,
                routes::transaction::get_transaction,
                // Payments
                routes::payment::process_payments,
                // Health
                routes::health::health,
                routes::health::system_stats,
            ],
        )
        .mount("/api/docs", make_swagger_ui(&swagger_config()))
        .register(
            "/",
            catchers![bad_request, not_found, unprocessable, internal_error],
        )
}

/* ----------------------------- LAUNCH ----------------------------- */

#[launch]
fn rocket() -> Rocket<Build> {
    dotenv().ok();
    env_logger::init();

    log::info!("🚀 Recurring Donations API starting");
    log::info!("📚 Swagger UI → /api/docs");

    build(AppState::from_config())
        .attach(start_jobs())
        .attach(stop_jobs())
}
