pub mod booking;
pub mod health;

use std::sync::Arc;

use axum::http::Uri;
use axum::routing::{get, post};
use axum::Router;
use tower_http::cors::CorsLayer;
use tower_http::trace::TraceLayer;

use crate::errors::AppError;
use crate::state::AppState;

pub fn router(state: Arc<AppState>) -> Router {
    Router::new()
        .route("/health", get(health::health))
        .route("/api/bookings", post(booking::start))
        .route("/api/bookings/:id", get(booking::get_booking))
        .route("/api/bookings/:id/service", post(booking::select_service))
        .route(
            "/api/bookings/:id/professional",
            post(booking::select_professional),
        )
        .route("/api/bookings/:id/slots", get(booking::list_slots))
        .route("/api/bookings/:id/datetime", post(booking::select_datetime))
        .route("/api/bookings/:id/checkout", post(booking::checkout))
        .route("/api/bookings/:id/back", post(booking::back))
        .route("/api/bookings/:id/book-another", post(booking::book_another))
        .fallback(not_found)
        .layer(TraceLayer::new_for_http())
        .layer(CorsLayer::permissive())
        .with_state(state)
}

async fn not_found(uri: Uri) -> AppError {
    AppError::NotFound(uri.path().to_string())
}
