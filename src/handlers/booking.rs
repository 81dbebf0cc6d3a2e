use std::sync::Arc;

use axum::extract::{Path, Query, State};
use axum::http::StatusCode;
use axum::Json;
use chrono::NaiveDate;
use serde::Deserialize;
use uuid::Uuid;

use crate::errors::AppError;
use crate::models::CustomerInfo;
use crate::services::booking_flow::{self, BookingView};
use crate::state::AppState;

// POST /api/bookings
pub async fn start(
    State(state): State<Arc<AppState>>,
) -> Result<(StatusCode, Json<BookingView>), AppError> {
    let view = booking_flow::start_session(&state).await?;
    Ok((StatusCode::CREATED, Json(view)))
}

// GET /api/bookings/:id
pub async fn get_booking(
    State(state): State<Arc<AppState>>,
    Path(id): Path<Uuid>,
) -> Result<Json<BookingView>, AppError> {
    Ok(Json(booking_flow::current_view(&state, id).await?))
}

// POST /api/bookings/:id/service
#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ServiceChoice {
    pub service_id: String,
}

pub async fn select_service(
    State(state): State<Arc<AppState>>,
    Path(id): Path<Uuid>,
    Json(body): Json<ServiceChoice>,
) -> Result<Json<BookingView>, AppError> {
    Ok(Json(
        booking_flow::choose_service(&state, id, &body.service_id).await?,
    ))
}

// POST /api/bookings/:id/professional
#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ProfessionalChoice {
    pub professional_id: String,
}

pub async fn select_professional(
    State(state): State<Arc<AppState>>,
    Path(id): Path<Uuid>,
    Json(body): Json<ProfessionalChoice>,
) -> Result<Json<BookingView>, AppError> {
    Ok(Json(
        booking_flow::choose_professional(&state, id, &body.professional_id).await?,
    ))
}

// GET /api/bookings/:id/slots?date=YYYY-MM-DD
#[derive(Deserialize)]
pub struct SlotsQuery {
    pub date: NaiveDate,
}

pub async fn list_slots(
    State(state): State<Arc<AppState>>,
    Path(id): Path<Uuid>,
    Query(query): Query<SlotsQuery>,
) -> Result<Json<BookingView>, AppError> {
    Ok(Json(
        booking_flow::offer_time_slots(&state, id, query.date).await?,
    ))
}

// POST /api/bookings/:id/datetime
#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DateTimeChoice {
    pub date: NaiveDate,
    pub slot_id: String,
}

pub async fn select_datetime(
    State(state): State<Arc<AppState>>,
    Path(id): Path<Uuid>,
    Json(body): Json<DateTimeChoice>,
) -> Result<Json<BookingView>, AppError> {
    Ok(Json(
        booking_flow::choose_time_slot(&state, id, body.date, &body.slot_id).await?,
    ))
}

// POST /api/bookings/:id/checkout
pub async fn checkout(
    State(state): State<Arc<AppState>>,
    Path(id): Path<Uuid>,
    Json(customer): Json<CustomerInfo>,
) -> Result<Json<BookingView>, AppError> {
    Ok(Json(booking_flow::checkout(&state, id, customer).await?))
}

// POST /api/bookings/:id/back
pub async fn back(
    State(state): State<Arc<AppState>>,
    Path(id): Path<Uuid>,
) -> Result<Json<BookingView>, AppError> {
    Ok(Json(booking_flow::go_back(&state, id).await?))
}

// POST /api/bookings/:id/book-another
pub async fn book_another(
    State(state): State<Arc<AppState>>,
    Path(id): Path<Uuid>,
) -> Result<Json<BookingView>, AppError> {
    Ok(Json(booking_flow::book_another(&state, id).await?))
}
