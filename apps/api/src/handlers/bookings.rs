use axum::Json;
use axum::extract::{Extension, Path, State};
use axum::http::StatusCode;
use chrono::{DateTime, Utc};

use fleetdesk_application::{CreateBookingInput, UpdateBookingInput};
use fleetdesk_core::AppError;
use fleetdesk_domain::{BookingId, BookingStatus, Principal};

use crate::dto::{BookingResponse, CreateBookingRequest, UpdateBookingRequest};
use crate::error::ApiResult;
use crate::state::AppState;

pub async fn list_bookings_handler(
    State(state): State<AppState>,
    Extension(principal): Extension<Principal>,
) -> ApiResult<Json<Vec<BookingResponse>>> {
    let bookings = state
        .booking_service
        .list(&principal)
        .await?
        .into_iter()
        .map(BookingResponse::from)
        .collect();

    Ok(Json(bookings))
}

pub async fn get_booking_handler(
    State(state): State<AppState>,
    Extension(principal): Extension<Principal>,
    Path(booking_id): Path<uuid::Uuid>,
) -> ApiResult<Json<BookingResponse>> {
    let booking = state
        .booking_service
        .get(&principal, BookingId::from_uuid(booking_id))
        .await?;

    Ok(Json(BookingResponse::from(booking)))
}

pub async fn create_booking_handler(
    State(state): State<AppState>,
    Extension(principal): Extension<Principal>,
    Json(payload): Json<CreateBookingRequest>,
) -> ApiResult<(StatusCode, Json<BookingResponse>)> {
    let input = CreateBookingInput {
        vehicle: payload.vehicle,
        start_time: parse_timestamp(payload.start_time.as_str(), "start_time")?,
        end_time: parse_timestamp(payload.end_time.as_str(), "end_time")?,
        notes: payload.notes,
    };

    let booking = state.booking_service.create(&principal, input).await?;

    Ok((StatusCode::CREATED, Json(BookingResponse::from(booking))))
}

pub async fn update_booking_handler(
    State(state): State<AppState>,
    Extension(principal): Extension<Principal>,
    Path(booking_id): Path<uuid::Uuid>,
    Json(payload): Json<UpdateBookingRequest>,
) -> ApiResult<Json<BookingResponse>> {
    let status = payload
        .status
        .as_deref()
        .map(str::parse::<BookingStatus>)
        .transpose()?;
    let input = UpdateBookingInput {
        vehicle: payload.vehicle,
        start_time: payload
            .start_time
            .as_deref()
            .map(|value| parse_timestamp(value, "start_time"))
            .transpose()?,
        end_time: payload
            .end_time
            .as_deref()
            .map(|value| parse_timestamp(value, "end_time"))
            .transpose()?,
        status,
        notes: payload.notes,
    };

    let booking = state
        .booking_service
        .update(&principal, BookingId::from_uuid(booking_id), input)
        .await?;

    Ok(Json(BookingResponse::from(booking)))
}

pub async fn delete_booking_handler(
    State(state): State<AppState>,
    Extension(principal): Extension<Principal>,
    Path(booking_id): Path<uuid::Uuid>,
) -> ApiResult<StatusCode> {
    state
        .booking_service
        .delete(&principal, BookingId::from_uuid(booking_id))
        .await?;

    Ok(StatusCode::NO_CONTENT)
}

fn parse_timestamp(value: &str, field: &str) -> Result<DateTime<Utc>, AppError> {
    DateTime::parse_from_rfc3339(value)
        .map(|parsed| parsed.with_timezone(&Utc))
        .map_err(|error| AppError::Validation(format!("invalid {field}: {error}")))
}
