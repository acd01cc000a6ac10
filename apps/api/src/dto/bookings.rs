use fleetdesk_application::BookingRecord;
use serde::{Deserialize, Serialize};
use ts_rs::TS;

/// Incoming payload for booking creation.
#[derive(Debug, Deserialize, TS)]
#[ts(
    export,
    export_to = "../../../../packages/api-types/src/generated/create-booking-request.ts"
)]
pub struct CreateBookingRequest {
    pub vehicle: String,
    /// RFC3339 timestamp.
    pub start_time: String,
    /// RFC3339 timestamp.
    pub end_time: String,
    pub notes: Option<String>,
}

/// Incoming payload for partial booking updates.
#[derive(Debug, Deserialize, TS)]
#[ts(
    export,
    export_to = "../../../../packages/api-types/src/generated/update-booking-request.ts"
)]
pub struct UpdateBookingRequest {
    pub vehicle: Option<String>,
    /// RFC3339 timestamp.
    pub start_time: Option<String>,
    /// RFC3339 timestamp.
    pub end_time: Option<String>,
    pub status: Option<String>,
    pub notes: Option<String>,
}

/// API representation of a booking.
#[derive(Debug, Serialize, TS)]
#[ts(
    export,
    export_to = "../../../../packages/api-types/src/generated/booking-response.ts"
)]
pub struct BookingResponse {
    pub booking_id: String,
    pub user_id: String,
    pub vehicle: String,
    pub start_time: String,
    pub end_time: String,
    pub status: String,
    pub notes: Option<String>,
    pub created_at: String,
}

impl From<BookingRecord> for BookingResponse {
    fn from(value: BookingRecord) -> Self {
        Self {
            booking_id: value.booking_id.to_string(),
            user_id: value.user_id.to_string(),
            vehicle: value.vehicle,
            start_time: value.start_time.to_rfc3339(),
            end_time: value.end_time.to_rfc3339(),
            status: value.status.as_str().to_owned(),
            notes: value.notes,
            created_at: value.created_at.to_rfc3339(),
        }
    }
}
