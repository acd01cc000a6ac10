//! CSV bulk import for bookings.
//!
//! Single pass over the file: every row is validated and inserted on its
//! own, bad rows are logged and skipped, and the file as a whole never
//! aborts half-way because one row is malformed.

use std::str::FromStr;

use chrono::{DateTime, Utc};
use serde::Deserialize;
use sqlx::PgPool;
use tracing::warn;

use fleetdesk_application::{BookingRepository, CreateBookingInput, UserRepository};
use fleetdesk_core::{AppError, AppResult, NonEmptyString};
use fleetdesk_domain::BookingStatus;
use fleetdesk_infrastructure::PostgresUserRepository;

/// One CSV row. `status` and `notes` are optional; missing status means
/// `pending`.
#[derive(Debug, Deserialize)]
struct BookingCsvRow {
    username: String,
    vehicle: String,
    start_time: String,
    end_time: String,
    status: Option<String>,
    notes: Option<String>,
}

pub(crate) async fn import_bookings(pool: &PgPool, path: &str) -> AppResult<()> {
    let mut reader = csv::Reader::from_path(path)
        .map_err(|error| AppError::Validation(format!("cannot open '{path}': {error}")))?;

    let user_repository = PostgresUserRepository::new(pool.clone());
    let booking_repository = crate::booking_repository(pool);

    let mut imported = 0_u64;
    let mut skipped = 0_u64;

    for (index, record) in reader.deserialize::<BookingCsvRow>().enumerate() {
        let line = index + 2; // header occupies line 1
        let row = match record {
            Ok(row) => row,
            Err(error) => {
                warn!(line, %error, "skipping unparsable row");
                skipped += 1;
                continue;
            }
        };

        match import_row(&user_repository, &booking_repository, row).await {
            Ok(()) => imported += 1,
            Err(error) => {
                warn!(line, %error, "skipping row");
                skipped += 1;
            }
        }
    }

    println!("imported {imported} booking(s), skipped {skipped}");
    Ok(())
}

async fn import_row(
    user_repository: &PostgresUserRepository,
    booking_repository: &impl BookingRepository,
    row: BookingCsvRow,
) -> AppResult<()> {
    let owner = user_repository
        .find_by_username_or_email(row.username.as_str())
        .await?
        .ok_or_else(|| AppError::NotFound(format!("user '{}' was not found", row.username)))?;

    let vehicle = NonEmptyString::new(row.vehicle)?;
    let start_time = parse_timestamp(row.start_time.as_str(), "start_time")?;
    let end_time = parse_timestamp(row.end_time.as_str(), "end_time")?;
    if end_time <= start_time {
        return Err(AppError::Validation(
            "booking end_time must be after start_time".to_owned(),
        ));
    }

    let status = row
        .status
        .as_deref()
        .filter(|value| !value.trim().is_empty())
        .map(BookingStatus::from_str)
        .transpose()?
        .unwrap_or(BookingStatus::Pending);

    booking_repository
        .insert(
            owner.user_id,
            CreateBookingInput {
                vehicle: vehicle.into(),
                start_time,
                end_time,
                notes: row.notes.filter(|value| !value.trim().is_empty()),
            },
            status,
        )
        .await?;

    Ok(())
}

fn parse_timestamp(value: &str, field: &str) -> AppResult<DateTime<Utc>> {
    DateTime::parse_from_rfc3339(value)
        .map(|parsed| parsed.with_timezone(&Utc))
        .map_err(|error| AppError::Validation(format!("invalid {field}: {error}")))
}
