use std::str::FromStr;

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use sqlx::{FromRow, PgPool};

use fleetdesk_application::{
    BookingRecord, BookingRepository, CreateBookingInput, UpdateBookingInput,
};
use fleetdesk_core::{AppError, AppResult};
use fleetdesk_domain::{BookingId, BookingStatus, UserId};

/// PostgreSQL-backed repository for booking rows.
#[derive(Clone)]
pub struct PostgresBookingRepository {
    pool: PgPool,
}

impl PostgresBookingRepository {
    /// Creates a repository with the provided connection pool.
    #[must_use]
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

#[derive(Debug, FromRow)]
struct BookingRow {
    id: uuid::Uuid,
    user_id: uuid::Uuid,
    vehicle: String,
    start_time: DateTime<Utc>,
    end_time: DateTime<Utc>,
    status: String,
    notes: Option<String>,
    created_at: DateTime<Utc>,
}

impl TryFrom<BookingRow> for BookingRecord {
    type Error = AppError;

    fn try_from(row: BookingRow) -> Result<Self, Self::Error> {
        let status = BookingStatus::from_str(row.status.as_str()).map_err(|error| {
            AppError::Internal(format!(
                "invalid stored status '{}' for booking '{}': {error}",
                row.status, row.id
            ))
        })?;

        Ok(Self {
            booking_id: BookingId::from_uuid(row.id),
            user_id: UserId::from_uuid(row.user_id),
            vehicle: row.vehicle,
            start_time: row.start_time,
            end_time: row.end_time,
            status,
            notes: row.notes,
            created_at: row.created_at,
        })
    }
}

#[async_trait]
impl BookingRepository for PostgresBookingRepository {
    async fn list(&self) -> AppResult<Vec<BookingRecord>> {
        let rows = sqlx::query_as::<_, BookingRow>(
            r#"
            SELECT id, user_id, vehicle, start_time, end_time, status, notes, created_at
            FROM bookings
            ORDER BY created_at DESC
            "#,
        )
        .fetch_all(&self.pool)
        .await
        .map_err(|error| AppError::Internal(format!("failed to list bookings: {error}")))?;

        rows.into_iter().map(BookingRecord::try_from).collect()
    }

    async fn find_by_id(&self, booking_id: BookingId) -> AppResult<Option<BookingRecord>> {
        let row = sqlx::query_as::<_, BookingRow>(
            r#"
            SELECT id, user_id, vehicle, start_time, end_time, status, notes, created_at
            FROM bookings
            WHERE id = $1
            LIMIT 1
            "#,
        )
        .bind(booking_id.as_uuid())
        .fetch_optional(&self.pool)
        .await
        .map_err(|error| AppError::Internal(format!("failed to find booking: {error}")))?;

        row.map(BookingRecord::try_from).transpose()
    }

    async fn insert(
        &self,
        owner: UserId,
        input: CreateBookingInput,
        status: BookingStatus,
    ) -> AppResult<BookingRecord> {
        let row = sqlx::query_as::<_, BookingRow>(
            r#"
            INSERT INTO bookings (user_id, vehicle, start_time, end_time, status, notes)
            VALUES ($1, $2, $3, $4, $5, $6)
            RETURNING id, user_id, vehicle, start_time, end_time, status, notes, created_at
            "#,
        )
        .bind(owner.as_uuid())
        .bind(input.vehicle.as_str())
        .bind(input.start_time)
        .bind(input.end_time)
        .bind(status.as_str())
        .bind(input.notes.as_deref())
        .fetch_one(&self.pool)
        .await
        .map_err(|error| AppError::Internal(format!("failed to insert booking: {error}")))?;

        BookingRecord::try_from(row)
    }

    async fn update(
        &self,
        booking_id: BookingId,
        input: UpdateBookingInput,
    ) -> AppResult<BookingRecord> {
        let row = sqlx::query_as::<_, BookingRow>(
            r#"
            UPDATE bookings
            SET vehicle = COALESCE($2, vehicle),
                start_time = COALESCE($3, start_time),
                end_time = COALESCE($4, end_time),
                status = COALESCE($5, status),
                notes = COALESCE($6, notes)
            WHERE id = $1
            RETURNING id, user_id, vehicle, start_time, end_time, status, notes, created_at
            "#,
        )
        .bind(booking_id.as_uuid())
        .bind(input.vehicle.as_deref())
        .bind(input.start_time)
        .bind(input.end_time)
        .bind(input.status.map(|status| status.as_str()))
        .bind(input.notes.as_deref())
        .fetch_optional(&self.pool)
        .await
        .map_err(|error| AppError::Internal(format!("failed to update booking: {error}")))?
        .ok_or_else(|| AppError::NotFound(format!("booking '{booking_id}' was not found")))?;

        BookingRecord::try_from(row)
    }

    async fn delete(&self, booking_id: BookingId) -> AppResult<()> {
        let rows_affected = sqlx::query("DELETE FROM bookings WHERE id = $1")
            .bind(booking_id.as_uuid())
            .execute(&self.pool)
            .await
            .map_err(|error| AppError::Internal(format!("failed to delete booking: {error}")))?
            .rows_affected();

        if rows_affected == 0 {
            return Err(AppError::NotFound(format!(
                "booking '{booking_id}' was not found"
            )));
        }

        Ok(())
    }
}
