use std::sync::Arc;

use async_trait::async_trait;
use chrono::{DateTime, Utc};

use fleetdesk_core::{AppError, AppResult, NonEmptyString};
use fleetdesk_domain::{BookingId, BookingStatus, Principal, UserId};

use crate::access_policy;
use crate::permissions;

/// Booking row projection returned by the repository.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BookingRecord {
    /// Stable booking identifier.
    pub booking_id: BookingId,
    /// Owning user.
    pub user_id: UserId,
    /// Vehicle identifier or plate.
    pub vehicle: String,
    /// Start of the booked window.
    pub start_time: DateTime<Utc>,
    /// End of the booked window.
    pub end_time: DateTime<Utc>,
    /// Lifecycle status.
    pub status: BookingStatus,
    /// Optional free-form notes.
    pub notes: Option<String>,
    /// Creation timestamp.
    pub created_at: DateTime<Utc>,
}

/// Input payload for booking creation.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CreateBookingInput {
    /// Vehicle identifier or plate.
    pub vehicle: String,
    /// Start of the booked window.
    pub start_time: DateTime<Utc>,
    /// End of the booked window.
    pub end_time: DateTime<Utc>,
    /// Optional free-form notes.
    pub notes: Option<String>,
}

/// Partial update payload; `None` leaves a field unchanged.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct UpdateBookingInput {
    /// New vehicle identifier.
    pub vehicle: Option<String>,
    /// New window start.
    pub start_time: Option<DateTime<Utc>>,
    /// New window end.
    pub end_time: Option<DateTime<Utc>>,
    /// New lifecycle status.
    pub status: Option<BookingStatus>,
    /// New notes value.
    pub notes: Option<String>,
}

/// Repository port for booking rows.
#[async_trait]
pub trait BookingRepository: Send + Sync {
    /// Lists all bookings, newest first.
    async fn list(&self) -> AppResult<Vec<BookingRecord>>;

    /// Finds a booking by id.
    async fn find_by_id(&self, booking_id: BookingId) -> AppResult<Option<BookingRecord>>;

    /// Inserts a booking for an owner with an explicit initial status.
    async fn insert(
        &self,
        owner: UserId,
        input: CreateBookingInput,
        status: BookingStatus,
    ) -> AppResult<BookingRecord>;

    /// Applies a partial update to a booking.
    async fn update(
        &self,
        booking_id: BookingId,
        input: UpdateBookingInput,
    ) -> AppResult<BookingRecord>;

    /// Deletes a booking.
    async fn delete(&self, booking_id: BookingId) -> AppResult<()>;
}

/// Application service for booking CRUD with policy checks.
#[derive(Clone)]
pub struct BookingService {
    repository: Arc<dyn BookingRepository>,
}

impl BookingService {
    /// Creates a new service from a repository implementation.
    #[must_use]
    pub fn new(repository: Arc<dyn BookingRepository>) -> Self {
        Self { repository }
    }

    /// Lists bookings.
    pub async fn list(&self, actor: &Principal) -> AppResult<Vec<BookingRecord>> {
        access_policy::require_permission(actor, permissions::BOOKINGS_READ)?;

        self.repository.list().await
    }

    /// Returns a single booking.
    pub async fn get(&self, actor: &Principal, booking_id: BookingId) -> AppResult<BookingRecord> {
        access_policy::require_permission(actor, permissions::BOOKINGS_READ)?;

        self.find_existing(booking_id).await
    }

    /// Creates a booking owned by the actor, starting in `Pending`.
    pub async fn create(
        &self,
        actor: &Principal,
        input: CreateBookingInput,
    ) -> AppResult<BookingRecord> {
        access_policy::require_permission(actor, permissions::BOOKINGS_CREATE)?;

        NonEmptyString::new(input.vehicle.as_str())?;
        validate_window(input.start_time, input.end_time)?;

        self.repository
            .insert(actor.user_id(), input, BookingStatus::Pending)
            .await
    }

    /// Updates a booking. The caller must own it or hold a privileged role.
    pub async fn update(
        &self,
        actor: &Principal,
        booking_id: BookingId,
        input: UpdateBookingInput,
    ) -> AppResult<BookingRecord> {
        access_policy::require_permission(actor, permissions::BOOKINGS_UPDATE)?;

        let existing = self.find_existing(booking_id).await?;
        access_policy::require_owner_or_privileged(actor, existing.user_id)?;

        if let Some(vehicle) = &input.vehicle {
            NonEmptyString::new(vehicle.as_str())?;
        }
        let start = input.start_time.unwrap_or(existing.start_time);
        let end = input.end_time.unwrap_or(existing.end_time);
        validate_window(start, end)?;

        self.repository.update(booking_id, input).await
    }

    /// Deletes a booking. The caller must own it or hold a privileged role.
    pub async fn delete(&self, actor: &Principal, booking_id: BookingId) -> AppResult<()> {
        access_policy::require_permission(actor, permissions::BOOKINGS_DELETE)?;

        let existing = self.find_existing(booking_id).await?;
        access_policy::require_owner_or_privileged(actor, existing.user_id)?;

        self.repository.delete(booking_id).await
    }

    async fn find_existing(&self, booking_id: BookingId) -> AppResult<BookingRecord> {
        self.repository
            .find_by_id(booking_id)
            .await?
            .ok_or_else(|| AppError::NotFound(format!("booking '{booking_id}' was not found")))
    }
}

fn validate_window(start: DateTime<Utc>, end: DateTime<Utc>) -> AppResult<()> {
    if end <= start {
        return Err(AppError::Validation(
            "booking end_time must be after start_time".to_owned(),
        ));
    }

    Ok(())
}

#[cfg(test)]
mod tests {
    use std::sync::Arc;

    use async_trait::async_trait;
    use chrono::{Duration, Utc};
    use tokio::sync::Mutex;

    use fleetdesk_core::{AppError, AppResult};
    use fleetdesk_domain::{
        BookingId, BookingStatus, PermissionGrant, PermissionSet, Principal, RoleName, UserId,
    };

    use crate::permissions;

    use super::{
        BookingRecord, BookingRepository, BookingService, CreateBookingInput, UpdateBookingInput,
    };

    #[derive(Default)]
    struct FakeBookingRepository {
        bookings: Mutex<Vec<BookingRecord>>,
    }

    #[async_trait]
    impl BookingRepository for FakeBookingRepository {
        async fn list(&self) -> AppResult<Vec<BookingRecord>> {
            Ok(self.bookings.lock().await.clone())
        }

        async fn find_by_id(&self, booking_id: BookingId) -> AppResult<Option<BookingRecord>> {
            Ok(self
                .bookings
                .lock()
                .await
                .iter()
                .find(|booking| booking.booking_id == booking_id)
                .cloned())
        }

        async fn insert(
            &self,
            owner: UserId,
            input: CreateBookingInput,
            status: BookingStatus,
        ) -> AppResult<BookingRecord> {
            let booking = BookingRecord {
                booking_id: BookingId::new(),
                user_id: owner,
                vehicle: input.vehicle,
                start_time: input.start_time,
                end_time: input.end_time,
                status,
                notes: input.notes,
                created_at: Utc::now(),
            };
            self.bookings.lock().await.push(booking.clone());
            Ok(booking)
        }

        async fn update(
            &self,
            booking_id: BookingId,
            input: UpdateBookingInput,
        ) -> AppResult<BookingRecord> {
            let mut bookings = self.bookings.lock().await;
            let booking = bookings
                .iter_mut()
                .find(|booking| booking.booking_id == booking_id)
                .ok_or_else(|| AppError::NotFound("booking not found".to_owned()))?;
            if let Some(vehicle) = input.vehicle {
                booking.vehicle = vehicle;
            }
            if let Some(start_time) = input.start_time {
                booking.start_time = start_time;
            }
            if let Some(end_time) = input.end_time {
                booking.end_time = end_time;
            }
            if let Some(status) = input.status {
                booking.status = status;
            }
            if let Some(notes) = input.notes {
                booking.notes = Some(notes);
            }
            Ok(booking.clone())
        }

        async fn delete(&self, booking_id: BookingId) -> AppResult<()> {
            self.bookings
                .lock()
                .await
                .retain(|booking| booking.booking_id != booking_id);
            Ok(())
        }
    }

    fn actor(role: RoleName, names: &[&str]) -> Principal {
        let grants = names
            .iter()
            .map(|name| PermissionGrant {
                name: (*name).to_owned(),
                resource: String::new(),
                action: String::new(),
                description: None,
            })
            .collect();
        Principal::new(
            UserId::new(),
            "driver",
            "driver@example.com",
            role,
            PermissionSet::new(grants),
        )
    }

    fn valid_input() -> CreateBookingInput {
        let start = Utc::now() + Duration::hours(1);
        CreateBookingInput {
            vehicle: "VAN-042".to_owned(),
            start_time: start,
            end_time: start + Duration::hours(4),
            notes: None,
        }
    }

    fn service() -> (BookingService, Arc<FakeBookingRepository>) {
        let repository = Arc::new(FakeBookingRepository::default());
        (BookingService::new(repository.clone()), repository)
    }

    #[tokio::test]
    async fn create_requires_permission_and_starts_pending() {
        let (service, _) = service();

        let denied = service.create(&actor(RoleName::User, &[]), valid_input()).await;
        assert!(matches!(denied, Err(AppError::Forbidden(_))));

        let creator = actor(RoleName::User, &[permissions::BOOKINGS_CREATE]);
        let created = service.create(&creator, valid_input()).await;
        assert!(matches!(
            created,
            Ok(booking) if booking.status == BookingStatus::Pending
                && booking.user_id == creator.user_id()
        ));
    }

    #[tokio::test]
    async fn create_rejects_inverted_window() {
        let (service, _) = service();
        let creator = actor(RoleName::User, &[permissions::BOOKINGS_CREATE]);

        let mut input = valid_input();
        input.end_time = input.start_time - Duration::hours(1);

        let result = service.create(&creator, input).await;
        assert!(matches!(result, Err(AppError::Validation(_))));
    }

    #[tokio::test]
    async fn update_enforces_ownership_for_unprivileged_actors() {
        let (service, _) = service();
        let owner = actor(
            RoleName::User,
            &[permissions::BOOKINGS_CREATE, permissions::BOOKINGS_UPDATE],
        );
        let Ok(booking) = service.create(&owner, valid_input()).await else {
            panic!("create failed");
        };

        let stranger = actor(RoleName::Manager, &[permissions::BOOKINGS_UPDATE]);
        let denied = service
            .update(
                &stranger,
                booking.booking_id,
                UpdateBookingInput {
                    status: Some(BookingStatus::Cancelled),
                    ..UpdateBookingInput::default()
                },
            )
            .await;
        assert!(matches!(denied, Err(AppError::Forbidden(_))));

        let allowed = service
            .update(
                &owner,
                booking.booking_id,
                UpdateBookingInput {
                    status: Some(BookingStatus::Confirmed),
                    ..UpdateBookingInput::default()
                },
            )
            .await;
        assert!(matches!(
            allowed,
            Ok(updated) if updated.status == BookingStatus::Confirmed
        ));
    }

    #[tokio::test]
    async fn privileged_actor_may_delete_someone_elses_booking() {
        let (service, repository) = service();
        let owner = actor(
            RoleName::User,
            &[permissions::BOOKINGS_CREATE, permissions::BOOKINGS_DELETE],
        );
        let Ok(booking) = service.create(&owner, valid_input()).await else {
            panic!("create failed");
        };

        let admin = actor(RoleName::Admin, &[permissions::BOOKINGS_DELETE]);
        let result = service.delete(&admin, booking.booking_id).await;

        assert!(result.is_ok());
        assert!(repository.bookings.lock().await.is_empty());
    }

    #[tokio::test]
    async fn update_validates_the_merged_window() {
        let (service, _) = service();
        let owner = actor(
            RoleName::User,
            &[permissions::BOOKINGS_CREATE, permissions::BOOKINGS_UPDATE],
        );
        let Ok(booking) = service.create(&owner, valid_input()).await else {
            panic!("create failed");
        };

        // Moving end before the unchanged start must fail.
        let result = service
            .update(
                &owner,
                booking.booking_id,
                UpdateBookingInput {
                    end_time: Some(booking.start_time - Duration::minutes(5)),
                    ..UpdateBookingInput::default()
                },
            )
            .await;

        assert!(matches!(result, Err(AppError::Validation(_))));
    }

    #[tokio::test]
    async fn get_maps_missing_booking_to_not_found() {
        let (service, _) = service();
        let reader = actor(RoleName::User, &[permissions::BOOKINGS_READ]);

        let result = service.get(&reader, BookingId::new()).await;

        assert!(matches!(result, Err(AppError::NotFound(_))));
    }
}
