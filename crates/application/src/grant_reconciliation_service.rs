//! Superadmin grant reconciliation.
//!
//! Invariant maintained: at every quiescent moment the superadmin role's
//! grant set equals the full permission catalog. Catalog growth opens a
//! drift window (permission row present, grant row missing) that stays open
//! only until the next [`GrantReconciliationService::reconcile`] call.
//!
//! The service holds no lock. Safety under concurrent invocation is
//! delegated to the store's uniqueness constraint on (role, permission):
//! insert-if-absent makes the operation idempotent and commutative, so
//! duplicated, delayed, or racing triggers all converge to the same state.

use std::sync::Arc;

use async_trait::async_trait;

use fleetdesk_core::{AppError, AppResult};

/// Completeness of the superadmin grant set relative to the catalog.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum GrantSyncState {
    /// Every catalog permission is granted.
    Complete,
    /// At least one catalog permission has no grant row.
    Incomplete,
}

impl GrantSyncState {
    /// Returns a stable transport value for this state.
    #[must_use]
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Complete => "complete",
            Self::Incomplete => "incomplete",
        }
    }
}

/// Snapshot of catalog size versus superadmin grants.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct GrantSyncStatus {
    /// Number of permission rows in the catalog.
    pub total_permissions: i64,
    /// Number of catalog permissions granted to superadmin.
    pub granted: i64,
    /// `total_permissions - granted`.
    pub missing: i64,
    /// `Complete` iff `missing == 0`.
    pub state: GrantSyncState,
}

/// Repository port for grant reconciliation.
#[async_trait]
pub trait GrantReconciliationRepository: Send + Sync {
    /// Reads the current catalog/grant counts. Pure read, no mutation.
    async fn grant_status(&self) -> AppResult<GrantSyncStatus>;

    /// Inserts one grant row per catalog permission the superadmin role is
    /// missing, using insert-if-absent semantics. Returns the insert count.
    async fn insert_missing_grants(&self) -> AppResult<u64>;

    /// Unconditionally ensures every catalog permission is granted to the
    /// superadmin role. Returns the insert count.
    async fn grant_all_permissions(&self) -> AppResult<u64>;
}

/// Fire-and-forget signal that the permission catalog changed.
///
/// Components that add catalog rows call [`CatalogChangeNotifier::notify`]
/// after the write; a listener reacts by reconciling. Losing, delaying, or
/// duplicating a notification is harmless because reconciliation is
/// idempotent.
pub trait CatalogChangeNotifier: Send + Sync {
    /// Signals that the permission catalog grew.
    fn notify(&self);
}

/// Application service that closes superadmin grant drift to zero.
#[derive(Clone)]
pub struct GrantReconciliationService {
    repository: Arc<dyn GrantReconciliationRepository>,
}

impl GrantReconciliationService {
    /// Creates a new service from a repository implementation.
    #[must_use]
    pub fn new(repository: Arc<dyn GrantReconciliationRepository>) -> Self {
        Self { repository }
    }

    /// Reports catalog/grant drift. Safe to call at any time, including
    /// concurrently with a running reconciliation.
    pub async fn status(&self) -> AppResult<GrantSyncStatus> {
        self.repository.grant_status().await
    }

    /// Grants every missing catalog permission to the superadmin role and
    /// returns how many grant rows were inserted.
    ///
    /// Idempotent: a second call with no intervening catalog change inserts
    /// zero rows. A uniqueness violation raised by a racing writer means the
    /// permission is already granted and is folded into success.
    pub async fn reconcile(&self) -> AppResult<u64> {
        match self.repository.insert_missing_grants().await {
            Ok(inserted) => Ok(inserted),
            Err(AppError::Conflict(_)) => Ok(0),
            Err(error) => Err(error),
        }
    }

    /// Bootstrap variant: unconditionally ensures the full catalog is
    /// granted. Converges to the same post-state as [`Self::reconcile`].
    pub async fn force_grant_all(&self) -> AppResult<u64> {
        match self.repository.grant_all_permissions().await {
            Ok(inserted) => Ok(inserted),
            Err(AppError::Conflict(_)) => Ok(0),
            Err(error) => Err(error),
        }
    }
}
