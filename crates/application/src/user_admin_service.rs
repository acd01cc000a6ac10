use std::sync::Arc;

use async_trait::async_trait;
use chrono::{DateTime, Utc};

use fleetdesk_core::{AppError, AppResult};
use fleetdesk_domain::{
    EmailAddress, Principal, RoleName, UserId, validate_password, validate_username,
};

use crate::access_policy;
use crate::permissions;

/// User row projection returned by the repository.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct UserRecord {
    /// Stable user identifier.
    pub user_id: UserId,
    /// Unique username.
    pub username: String,
    /// Unique, validated email address.
    pub email: String,
    /// Assigned role.
    pub role: RoleName,
    /// Argon2id password hash.
    pub password_hash: String,
    /// Creation timestamp.
    pub created_at: DateTime<Utc>,
}

/// Validated insert payload handed to the repository.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NewUserRecord {
    /// Unique username.
    pub username: String,
    /// Validated email address.
    pub email: EmailAddress,
    /// Assigned role.
    pub role: RoleName,
    /// Argon2id password hash.
    pub password_hash: String,
}

/// Input payload for account creation.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CreateUserInput {
    /// Requested username.
    pub username: String,
    /// Requested email address.
    pub email: String,
    /// Plaintext password, hashed before it reaches the repository.
    pub password: String,
    /// Role to assign.
    pub role: RoleName,
}

/// Repository port for user account rows.
#[async_trait]
pub trait UserRepository: Send + Sync {
    /// Lists all user accounts.
    async fn list(&self) -> AppResult<Vec<UserRecord>>;

    /// Finds a user by id.
    async fn find_by_id(&self, user_id: UserId) -> AppResult<Option<UserRecord>>;

    /// Finds a user by username or email (case-insensitive on email).
    async fn find_by_username_or_email(&self, identifier: &str) -> AppResult<Option<UserRecord>>;

    /// Inserts a new user account.
    async fn insert(&self, record: NewUserRecord) -> AppResult<UserRecord>;

    /// Changes a user's role.
    async fn update_role(&self, user_id: UserId, role: RoleName) -> AppResult<UserRecord>;

    /// Deletes a user account.
    async fn delete(&self, user_id: UserId) -> AppResult<()>;
}

/// Password hashing port.
pub trait PasswordHasher: Send + Sync {
    /// Hashes a plaintext password for storage.
    fn hash_password(&self, password: &str) -> AppResult<String>;

    /// Verifies a plaintext password against a stored hash.
    fn verify_password(&self, password: &str, hash: &str) -> AppResult<bool>;
}

/// Application service for user account administration.
#[derive(Clone)]
pub struct UserAdminService {
    repository: Arc<dyn UserRepository>,
    password_hasher: Arc<dyn PasswordHasher>,
}

impl UserAdminService {
    /// Creates a new service from required dependencies.
    #[must_use]
    pub fn new(
        repository: Arc<dyn UserRepository>,
        password_hasher: Arc<dyn PasswordHasher>,
    ) -> Self {
        Self {
            repository,
            password_hasher,
        }
    }

    /// Lists user accounts.
    pub async fn list(&self, actor: &Principal) -> AppResult<Vec<UserRecord>> {
        access_policy::require_permission(actor, permissions::USERS_READ)?;

        self.repository.list().await
    }

    /// Returns a single user account.
    pub async fn get(&self, actor: &Principal, user_id: UserId) -> AppResult<UserRecord> {
        access_policy::require_permission(actor, permissions::USERS_READ)?;

        self.repository
            .find_by_id(user_id)
            .await?
            .ok_or_else(|| AppError::NotFound(format!("user '{user_id}' was not found")))
    }

    /// Creates a user account with a hashed password.
    pub async fn create(&self, actor: &Principal, input: CreateUserInput) -> AppResult<UserRecord> {
        access_policy::require_permission(actor, permissions::USERS_CREATE)?;

        validate_username(input.username.as_str())?;
        let email = EmailAddress::new(input.email)?;
        validate_password(input.password.as_str())?;
        let password_hash = self.password_hasher.hash_password(input.password.as_str())?;

        self.repository
            .insert(NewUserRecord {
                username: input.username,
                email,
                role: input.role,
                password_hash,
            })
            .await
    }

    /// Changes a user's role.
    pub async fn update_role(
        &self,
        actor: &Principal,
        user_id: UserId,
        role: RoleName,
    ) -> AppResult<UserRecord> {
        access_policy::require_permission(actor, permissions::USERS_UPDATE)?;

        self.repository.update_role(user_id, role).await
    }

    /// Deletes a user account. Self-deletion is rejected.
    pub async fn delete(&self, actor: &Principal, user_id: UserId) -> AppResult<()> {
        access_policy::require_permission(actor, permissions::USERS_DELETE)?;

        if actor.user_id() == user_id {
            return Err(AppError::Validation(
                "you cannot delete your own account".to_owned(),
            ));
        }

        self.repository.delete(user_id).await
    }
}
