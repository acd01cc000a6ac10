use std::sync::Arc;

use async_trait::async_trait;
use chrono::{DateTime, Duration, Utc};

use fleetdesk_core::{AppError, AppResult};
use fleetdesk_domain::{
    AccessTokenClaims, PermissionGrant, PermissionSet, Principal, RoleName, TokenError,
};

use crate::user_admin_service::{PasswordHasher, UserRepository};

/// Token issue/verify port.
///
/// Verification is a pure function of token, signing secret, and current
/// time; it performs no I/O and holds no per-request state.
pub trait TokenCodec: Send + Sync {
    /// Signs the claims into a compact token string.
    fn issue(&self, claims: &AccessTokenClaims) -> AppResult<String>;

    /// Verifies a token and returns its claims.
    ///
    /// The error keeps missing/invalid/expired distinguishable; callers map
    /// all three to 401 with variant-specific messages.
    fn verify(&self, token: &str) -> Result<AccessTokenClaims, TokenError>;
}

/// Repository port for permission lookups.
#[async_trait]
pub trait AuthorizationRepository: Send + Sync {
    /// Returns the distinct permissions granted to a role.
    ///
    /// A role with no grants yields an empty set, not an error. Every call
    /// reads current store state; nothing is cached between requests.
    async fn list_permissions_for_role(&self, role: RoleName) -> AppResult<Vec<PermissionGrant>>;
}

/// A signed access token with its expiry.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct IssuedAccessToken {
    /// Compact signed token.
    pub token: String,
    /// Expiry timestamp.
    pub expires_at: DateTime<Utc>,
}

/// Application service for login and per-request authentication.
#[derive(Clone)]
pub struct IdentityService {
    user_repository: Arc<dyn UserRepository>,
    authorization_repository: Arc<dyn AuthorizationRepository>,
    password_hasher: Arc<dyn PasswordHasher>,
    token_codec: Arc<dyn TokenCodec>,
    token_ttl_minutes: i64,
}

impl IdentityService {
    /// Creates a new service from required dependencies.
    #[must_use]
    pub fn new(
        user_repository: Arc<dyn UserRepository>,
        authorization_repository: Arc<dyn AuthorizationRepository>,
        password_hasher: Arc<dyn PasswordHasher>,
        token_codec: Arc<dyn TokenCodec>,
        token_ttl_minutes: i64,
    ) -> Self {
        Self {
            user_repository,
            authorization_repository,
            password_hasher,
            token_codec,
            token_ttl_minutes,
        }
    }

    /// Verifies credentials and issues an access token.
    ///
    /// Unknown identifier and wrong password produce the same error message,
    /// so the response does not reveal which accounts exist.
    pub async fn login(
        &self,
        username_or_email: &str,
        password: &str,
    ) -> AppResult<IssuedAccessToken> {
        let user = self
            .user_repository
            .find_by_username_or_email(username_or_email)
            .await?
            .ok_or_else(invalid_credentials)?;

        if !self
            .password_hasher
            .verify_password(password, user.password_hash.as_str())?
        {
            return Err(invalid_credentials());
        }

        let issued_at = Utc::now();
        let expires_at = issued_at + Duration::minutes(self.token_ttl_minutes);
        let claims = AccessTokenClaims {
            sub: user.user_id,
            username: user.username,
            role: user.role,
            iat: issued_at.timestamp(),
            exp: expires_at.timestamp(),
        };

        Ok(IssuedAccessToken {
            token: self.token_codec.issue(&claims)?,
            expires_at,
        })
    }

    /// Authenticates a bearer token into a request-scoped principal.
    ///
    /// Shared by the mandatory and optional middleware modes; only failure
    /// handling differs at the transport layer. The role and permission set
    /// come from current store state, not from the token snapshot, so a
    /// token never outlives a role change or its subject: a missing subject
    /// row is an authentication failure, not a 404.
    pub async fn authenticate(&self, bearer: Option<&str>) -> AppResult<Principal> {
        let token = bearer.ok_or(TokenError::Missing)?;
        let claims = self.token_codec.verify(token)?;

        let user = self
            .user_repository
            .find_by_id(claims.sub)
            .await?
            .ok_or_else(|| {
                AppError::Unauthorized("token subject no longer exists".to_owned())
            })?;

        let grants = self
            .authorization_repository
            .list_permissions_for_role(user.role)
            .await?;

        Ok(Principal::new(
            user.user_id,
            user.username,
            user.email,
            user.role,
            PermissionSet::new(grants),
        ))
    }
}

fn invalid_credentials() -> AppError {
    AppError::Unauthorized("invalid username or password".to_owned())
}

#[cfg(test)]
mod tests {
    use std::collections::HashMap;
    use std::sync::Arc;

    use async_trait::async_trait;
    use chrono::Utc;
    use tokio::sync::Mutex;

    use fleetdesk_core::{AppError, AppResult};
    use fleetdesk_domain::{
        AccessTokenClaims, PermissionGrant, RoleName, TokenError, UserId,
    };

    use crate::user_admin_service::{NewUserRecord, PasswordHasher, UserRecord, UserRepository};

    use super::{AuthorizationRepository, IdentityService, TokenCodec};

    struct FakeUserRepository {
        users: Mutex<Vec<UserRecord>>,
    }

    #[async_trait]
    impl UserRepository for FakeUserRepository {
        async fn list(&self) -> AppResult<Vec<UserRecord>> {
            Ok(self.users.lock().await.clone())
        }

        async fn find_by_id(&self, user_id: UserId) -> AppResult<Option<UserRecord>> {
            Ok(self
                .users
                .lock()
                .await
                .iter()
                .find(|user| user.user_id == user_id)
                .cloned())
        }

        async fn find_by_username_or_email(
            &self,
            identifier: &str,
        ) -> AppResult<Option<UserRecord>> {
            Ok(self
                .users
                .lock()
                .await
                .iter()
                .find(|user| user.username == identifier || user.email == identifier)
                .cloned())
        }

        async fn insert(&self, _record: NewUserRecord) -> AppResult<UserRecord> {
            Err(AppError::Internal("not used in this test".to_owned()))
        }

        async fn update_role(&self, _user_id: UserId, _role: RoleName) -> AppResult<UserRecord> {
            Err(AppError::Internal("not used in this test".to_owned()))
        }

        async fn delete(&self, _user_id: UserId) -> AppResult<()> {
            Err(AppError::Internal("not used in this test".to_owned()))
        }
    }

    struct FakeAuthorizationRepository {
        grants: HashMap<RoleName, Vec<PermissionGrant>>,
    }

    #[async_trait]
    impl AuthorizationRepository for FakeAuthorizationRepository {
        async fn list_permissions_for_role(
            &self,
            role: RoleName,
        ) -> AppResult<Vec<PermissionGrant>> {
            Ok(self.grants.get(&role).cloned().unwrap_or_default())
        }
    }

    struct FakePasswordHasher;

    impl PasswordHasher for FakePasswordHasher {
        fn hash_password(&self, password: &str) -> AppResult<String> {
            Ok(format!("hashed:{password}"))
        }

        fn verify_password(&self, password: &str, hash: &str) -> AppResult<bool> {
            Ok(hash == format!("hashed:{password}"))
        }
    }

    /// Codec fake: tokens are looked up in a map, anything else is invalid.
    struct FakeTokenCodec {
        tokens: HashMap<String, Result<AccessTokenClaims, TokenError>>,
    }

    impl TokenCodec for FakeTokenCodec {
        fn issue(&self, claims: &AccessTokenClaims) -> AppResult<String> {
            Ok(format!("token-for-{}", claims.sub))
        }

        fn verify(&self, token: &str) -> Result<AccessTokenClaims, TokenError> {
            self.tokens
                .get(token)
                .cloned()
                .unwrap_or(Err(TokenError::Invalid))
        }
    }

    fn user(username: &str, role: RoleName) -> UserRecord {
        UserRecord {
            user_id: UserId::new(),
            username: username.to_owned(),
            email: format!("{username}@example.com"),
            role,
            password_hash: "hashed:correct-horse-battery".to_owned(),
            created_at: Utc::now(),
        }
    }

    fn claims_for(user: &UserRecord) -> AccessTokenClaims {
        AccessTokenClaims {
            sub: user.user_id,
            username: user.username.clone(),
            role: user.role,
            iat: Utc::now().timestamp(),
            exp: Utc::now().timestamp() + 3600,
        }
    }

    fn service(
        users: Vec<UserRecord>,
        tokens: HashMap<String, Result<AccessTokenClaims, TokenError>>,
        grants: HashMap<RoleName, Vec<PermissionGrant>>,
    ) -> IdentityService {
        IdentityService::new(
            Arc::new(FakeUserRepository {
                users: Mutex::new(users),
            }),
            Arc::new(FakeAuthorizationRepository { grants }),
            Arc::new(FakePasswordHasher),
            Arc::new(FakeTokenCodec { tokens }),
            60,
        )
    }

    #[tokio::test]
    async fn login_with_correct_password_issues_a_token() {
        let account = user("casey", RoleName::Manager);
        let service = service(vec![account], HashMap::new(), HashMap::new());

        let result = service.login("casey", "correct-horse-battery").await;

        assert!(matches!(result, Ok(issued) if !issued.token.is_empty()));
    }

    #[tokio::test]
    async fn login_failures_share_one_message() {
        let account = user("casey", RoleName::Manager);
        let service = service(vec![account], HashMap::new(), HashMap::new());

        let wrong_password = service.login("casey", "wrong").await;
        let unknown_user = service.login("nobody", "correct-horse-battery").await;

        let Err(AppError::Unauthorized(first)) = wrong_password else {
            panic!("expected unauthorized");
        };
        let Err(AppError::Unauthorized(second)) = unknown_user else {
            panic!("expected unauthorized");
        };
        assert_eq!(first, second);
    }

    #[tokio::test]
    async fn authenticate_without_token_is_a_missing_token_failure() {
        let service = service(Vec::new(), HashMap::new(), HashMap::new());

        let result = service.authenticate(None).await;

        assert!(matches!(
            result,
            Err(AppError::Unauthorized(message)) if message == TokenError::Missing.to_string()
        ));
    }

    #[tokio::test]
    async fn authenticate_reports_expired_distinct_from_invalid() {
        let service = service(
            Vec::new(),
            HashMap::from([
                ("stale".to_owned(), Err(TokenError::Expired)),
                ("garbled".to_owned(), Err(TokenError::Invalid)),
            ]),
            HashMap::new(),
        );

        let expired = service.authenticate(Some("stale")).await;
        let invalid = service.authenticate(Some("garbled")).await;

        let Err(AppError::Unauthorized(expired_message)) = expired else {
            panic!("expected unauthorized");
        };
        let Err(AppError::Unauthorized(invalid_message)) = invalid else {
            panic!("expected unauthorized");
        };
        assert_ne!(expired_message, invalid_message);
    }

    #[tokio::test]
    async fn authenticate_rejects_tokens_for_deleted_subjects() {
        let ghost = user("ghost", RoleName::User);
        let claims = claims_for(&ghost);
        let service = service(
            Vec::new(),
            HashMap::from([("orphaned".to_owned(), Ok(claims))]),
            HashMap::new(),
        );

        let result = service.authenticate(Some("orphaned")).await;

        assert!(matches!(
            result,
            Err(AppError::Unauthorized(message)) if message.contains("no longer exists")
        ));
    }

    #[tokio::test]
    async fn authenticate_builds_principal_from_current_role_grants() {
        let account = user("casey", RoleName::Manager);
        let claims = claims_for(&account);
        let service = service(
            vec![account.clone()],
            HashMap::from([("good".to_owned(), Ok(claims))]),
            HashMap::from([(
                RoleName::Manager,
                vec![PermissionGrant {
                    name: "bookings.read".to_owned(),
                    resource: "bookings".to_owned(),
                    action: "read".to_owned(),
                    description: None,
                }],
            )]),
        );

        let result = service.authenticate(Some("good")).await;

        let Ok(principal) = result else {
            panic!("expected a principal");
        };
        assert_eq!(principal.user_id(), account.user_id);
        assert!(principal.has_permission("bookings.read"));
        assert!(!principal.has_permission("bookings.create"));
    }

    #[tokio::test]
    async fn authenticate_with_role_without_grants_yields_empty_set() {
        let account = user("casey", RoleName::User);
        let claims = claims_for(&account);
        let service = service(
            vec![account],
            HashMap::from([("good".to_owned(), Ok(claims))]),
            HashMap::new(),
        );

        let result = service.authenticate(Some("good")).await;

        assert!(matches!(result, Ok(principal) if principal.permissions().is_empty()));
    }
}
