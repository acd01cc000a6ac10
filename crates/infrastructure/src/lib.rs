//! Infrastructure adapters for application ports.

#![forbid(unsafe_code)]

mod argon2_password_hasher;
mod channel_catalog_notifier;
mod hs256_token_codec;
mod postgres_authorization_repository;
mod postgres_booking_repository;
mod postgres_content_repository;
mod postgres_grant_reconciliation_repository;
mod postgres_security_admin_repository;
mod postgres_user_repository;

pub use argon2_password_hasher::Argon2PasswordHasher;
pub use channel_catalog_notifier::ChannelCatalogNotifier;
pub use hs256_token_codec::Hs256TokenCodec;
pub use postgres_authorization_repository::PostgresAuthorizationRepository;
pub use postgres_booking_repository::PostgresBookingRepository;
pub use postgres_content_repository::PostgresContentRepository;
pub use postgres_grant_reconciliation_repository::PostgresGrantReconciliationRepository;
pub use postgres_security_admin_repository::PostgresSecurityAdminRepository;
pub use postgres_user_repository::PostgresUserRepository;
