//! Application services and ports.

#![forbid(unsafe_code)]

mod access_policy;
mod booking_service;
mod content_service;
mod grant_reconciliation_service;
mod identity_service;
mod security_admin_service;
mod user_admin_service;

pub mod permissions;

pub use access_policy::{
    require_all, require_any, require_owner_or_privileged, require_permission, require_principal,
    require_resource_permission, require_role,
};
pub use booking_service::{
    BookingRecord, BookingRepository, BookingService, CreateBookingInput, UpdateBookingInput,
};
pub use content_service::{
    CommentRecord, ContentRepository, ContentService, CreatePostInput, PostRecord, UpdatePostInput,
};
pub use grant_reconciliation_service::{
    CatalogChangeNotifier, GrantReconciliationRepository, GrantReconciliationService,
    GrantSyncState, GrantSyncStatus,
};
pub use identity_service::{AuthorizationRepository, IdentityService, IssuedAccessToken, TokenCodec};
pub use security_admin_service::{
    CreatePermissionInput, RolePermissions, SecurityAdminRepository, SecurityAdminService,
};
pub use user_admin_service::{
    CreateUserInput, NewUserRecord, PasswordHasher, UserAdminService, UserRecord, UserRepository,
};
