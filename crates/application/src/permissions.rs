//! Well-known permission names used by application policy checks.
//!
//! The permission catalog itself is dynamic; these constants cover the
//! baseline rows the migrations seed.

/// Read bookings.
pub const BOOKINGS_READ: &str = "bookings.read";
/// Create bookings.
pub const BOOKINGS_CREATE: &str = "bookings.create";
/// Update bookings.
pub const BOOKINGS_UPDATE: &str = "bookings.update";
/// Delete bookings.
pub const BOOKINGS_DELETE: &str = "bookings.delete";

/// Create posts.
pub const POSTS_CREATE: &str = "posts.create";
/// Update posts.
pub const POSTS_UPDATE: &str = "posts.update";
/// Delete posts.
pub const POSTS_DELETE: &str = "posts.delete";

/// Create comments.
pub const COMMENTS_CREATE: &str = "comments.create";
/// Delete comments.
pub const COMMENTS_DELETE: &str = "comments.delete";

/// List and read user accounts.
pub const USERS_READ: &str = "users.read";
/// Create user accounts.
pub const USERS_CREATE: &str = "users.create";
/// Update user accounts.
pub const USERS_UPDATE: &str = "users.update";
/// Delete user accounts.
pub const USERS_DELETE: &str = "users.delete";

/// Read roles, grants, and reconciliation status.
pub const SECURITY_ROLE_READ: &str = "security.role.read";
/// Manage the permission catalog and role grants.
pub const SECURITY_ROLE_MANAGE: &str = "security.role.manage";
