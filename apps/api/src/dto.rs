//! Request/response DTOs and their JSON mapping.

mod auth;
mod bookings;
mod common;
mod posts;
mod security;
mod users;

pub use auth::{LoginRequest, PrincipalResponse, TokenResponse};
pub use bookings::{BookingResponse, CreateBookingRequest, UpdateBookingRequest};
pub use common::{HealthResponse, PermissionResponse};
pub use posts::{
    CommentResponse, CreateCommentRequest, CreatePostRequest, PostResponse, UpdatePostRequest,
};
pub use security::{
    CreatePermissionRequest, GrantSyncStatusResponse, ReconcileResponse, RoleGrantRequest,
    RolePermissionsResponse,
};
pub use users::{CreateUserRequest, UpdateUserRoleRequest, UserResponse};
