use fleetdesk_application::{
    BookingService, ContentService, GrantReconciliationService, IdentityService,
    SecurityAdminService, UserAdminService,
};

/// Shared application state.
#[derive(Clone)]
pub struct AppState {
    pub identity_service: IdentityService,
    pub booking_service: BookingService,
    pub content_service: ContentService,
    pub user_admin_service: UserAdminService,
    pub security_admin_service: SecurityAdminService,
    pub grant_reconciliation_service: GrantReconciliationService,
    pub frontend_url: String,
}
