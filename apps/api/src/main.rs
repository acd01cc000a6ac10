//! Fleetdesk API composition root.

#![forbid(unsafe_code)]

mod dto;
mod error;
mod handlers;
mod middleware;
mod state;

use std::env;
use std::net::{IpAddr, SocketAddr};
use std::str::FromStr;
use std::sync::Arc;

use axum::Router;
use axum::http::header::{AUTHORIZATION, CONTENT_TYPE};
use axum::http::{HeaderValue, Method};
use axum::middleware::from_fn_with_state;
use axum::routing::{delete, get, post, put};
use fleetdesk_application::{
    BookingService, ContentService, GrantReconciliationService, IdentityService,
    SecurityAdminService, UserAdminService,
};
use fleetdesk_core::AppError;
use fleetdesk_infrastructure::{
    Argon2PasswordHasher, ChannelCatalogNotifier, Hs256TokenCodec,
    PostgresAuthorizationRepository, PostgresBookingRepository, PostgresContentRepository,
    PostgresGrantReconciliationRepository, PostgresSecurityAdminRepository,
    PostgresUserRepository,
};
use sqlx::postgres::PgPoolOptions;
use tower_http::cors::CorsLayer;
use tower_http::trace::TraceLayer;
use tracing::{info, warn};
use tracing_subscriber::EnvFilter;

use crate::state::AppState;

#[tokio::main]
async fn main() -> Result<(), AppError> {
    dotenvy::dotenv().ok();
    init_tracing();

    let migrate_only = env::args().nth(1).as_deref() == Some("migrate");

    let database_url = required_env("DATABASE_URL")?;
    let token_secret = required_env("AUTH_TOKEN_SECRET")?;
    if token_secret.len() < 32 {
        return Err(AppError::Validation(
            "AUTH_TOKEN_SECRET must be at least 32 characters".to_owned(),
        ));
    }

    let frontend_url =
        env::var("FRONTEND_URL").unwrap_or_else(|_| "http://localhost:3000".to_owned());
    let api_host = env::var("API_HOST").unwrap_or_else(|_| "127.0.0.1".to_owned());
    let api_port = env::var("API_PORT")
        .ok()
        .and_then(|value| value.parse::<u16>().ok())
        .unwrap_or(3001);
    let token_ttl_minutes = env::var("TOKEN_TTL_MINUTES")
        .ok()
        .and_then(|value| value.parse::<i64>().ok())
        .unwrap_or(60);

    let pool = PgPoolOptions::new()
        .max_connections(10)
        .connect(&database_url)
        .await
        .map_err(|error| AppError::Internal(format!("failed to connect to database: {error}")))?;

    sqlx::migrate!("../../crates/infrastructure/migrations")
        .run(&pool)
        .await
        .map_err(|error| AppError::Internal(format!("failed to run migrations: {error}")))?;

    if migrate_only {
        info!("database migrations applied successfully");
        return Ok(());
    }

    let user_repository = Arc::new(PostgresUserRepository::new(pool.clone()));
    let authorization_repository = Arc::new(PostgresAuthorizationRepository::new(pool.clone()));
    let password_hasher = Arc::new(Argon2PasswordHasher::new());
    let token_codec = Arc::new(Hs256TokenCodec::new(token_secret.as_bytes()));

    let identity_service = IdentityService::new(
        user_repository.clone(),
        authorization_repository,
        password_hasher.clone(),
        token_codec,
        token_ttl_minutes,
    );
    let user_admin_service = UserAdminService::new(user_repository, password_hasher);
    let booking_service =
        BookingService::new(Arc::new(PostgresBookingRepository::new(pool.clone())));
    let content_service =
        ContentService::new(Arc::new(PostgresContentRepository::new(pool.clone())));

    let (catalog_notifier, mut catalog_events) = ChannelCatalogNotifier::channel();
    let security_admin_service = SecurityAdminService::new(
        Arc::new(PostgresSecurityAdminRepository::new(pool.clone())),
        Arc::new(catalog_notifier),
    );
    let grant_reconciliation_service = GrantReconciliationService::new(Arc::new(
        PostgresGrantReconciliationRepository::new(pool.clone()),
    ));

    // Bootstrap: converge superadmin grants before accepting traffic, then
    // keep them converged by reconciling on every catalog-change event.
    let granted = grant_reconciliation_service.force_grant_all().await?;
    if granted > 0 {
        info!(granted, "bootstrapped superadmin grants");
    }

    let reconciler = grant_reconciliation_service.clone();
    tokio::spawn(async move {
        while catalog_events.recv().await.is_some() {
            match reconciler.reconcile().await {
                Ok(inserted) if inserted > 0 => {
                    info!(inserted, "superadmin grants reconciled after catalog change");
                }
                Ok(_) => {}
                Err(error) => {
                    warn!(%error, "superadmin grant reconciliation failed");
                }
            }
        }
    });

    let app_state = AppState {
        identity_service,
        booking_service,
        content_service,
        user_admin_service,
        security_admin_service,
        grant_reconciliation_service,
        frontend_url: frontend_url.clone(),
    };

    let protected_routes = Router::new()
        .route("/auth/me", get(handlers::auth::me_handler))
        .route(
            "/api/bookings",
            get(handlers::bookings::list_bookings_handler)
                .post(handlers::bookings::create_booking_handler),
        )
        .route(
            "/api/bookings/{booking_id}",
            get(handlers::bookings::get_booking_handler)
                .put(handlers::bookings::update_booking_handler)
                .delete(handlers::bookings::delete_booking_handler),
        )
        .route(
            "/api/users",
            get(handlers::users::list_users_handler).post(handlers::users::create_user_handler),
        )
        .route(
            "/api/users/{user_id}",
            get(handlers::users::get_user_handler).delete(handlers::users::delete_user_handler),
        )
        .route(
            "/api/users/{user_id}/role",
            put(handlers::users::update_user_role_handler),
        )
        .route(
            "/api/security/roles",
            get(handlers::security::list_role_permissions_handler),
        )
        .route(
            "/api/security/permissions",
            get(handlers::security::list_permissions_handler)
                .post(handlers::security::create_permission_handler),
        )
        .route(
            "/api/security/role-grants",
            post(handlers::security::grant_role_permission_handler),
        )
        .route(
            "/api/security/role-revocations",
            post(handlers::security::revoke_role_permission_handler),
        )
        .route(
            "/api/security/superadmin-sync",
            get(handlers::security::superadmin_sync_status_handler),
        )
        .route(
            "/api/security/superadmin-sync/reconcile",
            post(handlers::security::superadmin_sync_reconcile_handler),
        )
        .route_layer(from_fn_with_state(
            app_state.clone(),
            middleware::require_auth,
        ));

    // Posts and comments serve anonymous readers; mutations in this group
    // check for a principal themselves and answer 401 without one.
    let content_routes = Router::new()
        .route(
            "/api/posts",
            get(handlers::posts::list_posts_handler).post(handlers::posts::create_post_handler),
        )
        .route(
            "/api/posts/{post_id}",
            get(handlers::posts::get_post_handler)
                .put(handlers::posts::update_post_handler)
                .delete(handlers::posts::delete_post_handler),
        )
        .route(
            "/api/posts/{post_id}/comments",
            get(handlers::posts::list_comments_handler)
                .post(handlers::posts::create_comment_handler),
        )
        .route(
            "/api/comments/{comment_id}",
            delete(handlers::posts::delete_comment_handler),
        )
        .route_layer(from_fn_with_state(
            app_state.clone(),
            middleware::optional_auth,
        ));

    let cors_layer = CorsLayer::new()
        .allow_origin(
            HeaderValue::from_str(&frontend_url)
                .map_err(|error| AppError::Internal(format!("invalid FRONTEND_URL: {error}")))?,
        )
        .allow_credentials(true)
        .allow_methods([
            Method::GET,
            Method::POST,
            Method::PUT,
            Method::PATCH,
            Method::DELETE,
            Method::OPTIONS,
        ])
        .allow_headers([AUTHORIZATION, CONTENT_TYPE]);

    let app = Router::new()
        .route("/health", get(handlers::health::health_handler))
        .route("/auth/login", post(handlers::auth::login_handler))
        .merge(content_routes)
        .merge(protected_routes)
        .layer(TraceLayer::new_for_http())
        .layer(cors_layer)
        .with_state(app_state);

    let host = IpAddr::from_str(&api_host)
        .map_err(|error| AppError::Internal(format!("invalid API_HOST '{api_host}': {error}")))?;
    let address = SocketAddr::from((host, api_port));

    let listener = tokio::net::TcpListener::bind(address)
        .await
        .map_err(|error| AppError::Internal(format!("failed to bind listener: {error}")))?;

    info!(%address, "fleetdesk-api listening");

    axum::serve(listener, app)
        .await
        .map_err(|error| AppError::Internal(format!("api server error: {error}")))
}

fn init_tracing() {
    let env_filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));

    tracing_subscriber::fmt()
        .with_env_filter(env_filter)
        .with_target(false)
        .compact()
        .init();
}

fn required_env(name: &str) -> Result<String, AppError> {
    env::var(name).map_err(|_| AppError::Validation(format!("{name} is required")))
}
