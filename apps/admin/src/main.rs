//! Fleetdesk operator tooling.
//!
//! Read-only or idempotent commands layered on the same repositories the
//! API uses, so an operator can inspect and repair RBAC state (and bulk-load
//! bookings) without going through HTTP.

#![forbid(unsafe_code)]

mod import;

use std::env;
use std::str::FromStr;
use std::sync::Arc;

use fleetdesk_application::{
    AuthorizationRepository, GrantReconciliationService, NewUserRecord, PasswordHasher,
    UserRepository,
};
use fleetdesk_core::{AppError, AppResult};
use fleetdesk_domain::{EmailAddress, RoleName, validate_password, validate_username};
use fleetdesk_infrastructure::{
    Argon2PasswordHasher, PostgresAuthorizationRepository, PostgresBookingRepository,
    PostgresGrantReconciliationRepository, PostgresUserRepository,
};
use sqlx::PgPool;
use sqlx::postgres::PgPoolOptions;
use tracing_subscriber::EnvFilter;

const USAGE: &str = "usage: fleetdesk-admin <command>

commands:
    status                                   report superadmin grant drift
    reconcile                                grant missing permissions to superadmin
    grant-all                                unconditionally ensure the full catalog is granted
    role-permissions <role>                  list the permissions granted to a role
    import-bookings <csv-path>               bulk-import bookings from a CSV file
    create-superadmin <username> <email>     create a superadmin account
                                             (password read from SUPERADMIN_PASSWORD)";

#[tokio::main]
async fn main() -> Result<(), AppError> {
    dotenvy::dotenv().ok();
    init_tracing();

    let arguments: Vec<String> = env::args().skip(1).collect();
    let Some(command) = arguments.first().map(String::as_str) else {
        println!("{USAGE}");
        return Ok(());
    };

    let pool = connect_pool().await?;

    match command {
        "status" => status(&pool).await,
        "reconcile" => reconcile(&pool).await,
        "grant-all" => grant_all(&pool).await,
        "role-permissions" => {
            let role = arguments
                .get(1)
                .ok_or_else(|| AppError::Validation("role-permissions requires a role".to_owned()))?;
            role_permissions(&pool, role).await
        }
        "import-bookings" => {
            let path = arguments.get(1).ok_or_else(|| {
                AppError::Validation("import-bookings requires a CSV path".to_owned())
            })?;
            import::import_bookings(&pool, path).await
        }
        "create-superadmin" => {
            let (Some(username), Some(email)) = (arguments.get(1), arguments.get(2)) else {
                return Err(AppError::Validation(
                    "create-superadmin requires a username and an email".to_owned(),
                ));
            };
            create_superadmin(&pool, username, email).await
        }
        _ => {
            println!("{USAGE}");
            Err(AppError::Validation(format!("unknown command '{command}'")))
        }
    }
}

async fn connect_pool() -> AppResult<PgPool> {
    let database_url = env::var("DATABASE_URL")
        .map_err(|_| AppError::Validation("DATABASE_URL is required".to_owned()))?;

    PgPoolOptions::new()
        .max_connections(4)
        .connect(&database_url)
        .await
        .map_err(|error| AppError::Internal(format!("failed to connect to database: {error}")))
}

async fn status(pool: &PgPool) -> AppResult<()> {
    let service = reconciliation_service(pool);
    let status = service.status().await?;

    println!(
        "permissions: {} total, {} granted to superadmin, {} missing ({})",
        status.total_permissions,
        status.granted,
        status.missing,
        status.state.as_str()
    );
    Ok(())
}

async fn reconcile(pool: &PgPool) -> AppResult<()> {
    let service = reconciliation_service(pool);
    let inserted = service.reconcile().await?;
    let status = service.status().await?;

    println!(
        "inserted {} grant(s); superadmin now holds {}/{} permissions ({})",
        inserted,
        status.granted,
        status.total_permissions,
        status.state.as_str()
    );
    Ok(())
}

async fn grant_all(pool: &PgPool) -> AppResult<()> {
    let service = reconciliation_service(pool);
    let inserted = service.force_grant_all().await?;
    let status = service.status().await?;

    println!(
        "ensured full catalog; {} grant(s) inserted, state {}",
        inserted,
        status.state.as_str()
    );
    Ok(())
}

async fn role_permissions(pool: &PgPool, role: &str) -> AppResult<()> {
    let role = RoleName::from_str(role)?;
    let repository = PostgresAuthorizationRepository::new(pool.clone());
    let grants = repository.list_permissions_for_role(role).await?;

    if grants.is_empty() {
        println!("role '{role}' has no grants");
        return Ok(());
    }

    println!("role '{role}' holds {} permission(s):", grants.len());
    for grant in grants {
        println!(
            "  {} ({} / {}){}",
            grant.name,
            grant.resource,
            grant.action,
            grant
                .description
                .map(|text| format!(" - {text}"))
                .unwrap_or_default()
        );
    }
    Ok(())
}

async fn create_superadmin(pool: &PgPool, username: &str, email: &str) -> AppResult<()> {
    let password = env::var("SUPERADMIN_PASSWORD").map_err(|_| {
        AppError::Validation("SUPERADMIN_PASSWORD must be set in the environment".to_owned())
    })?;

    validate_username(username)?;
    let email = EmailAddress::new(email)?;
    validate_password(password.as_str())?;

    let hasher = Argon2PasswordHasher::new();
    let password_hash = hasher.hash_password(password.as_str())?;

    let repository = PostgresUserRepository::new(pool.clone());
    let user = repository
        .insert(NewUserRecord {
            username: username.to_owned(),
            email,
            role: RoleName::Superadmin,
            password_hash,
        })
        .await?;

    println!("created superadmin '{}' ({})", user.username, user.user_id);
    Ok(())
}

fn reconciliation_service(pool: &PgPool) -> GrantReconciliationService {
    GrantReconciliationService::new(Arc::new(PostgresGrantReconciliationRepository::new(
        pool.clone(),
    )))
}

fn init_tracing() {
    let env_filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn"));

    tracing_subscriber::fmt()
        .with_env_filter(env_filter)
        .with_target(false)
        .compact()
        .init();
}

// Booking repository construction lives here so `import` stays focused on
// CSV handling.
pub(crate) fn booking_repository(pool: &PgPool) -> PostgresBookingRepository {
    PostgresBookingRepository::new(pool.clone())
}
