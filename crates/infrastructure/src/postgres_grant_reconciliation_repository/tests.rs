use sqlx::PgPool;
use sqlx::migrate::Migrator;
use sqlx::postgres::PgPoolOptions;

use fleetdesk_application::{GrantReconciliationRepository, GrantReconciliationService};
use fleetdesk_domain::RoleName;

use super::PostgresGrantReconciliationRepository;

static MIGRATOR: Migrator = sqlx::migrate!("./migrations");

async fn test_pool() -> Option<PgPool> {
    let Ok(database_url) = std::env::var("DATABASE_URL") else {
        return None;
    };

    let pool = match PgPoolOptions::new()
        .max_connections(4)
        .connect(database_url.as_str())
        .await
    {
        Ok(pool) => pool,
        Err(error) => panic!("failed to connect to DATABASE_URL in test: {error}"),
    };

    if let Err(error) = MIGRATOR.run(&pool).await {
        panic!("failed to run migrations for reconciliation tests: {error}");
    }

    Some(pool)
}

async fn insert_catalog_permission(pool: &PgPool, name: &str) {
    let inserted = sqlx::query(
        r#"
        INSERT INTO permissions (name, resource, action, description)
        VALUES ($1, $2, 'read', 'reconciliation test permission')
        ON CONFLICT (name) DO NOTHING
        "#,
    )
    .bind(name)
    .bind(name)
    .execute(pool)
    .await;

    assert!(inserted.is_ok());
}

async fn superadmin_holds(pool: &PgPool, permission_name: &str) -> bool {
    let count = sqlx::query_scalar::<_, i64>(
        r#"
        SELECT COUNT(*)
        FROM role_permissions
        INNER JOIN roles ON roles.id = role_permissions.role_id
        INNER JOIN permissions ON permissions.id = role_permissions.permission_id
        WHERE roles.name = $1 AND permissions.name = $2
        "#,
    )
    .bind(RoleName::Superadmin.as_str())
    .bind(permission_name)
    .fetch_one(pool)
    .await;

    matches!(count, Ok(1))
}

async fn remove_test_permission(pool: &PgPool, name: &str) {
    let removed = sqlx::query("DELETE FROM permissions WHERE name = $1")
        .bind(name)
        .execute(pool)
        .await;
    assert!(removed.is_ok());
}

#[tokio::test]
async fn reconcile_closes_drift_and_is_idempotent() {
    let Some(pool) = test_pool().await else {
        return;
    };

    let repository = PostgresGrantReconciliationRepository::new(pool.clone());
    let service = GrantReconciliationService::new(std::sync::Arc::new(repository.clone()));

    // Start from a converged state, then grow the catalog to open drift.
    let baseline = service.force_grant_all().await;
    assert!(baseline.is_ok());

    let permission_name = format!("testdrift{}", uuid::Uuid::new_v4().simple());
    insert_catalog_permission(&pool, permission_name.as_str()).await;
    assert!(!superadmin_holds(&pool, permission_name.as_str()).await);

    let status = repository.grant_status().await;
    assert!(matches!(status, Ok(snapshot) if snapshot.missing >= 1));

    let inserted = service.reconcile().await;
    assert!(matches!(inserted, Ok(count) if count >= 1));
    assert!(superadmin_holds(&pool, permission_name.as_str()).await);

    // Second pass with no catalog change: zero writes, state stays complete.
    let second = service.reconcile().await;
    assert!(matches!(second, Ok(0)));

    let repaired = repository.grant_status().await;
    assert!(matches!(repaired, Ok(snapshot) if snapshot.missing == 0));

    remove_test_permission(&pool, permission_name.as_str()).await;
}

#[tokio::test]
async fn concurrent_reconciles_produce_exactly_one_grant_row() {
    let Some(pool) = test_pool().await else {
        return;
    };

    let repository = PostgresGrantReconciliationRepository::new(pool.clone());
    let service = GrantReconciliationService::new(std::sync::Arc::new(repository));

    let baseline = service.force_grant_all().await;
    assert!(baseline.is_ok());

    let permission_name = format!("testrace{}", uuid::Uuid::new_v4().simple());
    insert_catalog_permission(&pool, permission_name.as_str()).await;

    let left = service.clone();
    let right = service.clone();
    let (first, second) = tokio::join!(
        tokio::spawn(async move { left.reconcile().await }),
        tokio::spawn(async move { right.reconcile().await }),
    );

    let first = first.unwrap_or_else(|_| panic!("reconcile task panicked"));
    let second = second.unwrap_or_else(|_| panic!("reconcile task panicked"));
    assert!(first.is_ok());
    assert!(second.is_ok());

    assert!(superadmin_holds(&pool, permission_name.as_str()).await);

    remove_test_permission(&pool, permission_name.as_str()).await;
}
