use std::sync::Arc;

use stocktrail_infra::{AppServices, InMemoryStore};

#[cfg(feature = "postgres")]
use stocktrail_infra::PostgresStore;

/// Choose the storage backend and build the service set.
///
/// In-memory by default (dev/test); Postgres when `USE_PERSISTENT_STORES=true`
/// and the `postgres` feature is compiled in.
pub async fn build_services() -> AppServices {
    let use_persistent = std::env::var("USE_PERSISTENT_STORES")
        .unwrap_or_else(|_| "false".to_string())
        .parse::<bool>()
        .unwrap_or(false);

    if use_persistent {
        #[cfg(feature = "postgres")]
        {
            return build_postgres_services().await;
        }
        #[cfg(not(feature = "postgres"))]
        {
            tracing::warn!(
                "USE_PERSISTENT_STORES=true but postgres feature not enabled, falling back to in-memory"
            );
        }
    }

    AppServices::new(Arc::new(InMemoryStore::new()))
}

#[cfg(feature = "postgres")]
async fn build_postgres_services() -> AppServices {
    let database_url = std::env::var("DATABASE_URL")
        .expect("DATABASE_URL must be set when USE_PERSISTENT_STORES=true");

    let pool = sqlx::PgPool::connect(&database_url)
        .await
        .expect("Failed to connect to Postgres");

    let store = PostgresStore::new(pool);
    store
        .ensure_schema()
        .await
        .expect("Failed to ensure database schema");

    AppServices::new(Arc::new(store))
}
