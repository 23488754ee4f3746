use app_config::SurrealDbConfig;
use app_error::AppError;
use std::{sync::Arc, time::Duration};

use crate::{Database, service::DbCredentials};

/// Connect to the configured SurrealDB endpoint (`memory` selects the
/// embedded engine) and select namespace and database.
pub async fn initialize_db(db_config: &SurrealDbConfig) -> Result<Arc<Database>, AppError> {
    tracing::debug!("Connecting to SurrealDB: {}", db_config.endpoint);

    if db_config.endpoint.starts_with("mem") {
        return initialize_memory_db(db_config).await;
    }

    if db_config.endpoint.starts_with("wss://") {
        tracing::info!("Using secure TLS connection to database");
    } else {
        tracing::warn!("Using non-secure database connection");
    }

    let max_connections = db_config.pool.size;
    tracing::info!(
        "Initializing database connection pool with {} connections",
        max_connections
    );

    let credentials = DbCredentials::new(db_config.username.clone(), db_config.password.clone());

    let db = Database::initialize(
        &db_config.endpoint,
        max_connections,
        &db_config.namespace,
        &db_config.database,
        &credentials,
        Duration::from_millis(db_config.pool.connection_timeout),
    )
    .await?;

    tracing::info!("Successfully connected to SurrealDB with connection pool");

    Ok(Arc::new(db))
}

pub async fn initialize_memory_db(db_config: &SurrealDbConfig) -> Result<Arc<Database>, AppError> {
    let db = Database::initialize_memory_db(
        db_config.pool.size,
        &db_config.namespace,
        &db_config.database,
    )
    .await?;

    tracing::info!("Successfully connected to in-memory SurrealDB");

    Ok(Arc::new(db))
}
