use crate::{ConnectionPool, Database, PooledConnection, SessionSettings};

use anyhow::Context;
use lazy_static::lazy_static;
use regex::Regex;
use serde::{Deserialize, Serialize};
use std::{
    marker::PhantomData,
    sync::{Arc, Mutex, PoisonError},
    time::Duration,
};
use surrealdb::{Surreal, engine::any::Any, opt::auth::Root};
use tokio::time::timeout;

use app_error::{AppError, AppErrorExt, AppResult};

const HEALTH_CHECK_TIMEOUT: Duration = Duration::from_secs(2);
const DEFAULT_CONNECT_TIMEOUT: Duration = Duration::from_secs(5);

lazy_static! {
    static ref IDENTIFIER_REGEX: Regex = Regex::new(r"^[a-zA-Z_][a-zA-Z0-9_]*$").unwrap();
}

fn lock_err<T>(e: PoisonError<T>) -> AppError {
    AppError::ServerError(anyhow::anyhow!(
        "Failed to lock connection pool mutex: {}",
        e
    ))
}

/// True when a write was rejected by a UNIQUE index.
pub fn is_unique_violation(error: &AppError) -> bool {
    match error {
        AppError::DatabaseError(e) => format!("{:#}", e).contains("already contains"),
        _ => false,
    }
}

impl ConnectionPool {
    pub fn new(connection_url: &str, max_size: usize) -> Self {
        Self {
            connection_url: connection_url.to_string(),
            connections: Mutex::new(Vec::with_capacity(max_size)),
            max_size,
            connect_timeout: DEFAULT_CONNECT_TIMEOUT,
            session: Mutex::new(None),
            shared: Mutex::new(None),
        }
    }

    pub fn is_embedded(&self) -> bool {
        self.connection_url.starts_with("mem")
    }

    pub fn set_session(&self, settings: SessionSettings) -> AppResult<()> {
        *self.session.lock().map_err(lock_err)? = Some(settings);
        Ok(())
    }

    /// Get a connection from the pool or open a new one.
    ///
    /// Pooled connections are health-checked before reuse; dead ones are
    /// dropped and replaced.
    pub async fn get_connection(&self) -> AppResult<PooledConnection<'_>> {
        let conn_opt = {
            let mut connections = self.connections.lock().map_err(lock_err)?;
            connections.pop()
        };

        if let Some(conn) = conn_opt {
            match timeout(HEALTH_CHECK_TIMEOUT, conn.health()).await {
                Ok(Ok(_)) => return Ok(PooledConnection { conn, pool: self }),
                _ => tracing::debug!("Discarding invalid connection from pool"),
            }
        }

        let conn = self.open_connection().await?;
        Ok(PooledConnection { conn, pool: self })
    }

    async fn open_connection(&self) -> AppResult<Surreal<Any>> {
        if self.is_embedded() {
            let shared = self.shared.lock().map_err(lock_err)?.clone();
            if let Some(conn) = shared {
                return Ok(conn);
            }
        }

        let conn_future = surrealdb::engine::any::connect(self.connection_url.as_str());
        let conn = match timeout(self.connect_timeout, conn_future).await {
            Ok(conn_result) => conn_result
                .context("Failed to connect to database")
                .db_err()?,
            Err(_) => {
                return Err(AppError::DatabaseError(anyhow::anyhow!(
                    "Database connection timeout - could not establish connection within {:?}",
                    self.connect_timeout
                )));
            }
        };

        let session = self.session.lock().map_err(lock_err)?.clone();
        if let Some(session) = session {
            apply_session(&conn, &session).await?;
        }

        if self.is_embedded() {
            *self.shared.lock().map_err(lock_err)? = Some(conn.clone());
        }

        Ok(conn)
    }

    pub fn return_connection(&self, conn: Surreal<Any>) {
        if let Ok(mut connections) = self.connections.lock() {
            if connections.len() < self.max_size {
                connections.push(conn);
            }
        }
        // If we can't lock the mutex or the pool is full, the connection is dropped
    }
}

async fn apply_session(conn: &Surreal<Any>, session: &SessionSettings) -> AppResult<()> {
    if let Some(credentials) = &session.credentials {
        conn.signin(Root {
            username: credentials.get_username(),
            password: credentials.get_password(),
        })
        .await
        .context("Failed to authenticate with database")
        .db_err()?;
    }

    conn.use_ns(session.namespace.as_str())
        .use_db(session.database.as_str())
        .await
        .context("Failed to select namespace and database")
        .db_err()
}

#[derive(Clone)]
pub struct DbCredentials {
    username: String,
    password: String,
}

impl DbCredentials {
    pub fn new(username: impl Into<String>, password: impl Into<String>) -> Self {
        Self {
            username: username.into(),
            password: password.into(),
        }
    }

    pub fn get_username(&self) -> &str {
        &self.username
    }

    pub fn get_password(&self) -> &str {
        &self.password
    }
}

// Don't accidentally log credentials
impl std::fmt::Debug for DbCredentials {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("DbCredentials")
            .field("username", &self.username)
            .field("password", &"[REDACTED]")
            .finish()
    }
}

impl Database {
    pub fn new(connection_url: &str, max_connections: usize) -> Self {
        if !connection_url.starts_with("ws://")
            && !connection_url.starts_with("wss://")
            && !connection_url.starts_with("mem")
        {
            tracing::warn!(
                "Potentially invalid database connection URL format: {}",
                connection_url
            );
        }

        Self {
            pool: ConnectionPool::new(connection_url, max_connections),
        }
    }

    pub fn with_connect_timeout(mut self, connect_timeout: Duration) -> Self {
        self.pool.connect_timeout = connect_timeout;
        self
    }

    pub async fn get_connection(&self) -> AppResult<PooledConnection<'_>> {
        self.pool.get_connection().await
    }

    pub async fn initialize(
        connection_url: &str,
        max_connections: usize,
        namespace: &str,
        database: &str,
        credentials: &DbCredentials,
        connect_timeout: Duration,
    ) -> AppResult<Self> {
        validate_session_names(namespace, database)?;

        let db = Self::new(connection_url, max_connections).with_connect_timeout(connect_timeout);
        db.pool.set_session(SessionSettings {
            namespace: namespace.to_string(),
            database: database.to_string(),
            credentials: Some(credentials.clone()),
        })?;

        // Open the first connection eagerly so bad credentials fail at startup
        db.get_connection().await?;

        Ok(db)
    }

    pub async fn initialize_memory_db(
        max_connections: usize,
        namespace: &str,
        database: &str,
    ) -> AppResult<Self> {
        validate_session_names(namespace, database)?;

        let db = Self::new("memory", max_connections);
        db.pool.set_session(SessionSettings {
            namespace: namespace.to_string(),
            database: database.to_string(),
            credentials: None,
        })?;

        db.get_connection().await?;

        Ok(db)
    }

    pub fn create<T>(&self, table: &str) -> CreateBuilder<'_, T> {
        CreateBuilder {
            pool: &self.pool,
            table: table.to_string(),
            _phantom: PhantomData,
        }
    }

    pub fn update<T>(&self, location: (&str, &str)) -> UpdateBuilder<'_, T> {
        UpdateBuilder {
            pool: &self.pool,
            table: location.0.to_string(),
            id: location.1.to_string(),
            _phantom: PhantomData,
        }
    }

    pub async fn delete<T>(&self, location: (&str, &str)) -> AppResult<Option<T>>
    where
        T: for<'de> Deserialize<'de>,
    {
        let conn = self.get_connection().await?;
        conn.get_ref()
            .delete((location.0, location.1))
            .await
            .context("Failed to delete record")
            .db_err()
    }

    pub async fn select<T>(&self, location: (&str, &str)) -> AppResult<Option<T>>
    where
        T: for<'de> Deserialize<'de>,
    {
        let conn = self.get_connection().await?;
        conn.get_ref()
            .select((location.0, location.1))
            .await
            .context("Failed to select record")
            .db_err()
    }

    pub fn query(&self, sql: impl Into<String>) -> QueryBuilder<'_> {
        QueryBuilder {
            pool: &self.pool,
            sql: sql.into(),
            bindings: Vec::new(),
        }
    }
}

fn validate_session_names(namespace: &str, database: &str) -> AppResult<()> {
    if namespace.trim().is_empty() {
        return Err(AppError::ValidationError(
            "Database namespace cannot be empty".into(),
        ));
    }

    if database.trim().is_empty() {
        return Err(AppError::ValidationError(
            "Database name cannot be empty".into(),
        ));
    }

    Ok(())
}

pub struct CreateBuilder<'a, T> {
    pool: &'a ConnectionPool,
    table: String,
    _phantom: PhantomData<T>,
}

impl<'a, T> CreateBuilder<'a, T>
where
    T: Serialize + Send + Sync + 'static,
{
    pub async fn content(self, data: T) -> AppResult<Option<T>>
    where
        T: for<'de> Deserialize<'de>,
    {
        let conn = self.pool.get_connection().await?;
        conn.get_ref()
            .create(self.table.as_str())
            .content(data)
            .await
            .context("Failed to create record")
            .db_err()
    }
}

pub struct UpdateBuilder<'a, T> {
    pool: &'a ConnectionPool,
    table: String,
    id: String,
    _phantom: PhantomData<T>,
}

impl<'a, T> UpdateBuilder<'a, T>
where
    T: Serialize + Send + Sync + 'static,
{
    pub async fn content(self, data: T) -> AppResult<Option<T>>
    where
        T: for<'de> Deserialize<'de>,
    {
        let conn = self.pool.get_connection().await?;
        conn.get_ref()
            .update((self.table.as_str(), self.id.as_str()))
            .content(data)
            .await
            .context("Failed to update record")
            .db_err()
    }
}

pub struct QueryBuilder<'a> {
    pool: &'a ConnectionPool,
    sql: String,
    bindings: Vec<(String, serde_json::Value)>,
}

impl<'a> QueryBuilder<'a> {
    pub fn bind(mut self, binding: (impl Into<String>, impl Into<serde_json::Value>)) -> Self {
        self.bindings.push((binding.0.into(), binding.1.into()));
        self
    }

    pub async fn execute(self) -> AppResult<QueryResponse> {
        let conn = self.pool.get_connection().await?;
        let mut query = conn.get_ref().query(self.sql.as_str());

        for (name, value) in self.bindings {
            query = query.bind((name, value));
        }

        let response = query.await.context("Failed to execute query").db_err()?;
        Ok(QueryResponse(response))
    }
}

pub struct QueryResponse(surrealdb::Response);

impl QueryResponse {
    /// Fail if any statement in the batch returned an error.
    pub fn check(self) -> AppResult<Self> {
        let response = self
            .0
            .check()
            .context("Query statement failed")
            .db_err()?;
        Ok(Self(response))
    }

    pub fn take<T>(mut self, index: usize) -> AppResult<Vec<T>>
    where
        T: for<'de> Deserialize<'de>,
    {
        self.0
            .take(index)
            .context("Failed to extract query results")
            .db_err()
    }
}

/// Typed access to one table.
pub struct DbService<T> {
    db: Arc<Database>,
    table_name: String,
    _phantom: PhantomData<T>,
}

impl<T> DbService<T>
where
    T: Clone + Serialize + for<'de> Deserialize<'de> + Send + Sync + 'static,
{
    pub fn new(db: Arc<Database>, table_name: impl Into<String>) -> Self {
        Self {
            db,
            table_name: table_name.into(),
            _phantom: PhantomData,
        }
    }

    pub fn table_name(&self) -> &str {
        &self.table_name
    }

    pub fn database(&self) -> &Arc<Database> {
        &self.db
    }

    // Generic DB operation wrapper with consistent error handling
    async fn execute_db_operation<F, R>(&self, operation: &str, execute: F) -> AppResult<R>
    where
        F: Future<Output = AppResult<R>>,
    {
        execute.await.map_err(|e| {
            if let AppError::DatabaseError(err) = e {
                AppError::DatabaseError(err.context(format!(
                    "Failed to {} {} record",
                    operation, self.table_name
                )))
            } else {
                e
            }
        })
    }

    pub async fn create_record(&self, item: T) -> AppResult<Option<T>> {
        self.execute_db_operation("create", async {
            self.db.create(&self.table_name).content(item).await
        })
        .await
    }

    pub async fn update_record(&self, record_id: &str, updated_data: T) -> AppResult<Option<T>> {
        self.execute_db_operation("update", async {
            self.db
                .update((self.table_name.as_str(), record_id))
                .content(updated_data)
                .await
        })
        .await
    }

    pub async fn delete_record(&self, record_id: &str) -> AppResult<Option<T>> {
        self.execute_db_operation("delete", async {
            self.db.delete((self.table_name.as_str(), record_id)).await
        })
        .await
    }

    pub async fn get_record_by_id(&self, record_id: &str) -> AppResult<Option<T>> {
        self.execute_db_operation("fetch", async {
            self.db.select((self.table_name.as_str(), record_id)).await
        })
        .await
    }

    fn validate_identifier(&self, identifier: &str) -> AppResult<()> {
        if !IDENTIFIER_REGEX.is_match(identifier) {
            return Err(AppError::ValidationError(format!(
                "Invalid identifier '{}': must start with a letter or underscore and contain only alphanumeric characters and underscores",
                identifier
            )));
        }

        Ok(())
    }

    pub async fn get_all_records(&self) -> AppResult<Vec<T>> {
        self.validate_identifier(&self.table_name)?;
        let sql = format!("SELECT * FROM {}", self.table_name);

        self.execute_db_operation("list", async {
            self.db.query(&sql).execute().await?.take(0)
        })
        .await
    }

    pub async fn get_records_by_field<V>(&self, field: &str, value: V) -> AppResult<Vec<T>>
    where
        V: Serialize + Send + Sync + 'static,
    {
        self.validate_identifier(field)?;
        self.validate_identifier(&self.table_name)?;

        let sql = format!("SELECT * FROM {} WHERE {} = $value", self.table_name, field);

        let value_json = serde_json::to_value(value).map_err(|e| {
            AppError::ValidationError(format!(
                "Failed to serialize value for field '{}': {}",
                field, e
            ))
        })?;

        self.execute_db_operation("query", async {
            self.db
                .query(&sql)
                .bind(("value", value_json))
                .execute()
                .await?
                .take(0)
        })
        .await
    }
}
