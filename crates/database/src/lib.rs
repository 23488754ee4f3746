pub mod db_connect;
pub mod schema;
pub mod service;

use std::{sync::Mutex, time::Duration};
use surrealdb::{Surreal, engine::any::Any};

pub use service::{DbCredentials, DbService, is_unique_violation};

/// Namespace/database selection (and optional root credentials) applied to
/// every connection the pool opens.
#[derive(Clone, Debug)]
pub struct SessionSettings {
    pub namespace: String,
    pub database: String,
    pub credentials: Option<DbCredentials>,
}

pub struct ConnectionPool {
    pub connection_url: String,
    pub connections: Mutex<Vec<Surreal<Any>>>,
    pub max_size: usize,
    pub connect_timeout: Duration,
    session: Mutex<Option<SessionSettings>>,
    // Embedded stores live inside the client; every handle must share one.
    shared: Mutex<Option<Surreal<Any>>>,
}

pub struct Database {
    pub pool: ConnectionPool,
}

// A wrapper for a connection that returns it to the pool when dropped
pub struct PooledConnection<'a> {
    conn: Surreal<Any>,
    pool: &'a ConnectionPool,
}

impl<'a> PooledConnection<'a> {
    pub fn get_ref(&self) -> &Surreal<Any> {
        &self.conn
    }
}

impl<'a> Drop for PooledConnection<'a> {
    fn drop(&mut self) {
        self.pool.return_connection(self.conn.clone());
    }
}
