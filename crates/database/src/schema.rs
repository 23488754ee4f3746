use app_error::AppResult;
use app_models::{todo::TODOS_TABLE, user::USERS_TABLE};
use tracing::info;

use crate::Database;

// `email` is UNIQUE so that two concurrent signups cannot both insert.
fn schema() -> String {
    format!(
        r#"
DEFINE TABLE IF NOT EXISTS {users} SCHEMALESS;
DEFINE INDEX IF NOT EXISTS {users}_email ON TABLE {users} FIELDS email UNIQUE;
DEFINE TABLE IF NOT EXISTS {todos} SCHEMALESS;
DEFINE INDEX IF NOT EXISTS {todos}_user_id ON TABLE {todos} FIELDS user_id;
"#,
        users = USERS_TABLE,
        todos = TODOS_TABLE,
    )
}

/// Create tables and indexes. Safe to run on every startup.
pub async fn define_schema(db: &Database) -> AppResult<()> {
    db.query(schema()).execute().await?.check()?;
    info!("Database schema ensured for tables: {}, {}", USERS_TABLE, TODOS_TABLE);
    Ok(())
}
