pub mod todo;
pub mod user;

pub use todo::{Todo, TodoInput, TodoResponse, TodoUpdateInput};
pub use user::{LoginForm, SignupInput, TokenResponse, User, UserProfile};

use surrealdb::sql::{Id, Thing};

/// The key part of a record id (`users:abc` -> `abc`), without escaping.
pub fn record_key(thing: &Thing) -> String {
    match &thing.id {
        Id::String(s) => s.clone(),
        other => other.to_string(),
    }
}

pub(crate) fn generate_id(table: &str) -> Thing {
    Thing::from((table.to_string(), uuid::Uuid::new_v4().simple().to_string()))
}
