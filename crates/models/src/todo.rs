use serde::{Deserialize, Serialize};
use surrealdb::sql::Thing;

use crate::{generate_id, record_key};

pub const TODOS_TABLE: &str = "todos";

#[derive(Debug, Serialize, Deserialize, Clone)]
pub struct Todo {
    #[serde(default = "Todo::generate_id")]
    pub id: Thing,
    pub title: String,
    /// Key of the owning user.
    pub user_id: String,
}

impl Todo {
    fn generate_id() -> Thing {
        generate_id(TODOS_TABLE)
    }

    pub fn new(title: String, user_id: String) -> Self {
        Self {
            id: Self::generate_id(),
            title,
            user_id,
        }
    }

    pub fn key(&self) -> String {
        record_key(&self.id)
    }

    pub fn is_owned_by(&self, user_id: &str) -> bool {
        self.user_id == user_id
    }
}

#[derive(Debug, Deserialize, Serialize, Clone)]
pub struct TodoInput {
    pub title: String,
}

#[derive(Debug, Deserialize, Serialize, Clone)]
pub struct TodoUpdateInput {
    pub id: String,
    pub title: String,
}

#[derive(Debug, Serialize, Deserialize, Clone, PartialEq)]
pub struct TodoResponse {
    pub id: String,
    pub title: String,
    pub user_id: String,
}

impl From<Todo> for TodoResponse {
    fn from(todo: Todo) -> Self {
        Self {
            id: todo.key(),
            title: todo.title,
            user_id: todo.user_id,
        }
    }
}
