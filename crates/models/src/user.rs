use serde::{Deserialize, Serialize};
use surrealdb::sql::Thing;

use crate::{generate_id, record_key};

pub const USERS_TABLE: &str = "users";

#[derive(Debug, Serialize, Deserialize, Clone)]
pub struct User {
    #[serde(default = "User::generate_id")]
    pub id: Thing,
    pub email: String,
    pub f_name: String,
    pub l_name: String,
    pub hashed_password: String,
}

impl User {
    fn generate_id() -> Thing {
        generate_id(USERS_TABLE)
    }

    pub fn new(email: String, f_name: String, l_name: String, hashed_password: String) -> Self {
        Self {
            id: Self::generate_id(),
            email,
            f_name,
            l_name,
            hashed_password,
        }
    }

    /// Id as exposed over the API and stored in `todos.user_id`.
    pub fn key(&self) -> String {
        record_key(&self.id)
    }
}

/// Public view of a user; never carries the password hash.
#[derive(Debug, Serialize, Deserialize, Clone, PartialEq)]
pub struct UserProfile {
    pub id: String,
    pub email: String,
    pub f_name: String,
    pub l_name: String,
}

impl From<&User> for UserProfile {
    fn from(user: &User) -> Self {
        Self {
            id: user.key(),
            email: user.email.clone(),
            f_name: user.f_name.clone(),
            l_name: user.l_name.clone(),
        }
    }
}

impl From<User> for UserProfile {
    fn from(user: User) -> Self {
        Self::from(&user)
    }
}

#[derive(Debug, Deserialize, Serialize, Clone)]
pub struct SignupInput {
    pub email: String,
    pub f_name: String,
    pub l_name: String,
    pub password: String,
}

/// OAuth2 password-grant form: `username` carries the email.
#[derive(Debug, Deserialize, Serialize, Clone)]
pub struct LoginForm {
    pub username: String,
    pub password: String,
}

#[derive(Debug, Serialize, Deserialize, Clone)]
pub struct TokenResponse {
    pub access_token: String,
    pub token_type: String,
}

impl TokenResponse {
    pub fn bearer(access_token: String) -> Self {
        Self {
            access_token,
            token_type: "bearer".to_string(),
        }
    }
}
