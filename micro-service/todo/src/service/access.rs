use app_database::{DbService, Database, is_unique_violation};
use app_error::{AppError, AppResult, not_found_error, resource_exists_error};
use app_middleware::validation;
use app_models::{
    SignupInput, Todo, User,
    todo::TODOS_TABLE,
    user::USERS_TABLE,
};
use async_trait::async_trait;
use std::sync::Arc;
use tracing::{error, info, warn};

use super::credentials::CredentialService;

const USER_INSERT_ATTEMPTS: usize = 3;

// Both statements commit together or not at all.
const DELETE_USER_CASCADE: &str = r#"
BEGIN TRANSACTION;
DELETE todos WHERE user_id = $user_id;
DELETE type::thing('users', $user_id);
COMMIT TRANSACTION;
"#;

/// Persistence operations for users and their todos.
#[async_trait]
pub trait AccessServiceTrait: Send + Sync {
    /// Validate, hash the password and store a new user.
    async fn create_user(&self, input: SignupInput) -> AppResult<User>;

    async fn get_user_by_email(&self, email: &str) -> AppResult<Option<User>>;

    async fn get_user_by_id(&self, user_id: &str) -> AppResult<Option<User>>;

    async fn list_users(&self) -> AppResult<Vec<User>>;

    /// Remove a user together with every todo they own.
    async fn delete_user(&self, user_id: &str) -> AppResult<()>;

    async fn list_todos_for(&self, owner: &User) -> AppResult<Vec<Todo>>;

    async fn create_todo(&self, title: &str, owner: &User) -> AppResult<Todo>;

    /// Retitle a todo owned by `caller`. Someone else's todo is reported as
    /// missing.
    async fn update_todo(&self, caller: &User, todo_id: &str, title: &str) -> AppResult<Todo>;

    async fn delete_todo(&self, caller: &User, todo_id: &str) -> AppResult<()>;
}

pub type SharedAccess = Arc<dyn AccessServiceTrait>;

pub struct AccessService {
    user_db: DbService<User>,
    todo_db: DbService<Todo>,
    credentials: Arc<CredentialService>,
    password_min_length: usize,
}

/// Sanitized signup fields
#[derive(Debug)]
struct ValidationInput {
    email: String,
    f_name: String,
    l_name: String,
    password: String,
}

impl ValidationInput {
    fn from_signup_input(input: SignupInput) -> Self {
        Self {
            email: validation::sanitize_string(&input.email),
            f_name: validation::sanitize_string(&input.f_name),
            l_name: validation::sanitize_string(&input.l_name),
            password: input.password,
        }
    }

    fn validate(&self, password_min_length: usize) -> AppResult<()> {
        validation::validate_email(&self.email)?;
        validation::validate_name("f_name", &self.f_name)?;
        validation::validate_name("l_name", &self.l_name)?;
        validation::validate_password(&self.password, password_min_length)?;
        Ok(())
    }
}

impl AccessService {
    pub fn new(
        db: Arc<Database>,
        credentials: Arc<CredentialService>,
        password_min_length: usize,
    ) -> Self {
        Self {
            user_db: DbService::new(Arc::clone(&db), USERS_TABLE),
            todo_db: DbService::new(db, TODOS_TABLE),
            credentials,
            password_min_length,
        }
    }

    // A signup racing past the pre-check loses either on the unique index or
    // on a transaction conflict. Either way the winner is committed by then,
    // so a second lookup tells a duplicate apart from a transient failure.
    async fn insert_user(&self, user: User) -> AppResult<User> {
        let mut attempt = 0;

        loop {
            attempt += 1;

            let error = match self.user_db.create_record(user.clone()).await {
                Ok(Some(created)) => {
                    info!(user_id = %created.key(), "User created");
                    return Ok(created);
                }
                Ok(None) => return Err(AppError::database_operation_failed("create", "user")),
                Err(e) => e,
            };

            if is_unique_violation(&error) || self.get_user_by_email(&user.email).await?.is_some()
            {
                return Err(AppError::resource_exists("User", &user.email));
            }

            if attempt >= USER_INSERT_ATTEMPTS {
                error!("Failed to store user after {} attempts: {}", attempt, error);
                return Err(error);
            }

            warn!(attempt, "Retrying user insert: {}", error);
        }
    }

    // Fetch a todo only if `caller` owns it
    async fn owned_todo(&self, caller: &User, todo_id: &str) -> AppResult<Todo> {
        match self.todo_db.get_record_by_id(todo_id).await? {
            Some(todo) if todo.is_owned_by(&caller.key()) => Ok(todo),
            _ => not_found_error!("Todo", todo_id),
        }
    }
}

#[async_trait]
impl AccessServiceTrait for AccessService {
    async fn create_user(&self, input: SignupInput) -> AppResult<User> {
        let input = ValidationInput::from_signup_input(input);
        input.validate(self.password_min_length)?;

        if self.get_user_by_email(&input.email).await?.is_some() {
            return resource_exists_error!("User", "email", input.email);
        }

        let hashed_password = self.credentials.hash(&input.password)?;
        let user = User::new(
            input.email.clone(),
            input.f_name,
            input.l_name,
            hashed_password,
        );

        self.insert_user(user).await
    }

    async fn get_user_by_email(&self, email: &str) -> AppResult<Option<User>> {
        let users = self.user_db.get_records_by_field("email", email.to_string()).await?;
        Ok(users.into_iter().next())
    }

    async fn get_user_by_id(&self, user_id: &str) -> AppResult<Option<User>> {
        self.user_db.get_record_by_id(user_id).await
    }

    async fn list_users(&self) -> AppResult<Vec<User>> {
        self.user_db.get_all_records().await
    }

    async fn delete_user(&self, user_id: &str) -> AppResult<()> {
        if self.get_user_by_id(user_id).await?.is_none() {
            return not_found_error!("User", user_id);
        }

        self.user_db
            .database()
            .query(DELETE_USER_CASCADE)
            .bind(("user_id", user_id.to_string()))
            .execute()
            .await?
            .check()?;

        info!(user_id = %user_id, "User and owned todos deleted");
        Ok(())
    }

    async fn list_todos_for(&self, owner: &User) -> AppResult<Vec<Todo>> {
        self.todo_db.get_records_by_field("user_id", owner.key()).await
    }

    async fn create_todo(&self, title: &str, owner: &User) -> AppResult<Todo> {
        validation::validate_title(title)?;

        let todo = Todo::new(title.to_string(), owner.key());
        let created = self
            .todo_db
            .create_record(todo)
            .await?
            .ok_or_else(|| AppError::database_operation_failed("create", "todo"))?;

        info!(todo_id = %created.key(), user_id = %created.user_id, "Todo created");
        Ok(created)
    }

    async fn update_todo(&self, caller: &User, todo_id: &str, title: &str) -> AppResult<Todo> {
        validation::validate_title(title)?;

        let mut todo = self.owned_todo(caller, todo_id).await?;
        todo.title = title.to_string();

        match self.todo_db.update_record(todo_id, todo).await? {
            Some(updated) => Ok(updated),
            None => not_found_error!("Todo", todo_id),
        }
    }

    async fn delete_todo(&self, caller: &User, todo_id: &str) -> AppResult<()> {
        self.owned_todo(caller, todo_id).await?;

        if self.todo_db.delete_record(todo_id).await?.is_none() {
            return not_found_error!("Todo", todo_id);
        }

        info!(todo_id = %todo_id, user_id = %caller.key(), "Todo deleted");
        Ok(())
    }
}
