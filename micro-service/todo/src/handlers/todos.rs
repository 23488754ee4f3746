use app_error::AppResult;
use app_models::{TodoInput, TodoResponse, TodoUpdateInput, User};
use axum::{Extension, Json, extract::Path};

use crate::{extract::CurrentUser, service::SharedAccess};

type TodoList = Json<Vec<TodoResponse>>;

// Every todo route answers with the caller's full list
async fn todos_of(access: &SharedAccess, user: &User) -> AppResult<TodoList> {
    let todos = access.list_todos_for(user).await?;
    Ok(Json(todos.into_iter().map(TodoResponse::from).collect()))
}

pub async fn create_todo(
    Extension(access): Extension<SharedAccess>,
    CurrentUser(user): CurrentUser,
    Json(input): Json<TodoInput>,
) -> AppResult<TodoList> {
    access.create_todo(&input.title, &user).await?;
    todos_of(&access, &user).await
}

pub async fn get_all_todos(
    Extension(access): Extension<SharedAccess>,
    CurrentUser(user): CurrentUser,
) -> AppResult<TodoList> {
    todos_of(&access, &user).await
}

pub async fn update_todo(
    Extension(access): Extension<SharedAccess>,
    CurrentUser(user): CurrentUser,
    Json(input): Json<TodoUpdateInput>,
) -> AppResult<TodoList> {
    access.update_todo(&user, &input.id, &input.title).await?;
    todos_of(&access, &user).await
}

pub async fn delete_todo(
    Extension(access): Extension<SharedAccess>,
    CurrentUser(user): CurrentUser,
    Path(todo_id): Path<String>,
) -> AppResult<TodoList> {
    access.delete_todo(&user, &todo_id).await?;
    todos_of(&access, &user).await
}
