pub mod todo_item;
pub mod user_account;

pub use todo_item::validate_title;
pub use user_account::{sanitize_string, validate_email, validate_name, validate_password};
