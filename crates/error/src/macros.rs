/// Simplifies creating validation errors
///
/// # Example
/// ```ignore
/// validation_error!("email", "Email cannot be empty")
/// ```
#[macro_export]
macro_rules! validation_error {
    ($field:expr, $message:expr) => {
        Err($crate::AppError::ValidationError(format!(
            "Validation failed for '{}': {}",
            $field, $message
        )))
    };
}

/// Simplifies creating not found errors
///
/// # Example
/// ```ignore
/// not_found_error!("Todo", todo_id)
/// ```
#[macro_export]
macro_rules! not_found_error {
    ($resource_type:expr, $identifier:expr) => {
        Err($crate::AppError::NotFoundError(format!(
            "{} with identifier '{}' was not found.",
            $resource_type, $identifier
        )))
    };
}

/// Simplifies creating resource exists errors
///
/// # Example
/// ```ignore
/// resource_exists_error!("User", "email", email)
/// ```
#[macro_export]
macro_rules! resource_exists_error {
    ($resource_type:expr, $field:expr, $value:expr) => {
        Err($crate::AppError::ResourceExistsError(format!(
            "{} with {} '{}' already exists.",
            $resource_type, $field, $value
        )))
    };
}

/// Simplifies creating authentication errors
///
/// # Example
/// ```ignore
/// auth_error!("Invalid email or password")
/// ```
#[macro_export]
macro_rules! auth_error {
    ($message:expr) => {
        Err($crate::AppError::AuthenticationError($message.to_string()))
    };
}
