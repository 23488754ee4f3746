use app_error::{AppResult, validation_error};
use lazy_static::lazy_static;
use regex::Regex;

const MAX_NAME_LENGTH: usize = 100;

lazy_static! {
    // Local part, '@', dotted domain with a 2+ letter TLD
    static ref EMAIL_REGEX: Regex = Regex::new(
        r"(?i)^[a-z0-9_+]([a-z0-9_+.\-]*[a-z0-9_+])?@[a-z0-9]+([\-.][a-z0-9]+)*\.[a-z]{2,}$"
    ).unwrap();
}

/// Validates an email address
pub fn validate_email(email: &str) -> AppResult<()> {
    if email.trim().is_empty() {
        return validation_error!("email", "Email cannot be empty");
    }

    if !EMAIL_REGEX.is_match(email) {
        return validation_error!("email", "Invalid email format");
    }

    Ok(())
}

/// Validates a given or family name
pub fn validate_name(field: &str, name: &str) -> AppResult<()> {
    if name.trim().is_empty() {
        return validation_error!(field, "Name cannot be empty");
    }

    if name.trim().chars().count() > MAX_NAME_LENGTH {
        return validation_error!(
            field,
            format!("Name cannot exceed {} characters", MAX_NAME_LENGTH)
        );
    }

    Ok(())
}

/// Validates a password against the configured minimum length
pub fn validate_password(password: &str, min_length: usize) -> AppResult<()> {
    if password.is_empty() {
        return validation_error!("password", "Password cannot be empty");
    }

    if password.chars().count() < min_length {
        return validation_error!(
            "password",
            format!("Password must be at least {} characters long", min_length)
        );
    }

    Ok(())
}

/// Sanitizes a string input by trimming whitespace
pub fn sanitize_string(input: &str) -> String {
    input.trim().to_string()
}

#[cfg(test)]
mod tests {
    use super::*;
    use app_error::AppError;

    #[test]
    fn test_email_validation() {
        assert!(validate_email("ada@example.com").is_ok());
        assert!(validate_email("Ada.Lovelace+todo@mail.example.org").is_ok());

        for bad in ["", "   ", "ada", "ada@", "@example.com", "ada@example", "a b@example.com"] {
            assert!(
                matches!(validate_email(bad), Err(AppError::ValidationError(_))),
                "{:?} should be rejected",
                bad
            );
        }
    }

    #[test]
    fn test_name_validation() {
        assert!(validate_name("f_name", "Ada").is_ok());
        assert!(validate_name("f_name", "  ").is_err());

        let long = "x".repeat(MAX_NAME_LENGTH + 1);
        let err = validate_name("l_name", &long).unwrap_err();
        assert!(err.to_string().contains("l_name"));
    }

    #[test]
    fn test_password_validation() {
        assert!(validate_password("p", 1).is_ok());
        assert!(validate_password("", 1).is_err());
        assert!(validate_password("short", 8).is_err());
        assert!(validate_password("long enough", 8).is_ok());
    }

    #[test]
    fn test_sanitize_string() {
        assert_eq!(sanitize_string("  ada@example.com \n"), "ada@example.com");
    }
}
