use app_error::{AppResult, validation_error};

const MAX_TITLE_LENGTH: usize = 500;

pub fn validate_title(title: &str) -> AppResult<()> {
    if title.trim().is_empty() {
        return validation_error!("title", "Title cannot be empty");
    }

    if title.chars().count() > MAX_TITLE_LENGTH {
        return validation_error!(
            "title",
            format!("Title cannot exceed {} characters", MAX_TITLE_LENGTH)
        );
    }

    Ok(())
}
