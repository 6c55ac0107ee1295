use super::ApiError;

pub fn validate_id(id: i64) -> Result<i64, ApiError> {
    if id < 1 {
        return Err(ApiError::BadRequest(format!(
            "Invalid ID: {}. ID must be a positive integer",
            id
        )));
    }
    Ok(id)
}

pub fn validate_email(email: &str) -> Result<&str, ApiError> {
    let trimmed = email.trim();

    if trimmed.is_empty() {
        return Err(ApiError::validation_field("email", "must be provided"));
    }
    if trimmed.len() > 254 {
        return Err(ApiError::validation_field(
            "email",
            "must not be more than 254 bytes long",
        ));
    }

    let Some((local, domain)) = trimmed.split_once('@') else {
        return Err(ApiError::validation_field(
            "email",
            "must be a valid email address",
        ));
    };
    if local.is_empty() || domain.is_empty() || !domain.contains('.') {
        return Err(ApiError::validation_field(
            "email",
            "must be a valid email address",
        ));
    }

    Ok(trimmed)
}

pub fn validate_password(password: &str) -> Result<&str, ApiError> {
    if password.is_empty() {
        return Err(ApiError::validation_field("password", "must be provided"));
    }
    if password.len() < 8 {
        return Err(ApiError::validation_field(
            "password",
            "must be at least 8 bytes long",
        ));
    }
    // Legacy bcrypt cap, kept so the client-facing rule stays stable
    if password.len() > 72 {
        return Err(ApiError::validation_field(
            "password",
            "must not be more than 72 bytes long",
        ));
    }
    Ok(password)
}

pub fn validate_score(score: i32) -> Result<i32, ApiError> {
    if !(1..=5).contains(&score) {
        return Err(ApiError::validation_field(
            "score",
            "must be between 1 and 5",
        ));
    }
    Ok(score)
}

pub fn validate_sex(sex: &str) -> Result<&str, ApiError> {
    if sex == "Male" || sex == "Female" {
        Ok(sex)
    } else {
        Err(ApiError::validation_field(
            "sex",
            "must be either Male or Female",
        ))
    }
}

pub fn validate_category(category: &str) -> Result<&str, ApiError> {
    if category == "Mandatory" || category == "Elective" {
        Ok(category)
    } else {
        Err(ApiError::validation_field(
            "category",
            "must be either 'Mandatory' or 'Elective'",
        ))
    }
}

/// Clamp pagination inputs: page defaults to 1, page size to 20 with a
/// cap of 100.
pub fn validate_page(page: Option<u64>, page_size: Option<u64>) -> Result<(u64, u64), ApiError> {
    let page = page.unwrap_or(1);
    let page_size = page_size.unwrap_or(20);

    if page < 1 {
        return Err(ApiError::validation_field("page", "must be at least 1"));
    }
    if !(1..=100).contains(&page_size) {
        return Err(ApiError::validation_field(
            "page_size",
            "must be between 1 and 100",
        ));
    }

    Ok((page, page_size))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_validate_id() {
        assert!(validate_id(1).is_ok());
        assert!(validate_id(99999).is_ok());
        assert!(validate_id(0).is_err());
        assert!(validate_id(-4).is_err());
    }

    #[test]
    fn test_validate_email() {
        assert!(validate_email("officer@police.gov.bz").is_ok());
        assert_eq!(validate_email("  a@b.com  ").unwrap(), "a@b.com");
        assert!(validate_email("").is_err());
        assert!(validate_email("no-at-sign").is_err());
        assert!(validate_email("@missing-local.com").is_err());
        assert!(validate_email("missing-domain@").is_err());
        assert!(validate_email("no-tld@domain").is_err());
    }

    #[test]
    fn test_validate_password() {
        assert!(validate_password("longenough").is_ok());
        assert!(validate_password("").is_err());
        assert!(validate_password("short").is_err());
        assert!(validate_password(&"x".repeat(73)).is_err());
    }

    #[test]
    fn test_validate_score() {
        assert!(validate_score(1).is_ok());
        assert!(validate_score(5).is_ok());
        assert!(validate_score(0).is_err());
        assert!(validate_score(6).is_err());
    }

    #[test]
    fn test_validate_page() {
        assert_eq!(validate_page(None, None).unwrap(), (1, 20));
        assert_eq!(validate_page(Some(3), Some(50)).unwrap(), (3, 50));
        assert!(validate_page(Some(0), None).is_err());
        assert!(validate_page(None, Some(0)).is_err());
        assert!(validate_page(None, Some(101)).is_err());
    }
}
