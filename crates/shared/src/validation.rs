//! Common validation utilities used by request DTOs.

use lazy_static::lazy_static;
use regex::Regex;
use validator::ValidationError;

lazy_static! {
    /// Optional leading `+`, optional leading `1`, then 9 to 15 digits.
    pub static ref PHONE_NUMBER_REGEX: Regex = Regex::new(r"^\+?1?\d{9,15}$").unwrap();

    /// Lowercase slug used to look circles up in URLs.
    pub static ref SLUG_REGEX: Regex = Regex::new(r"^[a-z0-9]+(?:-[a-z0-9]+)*$").unwrap();

    /// Usernames appear in URLs, so they stay URL-safe.
    pub static ref USERNAME_REGEX: Regex = Regex::new(r"^[A-Za-z0-9_.]+$").unwrap();
}

/// Validates a phone number such as `+11 1111111111`-style input without spaces.
pub fn validate_phone_number(phone: &str) -> Result<(), ValidationError> {
    if PHONE_NUMBER_REGEX.is_match(phone) {
        Ok(())
    } else {
        let mut err = ValidationError::new("phone_number_format");
        err.message = Some(
            "Phone number must be entered in the format: +999999999. Up to 15 digits.".into(),
        );
        Err(err)
    }
}

/// Validates a circle slug.
pub fn validate_slug(slug: &str) -> Result<(), ValidationError> {
    if SLUG_REGEX.is_match(slug) {
        Ok(())
    } else {
        let mut err = ValidationError::new("slug_format");
        err.message =
            Some("Slug may only contain lowercase letters, digits and single dashes".into());
        Err(err)
    }
}

/// Validates a username.
pub fn validate_username(username: &str) -> Result<(), ValidationError> {
    if USERNAME_REGEX.is_match(username) {
        Ok(())
    } else {
        let mut err = ValidationError::new("username_format");
        err.message = Some("Username may only contain letters, digits, '_' and '.'".into());
        Err(err)
    }
}

/// Validates that a rating lies within 1 to 5.
pub fn validate_rating_value(rating: f64) -> Result<(), ValidationError> {
    if (1.0..=5.0).contains(&rating) {
        Ok(())
    } else {
        let mut err = ValidationError::new("rating_range");
        err.message = Some("Rating must be between 1 and 5".into());
        Err(err)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_validate_phone_number() {
        assert!(validate_phone_number("+573001234567").is_ok());
        assert!(validate_phone_number("3001234567").is_ok());
        assert!(validate_phone_number("12345678").is_err());
        assert!(validate_phone_number("+57 300 123").is_err());
        assert!(validate_phone_number("phone").is_err());
    }

    #[test]
    fn test_validate_phone_number_error_message() {
        let err = validate_phone_number("abc").unwrap_err();
        assert!(err.message.unwrap().to_string().contains("Up to 15 digits"));
    }

    #[test]
    fn test_validate_slug() {
        assert!(validate_slug("gaviotas").is_ok());
        assert!(validate_slug("barrio-gaviotas-2").is_ok());
        assert!(validate_slug("Gaviotas").is_err());
        assert!(validate_slug("-gaviotas").is_err());
        assert!(validate_slug("gaviotas--norte").is_err());
        assert!(validate_slug("").is_err());
    }

    #[test]
    fn test_validate_username() {
        assert!(validate_username("velo").is_ok());
        assert!(validate_username("dummy_user.01").is_ok());
        assert!(validate_username("velo/../etc").is_err());
        assert!(validate_username("with space").is_err());
    }

    #[test]
    fn test_validate_rating_value() {
        assert!(validate_rating_value(1.0).is_ok());
        assert!(validate_rating_value(4.5).is_ok());
        assert!(validate_rating_value(5.0).is_ok());
        assert!(validate_rating_value(0.5).is_err());
        assert!(validate_rating_value(5.1).is_err());
    }
}
