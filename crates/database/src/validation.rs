//! Input validation for user-supplied fields.

use std::fmt;

/// Validation error types.
#[derive(Debug, Clone, PartialEq)]
pub enum ValidationError {
    /// Invalid email format.
    InvalidEmail(String),
    /// Value too long.
    TooLong {
        field: String,
        max: usize,
        actual: usize,
    },
    /// Empty value where one is required.
    Empty(String),
    /// Price is negative or not a finite number.
    InvalidPrice(f64),
    /// Listing has no images or too many.
    ImageCount { min: usize, max: usize, actual: usize },
}

impl fmt::Display for ValidationError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ValidationError::InvalidEmail(msg) => write!(f, "Invalid email: {}", msg),
            ValidationError::TooLong { field, max, actual } => {
                write!(f, "{} is too long ({} chars, max {})", field, actual, max)
            }
            ValidationError::Empty(field) => write!(f, "{} cannot be empty", field),
            ValidationError::InvalidPrice(price) => {
                write!(f, "price must be a non-negative number, got {}", price)
            }
            ValidationError::ImageCount { min, max, actual } => {
                write!(f, "listings need {} to {} images, got {}", min, max, actual)
            }
        }
    }
}

impl std::error::Error for ValidationError {}

/// Maximum allowed length for email addresses.
pub const MAX_EMAIL_LENGTH: usize = 254;

/// Maximum allowed length for listing titles.
pub const MAX_TITLE_LENGTH: usize = 100;

/// Maximum allowed length for listing descriptions.
pub const MAX_DESCRIPTION_LENGTH: usize = 2000;

/// Maximum allowed length for a chat message.
pub const MAX_MESSAGE_LENGTH: usize = 500;

/// Image count bounds for a new listing.
pub const MIN_IMAGES_PER_ITEM: usize = 1;
pub const MAX_IMAGES_PER_ITEM: usize = 5;

/// Validate an email address (basic RFC 5322 format check).
///
/// Checks for exactly one `@`, a non-empty local part, and a dotted domain.
pub fn validate_email(email: &str) -> Result<(), ValidationError> {
    let email = email.trim();

    if email.is_empty() {
        return Err(ValidationError::Empty("email".to_string()));
    }

    if email.len() > MAX_EMAIL_LENGTH {
        return Err(ValidationError::TooLong {
            field: "email".to_string(),
            max: MAX_EMAIL_LENGTH,
            actual: email.len(),
        });
    }

    let parts: Vec<&str> = email.split('@').collect();
    if parts.len() != 2 {
        return Err(ValidationError::InvalidEmail(
            "must contain exactly one @ symbol".to_string(),
        ));
    }

    let (local, domain) = (parts[0], parts[1]);

    if local.is_empty() {
        return Err(ValidationError::InvalidEmail(
            "missing local part (before @)".to_string(),
        ));
    }

    if domain.is_empty() || !domain.contains('.') {
        return Err(ValidationError::InvalidEmail(
            "domain must contain at least one dot".to_string(),
        ));
    }

    if domain.starts_with('.') || domain.ends_with('.') || domain.contains("..") {
        return Err(ValidationError::InvalidEmail(
            "malformed domain".to_string(),
        ));
    }

    Ok(())
}

/// Validate and normalize a chat message: trimmed, non-empty, bounded.
///
/// Returns the trimmed text that should be stored.
pub fn validate_message_text(text: &str) -> Result<String, ValidationError> {
    let text = text.trim();

    if text.is_empty() {
        return Err(ValidationError::Empty("text".to_string()));
    }

    let length = text.chars().count();
    if length > MAX_MESSAGE_LENGTH {
        return Err(ValidationError::TooLong {
            field: "text".to_string(),
            max: MAX_MESSAGE_LENGTH,
            actual: length,
        });
    }

    Ok(text.to_string())
}

/// Validate the fields of a new listing before anything is uploaded or
/// written.
pub fn validate_listing(
    title: &str,
    description: &str,
    price: f64,
    category: &str,
    condition: &str,
    image_count: usize,
) -> Result<(), ValidationError> {
    let title = title.trim();
    if title.is_empty() {
        return Err(ValidationError::Empty("title".to_string()));
    }
    if title.chars().count() > MAX_TITLE_LENGTH {
        return Err(ValidationError::TooLong {
            field: "title".to_string(),
            max: MAX_TITLE_LENGTH,
            actual: title.chars().count(),
        });
    }

    let description = description.trim();
    if description.is_empty() {
        return Err(ValidationError::Empty("description".to_string()));
    }
    if description.chars().count() > MAX_DESCRIPTION_LENGTH {
        return Err(ValidationError::TooLong {
            field: "description".to_string(),
            max: MAX_DESCRIPTION_LENGTH,
            actual: description.chars().count(),
        });
    }

    if !price.is_finite() || price < 0.0 {
        return Err(ValidationError::InvalidPrice(price));
    }

    if category.trim().is_empty() {
        return Err(ValidationError::Empty("category".to_string()));
    }
    if condition.trim().is_empty() {
        return Err(ValidationError::Empty("condition".to_string()));
    }

    if image_count < MIN_IMAGES_PER_ITEM || image_count > MAX_IMAGES_PER_ITEM {
        return Err(ValidationError::ImageCount {
            min: MIN_IMAGES_PER_ITEM,
            max: MAX_IMAGES_PER_ITEM,
            actual: image_count,
        });
    }

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_validate_email_valid() {
        assert!(validate_email("test@example.com").is_ok());
        assert!(validate_email("user.name@campus.ac.in").is_ok());
        assert!(validate_email(" test@example.com ").is_ok()); // trimmed
    }

    #[test]
    fn test_validate_email_invalid() {
        assert!(matches!(
            validate_email(""),
            Err(ValidationError::Empty(_))
        ));
        assert!(matches!(
            validate_email("test.example.com"),
            Err(ValidationError::InvalidEmail(_))
        ));
        assert!(matches!(
            validate_email("test@example@com"),
            Err(ValidationError::InvalidEmail(_))
        ));
        assert!(matches!(
            validate_email("@example.com"),
            Err(ValidationError::InvalidEmail(_))
        ));
        assert!(matches!(
            validate_email("test@localhost"),
            Err(ValidationError::InvalidEmail(_))
        ));
        assert!(matches!(
            validate_email("test@example..com"),
            Err(ValidationError::InvalidEmail(_))
        ));
    }

    #[test]
    fn test_validate_message_text() {
        assert_eq!(validate_message_text("  Hi  ").unwrap(), "Hi");
        assert!(matches!(
            validate_message_text("   "),
            Err(ValidationError::Empty(_))
        ));

        let long = "x".repeat(MAX_MESSAGE_LENGTH + 1);
        assert!(matches!(
            validate_message_text(&long),
            Err(ValidationError::TooLong { .. })
        ));

        let exactly = "x".repeat(MAX_MESSAGE_LENGTH);
        assert!(validate_message_text(&exactly).is_ok());
    }

    #[test]
    fn test_validate_listing() {
        assert!(validate_listing("Desk", "Sturdy desk", 500.0, "Furniture", "Good", 2).is_ok());

        assert!(matches!(
            validate_listing("", "d", 1.0, "c", "Good", 1),
            Err(ValidationError::Empty(_))
        ));
        assert!(matches!(
            validate_listing("t", "d", -1.0, "c", "Good", 1),
            Err(ValidationError::InvalidPrice(_))
        ));
        assert!(matches!(
            validate_listing("t", "d", f64::NAN, "c", "Good", 1),
            Err(ValidationError::InvalidPrice(_))
        ));
        assert!(matches!(
            validate_listing("t", "d", 1.0, "c", "Good", 0),
            Err(ValidationError::ImageCount { .. })
        ));
        assert!(matches!(
            validate_listing("t", "d", 1.0, "c", "Good", 6),
            Err(ValidationError::ImageCount { .. })
        ));

        // Free items are allowed
        assert!(validate_listing("t", "d", 0.0, "c", "Good", 1).is_ok());
    }
}
