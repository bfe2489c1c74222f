//! # Validation Module
//!
//! Checks applied to names before they are written.
//!
//! ## Usage
//! ```rust
//! use receipt_core::validation::validate_name;
//!
//! assert!(validate_name("categoryName", "Produce").is_ok());
//! assert!(validate_name("categoryName", "   ").is_err());
//! ```

use crate::error::ValidationError;
use crate::MAX_NAME_LEN;

/// Result type for validation operations.
pub type ValidationResult<T> = Result<T, ValidationError>;

/// Validates a category, store or tag name.
///
/// ## Rules
/// - Must not be empty after trimming
/// - At most [`MAX_NAME_LEN`] characters (the column is `nvarchar(50)`)
///
/// The value itself is stored untrimmed; exact-match lookups depend on it.
pub fn validate_name(field: &str, value: &str) -> ValidationResult<()> {
    if value.trim().is_empty() {
        return Err(ValidationError::Required {
            field: field.to_string(),
        });
    }

    // nvarchar widths count characters, not bytes
    if value.chars().count() > MAX_NAME_LEN {
        return Err(ValidationError::TooLong {
            field: field.to_string(),
            max: MAX_NAME_LEN,
        });
    }

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_validate_name() {
        assert!(validate_name("storeName", "Corner Shop").is_ok());
        assert!(validate_name("storeName", "").is_err());
        assert!(validate_name("storeName", "  \t").is_err());
        assert!(validate_name("storeName", &"A".repeat(51)).is_err());
        assert!(validate_name("storeName", &"A".repeat(50)).is_ok());
    }

    #[test]
    fn test_width_counts_characters() {
        // 50 umlauts are 100 bytes but still fit nvarchar(50)
        assert!(validate_name("categoryName", &"ü".repeat(50)).is_ok());
    }
}
