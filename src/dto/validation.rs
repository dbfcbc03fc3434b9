//! Validation helpers for DTOs.

use validator::ValidationError;

/// Validates that a chat display name is non-blank and of reasonable length.
///
/// # Examples
///
/// ```ignore
/// validate_chat_name("Jon Skeet") // Ok
/// validate_chat_name("   ")       // Err - blank
/// ```
pub fn validate_chat_name(name: &str) -> Result<(), ValidationError> {
    if name.trim().is_empty() {
        let mut err = ValidationError::new("chat_name_blank");
        err.message = Some("Chat user name must not be blank".into());
        return Err(err);
    }

    let len = name.chars().count();
    if len > 64 {
        let mut err = ValidationError::new("chat_name_length");
        err.message = Some(format!("Chat user name must be at most 64 characters (got {len})").into());
        return Err(err);
    }

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_validate_chat_name_valid() {
        assert!(validate_chat_name("bob").is_ok());
        assert!(validate_chat_name("Jon Skeet").is_ok());
    }

    #[test]
    fn test_validate_chat_name_invalid() {
        assert!(validate_chat_name("").is_err());
        assert!(validate_chat_name(" \t").is_err());
        assert!(validate_chat_name(&"x".repeat(65)).is_err());
    }
}
