// Input field validation shared by registration, sign-in and the inbox gate

use crate::core::errors::InboxError;

pub const USERNAME_MIN_CHARS: usize = 2;
pub const USERNAME_MAX_CHARS: usize = 20;
pub const EMAIL_MAX_CHARS: usize = 254;
pub const PASSWORD_MIN_CHARS: usize = 6;

pub fn validate_username(username: &str) -> Result<(), InboxError> {
    let len = username.chars().count();
    if len < USERNAME_MIN_CHARS {
        return Err(InboxError::ValidationError(format!(
            "Username must be at least {} characters",
            USERNAME_MIN_CHARS
        )));
    }
    if len > USERNAME_MAX_CHARS {
        return Err(InboxError::ValidationError(format!(
            "Username must be no more than {} characters",
            USERNAME_MAX_CHARS
        )));
    }
    if !username.chars().all(|c| c.is_ascii_alphanumeric() || c == '_') {
        return Err(InboxError::ValidationError(
            "Username must not contain special characters".to_string(),
        ));
    }
    Ok(())
}

pub fn validate_email(email: &str) -> Result<(), InboxError> {
    let invalid = || InboxError::ValidationError("Invalid email address".to_string());

    if email.chars().count() > EMAIL_MAX_CHARS || email.chars().any(char::is_whitespace) {
        return Err(invalid());
    }
    let (local, domain) = email.split_once('@').ok_or_else(invalid)?;
    if local.is_empty() || domain.contains('@') {
        return Err(invalid());
    }
    match domain.rsplit_once('.') {
        Some((host, tld)) if !host.is_empty() && !tld.is_empty() => Ok(()),
        _ => Err(invalid()),
    }
}

pub fn validate_password_len(char_len: usize) -> Result<(), InboxError> {
    if char_len < PASSWORD_MIN_CHARS {
        return Err(InboxError::ValidationError(format!(
            "Password must be at least {} characters",
            PASSWORD_MIN_CHARS
        )));
    }
    Ok(())
}

/// Trim and bound message content; returns the text to store
pub fn normalize_content(content: &str, max_chars: usize) -> Result<String, InboxError> {
    let trimmed = content.trim();
    if trimmed.is_empty() {
        return Err(InboxError::ValidationError("Message content must not be empty".to_string()));
    }
    if trimmed.chars().count() > max_chars {
        return Err(InboxError::ValidationError(format!(
            "Message content must be no more than {} characters",
            max_chars
        )));
    }
    Ok(trimmed.to_string())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_username_rules() {
        assert!(validate_username("alice").is_ok());
        assert!(validate_username("a_1").is_ok());
        assert!(validate_username("a").is_err());
        assert!(validate_username("abcdefghijklmnopqrstu").is_err());
        assert!(validate_username("al ice").is_err());
        assert!(validate_username("al!ce").is_err());
    }

    #[test]
    fn test_email_rules() {
        assert!(validate_email("a@x.com").is_ok());
        assert!(validate_email("first.last@sub.example.org").is_ok());
        assert!(validate_email("ax.com").is_err());
        assert!(validate_email("@x.com").is_err());
        assert!(validate_email("a@x").is_err());
        assert!(validate_email("a@@x.com").is_err());
        assert!(validate_email("a b@x.com").is_err());
    }

    #[test]
    fn test_content_is_trimmed_and_bounded() {
        assert_eq!(normalize_content("  hello \n", 10).unwrap(), "hello");
        assert!(normalize_content("   ", 10).is_err());
        assert!(normalize_content("", 10).is_err());
        assert!(normalize_content(&"x".repeat(11), 10).is_err());
        assert!(normalize_content(&"x".repeat(10), 10).is_ok());
    }

    #[test]
    fn test_content_bound_counts_chars_not_bytes() {
        // Four-byte emoji, ten of them
        let content = "\u{1F600}".repeat(10);
        assert!(normalize_content(&content, 10).is_ok());
    }

    #[test]
    fn test_password_minimum() {
        assert!(validate_password_len(5).is_err());
        assert!(validate_password_len(6).is_ok());
    }
}
