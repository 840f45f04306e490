//! Request-boundary checks on incoming chat messages.

use tracing::warn;

use crate::error::RequestError;
use crate::invoice::rules::UNSAFE_CONTENT;

/// Check a raw chat message and return it cleaned for the engine.
///
/// Null bytes are dropped and surrounding whitespace trimmed. Length is
/// counted in characters before cleaning.
pub fn validate_message(text: &str, max_length: usize) -> Result<String, RequestError> {
    let actual = text.chars().count();
    if actual > max_length {
        warn!(max_length, actual, "message rejected: too long");
        return Err(RequestError::MessageTooLong {
            max: max_length,
            actual,
        });
    }

    if UNSAFE_CONTENT.iter().any(|pattern| pattern.is_match(text)) {
        warn!("message rejected: unsafe content");
        return Err(RequestError::UnsafeContent);
    }

    let cleaned = text.replace('\0', "");
    let cleaned = cleaned.trim();
    if cleaned.is_empty() {
        warn!("message rejected: empty");
        return Err(RequestError::EmptyMessage);
    }

    Ok(cleaned.to_string())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_accepts_and_trims() {
        assert_eq!(
            validate_message("  10 cameras at $125 \0", 2000).unwrap(),
            "10 cameras at $125"
        );
    }

    #[test]
    fn test_rejects_empty() {
        assert_eq!(validate_message("", 2000), Err(RequestError::EmptyMessage));
        assert_eq!(validate_message(" \n\t ", 2000), Err(RequestError::EmptyMessage));
    }

    #[test]
    fn test_rejects_too_long() {
        let text = "é".repeat(11);
        assert_eq!(
            validate_message(&text, 10),
            Err(RequestError::MessageTooLong { max: 10, actual: 11 })
        );
        assert!(validate_message(&"é".repeat(10), 10).is_ok());
    }

    #[test]
    fn test_rejects_unsafe_content() {
        for text in [
            "<script>alert(1)</script>",
            "click javascript:void(0)",
            "<img src=x onerror=alert(1)>",
            "eval(document.cookie)",
            "<iframe src=evil>",
        ] {
            assert_eq!(validate_message(text, 2000), Err(RequestError::UnsafeContent), "{text}");
        }
    }

    #[test]
    fn test_allows_ordinary_punctuation() {
        assert!(validate_message("Invoice Smith & Sons, net 30 (thanks!)", 2000).is_ok());
        assert!(validate_message("Notes: payment on receipt", 2000).is_ok());
    }
}
