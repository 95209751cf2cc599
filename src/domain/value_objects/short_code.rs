//! Short code value object.

use rand::Rng;
use std::fmt;
use std::str::FromStr;
use thiserror::Error;

/// Symbols a short code may contain, in generation order.
pub const ALPHABET: &[u8; 62] = b"0123456789abcdefghijklmnopqrstuvwxyzABCDEFGHIJKLMNOPQRSTUVWXYZ";

/// Shortest accepted code.
pub const MIN_LENGTH: usize = 6;

/// Longest accepted code.
pub const MAX_LENGTH: usize = 10;

/// Length used by [`ShortCode::generate`].
pub const DEFAULT_LENGTH: usize = 7;

/// Errors produced when constructing a [`ShortCode`].
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ShortCodeError {
    #[error("Short code must be {MIN_LENGTH}-{MAX_LENGTH} characters of [0-9a-zA-Z]: {0}")]
    InvalidFormat(String),
}

/// A validated short code.
///
/// Always 6 to 10 characters long and drawn from the 62-symbol [`ALPHABET`].
/// Equality is structural on the underlying string.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct ShortCode(String);

impl ShortCode {
    /// Validates an externally supplied code.
    ///
    /// # Errors
    ///
    /// Returns [`ShortCodeError::InvalidFormat`] when the length is outside
    /// `[MIN_LENGTH, MAX_LENGTH]` or any character is not ASCII alphanumeric.
    pub fn new(value: impl Into<String>) -> Result<Self, ShortCodeError> {
        let value = value.into();
        let length = value.chars().count();

        if !(MIN_LENGTH..=MAX_LENGTH).contains(&length) {
            return Err(ShortCodeError::InvalidFormat(format!(
                "length {length} is out of range"
            )));
        }

        if let Some(bad) = value.chars().find(|c| !c.is_ascii_alphanumeric()) {
            return Err(ShortCodeError::InvalidFormat(format!(
                "character {bad:?} is not allowed"
            )));
        }

        Ok(Self(value))
    }

    /// Generates a random code of [`DEFAULT_LENGTH`] characters.
    ///
    /// # Errors
    ///
    /// Never fails in practice; the result still goes through [`ShortCode::new`].
    pub fn generate() -> Result<Self, ShortCodeError> {
        Self::generate_with_length(DEFAULT_LENGTH)
    }

    /// Generates a random code of `length` characters.
    ///
    /// Each character is an independent uniform draw from [`ALPHABET`] using the
    /// thread-local CSPRNG (ChaCha, seeded from the OS).
    ///
    /// # Errors
    ///
    /// Returns [`ShortCodeError::InvalidFormat`] if `length` is outside the accepted range.
    pub fn generate_with_length(length: usize) -> Result<Self, ShortCodeError> {
        let mut rng = rand::rng();
        let code: String = (0..length)
            .map(|_| ALPHABET[rng.random_range(0..ALPHABET.len())] as char)
            .collect();

        Self::new(code)
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }

    pub fn into_inner(self) -> String {
        self.0
    }
}

impl fmt::Display for ShortCode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl AsRef<str> for ShortCode {
    fn as_ref(&self) -> &str {
        &self.0
    }
}

impl FromStr for ShortCode {
    type Err = ShortCodeError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::new(s)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashSet;

    #[test]
    fn test_accepts_boundary_lengths() {
        assert!(ShortCode::new("abc123").is_ok());
        assert!(ShortCode::new("abcDEF1234").is_ok());
    }

    #[test]
    fn test_rejects_too_short() {
        let err = ShortCode::new("abc12").unwrap_err();
        assert!(matches!(err, ShortCodeError::InvalidFormat(_)));
    }

    #[test]
    fn test_rejects_too_long() {
        assert!(ShortCode::new("abcdefghijk").is_err());
    }

    #[test]
    fn test_rejects_empty() {
        assert!(ShortCode::new("").is_err());
    }

    #[test]
    fn test_rejects_non_alphanumeric() {
        for code in ["abc-123", "abc_123", "abc 123", "abc123!", "abcé123"] {
            assert!(ShortCode::new(code).is_err(), "{code} should be rejected");
        }
    }

    #[test]
    fn test_generate_uses_default_length() {
        let code = ShortCode::generate().unwrap();
        assert_eq!(code.as_str().len(), DEFAULT_LENGTH);
        assert!(code.as_str().bytes().all(|b| ALPHABET.contains(&b)));
    }

    #[test]
    fn test_generate_with_every_valid_length() {
        for length in MIN_LENGTH..=MAX_LENGTH {
            let code = ShortCode::generate_with_length(length).unwrap();
            assert_eq!(code.as_str().len(), length);
            assert!(ShortCode::new(code.as_str()).is_ok());
        }
    }

    #[test]
    fn test_generate_with_invalid_length_fails() {
        assert!(ShortCode::generate_with_length(5).is_err());
        assert!(ShortCode::generate_with_length(11).is_err());
    }

    #[test]
    fn test_generate_produces_distinct_codes() {
        let codes: HashSet<_> = (0..1000)
            .map(|_| ShortCode::generate().unwrap())
            .collect();

        assert_eq!(codes.len(), 1000);
    }

    #[test]
    fn test_structural_equality_and_display() {
        let a: ShortCode = "Xy12ab9".parse().unwrap();
        let b = ShortCode::new("Xy12ab9".to_string()).unwrap();
        assert_eq!(a, b);
        assert_eq!(a.to_string(), "Xy12ab9");
    }
}
