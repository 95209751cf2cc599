//! Destination URL value object.
//!
//! Wraps the raw input string untouched; [`url::Url`] is used only to check that
//! the input is a well-formed absolute URL and to extract its host.

use std::fmt;
use thiserror::Error;

/// Longest accepted destination URL, in characters.
pub const MAX_URL_LENGTH: usize = 2048;

/// Errors produced when constructing a [`Url`].
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum UrlError {
    #[error("URL cannot be empty")]
    Empty,

    #[error("URL cannot exceed {MAX_URL_LENGTH} characters (got {0})")]
    TooLong(usize),

    #[error("Invalid URL format: {0}")]
    MalformedUrl(String),

    #[error("URL must use http or https scheme, got '{0}'")]
    UnsupportedScheme(String),
}

/// A validated absolute `http`/`https` URL.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Url {
    value: String,
    domain: String,
}

impl Url {
    /// Validates a raw destination URL.
    ///
    /// Checks run in order: blank input, length, absolute-URL syntax, scheme.
    ///
    /// # Errors
    ///
    /// - [`UrlError::Empty`] for blank input
    /// - [`UrlError::TooLong`] when longer than [`MAX_URL_LENGTH`]
    /// - [`UrlError::MalformedUrl`] when not a well-formed absolute URL with a host
    /// - [`UrlError::UnsupportedScheme`] when the scheme is not `http` or `https`
    pub fn new(value: impl Into<String>) -> Result<Self, UrlError> {
        let value = value.into();

        if value.trim().is_empty() {
            return Err(UrlError::Empty);
        }

        let length = value.chars().count();
        if length > MAX_URL_LENGTH {
            return Err(UrlError::TooLong(length));
        }

        if value.trim() != value {
            return Err(UrlError::MalformedUrl(
                "leading or trailing whitespace".to_string(),
            ));
        }

        let parsed = url::Url::parse(&value).map_err(|e| UrlError::MalformedUrl(e.to_string()))?;

        let scheme = parsed.scheme();
        if scheme != "http" && scheme != "https" {
            return Err(UrlError::UnsupportedScheme(scheme.to_string()));
        }

        // `url` accepts `http:host`; an absolute URL needs the `//` authority marker.
        let has_authority = value
            .get(scheme.len()..scheme.len() + 3)
            .is_some_and(|sep| sep == "://");
        if !has_authority {
            return Err(UrlError::MalformedUrl(
                "missing '://' after scheme".to_string(),
            ));
        }

        let domain = parsed
            .host_str()
            .filter(|host| !host.is_empty())
            .ok_or_else(|| UrlError::MalformedUrl("missing host".to_string()))?
            .to_string();

        Ok(Self { value, domain })
    }

    /// The URL exactly as supplied.
    pub fn as_str(&self) -> &str {
        &self.value
    }

    /// The host part, lowercased by the parser (e.g. `example.com`).
    pub fn domain(&self) -> &str {
        &self.domain
    }

    pub fn into_inner(self) -> String {
        self.value
    }
}

impl fmt::Display for Url {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.value)
    }
}

impl AsRef<str> for Url {
    fn as_ref(&self) -> &str {
        &self.value
    }
}
