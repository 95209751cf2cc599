//! Self-validating value objects.
//!
//! Both types can only be obtained through their validating constructors, so a
//! value in hand is always well-formed.

pub mod short_code;
pub mod url;

pub use short_code::{ShortCode, ShortCodeError};
pub use url::{Url, UrlError};
