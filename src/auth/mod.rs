//! sevDesk API credential
//!
//! sevDesk authenticates every request with a static API token sent verbatim
//! in the `Authorization` header (no `Bearer` scheme).

use reqwest::header::{HeaderValue, InvalidHeaderValue};
use std::fmt;

/// Static API token for the sevDesk backend
#[derive(Clone, PartialEq, Eq)]
pub struct ApiToken(String);

impl ApiToken {
    /// Wrap a raw token. Surrounding whitespace is trimmed.
    pub fn new(raw: impl Into<String>) -> Self {
        let raw = raw.into();
        Self(raw.trim().to_string())
    }

    /// Returns `true` when the token is empty after trimming
    pub fn is_blank(&self) -> bool {
        self.0.is_empty()
    }

    /// Value for the `Authorization` header, marked sensitive so reqwest
    /// never prints it.
    pub fn header_value(&self) -> Result<HeaderValue, InvalidHeaderValue> {
        let mut value = HeaderValue::from_str(&self.0)?;
        value.set_sensitive(true);
        Ok(value)
    }
}

impl fmt::Debug for ApiToken {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("ApiToken(***)")
    }
}
