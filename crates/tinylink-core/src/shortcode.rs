use crate::base62;
use crate::counter::Counter;
use crate::error::CoreError;
use serde::{Deserialize, Serialize};
use smol_str::SmolStr;
use std::fmt::Display;

/// The identifier appended to the base address of a shortened URL.
///
/// Codes minted by the shortener come from [`ShortCode::encode`]. Codes
/// arriving on the redirect path are opaque and only checked for emptiness;
/// an unknown code is a lookup miss, not a validation failure.
#[derive(Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ShortCode(SmolStr);

impl ShortCode {
    /// Encodes an allocation counter as a short code.
    pub fn encode(counter: Counter) -> Self {
        Self(SmolStr::new(base62::encode(counter.get())))
    }

    /// Wraps a code received from a caller. Fails only on the empty string.
    pub fn new(code: impl AsRef<str>) -> std::result::Result<Self, CoreError> {
        let code = code.as_ref();
        if code.is_empty() {
            return Err(CoreError::InvalidShortCode(
                "short code cannot be empty".to_string(),
            ));
        }
        Ok(Self(SmolStr::new(code)))
    }

    /// Creates a `ShortCode` without validation.
    ///
    /// Use this only for codes read back from trusted storage.
    pub fn new_unchecked(code: impl AsRef<str>) -> Self {
        Self(SmolStr::new(code))
    }

    /// Generates the full shortened URL based on the provided base URL.
    pub fn to_url(&self, base_url: &str) -> String {
        format!("{}/{}", base_url.trim_end_matches('/'), self.0)
    }

    /// Returns the short code as a string slice.
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl std::fmt::Debug for ShortCode {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_tuple("ShortCode").field(&self.0).finish()
    }
}

impl Display for ShortCode {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(&self.0)
    }
}

impl From<Counter> for ShortCode {
    fn from(counter: Counter) -> Self {
        Self::encode(counter)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn encode_first_counters() {
        assert_eq!(ShortCode::encode(Counter::FIRST).as_str(), "b");
        assert_eq!(ShortCode::encode(Counter::new(2)).as_str(), "c");
        assert_eq!(ShortCode::from(Counter::new(62)).as_str(), "ba");
    }

    #[test]
    fn new_accepts_any_non_empty_code() {
        assert!(ShortCode::new("b").is_ok());
        assert!(ShortCode::new("unknownCode").is_ok());
        assert!(ShortCode::new("with-dash_and.dot").is_ok());
    }

    #[test]
    fn new_rejects_empty() {
        let err = ShortCode::new("").unwrap_err();
        assert!(matches!(err, CoreError::InvalidShortCode(_)));
    }

    #[test]
    fn display_matches_as_str() {
        let code = ShortCode::new_unchecked("abc123");
        assert_eq!(code.to_string(), "abc123");
        assert_eq!(format!("{code:?}"), "ShortCode(\"abc123\")");
    }

    #[test]
    fn to_url_joins_with_single_slash() {
        let code = ShortCode::new("abc123").unwrap();
        assert_eq!(code.to_url("https://tiny.link"), "https://tiny.link/abc123");
        assert_eq!(code.to_url("https://tiny.link/"), "https://tiny.link/abc123");
    }
}
