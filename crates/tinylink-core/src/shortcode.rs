use crate::error::CoreError;
use serde::{Deserialize, Serialize};
use std::fmt::Display;

/// Every short code is exactly this many characters long.
pub const CODE_LENGTH: usize = 6;

/// The base-62 alphabet short codes are drawn from, in digit order.
pub const ALPHABET: &[u8; 62] = b"0123456789ABCDEFGHIJKLMNOPQRSTUVWXYZabcdefghijklmnopqrstuvwxyz";

/// A validated short code identifying a shortened link.
///
/// Short codes are exactly [`CODE_LENGTH`] characters from [`ALPHABET`].
#[derive(Clone, Debug, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct ShortCode(String);

impl ShortCode {
    /// Creates a new `ShortCode` after validating the input.
    pub fn new(code: impl Into<String>) -> std::result::Result<Self, CoreError> {
        let code = code.into();
        Self::validate(&code)?;
        Ok(Self(code))
    }

    /// Creates a `ShortCode` without validation.
    ///
    /// Use this only for codes produced by trusted internal sources
    /// (e.g. the identifier generator, which always emits valid output).
    pub fn new_unchecked(code: impl Into<String>) -> Self {
        Self(code.into())
    }

    /// Generates the full shortened URL based on the provided base URL.
    pub fn to_url(&self, base_url: &str) -> String {
        format!("{}/{}", base_url.trim_end_matches('/'), self.0)
    }

    /// Parses user input that may carry the public base prefix,
    /// e.g. both `clck.ru/Ab3xY9` and `Ab3xY9` yield the same code.
    pub fn parse_with_base(input: &str, base_url: &str) -> std::result::Result<Self, CoreError> {
        let input = input.trim();
        let prefix = format!("{}/", base_url.trim_end_matches('/'));
        let code = input.strip_prefix(prefix.as_str()).unwrap_or(input);
        Self::new(code)
    }

    /// Returns the short code as a string slice.
    pub fn as_str(&self) -> &str {
        &self.0
    }

    fn validate(code: &str) -> std::result::Result<(), CoreError> {
        if code.len() != CODE_LENGTH {
            return Err(CoreError::InvalidShortCode(format!(
                "length must be {}, got {}",
                CODE_LENGTH,
                code.len()
            )));
        }

        if !code.bytes().all(|b| b.is_ascii_alphanumeric()) {
            return Err(CoreError::InvalidShortCode(format!(
                "must contain only base-62 characters: '{}'",
                code
            )));
        }

        Ok(())
    }
}

impl TryFrom<String> for ShortCode {
    type Error = CoreError;

    fn try_from(value: String) -> std::result::Result<Self, Self::Error> {
        Self::new(value)
    }
}

impl From<ShortCode> for String {
    fn from(code: ShortCode) -> Self {
        code.0
    }
}

impl Display for ShortCode {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(&self.0)
    }
}
