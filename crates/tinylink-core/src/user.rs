use crate::shortcode::ShortCode;
use crate::token::SessionToken;
use serde::{Deserialize, Serialize};

/// A registered account.
///
/// Field names on the wire match the `users.json` layout of earlier releases.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct User {
    pub login: String,
    /// Lowercase hex SHA-256 of the raw password bytes, unsalted.
    #[serde(rename = "passwordHash")]
    pub password_digest: String,
    #[serde(rename = "token")]
    pub session_token: SessionToken,
    /// Codes created by this user, in creation order.
    #[serde(rename = "shortLinks", default)]
    pub owned_codes: Vec<ShortCode>,
}

impl User {
    pub fn new(login: impl Into<String>, password_digest: impl Into<String>) -> Self {
        Self {
            login: login.into(),
            password_digest: password_digest.into(),
            session_token: SessionToken::generate(),
            owned_codes: Vec::new(),
        }
    }
}
