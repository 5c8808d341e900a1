use crate::shortcode::ShortCode;
use crate::token::SessionToken;
use jiff::civil::DateTime;
use jiff::tz::TimeZone;
use jiff::{SignedDuration, Timestamp};
use serde::{Deserialize, Deserializer, Serialize};

/// Fixed time-to-live of every link, counted from its creation.
pub const LINK_TTL: SignedDuration = SignedDuration::from_hours(24);

/// A shortened link with its remaining click quota.
///
/// Field names on the wire match the `links.json` layout of earlier releases.
/// Timestamps are written as RFC 3339; the older zone-less local form
/// (`2024-05-01T10:00:00`) is still accepted on load.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Link {
    /// The original URL that was shortened.
    #[serde(rename = "originalUrl")]
    pub target_url: String,
    #[serde(rename = "shortCode")]
    pub code: ShortCode,
    /// Session token of the user who created the link.
    #[serde(rename = "creatorUUID")]
    pub owner: SessionToken,
    #[serde(rename = "clicksRemaining")]
    pub clicks_remaining: u32,
    #[serde(rename = "createdAt", deserialize_with = "timestamp_or_local")]
    pub created_at: Timestamp,
    /// Always `created_at + LINK_TTL`.
    #[serde(rename = "expiresAt", deserialize_with = "timestamp_or_local")]
    pub expires_at: Timestamp,
}

/// Reads an RFC 3339 timestamp, falling back to a civil date-time in the
/// system time zone.
fn timestamp_or_local<'de, D>(deserializer: D) -> Result<Timestamp, D::Error>
where
    D: Deserializer<'de>,
{
    let raw = String::deserialize(deserializer)?;
    if let Ok(ts) = raw.parse::<Timestamp>() {
        return Ok(ts);
    }

    raw.parse::<DateTime>()
        .and_then(|dt| dt.to_zoned(TimeZone::system()))
        .map(|zoned| zoned.timestamp())
        .map_err(|e| serde::de::Error::custom(format!("invalid timestamp '{}': {}", raw, e)))
}

/// Where a link stands in its lifecycle at a given instant.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LinkState {
    Active,
    /// The TTL has elapsed. Takes precedence over quota exhaustion.
    Expired,
    QuotaExhausted,
}

impl Link {
    /// Creates a link created at `now`, truncated to whole seconds.
    pub fn new(
        code: ShortCode,
        target_url: impl Into<String>,
        owner: SessionToken,
        click_limit: u32,
        now: Timestamp,
    ) -> Self {
        let created_at = now - SignedDuration::from_nanos(i64::from(now.subsec_nanosecond()));
        Self {
            target_url: target_url.into(),
            code,
            owner,
            clicks_remaining: click_limit,
            created_at,
            expires_at: created_at + LINK_TTL,
        }
    }

    pub fn is_expired_at(&self, now: Timestamp) -> bool {
        now > self.expires_at
    }

    pub fn is_exhausted(&self) -> bool {
        self.clicks_remaining == 0
    }

    pub fn state_at(&self, now: Timestamp) -> LinkState {
        if self.is_expired_at(now) {
            LinkState::Expired
        } else if self.is_exhausted() {
            LinkState::QuotaExhausted
        } else {
            LinkState::Active
        }
    }
}
