use std::time::Duration;
use typed_builder::TypedBuilder;

/// Public prefix short codes are shown under.
pub const DEFAULT_BASE_URL: &str = "clck.ru";
pub const DEFAULT_MAX_CODE_ATTEMPTS: usize = 16;
pub const DEFAULT_SWEEP_INTERVAL: Duration = Duration::from_secs(5 * 60);

/// Configures a [`ShortenerService`](crate::ShortenerService).
#[derive(Debug, Clone, TypedBuilder)]
pub struct ServiceSettings {
    /// How many generated codes to try before giving up on a collision streak.
    #[builder(default = DEFAULT_MAX_CODE_ATTEMPTS)]
    pub max_code_attempts: usize,
}

impl Default for ServiceSettings {
    fn default() -> Self {
        Self::builder().build()
    }
}

/// Configures the background [`Sweeper`](crate::Sweeper).
#[derive(Debug, Clone, Copy, TypedBuilder)]
pub struct SweeperSettings {
    /// Time between sweeps. The first sweep runs one interval after start.
    #[builder(default = DEFAULT_SWEEP_INTERVAL)]
    pub interval: Duration,
}

impl Default for SweeperSettings {
    fn default() -> Self {
        Self::builder().build()
    }
}
