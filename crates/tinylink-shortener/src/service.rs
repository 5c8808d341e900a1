use crate::error::{Result, ShortenerError};
use crate::settings::{ServiceSettings, DEFAULT_BASE_URL};
use jiff::Timestamp;
use parking_lot::Mutex;
use std::sync::Arc;
use tinylink_core::{
    Clock, ConsoleNotifier, Link, LinkState, Notifier, SessionToken, ShortCode, SystemClock,
};
use tinylink_generator::Generator;
use tinylink_storage::{AccountStore, LinkStore, Persistence, Snapshot, StorageError};
use tracing::{debug, error, info, warn};
use url::Url;

/// Outcome of a click attempt, decided under the link's entry lock.
enum Click {
    Accepted(Link),
    Expired,
    Exhausted(SessionToken),
}

/// The link lifecycle engine.
///
/// Owns the account and link stores and drives every state change through
/// them:
/// - short code generation with collision retry
/// - expiry and quota checks on resolution, with atomic click accounting
/// - reclamation of expired links, always detaching them from their owner
/// - a synchronous flush to the persistence layer after each mutation
///
/// Flush failures are logged and swallowed; the in-memory state stays
/// authoritative for the running process.
pub struct ShortenerService<G, P> {
    accounts: AccountStore,
    links: LinkStore,
    generator: G,
    persistence: P,
    notifier: Arc<dyn Notifier>,
    clock: Arc<dyn Clock>,
    settings: ServiceSettings,
    flush_lock: Mutex<()>,
}

impl<G: Generator, P: Persistence> ShortenerService<G, P> {
    /// Restores the stores from `persistence` and builds a service around them.
    ///
    /// Uses the system clock, a console notifier and default settings;
    /// override them with the `with_*` methods.
    pub fn open(generator: G, persistence: P) -> Result<Self> {
        let snapshot = persistence.load()?;
        info!(
            users = snapshot.users.len(),
            links = snapshot.links.len(),
            "restored shortener state"
        );

        Ok(Self {
            accounts: AccountStore::from_snapshot(snapshot.users),
            links: LinkStore::from_snapshot(snapshot.links),
            generator,
            persistence,
            notifier: Arc::new(ConsoleNotifier::new(DEFAULT_BASE_URL)),
            clock: Arc::new(SystemClock),
            settings: ServiceSettings::default(),
            flush_lock: Mutex::new(()),
        })
    }

    pub fn with_notifier(mut self, notifier: impl Notifier) -> Self {
        self.notifier = Arc::new(notifier);
        self
    }

    pub fn with_clock(mut self, clock: impl Clock) -> Self {
        self.clock = Arc::new(clock);
        self
    }

    pub fn with_settings(mut self, settings: ServiceSettings) -> Self {
        self.settings = settings;
        self
    }

    pub fn accounts(&self) -> &AccountStore {
        &self.accounts
    }

    pub fn links(&self) -> &LinkStore {
        &self.links
    }

    pub fn persistence(&self) -> &P {
        &self.persistence
    }

    pub fn settings(&self) -> &ServiceSettings {
        &self.settings
    }

    /// Registers a new account and returns its session token.
    pub fn register(&self, login: &str, password: &str) -> Result<SessionToken> {
        if login.is_empty() || login.chars().any(char::is_whitespace) {
            return Err(ShortenerError::InvalidInput(
                "login must be a non-empty word".to_string(),
            ));
        }
        if password.is_empty() {
            return Err(ShortenerError::InvalidInput(
                "password cannot be empty".to_string(),
            ));
        }

        let user = self.accounts.register(login, password)?;
        info!(login = %user.login, "user registered");
        self.flush();
        Ok(user.session_token)
    }

    /// Returns the session token for matching credentials.
    pub fn authenticate(&self, login: &str, password: &str) -> Result<SessionToken> {
        self.accounts
            .authenticate(login, password)
            .ok_or(ShortenerError::InvalidCredentials)
    }

    /// Codes owned by the session's user, in creation order.
    pub fn list_owned_codes(&self, token: &SessionToken) -> Vec<ShortCode> {
        self.accounts.owned_codes(token)
    }

    /// Shortens `target_url` for the session's user.
    ///
    /// The link allows `click_limit` successful resolutions and expires one
    /// TTL after creation. A limit of zero creates a link that is exhausted
    /// from the start.
    pub fn create_link(
        &self,
        token: &SessionToken,
        target_url: &str,
        click_limit: u32,
    ) -> Result<Link> {
        let target_url = validate_url(target_url)?;
        if !self.accounts.contains(token) {
            return Err(ShortenerError::UnknownSession);
        }

        let now = self.clock.now();
        let attempts = self.settings.max_code_attempts;

        for attempt in 1..=attempts {
            let code = self.generator.generate(token);
            let link = Link::new(code, target_url.as_str(), *token, click_limit, now);

            match self.links.insert(link.clone()) {
                Ok(()) => {
                    self.accounts.attach_code(token, link.code.clone());
                    info!(
                        code = %link.code,
                        owner = %token,
                        clicks = click_limit,
                        expires_at = %link.expires_at,
                        "link created"
                    );
                    self.flush();
                    return Ok(link);
                }
                Err(StorageError::Conflict(code)) => {
                    debug!(%code, attempt, "short code collision, regenerating");
                }
                Err(other) => return Err(other.into()),
            }
        }

        warn!(attempts, owner = %token, "gave up generating a free short code");
        Err(ShortenerError::CodeGenerationExhausted { attempts })
    }

    /// Looks up a resolvable link without consuming a click.
    pub fn resolve(&self, code: &ShortCode) -> Result<Link> {
        let link = self
            .links
            .get(code)
            .ok_or_else(|| ShortenerError::NotFound(code.clone()))?;

        match link.state_at(self.clock.now()) {
            LinkState::Active => Ok(link),
            LinkState::Expired => Err(ShortenerError::Expired(code.clone())),
            LinkState::QuotaExhausted => Err(ShortenerError::QuotaExhausted(code.clone())),
        }
    }

    /// Spends one click on the link and returns it with the updated count.
    ///
    /// Existence, expiry and quota are checked in that order. An expired link
    /// is reclaimed on the spot; an exhausted one is left in place until it
    /// expires.
    pub fn consume_click(&self, code: &ShortCode) -> Result<Link> {
        let now = self.clock.now();

        let click = self
            .links
            .update(code, |link| match link.state_at(now) {
                LinkState::Active => {
                    link.clicks_remaining -= 1;
                    Click::Accepted(link.clone())
                }
                LinkState::Expired => Click::Expired,
                LinkState::QuotaExhausted => Click::Exhausted(link.owner),
            })
            .ok_or_else(|| ShortenerError::NotFound(code.clone()))?;

        match click {
            Click::Accepted(link) => {
                debug!(%code, remaining = link.clicks_remaining, "click accepted");
                self.flush();
                Ok(link)
            }
            Click::Expired => {
                if self.reclaim_expired(code, now) {
                    self.flush();
                }
                Err(ShortenerError::Expired(code.clone()))
            }
            Click::Exhausted(owner) => {
                debug!(%code, "click refused, quota exhausted");
                self.notifier.on_quota_exhausted(&owner, code);
                Err(ShortenerError::QuotaExhausted(code.clone()))
            }
        }
    }

    /// Deletes a link and detaches it from its owner.
    ///
    /// Returns the removed link; removing an unknown code is a no-op.
    pub fn remove(&self, code: &ShortCode) -> Option<Link> {
        let link = self.links.remove(code)?;
        self.accounts.detach_code(&link.owner, &link.code);
        info!(%code, owner = %link.owner, "link removed");
        self.flush();
        Some(link)
    }

    /// Links owned by the session's user, skipping codes no longer stored.
    pub fn list_for_user(&self, token: &SessionToken) -> Vec<Link> {
        self.accounts
            .owned_codes(token)
            .iter()
            .filter_map(|code| self.links.get(code))
            .collect()
    }

    /// Reclaims every expired link. Returns how many were removed.
    pub fn sweep_expired(&self) -> usize {
        let now = self.clock.now();
        let reclaimed = self
            .links
            .expired_codes(now)
            .iter()
            .filter(|code| self.reclaim_expired(code, now))
            .count();

        if reclaimed > 0 {
            self.flush();
        }
        reclaimed
    }

    /// Writes the current state to the persistence layer.
    ///
    /// Failures are logged, never returned.
    pub fn flush(&self) {
        let _guard = self.flush_lock.lock();
        let snapshot = Snapshot {
            users: self.accounts.snapshot(),
            links: self.links.snapshot(),
        };

        if let Err(e) = self.persistence.save(&snapshot) {
            error!(error = %e, "failed to persist state, in-memory state kept");
        }
    }

    /// Removes the link if it is still expired at `now`, detaches it and
    /// notifies the owner. Only the caller that actually removes it notifies.
    fn reclaim_expired(&self, code: &ShortCode, now: Timestamp) -> bool {
        let Some(link) = self.links.remove_if(code, |link| link.is_expired_at(now)) else {
            return false;
        };

        self.accounts.detach_code(&link.owner, &link.code);
        self.notifier.on_expired(&link.owner, &link.code);
        info!(%code, owner = %link.owner, "expired link reclaimed");
        true
    }
}

/// Checks that the URL is syntactically an absolute URL. No reachability check.
///
/// A scheme is required, so `www.example.com` is rejected.
fn validate_url(url: &str) -> Result<String> {
    let url = url.trim();
    if url.is_empty() {
        return Err(ShortenerError::InvalidInput(
            "URL cannot be empty".to_string(),
        ));
    }

    Url::parse(url)
        .map_err(|e| ShortenerError::InvalidInput(format!("malformed URL '{}': {}", url, e)))?;
    Ok(url.to_string())
}
