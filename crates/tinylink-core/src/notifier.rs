use crate::shortcode::ShortCode;
use crate::token::SessionToken;
use parking_lot::Mutex;

/// Receives lifecycle events for links.
///
/// Calls are fire-and-forget: each event is delivered once, never retried,
/// and an implementation must not fail or block the operation that raised it.
pub trait Notifier: Send + Sync + 'static {
    /// A link reached its expiry time and was reclaimed.
    fn on_expired(&self, owner: &SessionToken, code: &ShortCode);

    /// A resolution was refused because the link has no clicks left.
    fn on_quota_exhausted(&self, owner: &SessionToken, code: &ShortCode);
}

/// Prints notices to stdout, addressed by the public short URL.
#[derive(Debug, Clone)]
pub struct ConsoleNotifier {
    base_url: String,
}

impl ConsoleNotifier {
    pub fn new(base_url: impl Into<String>) -> Self {
        Self {
            base_url: base_url.into(),
        }
    }
}

impl Notifier for ConsoleNotifier {
    fn on_expired(&self, owner: &SessionToken, code: &ShortCode) {
        println!(
            "[notice] {}: link {} has expired and is no longer available",
            owner,
            code.to_url(&self.base_url)
        );
    }

    fn on_quota_exhausted(&self, owner: &SessionToken, code: &ShortCode) {
        println!(
            "[notice] {}: link {} has used up its click limit",
            owner,
            code.to_url(&self.base_url)
        );
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Notification {
    Expired {
        owner: SessionToken,
        code: ShortCode,
    },
    QuotaExhausted {
        owner: SessionToken,
        code: ShortCode,
    },
}

/// Keeps every event in memory, in delivery order.
#[derive(Debug, Default)]
pub struct RecordingNotifier {
    events: Mutex<Vec<Notification>>,
}

impl RecordingNotifier {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn events(&self) -> Vec<Notification> {
        self.events.lock().clone()
    }

    pub fn expired_count(&self) -> usize {
        self.events
            .lock()
            .iter()
            .filter(|e| matches!(e, Notification::Expired { .. }))
            .count()
    }

    pub fn quota_exhausted_count(&self) -> usize {
        self.events
            .lock()
            .iter()
            .filter(|e| matches!(e, Notification::QuotaExhausted { .. }))
            .count()
    }
}

impl Notifier for RecordingNotifier {
    fn on_expired(&self, owner: &SessionToken, code: &ShortCode) {
        self.events.lock().push(Notification::Expired {
            owner: *owner,
            code: code.clone(),
        });
    }

    fn on_quota_exhausted(&self, owner: &SessionToken, code: &ShortCode) {
        self.events.lock().push(Notification::QuotaExhausted {
            owner: *owner,
            code: code.clone(),
        });
    }
}

/// Lets a shared handle be given to the service while the caller keeps one.
impl<N: Notifier> Notifier for std::sync::Arc<N> {
    fn on_expired(&self, owner: &SessionToken, code: &ShortCode) {
        (**self).on_expired(owner, code)
    }

    fn on_quota_exhausted(&self, owner: &SessionToken, code: &ShortCode) {
        (**self).on_quota_exhausted(owner, code)
    }
}
