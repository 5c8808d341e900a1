use std::sync::Arc;
use std::thread;
use std::time::Duration;

use jiff::{SignedDuration, Timestamp};
use tempfile::TempDir;
use tinylink_core::{ManualClock, RecordingNotifier, ALPHABET, CODE_LENGTH, LINK_TTL};
use tinylink_generator::Base62Generator;
use tinylink_shortener::{ShortenerError, ShortenerService, Sweeper, SweeperSettings};
use tinylink_storage::{JsonFileStore, Persistence};

type Service = ShortenerService<Base62Generator, JsonFileStore>;

struct Fixture {
    dir: TempDir,
    clock: ManualClock,
    notifier: Arc<RecordingNotifier>,
    service: Arc<Service>,
}

impl Fixture {
    fn start() -> Self {
        let dir = tempfile::tempdir().expect("create temp dir");
        let clock = ManualClock::new("2026-03-01T08:30:00Z".parse().expect("timestamp"));
        let notifier = Arc::new(RecordingNotifier::new());
        let service = Arc::new(open_service(&dir, &clock, &notifier));

        Self {
            dir,
            clock,
            notifier,
            service,
        }
    }

    /// Opens a second service over the same data directory.
    fn reopen(&self) -> Service {
        open_service(&self.dir, &self.clock, &self.notifier)
    }
}

fn open_service(dir: &TempDir, clock: &ManualClock, notifier: &Arc<RecordingNotifier>) -> Service {
    ShortenerService::open(Base62Generator::new(), JsonFileStore::new(dir.path()))
        .expect("open service")
        .with_clock(clock.clone())
        .with_notifier(Arc::clone(notifier))
}

#[test]
fn end_to_end_session() {
    let fx = Fixture::start();
    let service = &fx.service;

    let token = service.register("alice", "pw1").unwrap();
    assert_eq!(service.authenticate("alice", "pw1").unwrap(), token);
    assert!(matches!(
        service.authenticate("alice", "nope"),
        Err(ShortenerError::InvalidCredentials)
    ));
    assert!(matches!(
        service.register("alice", "other"),
        Err(ShortenerError::AlreadyExists(login)) if login == "alice"
    ));

    let link = service
        .create_link(&token, "https://example.com/some/long/path?q=1", 2)
        .unwrap();
    assert_eq!(link.code.as_str().len(), CODE_LENGTH);
    assert!(link.code.as_str().bytes().all(|b| ALPHABET.contains(&b)));
    assert_eq!(link.expires_at.duration_since(link.created_at), LINK_TTL);
    assert_eq!(service.resolve(&link.code).unwrap().clicks_remaining, 2);

    assert_eq!(service.consume_click(&link.code).unwrap().clicks_remaining, 1);
    assert_eq!(service.consume_click(&link.code).unwrap().clicks_remaining, 0);
    assert!(matches!(
        service.consume_click(&link.code),
        Err(ShortenerError::QuotaExhausted(_))
    ));
    assert_eq!(fx.notifier.quota_exhausted_count(), 1);

    assert!(matches!(
        service.create_link(&token, "definitely not a url", 2),
        Err(ShortenerError::InvalidInput(_))
    ));
    assert_eq!(service.list_owned_codes(&token), vec![link.code]);
}

#[test]
fn state_survives_restart() {
    let fx = Fixture::start();

    let alice = fx.service.register("alice", "pw1").unwrap();
    let bob = fx.service.register("bob", "pw2").unwrap();
    let first = fx.service.create_link(&alice, "https://a.example", 3).unwrap();
    let second = fx.service.create_link(&bob, "https://b.example", 1).unwrap();
    fx.service.consume_click(&first.code).unwrap();

    let restored = fx.reopen();

    assert_eq!(restored.authenticate("alice", "pw1").unwrap(), alice);
    assert_eq!(restored.authenticate("bob", "pw2").unwrap(), bob);
    assert_eq!(restored.list_owned_codes(&alice), vec![first.code.clone()]);

    let reloaded = restored.resolve(&first.code).unwrap();
    assert_eq!(reloaded.clicks_remaining, 2);
    assert_eq!(reloaded.created_at, first.created_at);
    assert_eq!(reloaded.expires_at, first.expires_at);
    assert_eq!(restored.resolve(&second.code).unwrap().target_url, "https://b.example");

    let on_disk = JsonFileStore::new(fx.dir.path()).load().unwrap();
    assert_eq!(on_disk.users.len(), 2);
    assert_eq!(on_disk.links.len(), 2);
}

#[test]
fn links_live_exactly_one_day() {
    let fx = Fixture::start();
    let token = fx.service.register("alice", "pw1").unwrap();
    let link = fx.service.create_link(&token, "https://example.com", 5).unwrap();

    fx.clock.advance(LINK_TTL);
    assert!(fx.service.resolve(&link.code).is_ok());

    fx.clock.advance(SignedDuration::from_secs(1));
    assert!(matches!(
        fx.service.resolve(&link.code),
        Err(ShortenerError::Expired(_))
    ));
    assert!(matches!(
        fx.service.consume_click(&link.code),
        Err(ShortenerError::Expired(_))
    ));

    assert!(!fx.service.links().contains(&link.code));
    assert!(fx.service.list_owned_codes(&token).is_empty());
    assert_eq!(fx.notifier.expired_count(), 1);
    assert!(fx.reopen().links().is_empty());
}

#[test]
fn concurrent_clicks_spend_the_whole_quota() {
    const CLICKS: u32 = 64;

    let fx = Fixture::start();
    let token = fx.service.register("alice", "pw1").unwrap();
    let code = fx
        .service
        .create_link(&token, "https://example.com", CLICKS)
        .unwrap()
        .code;

    let handles: Vec<_> = (0..CLICKS)
        .map(|_| {
            let service = Arc::clone(&fx.service);
            let code = code.clone();
            thread::spawn(move || service.consume_click(&code).is_ok())
        })
        .collect();
    let accepted = handles
        .into_iter()
        .map(|h| h.join().unwrap())
        .filter(|ok| *ok)
        .count();

    assert_eq!(accepted, CLICKS as usize);
    assert_eq!(fx.service.links().get(&code).unwrap().clicks_remaining, 0);
    assert!(matches!(
        fx.service.consume_click(&code),
        Err(ShortenerError::QuotaExhausted(_))
    ));
    assert_eq!(fx.reopen().links().get(&code).unwrap().clicks_remaining, 0);
}

#[tokio::test]
async fn background_sweep_persists_removals() {
    let fx = Fixture::start();
    let token = fx.service.register("alice", "pw1").unwrap();
    let stale = fx.service.create_link(&token, "https://stale.example", 1).unwrap();

    fx.clock.set(Timestamp::from_second(stale.expires_at.as_second() + 60).unwrap());
    let fresh = fx.service.create_link(&token, "https://fresh.example", 1).unwrap();

    let sweeper = Sweeper::start(
        Arc::clone(&fx.service),
        SweeperSettings::builder()
            .interval(Duration::from_millis(10))
            .build(),
    );
    tokio::time::sleep(Duration::from_millis(200)).await;
    sweeper.shutdown().await;

    assert_eq!(fx.notifier.expired_count(), 1);
    assert_eq!(fx.service.list_owned_codes(&token), vec![fresh.code.clone()]);

    let restored = fx.reopen();
    assert!(!restored.links().contains(&stale.code));
    assert!(restored.links().contains(&fresh.code));
}
