use crate::error::{Result, StorageError};
use dashmap::mapref::entry::Entry;
use dashmap::DashMap;
use sha2::{Digest, Sha256};
use std::collections::BTreeMap;
use tinylink_core::{SessionToken, ShortCode, User};
use tracing::{debug, warn};

/// Digests a password as lowercase hex SHA-256 of its raw bytes.
///
/// Unsalted and fast; kept for compatibility with stored accounts.
pub fn digest_password(password: &str) -> String {
    hex::encode(Sha256::digest(password.as_bytes()))
}

/// Registered users keyed by session token, plus a login index.
///
/// The login index makes registration atomic per login: two concurrent
/// registrations of the same login cannot both succeed.
#[derive(Debug, Default)]
pub struct AccountStore {
    users: DashMap<SessionToken, User>,
    logins: DashMap<String, SessionToken>,
}

impl AccountStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Rebuilds the store from persisted users.
    pub fn from_snapshot(users: impl IntoIterator<Item = (SessionToken, User)>) -> Self {
        let store = Self::new();
        for (token, user) in users {
            if let Some(previous) = store.logins.insert(user.login.clone(), token) {
                warn!(login = %user.login, %previous, "duplicate login in stored accounts");
            }
            store.users.insert(token, user);
        }
        store
    }

    /// Registers a new user with a fresh session token.
    ///
    /// Returns `Err(LoginTaken)` if the login is already registered.
    pub fn register(&self, login: &str, password: &str) -> Result<User> {
        match self.logins.entry(login.to_owned()) {
            Entry::Occupied(_) => Err(StorageError::LoginTaken(login.to_owned())),
            Entry::Vacant(slot) => {
                let user = User::new(login, digest_password(password));
                slot.insert(user.session_token);
                self.users.insert(user.session_token, user.clone());
                debug!(login = %user.login, "registered user");
                Ok(user)
            }
        }
    }

    /// Returns the stored token if the login exists and the password matches.
    pub fn authenticate(&self, login: &str, password: &str) -> Option<SessionToken> {
        let token = *self.logins.get(login)?;
        let user = self.users.get(&token)?;
        (user.password_digest == digest_password(password)).then_some(token)
    }

    pub fn get(&self, token: &SessionToken) -> Option<User> {
        self.users.get(token).map(|user| user.clone())
    }

    pub fn contains(&self, token: &SessionToken) -> bool {
        self.users.contains_key(token)
    }

    /// Codes owned by the user in creation order; empty for unknown tokens.
    pub fn owned_codes(&self, token: &SessionToken) -> Vec<ShortCode> {
        self.users
            .get(token)
            .map(|user| user.owned_codes.clone())
            .unwrap_or_default()
    }

    /// Appends a code to the user's owned list. Unknown tokens are ignored.
    pub fn attach_code(&self, token: &SessionToken, code: ShortCode) {
        match self.users.get_mut(token) {
            Some(mut user) => user.owned_codes.push(code),
            None => debug!(%token, %code, "attach to unknown user ignored"),
        }
    }

    /// Removes a code from the user's owned list.
    /// Returns `true` if the code was listed.
    pub fn detach_code(&self, token: &SessionToken, code: &ShortCode) -> bool {
        let Some(mut user) = self.users.get_mut(token) else {
            return false;
        };
        let before = user.owned_codes.len();
        user.owned_codes.retain(|owned| owned != code);
        user.owned_codes.len() != before
    }

    pub fn len(&self) -> usize {
        self.users.len()
    }

    pub fn is_empty(&self) -> bool {
        self.users.is_empty()
    }

    pub fn snapshot(&self) -> BTreeMap<SessionToken, User> {
        self.users
            .iter()
            .map(|entry| (*entry.key(), entry.value().clone()))
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Arc;

    fn code(s: &str) -> ShortCode {
        ShortCode::new_unchecked(s)
    }

    #[test]
    fn digest_is_lowercase_hex_sha256() {
        assert_eq!(
            digest_password("abc"),
            "ba7816bf8f01cfea414140de5dae2223b00361a396177a9cb410ff61f20015ad"
        );
        assert_eq!(digest_password("").len(), 64);
    }

    #[test]
    fn register_and_authenticate() {
        let store = AccountStore::new();
        let user = store.register("alice", "pw1").unwrap();

        assert_eq!(store.authenticate("alice", "pw1"), Some(user.session_token));
        assert_eq!(store.authenticate("alice", "wrong"), None);
        assert_eq!(store.authenticate("bob", "pw1"), None);
        assert_eq!(user.password_digest, digest_password("pw1"));
    }

    #[test]
    fn duplicate_login_is_rejected() {
        let store = AccountStore::new();
        store.register("alice", "pw1").unwrap();

        let err = store.register("alice", "other").unwrap_err();
        assert!(matches!(err, StorageError::LoginTaken(login) if login == "alice"));
        assert_eq!(store.len(), 1);
        assert!(store.authenticate("alice", "other").is_none());
    }

    #[test]
    fn concurrent_registration_of_same_login() {
        let store = Arc::new(AccountStore::new());

        let handles: Vec<_> = (0..8)
            .map(|i| {
                let store = Arc::clone(&store);
                std::thread::spawn(move || store.register("carol", &format!("pw{i}")).is_ok())
            })
            .collect();

        let successes = handles
            .into_iter()
            .map(|h| h.join().unwrap())
            .filter(|ok| *ok)
            .count();

        assert_eq!(successes, 1);
        assert_eq!(store.len(), 1);
    }

    #[test]
    fn attach_and_detach_codes() {
        let store = AccountStore::new();
        let token = store.register("alice", "pw1").unwrap().session_token;

        store.attach_code(&token, code("aaaaaa"));
        store.attach_code(&token, code("bbbbbb"));
        assert_eq!(store.owned_codes(&token), vec![code("aaaaaa"), code("bbbbbb")]);

        assert!(store.detach_code(&token, &code("aaaaaa")));
        assert!(!store.detach_code(&token, &code("aaaaaa")));
        assert_eq!(store.owned_codes(&token), vec![code("bbbbbb")]);
    }

    #[test]
    fn unknown_token_is_tolerated() {
        let store = AccountStore::new();
        let stranger = SessionToken::generate();

        store.attach_code(&stranger, code("aaaaaa"));
        assert!(store.owned_codes(&stranger).is_empty());
        assert!(!store.detach_code(&stranger, &code("aaaaaa")));
        assert!(store.is_empty());
    }

    #[test]
    fn snapshot_restores_login_index() {
        let store = AccountStore::new();
        let token = store.register("alice", "pw1").unwrap().session_token;
        store.attach_code(&token, code("aaaaaa"));

        let restored = AccountStore::from_snapshot(store.snapshot());

        assert_eq!(restored.authenticate("alice", "pw1"), Some(token));
        assert_eq!(restored.owned_codes(&token), vec![code("aaaaaa")]);
        assert!(restored.register("alice", "pw2").is_err());
    }
}
