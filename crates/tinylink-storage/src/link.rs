use crate::error::{Result, StorageError};
use dashmap::mapref::entry::Entry;
use dashmap::DashMap;
use jiff::Timestamp;
use std::collections::BTreeMap;
use tinylink_core::{Link, ShortCode};

/// In-memory link table keyed by short code.
///
/// DashMap provides better concurrency than RwLock<HashMap> because it
/// uses sharded locks, allowing concurrent reads and writes to different
/// codes without blocking. Every operation on a single code is linearizable.
#[derive(Debug, Default)]
pub struct LinkStore {
    links: DashMap<ShortCode, Link>,
}

impl LinkStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Rebuilds the store from persisted links.
    pub fn from_snapshot(links: impl IntoIterator<Item = (ShortCode, Link)>) -> Self {
        Self {
            links: links.into_iter().collect(),
        }
    }

    /// Inserts a new link. Returns `Err(Conflict)` if the code is already taken,
    /// even by an expired link; existing links are never overwritten.
    pub fn insert(&self, link: Link) -> Result<()> {
        match self.links.entry(link.code.clone()) {
            Entry::Occupied(_) => Err(StorageError::Conflict(link.code)),
            Entry::Vacant(slot) => {
                slot.insert(link);
                Ok(())
            }
        }
    }

    pub fn get(&self, code: &ShortCode) -> Option<Link> {
        self.links.get(code).map(|link| link.clone())
    }

    pub fn contains(&self, code: &ShortCode) -> bool {
        self.links.contains_key(code)
    }

    /// Runs `f` on the link while holding its entry exclusively.
    ///
    /// Returns `None` if the code does not exist. `f` must not call back
    /// into this store.
    pub fn update<R>(&self, code: &ShortCode, f: impl FnOnce(&mut Link) -> R) -> Option<R> {
        self.links.get_mut(code).map(|mut link| f(&mut link))
    }

    /// Removes the link. Removing an absent code returns `None`.
    pub fn remove(&self, code: &ShortCode) -> Option<Link> {
        self.links.remove(code).map(|(_, link)| link)
    }

    /// Removes the link only if `predicate` holds for it at removal time.
    pub fn remove_if(&self, code: &ShortCode, predicate: impl FnOnce(&Link) -> bool) -> Option<Link> {
        self.links
            .remove_if(code, |_, link| predicate(link))
            .map(|(_, link)| link)
    }

    /// Codes of every link whose expiry time is before `now`.
    pub fn expired_codes(&self, now: Timestamp) -> Vec<ShortCode> {
        self.links
            .iter()
            .filter(|entry| entry.value().is_expired_at(now))
            .map(|entry| entry.key().clone())
            .collect()
    }

    pub fn len(&self) -> usize {
        self.links.len()
    }

    pub fn is_empty(&self) -> bool {
        self.links.is_empty()
    }

    pub fn snapshot(&self) -> BTreeMap<ShortCode, Link> {
        self.links
            .iter()
            .map(|entry| (entry.key().clone(), entry.value().clone()))
            .collect()
    }
}
