use crate::error::Result;
use crate::snapshot::{Persistence, Snapshot};
use parking_lot::Mutex;
use std::sync::atomic::{AtomicUsize, Ordering};

/// Keeps the last saved snapshot in memory.
///
/// Nothing survives the process; useful for ephemeral runs and for
/// observing what a service flushed.
#[derive(Debug, Default)]
pub struct MemoryStore {
    snapshot: Mutex<Snapshot>,
    saves: AtomicUsize,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Creates a store that loads `snapshot` as if it had been saved before.
    pub fn with_snapshot(snapshot: Snapshot) -> Self {
        Self {
            snapshot: Mutex::new(snapshot),
            saves: AtomicUsize::new(0),
        }
    }

    /// The most recently saved snapshot.
    pub fn current(&self) -> Snapshot {
        self.snapshot.lock().clone()
    }

    /// How many times `save` has been called.
    pub fn save_count(&self) -> usize {
        self.saves.load(Ordering::SeqCst)
    }
}

impl Persistence for MemoryStore {
    fn load(&self) -> Result<Snapshot> {
        Ok(self.current())
    }

    fn save(&self, snapshot: &Snapshot) -> Result<()> {
        *self.snapshot.lock() = snapshot.clone();
        self.saves.fetch_add(1, Ordering::SeqCst);
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tinylink_core::User;

    #[test]
    fn save_replaces_and_counts() {
        let store = MemoryStore::new();
        assert_eq!(store.load().unwrap(), Snapshot::default());

        let mut snapshot = Snapshot::default();
        let user = User::new("alice", "digest");
        snapshot.users.insert(user.session_token, user);

        store.save(&snapshot).unwrap();
        store.save(&snapshot).unwrap();

        assert_eq!(store.load().unwrap(), snapshot);
        assert_eq!(store.save_count(), 2);
    }
}
