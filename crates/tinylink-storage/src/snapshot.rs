use crate::error::Result;
use std::collections::BTreeMap;
use tinylink_core::{Link, SessionToken, ShortCode, User};

/// The full durable state: every account and every link.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Snapshot {
    pub users: BTreeMap<SessionToken, User>,
    pub links: BTreeMap<ShortCode, Link>,
}

/// Durable storage for [`Snapshot`]s.
///
/// `load` is called once at startup; a store with nothing saved yet loads as
/// an empty snapshot. `save` replaces the stored state with the given one.
pub trait Persistence: Send + Sync + 'static {
    fn load(&self) -> Result<Snapshot>;

    fn save(&self, snapshot: &Snapshot) -> Result<()>;
}
