//! Account and link stores, and their durable snapshots.

pub mod account;
pub mod error;
pub mod json;
pub mod link;
pub mod memory;
pub mod snapshot;

pub use account::{digest_password, AccountStore};
pub use error::{Result, StorageError};
pub use json::JsonFileStore;
pub use link::LinkStore;
pub use memory::MemoryStore;
pub use snapshot::{Persistence, Snapshot};
