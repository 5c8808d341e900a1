//! JSON file persistence.
//!
//! The data directory holds two independent documents:
//!
//! ```text
//! <data_dir>/
//! ├── users.json   # { "<token>": User, ... }
//! └── links.json   # { "<code>": Link, ... }
//! ```
//!
//! Each document is written to a `.tmp` sibling first and renamed into place,
//! so a crash mid-write leaves the previous version intact.

use crate::error::{Result, StorageError};
use crate::snapshot::{Persistence, Snapshot};
use serde::de::DeserializeOwned;
use serde::Serialize;
use std::io::ErrorKind;
use std::path::{Path, PathBuf};
use tracing::{debug, info};

pub const USERS_FILE: &str = "users.json";
pub const LINKS_FILE: &str = "links.json";

#[derive(Debug, Clone)]
pub struct JsonFileStore {
    dir: PathBuf,
}

impl JsonFileStore {
    pub fn new(dir: impl Into<PathBuf>) -> Self {
        Self { dir: dir.into() }
    }

    pub fn dir(&self) -> &Path {
        &self.dir
    }

    pub fn users_path(&self) -> PathBuf {
        self.dir.join(USERS_FILE)
    }

    pub fn links_path(&self) -> PathBuf {
        self.dir.join(LINKS_FILE)
    }
}

fn read_document<T: DeserializeOwned + Default>(path: &Path) -> Result<T> {
    let content = match std::fs::read_to_string(path) {
        Ok(content) => content,
        Err(e) if e.kind() == ErrorKind::NotFound => {
            debug!(path = %path.display(), "no stored document, starting empty");
            return Ok(T::default());
        }
        Err(e) => {
            return Err(StorageError::Io(format!(
                "failed to read {}: {}",
                path.display(),
                e
            )))
        }
    };

    if content.trim().is_empty() {
        return Ok(T::default());
    }

    serde_json::from_str(&content).map_err(|e| {
        StorageError::InvalidData(format!("failed to parse {}: {}", path.display(), e))
    })
}

fn write_document<T: Serialize>(path: &Path, value: &T) -> Result<()> {
    let json = serde_json::to_vec_pretty(value).map_err(|e| {
        StorageError::InvalidData(format!("failed to encode {}: {}", path.display(), e))
    })?;

    let mut tmp = path.as_os_str().to_owned();
    tmp.push(".tmp");
    let tmp = PathBuf::from(tmp);

    std::fs::write(&tmp, json)
        .and_then(|()| std::fs::rename(&tmp, path))
        .map_err(|e| StorageError::Io(format!("failed to write {}: {}", path.display(), e)))
}

impl Persistence for JsonFileStore {
    fn load(&self) -> Result<Snapshot> {
        let snapshot = Snapshot {
            users: read_document(&self.users_path())?,
            links: read_document(&self.links_path())?,
        };
        info!(
            dir = %self.dir.display(),
            users = snapshot.users.len(),
            links = snapshot.links.len(),
            "loaded stored state"
        );
        Ok(snapshot)
    }

    fn save(&self, snapshot: &Snapshot) -> Result<()> {
        std::fs::create_dir_all(&self.dir).map_err(|e| {
            StorageError::Io(format!("failed to create {}: {}", self.dir.display(), e))
        })?;
        write_document(&self.users_path(), &snapshot.users)?;
        write_document(&self.links_path(), &snapshot.links)?;
        debug!(
            users = snapshot.users.len(),
            links = snapshot.links.len(),
            "saved state"
        );
        Ok(())
    }
}
