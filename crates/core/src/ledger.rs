//! Persisted set of post identifiers that were already delivered.
//!
//! The ledger is a JSON array of strings. Every insert re-reads the file,
//! adds the id, and replaces the file atomically (temp file + rename), so a
//! crash after N deliveries never loses the first N entries.
//!
//! There is no cross-process locking: two relays must not share a ledger
//! path at the same time.

use std::collections::HashSet;
use std::fs;
use std::io::{self, Write};
use std::path::{Path, PathBuf};

use tempfile::NamedTempFile;

use crate::{RelayError, Result};

/// Reads the identifier set stored at `path`.
///
/// A missing file is an empty ledger. Content that is not a JSON array of
/// strings yields [`RelayError::CorruptLedger`].
pub fn load_sent_ids(path: impl AsRef<Path>) -> Result<HashSet<String>> {
    let path = path.as_ref();
    let data = match fs::read_to_string(path) {
        Ok(data) => data,
        Err(e) if e.kind() == io::ErrorKind::NotFound => return Ok(HashSet::new()),
        Err(e) => return Err(e.into()),
    };

    let ids: Vec<String> =
        serde_json::from_str(&data).map_err(|source| RelayError::CorruptLedger { path: path.to_path_buf(), source })?;
    Ok(ids.into_iter().collect())
}

/// Adds `id` to the ledger at `path`, rewriting the file in full.
///
/// Recording an id that is already present succeeds without touching the
/// file. Returns `true` when the file was rewritten.
pub fn record_sent(path: impl AsRef<Path>, id: &str) -> Result<bool> {
    let path = path.as_ref();
    let mut ids = load_sent_ids(path)?;
    if !ids.insert(id.to_string()) {
        return Ok(false);
    }
    persist(path, &ids)?;
    Ok(true)
}

/// Replaces the file at `path` with the serialized set.
fn persist(path: &Path, ids: &HashSet<String>) -> Result<()> {
    let mut sorted: Vec<&String> = ids.iter().collect();
    sorted.sort();
    let json = serde_json::to_string_pretty(&sorted).map_err(|e| RelayError::SerializeError(e.to_string()))?;

    let dir = match path.parent() {
        Some(parent) if !parent.as_os_str().is_empty() => parent,
        _ => Path::new("."),
    };
    let mut tmp = NamedTempFile::new_in(dir)?;
    tmp.write_all(json.as_bytes())?;
    tmp.as_file().sync_all()?;
    tmp.persist(path).map_err(|e| RelayError::WriteError(e.error))?;
    Ok(())
}

/// In-memory view of a ledger file with write-through inserts.
///
/// The orchestrator owns one `Ledger` per run and is its only writer.
#[derive(Debug, Clone)]
pub struct Ledger {
    path: PathBuf,
    ids: HashSet<String>,
}

impl Ledger {
    /// Loads the ledger stored at `path`, empty if the file does not exist.
    pub fn load(path: impl Into<PathBuf>) -> Result<Self> {
        let path = path.into();
        let ids = load_sent_ids(&path)?;
        tracing::debug!(path = %path.display(), count = ids.len(), "loaded sent-ledger");
        Ok(Self { path, ids })
    }

    pub fn contains(&self, id: &str) -> bool {
        self.ids.contains(id)
    }

    pub fn len(&self) -> usize {
        self.ids.len()
    }

    pub fn is_empty(&self) -> bool {
        self.ids.is_empty()
    }

    /// Records a delivered post and persists it before returning.
    ///
    /// The in-memory set is updated even when the write fails, so the same
    /// post is not delivered twice within this run; the next successful
    /// insert writes it to disk along with the rest of the file.
    pub fn record_sent(&mut self, id: &str) -> Result<bool> {
        if self.ids.contains(id) {
            return Ok(false);
        }
        self.ids.insert(id.to_string());

        let mut on_disk = load_sent_ids(&self.path)?;
        on_disk.extend(self.ids.iter().cloned());
        persist(&self.path, &on_disk)?;
        self.ids = on_disk;
        Ok(true)
    }
}
