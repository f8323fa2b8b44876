//! Submission ledger: which postings have already been terminally handled.
//!
//! Persisted as a JSON array of posting ids in insertion order, rewritten in
//! full on every append. Good enough for a single-writer bot; the interesting
//! property is the invariant that an id lands here if and only if the
//! pipeline reached a terminal decision for it.

use std::collections::HashSet;
use std::fs;
use std::path::{Path, PathBuf};

use crate::error::AppError;
use crate::traits::Ledger;

/// File-backed ledger. Loads once at construction; a missing or unparsable
/// file starts an empty ledger rather than failing the run.
pub struct JsonFileLedger {
    path: PathBuf,
    ids: Vec<String>,
    index: HashSet<String>,
}

impl JsonFileLedger {
    pub fn open(path: impl Into<PathBuf>) -> Self {
        let path = path.into();
        let ids: Vec<String> = match fs::read_to_string(&path) {
            Ok(raw) => serde_json::from_str(&raw).unwrap_or_else(|e| {
                tracing::warn!(path = %path.display(), error = %e, "Ledger file unparsable, starting empty");
                Vec::new()
            }),
            Err(_) => Vec::new(),
        };
        let index = ids.iter().cloned().collect();
        Self { path, ids, index }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    fn persist(&self) -> Result<(), AppError> {
        let json = serde_json::to_string_pretty(&self.ids)?;
        fs::write(&self.path, json)
            .map_err(|e| AppError::Ledger(format!("failed to write {}: {e}", self.path.display())))
    }
}

impl Ledger for JsonFileLedger {
    fn contains(&self, id: &str) -> bool {
        self.index.contains(id)
    }

    fn append(&mut self, id: &str) -> Result<(), AppError> {
        if !self.index.insert(id.to_string()) {
            return Ok(());
        }
        self.ids.push(id.to_string());
        self.persist()
    }

    fn ids(&self) -> &[String] {
        &self.ids
    }
}

/// In-memory ledger for tests.
#[derive(Debug, Default, Clone)]
pub struct MemoryLedger {
    ids: Vec<String>,
    index: HashSet<String>,
}

impl MemoryLedger {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_ids(ids: impl IntoIterator<Item = impl Into<String>>) -> Self {
        let mut ledger = Self::new();
        for id in ids {
            let id = id.into();
            if ledger.index.insert(id.clone()) {
                ledger.ids.push(id);
            }
        }
        ledger
    }
}

impl Ledger for MemoryLedger {
    fn contains(&self, id: &str) -> bool {
        self.index.contains(id)
    }

    fn append(&mut self, id: &str) -> Result<(), AppError> {
        if self.index.insert(id.to_string()) {
            self.ids.push(id.to_string());
        }
        Ok(())
    }

    fn ids(&self) -> &[String] {
        &self.ids
    }
}
