//! Revision table: the persisted result of a fleet resolution.
//!
//! Stored as a JSON array of `{platform, architecture?, revision}` with the
//! revision written as a string and four-space indentation, matching the
//! `operationSystemRevisions.json` files older tooling reads.

use std::path::Path;

use serde::{Deserialize, Serialize};

use crate::error::PersistError;
use crate::platform::PlatformDescriptor;
use crate::resolver::ResolutionResult;
use crate::storage;
use crate::Revision;

/// One resolution per fleet entry, in fleet order.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct RevisionTable {
    entries: Vec<ResolutionResult>,
}

impl RevisionTable {
    pub(crate) fn new(entries: Vec<ResolutionResult>) -> Self {
        Self { entries }
    }

    pub fn entries(&self) -> &[ResolutionResult] {
        &self.entries
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn revision_for(&self, descriptor: &PlatformDescriptor) -> Option<Revision> {
        self.entries
            .iter()
            .find(|e| &e.descriptor == descriptor)
            .map(|e| e.revision)
    }

    pub fn to_json(&self) -> Result<Vec<u8>, PersistError> {
        let mut out = Vec::new();
        let fmt = serde_json::ser::PrettyFormatter::with_indent(b"    ");
        let mut ser = serde_json::Serializer::with_formatter(&mut out, fmt);
        self.serialize(&mut ser).map_err(PersistError::Encode)?;
        out.push(b'\n');
        Ok(out)
    }

    /// Writes the table atomically (sibling temp file + rename).
    pub fn save_to_path(&self, path: &Path) -> Result<(), PersistError> {
        let json = self.to_json()?;
        storage::write_atomic(path, &json).map_err(|source| PersistError::Write {
            path: path.to_path_buf(),
            source,
        })
    }

    pub fn load_from_path(path: &Path) -> Result<Self, PersistError> {
        let bytes = std::fs::read(path).map_err(|source| PersistError::Read {
            path: path.to_path_buf(),
            source,
        })?;
        serde_json::from_slice(&bytes).map_err(|source| PersistError::Decode {
            path: path.to_path_buf(),
            source,
        })
    }
}

/// Where a finished table goes.
pub trait TableSink: Send + Sync {
    fn persist(&self, table: &RevisionTable) -> Result<(), PersistError>;
}

/// Persists the table as a JSON file.
#[derive(Debug, Clone)]
pub struct JsonFileSink {
    path: std::path::PathBuf,
}

impl JsonFileSink {
    pub fn new(path: impl Into<std::path::PathBuf>) -> Self {
        Self { path: path.into() }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }
}

impl TableSink for JsonFileSink {
    fn persist(&self, table: &RevisionTable) -> Result<(), PersistError> {
        table.save_to_path(&self.path)?;
        tracing::info!(path = %self.path.display(), entries = table.len(), "revision table written");
        Ok(())
    }
}

/// Serde adapter: revision as a JSON string, accepting either string or number on read.
pub(crate) mod revision_string {
    use serde::{Deserialize, Deserializer, Serializer};

    use crate::Revision;

    pub fn serialize<S: Serializer>(rev: &Revision, s: S) -> Result<S::Ok, S::Error> {
        s.collect_str(rev)
    }

    #[derive(Deserialize)]
    #[serde(untagged)]
    enum Raw {
        Num(Revision),
        Str(String),
    }

    pub fn deserialize<'de, D: Deserializer<'de>>(d: D) -> Result<Revision, D::Error> {
        match Raw::deserialize(d)? {
            Raw::Num(n) => Ok(n),
            Raw::Str(s) => s.trim().parse().map_err(serde::de::Error::custom),
        }
    }
}
