//! Error taxonomy shared by the prober, resolver, fleet and fetcher.
//!
//! `TransportError::NotFound` is the expected negative signal and is absorbed
//! by the revision search. Every other variant ends the search it occurs in.

use std::path::PathBuf;

use crate::platform::PlatformDescriptor;
use crate::Revision;

/// Outcome of a single request against the archive server.
#[derive(Debug, thiserror::Error)]
pub enum TransportError {
    #[error("archive not found: {url}")]
    NotFound { url: String },
    #[error("{url} returned HTTP {code}")]
    Http { url: String, code: u32 },
    #[error("request to {url} failed: {source}")]
    Curl {
        url: String,
        #[source]
        source: curl::Error,
    },
    #[error("storage: {0}")]
    Storage(#[source] std::io::Error),
    #[error("request cancelled")]
    Cancelled,
    #[error("transport task failed: {0}")]
    Task(String),
}

impl TransportError {
    pub fn is_not_found(&self) -> bool {
        matches!(self, TransportError::NotFound { .. })
    }
}

/// Terminal failure of a revision search (resolver, fleet or fetcher).
#[derive(Debug, thiserror::Error)]
pub enum SearchError {
    #[error(
        "[{descriptor}] archive cannot be found: tried revisions {first_revision} down to {last_revision} ({attempts} attempts)"
    )]
    RevisionExhausted {
        descriptor: PlatformDescriptor,
        first_revision: Revision,
        last_revision: Revision,
        attempts: u32,
    },
    #[error("[{descriptor}] revision {revision}, attempt #{attempt}: {source}")]
    Transport {
        descriptor: PlatformDescriptor,
        revision: Revision,
        attempt: u32,
        #[source]
        source: TransportError,
    },
    #[error("[{descriptor}] listed more than once in the fleet")]
    DuplicateDescriptor { descriptor: PlatformDescriptor },
    #[error("temporary destination: {0}")]
    TempFile(#[source] std::io::Error),
    #[error("search task failed: {0}")]
    Task(String),
}

impl SearchError {
    /// The descriptor the failure belongs to, when it is tied to one.
    pub fn descriptor(&self) -> Option<PlatformDescriptor> {
        match self {
            SearchError::RevisionExhausted { descriptor, .. }
            | SearchError::Transport { descriptor, .. }
            | SearchError::DuplicateDescriptor { descriptor } => Some(*descriptor),
            SearchError::TempFile(_) | SearchError::Task(_) => None,
        }
    }
}

/// Writing or reading a revision table failed.
#[derive(Debug, thiserror::Error)]
pub enum PersistError {
    #[error("write revision table {}: {source}", path.display())]
    Write {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
    #[error("read revision table {}: {source}", path.display())]
    Read {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
    #[error("encode revision table: {0}")]
    Encode(#[source] serde_json::Error),
    #[error("parse revision table {}: {source}", path.display())]
    Decode {
        path: PathBuf,
        #[source]
        source: serde_json::Error,
    },
}

/// Failure of the discover-and-persist workflow.
#[derive(Debug, thiserror::Error)]
pub enum DiscoverError {
    #[error(transparent)]
    Search(#[from] SearchError),
    #[error(transparent)]
    Persist(#[from] PersistError),
}
