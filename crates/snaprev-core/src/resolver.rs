//! Bounded backward revision search for one platform.
//!
//! Archive presence is not monotonic in the revision number (a gap says
//! nothing about lower revisions), so the search is a plain linear walk down
//! from the base revision rather than a bisection.

use serde::{Deserialize, Serialize};

use crate::error::SearchError;
use crate::events::{emit, EventSender, SearchEvent};
use crate::platform::PlatformDescriptor;
use crate::prober::Probe;
use crate::Revision;

/// Default number of decrements after the base revision.
pub const DEFAULT_MAX_ATTEMPTS: u32 = 5;

/// Cursor of one in-flight search. Only ever moves down.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SearchState {
    pub descriptor: PlatformDescriptor,
    pub start_revision: Revision,
    pub current_revision: Revision,
    pub attempts_made: u32,
    /// Budget already spent when this search began.
    pub start_attempt: u32,
}

impl SearchState {
    pub fn new(descriptor: PlatformDescriptor, base_revision: Revision) -> Self {
        Self::resume(descriptor, base_revision, 0)
    }

    /// A search that has already used `attempts_made` of its budget.
    pub fn resume(descriptor: PlatformDescriptor, revision: Revision, attempts_made: u32) -> Self {
        Self {
            descriptor,
            start_revision: revision,
            current_revision: revision,
            attempts_made,
            start_attempt: attempts_made,
        }
    }

    /// Step to the next lower revision. Returns false (and leaves the state
    /// untouched) once the budget is spent or revision 0 has been tried.
    pub fn advance(&mut self, max_attempts: u32) -> bool {
        if self.attempts_made >= max_attempts {
            return false;
        }
        let Some(next) = self.current_revision.checked_sub(1) else {
            return false;
        };
        self.current_revision = next;
        self.attempts_made += 1;
        true
    }

    pub(crate) fn exhausted(&self) -> SearchError {
        SearchError::RevisionExhausted {
            descriptor: self.descriptor,
            first_revision: self.start_revision,
            last_revision: self.current_revision,
            attempts: self.attempts_made - self.start_attempt + 1,
        }
    }
}

/// A revision with a published archive for `descriptor`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct ResolutionResult {
    #[serde(flatten)]
    pub descriptor: PlatformDescriptor,
    #[serde(with = "crate::table::revision_string")]
    pub revision: Revision,
}

/// Walks down from `base_revision` until `probe` reports an archive, making at
/// most `max_attempts + 1` probe calls. A transport error ends the search at
/// once; only "not found" moves it to the next lower revision.
pub async fn resolve<P: Probe>(
    probe: &P,
    base_revision: Revision,
    descriptor: PlatformDescriptor,
    max_attempts: u32,
    events: Option<&EventSender>,
) -> Result<ResolutionResult, SearchError> {
    let mut state = SearchState::new(descriptor, base_revision);
    loop {
        let revision = state.current_revision;
        let attempt = state.attempts_made;
        tracing::debug!(platform = %descriptor, revision, attempt, "detect revision");
        emit(
            events,
            SearchEvent::AttemptStarted {
                descriptor,
                revision,
                attempt,
            },
        );

        let found = probe
            .probe(revision, descriptor)
            .await
            .map_err(|source| SearchError::Transport {
                descriptor,
                revision,
                attempt,
                source,
            })?;

        if found {
            tracing::info!(platform = %descriptor, revision, "found archive");
            emit(
                events,
                SearchEvent::Resolved {
                    descriptor,
                    revision,
                    attempts: attempt + 1,
                },
            );
            return Ok(ResolutionResult {
                descriptor,
                revision,
            });
        }

        emit(
            events,
            SearchEvent::AttemptFailed {
                descriptor,
                revision,
                attempt,
            },
        );
        if !state.advance(max_attempts) {
            tracing::warn!(platform = %descriptor, revision, attempt, "archive cannot be found");
            return Err(state.exhausted());
        }
    }
}
