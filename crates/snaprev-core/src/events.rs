//! Search progress events.
//!
//! Searches report progress on an optional `tokio::sync::mpsc` channel so the
//! caller decides how (or whether) to render it. Sends never block the search:
//! if the channel is full or closed the event is dropped.

use crate::platform::PlatformDescriptor;
use crate::Revision;

pub type EventSender = tokio::sync::mpsc::Sender<SearchEvent>;

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SearchEvent {
    /// About to check `revision`; `attempt` is 0-based.
    AttemptStarted {
        descriptor: PlatformDescriptor,
        revision: Revision,
        attempt: u32,
    },
    /// No archive at `revision`; the search will decrement or give up.
    AttemptFailed {
        descriptor: PlatformDescriptor,
        revision: Revision,
        attempt: u32,
    },
    /// Archive found at `revision` after `attempts` checks.
    Resolved {
        descriptor: PlatformDescriptor,
        revision: Revision,
        attempts: u32,
    },
}

impl SearchEvent {
    pub fn descriptor(&self) -> PlatformDescriptor {
        match self {
            SearchEvent::AttemptStarted { descriptor, .. }
            | SearchEvent::AttemptFailed { descriptor, .. }
            | SearchEvent::Resolved { descriptor, .. } => *descriptor,
        }
    }
}

pub(crate) fn emit(tx: Option<&EventSender>, event: SearchEvent) {
    if let Some(tx) = tx {
        let _ = tx.try_send(event);
    }
}
