//! Prints search events as they arrive.

use snaprev_core::events::{EventSender, SearchEvent};
use tokio::task::JoinHandle;

const CHANNEL_CAPACITY: usize = 64;

/// Returns the sender to hand to a search and the printing task. The task
/// ends once every clone of the sender is dropped.
pub fn spawn_progress() -> (EventSender, JoinHandle<()>) {
    let (tx, mut rx) = tokio::sync::mpsc::channel::<SearchEvent>(CHANNEL_CAPACITY);
    let handle = tokio::spawn(async move {
        while let Some(event) = rx.recv().await {
            println!("{}", render(&event));
        }
    });
    (tx, handle)
}

fn render(event: &SearchEvent) -> String {
    match event {
        SearchEvent::AttemptStarted {
            descriptor,
            revision,
            attempt: 0,
        } => format!("  [{}] checking r{}", descriptor, revision),
        SearchEvent::AttemptStarted {
            descriptor,
            revision,
            attempt,
        } => format!("  [{}] checking r{} (attempt #{})", descriptor, revision, attempt),
        SearchEvent::AttemptFailed {
            descriptor,
            revision,
            ..
        } => format!("  [{}] r{} not published", descriptor, revision),
        SearchEvent::Resolved {
            descriptor,
            revision,
            attempts,
        } => format!("  [{}] found r{} after {} check(s)", descriptor, revision, attempts),
    }
}
