//! Resolve every fleet descriptor concurrently and assemble a revision table.
//!
//! One task per descriptor. Results are slotted by input index so the table
//! order never depends on completion order. The first failure aborts the
//! remaining tasks and no table is produced.

use std::collections::HashSet;
use std::sync::Arc;

use tokio::task::JoinSet;

use crate::error::{DiscoverError, SearchError};
use crate::events::EventSender;
use crate::platform::PlatformDescriptor;
use crate::prober::Probe;
use crate::resolver::{resolve, ResolutionResult};
use crate::table::{RevisionTable, TableSink};
use crate::Revision;

pub async fn resolve_all<P: Probe>(
    probe: Arc<P>,
    base_revision: Revision,
    descriptors: &[PlatformDescriptor],
    max_attempts: u32,
    events: Option<EventSender>,
) -> Result<RevisionTable, SearchError> {
    let mut seen = HashSet::with_capacity(descriptors.len());
    for d in descriptors {
        if !seen.insert(*d) {
            return Err(SearchError::DuplicateDescriptor { descriptor: *d });
        }
    }

    tracing::info!(base_revision, platforms = descriptors.len(), max_attempts, "resolving fleet");

    let mut searches = JoinSet::new();
    for (index, descriptor) in descriptors.iter().copied().enumerate() {
        let probe = Arc::clone(&probe);
        let events = events.clone();
        searches.spawn(async move {
            let res = resolve(
                probe.as_ref(),
                base_revision,
                descriptor,
                max_attempts,
                events.as_ref(),
            )
            .await;
            (index, res)
        });
    }

    let mut slots: Vec<Option<ResolutionResult>> = vec![None; descriptors.len()];
    while let Some(joined) = searches.join_next().await {
        let (index, res) = joined.map_err(|e| SearchError::Task(e.to_string()))?;
        match res {
            Ok(found) => slots[index] = Some(found),
            Err(e) => {
                searches.abort_all();
                tracing::warn!("fleet resolution failed: {}", e);
                return Err(e);
            }
        }
    }

    let entries = slots
        .into_iter()
        .collect::<Option<Vec<_>>>()
        .ok_or_else(|| SearchError::Task("search finished without a result".to_string()))?;
    Ok(RevisionTable::new(entries))
}

/// Resolve the fleet and hand the table to `sink`. Nothing reaches the sink
/// unless every descriptor resolved.
pub async fn discover_and_persist<P: Probe>(
    probe: Arc<P>,
    base_revision: Revision,
    descriptors: &[PlatformDescriptor],
    max_attempts: u32,
    sink: &dyn TableSink,
    events: Option<EventSender>,
) -> Result<RevisionTable, DiscoverError> {
    let table = resolve_all(probe, base_revision, descriptors, max_attempts, events).await?;
    sink.persist(&table)?;
    Ok(table)
}
