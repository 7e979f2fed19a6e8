//! Existence prober: does any archive variant exist for (revision, platform)?
//!
//! Every candidate URL is checked concurrently on the blocking pool. The first
//! positive answer wins and raises a shared cancel flag so the remaining checks
//! tear down their connections. The flag is also raised when the check itself
//! is dropped, e.g. when a fleet aborts the search it belongs to.

use std::future::Future;
use std::sync::Arc;

use tokio::task::JoinSet;

use crate::archive_url::ArchiveLocator;
use crate::error::TransportError;
use crate::platform::PlatformDescriptor;
use crate::transport::{ArchiveTransport, CancelOnDrop};
use crate::Revision;

/// The boolean signal the revision search walks on.
///
/// `Ok(false)` means "not published here, try lower"; `Err` ends the search.
pub trait Probe: Send + Sync + 'static {
    fn probe(
        &self,
        revision: Revision,
        descriptor: PlatformDescriptor,
    ) -> impl Future<Output = Result<bool, TransportError>> + Send;
}

pub struct ExistenceProber {
    transport: Arc<dyn ArchiveTransport>,
    locator: ArchiveLocator,
}

impl ExistenceProber {
    pub fn new(transport: Arc<dyn ArchiveTransport>, locator: ArchiveLocator) -> Self {
        Self { transport, locator }
    }

    pub fn locator(&self) -> &ArchiveLocator {
        &self.locator
    }

    /// True as soon as one candidate URL answers 2xx. If none does, the first
    /// transport failure (if any) is returned, otherwise `Ok(false)`.
    pub async fn check(
        &self,
        revision: Revision,
        descriptor: PlatformDescriptor,
    ) -> Result<bool, TransportError> {
        let urls = self.locator.candidate_urls(revision, &descriptor);
        let cancel = CancelOnDrop::new();
        let mut checks = JoinSet::new();
        for url in urls {
            let transport = Arc::clone(&self.transport);
            let cancel = cancel.flag();
            checks.spawn_blocking(move || {
                let res = transport.exists(&url, &cancel);
                (url, res)
            });
        }

        let mut first_error: Option<TransportError> = None;
        while let Some(joined) = checks.join_next().await {
            let (url, res) = joined.map_err(|e| TransportError::Task(e.to_string()))?;
            match res {
                Ok(true) => {
                    cancel.cancel();
                    tracing::debug!(platform = %descriptor, revision, %url, "archive exists");
                    return Ok(true);
                }
                Ok(false) => {
                    tracing::trace!(platform = %descriptor, revision, %url, "archive not found");
                }
                Err(e) => {
                    tracing::debug!(platform = %descriptor, revision, %url, "existence check failed: {}", e);
                    first_error.get_or_insert(e);
                }
            }
        }

        match first_error {
            Some(e) => Err(e),
            None => Ok(false),
        }
    }
}

impl Probe for ExistenceProber {
    fn probe(
        &self,
        revision: Revision,
        descriptor: PlatformDescriptor,
    ) -> impl Future<Output = Result<bool, TransportError>> + Send {
        self.check(revision, descriptor)
    }
}
