//! Archive transport: the only place that talks HTTP.
//!
//! The search layers depend on the `ArchiveTransport` trait and its
//! found / not-found / failed trichotomy, never on curl directly. Methods
//! block; async callers run them under `spawn_blocking`.

mod http;

pub use http::{CurlTransport, CurlTransportOptions};

use std::fs::File;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

use crate::error::TransportError;

pub trait ArchiveTransport: Send + Sync + 'static {
    /// Cheap existence check: inspects status and headers only.
    ///
    /// `Ok(true)` on 2xx, `Ok(false)` on 404, `Err` for anything else. When
    /// `cancel` becomes true the request is abandoned with `TransportError::Cancelled`.
    fn exists(&self, url: &str, cancel: &AtomicBool) -> Result<bool, TransportError>;

    /// Streams the response body into `dest` from its start, returning bytes written.
    ///
    /// A 404 is reported as `TransportError::NotFound`; `dest` may hold a
    /// partial body after any error. Raising `cancel` abandons the transfer
    /// with `TransportError::Cancelled`.
    fn fetch(&self, url: &str, dest: &mut File, cancel: &AtomicBool) -> Result<u64, TransportError>;
}

/// Cancel flag shared with blocking requests. Raised when the guard is
/// dropped, so an async caller that goes away (returns early, is aborted,
/// or has its future dropped) stops every request it started.
#[derive(Debug, Default)]
pub struct CancelOnDrop(Arc<AtomicBool>);

impl CancelOnDrop {
    pub fn new() -> Self {
        Self::default()
    }

    /// A handle for a blocking task.
    pub fn flag(&self) -> Arc<AtomicBool> {
        Arc::clone(&self.0)
    }

    pub fn cancel(&self) {
        self.0.store(true, Ordering::Relaxed);
    }
}

impl Drop for CancelOnDrop {
    fn drop(&mut self) {
        self.cancel();
    }
}
