//! Download the running platform's archive, falling back to lower revisions.
//!
//! Same walk as the resolver, but every step is a real download into a fresh
//! temp destination. A step that ends in "not found" drops its destination
//! (deleting the file) before the next step creates one, so at most one
//! temp archive exists per chain at any time. Dropping the future stops the
//! download in flight.

use std::path::{Path, PathBuf};
use std::sync::atomic::AtomicBool;
use std::sync::Arc;

use tempfile::{NamedTempFile, TempPath};

use crate::archive_url::ArchiveLocator;
use crate::error::{SearchError, TransportError};
use crate::events::{emit, EventSender, SearchEvent};
use crate::platform::PlatformDescriptor;
use crate::resolver::SearchState;
use crate::storage;
use crate::transport::{ArchiveTransport, CancelOnDrop};
use crate::Revision;

/// A downloaded archive. The file is deleted when this is dropped unless it
/// is moved out with [`FetchedArchive::keep`] or [`FetchedArchive::into_temp_path`].
#[derive(Debug)]
pub struct FetchedArchive {
    pub revision: Revision,
    pub url: String,
    pub bytes: u64,
    path: TempPath,
}

impl FetchedArchive {
    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Moves the archive to `dest`.
    pub fn keep(self, dest: &Path) -> std::io::Result<PathBuf> {
        storage::keep_temp(self.path, dest)?;
        Ok(dest.to_path_buf())
    }

    pub fn into_temp_path(self) -> TempPath {
        self.path
    }
}

pub struct Fetcher {
    transport: Arc<dyn ArchiveTransport>,
    locator: ArchiveLocator,
    descriptor: PlatformDescriptor,
    max_attempts: u32,
    temp_dir: Option<PathBuf>,
}

impl Fetcher {
    pub fn new(
        transport: Arc<dyn ArchiveTransport>,
        locator: ArchiveLocator,
        descriptor: PlatformDescriptor,
        max_attempts: u32,
    ) -> Self {
        Self {
            transport,
            locator,
            descriptor,
            max_attempts,
            temp_dir: None,
        }
    }

    /// Put temp destinations in `dir` instead of the system temp dir.
    pub fn with_temp_dir(mut self, dir: impl Into<PathBuf>) -> Self {
        self.temp_dir = Some(dir.into());
        self
    }

    pub fn descriptor(&self) -> PlatformDescriptor {
        self.descriptor
    }

    /// Downloads the archive at `revision`, or the nearest lower revision that
    /// has one, having already used `attempt` of the budget.
    pub async fn fetch_archive(
        &self,
        revision: Revision,
        attempt: u32,
        events: Option<&EventSender>,
    ) -> Result<FetchedArchive, SearchError> {
        let descriptor = self.descriptor;
        let mut state = SearchState::resume(descriptor, revision, attempt);
        loop {
            let revision = state.current_revision;
            let attempt = state.attempts_made;
            tracing::info!(platform = %descriptor, revision, attempt, "downloading archive");
            emit(
                events,
                SearchEvent::AttemptStarted {
                    descriptor,
                    revision,
                    attempt,
                },
            );

            let dest = storage::temp_destination(self.temp_dir.as_deref())
                .map_err(SearchError::TempFile)?;
            let urls = self.locator.candidate_urls(revision, &descriptor);
            let transport = Arc::clone(&self.transport);
            let cancel = CancelOnDrop::new();
            let flag = cancel.flag();
            // The destination moves into the blocking task; on failure it is
            // dropped (and deleted) there, before this loop continues.
            let outcome = tokio::task::spawn_blocking(move || {
                download_first(transport.as_ref(), &urls, dest, &flag)
            })
            .await
            .map_err(|e| SearchError::Task(e.to_string()))?;

            match outcome {
                Ok((dest, url, bytes)) => {
                    tracing::info!(platform = %descriptor, revision, bytes, %url, "archive downloaded");
                    emit(
                        events,
                        SearchEvent::Resolved {
                            descriptor,
                            revision,
                            attempts: attempt - state.start_attempt + 1,
                        },
                    );
                    return Ok(FetchedArchive {
                        revision,
                        url,
                        bytes,
                        path: dest.into_temp_path(),
                    });
                }
                Err(e) if e.is_not_found() => {
                    emit(
                        events,
                        SearchEvent::AttemptFailed {
                            descriptor,
                            revision,
                            attempt,
                        },
                    );
                    if !state.advance(self.max_attempts) {
                        tracing::warn!(platform = %descriptor, revision, "no archive within attempt budget");
                        return Err(state.exhausted());
                    }
                    tracing::info!(platform = %descriptor, revision, "archive was not found, trying previous revision");
                }
                Err(source) => {
                    tracing::warn!(platform = %descriptor, revision, "archive download failed: {}", source);
                    return Err(SearchError::Transport {
                        descriptor,
                        revision,
                        attempt,
                        source,
                    });
                }
            }
        }
    }
}

/// Tries each candidate URL in order into the same destination. Returns the
/// destination on the first success; any non-404 failure stops immediately.
fn download_first(
    transport: &dyn ArchiveTransport,
    urls: &[String],
    mut dest: NamedTempFile,
    cancel: &AtomicBool,
) -> Result<(NamedTempFile, String, u64), TransportError> {
    let mut not_found = None;
    for url in urls {
        storage::rewind(dest.as_file_mut()).map_err(TransportError::Storage)?;
        match transport.fetch(url, dest.as_file_mut(), cancel) {
            Ok(bytes) => return Ok((dest, url.clone(), bytes)),
            Err(e) if e.is_not_found() => not_found = Some(e),
            Err(e) => return Err(e),
        }
    }
    Err(not_found.unwrap_or_else(|| TransportError::NotFound {
        url: String::new(),
    }))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::platform::{Architecture, Platform};
    use std::collections::HashMap;
    use std::fs::File;
    use std::io::Write;
    use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
    use std::sync::Mutex;

    /// Serves bodies keyed by URL substring; other URLs are 404 after writing
    /// some junk, like an error page would.
    struct MemoryTransport {
        bodies: HashMap<&'static str, &'static str>,
        failing: Option<&'static str>,
        /// Downloads stall until cancelled.
        stall: bool,
        cancelled: AtomicUsize,
        temp_dir: PathBuf,
        /// Files present in `temp_dir` at the moment of each fetch.
        live_files: Mutex<Vec<usize>>,
        fetches: AtomicUsize,
    }

    impl MemoryTransport {
        fn new(temp_dir: &Path, bodies: &[(&'static str, &'static str)]) -> Self {
            Self {
                bodies: bodies.iter().copied().collect(),
                failing: None,
                stall: false,
                cancelled: AtomicUsize::new(0),
                temp_dir: temp_dir.to_path_buf(),
                live_files: Mutex::new(Vec::new()),
                fetches: AtomicUsize::new(0),
            }
        }
    }

    impl ArchiveTransport for MemoryTransport {
        fn exists(&self, _url: &str, _cancel: &AtomicBool) -> Result<bool, TransportError> {
            Ok(false)
        }

        fn fetch(&self, url: &str, dest: &mut File, cancel: &AtomicBool) -> Result<u64, TransportError> {
            self.fetches.fetch_add(1, Ordering::SeqCst);
            let live = std::fs::read_dir(&self.temp_dir).unwrap().count();
            self.live_files.lock().unwrap().push(live);
            if self.stall {
                dest.write_all(b"partial").map_err(TransportError::Storage)?;
                for _ in 0..400 {
                    if cancel.load(Ordering::Relaxed) {
                        self.cancelled.fetch_add(1, Ordering::SeqCst);
                        return Err(TransportError::Cancelled);
                    }
                    std::thread::sleep(std::time::Duration::from_millis(5));
                }
            }
            if let Some(f) = self.failing {
                if url.contains(f) {
                    return Err(TransportError::Http {
                        url: url.to_string(),
                        code: 503,
                    });
                }
            }
            for (key, body) in &self.bodies {
                if url.contains(key) {
                    dest.write_all(body.as_bytes()).map_err(TransportError::Storage)?;
                    return Ok(body.len() as u64);
                }
            }
            dest.write_all(b"<html>404</html>").map_err(TransportError::Storage)?;
            Err(TransportError::NotFound {
                url: url.to_string(),
            })
        }
    }

    fn linux() -> PlatformDescriptor {
        PlatformDescriptor::new(Platform::Linux, Some(Architecture::X64))
    }

    fn fetcher(t: Arc<MemoryTransport>, dir: &Path, d: PlatformDescriptor) -> Fetcher {
        Fetcher::new(t, ArchiveLocator::new("http://cdn.test/o/").unwrap(), d, 5).with_temp_dir(dir)
    }

    fn count(dir: &Path) -> usize {
        std::fs::read_dir(dir).unwrap().count()
    }

    #[tokio::test]
    async fn falls_back_and_leaves_one_temp_file() {
        let dir = tempfile::tempdir().unwrap();
        let t = Arc::new(MemoryTransport::new(dir.path(), &[("%2F999%2F", "archive-999")]));
        let f = fetcher(Arc::clone(&t), dir.path(), linux());

        let archive = f.fetch_archive(1000, 0, None).await.unwrap();
        assert_eq!(archive.revision, 999);
        assert_eq!(archive.bytes, 11);
        assert_eq!(std::fs::read(archive.path()).unwrap(), b"archive-999");
        assert_eq!(count(dir.path()), 1);
        // Never more than the current attempt's destination alive during a fetch.
        assert!(t.live_files.lock().unwrap().iter().all(|&n| n == 1));

        drop(archive);
        assert_eq!(count(dir.path()), 0);
    }

    #[tokio::test]
    async fn exhaustion_cleans_up() {
        let dir = tempfile::tempdir().unwrap();
        let t = Arc::new(MemoryTransport::new(dir.path(), &[]));
        let f = fetcher(Arc::clone(&t), dir.path(), linux());
        match f.fetch_archive(1000, 0, None).await {
            Err(SearchError::RevisionExhausted { last_revision, .. }) => assert_eq!(last_revision, 995),
            other => panic!("expected exhaustion, got {:?}", other),
        }
        assert_eq!(t.fetches.load(Ordering::SeqCst), 6);
        assert_eq!(count(dir.path()), 0);
    }

    #[tokio::test]
    async fn starting_attempt_counts_against_budget() {
        let dir = tempfile::tempdir().unwrap();
        let t = Arc::new(MemoryTransport::new(dir.path(), &[("%2F997%2F", "x")]));
        let f = fetcher(Arc::clone(&t), dir.path(), linux());
        // Three attempts already spent: only 1000, 999, 998 remain.
        match f.fetch_archive(1000, 3, None).await {
            Err(SearchError::RevisionExhausted {
                first_revision,
                last_revision,
                attempts,
                ..
            }) => {
                assert_eq!(first_revision, 1000);
                assert_eq!(last_revision, 998);
                // Only the downloads this chain made.
                assert_eq!(attempts, 3);
            }
            other => panic!("expected exhaustion, got {:?}", other),
        }
        assert_eq!(t.fetches.load(Ordering::SeqCst), 3);
    }

    #[tokio::test]
    async fn dropped_fetch_stops_download_and_removes_partial_file() {
        let dir = tempfile::tempdir().unwrap();
        let mut t = MemoryTransport::new(dir.path(), &[]);
        t.stall = true;
        let t = Arc::new(t);
        let f = fetcher(Arc::clone(&t), dir.path(), linux());
        let res = tokio::time::timeout(
            std::time::Duration::from_millis(50),
            f.fetch_archive(1000, 0, None),
        )
        .await;
        assert!(res.is_err());
        tokio::time::sleep(std::time::Duration::from_millis(100)).await;
        assert_eq!(t.cancelled.load(Ordering::SeqCst), 1);
        assert_eq!(t.fetches.load(Ordering::SeqCst), 1);
        assert_eq!(count(dir.path()), 0);
    }

    #[tokio::test]
    async fn transport_failure_is_not_retried() {
        let dir = tempfile::tempdir().unwrap();
        let mut t = MemoryTransport::new(dir.path(), &[("%2F998%2F", "x")]);
        t.failing = Some("%2F999%2F");
        let t = Arc::new(t);
        let f = fetcher(Arc::clone(&t), dir.path(), linux());
        match f.fetch_archive(1000, 0, None).await {
            Err(SearchError::Transport { revision, source, .. }) => {
                assert_eq!(revision, 999);
                assert!(matches!(source, TransportError::Http { code: 503, .. }));
            }
            other => panic!("expected transport failure, got {:?}", other),
        }
        assert_eq!(t.fetches.load(Ordering::SeqCst), 2);
        assert_eq!(count(dir.path()), 0);
    }

    #[tokio::test]
    async fn second_name_variant_is_downloaded_without_junk() {
        let dir = tempfile::tempdir().unwrap();
        let t = Arc::new(MemoryTransport::new(dir.path(), &[("chrome-win32.zip", "win32")]));
        let win = PlatformDescriptor::new(Platform::Windows, Some(Architecture::X86));
        let f = fetcher(t, dir.path(), win);
        let archive = f.fetch_archive(50, 0, None).await.unwrap();
        assert_eq!(archive.revision, 50);
        assert!(archive.url.ends_with("chrome-win32.zip?alt=media"));
        assert_eq!(std::fs::read(archive.path()).unwrap(), b"win32");
    }

    #[tokio::test]
    async fn keep_moves_archive_out() {
        let dir = tempfile::tempdir().unwrap();
        let out = tempfile::tempdir().unwrap();
        let t = Arc::new(MemoryTransport::new(dir.path(), &[("%2F10%2F", "zip")]));
        let f = fetcher(t, dir.path(), linux());
        let archive = f.fetch_archive(10, 0, None).await.unwrap();
        let kept = archive.keep(&out.path().join("chrome.zip")).unwrap();
        assert_eq!(std::fs::read(kept).unwrap(), b"zip");
        assert_eq!(count(dir.path()), 0);
    }
}
