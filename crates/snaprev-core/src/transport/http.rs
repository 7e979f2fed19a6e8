//! libcurl-backed transport.
//!
//! The existence check is a streaming GET that is torn down as soon as the
//! first body chunk arrives; only the status line and headers are inspected.

use std::fs::File;
use std::io::Write;
use std::sync::atomic::{AtomicBool, Ordering};
use std::time::Duration;

use curl::easy::Easy;

use super::ArchiveTransport;
use crate::error::TransportError;
use crate::retry::{run_with_retry, RetryPolicy};
use crate::storage;

const USER_AGENT: &str = concat!("snaprev/", env!("CARGO_PKG_VERSION"));

/// Timeouts and transient-retry policy for every request the transport makes.
#[derive(Debug, Clone, Copy)]
pub struct CurlTransportOptions {
    pub connect_timeout: Duration,
    /// Total time allowed for one existence check.
    pub probe_timeout: Duration,
    /// Hard ceiling for one archive download.
    pub download_timeout: Duration,
    pub retry: RetryPolicy,
}

impl Default for CurlTransportOptions {
    fn default() -> Self {
        Self {
            connect_timeout: Duration::from_secs(15),
            probe_timeout: Duration::from_secs(30),
            download_timeout: Duration::from_secs(3600),
            retry: RetryPolicy::disabled(),
        }
    }
}

#[derive(Debug, Clone, Default)]
pub struct CurlTransport {
    opts: CurlTransportOptions,
}

impl CurlTransport {
    pub fn new(opts: CurlTransportOptions) -> Self {
        Self { opts }
    }

    fn handle(&self, url: &str, timeout: Duration) -> Result<Easy, TransportError> {
        let mut easy = Easy::new();
        easy.url(url).map_err(curl_error(url))?;
        easy.follow_location(true).map_err(curl_error(url))?;
        easy.max_redirections(10).map_err(curl_error(url))?;
        // >= 400 ends the transfer before any body is delivered.
        easy.fail_on_error(true).map_err(curl_error(url))?;
        easy.connect_timeout(self.opts.connect_timeout)
            .map_err(curl_error(url))?;
        easy.timeout(timeout).map_err(curl_error(url))?;
        easy.useragent(USER_AGENT).map_err(curl_error(url))?;
        Ok(easy)
    }

    fn exists_once(&self, url: &str, cancel: &AtomicBool) -> Result<bool, TransportError> {
        if cancel.load(Ordering::Relaxed) {
            return Err(TransportError::Cancelled);
        }
        let mut easy = self.handle(url, self.opts.probe_timeout)?;
        easy.progress(true).map_err(curl_error(url))?;

        let performed = {
            let mut transfer = easy.transfer();
            transfer
                .write_function(|_| Ok(0))
                .map_err(curl_error(url))?;
            transfer
                .progress_function(|_, _, _, _| !cancel.load(Ordering::Relaxed))
                .map_err(curl_error(url))?;
            transfer.perform()
        };

        match performed {
            Ok(()) => {}
            // Write error: we refused the body after the status line was in.
            Err(e) if e.is_write_error() || e.is_http_returned_error() => {}
            Err(e) if e.is_aborted_by_callback() => return Err(TransportError::Cancelled),
            Err(source) => {
                return Err(TransportError::Curl {
                    url: url.to_string(),
                    source,
                })
            }
        }

        let code = easy.response_code().map_err(curl_error(url))?;
        status_to_presence(url, code)
    }

    fn fetch_once(&self, url: &str, dest: &mut File, cancel: &AtomicBool) -> Result<u64, TransportError> {
        if cancel.load(Ordering::Relaxed) {
            return Err(TransportError::Cancelled);
        }
        storage::rewind(dest).map_err(TransportError::Storage)?;

        let mut easy = self.handle(url, self.opts.download_timeout)?;
        // Abort if throughput stays under 1 KiB/s for a minute.
        easy.low_speed_limit(1024).map_err(curl_error(url))?;
        easy.low_speed_time(Duration::from_secs(60))
            .map_err(curl_error(url))?;
        easy.progress(true).map_err(curl_error(url))?;

        let mut written = 0u64;
        let mut write_error: Option<std::io::Error> = None;
        let performed = {
            let mut transfer = easy.transfer();
            transfer
                .write_function(|data| match dest.write_all(data) {
                    Ok(()) => {
                        written += data.len() as u64;
                        Ok(data.len())
                    }
                    Err(e) => {
                        write_error = Some(e);
                        Ok(0)
                    }
                })
                .map_err(curl_error(url))?;
            transfer
                .progress_function(|_, _, _, _| !cancel.load(Ordering::Relaxed))
                .map_err(curl_error(url))?;
            transfer.perform()
        };

        if let Some(e) = write_error {
            return Err(TransportError::Storage(e));
        }
        match performed {
            Ok(()) => {}
            Err(e) if e.is_http_returned_error() => {}
            Err(e) if e.is_aborted_by_callback() => return Err(TransportError::Cancelled),
            Err(source) => {
                return Err(TransportError::Curl {
                    url: url.to_string(),
                    source,
                })
            }
        }

        let code = easy.response_code().map_err(curl_error(url))?;
        if !status_to_presence(url, code)? {
            return Err(TransportError::NotFound {
                url: url.to_string(),
            });
        }
        dest.flush().map_err(TransportError::Storage)?;
        Ok(written)
    }
}

impl ArchiveTransport for CurlTransport {
    fn exists(&self, url: &str, cancel: &AtomicBool) -> Result<bool, TransportError> {
        run_with_retry(&self.opts.retry, || self.exists_once(url, cancel))
    }

    fn fetch(&self, url: &str, dest: &mut File, cancel: &AtomicBool) -> Result<u64, TransportError> {
        run_with_retry(&self.opts.retry, || self.fetch_once(url, &mut *dest, cancel))
    }
}

/// 2xx → present, 404 → absent, anything else is a transport failure.
fn status_to_presence(url: &str, code: u32) -> Result<bool, TransportError> {
    match code {
        200..=299 => Ok(true),
        404 => Ok(false),
        _ => Err(TransportError::Http {
            url: url.to_string(),
            code,
        }),
    }
}

fn curl_error(url: &str) -> impl Fn(curl::Error) -> TransportError + '_ {
    move |source| TransportError::Curl {
        url: url.to_string(),
        source,
    }
}
