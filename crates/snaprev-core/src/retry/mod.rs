//! Transient-failure retry for individual transport requests.
//!
//! This is not the revision search: a `NotFound` is never retried here, it is
//! the signal the resolver walks on. Only timeouts, throttling, connection
//! drops and 5xx responses are retried, with capped exponential backoff.

mod classify;
mod policy;
mod run;

pub use classify::{classify, classify_curl_error, classify_http_status};
pub use policy::{ErrorKind, RetryDecision, RetryPolicy};
pub use run::run_with_retry;
