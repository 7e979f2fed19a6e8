use super::classify::classify;
use super::policy::{RetryDecision, RetryPolicy};
use crate::error::TransportError;

/// Runs `f` until it succeeds or the policy gives up. Blocks the current
/// thread while backing off; call from a blocking context.
pub fn run_with_retry<T, F>(policy: &RetryPolicy, mut f: F) -> Result<T, TransportError>
where
    F: FnMut() -> Result<T, TransportError>,
{
    let mut attempt = 1u32;
    loop {
        let err = match f() {
            Ok(v) => return Ok(v),
            Err(e) => e,
        };
        match policy.decide(attempt, classify(&err)) {
            RetryDecision::NoRetry => return Err(err),
            RetryDecision::RetryAfter(d) => {
                tracing::debug!(attempt, delay_ms = d.as_millis() as u64, "transient transport error: {}", err);
                std::thread::sleep(d);
                attempt += 1;
            }
        }
    }
}
