//! Map transport failures onto retry `ErrorKind`s.

use super::policy::ErrorKind;
use crate::error::TransportError;

pub fn classify_http_status(code: u32) -> ErrorKind {
    match code {
        404 => ErrorKind::NotFound,
        429 | 503 => ErrorKind::Throttled,
        500..=599 => ErrorKind::Http5xx(code as u16),
        _ => ErrorKind::Other,
    }
}

pub fn classify_curl_error(e: &curl::Error) -> ErrorKind {
    if e.is_operation_timedout() {
        return ErrorKind::Timeout;
    }
    if e.is_couldnt_connect()
        || e.is_couldnt_resolve_host()
        || e.is_couldnt_resolve_proxy()
        || e.is_recv_error()
        || e.is_send_error()
        || e.is_got_nothing()
        || e.is_partial_file()
    {
        return ErrorKind::Connection;
    }
    ErrorKind::Other
}

pub fn classify(e: &TransportError) -> ErrorKind {
    match e {
        TransportError::NotFound { .. } => ErrorKind::NotFound,
        TransportError::Http { code, .. } => classify_http_status(*code),
        TransportError::Curl { source, .. } => classify_curl_error(source),
        TransportError::Storage(_) | TransportError::Cancelled | TransportError::Task(_) => {
            ErrorKind::Other
        }
    }
}
