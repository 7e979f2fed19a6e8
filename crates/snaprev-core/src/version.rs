//! Version string → base revision.
//!
//! The search only needs a base revision. `DepsLookup` asks a `deps.json`
//! style endpoint (`?version=72.0.3586.2` → `{"chromium_base_position": "612437", ...}`);
//! `FixedBaseRevision` skips the lookup when the revision is already known.

use std::time::Duration;

use url::Url;

use crate::error::TransportError;
use crate::Revision;

pub const DEFAULT_VERSION_LOOKUP_URL: &str = "https://omahaproxy.appspot.com/deps.json";

#[derive(Debug, thiserror::Error)]
pub enum LookupError {
    #[error("invalid version string {0:?}: expected dotted numeric components")]
    InvalidVersion(String),
    #[error("invalid lookup endpoint {url}: {reason}")]
    Endpoint { url: String, reason: String },
    #[error("version lookup request failed: {0}")]
    Transport(#[from] TransportError),
    #[error("version lookup response is not JSON: {0}")]
    Json(#[from] serde_json::Error),
    #[error("version lookup response has no usable chromium_base_position")]
    MissingBasePosition,
}

pub trait BaseRevisionSource: Send + Sync {
    fn base_revision(&self, version: &str) -> Result<Revision, LookupError>;
}

/// A base revision supplied directly (e.g. `--base-revision`).
#[derive(Debug, Clone, Copy)]
pub struct FixedBaseRevision(pub Revision);

impl BaseRevisionSource for FixedBaseRevision {
    fn base_revision(&self, _version: &str) -> Result<Revision, LookupError> {
        Ok(self.0)
    }
}

/// Looks up the base position over HTTP. Blocking; use `spawn_blocking` from async code.
#[derive(Debug, Clone)]
pub struct DepsLookup {
    endpoint: Url,
    connect_timeout: Duration,
    timeout: Duration,
}

impl DepsLookup {
    pub fn new(endpoint: &str, connect_timeout: Duration, timeout: Duration) -> Result<Self, LookupError> {
        let endpoint = Url::parse(endpoint).map_err(|e| LookupError::Endpoint {
            url: endpoint.to_string(),
            reason: e.to_string(),
        })?;
        Ok(Self {
            endpoint,
            connect_timeout,
            timeout,
        })
    }

    pub fn request_url(&self, version: &str) -> Url {
        let mut url = self.endpoint.clone();
        url.query_pairs_mut().append_pair("version", version);
        url
    }

    fn get(&self, url: &str) -> Result<Vec<u8>, TransportError> {
        let curl_err = |source| TransportError::Curl {
            url: url.to_string(),
            source,
        };
        let mut body = Vec::new();
        let mut easy = curl::easy::Easy::new();
        easy.url(url).map_err(curl_err)?;
        easy.follow_location(true).map_err(curl_err)?;
        easy.connect_timeout(self.connect_timeout).map_err(curl_err)?;
        easy.timeout(self.timeout).map_err(curl_err)?;
        {
            let mut transfer = easy.transfer();
            transfer
                .write_function(|data| {
                    body.extend_from_slice(data);
                    Ok(data.len())
                })
                .map_err(curl_err)?;
            transfer.perform().map_err(curl_err)?;
        }
        let code = easy.response_code().map_err(curl_err)?;
        match code {
            200..=299 => Ok(body),
            404 => Err(TransportError::NotFound {
                url: url.to_string(),
            }),
            _ => Err(TransportError::Http {
                url: url.to_string(),
                code,
            }),
        }
    }
}

impl BaseRevisionSource for DepsLookup {
    fn base_revision(&self, version: &str) -> Result<Revision, LookupError> {
        validate_version(version)?;
        let url = self.request_url(version);
        let body = self.get(url.as_str())?;
        let revision = parse_base_position(&body)?;
        tracing::info!(version, revision, "base revision");
        Ok(revision)
    }
}

fn validate_version(version: &str) -> Result<(), LookupError> {
    let ok = !version.is_empty()
        && version
            .split('.')
            .all(|part| !part.is_empty() && part.bytes().all(|b| b.is_ascii_digit()));
    if ok {
        Ok(())
    } else {
        Err(LookupError::InvalidVersion(version.to_string()))
    }
}

/// Extracts `chromium_base_position`, which the endpoint sends as a string.
pub fn parse_base_position(body: &[u8]) -> Result<Revision, LookupError> {
    let value: serde_json::Value = serde_json::from_slice(body)?;
    match value.get("chromium_base_position") {
        Some(serde_json::Value::String(s)) => {
            s.trim().parse().map_err(|_| LookupError::MissingBasePosition)
        }
        Some(serde_json::Value::Number(n)) => n.as_u64().ok_or(LookupError::MissingBasePosition),
        _ => Err(LookupError::MissingBasePosition),
    }
}
