pub mod config;
pub mod logging;

pub mod archive_url;
pub mod checksum;
pub mod error;
pub mod events;
pub mod extract;
pub mod fetcher;
pub mod fleet;
pub mod platform;
pub mod prober;
pub mod resolver;
pub mod retry;
pub mod storage;
pub mod table;
pub mod transport;
pub mod version;

/// Monotonically increasing build number of the snapshot store.
pub type Revision = u64;

