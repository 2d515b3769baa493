//! Default values for engine configuration.

use std::time::Duration;

pub(super) const DEFAULT_CONNECT_TIMEOUT: Duration = Duration::from_secs(30);
pub(super) const DEFAULT_STREAM_IDLE_TIMEOUT: Duration = Duration::from_secs(15);
pub(super) const DEFAULT_PER_TRY_IDLE_TIMEOUT: Duration = Duration::from_secs(15);
pub(super) const DEFAULT_STATS_FLUSH_INTERVAL: Duration = Duration::from_secs(60);
pub(super) const DEFAULT_H2_KEEPALIVE_IDLE_INTERVAL: Duration = Duration::from_millis(100_000_000);
pub(super) const DEFAULT_H2_KEEPALIVE_TIMEOUT: Duration = Duration::from_secs(10);

pub(super) const DEFAULT_DNS_REFRESH: Duration = Duration::from_secs(60);
pub(super) const DEFAULT_DNS_FAILURE_REFRESH_BASE: Duration = Duration::from_secs(2);
pub(super) const DEFAULT_DNS_FAILURE_REFRESH_MAX: Duration = Duration::from_secs(10);
pub(super) const DEFAULT_DNS_QUERY_TIMEOUT: Duration = Duration::from_secs(25);
pub(super) const DEFAULT_DNS_MIN_REFRESH: Duration = Duration::from_secs(60);
pub(super) const DEFAULT_DNS_CACHE_SAVE_INTERVAL: Duration = Duration::from_secs(1);

pub(super) const DEFAULT_MAX_CONNECTIONS_PER_HOST: u32 = 7;
pub(super) const DEFAULT_APP_VERSION: &str = "unspecified";
pub(super) const DEFAULT_APP_ID: &str = "unspecified";

/// Deepest nesting accepted in node metadata documents.
pub(super) const MAX_METADATA_DEPTH: usize = 64;
