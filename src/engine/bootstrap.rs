//! Bootstrap request and the owned handle the engine returns.

use std::{fmt, num::NonZeroU64, sync::Arc};

use bytes::Bytes;
use tracing::debug;

use super::Engine;
use crate::{
    codec::ByteBlocks,
    config::{DiscoverySettings, DnsSettings, FeatureToggles, Http3Settings, Timeouts},
};

/// Everything the engine's bootstrap entry point receives.
///
/// Scalars are passed as typed values; collections arrive as encoded
/// [`ByteBlocks`] and node metadata in its canonical binary form.
#[derive(Clone, Debug, PartialEq)]
pub struct BootstrapRequest {
    pub stats_domain: Option<String>,
    pub app_version: String,
    pub app_id: String,
    pub timeouts: Timeouts,
    pub dns: DnsSettings,
    pub http3: Http3Settings,
    pub features: FeatureToggles,
    pub max_connections_per_host: u32,
    pub enforce_trust_chain_verification: bool,
    pub discovery: DiscoverySettings,
    /// Filter chain in engine order, two blocks per entry.
    pub filter_chain: ByteBlocks,
    pub stat_sinks: ByteBlocks,
    pub dns_preresolve_hostnames: ByteBlocks,
    /// Runtime guards as name and `"true"`/`"false"` block pairs.
    pub runtime_guards: ByteBlocks,
    /// QUIC hints as hostname and decimal port block pairs.
    pub quic_hints: ByteBlocks,
    pub quic_canonical_suffixes: ByteBlocks,
    pub node_metadata: Bytes,
}

/// Engine-side identifier of a constructed bootstrap.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub struct RawBootstrap(NonZeroU64);

impl RawBootstrap {
    /// Wrap a raw engine value.
    #[must_use]
    pub const fn new(raw: NonZeroU64) -> Self { Self(raw) }

    /// Return the raw engine value.
    #[must_use]
    pub const fn get(self) -> u64 { self.0.get() }
}

/// Owned bootstrap returned by configuration assembly.
///
/// Dropping the handle releases the engine-side bootstrap. Use
/// [`BootstrapHandle::into_raw`] when ownership passes to the engine, for
/// example when it starts with this bootstrap. The handle is immutable and
/// may be shared for reads behind an [`Arc`].
pub struct BootstrapHandle {
    raw: RawBootstrap,
    // `None` once ownership moved out through `into_raw`.
    engine: Option<Arc<dyn Engine>>,
}

impl BootstrapHandle {
    pub(crate) fn new(raw: RawBootstrap, engine: Arc<dyn Engine>) -> Self {
        Self {
            raw,
            engine: Some(engine),
        }
    }

    /// Engine-side identifier, still owned by this handle.
    #[must_use]
    pub fn raw(&self) -> RawBootstrap { self.raw }

    /// Give up ownership without releasing the bootstrap.
    #[must_use]
    pub fn into_raw(mut self) -> RawBootstrap {
        self.engine = None;
        self.raw
    }
}

impl Drop for BootstrapHandle {
    fn drop(&mut self) {
        if let Some(engine) = self.engine.take() {
            debug!(bootstrap = self.raw.get(), "releasing bootstrap");
            engine.release_bootstrap(self.raw);
        }
    }
}

impl fmt::Debug for BootstrapHandle {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("BootstrapHandle")
            .field("raw", &self.raw)
            .finish_non_exhaustive()
    }
}
