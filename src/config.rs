//! Typed engine configuration.
//!
//! [`EngineConfiguration`] is an immutable value object built once through
//! [`EngineConfigurationBuilder`] and consumed by
//! [`EngineConfiguration::assemble`], which validates it and hands the
//! engine a boundary-safe [`BootstrapRequest`](crate::engine::BootstrapRequest).

use std::{collections::BTreeMap, fmt, sync::Arc, time::Duration};

use crate::{
    filter::NativeFilterEntry,
    platform::{KeyValueStore, PlatformFilterFactory, StringAccessor},
};

mod assemble;
mod builder;
mod defaults;
mod error;
mod metadata;
pub(crate) mod template;

pub use builder::EngineConfigurationBuilder;
pub use error::ConfigError;
pub use metadata::{MetadataValue, NodeMetadata};

/// Peer certificate verification mode.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub enum TrustChainVerification {
    /// Verify certificates against the configured trust store.
    #[default]
    VerifyTrustChain,
    /// Permit connections whose certificates fail verification. Test use
    /// only.
    AcceptUntrusted,
}

impl TrustChainVerification {
    /// Whether the engine must enforce trust-chain verification.
    #[must_use]
    pub const fn enforces(self) -> bool { matches!(self, TrustChainVerification::VerifyTrustChain) }
}

/// Connection, stream and reporting timeouts.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct Timeouts {
    pub connect: Duration,
    pub stream_idle: Duration,
    pub per_try_idle: Duration,
    pub stats_flush_interval: Duration,
    pub h2_keepalive_idle_interval: Duration,
    pub h2_keepalive_timeout: Duration,
}

impl Default for Timeouts {
    fn default() -> Self {
        Self {
            connect: defaults::DEFAULT_CONNECT_TIMEOUT,
            stream_idle: defaults::DEFAULT_STREAM_IDLE_TIMEOUT,
            per_try_idle: defaults::DEFAULT_PER_TRY_IDLE_TIMEOUT,
            stats_flush_interval: defaults::DEFAULT_STATS_FLUSH_INTERVAL,
            h2_keepalive_idle_interval: defaults::DEFAULT_H2_KEEPALIVE_IDLE_INTERVAL,
            h2_keepalive_timeout: defaults::DEFAULT_H2_KEEPALIVE_TIMEOUT,
        }
    }
}

/// DNS refresh and caching behaviour.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct DnsSettings {
    pub refresh: Duration,
    pub failure_refresh_base: Duration,
    pub failure_refresh_max: Duration,
    pub query_timeout: Duration,
    pub min_refresh: Duration,
    pub cache_enabled: bool,
    pub cache_save_interval: Duration,
    pub drain_post_refresh: bool,
}

impl Default for DnsSettings {
    fn default() -> Self {
        Self {
            refresh: defaults::DEFAULT_DNS_REFRESH,
            failure_refresh_base: defaults::DEFAULT_DNS_FAILURE_REFRESH_BASE,
            failure_refresh_max: defaults::DEFAULT_DNS_FAILURE_REFRESH_MAX,
            query_timeout: defaults::DEFAULT_DNS_QUERY_TIMEOUT,
            min_refresh: defaults::DEFAULT_DNS_MIN_REFRESH,
            cache_enabled: false,
            cache_save_interval: defaults::DEFAULT_DNS_CACHE_SAVE_INTERVAL,
            drain_post_refresh: false,
        }
    }
}

/// HTTP/3 (QUIC) scalar settings.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Http3Settings {
    pub enabled: bool,
    pub connection_options: String,
    pub client_connection_options: String,
}

impl Default for Http3Settings {
    fn default() -> Self {
        Self {
            enabled: true,
            connection_options: String::new(),
            client_connection_options: String::new(),
        }
    }
}

/// Boolean engine features.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
#[expect(
    clippy::struct_excessive_bools,
    reason = "each flag maps to an independent engine toggle"
)]
pub struct FeatureToggles {
    pub gzip_decompression: bool,
    pub brotli_decompression: bool,
    pub socket_tagging: bool,
    pub interface_binding: bool,
    pub platform_certificate_validation: bool,
}

impl Default for FeatureToggles {
    fn default() -> Self {
        Self {
            gzip_decompression: true,
            brotli_decompression: false,
            socket_tagging: false,
            interface_binding: false,
            platform_certificate_validation: false,
        }
    }
}

/// Management server used for xDS.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct XdsServer {
    pub address: String,
    pub port: u16,
    pub auth_header: String,
    pub auth_token: String,
    pub root_certs: String,
    pub sni: String,
}

/// Identity reported in the discovery node.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct NodeIdentity {
    pub id: String,
    pub region: String,
    pub zone: String,
    pub sub_zone: String,
}

/// Runtime discovery service layer.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct RtdsSettings {
    pub resource_name: String,
    pub timeout: Duration,
}

/// Cluster discovery service.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct CdsSettings {
    pub enabled: bool,
    pub resources_locator: String,
    pub timeout: Duration,
}

/// xDS, RTDS and CDS settings sent as scalars. Node metadata travels
/// separately in its serialised form.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct DiscoverySettings {
    pub xds: Option<XdsServer>,
    pub node: NodeIdentity,
    pub rtds: Option<RtdsSettings>,
    pub cds: CdsSettings,
}

/// Complete, immutable engine configuration.
///
/// Built through [`EngineConfiguration::builder`]. Fields are read through
/// accessors; nothing mutates the value once built.
#[derive(Clone)]
pub struct EngineConfiguration {
    pub(crate) stats_domain: Option<String>,
    pub(crate) app_version: String,
    pub(crate) app_id: String,
    pub(crate) timeouts: Timeouts,
    pub(crate) dns: DnsSettings,
    pub(crate) http3: Http3Settings,
    pub(crate) features: FeatureToggles,
    pub(crate) max_connections_per_host: u32,
    pub(crate) trust_chain_verification: TrustChainVerification,
    pub(crate) dns_preresolve_hostnames: Vec<String>,
    pub(crate) quic_hints: BTreeMap<String, u16>,
    pub(crate) quic_canonical_suffixes: Vec<String>,
    pub(crate) stat_sinks: Vec<String>,
    pub(crate) runtime_guards: BTreeMap<String, bool>,
    pub(crate) native_filter_chain: Vec<NativeFilterEntry>,
    pub(crate) platform_filter_factories: Vec<Arc<dyn PlatformFilterFactory>>,
    pub(crate) string_accessors: BTreeMap<String, Arc<dyn StringAccessor>>,
    pub(crate) key_value_stores: BTreeMap<String, Arc<dyn KeyValueStore>>,
    pub(crate) discovery: DiscoverySettings,
    pub(crate) node_metadata: NodeMetadata,
}

impl EngineConfiguration {
    /// Start building a configuration with engine defaults.
    #[must_use]
    pub fn builder() -> EngineConfigurationBuilder { EngineConfigurationBuilder::default() }

    #[must_use]
    pub fn stats_domain(&self) -> Option<&str> { self.stats_domain.as_deref() }

    #[must_use]
    pub fn app_version(&self) -> &str { &self.app_version }

    #[must_use]
    pub fn app_id(&self) -> &str { &self.app_id }

    #[must_use]
    pub fn timeouts(&self) -> &Timeouts { &self.timeouts }

    #[must_use]
    pub fn dns(&self) -> &DnsSettings { &self.dns }

    #[must_use]
    pub fn http3(&self) -> &Http3Settings { &self.http3 }

    #[must_use]
    pub fn features(&self) -> &FeatureToggles { &self.features }

    #[must_use]
    pub fn max_connections_per_host(&self) -> u32 { self.max_connections_per_host }

    #[must_use]
    pub fn trust_chain_verification(&self) -> TrustChainVerification {
        self.trust_chain_verification
    }

    #[must_use]
    pub fn dns_preresolve_hostnames(&self) -> &[String] { &self.dns_preresolve_hostnames }

    /// QUIC hints as hostname to port.
    #[must_use]
    pub fn quic_hints(&self) -> &BTreeMap<String, u16> { &self.quic_hints }

    #[must_use]
    pub fn quic_canonical_suffixes(&self) -> &[String] { &self.quic_canonical_suffixes }

    #[must_use]
    pub fn stat_sinks(&self) -> &[String] { &self.stat_sinks }

    #[must_use]
    pub fn runtime_guards(&self) -> &BTreeMap<String, bool> { &self.runtime_guards }

    /// Statically configured native filters, without bridge entries.
    #[must_use]
    pub fn native_filter_chain(&self) -> &[NativeFilterEntry] { &self.native_filter_chain }

    /// Platform filter factories in registration order.
    #[must_use]
    pub fn platform_filter_factories(&self) -> &[Arc<dyn PlatformFilterFactory>] {
        &self.platform_filter_factories
    }

    #[must_use]
    pub fn string_accessors(&self) -> &BTreeMap<String, Arc<dyn StringAccessor>> {
        &self.string_accessors
    }

    #[must_use]
    pub fn key_value_stores(&self) -> &BTreeMap<String, Arc<dyn KeyValueStore>> {
        &self.key_value_stores
    }

    #[must_use]
    pub fn discovery(&self) -> &DiscoverySettings { &self.discovery }

    #[must_use]
    pub fn node_metadata(&self) -> &NodeMetadata { &self.node_metadata }
}

impl fmt::Debug for EngineConfiguration {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let platform_filters: Vec<&str> = self
            .platform_filter_factories
            .iter()
            .map(|factory| factory.filter_name())
            .collect();
        f.debug_struct("EngineConfiguration")
            .field("app_id", &self.app_id)
            .field("app_version", &self.app_version)
            .field("native_filter_chain", &self.native_filter_chain)
            .field("platform_filters", &platform_filters)
            .field("string_accessors", &self.string_accessors.keys())
            .field("key_value_stores", &self.key_value_stores.keys())
            .finish_non_exhaustive()
    }
}
