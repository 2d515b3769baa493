//! Builder for [`EngineConfiguration`].

use std::{collections::BTreeMap, sync::Arc};

use super::{
    ConfigError,
    DiscoverySettings,
    DnsSettings,
    EngineConfiguration,
    FeatureToggles,
    Http3Settings,
    NodeMetadata,
    Timeouts,
    TrustChainVerification,
    defaults::{DEFAULT_APP_ID, DEFAULT_APP_VERSION, DEFAULT_MAX_CONNECTIONS_PER_HOST},
};
use crate::{
    filter::NativeFilterEntry,
    init,
    platform::{KeyValueStore, PlatformFilterFactory, StringAccessor},
};

/// Chainable builder producing an immutable [`EngineConfiguration`].
///
/// ```
/// use engine_bridge::{config::EngineConfiguration, filter::NativeFilterEntry, init};
///
/// init::initialize();
/// let config = EngineConfiguration::builder()
///     .app_id("com.example.app")
///     .add_native_filter(NativeFilterEntry::new("envoy.filters.http.buffer", "{}"))
///     .add_quic_hint("www.example.com", 443)
///     .build()
///     .expect("library initialised");
/// assert_eq!(config.app_id(), "com.example.app");
/// ```
#[must_use]
pub struct EngineConfigurationBuilder {
    config: EngineConfiguration,
}

impl Default for EngineConfigurationBuilder {
    fn default() -> Self {
        Self {
            config: EngineConfiguration {
                stats_domain: None,
                app_version: DEFAULT_APP_VERSION.to_owned(),
                app_id: DEFAULT_APP_ID.to_owned(),
                timeouts: Timeouts::default(),
                dns: DnsSettings::default(),
                http3: Http3Settings::default(),
                features: FeatureToggles::default(),
                max_connections_per_host: DEFAULT_MAX_CONNECTIONS_PER_HOST,
                trust_chain_verification: TrustChainVerification::default(),
                dns_preresolve_hostnames: Vec::new(),
                quic_hints: BTreeMap::new(),
                quic_canonical_suffixes: Vec::new(),
                stat_sinks: Vec::new(),
                runtime_guards: BTreeMap::new(),
                native_filter_chain: Vec::new(),
                platform_filter_factories: Vec::new(),
                string_accessors: BTreeMap::new(),
                key_value_stores: BTreeMap::new(),
                discovery: DiscoverySettings::default(),
                node_metadata: NodeMetadata::default(),
            },
        }
    }
}

impl EngineConfigurationBuilder {
    /// Domain stats are flushed to over gRPC.
    pub fn stats_domain(mut self, domain: impl Into<String>) -> Self {
        self.config.stats_domain = Some(domain.into());
        self
    }

    pub fn app_version(mut self, version: impl Into<String>) -> Self {
        self.config.app_version = version.into();
        self
    }

    pub fn app_id(mut self, id: impl Into<String>) -> Self {
        self.config.app_id = id.into();
        self
    }

    pub fn timeouts(mut self, timeouts: Timeouts) -> Self {
        self.config.timeouts = timeouts;
        self
    }

    pub fn dns(mut self, dns: DnsSettings) -> Self {
        self.config.dns = dns;
        self
    }

    pub fn http3(mut self, http3: Http3Settings) -> Self {
        self.config.http3 = http3;
        self
    }

    pub fn features(mut self, features: FeatureToggles) -> Self {
        self.config.features = features;
        self
    }

    /// Maximum connections opened to a single host. Clamped to at least one.
    pub fn max_connections_per_host(mut self, max: u32) -> Self {
        self.config.max_connections_per_host = max.max(1);
        self
    }

    pub fn trust_chain_verification(mut self, mode: TrustChainVerification) -> Self {
        self.config.trust_chain_verification = mode;
        self
    }

    /// Hostname resolved as soon as the engine starts.
    pub fn add_dns_preresolve_hostname(mut self, hostname: impl Into<String>) -> Self {
        self.config.dns_preresolve_hostnames.push(hostname.into());
        self
    }

    /// Host known to speak QUIC on `port`. Re-adding a host replaces its port.
    pub fn add_quic_hint(mut self, host: impl Into<String>, port: u16) -> Self {
        self.config.quic_hints.insert(host.into(), port);
        self
    }

    /// Hostname suffix whose hosts are known to speak QUIC.
    pub fn add_quic_canonical_suffix(mut self, suffix: impl Into<String>) -> Self {
        self.config.quic_canonical_suffixes.push(suffix.into());
        self
    }

    pub fn add_stat_sink(mut self, sink: impl Into<String>) -> Self {
        self.config.stat_sinks.push(sink.into());
        self
    }

    /// Override a runtime guard flag.
    pub fn set_runtime_guard(mut self, name: impl Into<String>, enabled: bool) -> Self {
        self.config.runtime_guards.insert(name.into(), enabled);
        self
    }

    /// Append a statically configured native filter.
    pub fn add_native_filter(mut self, entry: NativeFilterEntry) -> Self {
        self.config.native_filter_chain.push(entry);
        self
    }

    /// Register a platform filter factory. Registration order is preserved.
    pub fn add_platform_filter(mut self, factory: Arc<dyn PlatformFilterFactory>) -> Self {
        self.config.platform_filter_factories.push(factory);
        self
    }

    pub fn add_string_accessor(
        mut self,
        name: impl Into<String>,
        accessor: Arc<dyn StringAccessor>,
    ) -> Self {
        self.config.string_accessors.insert(name.into(), accessor);
        self
    }

    pub fn add_key_value_store(
        mut self,
        name: impl Into<String>,
        store: Arc<dyn KeyValueStore>,
    ) -> Self {
        self.config.key_value_stores.insert(name.into(), store);
        self
    }

    pub fn discovery(mut self, discovery: DiscoverySettings) -> Self {
        self.config.discovery = discovery;
        self
    }

    pub fn node_metadata(mut self, metadata: NodeMetadata) -> Self {
        self.config.node_metadata = metadata;
        self
    }

    /// Finish building.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError::NotInitialized`] if [`init::initialize`] has not
    /// run in this process.
    pub fn build(self) -> Result<EngineConfiguration, ConfigError> {
        if init::library().is_none() {
            return Err(ConfigError::NotInitialized);
        }
        Ok(self.config)
    }
}
