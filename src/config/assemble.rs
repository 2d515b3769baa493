//! Turn an [`EngineConfiguration`] into an engine bootstrap.

use std::{collections::HashSet, sync::Arc};

use bytes::Bytes;
use tracing::{debug, info};

use super::{ConfigError, EngineConfiguration, template};
use crate::{
    codec::{encode_filter_chain, encode_mapping, encode_strings},
    engine::{BootstrapHandle, BootstrapRequest, Engine},
    filter::build_filter_chain,
    metrics,
    platform::PlatformApi,
};

impl EngineConfiguration {
    /// Validate the configuration and construct the engine bootstrap.
    ///
    /// Runs once per engine instance, before any stream traffic. Template
    /// placeholders are rejected before anything else happens, so the engine
    /// is never called with an unresolved configuration. The returned handle
    /// releases the bootstrap when dropped; this call does not start the
    /// engine.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError::UnresolvedTemplateKey`] for a `{{ key }}`
    /// placeholder in any string setting, [`ConfigError::InvalidMetadata`]
    /// for malformed node metadata, and [`ConfigError::Engine`] if the engine
    /// rejects the request.
    pub fn assemble(&self, engine: &Arc<dyn Engine>) -> Result<BootstrapHandle, ConfigError> {
        self.check_templates()?;

        let enforce_trust_chain_verification = self.trust_chain_verification.enforces();

        let chain = build_filter_chain(&self.native_filter_chain, &self.platform_filter_factories);
        debug!(
            bridged = self.platform_filter_factories.len(),
            native = self.native_filter_chain.len(),
            "filter chain composed"
        );
        let filter_chain = encode_filter_chain(&chain.into_engine_order());

        let runtime_guards = encode_mapping(
            self.runtime_guards
                .iter()
                .map(|(name, enabled)| (name.as_str(), if *enabled { "true" } else { "false" })),
        );
        let quic_hints = encode_mapping(
            self.quic_hints
                .iter()
                .map(|(host, port)| (host.as_str(), port.to_string())),
        );

        let node_metadata = Bytes::from(self.node_metadata.to_canonical_bytes()?);

        let request = BootstrapRequest {
            stats_domain: self.stats_domain.clone(),
            app_version: self.app_version.clone(),
            app_id: self.app_id.clone(),
            timeouts: self.timeouts,
            dns: self.dns,
            http3: self.http3.clone(),
            features: self.features,
            max_connections_per_host: self.max_connections_per_host,
            enforce_trust_chain_verification,
            discovery: self.discovery.clone(),
            filter_chain,
            stat_sinks: encode_strings(&self.stat_sinks),
            dns_preresolve_hostnames: encode_strings(&self.dns_preresolve_hostnames),
            runtime_guards,
            quic_hints,
            quic_canonical_suffixes: encode_strings(&self.quic_canonical_suffixes),
            node_metadata,
        };

        let raw = engine.create_bootstrap(request)?;
        metrics::inc_bootstraps();
        info!(bootstrap = raw.get(), app_id = %self.app_id, "bootstrap constructed");
        Ok(BootstrapHandle::new(raw, Arc::clone(engine)))
    }

    /// Register every platform filter factory, string accessor and key/value
    /// store with the engine under its configured name.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError::DuplicatePlatformFilter`] if two factories
    /// share a name, and [`ConfigError::Engine`] if the engine rejects a
    /// registration.
    pub fn register_platform_apis(&self, engine: &dyn Engine) -> Result<(), ConfigError> {
        let mut seen = HashSet::new();
        for factory in &self.platform_filter_factories {
            let name = factory.filter_name();
            if !seen.insert(name) {
                return Err(ConfigError::DuplicatePlatformFilter(name.to_owned()));
            }
        }

        for factory in &self.platform_filter_factories {
            engine.register_platform_api(
                factory.filter_name(),
                PlatformApi::Filter(Arc::clone(factory)),
            )?;
        }
        for (name, accessor) in &self.string_accessors {
            engine.register_platform_api(name, PlatformApi::StringAccessor(Arc::clone(accessor)))?;
        }
        for (name, store) in &self.key_value_stores {
            engine.register_platform_api(name, PlatformApi::KeyValueStore(Arc::clone(store)))?;
        }
        debug!(
            filters = self.platform_filter_factories.len(),
            string_accessors = self.string_accessors.len(),
            key_value_stores = self.key_value_stores.len(),
            "platform apis registered"
        );
        Ok(())
    }

    fn check_templates(&self) -> Result<(), ConfigError> {
        if let Some(domain) = &self.stats_domain {
            template::check("stats_domain", domain)?;
        }
        template::check("app_version", &self.app_version)?;
        template::check("app_id", &self.app_id)?;
        template::check("http3.connection_options", &self.http3.connection_options)?;
        template::check(
            "http3.client_connection_options",
            &self.http3.client_connection_options,
        )?;
        template::check_all(
            "dns_preresolve_hostnames",
            self.dns_preresolve_hostnames.iter().map(String::as_str),
        )?;
        template::check_all("quic_hints", self.quic_hints.keys().map(String::as_str))?;
        template::check_all(
            "quic_canonical_suffixes",
            self.quic_canonical_suffixes.iter().map(String::as_str),
        )?;
        template::check_all("stat_sinks", self.stat_sinks.iter().map(String::as_str))?;
        template::check_all("runtime_guards", self.runtime_guards.keys().map(String::as_str))?;
        for entry in &self.native_filter_chain {
            template::check("native_filter_chain", entry.name())?;
            template::check("native_filter_chain", entry.config())?;
        }
        template::check_all(
            "platform_filters",
            self.platform_filter_factories
                .iter()
                .map(|factory| factory.filter_name()),
        )?;
        template::check_all("string_accessors", self.string_accessors.keys().map(String::as_str))?;
        template::check_all("key_value_stores", self.key_value_stores.keys().map(String::as_str))?;

        let discovery = &self.discovery;
        if let Some(xds) = &discovery.xds {
            template::check("xds.address", &xds.address)?;
            template::check("xds.auth_header", &xds.auth_header)?;
            template::check("xds.auth_token", &xds.auth_token)?;
            template::check("xds.root_certs", &xds.root_certs)?;
            template::check("xds.sni", &xds.sni)?;
        }
        template::check("node.id", &discovery.node.id)?;
        template::check("node.region", &discovery.node.region)?;
        template::check("node.zone", &discovery.node.zone)?;
        template::check("node.sub_zone", &discovery.node.sub_zone)?;
        if let Some(rtds) = &discovery.rtds {
            template::check("rtds.resource_name", &rtds.resource_name)?;
        }
        template::check("cds.resources_locator", &discovery.cds.resources_locator)?;
        self.node_metadata
            .try_for_each_str(|value| template::check("node_metadata", value))
    }
}
