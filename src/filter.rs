//! Native filter chain composition.
//!
//! Platform filter factories are bridged into the native chain by
//! synthesising one platform-bridge entry per factory. Bridge entries occupy
//! the front of the chain in registration order, followed by the statically
//! configured native entries. The engine evaluates the chain tail-to-head
//! relative to this registration list, so the composed chain is reversed as a
//! whole before handoff via [`FilterChain::into_engine_order`].

use std::sync::Arc;

use serde::{Deserialize, Serialize};

use crate::platform::PlatformFilterFactory;

/// Filter type name used for every bridged platform filter.
pub const PLATFORM_BRIDGE_FILTER: &str = "envoy.filters.http.platform_bridge";

const BRIDGE_CONFIG_PREFIX: &str = "{'@type': \
                                    type.googleapis.com/envoymobile.extensions.filters.http.\
                                    platform_bridge.PlatformBridge, platform_filter_name: ";
const BRIDGE_CONFIG_SUFFIX: &str = "}";

/// A single entry in the native filter chain.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct NativeFilterEntry {
    name: String,
    config: String,
}

impl NativeFilterEntry {
    /// Create an entry from a filter type name and its typed config payload.
    pub fn new(name: impl Into<String>, config: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            config: config.into(),
        }
    }

    /// Synthesise the bridge entry routing engine calls to `filter_name`.
    ///
    /// ```
    /// use engine_bridge::filter::NativeFilterEntry;
    ///
    /// let entry = NativeFilterEntry::platform_bridge("auth");
    /// assert_eq!(entry.platform_filter_name(), Some("auth"));
    /// ```
    #[must_use]
    pub fn platform_bridge(filter_name: &str) -> Self {
        Self::new(
            PLATFORM_BRIDGE_FILTER,
            format!("{BRIDGE_CONFIG_PREFIX}{filter_name}{BRIDGE_CONFIG_SUFFIX}"),
        )
    }

    /// Filter type name.
    #[must_use]
    pub fn name(&self) -> &str { &self.name }

    /// Opaque filter-specific config payload.
    #[must_use]
    pub fn config(&self) -> &str { &self.config }

    /// Name of the platform filter a bridge entry routes to.
    ///
    /// Returns `None` for native-only entries.
    #[must_use]
    pub fn platform_filter_name(&self) -> Option<&str> {
        if self.name != PLATFORM_BRIDGE_FILTER {
            return None;
        }
        self.config
            .strip_prefix(BRIDGE_CONFIG_PREFIX)?
            .strip_suffix(BRIDGE_CONFIG_SUFFIX)
    }
}

/// Composed filter chain in registration order.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct FilterChain(Vec<NativeFilterEntry>);

impl FilterChain {
    /// Entries in registration order: bridges first, then native entries.
    #[must_use]
    pub fn entries(&self) -> &[NativeFilterEntry] { &self.0 }

    /// Number of entries in the chain.
    #[must_use]
    pub fn len(&self) -> usize { self.0.len() }

    /// Whether the chain has no entries.
    #[must_use]
    pub fn is_empty(&self) -> bool { self.0.is_empty() }

    /// Consume the chain, returning the order the engine expects.
    ///
    /// The engine applies filters tail-to-head relative to registration, so
    /// the first entry handed over is the last registered one.
    #[must_use]
    pub fn into_engine_order(self) -> Vec<NativeFilterEntry> {
        let mut entries = self.0;
        entries.reverse();
        entries
    }
}

/// Compose the native chain with bridge entries for every platform factory.
///
/// An empty factory list passes the native chain through unchanged.
#[must_use]
pub fn build_filter_chain(
    native: &[NativeFilterEntry],
    factories: &[Arc<dyn PlatformFilterFactory>],
) -> FilterChain {
    let mut entries = Vec::with_capacity(factories.len() + native.len());
    entries.extend(
        factories
            .iter()
            .map(|factory| NativeFilterEntry::platform_bridge(factory.filter_name())),
    );
    entries.extend_from_slice(native);
    FilterChain(entries)
}

#[cfg(test)]
mod tests {
    use std::sync::Arc;

    use proptest::prelude::*;

    use super::*;
    use crate::platform::NamedFilter;

    fn factories(names: &[&str]) -> Vec<Arc<dyn PlatformFilterFactory>> {
        names
            .iter()
            .map(|name| Arc::new(NamedFilter::new(*name)) as Arc<dyn PlatformFilterFactory>)
            .collect()
    }

    #[test]
    fn bridges_precede_native_entries() {
        let native = [
            NativeFilterEntry::new("A", "a"),
            NativeFilterEntry::new("B", "b"),
        ];
        let chain = build_filter_chain(&native, &factories(&["F1", "F2"]));

        let bridged: Vec<_> = chain
            .entries()
            .iter()
            .map(NativeFilterEntry::platform_filter_name)
            .collect();
        assert_eq!(bridged, [Some("F1"), Some("F2"), None, None]);
        assert_eq!(&chain.entries()[2..], &native);
    }

    #[test]
    fn engine_order_is_reversed() {
        let native = [
            NativeFilterEntry::new("A", "a"),
            NativeFilterEntry::new("B", "b"),
        ];
        let engine_order = build_filter_chain(&native, &factories(&["F1", "F2"])).into_engine_order();

        assert_eq!(engine_order[0], native[1]);
        assert_eq!(engine_order[1], native[0]);
        assert_eq!(engine_order[2].platform_filter_name(), Some("F2"));
        assert_eq!(engine_order[3].platform_filter_name(), Some("F1"));
    }

    #[test]
    fn no_factories_passes_native_chain_through() {
        let native = [NativeFilterEntry::new("A", "a")];
        let chain = build_filter_chain(&native, &[]);
        assert_eq!(chain.entries(), &native);
    }

    #[test]
    fn bridge_config_embeds_filter_name() {
        let entry = NativeFilterEntry::platform_bridge("demo");
        assert_eq!(entry.name(), PLATFORM_BRIDGE_FILTER);
        assert!(entry.config().contains("platform_filter_name: demo"));
        assert!(entry.config().contains("PlatformBridge"));
    }

    #[test]
    fn native_entry_with_bridge_like_config_is_not_a_bridge() {
        let entry = NativeFilterEntry::new("envoy.filters.http.buffer", "platform_filter_name: x");
        assert_eq!(entry.platform_filter_name(), None);
    }

    proptest! {
        #[test]
        fn one_bridge_per_factory(
            native_names in proptest::collection::vec("[a-z]{1,8}", 0..6),
            factory_names in proptest::collection::vec("[A-Z]{1,8}", 0..6),
        ) {
            let native: Vec<_> = native_names
                .iter()
                .map(|name| NativeFilterEntry::new(name.as_str(), "{}"))
                .collect();
            let names: Vec<&str> = factory_names.iter().map(String::as_str).collect();
            let chain = build_filter_chain(&native, &factories(&names));

            prop_assert_eq!(chain.len(), native.len() + names.len());
            let bridged: Vec<&str> = chain
                .entries()
                .iter()
                .filter_map(NativeFilterEntry::platform_filter_name)
                .collect();
            prop_assert_eq!(&bridged, &names);
            prop_assert_eq!(&chain.entries()[names.len()..], native.as_slice());

            let last = chain.entries().last().cloned();
            prop_assert_eq!(chain.into_engine_order().first().cloned(), last);
        }
    }
}
