//! Application-supplied capability objects referenced from configuration.
//!
//! The engine only cares about the stable name under which each capability
//! is registered and, for filter factories, their registration order. Their
//! behaviour runs in application code and is not modelled here.

use std::fmt;

/// Factory for a filter implemented in application code.
///
/// Each factory is bridged into the native filter chain through a
/// platform-bridge entry carrying [`PlatformFilterFactory::filter_name`].
pub trait PlatformFilterFactory: Send + Sync + 'static {
    /// Stable name the engine uses to route bridged calls back to this
    /// factory.
    fn filter_name(&self) -> &str;
}

/// Read-only string lookup exposed to engine filters.
pub trait StringAccessor: Send + Sync + 'static {
    /// Return the current value.
    fn get_string(&self) -> String;
}

/// Persistent key/value storage exposed to engine filters.
pub trait KeyValueStore: Send + Sync + 'static {
    /// Read the value stored under `key`.
    fn read(&self, key: &str) -> Option<String>;

    /// Store `value` under `key`.
    fn save(&self, key: &str, value: &str);

    /// Delete any value stored under `key`.
    fn remove(&self, key: &str);
}

/// A capability registered with the engine under a name.
#[derive(Clone)]
pub enum PlatformApi {
    /// Bridged HTTP filter factory.
    Filter(std::sync::Arc<dyn PlatformFilterFactory>),
    /// String accessor.
    StringAccessor(std::sync::Arc<dyn StringAccessor>),
    /// Key/value store.
    KeyValueStore(std::sync::Arc<dyn KeyValueStore>),
}

impl PlatformApi {
    /// Short label describing the capability kind.
    #[must_use]
    pub fn kind(&self) -> &'static str {
        match self {
            PlatformApi::Filter(_) => "filter",
            PlatformApi::StringAccessor(_) => "string_accessor",
            PlatformApi::KeyValueStore(_) => "key_value_store",
        }
    }
}

impl fmt::Debug for PlatformApi {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_tuple("PlatformApi").field(&self.kind()).finish()
    }
}

/// Filter factory identified only by name.
///
/// Useful when the filter implementation is registered with the engine by
/// other means, and for dry runs.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct NamedFilter(String);

impl NamedFilter {
    /// Create a factory with the given stable name.
    pub fn new(name: impl Into<String>) -> Self { Self(name.into()) }
}

impl PlatformFilterFactory for NamedFilter {
    fn filter_name(&self) -> &str { &self.0 }
}
