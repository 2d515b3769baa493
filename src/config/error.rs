//! Errors raised while building or assembling engine configuration.

use thiserror::Error;

use crate::engine::EngineError;

/// Configuration errors are fatal to engine startup: no bootstrap is
/// produced when one is returned.
#[non_exhaustive]
#[derive(Debug, Error)]
pub enum ConfigError {
    /// A string setting still contains a `{{ key }}` template placeholder.
    #[error("unresolved template key: {key} (in {setting})")]
    UnresolvedTemplateKey {
        /// Name inside the placeholder.
        key: String,
        /// Setting the placeholder was found in.
        setting: String,
    },
    /// The node metadata document cannot be serialised.
    #[error("invalid node metadata: {0}")]
    InvalidMetadata(String),
    /// Two platform filter factories share a name.
    #[error("platform filter {0} registered more than once")]
    DuplicatePlatformFilter(String),
    /// The library has not been initialised for this process.
    #[error("engine_bridge::init::initialize must run before configuration is built")]
    NotInitialized,
    /// The engine rejected the bootstrap or a registration.
    #[error("engine error: {0}")]
    Engine(#[from] EngineError),
}
