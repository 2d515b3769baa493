//! The boundary to the native engine.
//!
//! Every call into the engine goes through the narrow [`Engine`] trait so a
//! test double such as [`DryRunEngine`] can stand in for the real runtime.
//! Engine-side resources come back as owned handles that release themselves
//! when dropped.

use thiserror::Error;

use crate::platform::PlatformApi;

mod bootstrap;
mod dry_run;
pub mod streams;

pub use bootstrap::{BootstrapHandle, BootstrapRequest, RawBootstrap};
pub use dry_run::DryRunEngine;
pub use streams::{StreamRegistry, StreamRegistryError};

/// Failures reported by the engine.
#[non_exhaustive]
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum EngineError {
    /// The engine could not construct a bootstrap from the request.
    #[error("bootstrap construction failed: {0}")]
    Bootstrap(String),
    /// A platform API was registered under a name already in use.
    #[error("platform api {name} already registered")]
    DuplicateApi {
        /// Registration name.
        name: String,
    },
}

/// Entry points the engine exposes to this crate.
pub trait Engine: Send + Sync + 'static {
    /// Construct a bootstrap from the request.
    ///
    /// # Errors
    ///
    /// Returns [`EngineError::Bootstrap`] if construction fails.
    fn create_bootstrap(&self, request: BootstrapRequest) -> Result<RawBootstrap, EngineError>;

    /// Release a bootstrap previously returned by [`Engine::create_bootstrap`].
    fn release_bootstrap(&self, bootstrap: RawBootstrap);

    /// Register an application capability under `name`.
    ///
    /// # Errors
    ///
    /// Returns [`EngineError::DuplicateApi`] if `name` is taken.
    fn register_platform_api(&self, name: &str, api: PlatformApi) -> Result<(), EngineError>;
}
