#![doc(html_root_url = "https://docs.rs/engine_bridge/latest")]
//! Public API for the `engine_bridge` library.
//!
//! This crate sits between an application and an embedded HTTP engine
//! running in the same process. It assembles typed configuration into the
//! bootstrap the engine consumes, and redelivers the engine's per-stream
//! events to application callbacks on an executor the application chooses.
//!
//! Call [`init::initialize`] once before building any configuration.

pub mod codec;
pub mod config;
pub mod dispatch;
pub mod engine;
pub mod executor;
pub mod filter;
pub mod headers;
pub mod init;
pub mod intel;
pub mod metrics;
pub mod platform;

pub use config::{
    ConfigError,
    EngineConfiguration,
    EngineConfigurationBuilder,
    MetadataValue,
    NodeMetadata,
    TrustChainVerification,
};
pub use dispatch::{
    CallbackDispatchContext,
    Delivery,
    DispatchError,
    EventKind,
    Phase,
    StreamCallbacks,
    StreamError,
    StreamEvent,
    StreamId,
};
pub use engine::{BootstrapHandle, Engine, EngineError, StreamRegistry, StreamRegistryError};
pub use executor::{Executor, Job, SerialExecutor};
pub use filter::{FilterChain, NativeFilterEntry, build_filter_chain};
pub use headers::{HeaderAccumulator, HeaderMap};
pub use intel::{FinalStreamIntel, StreamIntel};
pub use platform::{KeyValueStore, NamedFilter, PlatformApi, PlatformFilterFactory, StringAccessor};
