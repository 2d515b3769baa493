//! In-process stand-in for the native engine.
//!
//! [`DryRunEngine`] accepts bootstrap requests without starting anything. It
//! records each request, tracks which bootstraps are still live and which
//! platform APIs were registered, and can be told to fail construction. The
//! `engine-bridge` binary and the test suites use it in place of the real
//! runtime.

use std::{
    num::NonZeroU64,
    sync::{
        Mutex,
        PoisonError,
        atomic::{AtomicU64, Ordering},
    },
};

use dashmap::{DashMap, DashSet, mapref::entry::Entry};
use tracing::{debug, info};

use super::{BootstrapRequest, Engine, EngineError, RawBootstrap};
use crate::platform::PlatformApi;

/// Engine double that records what it was asked to do.
#[derive(Debug, Default)]
pub struct DryRunEngine {
    next_bootstrap: AtomicU64,
    requests: Mutex<Vec<BootstrapRequest>>,
    live: DashSet<RawBootstrap>,
    apis: DashMap<String, PlatformApi>,
    failure: Option<String>,
}

impl DryRunEngine {
    /// Create an engine that accepts every request.
    #[must_use]
    pub fn new() -> Self { Self::default() }

    /// Create an engine whose bootstrap construction always fails with
    /// `reason`.
    #[must_use]
    pub fn failing(reason: impl Into<String>) -> Self {
        Self {
            failure: Some(reason.into()),
            ..Self::default()
        }
    }

    /// Requests received so far, oldest first.
    #[must_use]
    pub fn requests(&self) -> Vec<BootstrapRequest> {
        self.requests
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .clone()
    }

    /// The most recent request, if any.
    #[must_use]
    pub fn last_request(&self) -> Option<BootstrapRequest> { self.requests().pop() }

    /// Number of bootstraps constructed and not yet released.
    #[must_use]
    pub fn live_bootstraps(&self) -> usize { self.live.len() }

    /// Whether `bootstrap` is still held by its owner.
    #[must_use]
    pub fn is_live(&self, bootstrap: RawBootstrap) -> bool { self.live.contains(&bootstrap) }

    /// Kind of the capability registered under `name`.
    #[must_use]
    pub fn registered_api(&self, name: &str) -> Option<&'static str> {
        self.apis.get(name).map(|api| api.kind())
    }

    /// Number of registered platform APIs.
    #[must_use]
    pub fn registered_api_count(&self) -> usize { self.apis.len() }
}

impl Engine for DryRunEngine {
    fn create_bootstrap(&self, request: BootstrapRequest) -> Result<RawBootstrap, EngineError> {
        if let Some(reason) = &self.failure {
            return Err(EngineError::Bootstrap(reason.clone()));
        }
        let id = self.next_bootstrap.fetch_add(1, Ordering::Relaxed) + 1;
        let raw = NonZeroU64::new(id)
            .map(RawBootstrap::new)
            .ok_or_else(|| EngineError::Bootstrap("bootstrap ids exhausted".to_owned()))?;
        info!(
            bootstrap = raw.get(),
            filters = request.filter_chain.len() / 2,
            "dry-run bootstrap constructed"
        );
        self.requests
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .push(request);
        self.live.insert(raw);
        Ok(raw)
    }

    fn release_bootstrap(&self, bootstrap: RawBootstrap) {
        if self.live.remove(&bootstrap).is_none() {
            debug!(bootstrap = bootstrap.get(), "release of unknown bootstrap ignored");
        }
    }

    fn register_platform_api(&self, name: &str, api: PlatformApi) -> Result<(), EngineError> {
        match self.apis.entry(name.to_owned()) {
            Entry::Occupied(_) => Err(EngineError::DuplicateApi {
                name: name.to_owned(),
            }),
            Entry::Vacant(vacant) => {
                debug!(name, kind = api.kind(), "platform api registered");
                vacant.insert(api);
                Ok(())
            }
        }
    }
}
