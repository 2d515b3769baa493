//! Process-wide library initialisation.
//!
//! [`initialize`] must run once before any configuration is built. It is
//! idempotent: later calls return the same [`Library`]. Nothing in this crate
//! initialises the library implicitly.

use std::{
    sync::{
        OnceLock,
        atomic::{AtomicU64, Ordering},
    },
    time::Instant,
};

use tracing::info;

use crate::dispatch::StreamId;

static LIBRARY: OnceLock<Library> = OnceLock::new();

/// Process-wide state shared by every engine instance.
#[derive(Debug)]
pub struct Library {
    next_stream: AtomicU64,
    initialized_at: Instant,
}

impl Library {
    fn new() -> Self {
        Self {
            next_stream: AtomicU64::new(0),
            initialized_at: Instant::now(),
        }
    }

    /// Allocate a process-unique stream identifier.
    pub fn next_stream_id(&self) -> StreamId {
        StreamId::new(self.next_stream.fetch_add(1, Ordering::Relaxed))
    }

    /// When the library was initialised.
    #[must_use]
    pub fn initialized_at(&self) -> Instant { self.initialized_at }
}

/// Initialise the library for this process, returning the shared state.
pub fn initialize() -> &'static Library {
    LIBRARY.get_or_init(|| {
        info!(version = env!("CARGO_PKG_VERSION"), "engine bridge initialised");
        Library::new()
    })
}

/// The shared state, if [`initialize`] has run.
#[must_use]
pub fn library() -> Option<&'static Library> { LIBRARY.get() }
