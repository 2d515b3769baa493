//! Delivery of engine stream events to application callbacks.
//!
//! The engine reports each stream's lifecycle through the entry points of a
//! [`CallbackDispatchContext`]. The context rebuilds header and trailer
//! blocks, parses intel snapshots, and prepares one [`Delivery`] per event.
//! Submitting a delivery hands exactly one [`Job`] to the executor the
//! application chose. Preparing never runs application code, so callers can
//! release their locks before submitting.
//!
//! Terminal entry points consume the context, so no event can follow the
//! terminal one. Concurrent terminal calls are gated by
//! [`crate::engine::StreamRegistry`].
//!
//! [`Job`]: crate::executor::Job

use std::{fmt, sync::Arc};

use bytes::Bytes;
use thiserror::Error;

use crate::{
    executor::Executor,
    headers::{HeaderCountMismatch, HeaderMap},
    intel::{FinalStreamIntel, IntelError, StreamIntel},
};

mod context;
mod event;

pub use context::{CallbackDispatchContext, Delivery, Phase};
pub use event::{EventKind, StreamEvent};

/// Identifier of a stream allocated by [`crate::init::Library`].
#[derive(Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct StreamId(u64);

impl StreamId {
    /// Wrap a raw identifier.
    #[must_use]
    pub const fn new(id: u64) -> Self { Self(id) }

    /// Return the raw identifier.
    #[must_use]
    pub const fn as_u64(self) -> u64 { self.0 }
}

impl From<u64> for StreamId {
    fn from(value: u64) -> Self { Self(value) }
}

impl fmt::Display for StreamId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result { write!(f, "stream-{}", self.0) }
}

/// A stream failure reported by the engine.
///
/// Failures are ordinary outcomes forwarded to
/// [`StreamCallbacks::on_error`]; this layer never retries them.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct StreamError {
    /// Engine-assigned error code.
    pub code: i32,
    /// Human-readable description.
    pub message: String,
    /// Attempts made before the failure.
    pub attempt_count: i32,
}

impl fmt::Display for StreamError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "stream error {} after {} attempt(s): {}",
            self.code, self.attempt_count, self.message
        )
    }
}

/// Breach of the engine's event contract.
///
/// The offending event is not delivered and the stream should be aborted.
#[non_exhaustive]
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum DispatchError {
    /// The header or trailer block did not match its declared size.
    #[error(transparent)]
    HeaderCount(#[from] HeaderCountMismatch),
    /// An intel array was malformed.
    #[error(transparent)]
    Intel(#[from] IntelError),
    /// The event cannot follow the stream's current phase.
    #[error("{event} event not allowed in phase {phase}")]
    OutOfOrder { event: EventKind, phase: Phase },
}

/// Application callbacks for a single stream.
///
/// Every event method has a no-op default, so implementors only override
/// what they care about. Exactly one of [`on_error`](Self::on_error),
/// [`on_cancel`](Self::on_cancel) and [`on_complete`](Self::on_complete)
/// fires per stream, and it fires last.
pub trait StreamCallbacks: Send + Sync + 'static {
    /// Execution context that runs these callbacks.
    fn executor(&self) -> Arc<dyn Executor>;

    /// A complete header block arrived.
    fn on_headers(&self, _headers: HeaderMap, _end_stream: bool, _intel: StreamIntel) {}

    /// A body chunk arrived.
    fn on_data(&self, _data: Bytes, _end_stream: bool, _intel: StreamIntel) {}

    /// A complete trailer block arrived. Trailers always end the stream.
    fn on_trailers(&self, _trailers: HeaderMap, _intel: StreamIntel) {}

    /// The stream failed.
    fn on_error(&self, _error: StreamError, _intel: StreamIntel, _final_intel: FinalStreamIntel) {}

    /// The stream was cancelled.
    fn on_cancel(&self, _intel: StreamIntel, _final_intel: FinalStreamIntel) {}

    /// The engine can accept more request body.
    fn on_send_window_available(&self, _intel: StreamIntel) {}

    /// The stream finished successfully.
    fn on_complete(&self, _intel: StreamIntel, _final_intel: FinalStreamIntel) {}
}
