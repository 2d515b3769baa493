//! Per-stream state machine driven by the engine.

use std::{
    fmt,
    sync::{
        Arc,
        atomic::{AtomicBool, Ordering},
    },
};

use bytes::Bytes;
use tracing::trace;

use super::{DispatchError, EventKind, StreamCallbacks, StreamError, StreamEvent, StreamId};
use crate::{
    executor::Executor,
    headers::HeaderAccumulator,
    intel::{FinalStreamIntel, StreamIntel},
};

/// How far a stream's response has progressed.
///
/// Phases only move forward: `Open → Headers → Body → Trailers`. Several
/// header blocks may arrive before the body. Send-window notifications and
/// terminal events are accepted in every phase.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, PartialOrd, Ord)]
pub enum Phase {
    /// No event delivered yet.
    #[default]
    Open,
    /// At least one header block delivered.
    Headers,
    /// Body data delivered.
    Body,
    /// Trailers delivered; only terminal events may follow.
    Trailers,
}

impl Phase {
    /// Stable lowercase label.
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Open => "open",
            Self::Headers => "headers",
            Self::Body => "body",
            Self::Trailers => "trailers",
        }
    }

    /// Phase reached by accepting `kind`, or `None` if `kind` may not
    /// follow this phase.
    #[must_use]
    pub const fn advance(self, kind: EventKind) -> Option<Self> {
        match (self, kind) {
            (Self::Open | Self::Headers, EventKind::Headers) => Some(Self::Headers),
            (Self::Headers | Self::Body, EventKind::Data) => Some(Self::Body),
            (Self::Headers | Self::Body, EventKind::Trailers) => Some(Self::Trailers),
            (_, EventKind::Headers | EventKind::Data | EventKind::Trailers) => None,
            (phase, _) => Some(phase),
        }
    }
}

impl fmt::Display for Phase {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result { f.write_str(self.as_str()) }
}

/// Engine-facing entry points for one stream.
///
/// Each entry point produces at most one [`Delivery`] bound to the executor
/// returned by [`StreamCallbacks::executor`], which is captured once when
/// the context is created. Malformed or out-of-order input is reported as a
/// [`DispatchError`] and produces nothing.
pub struct CallbackDispatchContext {
    stream_id: StreamId,
    callbacks: Arc<dyn StreamCallbacks>,
    executor: Arc<dyn Executor>,
    accumulator: HeaderAccumulator,
    phase: Phase,
    ended: Arc<AtomicBool>,
}

impl CallbackDispatchContext {
    /// Create the context for `stream_id`.
    pub fn new(stream_id: StreamId, callbacks: Arc<dyn StreamCallbacks>) -> Self {
        let executor = callbacks.executor();
        Self {
            stream_id,
            callbacks,
            executor,
            accumulator: HeaderAccumulator::new(),
            phase: Phase::Open,
            ended: Arc::new(AtomicBool::new(false)),
        }
    }

    /// Stream this context serves.
    #[must_use]
    pub fn stream_id(&self) -> StreamId { self.stream_id }

    /// Current phase.
    #[must_use]
    pub fn phase(&self) -> Phase { self.phase }

    /// Record one header or trailer fragment.
    ///
    /// `is_block_start` marks the first fragment of a block and discards any
    /// unfinished block.
    pub fn pass_header(&mut self, name: &[u8], value: &[u8], is_block_start: bool) {
        self.accumulator.add_fragment(name, value, is_block_start);
    }

    /// Complete a header block of `count` fragments.
    ///
    /// # Errors
    ///
    /// Returns [`DispatchError`] if the block size or intel is wrong, or if
    /// body data was already delivered.
    pub fn on_headers(
        &mut self,
        count: u64,
        end_stream: bool,
        intel: &[i64],
    ) -> Result<Delivery, DispatchError> {
        self.accumulator.begin_if_needed();
        let headers = self.accumulator.take_block(count)?;
        let intel = StreamIntel::from_slice(intel)?;
        self.advance(StreamEvent::Headers {
            headers,
            end_stream,
            intel,
        })
    }

    /// Prepare a body chunk.
    ///
    /// `data` is borrowed from the engine for the duration of the call, so
    /// it is copied into the delivery.
    ///
    /// # Errors
    ///
    /// Returns [`DispatchError`] if the intel array is malformed or no
    /// header block preceded the body.
    pub fn on_data(
        &mut self,
        data: &[u8],
        end_stream: bool,
        intel: &[i64],
    ) -> Result<Delivery, DispatchError> {
        let intel = StreamIntel::from_slice(intel)?;
        self.advance(StreamEvent::Data {
            data: Bytes::copy_from_slice(data),
            end_stream,
            intel,
        })
    }

    /// Complete a trailer block of `count` fragments.
    ///
    /// # Errors
    ///
    /// Returns [`DispatchError`] if the block size or intel is wrong, or if
    /// the stream has no headers yet or already had trailers.
    pub fn on_trailers(&mut self, count: u64, intel: &[i64]) -> Result<Delivery, DispatchError> {
        self.accumulator.begin_if_needed();
        let trailers = self.accumulator.take_block(count)?;
        let intel = StreamIntel::from_slice(intel)?;
        self.advance(StreamEvent::Trailers { trailers, intel })
    }

    /// Signal that the engine can accept more request body.
    ///
    /// # Errors
    ///
    /// Returns [`DispatchError::Intel`] if the intel array is malformed.
    pub fn on_send_window_available(&mut self, intel: &[i64]) -> Result<Delivery, DispatchError> {
        let intel = StreamIntel::from_slice(intel)?;
        Ok(self.delivery(StreamEvent::SendWindowAvailable { intel }))
    }

    /// Prepare a stream failure, ending the stream.
    ///
    /// The message bytes are decoded as UTF-8, replacing invalid sequences.
    ///
    /// # Errors
    ///
    /// Returns [`DispatchError::Intel`] if either intel array is malformed.
    pub fn on_error(
        self,
        code: i32,
        message: &[u8],
        attempt_count: i32,
        intel: &[i64],
        final_intel: &[i64],
    ) -> Result<Delivery, DispatchError> {
        let intel = StreamIntel::from_slice(intel)?;
        let final_intel = FinalStreamIntel::from_slice(final_intel)?;
        let error = StreamError {
            code,
            message: String::from_utf8_lossy(message).into_owned(),
            attempt_count,
        };
        Ok(self.delivery(StreamEvent::Error {
            error,
            intel,
            final_intel,
        }))
    }

    /// Prepare a cancellation, ending the stream.
    ///
    /// # Errors
    ///
    /// Returns [`DispatchError::Intel`] if either intel array is malformed.
    pub fn on_cancel(self, intel: &[i64], final_intel: &[i64]) -> Result<Delivery, DispatchError> {
        let intel = StreamIntel::from_slice(intel)?;
        let final_intel = FinalStreamIntel::from_slice(final_intel)?;
        Ok(self.delivery(StreamEvent::Cancel { intel, final_intel }))
    }

    /// Prepare successful completion, ending the stream.
    ///
    /// # Errors
    ///
    /// Returns [`DispatchError::Intel`] if either intel array is malformed.
    pub fn on_complete(self, intel: &[i64], final_intel: &[i64]) -> Result<Delivery, DispatchError> {
        let intel = StreamIntel::from_slice(intel)?;
        let final_intel = FinalStreamIntel::from_slice(final_intel)?;
        Ok(self.delivery(StreamEvent::Complete { intel, final_intel }))
    }

    fn advance(&mut self, event: StreamEvent) -> Result<Delivery, DispatchError> {
        let event_kind = event.kind();
        self.phase = self
            .phase
            .advance(event_kind)
            .ok_or(DispatchError::OutOfOrder {
                event: event_kind,
                phase: self.phase,
            })?;
        Ok(self.delivery(event))
    }

    fn delivery(&self, event: StreamEvent) -> Delivery {
        Delivery {
            stream_id: self.stream_id,
            event,
            callbacks: Arc::clone(&self.callbacks),
            executor: Arc::clone(&self.executor),
            ended: Arc::clone(&self.ended),
        }
    }
}

/// One event bound to its stream's executor, not yet submitted.
///
/// Building a delivery never runs application code. [`submit`](Self::submit)
/// hands it to the executor, which may run the callback immediately, so
/// callers must release any lock the callback could need first.
#[must_use = "a delivery does nothing until it is submitted"]
pub struct Delivery {
    stream_id: StreamId,
    event: StreamEvent,
    callbacks: Arc<dyn StreamCallbacks>,
    executor: Arc<dyn Executor>,
    ended: Arc<AtomicBool>,
}

impl Delivery {
    /// Stream the event belongs to.
    #[must_use]
    pub fn stream_id(&self) -> StreamId { self.stream_id }

    /// The prepared event.
    #[must_use]
    pub fn event(&self) -> &StreamEvent { &self.event }

    /// Submit one job that invokes the matching callback.
    ///
    /// The job is skipped if a terminal event for the same stream already
    /// ran, so a non-terminal event that lost a race with a terminal one is
    /// never delivered after it.
    pub fn submit(self) {
        let Self {
            stream_id,
            event,
            callbacks,
            executor,
            ended,
        } = self;
        let kind = event.kind();
        trace!(stream = %stream_id, %kind, "submitting stream event");
        crate::metrics::inc_events(kind);
        executor.execute(Box::new(move || {
            let already_ended = if kind.is_terminal() {
                ended.swap(true, Ordering::AcqRel)
            } else {
                ended.load(Ordering::Acquire)
            };
            if already_ended {
                trace!(stream = %stream_id, %kind, "stream already ended; event dropped");
                return;
            }
            event.deliver(&*callbacks);
        }));
    }
}

impl fmt::Debug for Delivery {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Delivery")
            .field("stream_id", &self.stream_id)
            .field("kind", &self.event.kind())
            .finish_non_exhaustive()
    }
}

impl fmt::Debug for CallbackDispatchContext {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("CallbackDispatchContext")
            .field("stream_id", &self.stream_id)
            .field("phase", &self.phase)
            .field("pending_fragments", &self.accumulator.count())
            .finish_non_exhaustive()
    }
}
