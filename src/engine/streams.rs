//! Registry of open streams keyed by [`StreamId`].
//!
//! The engine may report events for a stream from whichever thread it
//! likes, and terminal events can race (a cancel issued by the application
//! against a completion from the network). `StreamRegistry` owns every open
//! [`CallbackDispatchContext`] and gates access to it:
//!
//! - non-terminal events lock the stream's shard only while the event is
//!   prepared;
//! - terminal events remove the context atomically, so exactly one terminal
//!   call wins and later ones see [`StreamRegistryError::UnknownStream`];
//! - a protocol violation removes the context, logs, and reports the
//!   violation, so no further events reach the application.
//!
//! The prepared [`Delivery`] is submitted after the shard guard is released.
//! An inline executor may therefore call back into the registry, including
//! for the stream being dispatched.

use std::sync::Arc;

use dashmap::DashMap;
use thiserror::Error;
use tracing::{debug, error};

use crate::{
    dispatch::{CallbackDispatchContext, Delivery, DispatchError, StreamCallbacks, StreamId},
    init::Library,
};

/// Failures reported by [`StreamRegistry`].
#[non_exhaustive]
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum StreamRegistryError {
    /// No open stream has this identifier. The stream either never opened
    /// or already ended.
    #[error("{0} is not open")]
    UnknownStream(StreamId),
    /// The engine breached the event contract and the stream was aborted.
    #[error("{stream} aborted: {source}")]
    ProtocolViolation {
        stream: StreamId,
        #[source]
        source: DispatchError,
    },
}

/// Concurrent owner of open stream contexts.
#[derive(Debug, Default)]
pub struct StreamRegistry(DashMap<StreamId, CallbackDispatchContext>);

impl StreamRegistry {
    /// Create an empty registry.
    #[must_use]
    pub fn new() -> Self { Self::default() }

    /// Open a stream delivering to `callbacks`, allocating its identifier
    /// from `library`.
    pub fn open(&self, library: &Library, callbacks: Arc<dyn StreamCallbacks>) -> StreamId {
        let id = library.next_stream_id();
        self.0.insert(id, CallbackDispatchContext::new(id, callbacks));
        debug!(stream = %id, "stream opened");
        id
    }

    /// Record a header or trailer fragment.
    ///
    /// # Errors
    ///
    /// Returns [`StreamRegistryError::UnknownStream`] if the stream is not
    /// open.
    pub fn pass_header(
        &self,
        id: StreamId,
        name: &[u8],
        value: &[u8],
        is_block_start: bool,
    ) -> Result<(), StreamRegistryError> {
        self.with_stream(id, |ctx| {
            ctx.pass_header(name, value, is_block_start);
            Ok(())
        })
    }

    /// Forward a completed header block.
    ///
    /// # Errors
    ///
    /// Returns [`StreamRegistryError`] if the stream is not open or the
    /// event breaches the contract.
    pub fn on_headers(
        &self,
        id: StreamId,
        count: u64,
        end_stream: bool,
        intel: &[i64],
    ) -> Result<(), StreamRegistryError> {
        self.with_stream(id, |ctx| ctx.on_headers(count, end_stream, intel))
            .map(Delivery::submit)
    }

    /// Forward a body chunk.
    ///
    /// # Errors
    ///
    /// Returns [`StreamRegistryError`] if the stream is not open or the
    /// event breaches the contract.
    pub fn on_data(
        &self,
        id: StreamId,
        data: &[u8],
        end_stream: bool,
        intel: &[i64],
    ) -> Result<(), StreamRegistryError> {
        self.with_stream(id, |ctx| ctx.on_data(data, end_stream, intel))
            .map(Delivery::submit)
    }

    /// Forward a completed trailer block.
    ///
    /// # Errors
    ///
    /// Returns [`StreamRegistryError`] if the stream is not open or the
    /// event breaches the contract.
    pub fn on_trailers(
        &self,
        id: StreamId,
        count: u64,
        intel: &[i64],
    ) -> Result<(), StreamRegistryError> {
        self.with_stream(id, |ctx| ctx.on_trailers(count, intel))
            .map(Delivery::submit)
    }

    /// Forward a send-window notification.
    ///
    /// # Errors
    ///
    /// Returns [`StreamRegistryError`] if the stream is not open or the
    /// event breaches the contract.
    pub fn on_send_window_available(
        &self,
        id: StreamId,
        intel: &[i64],
    ) -> Result<(), StreamRegistryError> {
        self.with_stream(id, |ctx| ctx.on_send_window_available(intel))
            .map(Delivery::submit)
    }

    /// End the stream with an error.
    ///
    /// # Errors
    ///
    /// Returns [`StreamRegistryError::UnknownStream`] if another terminal
    /// event already ended the stream.
    pub fn on_error(
        &self,
        id: StreamId,
        code: i32,
        message: &[u8],
        attempt_count: i32,
        intel: &[i64],
        final_intel: &[i64],
    ) -> Result<(), StreamRegistryError> {
        self.finish(id, |ctx| {
            ctx.on_error(code, message, attempt_count, intel, final_intel)
        })
    }

    /// End the stream with a cancellation.
    ///
    /// # Errors
    ///
    /// Returns [`StreamRegistryError::UnknownStream`] if another terminal
    /// event already ended the stream.
    pub fn on_cancel(
        &self,
        id: StreamId,
        intel: &[i64],
        final_intel: &[i64],
    ) -> Result<(), StreamRegistryError> {
        self.finish(id, |ctx| ctx.on_cancel(intel, final_intel))
    }

    /// End the stream successfully.
    ///
    /// # Errors
    ///
    /// Returns [`StreamRegistryError::UnknownStream`] if another terminal
    /// event already ended the stream.
    pub fn on_complete(
        &self,
        id: StreamId,
        intel: &[i64],
        final_intel: &[i64],
    ) -> Result<(), StreamRegistryError> {
        self.finish(id, |ctx| ctx.on_complete(intel, final_intel))
    }

    /// Whether `id` is open.
    #[must_use]
    pub fn contains(&self, id: StreamId) -> bool { self.0.contains_key(&id) }

    /// Number of open streams.
    #[must_use]
    pub fn len(&self) -> usize { self.0.len() }

    /// Whether no stream is open.
    #[must_use]
    pub fn is_empty(&self) -> bool { self.0.is_empty() }

    /// Identifiers of the open streams.
    #[must_use]
    pub fn active_ids(&self) -> Vec<StreamId> { self.0.iter().map(|entry| *entry.key()).collect() }

    fn with_stream<T, F>(&self, id: StreamId, op: F) -> Result<T, StreamRegistryError>
    where
        F: FnOnce(&mut CallbackDispatchContext) -> Result<T, DispatchError>,
    {
        let mut guard = self
            .0
            .get_mut(&id)
            .ok_or(StreamRegistryError::UnknownStream(id))?;
        let result = op(guard.value_mut());
        // Removing or submitting while the shard guard is held would deadlock.
        drop(guard);
        result.map_err(|source| {
            self.0.remove(&id);
            violation(id, source)
        })
    }

    fn finish<F>(&self, id: StreamId, op: F) -> Result<(), StreamRegistryError>
    where
        F: FnOnce(CallbackDispatchContext) -> Result<Delivery, DispatchError>,
    {
        let (_, ctx) = self
            .0
            .remove(&id)
            .ok_or(StreamRegistryError::UnknownStream(id))?;
        let delivery = op(ctx).map_err(|source| violation(id, source))?;
        debug!(stream = %id, "stream closed");
        delivery.submit();
        Ok(())
    }
}

fn violation(stream: StreamId, source: DispatchError) -> StreamRegistryError {
    error!(%stream, error = %source, "protocol violation; stream aborted");
    crate::metrics::inc_protocol_violations();
    StreamRegistryError::ProtocolViolation { stream, source }
}
