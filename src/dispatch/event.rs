//! Owned stream events handed to the executor.

use std::fmt;

use bytes::Bytes;

use super::{StreamCallbacks, StreamError};
use crate::{
    headers::HeaderMap,
    intel::{FinalStreamIntel, StreamIntel},
};

/// Discriminant of a [`StreamEvent`], used for logging and metrics labels.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum EventKind {
    Headers,
    Data,
    Trailers,
    SendWindowAvailable,
    Error,
    Cancel,
    Complete,
}

impl EventKind {
    /// Stable lowercase label.
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Headers => "headers",
            Self::Data => "data",
            Self::Trailers => "trailers",
            Self::SendWindowAvailable => "send_window_available",
            Self::Error => "error",
            Self::Cancel => "cancel",
            Self::Complete => "complete",
        }
    }

    /// Whether this kind ends the stream.
    #[must_use]
    pub const fn is_terminal(self) -> bool { matches!(self, Self::Error | Self::Cancel | Self::Complete) }
}

impl fmt::Display for EventKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result { f.write_str(self.as_str()) }
}

/// A fully decoded stream event, owning everything the callback needs.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum StreamEvent {
    Headers {
        headers: HeaderMap,
        end_stream: bool,
        intel: StreamIntel,
    },
    Data {
        data: Bytes,
        end_stream: bool,
        intel: StreamIntel,
    },
    Trailers {
        trailers: HeaderMap,
        intel: StreamIntel,
    },
    SendWindowAvailable {
        intel: StreamIntel,
    },
    Error {
        error: StreamError,
        intel: StreamIntel,
        final_intel: FinalStreamIntel,
    },
    Cancel {
        intel: StreamIntel,
        final_intel: FinalStreamIntel,
    },
    Complete {
        intel: StreamIntel,
        final_intel: FinalStreamIntel,
    },
}

impl StreamEvent {
    /// The event's kind.
    #[must_use]
    pub const fn kind(&self) -> EventKind {
        match self {
            Self::Headers { .. } => EventKind::Headers,
            Self::Data { .. } => EventKind::Data,
            Self::Trailers { .. } => EventKind::Trailers,
            Self::SendWindowAvailable { .. } => EventKind::SendWindowAvailable,
            Self::Error { .. } => EventKind::Error,
            Self::Cancel { .. } => EventKind::Cancel,
            Self::Complete { .. } => EventKind::Complete,
        }
    }

    /// Whether the event ends the stream.
    #[must_use]
    pub const fn is_terminal(&self) -> bool { self.kind().is_terminal() }

    /// Intel snapshot taken when the event was produced.
    #[must_use]
    pub const fn intel(&self) -> &StreamIntel {
        match self {
            Self::Headers { intel, .. }
            | Self::Data { intel, .. }
            | Self::Trailers { intel, .. }
            | Self::SendWindowAvailable { intel }
            | Self::Error { intel, .. }
            | Self::Cancel { intel, .. }
            | Self::Complete { intel, .. } => intel,
        }
    }

    /// Invoke the matching callback method.
    pub fn deliver(self, callbacks: &dyn StreamCallbacks) {
        match self {
            Self::Headers {
                headers,
                end_stream,
                intel,
            } => callbacks.on_headers(headers, end_stream, intel),
            Self::Data {
                data,
                end_stream,
                intel,
            } => callbacks.on_data(data, end_stream, intel),
            Self::Trailers { trailers, intel } => callbacks.on_trailers(trailers, intel),
            Self::SendWindowAvailable { intel } => callbacks.on_send_window_available(intel),
            Self::Error {
                error,
                intel,
                final_intel,
            } => callbacks.on_error(error, intel, final_intel),
            Self::Cancel { intel, final_intel } => callbacks.on_cancel(intel, final_intel),
            Self::Complete { intel, final_intel } => callbacks.on_complete(intel, final_intel),
        }
    }
}
