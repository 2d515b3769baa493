//! Point-in-time stream metrics reported by the engine with each event.
//!
//! The engine hands snapshots across the boundary as flat `i64` arrays.
//! [`StreamIntel`] and [`FinalStreamIntel`] parse them positionally; an array
//! of the wrong length, or a negative count, is a contract breach.

use thiserror::Error;

/// Number of values in a [`StreamIntel`] array.
pub const STREAM_INTEL_LEN: usize = 4;
/// Number of values in a [`FinalStreamIntel`] array.
pub const FINAL_STREAM_INTEL_LEN: usize = 16;

/// Malformed intel array.
#[non_exhaustive]
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum IntelError {
    /// The array does not have the expected number of values.
    #[error("{kind} expects {expected} values, found {found}")]
    Arity {
        kind: &'static str,
        expected: usize,
        found: usize,
    },
    /// A counter that cannot be negative was negative.
    #[error("{field} must not be negative, found {value}")]
    Negative { field: &'static str, value: i64 },
}

fn check_arity(kind: &'static str, expected: usize, values: &[i64]) -> Result<(), IntelError> {
    if values.len() == expected {
        Ok(())
    } else {
        Err(IntelError::Arity {
            kind,
            expected,
            found: values.len(),
        })
    }
}

fn non_negative(field: &'static str, value: i64) -> Result<u64, IntelError> {
    u64::try_from(value).map_err(|_| IntelError::Negative { field, value })
}

/// Stream state at the moment of a callback.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct StreamIntel {
    /// Engine stream identifier, `-1` if not yet assigned.
    pub stream_id: i64,
    /// Upstream connection identifier, `-1` if not yet connected.
    pub connection_id: i64,
    /// Number of attempts made so far.
    pub attempt_count: u64,
    /// Response bytes consumed by the application.
    pub consumed_bytes_from_response: u64,
}

impl StreamIntel {
    /// Parse the engine's positional array.
    ///
    /// # Errors
    ///
    /// Returns [`IntelError`] if the array has the wrong length or a counter
    /// is negative.
    pub fn from_slice(values: &[i64]) -> Result<Self, IntelError> {
        check_arity("stream intel", STREAM_INTEL_LEN, values)?;
        Ok(Self {
            stream_id: values[0],
            connection_id: values[1],
            attempt_count: non_negative("attempt_count", values[2])?,
            consumed_bytes_from_response: non_negative("consumed_bytes_from_response", values[3])?,
        })
    }
}

/// Final stream metrics delivered with terminal events.
///
/// Timestamps are milliseconds since the epoch, `-1` when the phase never
/// happened.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct FinalStreamIntel {
    pub stream_start_ms: i64,
    pub dns_start_ms: i64,
    pub dns_end_ms: i64,
    pub connect_start_ms: i64,
    pub connect_end_ms: i64,
    pub ssl_start_ms: i64,
    pub ssl_end_ms: i64,
    pub sending_start_ms: i64,
    pub sending_end_ms: i64,
    pub response_start_ms: i64,
    pub stream_end_ms: i64,
    pub socket_reused: bool,
    pub sent_byte_count: u64,
    pub received_byte_count: u64,
    pub response_flags: u64,
    pub upstream_protocol: i64,
}

impl FinalStreamIntel {
    /// Parse the engine's positional array.
    ///
    /// # Errors
    ///
    /// Returns [`IntelError`] if the array has the wrong length or a counter
    /// is negative.
    pub fn from_slice(values: &[i64]) -> Result<Self, IntelError> {
        check_arity("final stream intel", FINAL_STREAM_INTEL_LEN, values)?;
        Ok(Self {
            stream_start_ms: values[0],
            dns_start_ms: values[1],
            dns_end_ms: values[2],
            connect_start_ms: values[3],
            connect_end_ms: values[4],
            ssl_start_ms: values[5],
            ssl_end_ms: values[6],
            sending_start_ms: values[7],
            sending_end_ms: values[8],
            response_start_ms: values[9],
            stream_end_ms: values[10],
            socket_reused: values[11] != 0,
            sent_byte_count: non_negative("sent_byte_count", values[12])?,
            received_byte_count: non_negative("received_byte_count", values[13])?,
            response_flags: non_negative("response_flags", values[14])?,
            upstream_protocol: values[15],
        })
    }

    /// Total stream duration in milliseconds, if both ends were recorded.
    #[must_use]
    pub fn duration_ms(&self) -> Option<i64> {
        (self.stream_start_ms >= 0 && self.stream_end_ms >= self.stream_start_ms)
            .then(|| self.stream_end_ms - self.stream_start_ms)
    }
}
