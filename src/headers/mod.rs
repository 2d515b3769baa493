//! Header and trailer block reconstruction.
//!
//! The engine delivers each header or trailer block as a run of fragments
//! followed by a completion call carrying the declared block size.
//! [`HeaderAccumulator`] rebuilds the block into an ordered [`HeaderMap`].

mod accumulator;
mod map;

pub use accumulator::HeaderAccumulator;
pub use map::HeaderMap;
use thiserror::Error;

/// The declared block size did not match the fragments received.
#[derive(Clone, Copy, Debug, Error, PartialEq, Eq)]
#[error("header block declared {declared} entries but {accumulated} were received")]
pub struct HeaderCountMismatch {
    /// Size announced by the engine.
    pub declared: u64,
    /// Fragments actually accumulated.
    pub accumulated: u64,
}

#[cfg(test)]
mod tests;
