//! Reassembly of header and trailer blocks delivered one pair at a time.
//!
//! The engine cannot hand a whole header block across the boundary, so it
//! streams `(name, value, start)` fragments and then announces the block
//! with its declared size. [`HeaderAccumulator`] collects the fragments and
//! checks the count before handing the block over.
//!
//! Transitions:
//!
//! ```text
//! Idle --begin_if_needed / add_fragment--> Accumulating
//! Accumulating --add_fragment(start = true)--> Accumulating (reset)
//! Accumulating --drain--> Idle
//! ```

use super::{HeaderCountMismatch, HeaderMap};

#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
enum State {
    #[default]
    Idle,
    Accumulating {
        count: u64,
    },
}

/// Per-stream accumulator for header and trailer fragments.
#[derive(Debug, Default)]
pub struct HeaderAccumulator {
    state: State,
    headers: HeaderMap,
}

impl HeaderAccumulator {
    /// Create an idle accumulator.
    #[must_use]
    pub fn new() -> Self { Self::default() }

    /// Enter the accumulating state if no block is open.
    pub fn begin_if_needed(&mut self) {
        if self.state == State::Idle {
            self.headers.clear();
            self.state = State::Accumulating { count: 0 };
        }
    }

    /// Record one fragment.
    ///
    /// A fragment flagged as the block start discards anything left over
    /// from an earlier, unfinished block. Names and values are decoded as
    /// UTF-8, replacing invalid sequences.
    pub fn add_fragment(&mut self, name: &[u8], value: &[u8], is_block_start: bool) {
        if is_block_start {
            self.reset();
        }
        self.begin_if_needed();

        self.headers.append(
            String::from_utf8_lossy(name),
            String::from_utf8_lossy(value),
        );
        if let State::Accumulating { count } = &mut self.state {
            *count += 1;
        }
    }

    /// Fragments recorded in the current block.
    #[must_use]
    pub fn count(&self) -> u64 {
        match self.state {
            State::Idle => 0,
            State::Accumulating { count } => count,
        }
    }

    /// Whether the current block holds exactly `declared` fragments.
    #[must_use]
    pub fn is_complete(&self, declared: u64) -> bool { self.count() == declared }

    /// Hand over the accumulated block and return to idle.
    pub fn drain(&mut self) -> HeaderMap {
        self.state = State::Idle;
        std::mem::take(&mut self.headers)
    }

    /// Drain the block after checking it holds `declared` fragments.
    ///
    /// # Errors
    ///
    /// Returns [`HeaderCountMismatch`] when the counts differ. The partial
    /// block is discarded either way.
    pub fn take_block(&mut self, declared: u64) -> Result<HeaderMap, HeaderCountMismatch> {
        let accumulated = self.count();
        let block = self.drain();
        if accumulated == declared {
            Ok(block)
        } else {
            Err(HeaderCountMismatch {
                declared,
                accumulated,
            })
        }
    }

    fn reset(&mut self) {
        self.state = State::Idle;
        self.headers.clear();
    }
}
