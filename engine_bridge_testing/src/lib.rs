//! Test doubles for exercising `engine_bridge` stream dispatch.
//!
//! [`RecordingCallbacks`] captures every delivered event, [`ManualExecutor`]
//! holds jobs until the test runs them, and the intel helpers build
//! well-formed arrays the way the engine would. [`LoggerHandle`] captures
//! records emitted through `log`.
//!
//! ```rust
//! use std::sync::Arc;
//!
//! use engine_bridge::{StreamRegistry, init};
//! use engine_bridge_testing::{RecordingCallbacks, final_intel, stream_intel};
//!
//! let callbacks = Arc::new(RecordingCallbacks::inline());
//! let registry = StreamRegistry::new();
//! let id = registry.open(init::initialize(), callbacks.clone());
//! registry
//!     .on_complete(id, &stream_intel(0), &final_intel())
//!     .unwrap();
//! assert_eq!(callbacks.terminal_count(), 1);
//! ```

mod executor;
mod intel;
mod logging;
mod recording;

pub use executor::{ManualExecutor, manual_executor};
pub use intel::{feed_block, final_intel, stream_intel};
pub use logging::{LoggerHandle, logger};
pub use recording::RecordingCallbacks;
