use std::sync::{Arc, Mutex};

use engine_bridge::{Executor, Job};
use rstest::fixture;

/// Executor that queues jobs until [`ManualExecutor::run_all`] is called.
///
/// Lets tests observe what was submitted separately from what ran.
#[derive(Default)]
pub struct ManualExecutor {
    queue: Mutex<Vec<Job>>,
}

impl ManualExecutor {
    /// Create an empty executor.
    pub fn new() -> Self { Self::default() }

    /// Number of jobs waiting to run.
    pub fn pending(&self) -> usize { self.queue.lock().expect("executor queue poisoned").len() }

    /// Run every queued job in submission order, returning how many ran.
    ///
    /// Jobs submitted while running are left for the next call.
    pub fn run_all(&self) -> usize {
        let jobs = std::mem::take(&mut *self.queue.lock().expect("executor queue poisoned"));
        let ran = jobs.len();
        for job in jobs {
            job();
        }
        ran
    }
}

impl Executor for ManualExecutor {
    fn execute(&self, job: Job) { self.queue.lock().expect("executor queue poisoned").push(job); }
}

#[allow(
    unused_braces,
    reason = "rustc false positive for single line rstest fixtures"
)]
#[fixture]
pub fn manual_executor() -> Arc<ManualExecutor> { Arc::new(ManualExecutor::new()) }
