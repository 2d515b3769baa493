//! Execution contexts that run application callbacks.
//!
//! The dispatch layer never calls application code on the engine thread. It
//! submits one [`Job`] per event to the [`Executor`] the application chose.
//! Any `Fn(Job)` closure is an executor, which lets applications plug in
//! their own thread pool or UI queue. [`SerialExecutor`] is the provided
//! implementation: it runs jobs one at a time, in submission order, on a
//! tokio task.

use std::{
    any::Any,
    fmt,
    panic::{AssertUnwindSafe, catch_unwind},
};

use tokio::{runtime::Handle, sync::mpsc, task::JoinHandle};
use tracing::{debug, warn};

/// A unit of work delivering one event to application code.
pub type Job = Box<dyn FnOnce() + Send + 'static>;

/// Application-chosen execution context.
///
/// Implementations must not block the caller: `execute` runs on the engine's
/// delivery thread.
pub trait Executor: Send + Sync + 'static {
    /// Schedule `job` to run.
    fn execute(&self, job: Job);
}

impl<F> Executor for F
where
    F: Fn(Job) + Send + Sync + 'static,
{
    fn execute(&self, job: Job) { self(job); }
}

/// Executor running jobs serially in submission order.
///
/// Submission uses an unbounded channel so the engine thread never waits.
/// Panics raised by a job are caught and logged; later jobs still run. The
/// worker exits once every clone of the executor is dropped.
#[derive(Clone)]
pub struct SerialExecutor {
    tx: mpsc::UnboundedSender<Job>,
}

impl SerialExecutor {
    /// Spawn the worker on `runtime`, returning the executor and the
    /// worker's join handle.
    #[must_use]
    pub fn spawn(runtime: &Handle) -> (Self, JoinHandle<()>) {
        let (tx, mut rx) = mpsc::unbounded_channel::<Job>();
        let worker = runtime.spawn(async move {
            while let Some(job) = rx.recv().await {
                run_job(job);
            }
            debug!("serial executor drained");
        });
        (Self { tx }, worker)
    }
}

impl Executor for SerialExecutor {
    fn execute(&self, job: Job) {
        if self.tx.send(job).is_err() {
            warn!("serial executor worker stopped; job dropped");
        }
    }
}

impl fmt::Debug for SerialExecutor {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("SerialExecutor")
            .field("closed", &self.tx.is_closed())
            .finish()
    }
}

/// Run `job`, logging instead of unwinding if it panics.
///
/// Returns `false` when the job panicked.
pub fn run_job(job: Job) -> bool {
    match catch_unwind(AssertUnwindSafe(job)) {
        Ok(()) => true,
        Err(panic) => {
            crate::metrics::inc_callback_panics();
            let panic_msg = PanicMessage(&*panic);
            // Emit via both `log` and `tracing` for tests that capture either.
            log::error!("stream callback panicked: panic={panic_msg}");
            tracing::error!(panic = %panic_msg, "stream callback panicked");
            false
        }
    }
}

/// Display adapter for panic payloads.
struct PanicMessage<'a>(&'a (dyn Any + Send));

impl fmt::Display for PanicMessage<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if let Some(s) = self.0.downcast_ref::<String>() {
            f.write_str(s)
        } else if let Some(s) = self.0.downcast_ref::<&'static str>() {
            f.write_str(s)
        } else {
            f.write_str("non-string panic payload")
        }
    }
}

#[cfg(test)]
mod tests {
    use std::sync::{Arc, Mutex};

    use tracing_test::traced_test;

    use super::*;

    fn boom() { panic!("boom") }

    #[test]
    fn closures_are_executors() {
        let ran = Arc::new(Mutex::new(false));
        let flag = Arc::clone(&ran);
        let inline = |job: Job| job();
        inline.execute(Box::new(move || *flag.lock().expect("lock") = true));
        assert!(*ran.lock().expect("lock"));
    }

    #[test]
    #[traced_test]
    fn run_job_contains_panics() {
        assert!(!run_job(Box::new(boom)));
        assert!(logs_contain("stream callback panicked"));
        assert!(logs_contain("boom"));
    }

    #[test]
    fn formats_non_string_panics() {
        let payload: Box<dyn Any + Send> = Box::new(5_u32);
        assert_eq!(PanicMessage(&*payload).to_string(), "non-string panic payload");
    }

    #[tokio::test]
    async fn serial_executor_preserves_order() {
        let (executor, worker) = SerialExecutor::spawn(&Handle::current());
        let seen = Arc::new(Mutex::new(Vec::new()));
        for i in 0..32 {
            let seen = Arc::clone(&seen);
            executor.execute(Box::new(move || seen.lock().expect("lock").push(i)));
        }
        drop(executor);
        worker.await.expect("worker finished");
        assert_eq!(*seen.lock().expect("lock"), (0..32).collect::<Vec<_>>());
    }

    #[tokio::test]
    async fn serial_executor_survives_panicking_job() {
        let (executor, worker) = SerialExecutor::spawn(&Handle::current());
        let seen = Arc::new(Mutex::new(Vec::new()));
        executor.execute(Box::new(boom));
        let after = Arc::clone(&seen);
        executor.execute(Box::new(move || after.lock().expect("lock").push("second")));
        drop(executor);
        worker.await.expect("worker finished");
        assert_eq!(*seen.lock().expect("lock"), ["second"]);
    }
}
