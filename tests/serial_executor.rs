//! Delivery through [`SerialExecutor`] on a tokio runtime.

use std::{
    sync::{Arc, Mutex},
    time::Duration,
};

use bytes::Bytes;
use engine_bridge::{
    EventKind,
    Executor,
    FinalStreamIntel,
    SerialExecutor,
    StreamCallbacks,
    StreamEvent,
    StreamIntel,
    StreamRegistry,
    init,
};
use engine_bridge_testing::{LoggerHandle, RecordingCallbacks, final_intel, logger, stream_intel};
use log::Level;
use rstest::rstest;
use tokio::{runtime::Handle, time::timeout};

#[tokio::test]
async fn per_stream_order_is_preserved() {
    let (executor, _worker) = SerialExecutor::spawn(&Handle::current());
    let callbacks = Arc::new(RecordingCallbacks::with_executor(Arc::new(executor)));
    let registry = StreamRegistry::new();
    let id = registry.open(init::initialize(), callbacks.clone());

    registry
        .on_headers(id, 0, false, &stream_intel(1))
        .expect("headers");
    for chunk in 0..100_u8 {
        registry
            .on_data(id, &[chunk], false, &stream_intel(1))
            .expect("data");
    }
    registry
        .on_complete(id, &stream_intel(1), &final_intel())
        .expect("complete");

    timeout(Duration::from_secs(5), async {
        while callbacks.terminal_count() == 0 {
            tokio::time::sleep(Duration::from_millis(1)).await;
        }
    })
    .await
    .expect("events delivered");

    let events = callbacks.events();
    let chunks: Vec<u8> = events
        .iter()
        .filter_map(|event| match event {
            StreamEvent::Data { data, .. } => Some(data[0]),
            _ => None,
        })
        .collect();
    assert_eq!(chunks, (0..100).collect::<Vec<_>>());
    assert_eq!(events.last().map(StreamEvent::kind), Some(EventKind::Complete));
}

struct Panicking {
    executor: Arc<dyn Executor>,
    completed: Arc<Mutex<bool>>,
}

impl StreamCallbacks for Panicking {
    fn executor(&self) -> Arc<dyn Executor> { Arc::clone(&self.executor) }

    fn on_data(&self, _data: Bytes, _end_stream: bool, _intel: StreamIntel) {
        panic!("application rejected body");
    }

    fn on_complete(&self, _intel: StreamIntel, _final_intel: FinalStreamIntel) {
        *self.completed.lock().expect("completed lock") = true;
    }
}

#[rstest]
#[tokio::test]
async fn callback_panic_is_logged_and_contained(mut logger: LoggerHandle) {
    let (executor, worker) = SerialExecutor::spawn(&Handle::current());
    let completed = Arc::new(Mutex::new(false));
    let registry = StreamRegistry::new();
    let id = registry.open(
        init::initialize(),
        Arc::new(Panicking {
            executor: Arc::new(executor),
            completed: Arc::clone(&completed),
        }),
    );

    registry
        .on_headers(id, 0, false, &stream_intel(1))
        .expect("headers");
    registry
        .on_data(id, b"body", true, &stream_intel(1))
        .expect("data");
    registry
        .on_complete(id, &stream_intel(1), &final_intel())
        .expect("complete");
    drop(registry);
    worker.await.expect("worker finished");

    assert!(*completed.lock().expect("completed lock"));
    assert!(logger.contains(Level::Error, "stream callback panicked: panic=application rejected body"));
}
