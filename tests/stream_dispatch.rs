//! Stream event delivery through [`StreamRegistry`].
//!
//! These tests drive the registry the way the engine does and observe what
//! reaches the application callbacks.

use std::{
    sync::{Arc, Barrier, Mutex, OnceLock, mpsc},
    thread,
    time::Duration,
};

use engine_bridge::{
    DispatchError,
    EventKind,
    Executor,
    FinalStreamIntel,
    HeaderMap,
    Job,
    Phase,
    StreamCallbacks,
    StreamEvent,
    StreamId,
    StreamIntel,
    StreamRegistry,
    StreamRegistryError,
    init,
};
use engine_bridge_testing::{
    ManualExecutor,
    RecordingCallbacks,
    feed_block,
    final_intel,
    manual_executor,
    stream_intel,
};
use rstest::rstest;

fn open_recorded(
    registry: &StreamRegistry,
    executor: &Arc<ManualExecutor>,
) -> (StreamId, Arc<RecordingCallbacks>) {
    let callbacks = Arc::new(RecordingCallbacks::with_executor(executor.clone()));
    let id = registry.open(init::initialize(), callbacks.clone());
    (id, callbacks)
}

#[rstest]
fn full_exchange_is_delivered_in_order(manual_executor: Arc<ManualExecutor>) {
    let registry = StreamRegistry::new();
    let (id, callbacks) = open_recorded(&registry, &manual_executor);
    let intel = stream_intel(7);

    let count = feed_block(&registry, id, &[(":status", "200"), ("x", "1"), ("x", "2")]);
    registry
        .on_headers(id, count, false, &intel)
        .expect("headers");
    registry
        .on_data(id, b"hello", false, &intel)
        .expect("first chunk");
    registry
        .on_data(id, b" world", false, &intel)
        .expect("second chunk");
    let count = feed_block(&registry, id, &[("grpc-status", "0")]);
    registry.on_trailers(id, count, &intel).expect("trailers");
    registry
        .on_complete(id, &intel, &final_intel())
        .expect("complete");

    assert!(callbacks.events().is_empty());
    assert_eq!(manual_executor.run_all(), 5);
    assert_eq!(
        callbacks.kinds(),
        [
            EventKind::Headers,
            EventKind::Data,
            EventKind::Data,
            EventKind::Trailers,
            EventKind::Complete,
        ]
    );

    let events = callbacks.events();
    let StreamEvent::Headers { headers, intel, .. } = &events[0] else {
        panic!("expected headers first, got {:?}", events[0]);
    };
    assert_eq!(headers.get("x"), Some(&["1".to_owned(), "2".to_owned()][..]));
    assert_eq!(intel.stream_id, 7);
    let body: Vec<u8> = events
        .iter()
        .filter_map(|event| match event {
            StreamEvent::Data { data, .. } => Some(data.to_vec()),
            _ => None,
        })
        .flatten()
        .collect();
    assert_eq!(body, b"hello world");
}

#[rstest]
fn accumulated_block_groups_values_by_name(manual_executor: Arc<ManualExecutor>) {
    let registry = StreamRegistry::new();
    let (id, callbacks) = open_recorded(&registry, &manual_executor);

    let count = feed_block(&registry, id, &[("x", "1"), ("x", "2"), ("y", "3")]);
    assert_eq!(count, 3);
    registry
        .on_headers(id, count, true, &stream_intel(1))
        .expect("headers");
    manual_executor.run_all();

    let expected: HeaderMap = [("x", "1"), ("x", "2"), ("y", "3")].into_iter().collect();
    assert!(matches!(
        &callbacks.events()[..],
        [StreamEvent::Headers { headers, end_stream: true, .. }] if *headers == expected
    ));
}

#[rstest]
fn data_is_copied_before_submission(manual_executor: Arc<ManualExecutor>) {
    let registry = StreamRegistry::new();
    let (id, callbacks) = open_recorded(&registry, &manual_executor);

    registry
        .on_headers(id, 0, false, &stream_intel(1))
        .expect("headers");
    let mut engine_owned = vec![0xAB_u8; 64];
    registry
        .on_data(id, &engine_owned, true, &stream_intel(1))
        .expect("data");
    engine_owned.iter_mut().for_each(|byte| *byte = 0);
    drop(engine_owned);
    manual_executor.run_all();

    let events = callbacks.events();
    let [StreamEvent::Headers { .. }, StreamEvent::Data { data, .. }] = &events[..] else {
        panic!("expected headers then data, got {events:?}");
    };
    assert!(data.iter().all(|byte| *byte == 0xAB));
    assert_eq!(data.len(), 64);
}

#[rstest]
fn count_mismatch_aborts_stream(manual_executor: Arc<ManualExecutor>) {
    let registry = StreamRegistry::new();
    let (id, callbacks) = open_recorded(&registry, &manual_executor);

    feed_block(&registry, id, &[("a", "1")]);
    let err = registry
        .on_headers(id, 2, false, &stream_intel(1))
        .expect_err("mismatch");
    assert!(matches!(err, StreamRegistryError::ProtocolViolation { .. }));
    assert_eq!(
        registry.on_complete(id, &stream_intel(1), &final_intel()),
        Err(StreamRegistryError::UnknownStream(id))
    );
    assert_eq!(manual_executor.run_all(), 0);
    assert!(callbacks.events().is_empty());
}

#[derive(Clone, Copy, Debug)]
enum Terminal {
    Error,
    Cancel,
    Complete,
}

fn fire(registry: &StreamRegistry, id: StreamId, terminal: Terminal) -> bool {
    let intel = stream_intel(1);
    let final_intel = final_intel();
    let result = match terminal {
        Terminal::Error => registry.on_error(id, 2, b"reset", 1, &intel, &final_intel),
        Terminal::Cancel => registry.on_cancel(id, &intel, &final_intel),
        Terminal::Complete => registry.on_complete(id, &intel, &final_intel),
    };
    match result {
        Ok(()) => true,
        Err(StreamRegistryError::UnknownStream(_)) => false,
        Err(other) => panic!("unexpected terminal failure: {other}"),
    }
}

#[rstest]
#[case::mixed(&[Terminal::Error, Terminal::Cancel, Terminal::Complete][..])]
#[case::racing_cancels(&[Terminal::Cancel; 8][..])]
fn concurrent_terminals_deliver_once(#[case] terminals: &[Terminal]) {
    for _ in 0..64 {
        let registry = Arc::new(StreamRegistry::new());
        let callbacks = Arc::new(RecordingCallbacks::inline());
        let id = registry.open(init::initialize(), callbacks.clone());
        let barrier = Arc::new(Barrier::new(terminals.len()));

        let winners: usize = thread::scope(|scope| {
            let handles: Vec<_> = terminals
                .iter()
                .map(|&terminal| {
                    let registry = Arc::clone(&registry);
                    let barrier = Arc::clone(&barrier);
                    scope.spawn(move || {
                        barrier.wait();
                        usize::from(fire(&registry, id, terminal))
                    })
                })
                .collect();
            handles
                .into_iter()
                .map(|handle| handle.join().expect("terminal thread"))
                .sum()
        });

        assert_eq!(winners, 1);
        assert_eq!(callbacks.terminal_count(), 1);
        assert_eq!(callbacks.events().len(), 1);
        assert!(registry.is_empty());
    }
}

#[rstest]
fn streams_are_independent(manual_executor: Arc<ManualExecutor>) {
    let registry = StreamRegistry::new();
    let (first, first_callbacks) = open_recorded(&registry, &manual_executor);
    let (second, second_callbacks) = open_recorded(&registry, &manual_executor);

    registry
        .on_cancel(first, &stream_intel(1), &final_intel())
        .expect("cancel first");
    registry
        .on_headers(second, 0, true, &stream_intel(2))
        .expect("second stream unaffected");
    registry
        .on_data(second, b"still open", true, &stream_intel(2))
        .expect("second stream unaffected");
    manual_executor.run_all();

    assert_eq!(first_callbacks.kinds(), [EventKind::Cancel]);
    assert_eq!(second_callbacks.kinds(), [EventKind::Headers, EventKind::Data]);
    assert_eq!(registry.active_ids(), [second]);
}

#[rstest]
fn body_before_headers_aborts_stream(manual_executor: Arc<ManualExecutor>) {
    let registry = StreamRegistry::new();
    let (id, callbacks) = open_recorded(&registry, &manual_executor);

    let err = registry
        .on_data(id, b"early", false, &stream_intel(1))
        .expect_err("data before headers");
    assert_eq!(
        err,
        StreamRegistryError::ProtocolViolation {
            stream: id,
            source: DispatchError::OutOfOrder {
                event: EventKind::Data,
                phase: Phase::Open,
            },
        }
    );
    assert!(!registry.contains(id));
    assert_eq!(manual_executor.run_all(), 0);
    assert!(callbacks.events().is_empty());
}

/// Callbacks that run inline and re-enter the registry from `on_headers`.
struct Reentrant {
    registry: Arc<StreamRegistry>,
    stream: OnceLock<StreamId>,
    sibling: StreamId,
    kinds: Mutex<Vec<EventKind>>,
    outcome: Mutex<Vec<Result<(), StreamRegistryError>>>,
}

impl Reentrant {
    fn record(&self, kind: EventKind) { self.kinds.lock().expect("kinds lock").push(kind); }
}

impl StreamCallbacks for Reentrant {
    fn executor(&self) -> Arc<dyn Executor> { Arc::new(|job: Job| job()) }

    fn on_headers(&self, _headers: HeaderMap, _end_stream: bool, _intel: StreamIntel) {
        self.record(EventKind::Headers);
        let id = *self.stream.get().expect("stream id published");
        let outcome = [
            self.registry.pass_header(self.sibling, b"a", b"1", true),
            self.registry
                .on_cancel(id, &stream_intel(1), &final_intel()),
        ];
        self.outcome.lock().expect("outcome lock").extend(outcome);
    }

    fn on_cancel(&self, _intel: StreamIntel, _final_intel: FinalStreamIntel) {
        self.record(EventKind::Cancel);
    }
}

#[test]
fn inline_callback_can_reenter_registry() {
    let registry = Arc::new(StreamRegistry::new());
    let sibling = registry.open(init::initialize(), Arc::new(RecordingCallbacks::inline()));
    let callbacks = Arc::new(Reentrant {
        registry: Arc::clone(&registry),
        stream: OnceLock::new(),
        sibling,
        kinds: Mutex::new(Vec::new()),
        outcome: Mutex::new(Vec::new()),
    });
    let id = registry.open(init::initialize(), callbacks.clone());
    callbacks.stream.set(id).expect("stream id set once");

    let (done_tx, done_rx) = mpsc::channel();
    let engine = Arc::clone(&registry);
    thread::spawn(move || {
        let result = engine.on_headers(id, 0, false, &stream_intel(1));
        let _ = done_tx.send(result);
    });
    let result = done_rx
        .recv_timeout(Duration::from_secs(5))
        .expect("engine thread returned from on_headers");

    assert_eq!(result, Ok(()));
    assert_eq!(
        *callbacks.outcome.lock().expect("outcome lock"),
        [Ok(()), Ok(())]
    );
    assert_eq!(
        *callbacks.kinds.lock().expect("kinds lock"),
        [EventKind::Headers, EventKind::Cancel]
    );
    assert_eq!(registry.active_ids(), [sibling]);
}
