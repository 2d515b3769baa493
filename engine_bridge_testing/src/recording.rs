use std::sync::{Arc, Mutex};

use bytes::Bytes;
use engine_bridge::{
    EventKind,
    Executor,
    FinalStreamIntel,
    HeaderMap,
    Job,
    StreamCallbacks,
    StreamError,
    StreamEvent,
    StreamIntel,
};

/// Callbacks that record every delivered event in arrival order.
pub struct RecordingCallbacks {
    executor: Arc<dyn Executor>,
    events: Mutex<Vec<StreamEvent>>,
}

impl RecordingCallbacks {
    /// Record through `executor`.
    pub fn with_executor(executor: Arc<dyn Executor>) -> Self {
        Self {
            executor,
            events: Mutex::new(Vec::new()),
        }
    }

    /// Record events as soon as they are submitted.
    pub fn inline() -> Self { Self::with_executor(Arc::new(|job: Job| job())) }

    /// Snapshot of the delivered events.
    pub fn events(&self) -> Vec<StreamEvent> { self.lock().clone() }

    /// Kinds of the delivered events.
    pub fn kinds(&self) -> Vec<EventKind> { self.lock().iter().map(StreamEvent::kind).collect() }

    /// Number of delivered terminal events.
    pub fn terminal_count(&self) -> usize {
        self.lock().iter().filter(|event| event.is_terminal()).count()
    }

    fn record(&self, event: StreamEvent) { self.lock().push(event); }

    fn lock(&self) -> std::sync::MutexGuard<'_, Vec<StreamEvent>> {
        self.events.lock().expect("recorded events poisoned")
    }
}

impl StreamCallbacks for RecordingCallbacks {
    fn executor(&self) -> Arc<dyn Executor> { Arc::clone(&self.executor) }

    fn on_headers(&self, headers: HeaderMap, end_stream: bool, intel: StreamIntel) {
        self.record(StreamEvent::Headers {
            headers,
            end_stream,
            intel,
        });
    }

    fn on_data(&self, data: Bytes, end_stream: bool, intel: StreamIntel) {
        self.record(StreamEvent::Data {
            data,
            end_stream,
            intel,
        });
    }

    fn on_trailers(&self, trailers: HeaderMap, intel: StreamIntel) {
        self.record(StreamEvent::Trailers { trailers, intel });
    }

    fn on_error(&self, error: StreamError, intel: StreamIntel, final_intel: FinalStreamIntel) {
        self.record(StreamEvent::Error {
            error,
            intel,
            final_intel,
        });
    }

    fn on_cancel(&self, intel: StreamIntel, final_intel: FinalStreamIntel) {
        self.record(StreamEvent::Cancel { intel, final_intel });
    }

    fn on_send_window_available(&self, intel: StreamIntel) {
        self.record(StreamEvent::SendWindowAvailable { intel });
    }

    fn on_complete(&self, intel: StreamIntel, final_intel: FinalStreamIntel) {
        self.record(StreamEvent::Complete { intel, final_intel });
    }
}
