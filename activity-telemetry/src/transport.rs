//! Fire-and-forget delivery of records to a sink

use std::sync::Arc;

use tokio::runtime::Handle;

use crate::error::{TrackerError, TrackerResult};
use crate::record::EventRecord;
use crate::sink::EventSink;

/// Best-effort transport
///
/// Each [`emit`](EventTransport::emit) spawns one independent sink write
/// and returns without waiting for it. The write's result is logged and
/// then dropped: there is no retry, no queue, and no ordering between
/// concurrent writes. A sink that panics only takes down its own task.
#[derive(Clone)]
pub struct EventTransport {
    sink: Arc<dyn EventSink>,
    runtime: Handle,
}

impl EventTransport {
    /// Create a transport on the current tokio runtime
    pub fn new(sink: Arc<dyn EventSink>) -> TrackerResult<Self> {
        let runtime = Handle::try_current().map_err(|_| TrackerError::NoRuntime)?;
        Ok(Self::with_handle(sink, runtime))
    }

    /// Create a transport that spawns writes on `runtime`
    pub fn with_handle(sink: Arc<dyn EventSink>, runtime: Handle) -> Self {
        Self { sink, runtime }
    }

    /// Name of the underlying sink
    pub fn sink_name(&self) -> &str {
        self.sink.name()
    }

    /// Hand a record to the sink without waiting for the write
    pub fn emit(&self, record: EventRecord) {
        let sink = Arc::clone(&self.sink);

        self.runtime.spawn(async move {
            match sink.insert(&record).await {
                Ok(()) => {
                    tracing::debug!(
                        sink = sink.name(),
                        activity_type = %record.activity_type,
                        occurred_at = %record.occurred_at,
                        "activity delivered"
                    );
                }
                Err(e) => {
                    // Dropped on purpose: telemetry never retries
                    tracing::warn!(
                        sink = sink.name(),
                        activity_type = %record.activity_type,
                        page = %record.page,
                        occurred_at = %record.occurred_at,
                        error = %e,
                        "Failed to log activity"
                    );
                }
            }
        });
    }
}

impl std::fmt::Debug for EventTransport {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("EventTransport")
            .field("sink", &self.sink.name())
            .finish()
    }
}
