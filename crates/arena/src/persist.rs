//! Persistence boundary for finished games.
//!
//! The core never talks to storage directly. Finished results are
//! handed to a [`ResultSink`] fire-and-forget: a failing or slow sink
//! is logged and never blocks room teardown.

use arena_protocol::RoomResult;

/// A sink failure. Carried as a message only — the core has nothing to
/// do with it beyond logging.
#[derive(Debug, thiserror::Error)]
#[error("result sink failed: {0}")]
pub struct SinkError(pub String);

/// Receives every finished room's result exactly once.
///
/// Implementations live outside the core (a database writer, a stats
/// service client). Same shape as the session layer's auth hook: a
/// single async method behind a trait so tests can drop in a recorder.
pub trait ResultSink: Send + Sync + 'static {
    /// Records one result. Called once per finished room.
    fn record(
        &self,
        result: &RoomResult,
    ) -> impl std::future::Future<Output = Result<(), SinkError>> + Send;
}

/// Discards results. Default for services that don't keep stats.
#[derive(Debug, Clone, Copy, Default)]
pub struct NoopSink;

impl ResultSink for NoopSink {
    async fn record(&self, result: &RoomResult) -> Result<(), SinkError> {
        tracing::debug!(room_id = %result.room_id, "result discarded (noop sink)");
        Ok(())
    }
}
