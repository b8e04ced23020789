//! Issue reporting model.
//!
//! The orchestrator is write-only towards the sink: it publishes and moves
//! on, never consulting a result. Sinks are expected to be cheap; anything
//! slow belongs behind the sink implementation, not in the pipeline.

use serde::Serialize;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum IssueKind {
    /// The analyzer confirmed a retained object.
    LeakFound,
    /// The analyzer ran but reported a failure instead of a verdict.
    ErrException,
}

/// How the snapshot behind an issue was captured. The orchestrator in this
/// crate always uses `ForkAnalyse`; the other modes exist for sinks that
/// also receive issues from manual or dump-less capture paths.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum DumpMode {
    NoDump,
    Manual,
    ForkAnalyse,
}

#[derive(Debug, Clone, Serialize)]
pub struct Issue {
    pub kind: IssueKind,
    pub mode: DumpMode,
    pub object_label: String,
    pub correlation_key: String,
    pub detail: String,
    pub duration_ms: u64,
}

/// Receiver for issue reports. Fire-and-forget from the caller's side.
pub trait IssueSink {
    fn publish(&self, issue: Issue);
}

/// Sink that serializes each issue to a log line. Useful as a default when
/// no real reporting backend is wired up.
pub struct LogSink;

impl IssueSink for LogSink {
    fn publish(&self, issue: Issue) {
        match serde_json::to_string(&issue) {
            Ok(json) => log::info!("issue: {json}"),
            Err(e) => log::warn!("failed to serialize issue: {e}"),
        }
    }
}
