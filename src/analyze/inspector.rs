//! Heap inspector boundary.
//!
//! The inspector is an out-of-process black box: given a reserved snapshot
//! path and a correlation key, it captures the heap, analyzes it under its
//! own deadline, and hands back a verdict. This crate never looks inside
//! the snapshot bytes.

use std::io;
use std::path::Path;
use std::time::Duration;

use thiserror::Error;

/// Verdict of one analysis invocation. Produced exactly once per call.
#[derive(Debug, Clone)]
pub enum AnalysisOutcome {
    /// The analyzer ran to completion but could not produce a verdict
    /// (including hitting its own deadline).
    Failure { cause: String },
    /// No leak: the object was not retained in the snapshot.
    Clean,
    LeakConfirmed { report: String, duration_ms: u64 },
}

/// Infrastructure-level failure of the inspector itself, as opposed to the
/// analyzer running and reporting `AnalysisOutcome::Failure`.
#[derive(Debug, Error)]
pub enum InspectorError {
    #[error("inspector i/o failure: {0}")]
    Io(#[from] io::Error),

    #[error("inspector process failed: {0}")]
    Process(String),
}

/// Out-of-process capture and analysis.
///
/// Implementations own their timeout: a call that overruns `timeout` must
/// come back either as `AnalysisOutcome::Failure` or as an error, never
/// hang. The orchestrator runs no timer of its own.
pub trait HeapInspector {
    fn analyze(
        &self,
        path: &Path,
        correlation_key: &str,
        timeout: Duration,
    ) -> Result<AnalysisOutcome, InspectorError>;
}

/// Best-effort nudge to the host runtime to run a collection pass before
/// capture, so transient references do not show up as leaks. Not awaited;
/// snapshot accuracy stays probabilistic with respect to collector timing.
pub trait CollectionHint {
    fn request_collection(&self);
}
