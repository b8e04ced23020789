//! Leak analysis orchestration.
//!
//! Drives one candidate at a time through a fixed sequence: reserve a
//! snapshot slot, nudge the collector, invoke the inspector under its
//! deadline, classify the verdict, publish an issue, delete the snapshot.
//! The deletion is the one property that must hold on every exit path; a
//! drop guard enforces it even when classification or publishing panics.
//!
//! Nothing in here is ever fatal to the host: storage exhaustion drops the
//! candidate, inspector crashes are logged and swallowed.

pub mod inspector;

use std::fs;
use std::path::PathBuf;
use std::time::Duration;

use crate::config::Config;
use crate::issue::{DumpMode, Issue, IssueKind, IssueSink};
use crate::store::DumpStore;
use inspector::{AnalysisOutcome, CollectionHint, HeapInspector};

/// Filename prefix for snapshots allocated by the orchestrator.
const DUMP_PREFIX: &str = "leak";

/// A suspected-leaked object, as supplied by the candidate source.
/// `correlation_key` locates the object inside a heap snapshot.
#[derive(Debug, Clone)]
pub struct CandidateRecord {
    pub object_label: String,
    pub correlation_key: String,
}

/// Deletes the snapshot file when the orchestration step ends, however it
/// ends. `allocate` never creates the file, so a missing file is the normal
/// case on failure paths.
struct SnapshotGuard {
    path: PathBuf,
}

impl Drop for SnapshotGuard {
    fn drop(&mut self) {
        if !self.path.exists() {
            return;
        }
        if let Err(e) = fs::remove_file(&self.path) {
            log::warn!("failed to delete snapshot {}: {e}", self.path.display());
        }
    }
}

pub struct Orchestrator {
    store: DumpStore,
    inspector: Box<dyn HeapInspector>,
    sink: Box<dyn IssueSink>,
    collection_hint: Option<Box<dyn CollectionHint>>,
    timeout: Duration,
}

impl Orchestrator {
    pub fn new(
        config: &Config,
        inspector: Box<dyn HeapInspector>,
        sink: Box<dyn IssueSink>,
    ) -> Self {
        Orchestrator {
            store: DumpStore::new(config),
            inspector,
            sink,
            collection_hint: None,
            timeout: config.analysis_timeout,
        }
    }

    /// Install the optional pre-capture collection nudge.
    pub fn with_collection_hint(mut self, hint: Box<dyn CollectionHint>) -> Self {
        self.collection_hint = Some(hint);
        self
    }

    #[cfg(test)]
    fn with_store(mut self, store: DumpStore) -> Self {
        self.store = store;
        self
    }

    /// Run one candidate through capture, analysis, and reporting.
    ///
    /// Always returns `true`: the candidate is consumed whatever happens.
    /// Retrying on storage exhaustion would only worsen quota pressure, so
    /// a failed allocation drops the candidate silently.
    pub fn process(&self, candidate: &CandidateRecord) -> bool {
        let snapshot = match self.store.allocate(DUMP_PREFIX) {
            Ok(snapshot) => snapshot,
            Err(e) => {
                log::warn!(
                    "dropping candidate {}: no snapshot slot ({e})",
                    candidate.object_label
                );
                return true;
            }
        };

        let _guard = SnapshotGuard {
            path: snapshot.path.clone(),
        };

        if let Some(hint) = &self.collection_hint {
            hint.request_collection();
        }

        log::info!(
            "analyzing {} (key {}) via {}",
            candidate.object_label,
            candidate.correlation_key,
            snapshot.path.display()
        );

        match self
            .inspector
            .analyze(&snapshot.path, &candidate.correlation_key, self.timeout)
        {
            Ok(AnalysisOutcome::Clean) => {
                // absence of a leak is not newsworthy
                log::info!("no leak confirmed for {}", candidate.object_label);
            }
            Ok(AnalysisOutcome::LeakConfirmed {
                report,
                duration_ms,
            }) => {
                log::info!("leak found for {}", candidate.object_label);
                self.sink.publish(Issue {
                    kind: IssueKind::LeakFound,
                    mode: DumpMode::ForkAnalyse,
                    object_label: candidate.object_label.clone(),
                    correlation_key: candidate.correlation_key.clone(),
                    detail: report,
                    duration_ms,
                });
            }
            Ok(AnalysisOutcome::Failure { cause }) => {
                self.sink.publish(Issue {
                    kind: IssueKind::ErrException,
                    mode: DumpMode::ForkAnalyse,
                    object_label: candidate.object_label.clone(),
                    correlation_key: candidate.correlation_key.clone(),
                    detail: cause,
                    duration_ms: 0,
                });
            }
            Err(e) => {
                // infrastructure hiccup, not a leak-detection failure:
                // visible in logs only
                log::warn!(
                    "inspector failed for {}: {e}",
                    candidate.object_label
                );
            }
        }

        true
    }
}
