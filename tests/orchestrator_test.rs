//! Outcome/error matrix for the orchestration step.
//!
//! One scenario per inspector behavior, each asserting the two contract
//! points: what reaches the issue sink, and that the snapshot file is gone
//! once `process` returns.

use std::fs;
use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};
use std::time::Duration;

use leakwarden::analyze::inspector::{
    AnalysisOutcome, CollectionHint, HeapInspector, InspectorError,
};
use leakwarden::analyze::{CandidateRecord, Orchestrator};
use leakwarden::config::Config;
use leakwarden::issue::{Issue, IssueKind, IssueSink};

#[derive(Clone, Copy)]
enum Script {
    Clean,
    LeakConfirmed,
    ReportedFailure,
    InfrastructureError,
}

/// Inspector that writes snapshot bytes (as the real out-of-process capture
/// would) and then follows its script.
struct ScriptedInspector {
    script: Script,
    seen_path: Arc<Mutex<Option<PathBuf>>>,
}

impl HeapInspector for ScriptedInspector {
    fn analyze(
        &self,
        path: &Path,
        _correlation_key: &str,
        _timeout: Duration,
    ) -> Result<AnalysisOutcome, InspectorError> {
        fs::write(path, b"hprof bytes").unwrap();
        *self.seen_path.lock().unwrap() = Some(path.to_path_buf());

        match self.script {
            Script::Clean => Ok(AnalysisOutcome::Clean),
            Script::LeakConfirmed => Ok(AnalysisOutcome::LeakConfirmed {
                report: "MainView <- Presenter <- singleton cache".to_string(),
                duration_ms: 4200,
            }),
            Script::ReportedFailure => Ok(AnalysisOutcome::Failure {
                cause: "analysis deadline exceeded".to_string(),
            }),
            Script::InfrastructureError => {
                // partial capture left on disk, then the process dies
                Err(InspectorError::Process("fork failed".to_string()))
            }
        }
    }
}

#[derive(Clone)]
struct RecordingSink(Arc<Mutex<Vec<Issue>>>);

impl IssueSink for RecordingSink {
    fn publish(&self, issue: Issue) {
        self.0.lock().unwrap().push(issue);
    }
}

struct CountingHint(Arc<AtomicUsize>);

impl CollectionHint for CountingHint {
    fn request_collection(&self) {
        self.0.fetch_add(1, Ordering::SeqCst);
    }
}

fn test_config(root: &Path) -> Config {
    Config {
        storage_root: root.to_path_buf(),
        process_label: "orchtest".to_string(),
        max_file_count: 10,
        min_free_space: 0,
        expired_after: Duration::from_secs(3600),
        analysis_timeout: Duration::from_secs(600),
    }
}

fn candidate() -> CandidateRecord {
    CandidateRecord {
        object_label: "MainView".to_string(),
        correlation_key: "key-42".to_string(),
    }
}

struct Run {
    issues: Vec<Issue>,
    snapshot_path: Option<PathBuf>,
    handled: bool,
    hint_calls: usize,
}

fn run_with(script: Script, root: &Path) -> Run {
    let config = test_config(root);
    let seen_path = Arc::new(Mutex::new(None));
    let issues = Arc::new(Mutex::new(Vec::new()));
    let hint_calls = Arc::new(AtomicUsize::new(0));

    let orchestrator = Orchestrator::new(
        &config,
        Box::new(ScriptedInspector {
            script,
            seen_path: seen_path.clone(),
        }),
        Box::new(RecordingSink(issues.clone())),
    )
    .with_collection_hint(Box::new(CountingHint(hint_calls.clone())));

    let handled = orchestrator.process(&candidate());

    let run = Run {
        issues: issues.lock().unwrap().clone(),
        snapshot_path: seen_path.lock().unwrap().clone(),
        handled,
        hint_calls: hint_calls.load(Ordering::SeqCst),
    };
    run
}

fn assert_snapshot_deleted(run: &Run) {
    let path = run
        .snapshot_path
        .as_ref()
        .expect("inspector should have been invoked");
    assert!(!path.exists(), "snapshot must not outlive the run");
}

#[test]
fn clean_outcome_publishes_nothing() {
    let dir = tempfile::tempdir().unwrap();
    let run = run_with(Script::Clean, dir.path());

    assert!(run.handled);
    assert!(run.issues.is_empty());
    assert_snapshot_deleted(&run);
    assert_eq!(run.hint_calls, 1);
}

#[test]
fn confirmed_leak_publishes_one_leak_found_issue() {
    let dir = tempfile::tempdir().unwrap();
    let run = run_with(Script::LeakConfirmed, dir.path());

    assert!(run.handled);
    assert_eq!(run.issues.len(), 1);
    let issue = &run.issues[0];
    assert_eq!(issue.kind, IssueKind::LeakFound);
    assert_eq!(issue.object_label, "MainView");
    assert_eq!(issue.correlation_key, "key-42");
    assert_eq!(issue.detail, "MainView <- Presenter <- singleton cache");
    assert_eq!(issue.duration_ms, 4200);
    assert_snapshot_deleted(&run);
}

#[test]
fn reported_failure_publishes_exception_issue_with_zero_duration() {
    let dir = tempfile::tempdir().unwrap();
    let run = run_with(Script::ReportedFailure, dir.path());

    assert!(run.handled);
    assert_eq!(run.issues.len(), 1);
    let issue = &run.issues[0];
    assert_eq!(issue.kind, IssueKind::ErrException);
    assert_eq!(issue.detail, "analysis deadline exceeded");
    assert_eq!(issue.duration_ms, 0);
    assert_snapshot_deleted(&run);
}

#[test]
fn infrastructure_error_is_swallowed_without_issue() {
    let dir = tempfile::tempdir().unwrap();
    let run = run_with(Script::InfrastructureError, dir.path());

    assert!(run.handled);
    assert!(run.issues.is_empty());
    // the partial capture the inspector left behind is still cleaned up
    assert_snapshot_deleted(&run);
}

#[test]
fn storage_directory_is_empty_after_every_path() {
    for script in [
        Script::Clean,
        Script::LeakConfirmed,
        Script::ReportedFailure,
        Script::InfrastructureError,
    ] {
        let dir = tempfile::tempdir().unwrap();
        run_with(script, dir.path());

        let leftovers: Vec<_> = fs::read_dir(dir.path()).unwrap().flatten().collect();
        assert!(leftovers.is_empty(), "no snapshot may survive the run");
    }
}

#[test]
fn consecutive_candidates_are_processed_independently() {
    let dir = tempfile::tempdir().unwrap();
    let config = test_config(dir.path());
    let issues = Arc::new(Mutex::new(Vec::new()));

    let orchestrator = Orchestrator::new(
        &config,
        Box::new(ScriptedInspector {
            script: Script::LeakConfirmed,
            seen_path: Arc::new(Mutex::new(None)),
        }),
        Box::new(RecordingSink(issues.clone())),
    );

    for _ in 0..3 {
        assert!(orchestrator.process(&candidate()));
    }

    assert_eq!(issues.lock().unwrap().len(), 3);
    let leftovers: Vec<_> = fs::read_dir(dir.path()).unwrap().flatten().collect();
    assert!(leftovers.is_empty());
}
