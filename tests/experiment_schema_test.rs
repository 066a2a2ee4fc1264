//! Experiment tracking schema tests
//!
//! Records, the shared tracking repo, and the command launcher lifecycle.

use vo2_sweep::experiment::{
    CommandLauncher, Experiment, ExperimentLauncher, ExperimentRecord, ExperimentSpec, RunRecord,
    RunStatus, TrackingRepo, RUNS_DIR,
};
use vo2_sweep::config::{RunConfiguration, RunOverrides};
use vo2_sweep::grid::Grid;
use vo2_sweep::Error;

// =============================================================================
// ExperimentRecord Tests
// =============================================================================

#[test]
fn test_experiment_record_creation() {
    let record = ExperimentRecord::new("v2");

    assert_eq!(record.experiment_id(), "v2");
    assert!(record.created_at().timestamp() > 0);
}

#[test]
fn test_experiment_record_serialization() {
    let created = chrono::Utc::now() - chrono::Duration::days(1);
    let record = ExperimentRecord::builder("v2").created_at(created).build();

    let json = serde_json::to_string(&record).expect("serialization failed");
    let deserialized: ExperimentRecord =
        serde_json::from_str(&json).expect("deserialization failed");

    assert_eq!(record, deserialized);
    assert_eq!(deserialized.created_at(), created);
}

// =============================================================================
// RunRecord Tests
// =============================================================================

#[test]
fn test_run_record_lifecycle() {
    let mut run = RunRecord::new("run-1", "v2", "NG_[0]");
    assert_eq!(run.status(), RunStatus::Pending);
    assert!(run.started_at().is_none());

    run.start();
    assert_eq!(run.status(), RunStatus::Running);
    assert!(run.started_at().is_some());
    assert!(!run.status().is_terminal());

    run.complete(RunStatus::Success);
    assert!(run.status().is_terminal());
    assert!(run.ended_at() >= run.started_at());
}

#[test]
fn test_run_record_keeps_inputs() {
    let inputs = serde_json::json!({"key": "OG_[0, 1]", "full_load": true});
    let run = RunRecord::builder("run-2", "v2", "OG_[0, 1]")
        .inputs(inputs.clone())
        .build();

    assert_eq!(run.inputs(), Some(&inputs));
    assert_eq!(run.grid_key(), "OG_[0, 1]");
    assert_eq!(run.experiment_id(), "v2");
}

// =============================================================================
// TrackingRepo Tests
// =============================================================================

#[test]
fn test_repo_groups_runs_by_version() {
    let repo = TrackingRepo::in_memory();
    assert!(repo.is_empty());

    let a = repo.register_run("v1", "OG_[0]", None);
    let b = repo.register_run("v1", "NG_[0]", None);
    let _ = repo.register_run("v2", "NG_[0]", None);

    assert_ne!(a, b);
    assert_eq!(repo.experiment_count(), 2);
    assert_eq!(repo.run_count(), 3);

    let keys: Vec<String> = repo
        .runs_for_experiment("v1")
        .iter()
        .map(|run| run.grid_key().to_string())
        .collect();
    assert_eq!(keys, ["NG_[0]", "OG_[0]"]);
}

#[test]
fn test_repo_clones_share_state() {
    let repo = TrackingRepo::in_memory();
    let handle = repo.clone();
    let id = handle.register_run("v1", "NG_[0]", None);
    assert!(repo.run(&id).is_some());
}

#[test]
fn test_unknown_run_rejected() {
    let repo = TrackingRepo::in_memory();
    assert!(matches!(repo.start_run("missing"), Err(Error::UnknownRun(_))));
    assert!(matches!(
        repo.complete_run("missing", RunStatus::Failed),
        Err(Error::UnknownRun(_))
    ));
}

#[test]
fn test_persistent_repo_writes_run_json() {
    let dir = tempfile::tempdir().unwrap();
    let repo = TrackingRepo::open(dir.path()).unwrap();
    assert!(dir.path().join(RUNS_DIR).is_dir());

    let id = repo.register_run("v1", "NG_[0]", None);
    repo.start_run(&id).unwrap();
    repo.complete_run(&id, RunStatus::Success).unwrap();

    let path = repo.run_path(&id).unwrap();
    let stored: RunRecord = serde_json::from_slice(&std::fs::read(path).unwrap()).unwrap();
    assert_eq!(stored.run_id(), id);
    assert_eq!(stored.status(), RunStatus::Success);
}

// =============================================================================
// CommandLauncher Tests
// =============================================================================

fn first_spec() -> ExperimentSpec {
    let config = RunConfiguration::resolve(RunOverrides::default().with_version("v9")).unwrap();
    let point = Grid::new(&config).iter().next().unwrap();
    ExperimentSpec::for_point(&point, &config)
}

#[test]
fn test_dry_run_lifecycle() {
    let repo = TrackingRepo::in_memory();
    let spec = first_spec();
    let mut experiment = CommandLauncher::dry_run().launch(&spec, &repo).unwrap();

    let id = experiment.id().to_string();
    assert_eq!(repo.run(&id).unwrap().status(), RunStatus::Pending);

    experiment.fit_and_evaluate().unwrap();
    experiment.close().unwrap();

    let run = repo.run(&id).unwrap();
    assert_eq!(run.status(), RunStatus::Success);
    assert_eq!(run.grid_key(), spec.key);
    assert_eq!(run.inputs().unwrap()["version"], "v9");
}

#[test]
fn test_close_without_fit_marks_failed() {
    let repo = TrackingRepo::in_memory();
    let mut experiment = CommandLauncher::dry_run().launch(&first_spec(), &repo).unwrap();
    experiment.close().unwrap();
    experiment.close().unwrap();

    assert_eq!(repo.run(experiment.id()).unwrap().status(), RunStatus::Failed);
}
