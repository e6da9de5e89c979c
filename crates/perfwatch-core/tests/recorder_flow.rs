use perfwatch_core::classify::Outcome;
use perfwatch_core::model::Baseline;
use perfwatch_core::recorder::RunRecorder;
use perfwatch_core::thresholds::{ThresholdPolicy, MIN_RUNS_FOR_VERDICT};
use perfwatch_core::WorkflowError;
use tempfile::tempdir;

mod common;

fn seed_alternating(recorder: &RunRecorder, name: &str, n: usize) {
    for i in 0..n {
        let runtime = if i % 2 == 0 { 90 } else { 110 };
        let r = recorder.record(&common::run(name, runtime)).unwrap();
        assert!(!r.verdict.failed(), "seed run {} should not fail", i);
    }
}

#[test]
fn test_unknown_test_writes_nothing() {
    let store = common::memory_store();
    store.add_test("known").unwrap();
    let recorder = RunRecorder::new(store.clone(), common::narrow_policy());

    let err = recorder.record(&common::run("unknown", 150)).unwrap_err();
    assert!(matches!(err, WorkflowError::UnknownTest(ref n) if n == "unknown"));
    assert_eq!(store.count_runs().unwrap(), 0);
    assert_eq!(store.lookup_baseline("known").unwrap(), Baseline::Absent);
}

#[test]
fn test_cold_baseline_never_fails() {
    let store = common::memory_store();
    store.add_test("cold").unwrap();
    let recorder = RunRecorder::new(store.clone(), common::narrow_policy());

    // Wildly different runtimes, but fewer than MIN_RUNS_FOR_VERDICT prior runs each time.
    for i in 0..MIN_RUNS_FOR_VERDICT {
        let runtime = if i == MIN_RUNS_FOR_VERDICT - 1 { 100_000 } else { 10 };
        let r = recorder.record(&common::run("cold", runtime as u64)).unwrap();
        assert_eq!(r.verdict.outcome, Outcome::Pass);
    }
    assert!(store.select_unreported_failures().unwrap().is_empty());
}

#[test]
fn test_regression_is_recorded_failed_and_unreported() {
    let store = common::memory_store();
    store.add_test("scale_backup").unwrap();
    let recorder = RunRecorder::new(store.clone(), common::narrow_policy());

    seed_alternating(&recorder, "scale_backup", 12);

    let stats = *store
        .lookup_baseline("scale_backup")
        .unwrap()
        .stats()
        .expect("baseline after 12 runs");
    assert_eq!(stats.runs_included, 12);
    assert_eq!(stats.runtime_avg, 100.0);
    assert_eq!(stats.limit_fail, 120.0);

    let recorded = recorder.record(&common::run("scale_backup", 150)).unwrap();
    assert!(recorded.verdict.failed());
    assert_eq!(recorded.verdict.baseline, Baseline::Present(stats));
    assert_eq!(recorded.refreshed.runs_included(), 13);

    let runs = store.runs_for_test("scale_backup", 1).unwrap();
    assert_eq!(runs[0].run_id, recorded.run_id);
    assert!(runs[0].failed);
    assert!(!runs[0].reported);
}

#[test]
fn test_exact_fail_limit_counts_as_failure() {
    let store = common::memory_store();
    store.add_test("t").unwrap();
    let recorder = RunRecorder::new(store.clone(), common::narrow_policy());
    seed_alternating(&recorder, "t", 12);

    assert!(recorder.record(&common::run("t", 120)).unwrap().verdict.failed());
}

#[test]
fn test_windowed_baseline_forgets_old_runs() {
    let store = common::memory_store();
    store.add_test("t").unwrap();
    let policy = ThresholdPolicy {
        window: Some(10),
        ..common::narrow_policy()
    };
    let recorder = RunRecorder::new(store.clone(), policy);

    for _ in 0..5 {
        recorder.record(&common::run("t", 1_000)).unwrap();
    }
    for _ in 0..10 {
        recorder.record(&common::run("t", 50)).unwrap();
    }

    let stats = *store.lookup_baseline("t").unwrap().stats().unwrap();
    assert_eq!(stats.runs_included, 10);
    assert_eq!(stats.runtime_avg, 50.0);
    // 5% of 50 is above the 2s floor
    assert_eq!(stats.limit_fail, 52.5);
}

#[test]
fn test_steady_history_passes_an_identical_run() {
    let store = common::memory_store();
    store.add_test("steady").unwrap();
    let recorder = RunRecorder::new(store.clone(), ThresholdPolicy::default());

    for _ in 0..MIN_RUNS_FOR_VERDICT {
        recorder.record(&common::run("steady", 100)).unwrap();
    }
    let stats = *store.lookup_baseline("steady").unwrap().stats().unwrap();
    assert_eq!(stats.runtime_var, 0.0);
    assert!(stats.limit_fail > stats.runtime_avg);

    let same = recorder.record(&common::run("steady", 100)).unwrap();
    assert_eq!(same.verdict.outcome, Outcome::Pass);

    let slower = recorder.record(&common::run("steady", 106)).unwrap();
    assert!(slower.verdict.failed());
    assert_eq!(store.select_unreported_failures().unwrap().len(), 1);
}

#[test]
fn test_recompute_by_name_is_idempotent() {
    let store = common::memory_store();
    store.add_test("t").unwrap();
    let policy = common::narrow_policy();
    let recorder = RunRecorder::new(store.clone(), policy);
    for rt in [97, 101, 113, 88, 105, 99, 131, 92, 100, 104, 96] {
        recorder.record(&common::run("t", rt)).unwrap();
    }

    let stored = store.lookup_baseline("t").unwrap();
    let first = store.recompute_baseline_by_name("t", &policy).unwrap();
    let second = store.recompute_baseline_by_name("t", &policy).unwrap();

    let (a, b, s) = (first.stats().unwrap(), second.stats().unwrap(), stored.stats().unwrap());
    assert_eq!(a.runtime_avg.to_bits(), b.runtime_avg.to_bits());
    assert_eq!(a.runtime_var.to_bits(), b.runtime_var.to_bits());
    assert_eq!(a.limit_fail.to_bits(), s.limit_fail.to_bits());
    assert_eq!(first, second);
    assert_eq!(first, stored);
}

#[test]
fn test_concurrent_recorders_same_test_lose_no_updates() {
    const THREADS: usize = 8;
    const RUNS_PER_THREAD: usize = 5;

    let dir = tempdir().unwrap();
    let db_path = dir.path().join("results.db");

    let store = common::file_store(&db_path);
    store.add_test("shared").unwrap();
    store.add_test("other").unwrap();
    let recorder = RunRecorder::new(store.clone(), common::narrow_policy());
    for _ in 0..3 {
        recorder.record(&common::run("shared", 100)).unwrap();
    }
    let prior = store.lookup_baseline("shared").unwrap().runs_included();
    assert_eq!(prior, 3);

    let handles: Vec<_> = (0..THREADS)
        .map(|t| {
            let path = db_path.clone();
            std::thread::spawn(move || {
                // separate connection per thread, like separate CI invocations
                let store = common::file_store(&path);
                let recorder = RunRecorder::new(store, common::narrow_policy());
                let name = if t == 0 { "other" } else { "shared" };
                for i in 0..RUNS_PER_THREAD {
                    recorder
                        .record(&common::run(name, 100 + i as u64))
                        .unwrap();
                }
            })
        })
        .collect();
    for h in handles {
        h.join().unwrap();
    }

    let shared = store.lookup_baseline("shared").unwrap();
    let other = store.lookup_baseline("other").unwrap();
    assert_eq!(
        shared.runs_included() as usize,
        prior as usize + (THREADS - 1) * RUNS_PER_THREAD
    );
    assert_eq!(other.runs_included() as usize, RUNS_PER_THREAD);
    assert_eq!(
        store.count_runs().unwrap() as usize,
        3 + THREADS * RUNS_PER_THREAD
    );
}
