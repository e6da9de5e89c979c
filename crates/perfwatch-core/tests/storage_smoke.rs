use perfwatch_core::recorder::RunRecorder;
use tempfile::tempdir;

mod common;

#[test]
fn test_storage_smoke_lifecycle() -> anyhow::Result<()> {
    let dir = tempdir()?;
    let db_path = dir.path().join("results.db");

    // 1. Open Store (init schema)
    let store = common::file_store(&db_path);
    store.add_test("backup_scale")?;

    // 2. Record one run end to end
    let recorder = RunRecorder::new(store.clone(), common::narrow_policy());
    let recorded = recorder.record(&common::run("backup_scale", 321))?;
    assert!(!recorded.verdict.failed());

    // 3. Verify via a raw connection
    let conn = rusqlite::Connection::open(&db_path)?;

    let (runtime, failed, reported, tool, target): (i64, bool, bool, String, String) = conn
        .query_row(
            "SELECT test_runtime, was_failed, was_reported, tool_version, target_version FROM test_runs",
            [],
            |r| Ok((r.get(0)?, r.get(1)?, r.get(2)?, r.get(3)?, r.get(4)?)),
        )?;
    assert_eq!(runtime, 321);
    assert!(!failed);
    assert!(!reported);
    assert_eq!(tool, "1.30.0");
    assert_eq!(target, "6.25.3");

    let (included, avg): (i64, f64) = conn.query_row(
        "SELECT test_runs_included, test_runtime_avg FROM test_stats",
        [],
        |r| Ok((r.get(0)?, r.get(1)?)),
    )?;
    assert_eq!(included, 1);
    assert_eq!(avg, 321.0);

    Ok(())
}

#[test]
fn test_init_schema_is_repeatable() -> anyhow::Result<()> {
    let dir = tempdir()?;
    let db_path = dir.path().join("results.db");

    let store = common::file_store(&db_path);
    store.add_test("t")?;
    store.init_schema()?;

    let reopened = common::file_store(&db_path);
    assert_eq!(reopened.list_tests()?.len(), 1);
    Ok(())
}

#[test]
fn test_run_requires_existing_test_row() {
    let store = common::memory_store();
    let res = store.write_tx(|tx| {
        tx.insert_run(
            perfwatch_core::model::TestId(999),
            "ts",
            1,
            "a",
            "b",
            false,
            false,
        )
    });
    assert!(res.unwrap_err().is_store_error());
    assert_eq!(store.count_runs().unwrap(), 0);
}
