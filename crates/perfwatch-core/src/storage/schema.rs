pub const DDL: &str = r#"
CREATE TABLE IF NOT EXISTS test_names (
  test_id INTEGER PRIMARY KEY AUTOINCREMENT,
  test_name TEXT NOT NULL UNIQUE
);

CREATE TABLE IF NOT EXISTS test_stats (
  test_id INTEGER PRIMARY KEY REFERENCES test_names(test_id),
  test_runs_included INTEGER NOT NULL,
  test_runtime_avg REAL NOT NULL,
  test_runtime_var REAL NOT NULL,
  test_limit_report REAL NOT NULL,
  test_limit_fail REAL NOT NULL
);

CREATE TABLE IF NOT EXISTS test_runs (
  run_id INTEGER PRIMARY KEY AUTOINCREMENT,
  test_id INTEGER NOT NULL REFERENCES test_names(test_id),
  run_timestamp TEXT NOT NULL,
  test_runtime INTEGER NOT NULL CHECK (test_runtime >= 0),
  tool_version TEXT NOT NULL,
  target_version TEXT NOT NULL,
  was_failed INTEGER NOT NULL DEFAULT 0,
  was_reported INTEGER NOT NULL DEFAULT 0,
  CHECK (was_reported = 0 OR was_failed = 1)
);

CREATE INDEX IF NOT EXISTS idx_test_runs_history ON test_runs(test_id, run_id);
CREATE INDEX IF NOT EXISTS idx_test_runs_pending ON test_runs(was_failed, was_reported);
"#;
