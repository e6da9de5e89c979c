use crate::config::StoreConfig;
use crate::errors::{WorkflowError, WorkflowResult};
use crate::model::{
    Baseline, BaselineStats, NamedTest, RunId, RunRecord, TestId, UnreportedFailure,
};
use crate::stats::Aggregator;
use crate::thresholds::ThresholdPolicy;
use rusqlite::{params, Connection, OptionalExtension, Transaction, TransactionBehavior};
use std::sync::{Arc, Mutex, MutexGuard};
use std::time::Duration;

#[derive(Clone)]
pub struct Store {
    conn: Arc<Mutex<Connection>>,
}

impl Store {
    pub fn open(cfg: &StoreConfig) -> WorkflowResult<Self> {
        let conn = Connection::open(&cfg.path)?;
        conn.busy_timeout(Duration::from_millis(cfg.busy_timeout_ms))?;
        conn.execute("PRAGMA foreign_keys = ON", [])?;
        // journal_mode returns the resulting mode as a row
        let mode: String = conn.query_row("PRAGMA journal_mode = WAL", [], |r| r.get(0))?;
        tracing::debug!(
            event = "store.open",
            path = %cfg.path.display(),
            journal_mode = %mode
        );
        Ok(Self {
            conn: Arc::new(Mutex::new(conn)),
        })
    }

    pub fn memory() -> WorkflowResult<Self> {
        let conn = Connection::open_in_memory()?;
        conn.execute("PRAGMA foreign_keys = ON", [])?;
        Ok(Self {
            conn: Arc::new(Mutex::new(conn)),
        })
    }

    pub fn init_schema(&self) -> WorkflowResult<()> {
        let conn = self.lock()?;
        conn.execute_batch(crate::storage::schema::DDL)?;
        Ok(())
    }

    fn lock(&self) -> WorkflowResult<MutexGuard<'_, Connection>> {
        self.conn.lock().map_err(|_| WorkflowError::StoreLockPoisoned)
    }

    /// Run `f` inside one `BEGIN IMMEDIATE` transaction.
    ///
    /// The write lock is taken up front, so concurrent writers queue (up to
    /// the busy timeout) instead of interleaving. An `Err` from `f` rolls
    /// everything back.
    pub fn write_tx<T, F>(&self, f: F) -> WorkflowResult<T>
    where
        F: FnOnce(&StoreTx<'_>) -> WorkflowResult<T>,
    {
        let mut conn = self.lock()?;
        let tx = conn.transaction_with_behavior(TransactionBehavior::Immediate)?;
        let stx = StoreTx { tx };
        let out = f(&stx)?;
        stx.tx.commit()?;
        Ok(out)
    }

    /// Register a test name. Returns the existing id if already present.
    pub fn add_test(&self, name: &str) -> WorkflowResult<TestId> {
        self.write_tx(|tx| {
            tx.tx.execute(
                "INSERT INTO test_names(test_name) VALUES (?1)
                 ON CONFLICT(test_name) DO NOTHING",
                params![name],
            )?;
            let id = query_test_id(&tx.tx, name)?.ok_or_else(|| {
                WorkflowError::UnknownTest(name.to_string())
            })?;
            Ok(id)
        })
    }

    pub fn list_tests(&self) -> WorkflowResult<Vec<NamedTest>> {
        let conn = self.lock()?;
        let mut stmt =
            conn.prepare("SELECT test_id, test_name FROM test_names ORDER BY test_name ASC")?;
        let rows = stmt
            .query_map([], |row| {
                Ok(NamedTest {
                    test_id: TestId(row.get(0)?),
                    test_name: row.get(1)?,
                })
            })?
            .collect::<Result<Vec<_>, _>>()?;
        Ok(rows)
    }

    pub fn lookup_test_id(&self, name: &str) -> WorkflowResult<Option<TestId>> {
        let conn = self.lock()?;
        query_test_id(&conn, name)
    }

    /// Stored baseline for `name`; `UnknownTest` if the name is not registered.
    pub fn lookup_baseline(&self, name: &str) -> WorkflowResult<Baseline> {
        let conn = self.lock()?;
        let id = query_test_id(&conn, name)?
            .ok_or_else(|| WorkflowError::UnknownTest(name.to_string()))?;
        query_baseline(&conn, id)
    }

    /// Most recent runs first.
    pub fn runs_for_test(&self, name: &str, limit: u32) -> WorkflowResult<Vec<RunRecord>> {
        let conn = self.lock()?;
        let id = query_test_id(&conn, name)?
            .ok_or_else(|| WorkflowError::UnknownTest(name.to_string()))?;
        let mut stmt = conn.prepare(
            "SELECT run_id, test_id, run_timestamp, test_runtime, tool_version,
                    target_version, was_failed, was_reported
             FROM test_runs
             WHERE test_id = ?1
             ORDER BY run_id DESC
             LIMIT ?2",
        )?;
        let rows = stmt
            .query_map(params![id.0, limit], |row| {
                Ok(RunRecord {
                    run_id: RunId(row.get(0)?),
                    test_id: TestId(row.get(1)?),
                    run_timestamp: row.get(2)?,
                    runtime: runtime_from_sql(row.get(3)?),
                    tool_version: row.get(4)?,
                    target_version: row.get(5)?,
                    failed: row.get(6)?,
                    reported: row.get(7)?,
                })
            })?
            .collect::<Result<Vec<_>, _>>()?;
        Ok(rows)
    }

    /// Re-aggregate a test's stats outside of a recording, e.g. after a
    /// policy change.
    pub fn recompute_baseline_by_name(
        &self,
        name: &str,
        policy: &ThresholdPolicy,
    ) -> WorkflowResult<Baseline> {
        self.write_tx(|tx| {
            let id = tx
                .lookup_test_id(name)?
                .ok_or_else(|| WorkflowError::UnknownTest(name.to_string()))?;
            tx.recompute_baseline(id, policy)
        })
    }

    /// Failed runs not yet covered by a notification, oldest first.
    pub fn select_unreported_failures(&self) -> WorkflowResult<Vec<UnreportedFailure>> {
        let conn = self.lock()?;
        let mut stmt = conn.prepare(
            "SELECT tr.run_id, tr.test_id, tn.test_name, tr.run_timestamp, tr.test_runtime,
                    tr.tool_version, tr.target_version
             FROM test_runs tr
             JOIN test_names tn ON tn.test_id = tr.test_id
             WHERE tr.was_failed = 1 AND tr.was_reported = 0
             ORDER BY tr.run_id ASC",
        )?;
        let rows = stmt
            .query_map([], |row| {
                Ok(UnreportedFailure {
                    run_id: RunId(row.get(0)?),
                    test_id: TestId(row.get(1)?),
                    test_name: row.get(2)?,
                    run_timestamp: row.get(3)?,
                    runtime: runtime_from_sql(row.get(4)?),
                    tool_version: row.get(5)?,
                    target_version: row.get(6)?,
                })
            })?
            .collect::<Result<Vec<_>, _>>()?;
        Ok(rows)
    }

    /// Flip `reported` for exactly the given runs, in one transaction.
    ///
    /// Rows already reported (by an overlapping sweep) or not failed are left
    /// alone. Returns how many rows actually transitioned.
    pub fn mark_reported(&self, run_ids: &[RunId]) -> WorkflowResult<usize> {
        if run_ids.is_empty() {
            return Ok(0);
        }
        self.write_tx(|tx| {
            let mut stmt = tx.tx.prepare(
                "UPDATE test_runs SET was_reported = 1
                 WHERE run_id = ?1 AND was_failed = 1 AND was_reported = 0",
            )?;
            let mut changed = 0;
            for id in run_ids {
                changed += stmt.execute(params![id.0])?;
            }
            Ok(changed)
        })
    }

    pub fn count_runs(&self) -> WorkflowResult<i64> {
        let conn = self.lock()?;
        let n: i64 = conn.query_row("SELECT COUNT(*) FROM test_runs", [], |r| r.get(0))?;
        Ok(n)
    }
}

/// Handle to an open write transaction. See [`Store::write_tx`].
pub struct StoreTx<'conn> {
    tx: Transaction<'conn>,
}

impl StoreTx<'_> {
    pub fn lookup_test_id(&self, name: &str) -> WorkflowResult<Option<TestId>> {
        query_test_id(&self.tx, name)
    }

    pub fn baseline_for(&self, test_id: TestId) -> WorkflowResult<Baseline> {
        query_baseline(&self.tx, test_id)
    }

    #[allow(clippy::too_many_arguments)]
    pub fn insert_run(
        &self,
        test_id: TestId,
        run_timestamp: &str,
        runtime: u64,
        tool_version: &str,
        target_version: &str,
        failed: bool,
        reported: bool,
    ) -> WorkflowResult<RunId> {
        self.tx.execute(
            "INSERT INTO test_runs(test_id, run_timestamp, test_runtime, tool_version,
                                   target_version, was_failed, was_reported)
             VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7)",
            params![
                test_id.0,
                run_timestamp,
                runtime_to_sql(runtime)?,
                tool_version,
                target_version,
                failed,
                reported
            ],
        )?;
        Ok(RunId(self.tx.last_insert_rowid()))
    }

    /// Runtimes inside the policy window, oldest first.
    pub fn history(&self, test_id: TestId, window: Option<u32>) -> WorkflowResult<Vec<u64>> {
        // negative LIMIT means unbounded in SQLite
        let limit = window.map(i64::from).unwrap_or(-1);
        let mut stmt = self.tx.prepare(
            "SELECT test_runtime FROM (
                 SELECT run_id, test_runtime FROM test_runs
                 WHERE test_id = ?1
                 ORDER BY run_id DESC
                 LIMIT ?2
             )
             ORDER BY run_id ASC",
        )?;
        let rows = stmt
            .query_map(params![test_id.0, limit], |row| {
                Ok(runtime_from_sql(row.get(0)?))
            })?
            .collect::<Result<Vec<_>, _>>()?;
        Ok(rows)
    }

    /// Rebuild `test_stats` for `test_id` from its run history.
    pub fn recompute_baseline(
        &self,
        test_id: TestId,
        policy: &ThresholdPolicy,
    ) -> WorkflowResult<Baseline> {
        let mut agg = Aggregator::new(*policy);
        for runtime in self.history(test_id, policy.window)? {
            agg.push(runtime);
        }

        match agg.finish() {
            Some(stats) => {
                upsert_stats(&self.tx, test_id, &stats)?;
                Ok(Baseline::Present(stats))
            }
            None => {
                self.tx
                    .execute("DELETE FROM test_stats WHERE test_id = ?1", params![test_id.0])?;
                Ok(Baseline::Absent)
            }
        }
    }
}

fn query_test_id(conn: &Connection, name: &str) -> WorkflowResult<Option<TestId>> {
    let id = conn
        .query_row(
            "SELECT test_id FROM test_names WHERE test_name = ?1",
            params![name],
            |r| r.get::<_, i64>(0),
        )
        .optional()?;
    Ok(id.map(TestId))
}

fn query_baseline(conn: &Connection, test_id: TestId) -> WorkflowResult<Baseline> {
    let stats = conn
        .query_row(
            "SELECT test_runs_included, test_runtime_avg, test_runtime_var,
                    test_limit_report, test_limit_fail
             FROM test_stats WHERE test_id = ?1",
            params![test_id.0],
            |row| {
                Ok(BaselineStats {
                    runs_included: row.get(0)?,
                    runtime_avg: row.get(1)?,
                    runtime_var: row.get(2)?,
                    limit_report: row.get(3)?,
                    limit_fail: row.get(4)?,
                })
            },
        )
        .optional()?;
    Ok(stats.into())
}

fn upsert_stats(conn: &Connection, test_id: TestId, s: &BaselineStats) -> WorkflowResult<()> {
    conn.execute(
        "INSERT INTO test_stats(test_id, test_runs_included, test_runtime_avg, test_runtime_var,
                                test_limit_report, test_limit_fail)
         VALUES (?1, ?2, ?3, ?4, ?5, ?6)
         ON CONFLICT(test_id) DO UPDATE SET
            test_runs_included=excluded.test_runs_included,
            test_runtime_avg=excluded.test_runtime_avg,
            test_runtime_var=excluded.test_runtime_var,
            test_limit_report=excluded.test_limit_report,
            test_limit_fail=excluded.test_limit_fail",
        params![
            test_id.0,
            s.runs_included,
            s.runtime_avg,
            s.runtime_var,
            s.limit_report,
            s.limit_fail
        ],
    )?;
    Ok(())
}

fn runtime_to_sql(runtime: u64) -> WorkflowResult<i64> {
    i64::try_from(runtime)
        .map_err(|e| WorkflowError::StoreUnavailable(rusqlite::Error::ToSqlConversionFailure(Box::new(e))))
}

// test_runtime has a CHECK (>= 0) constraint
fn runtime_from_sql(v: i64) -> u64 {
    v.max(0) as u64
}
