#![allow(dead_code)]

use perfwatch_core::config::StoreConfig;
use perfwatch_core::model::{RunId, RunInput};
use perfwatch_core::storage::Store;
use perfwatch_core::thresholds::ThresholdPolicy;
use std::path::Path;

/// limit_report = avg + stddev, limit_fail = avg + 2 * stddev, full history,
/// default margin floor.
pub fn narrow_policy() -> ThresholdPolicy {
    ThresholdPolicy {
        report_sigma: 1.0,
        fail_sigma: 2.0,
        window: None,
        ..ThresholdPolicy::default()
    }
}

pub fn file_store(path: &Path) -> Store {
    let store = Store::open(&StoreConfig {
        path: path.to_path_buf(),
        busy_timeout_ms: 10_000,
    })
    .unwrap();
    store.init_schema().unwrap();
    store
}

pub fn memory_store() -> Store {
    let store = Store::memory().unwrap();
    store.init_schema().unwrap();
    store
}

pub fn run(test_name: &str, runtime: u64) -> RunInput {
    RunInput {
        test_name: test_name.to_string(),
        runtime,
        tool_version: "1.30.0".to_string(),
        target_version: "6.25.3".to_string(),
    }
}

/// Insert a failed, unreported run directly, bypassing classification.
pub fn insert_failure(store: &Store, test_name: &str, runtime: u64) -> RunId {
    let test_id = store.add_test(test_name).unwrap();
    store
        .write_tx(|tx| {
            tx.insert_run(
                test_id,
                "2026-10-14T08:00:00+00:00",
                runtime,
                "1.30.0",
                "6.25.3",
                true,
                false,
            )
        })
        .unwrap()
}
