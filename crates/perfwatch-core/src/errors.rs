use std::path::PathBuf;
use thiserror::Error;

/// Configuration could not be loaded or failed validation.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ConfigError(pub String);

impl std::fmt::Display for ConfigError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "config error: {}", self.0)
    }
}

impl std::error::Error for ConfigError {}

/// Errors surfaced by the record and sweep workflows.
///
/// Every variant is fatal for the invocation that produced it. Callers map
/// them to a non-zero exit status; none of them is ever logged and swallowed.
#[derive(Debug, Error)]
pub enum WorkflowError {
    /// The test name has no row in `test_names`. Nothing was written.
    #[error("unknown test '{0}' (register it with `perfwatch add-test` first)")]
    UnknownTest(String),

    /// Connection, query or constraint failure. The enclosing transaction
    /// was rolled back.
    /// The cause is the error source, so `{:#}` on an `anyhow` chain prints
    /// it once.
    #[error("store unavailable")]
    StoreUnavailable(#[from] rusqlite::Error),

    /// The directory holding the database file could not be created.
    #[error("store unavailable: cannot create directory {}", path.display())]
    StoreDir {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("store unavailable: connection lock poisoned")]
    StoreLockPoisoned,

    /// The notification channel was unreachable, timed out or rejected the
    /// message. Selected runs are left unreported for the next sweep.
    #[error("notification dispatch failed: {0}")]
    DispatchFailure(String),

    #[error(transparent)]
    Config(#[from] ConfigError),
}

impl WorkflowError {
    pub fn is_store_error(&self) -> bool {
        matches!(
            self,
            WorkflowError::StoreUnavailable(_)
                | WorkflowError::StoreDir { .. }
                | WorkflowError::StoreLockPoisoned
        )
    }
}

pub type WorkflowResult<T> = Result<T, WorkflowError>;

#[cfg(test)]
mod tests {
    use super::*;
    use std::error::Error as _;

    #[test]
    fn store_error_cause_is_printed_only_by_the_source_chain() {
        let err = WorkflowError::StoreUnavailable(rusqlite::Error::InvalidQuery);
        assert_eq!(err.to_string(), "store unavailable");
        let source = err.source().map(|s| s.to_string()).unwrap_or_default();
        assert!(!source.is_empty());
        assert!(err.is_store_error());
    }

    #[test]
    fn store_dir_error_names_the_path() {
        let err = WorkflowError::StoreDir {
            path: PathBuf::from("/nope/db"),
            source: std::io::Error::from(std::io::ErrorKind::NotFound),
        };
        assert!(err.to_string().contains("/nope/db"));
        assert!(err.is_store_error());
    }
}
