pub mod classify;
pub mod config;
pub mod errors;
pub mod model;
pub mod notify;
pub mod recorder;
pub mod stats;
pub mod storage;
pub mod thresholds;

pub use errors::{ConfigError, WorkflowError, WorkflowResult};
