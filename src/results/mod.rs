//! Persistent probe results

pub mod storage;

pub use storage::{ExportFormat, ResultsStorage, StoredProbeRun};
