//! Output formatting

pub mod formatter;

pub use formatter::{OutputFormat, ResultFormatter};
