//! Check execution

pub mod runner;

pub use runner::ProbeRunner;
