//! Out-of-band evidence collection
//!
//! HTTP responses alone cannot prove that an order landed in the database or
//! that the bot handler actually ran. These helpers shell out on the backend
//! host to gather that evidence.

pub mod logs;
pub mod mongo;

pub use logs::LogTail;
pub use mongo::MongoShell;

/// Captured output of a shell-out
#[derive(Clone, Debug)]
pub struct ShellOutput {
    pub stdout: String,
    pub stderr: String,
    pub exit_code: i32,
}

impl ShellOutput {
    pub fn success(&self) -> bool {
        self.exit_code == 0
    }
}
