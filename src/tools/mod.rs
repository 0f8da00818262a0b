//! External tool invocation
//!
//! Every build tool and command line uploader is launched through the
//! [CommandRunner] trait so lanes can be exercised without the real tools:
//! - [SystemRunner]: spawns the process and waits for it
//! - [MockRunner]: records invocations for tests

pub mod executor;
pub mod invocation;
pub mod mock;

pub use executor::SystemRunner;
pub use invocation::Invocation;
pub use mock::MockRunner;

use thiserror::Error;

/// Why an external tool did not complete successfully
#[derive(Error, Debug, Clone, PartialEq)]
pub enum ToolFailure {
    #[error("'{0}' was not found on PATH")]
    NotFound(String),

    #[error("failed to launch '{program}': {reason}")]
    Spawn { program: String, reason: String },

    #[error("'{command}' exited with status {code}")]
    Exit { command: String, code: i32 },
}

/// Runs external tools synchronously
pub trait CommandRunner {
    /// Run the invocation to completion.
    ///
    /// Output is streamed to the terminal; only the exit status is
    /// inspected.
    fn run(&self, invocation: &Invocation) -> Result<(), ToolFailure>;
}
