use std::path::Path;
use std::process::Command;

use crate::tools::{CommandRunner, Invocation, ToolFailure};

/// Launches real processes
pub struct SystemRunner;

impl SystemRunner {
    /// Check that the program can be launched.
    ///
    /// Programs given as a path must exist; bare names are looked up on
    /// `PATH`.
    fn locate(invocation: &Invocation) -> Result<(), ToolFailure> {
        let program = &invocation.program;

        if program.contains('/') {
            let path = match &invocation.cwd {
                Some(dir) => dir.join(program),
                None => Path::new(program).to_path_buf(),
            };
            if path.is_file() || Path::new(program).is_file() {
                return Ok(());
            }
            return Err(ToolFailure::NotFound(program.clone()));
        }

        which::which(program)
            .map(|_| ())
            .map_err(|_| ToolFailure::NotFound(program.clone()))
    }
}

impl CommandRunner for SystemRunner {
    fn run(&self, invocation: &Invocation) -> Result<(), ToolFailure> {
        Self::locate(invocation)?;

        log::info!("$ {}", invocation);

        let mut cmd = Command::new(&invocation.program);
        cmd.args(&invocation.args);

        if let Some(dir) = &invocation.cwd {
            cmd.current_dir(dir);
        }

        for (key, value) in &invocation.env {
            cmd.env(key, value);
        }

        let status = cmd.status().map_err(|e| ToolFailure::Spawn {
            program: invocation.program.clone(),
            reason: e.to_string(),
        })?;

        if !status.success() {
            return Err(ToolFailure::Exit {
                command: invocation.to_string(),
                code: status.code().unwrap_or(-1),
            });
        }

        Ok(())
    }
}
