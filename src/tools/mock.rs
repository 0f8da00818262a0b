use std::fs;
use std::path::PathBuf;
use std::sync::Mutex;

use crate::tools::{CommandRunner, Invocation, ToolFailure};

/// Runner that records invocations instead of launching processes
#[derive(Default)]
pub struct MockRunner {
    invocations: Mutex<Vec<Invocation>>,
    failing: Option<String>,
    outputs: Vec<(String, PathBuf)>,
}

impl MockRunner {
    pub fn new() -> Self {
        Self::default()
    }

    /// Make every invocation of `program` exit with status 1
    pub fn failing_on(mut self, program: impl Into<String>) -> Self {
        self.failing = Some(program.into());
        self
    }

    /// Create an empty file at `path` whenever `program` runs
    pub fn producing(mut self, program: impl Into<String>, path: impl Into<PathBuf>) -> Self {
        self.outputs.push((program.into(), path.into()));
        self
    }

    /// All recorded invocations, in order
    pub fn invocations(&self) -> Vec<Invocation> {
        self.invocations
            .lock()
            .map(|calls| calls.clone())
            .unwrap_or_default()
    }

    pub fn programs(&self) -> Vec<String> {
        self.invocations()
            .into_iter()
            .map(|invocation| invocation.program)
            .collect()
    }
}

impl CommandRunner for MockRunner {
    fn run(&self, invocation: &Invocation) -> Result<(), ToolFailure> {
        if let Ok(mut calls) = self.invocations.lock() {
            calls.push(invocation.clone());
        }

        if self.failing.as_deref() == Some(invocation.program.as_str()) {
            return Err(ToolFailure::Exit {
                command: invocation.to_string(),
                code: 1,
            });
        }

        for (program, path) in &self.outputs {
            if program == &invocation.program {
                if let Some(parent) = path.parent() {
                    let _ = fs::create_dir_all(parent);
                }
                let _ = fs::write(path, b"");
            }
        }

        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_records_invocations() {
        let runner = MockRunner::new();
        runner.run(&Invocation::new("pod").arg("install")).unwrap();
        runner.run(&Invocation::new("xcodebuild")).unwrap();
        assert_eq!(runner.programs(), vec!["pod", "xcodebuild"]);
    }

    #[test]
    fn test_failing_program() {
        let runner = MockRunner::new().failing_on("flutter");
        assert!(runner.run(&Invocation::new("flutter")).is_err());
        assert!(runner.run(&Invocation::new("pod")).is_ok());
        assert_eq!(runner.invocations().len(), 2);
    }

    #[test]
    fn test_producing_creates_file() {
        let dir = tempfile::tempdir().unwrap();
        let output = dir.path().join("out/app.ipa");
        let runner = MockRunner::new().producing("xcodebuild", &output);
        runner.run(&Invocation::new("xcodebuild")).unwrap();
        assert!(output.exists());
    }
}
