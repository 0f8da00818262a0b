use std::path::PathBuf;

use crate::domain::Artifact;
use crate::error::{DeployError, Result};
use crate::publish::{ensure_file, ArtifactPublisher};
use crate::tools::{CommandRunner, Invocation};

/// Distributes an APK with the Firebase CLI
pub struct FirebasePublisher<'a> {
    runner: &'a dyn CommandRunner,
    app_id: String,
    groups: Vec<String>,
    /// Service account key handed to the CLI, if any
    key_file: Option<PathBuf>,
}

impl<'a> FirebasePublisher<'a> {
    pub fn new(
        runner: &'a dyn CommandRunner,
        app_id: impl Into<String>,
        groups: Vec<String>,
        key_file: Option<PathBuf>,
    ) -> Self {
        FirebasePublisher {
            runner,
            app_id: app_id.into(),
            groups,
            key_file,
        }
    }

    fn invocation(&self, artifact: &Artifact) -> Invocation {
        let mut invocation = Invocation::new("firebase")
            .arg("appdistribution:distribute")
            .path_arg(&artifact.path)
            .args(["--app", self.app_id.as_str()]);

        if !self.groups.is_empty() {
            invocation = invocation.arg("--groups").arg(self.groups.join(","));
        }

        if let Some(key_file) = &self.key_file {
            invocation = invocation.env(
                "GOOGLE_APPLICATION_CREDENTIALS",
                key_file.display().to_string(),
            );
        }

        invocation
    }
}

impl ArtifactPublisher for FirebasePublisher<'_> {
    fn describe(&self) -> String {
        format!("Firebase App Distribution ({})", self.groups.join(", "))
    }

    fn publish(&self, artifact: &Artifact) -> Result<()> {
        ensure_file(&artifact.path, "APK")?;

        self.runner
            .run(&self.invocation(artifact))
            .map_err(|e| DeployError::upload(e.to_string()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::ArtifactKind;
    use crate::tools::MockRunner;

    #[test]
    fn test_distribute_invocation() {
        let file = tempfile::NamedTempFile::new().unwrap();
        let runner = MockRunner::new();
        let publisher = FirebasePublisher::new(
            &runner,
            "1:123:android:abc",
            vec!["Internal".to_string(), "QA".to_string()],
            Some(PathBuf::from("/keys/sa.json")),
        );

        publisher
            .publish(&Artifact {
                kind: ArtifactKind::Apk,
                path: file.path().to_path_buf(),
            })
            .unwrap();

        let call = &runner.invocations()[0];
        assert_eq!(call.program, "firebase");
        assert_eq!(call.args[0], "appdistribution:distribute");
        assert!(call.has_option("--app", "1:123:android:abc"));
        assert!(call.has_option("--groups", "Internal,QA"));
        assert_eq!(
            call.env,
            vec![(
                "GOOGLE_APPLICATION_CREDENTIALS".to_string(),
                "/keys/sa.json".to_string()
            )]
        );
    }

    #[test]
    fn test_missing_apk_is_upload_error() {
        let runner = MockRunner::new();
        let publisher = FirebasePublisher::new(&runner, "1:123:android:abc", vec![], None);

        let err = publisher
            .publish(&Artifact {
                kind: ArtifactKind::Apk,
                path: PathBuf::from("/nonexistent/app.apk"),
            })
            .unwrap_err();

        assert!(matches!(err, DeployError::Upload(_)));
        assert!(runner.invocations().is_empty());
    }

    #[test]
    fn test_cli_failure_is_upload_error() {
        let file = tempfile::NamedTempFile::new().unwrap();
        let runner = MockRunner::new().failing_on("firebase");
        let publisher = FirebasePublisher::new(&runner, "1:123:android:abc", vec![], None);

        let err = publisher
            .publish(&Artifact {
                kind: ArtifactKind::Apk,
                path: file.path().to_path_buf(),
            })
            .unwrap_err();
        assert!(matches!(err, DeployError::Upload(_)));
    }
}
