use crate::credentials::AppStoreCredentials;
use crate::domain::Artifact;
use crate::error::{DeployError, Result};
use crate::publish::{ensure_file, ArtifactPublisher};
use crate::tools::{CommandRunner, Invocation};

/// Uploads an IPA to TestFlight with `xcrun altool`.
///
/// altool looks up `AuthKey_<key id>.p8` in `API_PRIVATE_KEYS_DIR`. Build
/// processing on Apple's side is not awaited.
pub struct TestFlightPublisher<'a> {
    runner: &'a dyn CommandRunner,
    credentials: AppStoreCredentials,
}

impl<'a> TestFlightPublisher<'a> {
    pub fn new(runner: &'a dyn CommandRunner, credentials: AppStoreCredentials) -> Self {
        TestFlightPublisher {
            runner,
            credentials,
        }
    }
}

impl ArtifactPublisher for TestFlightPublisher<'_> {
    fn describe(&self) -> String {
        "TestFlight".to_string()
    }

    fn publish(&self, artifact: &Artifact) -> Result<()> {
        ensure_file(&artifact.path, "IPA")?;

        let invocation = Invocation::new("xcrun")
            .args(["altool", "--upload-app", "--type", "ios", "--file"])
            .path_arg(&artifact.path)
            .args(["--apiKey", self.credentials.key_id.as_str()])
            .args(["--apiIssuer", self.credentials.issuer_id.as_str()])
            .env(
                "API_PRIVATE_KEYS_DIR",
                self.credentials.key_dir().display().to_string(),
            );

        self.runner
            .run(&invocation)
            .map_err(|e| DeployError::upload(e.to_string()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::ArtifactKind;
    use crate::tools::MockRunner;
    use std::path::PathBuf;

    #[test]
    fn test_altool_invocation() {
        let file = tempfile::NamedTempFile::new().unwrap();
        let runner = MockRunner::new();
        let publisher = TestFlightPublisher::new(
            &runner,
            AppStoreCredentials {
                key_id: "KEY123".to_string(),
                issuer_id: "issuer-uuid".to_string(),
                key_path: PathBuf::from("/keys/AuthKey_KEY123.p8"),
            },
        );

        publisher
            .publish(&Artifact {
                kind: ArtifactKind::Ipa,
                path: file.path().to_path_buf(),
            })
            .unwrap();

        let call = &runner.invocations()[0];
        assert_eq!(call.program, "xcrun");
        assert_eq!(call.args[0], "altool");
        assert!(call.has_option("--apiKey", "KEY123"));
        assert!(call.has_option("--apiIssuer", "issuer-uuid"));
        assert!(call.has_option("--file", &file.path().display().to_string()));
        assert_eq!(
            call.env,
            vec![("API_PRIVATE_KEYS_DIR".to_string(), "/keys".to_string())]
        );
    }
}
