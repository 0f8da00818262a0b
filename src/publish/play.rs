use reqwest::blocking::Client;

use crate::domain::Artifact;
use crate::error::{DeployError, Result};
use crate::publish::{ensure_file, ArtifactPublisher};
use crate::remote::{GoogleAuth, PlayEdits};

/// Uploads to a Google Play track through a single edit
pub struct PlayStorePublisher {
    client: Client,
    auth: GoogleAuth,
    package: String,
    track: String,
}

impl PlayStorePublisher {
    pub fn new(
        client: Client,
        auth: GoogleAuth,
        package: impl Into<String>,
        track: impl Into<String>,
    ) -> Self {
        PlayStorePublisher {
            client,
            auth,
            package: package.into(),
            track: track.into(),
        }
    }
}

impl ArtifactPublisher for PlayStorePublisher {
    fn describe(&self) -> String {
        format!("Google Play ({} track)", self.track)
    }

    fn publish(&self, artifact: &Artifact) -> Result<()> {
        ensure_file(&artifact.path, "Artifact")?;

        let token = self
            .auth
            .access_token(&self.client)
            .map_err(|e| DeployError::upload(e.to_string()))?;
        let edits = PlayEdits::new(&self.client, token, self.package.as_str());

        let upload = || -> Result<u64> {
            let edit_id = edits.insert()?;
            let result = edits
                .upload(&edit_id, artifact.kind, &artifact.path)
                .and_then(|code| {
                    log::info!("Uploaded version code {} to {}", code, self.package);
                    edits.assign(&edit_id, &self.track, code)?;
                    edits.commit(&edit_id)?;
                    Ok(code)
                });

            if result.is_err() {
                edits.discard(&edit_id);
            }
            result
        };

        upload().map_err(|e| match e {
            DeployError::Upload(_) => e,
            other => DeployError::upload(other.to_string()),
        })?;

        Ok(())
    }
}
