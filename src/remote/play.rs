use reqwest::blocking::{Client, RequestBuilder};
use reqwest::header::CONTENT_TYPE;
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::Path;

use crate::domain::ArtifactKind;
use crate::error::{DeployError, Result};
use crate::remote::{check_status, read_json, send_error};

const API_BASE: &str = "https://androidpublisher.googleapis.com/androidpublisher/v3/applications";
const UPLOAD_BASE: &str =
    "https://androidpublisher.googleapis.com/upload/androidpublisher/v3/applications";

#[derive(Debug, Deserialize)]
struct Edit {
    id: String,
}

/// A track as returned and accepted by the edits API
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct Track {
    #[serde(default)]
    pub track: String,
    #[serde(default)]
    pub releases: Vec<TrackRelease>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct TrackRelease {
    /// int64 values are serialized as strings by the API
    #[serde(default)]
    pub version_codes: Vec<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub status: Option<String>,
}

impl Track {
    /// Highest version code across every release of the track
    pub fn max_version_code(&self) -> Result<Option<u64>> {
        let mut max = None;
        for code in self.releases.iter().flat_map(|r| r.version_codes.iter()) {
            let code = code.parse::<u64>().map_err(|_| {
                DeployError::remote(format!(
                    "Track '{}' lists a non-numeric version code '{}'",
                    self.track, code
                ))
            })?;
            max = max.max(Some(code));
        }
        Ok(max)
    }
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct UploadedBinary {
    version_code: u64,
}

/// Google Play Developer API edit session for one package
pub struct PlayEdits<'a> {
    client: &'a Client,
    token: String,
    package: String,
}

impl<'a> PlayEdits<'a> {
    pub fn new(client: &'a Client, token: String, package: impl Into<String>) -> Self {
        PlayEdits {
            client,
            token,
            package: package.into(),
        }
    }

    fn edits_url(&self) -> String {
        format!("{}/{}/edits", API_BASE, self.package)
    }

    fn insert_request(&self) -> RequestBuilder {
        self.client
            .post(self.edits_url())
            .bearer_auth(&self.token)
            .json(&serde_json::json!({}))
    }

    fn track_request(&self, edit_id: &str, track: &str) -> RequestBuilder {
        self.client
            .get(format!("{}/{}/tracks/{}", self.edits_url(), edit_id, track))
            .bearer_auth(&self.token)
    }

    fn upload_request(
        &self,
        edit_id: &str,
        kind: ArtifactKind,
        bytes: Vec<u8>,
    ) -> Result<RequestBuilder> {
        let endpoint = match kind {
            ArtifactKind::AppBundle => "bundles",
            ArtifactKind::Apk => "apks",
            ArtifactKind::Ipa => {
                return Err(DeployError::upload("Google Play does not accept IPA files"))
            }
        };

        Ok(self
            .client
            .post(format!(
                "{}/{}/edits/{}/{}",
                UPLOAD_BASE, self.package, edit_id, endpoint
            ))
            .query(&[("uploadType", "media")])
            .bearer_auth(&self.token)
            .header(CONTENT_TYPE, "application/octet-stream")
            .body(bytes))
    }

    fn assign_request(&self, edit_id: &str, track: &str, version_code: u64) -> RequestBuilder {
        let body = Track {
            track: track.to_string(),
            releases: vec![TrackRelease {
                version_codes: vec![version_code.to_string()],
                status: Some("completed".to_string()),
            }],
        };

        self.client
            .put(format!("{}/{}/tracks/{}", self.edits_url(), edit_id, track))
            .bearer_auth(&self.token)
            .json(&body)
    }

    fn commit_request(&self, edit_id: &str) -> RequestBuilder {
        self.client
            .post(format!("{}/{}:commit", self.edits_url(), edit_id))
            .bearer_auth(&self.token)
    }

    pub fn insert(&self) -> Result<String> {
        let context = "Play edit insert";
        let response = self
            .insert_request()
            .send()
            .map_err(|e| send_error(context, e))?;
        let edit: Edit = read_json(response, context)?;
        log::debug!("Opened Play edit {} for {}", edit.id, self.package);
        Ok(edit.id)
    }

    pub fn track(&self, edit_id: &str, track: &str) -> Result<Track> {
        let context = "Play track lookup";
        let response = self
            .track_request(edit_id, track)
            .send()
            .map_err(|e| send_error(context, e))?;
        read_json(response, context)
    }

    /// Upload an app bundle or APK and return its version code
    pub fn upload(&self, edit_id: &str, kind: ArtifactKind, path: &Path) -> Result<u64> {
        if kind == ArtifactKind::Ipa {
            return Err(DeployError::upload("Google Play does not accept IPA files"));
        }

        let bytes = fs::read(path).map_err(|e| {
            DeployError::upload(format!("Cannot read artifact {}: {}", path.display(), e))
        })?;

        let context = "Play artifact upload";
        let response = self
            .upload_request(edit_id, kind, bytes)?
            .send()
            .map_err(|e| send_error(context, e))?;

        let uploaded: UploadedBinary = read_json(response, context)?;
        Ok(uploaded.version_code)
    }

    /// Replace the track's releases with a single completed release
    pub fn assign(&self, edit_id: &str, track: &str, version_code: u64) -> Result<()> {
        let context = "Play track update";
        let response = self
            .assign_request(edit_id, track, version_code)
            .send()
            .map_err(|e| send_error(context, e))?;
        check_status(response, context)?;
        Ok(())
    }

    pub fn commit(&self, edit_id: &str) -> Result<()> {
        let context = "Play edit commit";
        let response = self
            .commit_request(edit_id)
            .send()
            .map_err(|e| send_error(context, e))?;
        check_status(response, context)?;
        Ok(())
    }

    /// Discard an edit; failures are only logged since nothing was changed
    pub fn discard(&self, edit_id: &str) {
        let result = self
            .client
            .delete(format!("{}/{}", self.edits_url(), edit_id))
            .bearer_auth(&self.token)
            .send();

        if let Err(e) = result {
            log::debug!("Could not discard Play edit {}: {}", edit_id, e.without_url());
        }
    }
}
