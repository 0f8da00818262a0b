use reqwest::blocking::{Client, RequestBuilder};
use serde::Deserialize;

use crate::build_number::BuildNumberSource;
use crate::error::{DeployError, Result};
use crate::remote::{read_json, send_error, GoogleAuth};

const API_BASE: &str = "https://firebaseappdistribution.googleapis.com/v1";

#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
struct ReleaseList {
    #[serde(default)]
    releases: Vec<DistributedRelease>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct DistributedRelease {
    #[serde(default)]
    build_version: Option<String>,
}

/// Project number embedded in a Firebase app id (`1:<number>:android:<hash>`)
pub fn project_number(app_id: &str) -> Result<&str> {
    let parts: Vec<&str> = app_id.split(':').collect();
    match parts.as_slice() {
        [_, number, _, _] if !number.is_empty() && number.chars().all(|c| c.is_ascii_digit()) => {
            Ok(*number)
        }
        _ => Err(DeployError::validation(format!(
            "Firebase app id '{}' is not of the form 1:<project>:<platform>:<hash>",
            app_id
        ))),
    }
}

/// Build version of the newest Firebase App Distribution release
pub struct FirebaseReleaseSource {
    client: Client,
    auth: GoogleAuth,
}

impl FirebaseReleaseSource {
    pub fn new(client: Client, auth: GoogleAuth) -> Self {
        FirebaseReleaseSource { client, auth }
    }

    fn parse_latest(list: ReleaseList) -> Result<Option<u64>> {
        let Some(release) = list.releases.into_iter().next() else {
            return Ok(None);
        };

        let build = release.build_version.unwrap_or_default();
        build.trim().parse::<u64>().map(Some).map_err(|_| {
            DeployError::remote(format!(
                "Latest Firebase release has a non-numeric build version '{}'",
                build
            ))
        })
    }
}

impl BuildNumberSource for FirebaseReleaseSource {
    fn describe(&self) -> String {
        "Firebase App Distribution".to_string()
    }

    fn latest_build_number(&self, identifier: &str, _version_name: &str) -> Result<Option<u64>> {
        project_number(identifier)?;
        let token = self.auth.access_token(&self.client)?;

        let context = "Firebase release lookup";
        let response = releases_request(&self.client, &token, identifier)?
            .send()
            .map_err(|e| send_error(context, e))?;

        Self::parse_latest(read_json(response, context)?)
    }
}

/// Newest release of `app_id`; the API lists by create time, newest first
fn releases_request(client: &Client, token: &str, app_id: &str) -> Result<RequestBuilder> {
    let project = project_number(app_id)?;
    Ok(client
        .get(format!(
            "{}/projects/{}/apps/{}/releases",
            API_BASE, project, app_id
        ))
        .query(&[("pageSize", "1")])
        .bearer_auth(token))
}
