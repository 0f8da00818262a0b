use reqwest::blocking::{Client, RequestBuilder};
use serde::Deserialize;

use crate::build_number::BuildNumberSource;
use crate::credentials::AppStoreCredentials;
use crate::error::{DeployError, Result};
use crate::remote::app_store::API_BASE;
use crate::remote::{read_json, send_error, AppStoreToken};

#[derive(Debug, Deserialize)]
struct Collection<T> {
    #[serde(default = "Vec::new")]
    data: Vec<T>,
}

#[derive(Debug, Deserialize)]
struct AppResource {
    id: String,
}

#[derive(Debug, Deserialize)]
struct BuildResource {
    attributes: BuildAttributes,
}

#[derive(Debug, Deserialize)]
struct BuildAttributes {
    version: String,
}

/// Highest TestFlight build uploaded for a marketing version
pub struct TestFlightSource {
    client: Client,
    credentials: AppStoreCredentials,
}

impl TestFlightSource {
    pub fn new(client: Client, credentials: AppStoreCredentials) -> Self {
        TestFlightSource {
            client,
            credentials,
        }
    }

    fn app_id(&self, token: &str, bundle_id: &str) -> Result<String> {
        let context = "App Store Connect app lookup";
        let response = Self::app_request(&self.client, token, bundle_id)
            .send()
            .map_err(|e| send_error(context, e))?;

        let apps: Collection<AppResource> = read_json(response, context)?;
        apps.data
            .into_iter()
            .next()
            .map(|app| app.id)
            .ok_or_else(|| {
                DeployError::remote(format!("No App Store Connect app with bundle id '{}'", bundle_id))
            })
    }

    fn app_request(client: &Client, token: &str, bundle_id: &str) -> RequestBuilder {
        client
            .get(format!("{}/apps", API_BASE))
            .query(&[("filter[bundleId]", bundle_id), ("limit", "1")])
            .bearer_auth(token)
    }

    /// Newest uploads first, so the page holds the highest numbers
    fn builds_request(
        client: &Client,
        token: &str,
        app_id: &str,
        version_name: &str,
    ) -> RequestBuilder {
        client
            .get(format!("{}/builds", API_BASE))
            .query(&[
                ("filter[app]", app_id),
                ("filter[preReleaseVersion.version]", version_name),
                ("fields[builds]", "version"),
                ("sort", "-uploadedDate"),
                ("limit", "200"),
            ])
            .bearer_auth(token)
    }

    fn max_build(builds: Collection<BuildResource>) -> Result<Option<u64>> {
        let mut max = None;
        for build in builds.data {
            // Build versions may be dotted ("42.1"); the leading component counts
            let leading = build.attributes.version.split('.').next().unwrap_or_default();
            let number = leading.parse::<u64>().map_err(|_| {
                DeployError::remote(format!(
                    "Unexpected build version '{}'",
                    build.attributes.version
                ))
            })?;
            max = max.max(Some(number));
        }
        Ok(max)
    }
}

impl BuildNumberSource for TestFlightSource {
    fn describe(&self) -> String {
        "TestFlight".to_string()
    }

    fn latest_build_number(&self, identifier: &str, version_name: &str) -> Result<Option<u64>> {
        let token = AppStoreToken::mint(&self.credentials)?;
        let app_id = self.app_id(&token, identifier)?;

        let context = "App Store Connect build lookup";
        let response = Self::builds_request(&self.client, &token, &app_id, version_name)
            .send()
            .map_err(|e| send_error(context, e))?;

        Self::max_build(read_json(response, context)?)
    }
}
