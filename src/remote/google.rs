use jsonwebtoken::{encode, Algorithm, EncodingKey, Header};
use reqwest::blocking::{Client, RequestBuilder};
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::Path;

use crate::error::{DeployError, Result};
use crate::remote::send_error;

pub const ANDROID_PUBLISHER_SCOPE: &str = "https://www.googleapis.com/auth/androidpublisher";
pub const CLOUD_PLATFORM_SCOPE: &str = "https://www.googleapis.com/auth/cloud-platform";

const DEFAULT_TOKEN_URI: &str = "https://oauth2.googleapis.com/token";

fn default_token_uri() -> String {
    DEFAULT_TOKEN_URI.to_string()
}

/// Fields of a service account JSON key used for token exchange
#[derive(Debug, Clone, Deserialize)]
pub struct ServiceAccountKey {
    pub client_email: String,
    pub private_key: String,
    #[serde(default = "default_token_uri")]
    pub token_uri: String,
}

#[derive(Debug, Serialize)]
struct Claims<'a> {
    iss: &'a str,
    scope: &'a str,
    aud: &'a str,
    iat: i64,
    exp: i64,
}

#[derive(Debug, Deserialize)]
struct TokenResponse {
    access_token: String,
}

/// OAuth2 service account flow (JWT bearer grant)
#[derive(Debug, Clone)]
pub struct GoogleAuth {
    key: ServiceAccountKey,
    scope: String,
}

impl GoogleAuth {
    pub fn from_key_file(path: &Path, scope: &str) -> Result<Self> {
        let contents = fs::read_to_string(path).map_err(|e| {
            DeployError::auth(format!("Cannot read JSON key file {}: {}", path.display(), e))
        })?;
        let key = Self::parse_key(&contents)?;
        log::debug!("Using service account {}", key.client_email);

        Ok(GoogleAuth {
            key,
            scope: scope.to_string(),
        })
    }

    pub fn parse_key(contents: &str) -> Result<ServiceAccountKey> {
        serde_json::from_str(contents)
            .map_err(|e| DeployError::auth(format!("Invalid service account key: {}", e)))
    }

    /// Signed assertion exchanged for an access token
    fn assertion(&self) -> Result<String> {
        let now = chrono::Utc::now().timestamp();
        let claims = Claims {
            iss: &self.key.client_email,
            scope: &self.scope,
            aud: &self.key.token_uri,
            iat: now,
            exp: now + 3600,
        };

        let key = EncodingKey::from_rsa_pem(self.key.private_key.as_bytes())
            .map_err(|e| DeployError::auth(format!("Invalid service account private key: {}", e)))?;

        encode(&Header::new(Algorithm::RS256), &claims, &key)
            .map_err(|e| DeployError::auth(format!("Cannot sign token request: {}", e)))
    }

    fn token_request(&self, client: &Client, assertion: &str) -> RequestBuilder {
        client.post(&self.key.token_uri).form(&[
            ("grant_type", "urn:ietf:params:oauth:grant-type:jwt-bearer"),
            ("assertion", assertion),
        ])
    }

    pub fn access_token(&self, client: &Client) -> Result<String> {
        let assertion = self.assertion()?;
        let response = self
            .token_request(client, &assertion)
            .send()
            .map_err(|e| send_error("Google token exchange", e))?;

        if !response.status().is_success() {
            let status = response.status();
            let body = response.text().unwrap_or_default();
            return Err(DeployError::auth(format!(
                "Google token exchange rejected ({}): {}",
                status,
                body.trim()
            )));
        }

        let token: TokenResponse = response
            .json()
            .map_err(|e| DeployError::auth(format!("Unexpected token response: {}", e.without_url())))?;
        Ok(token.access_token)
    }
}
