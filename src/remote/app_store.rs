use jsonwebtoken::{encode, Algorithm, EncodingKey, Header};
use serde::Serialize;
use std::fs;

use crate::credentials::AppStoreCredentials;
use crate::error::{DeployError, Result};

pub const API_BASE: &str = "https://api.appstoreconnect.apple.com/v1";

/// Token lifetime in seconds; App Store Connect rejects anything over 20 minutes
const TOKEN_TTL_SECS: i64 = 1200;

#[derive(Debug, Serialize)]
struct Claims<'a> {
    iss: &'a str,
    iat: i64,
    exp: i64,
    aud: &'a str,
}

/// Bearer token for the App Store Connect API
pub struct AppStoreToken;

impl AppStoreToken {
    /// Sign an ES256 token with the `.p8` key
    pub fn mint(credentials: &AppStoreCredentials) -> Result<String> {
        let pem = fs::read(&credentials.key_path).map_err(|e| {
            DeployError::auth(format!(
                "Cannot read App Store Connect key {}: {}",
                credentials.key_path.display(),
                e
            ))
        })?;

        Self::mint_with_pem(credentials, &pem)
    }

    pub fn mint_with_pem(credentials: &AppStoreCredentials, pem: &[u8]) -> Result<String> {
        let key = EncodingKey::from_ec_pem(pem)
            .map_err(|e| DeployError::auth(format!("Invalid App Store Connect key: {}", e)))?;

        let mut header = Header::new(Algorithm::ES256);
        header.kid = Some(credentials.key_id.clone());

        let now = chrono::Utc::now().timestamp();
        let claims = Claims {
            iss: &credentials.issuer_id,
            iat: now,
            exp: now + TOKEN_TTL_SECS,
            aud: "appstoreconnect-v1",
        };

        encode(&header, &claims, &key)
            .map_err(|e| DeployError::auth(format!("Cannot sign App Store Connect token: {}", e)))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::path::PathBuf;

    fn credentials(path: &str) -> AppStoreCredentials {
        AppStoreCredentials {
            key_id: "ABC123".to_string(),
            issuer_id: "issuer".to_string(),
            key_path: PathBuf::from(path),
        }
    }

    #[test]
    fn test_missing_key_file_is_auth_error() {
        let err = AppStoreToken::mint(&credentials("/nonexistent/AuthKey.p8")).unwrap_err();
        assert!(matches!(err, DeployError::Auth(_)));
        assert!(err.to_string().contains("/nonexistent/AuthKey.p8"));
    }

    #[test]
    fn test_invalid_pem_is_auth_error() {
        let err = AppStoreToken::mint_with_pem(&credentials("k.p8"), b"garbage").unwrap_err();
        assert!(matches!(err, DeployError::Auth(_)));
    }
}
