//! Credentials read from the process environment.
//!
//! Variable names come from the `[credentials]` section of the
//! configuration, so the same binary can serve projects with different
//! naming conventions.

use std::env;
use std::path::{Path, PathBuf};

use crate::config::CredentialNames;
use crate::error::{DeployError, Result};

/// App Store Connect API key
#[derive(Debug, Clone, PartialEq)]
pub struct AppStoreCredentials {
    pub key_id: String,
    pub issuer_id: String,
    /// Absolute or root-relative path to the `.p8` key file
    pub key_path: PathBuf,
}

impl AppStoreCredentials {
    /// Reads the key id, issuer id and key file name.
    ///
    /// The key file name is resolved inside `key_dir`. Every missing
    /// variable is reported at once.
    pub fn from_env(names: &CredentialNames, key_dir: &Path) -> Result<Self> {
        let required = [
            names.app_store_key_id.as_str(),
            names.app_store_issuer_id.as_str(),
            names.app_store_key_filename.as_str(),
        ];

        let missing: Vec<&str> = required
            .iter()
            .copied()
            .filter(|name| non_empty_var(name).is_none())
            .collect();

        if !missing.is_empty() {
            return Err(DeployError::auth(format!(
                "Missing required environment variables: {}",
                missing.join(", ")
            )));
        }

        let key_id = non_empty_var(&names.app_store_key_id).unwrap_or_default();
        let issuer_id = non_empty_var(&names.app_store_issuer_id).unwrap_or_default();
        let key_filename = non_empty_var(&names.app_store_key_filename).unwrap_or_default();

        Ok(AppStoreCredentials {
            key_id,
            issuer_id,
            key_path: key_dir.join(key_filename),
        })
    }

    /// Directory `altool` searches for `AuthKey_<id>.p8`
    pub fn key_dir(&self) -> &Path {
        self.key_path.parent().unwrap_or_else(|| Path::new("."))
    }
}

/// Path to a Google service account JSON key
pub fn google_key_file(names: &CredentialNames) -> Result<PathBuf> {
    non_empty_var(&names.json_key_file)
        .map(PathBuf::from)
        .ok_or_else(|| {
            DeployError::auth(format!(
                "Missing JSON key file: set {}",
                names.json_key_file
            ))
        })
}

/// Chat webhook URL, if configured
pub fn webhook_url(names: &CredentialNames) -> Option<String> {
    non_empty_var(&names.webhook_url)
}

fn non_empty_var(name: &str) -> Option<String> {
    env::var(name).ok().filter(|value| !value.trim().is_empty())
}

#[cfg(test)]
mod tests {
    use super::*;
    use serial_test::serial;

    fn names(prefix: &str) -> CredentialNames {
        CredentialNames {
            app_store_key_id: format!("{prefix}_KEY_ID"),
            app_store_issuer_id: format!("{prefix}_ISSUER_ID"),
            app_store_key_filename: format!("{prefix}_KEY_FILENAME"),
            webhook_url: format!("{prefix}_WEBHOOK"),
            json_key_file: format!("{prefix}_JSON_KEY"),
        }
    }

    #[test]
    #[serial]
    fn test_app_store_credentials_missing_all() {
        let names = names("MD_TEST_MISSING");
        let err = AppStoreCredentials::from_env(&names, Path::new("keys")).unwrap_err();
        let msg = err.to_string();
        assert!(matches!(err, DeployError::Auth(_)));
        assert!(msg.contains("MD_TEST_MISSING_KEY_ID"));
        assert!(msg.contains("MD_TEST_MISSING_ISSUER_ID"));
        assert!(msg.contains("MD_TEST_MISSING_KEY_FILENAME"));
    }

    #[test]
    #[serial]
    fn test_app_store_credentials_present() {
        let names = names("MD_TEST_PRESENT");
        env::set_var("MD_TEST_PRESENT_KEY_ID", "ABC123");
        env::set_var("MD_TEST_PRESENT_ISSUER_ID", "issuer-uuid");
        env::set_var("MD_TEST_PRESENT_KEY_FILENAME", "AuthKey_ABC123.p8");

        let creds = AppStoreCredentials::from_env(&names, Path::new("bin/keys")).unwrap();
        assert_eq!(creds.key_id, "ABC123");
        assert_eq!(creds.issuer_id, "issuer-uuid");
        assert_eq!(creds.key_path, PathBuf::from("bin/keys/AuthKey_ABC123.p8"));
        assert_eq!(creds.key_dir(), Path::new("bin/keys"));

        env::remove_var("MD_TEST_PRESENT_KEY_ID");
        env::remove_var("MD_TEST_PRESENT_ISSUER_ID");
        env::remove_var("MD_TEST_PRESENT_KEY_FILENAME");
    }

    #[test]
    #[serial]
    fn test_blank_value_counts_as_missing() {
        let names = names("MD_TEST_BLANK");
        env::set_var("MD_TEST_BLANK_JSON_KEY", "   ");
        assert!(matches!(google_key_file(&names), Err(DeployError::Auth(_))));
        env::remove_var("MD_TEST_BLANK_JSON_KEY");
    }

    #[test]
    #[serial]
    fn test_webhook_url_optional() {
        let names = names("MD_TEST_WEBHOOK");
        assert_eq!(webhook_url(&names), None);
        env::set_var("MD_TEST_WEBHOOK_WEBHOOK", "https://hooks.example.com/x");
        assert_eq!(
            webhook_url(&names).as_deref(),
            Some("https://hooks.example.com/x")
        );
        env::remove_var("MD_TEST_WEBHOOK_WEBHOOK");
    }
}
