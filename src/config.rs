use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};

use crate::domain::BuildMode;
use crate::error::{DeployError, Result};

/// Default file name looked up in the working directory
pub const CONFIG_FILE_NAME: &str = "deploy.toml";

/// Represents the complete configuration for mobile-deploy.
///
/// Every section has defaults matching a stock Flutter project layout, so an
/// empty file (or no file at all) is a valid configuration.
#[derive(Debug, Deserialize, Serialize, Clone, Default)]
pub struct Config {
    #[serde(default)]
    pub project: ProjectConfig,

    #[serde(default)]
    pub git: GitConfig,

    #[serde(default)]
    pub android: AndroidConfig,

    #[serde(default)]
    pub ios: IosConfig,

    #[serde(default)]
    pub credentials: CredentialNames,

    #[serde(default)]
    pub remote: RemoteConfig,
}

fn default_root() -> PathBuf {
    PathBuf::from(".")
}

fn default_manifest() -> PathBuf {
    PathBuf::from("pubspec.yaml")
}

/// Location of the Flutter project
#[derive(Debug, Deserialize, Serialize, Clone, PartialEq)]
pub struct ProjectConfig {
    #[serde(default = "default_root")]
    pub root: PathBuf,

    /// Manifest path, relative to `root`
    #[serde(default = "default_manifest")]
    pub manifest: PathBuf,
}

impl Default for ProjectConfig {
    fn default() -> Self {
        ProjectConfig {
            root: default_root(),
            manifest: default_manifest(),
        }
    }
}

impl ProjectConfig {
    pub fn manifest_path(&self) -> PathBuf {
        self.root.join(&self.manifest)
    }
}

fn default_remote() -> String {
    "origin".to_string()
}

fn default_tag_group() -> String {
    "fastlane-builds".to_string()
}

#[derive(Debug, Deserialize, Serialize, Clone, PartialEq)]
pub struct GitConfig {
    #[serde(default = "default_remote")]
    pub remote: String,

    /// Leading path of release tags: `<tag_group>/<app>/<version>+<build>`
    #[serde(default = "default_tag_group")]
    pub tag_group: String,
}

impl Default for GitConfig {
    fn default() -> Self {
        GitConfig {
            remote: default_remote(),
            tag_group: default_tag_group(),
        }
    }
}

fn default_track() -> String {
    "internal".to_string()
}

fn default_firebase_groups() -> Vec<String> {
    vec!["Internal".to_string()]
}

#[derive(Debug, Deserialize, Serialize, Clone, PartialEq)]
pub struct AndroidConfig {
    #[serde(default = "default_track")]
    pub default_track: String,

    #[serde(default)]
    pub build_mode: BuildMode,

    #[serde(default = "default_firebase_groups")]
    pub firebase_groups: Vec<String>,
}

impl Default for AndroidConfig {
    fn default() -> Self {
        AndroidConfig {
            default_track: default_track(),
            build_mode: BuildMode::default(),
            firebase_groups: default_firebase_groups(),
        }
    }
}

fn default_workspace() -> String {
    "Runner.xcworkspace".to_string()
}

fn default_export_options() -> PathBuf {
    PathBuf::from("ios/ExportOptions.plist")
}

fn default_key_dir() -> PathBuf {
    PathBuf::from("bin/fastlane/store_keys")
}

fn default_upload_symbols() -> PathBuf {
    PathBuf::from("ios/Pods/FirebaseCrashlytics/upload-symbols")
}

/// iOS build and upload settings. Paths are relative to the project root.
#[derive(Debug, Deserialize, Serialize, Clone, PartialEq)]
pub struct IosConfig {
    /// Workspace inside the `ios/` directory
    #[serde(default = "default_workspace")]
    pub workspace: String,

    #[serde(default = "default_export_options")]
    pub export_options: PathBuf,

    /// Directory holding App Store Connect `.p8` keys
    #[serde(default = "default_key_dir")]
    pub key_dir: PathBuf,

    /// Crashlytics `upload-symbols` script
    #[serde(default = "default_upload_symbols")]
    pub upload_symbols: PathBuf,
}

impl Default for IosConfig {
    fn default() -> Self {
        IosConfig {
            workspace: default_workspace(),
            export_options: default_export_options(),
            key_dir: default_key_dir(),
            upload_symbols: default_upload_symbols(),
        }
    }
}

fn default_app_store_key_id() -> String {
    "APP_STORE_KEY_ID".to_string()
}

fn default_app_store_issuer_id() -> String {
    "APP_STORE_ISSUER_ID".to_string()
}

fn default_app_store_key_filename() -> String {
    "APP_STORE_KEY_FILENAME".to_string()
}

fn default_webhook_url() -> String {
    "SLACK_URL".to_string()
}

fn default_json_key_file() -> String {
    "JSON_KEY_FILE_PATH".to_string()
}

/// Names of the environment variables holding credentials
#[derive(Debug, Deserialize, Serialize, Clone, PartialEq)]
pub struct CredentialNames {
    #[serde(default = "default_app_store_key_id")]
    pub app_store_key_id: String,

    #[serde(default = "default_app_store_issuer_id")]
    pub app_store_issuer_id: String,

    #[serde(default = "default_app_store_key_filename")]
    pub app_store_key_filename: String,

    #[serde(default = "default_webhook_url")]
    pub webhook_url: String,

    #[serde(default = "default_json_key_file")]
    pub json_key_file: String,
}

impl Default for CredentialNames {
    fn default() -> Self {
        CredentialNames {
            app_store_key_id: default_app_store_key_id(),
            app_store_issuer_id: default_app_store_issuer_id(),
            app_store_key_filename: default_app_store_key_filename(),
            webhook_url: default_webhook_url(),
            json_key_file: default_json_key_file(),
        }
    }
}

fn default_timeout_secs() -> u64 {
    300
}

#[derive(Debug, Deserialize, Serialize, Clone, PartialEq)]
pub struct RemoteConfig {
    #[serde(default = "default_timeout_secs")]
    pub timeout_secs: u64,
}

impl Default for RemoteConfig {
    fn default() -> Self {
        RemoteConfig {
            timeout_secs: default_timeout_secs(),
        }
    }
}

/// Loads configuration from file or returns defaults.
///
/// Attempts to load configuration in the following order:
/// 1. Custom path provided as parameter
/// 2. `deploy.toml` in current directory
/// 3. `mobile-deploy/deploy.toml` in the user config directory
/// 4. Default configuration if no file found
///
/// # Returns
/// * `Ok(Config)` - Loaded or default configuration
/// * `Err` - If a file exists but cannot be read or parsed
pub fn load_config(config_path: Option<&str>) -> Result<Config> {
    let path = if let Some(path) = config_path {
        PathBuf::from(path)
    } else if Path::new(CONFIG_FILE_NAME).exists() {
        PathBuf::from(CONFIG_FILE_NAME)
    } else if let Some(config_dir) = dirs::config_dir() {
        let user_path = config_dir.join("mobile-deploy").join(CONFIG_FILE_NAME);
        if user_path.exists() {
            user_path
        } else {
            log::debug!("No configuration file found, using defaults");
            return Ok(Config::default());
        }
    } else {
        return Ok(Config::default());
    };

    let config_str = fs::read_to_string(&path).map_err(|e| {
        DeployError::config(format!("Cannot read {}: {}", path.display(), e))
    })?;

    let config: Config = toml::from_str(&config_str)
        .map_err(|e| DeployError::config(format!("Invalid {}: {}", path.display(), e)))?;

    log::debug!("Loaded configuration from {}", path.display());
    Ok(config)
}
