use serde::{Deserialize, Serialize};
use std::fmt;
use std::path::{Path, PathBuf};
use std::str::FromStr;

use crate::error::{DeployError, Result};

/// Flutter Android build output format
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum BuildMode {
    #[default]
    AppBundle,
    Apk,
}

impl BuildMode {
    /// Name of the `flutter build` subcommand
    pub fn as_str(&self) -> &'static str {
        match self {
            BuildMode::AppBundle => "appbundle",
            BuildMode::Apk => "apk",
        }
    }
}

impl fmt::Display for BuildMode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for BuildMode {
    type Err = DeployError;

    fn from_str(s: &str) -> Result<Self> {
        match s {
            "appbundle" => Ok(BuildMode::AppBundle),
            "apk" => Ok(BuildMode::Apk),
            other => Err(DeployError::validation(format!(
                "Unknown build mode '{}': expected 'appbundle' or 'apk'",
                other
            ))),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ArtifactKind {
    AppBundle,
    Apk,
    Ipa,
}

/// A build output at its conventional location, relative to the project root
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Artifact {
    pub kind: ArtifactKind,
    pub path: PathBuf,
}

impl Artifact {
    /// Output of `flutter build <mode> --flavor <flavor> --release`
    pub fn android(mode: BuildMode, flavor: &str) -> Self {
        match mode {
            BuildMode::AppBundle => Artifact {
                kind: ArtifactKind::AppBundle,
                path: PathBuf::from(format!(
                    "build/app/outputs/bundle/{flavor}Release/app-{flavor}-release.aab"
                )),
            },
            BuildMode::Apk => Artifact {
                kind: ArtifactKind::Apk,
                path: PathBuf::from(format!(
                    "build/app/outputs/apk/{flavor}/release/app-{flavor}-release.apk"
                )),
            },
        }
    }

    pub fn ios(app_name: &str) -> Self {
        Artifact {
            kind: ArtifactKind::Ipa,
            path: ios_output_dir().join(format!("{app_name}.ipa")),
        }
    }

    /// Resolve the artifact against a project root
    pub fn resolve(&self, root: &Path) -> Artifact {
        Artifact {
            kind: self.kind,
            path: root.join(&self.path),
        }
    }
}

/// Directory receiving iOS archives, IPAs and symbol archives
pub fn ios_output_dir() -> PathBuf {
    PathBuf::from("build/ios")
}

pub fn ios_archive_path(app_name: &str) -> PathBuf {
    ios_output_dir().join(format!("{app_name}.xcarchive"))
}

pub fn ios_symbols_path(app_name: &str) -> PathBuf {
    ios_output_dir().join(format!("{app_name}.app.dSYM.zip"))
}

/// Crashlytics configuration for a scheme
pub fn crashlytics_config_path(scheme: &str) -> PathBuf {
    PathBuf::from(format!("ios/flavors/{scheme}/GoogleService-Info.plist"))
}
