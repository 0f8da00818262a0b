use regex::Regex;
use std::fmt;

use crate::domain::ReleaseVersion;
use crate::error::{DeployError, Result};

/// Release tag recorded in git after a successful deployment.
///
/// Rendered as `<group>/<app>/<version>+<build>`, for example
/// `fastlane-builds/acme/2.0.0+42`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ReleaseTag {
    pub group: String,
    pub app: String,
    pub version: String,
    pub build_number: u64,
}

impl ReleaseTag {
    pub fn new(group: impl Into<String>, app: impl Into<String>, release: &ReleaseVersion) -> Self {
        ReleaseTag {
            group: group.into(),
            app: app.into(),
            version: release.name.clone(),
            build_number: release.build_number,
        }
    }

    /// Full tag name
    pub fn name(&self) -> String {
        format!(
            "{}/{}/{}+{}",
            self.group, self.app, self.version, self.build_number
        )
    }

    /// Parse a tag name produced by [`ReleaseTag::name`].
    ///
    /// The group may itself contain slashes; the app is the second to last
    /// path segment.
    pub fn parse(tag: &str) -> Result<Self> {
        let re = Regex::new(r"^(.+)/([^/]+)/([^/+]+)\+(\d+)$")
            .map_err(|e| DeployError::git(format!("Invalid tag pattern: {}", e)))?;

        let captures = re.captures(tag).ok_or_else(|| {
            DeployError::git(format!(
                "Tag '{}' does not match <group>/<app>/<version>+<build>",
                tag
            ))
        })?;

        let build_number = captures[4]
            .parse::<u64>()
            .map_err(|_| DeployError::git(format!("Invalid build number in tag '{}'", tag)))?;

        Ok(ReleaseTag {
            group: captures[1].to_string(),
            app: captures[2].to_string(),
            version: captures[3].to_string(),
            build_number,
        })
    }

    /// Annotation message stored on the tag object
    pub fn message(&self) -> String {
        format!("{} (mobile-deploy)", self.name())
    }
}

impl fmt::Display for ReleaseTag {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.name())
    }
}
