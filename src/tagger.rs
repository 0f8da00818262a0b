use crate::domain::{ReleaseTag, ReleaseVersion};
use crate::error::{DeployError, Result};
use crate::git::Repository;

/// How many dirty paths to name in the error message
const DIRTY_PATHS_SHOWN: usize = 5;

/// Records a deployed release as an annotated git tag
pub struct ReleaseTagger<'a> {
    repo: &'a dyn Repository,
    group: String,
    remote: String,
}

impl<'a> ReleaseTagger<'a> {
    pub fn new(repo: &'a dyn Repository, group: impl Into<String>, remote: impl Into<String>) -> Self {
        ReleaseTagger {
            repo,
            group: group.into(),
            remote: remote.into(),
        }
    }

    /// Fail when the working tree has uncommitted or untracked changes
    pub fn ensure_clean(&self) -> Result<()> {
        let dirty = self.repo.dirty_paths()?;
        if dirty.is_empty() {
            return Ok(());
        }

        let mut listed = dirty
            .iter()
            .take(DIRTY_PATHS_SHOWN)
            .cloned()
            .collect::<Vec<_>>()
            .join(", ");
        if dirty.len() > DIRTY_PATHS_SHOWN {
            listed.push_str(&format!(" and {} more", dirty.len() - DIRTY_PATHS_SHOWN));
        }

        Err(DeployError::dirty_tree(format!(
            "{} uncommitted path(s): {}",
            dirty.len(),
            listed
        )))
    }

    /// Tag HEAD as `<group>/<app>/<version>+<build>` and push the tag.
    ///
    /// An existing tag of the same name is replaced locally and on the
    /// remote. Nothing is created when the tree is dirty.
    pub fn tag_release(&self, app_name: &str, version: &ReleaseVersion) -> Result<ReleaseTag> {
        if app_name.trim().is_empty() {
            return Err(DeployError::validation("Missing app_name"));
        }

        self.ensure_clean()?;

        let tag = ReleaseTag::new(self.group.as_str(), app_name, version);
        let name = tag.name();

        if self.repo.find_tag(&name)?.is_some() {
            log::warn!("Tag {} already exists and will be replaced", name);
        }

        self.repo.create_annotated_tag(&name, &tag.message(), true)?;
        log::info!("Created tag {}", name);

        self.repo.push_tags(&self.remote, &[name.as_str()], true)?;
        log::info!("Pushed tag {} to {}", name, self.remote);

        Ok(tag)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::git::MockRepository;

    #[test]
    fn test_tag_release() {
        let repo = MockRepository::new();
        let tagger = ReleaseTagger::new(&repo, "fastlane-builds", "origin");

        let tag = tagger
            .tag_release("acme", &ReleaseVersion::new("2.0.0", 42))
            .unwrap();

        assert_eq!(tag.name(), "fastlane-builds/acme/2.0.0+42");
        assert_eq!(
            repo.tag_message("fastlane-builds/acme/2.0.0+42"),
            Some("fastlane-builds/acme/2.0.0+42 (mobile-deploy)".to_string())
        );
        assert_eq!(
            repo.pushed(),
            vec![(
                "origin".to_string(),
                "fastlane-builds/acme/2.0.0+42".to_string()
            )]
        );
    }

    #[test]
    fn test_dirty_tree_blocks_tagging() {
        let repo = MockRepository::new().with_dirty_paths(&["pubspec.yaml", "lib/main.dart"]);
        let tagger = ReleaseTagger::new(&repo, "fastlane-builds", "origin");

        let err = tagger
            .tag_release("acme", &ReleaseVersion::new("1.0.0", 1))
            .unwrap_err();

        assert!(matches!(err, DeployError::DirtyTree(_)));
        assert!(err.to_string().contains("pubspec.yaml"));
        assert!(repo.list_tags().unwrap().is_empty());
        assert!(repo.pushed().is_empty());
    }

    #[test]
    fn test_dirty_tree_message_is_bounded() {
        let paths: Vec<String> = (0..8).map(|i| format!("file{}.txt", i)).collect();
        let refs: Vec<&str> = paths.iter().map(String::as_str).collect();
        let repo = MockRepository::new().with_dirty_paths(&refs);
        let tagger = ReleaseTagger::new(&repo, "g", "origin");

        let msg = tagger.ensure_clean().unwrap_err().to_string();
        assert!(msg.contains("8 uncommitted"));
        assert!(msg.contains("and 3 more"));
        assert!(!msg.contains("file7.txt"));
    }

    #[test]
    fn test_existing_tag_is_replaced() {
        let repo = MockRepository::new().with_existing_tag("g/acme/1.0.0+3", "stale");
        let tagger = ReleaseTagger::new(&repo, "g", "origin");

        tagger
            .tag_release("acme", &ReleaseVersion::new("1.0.0", 3))
            .unwrap();

        assert_eq!(
            repo.tag_message("g/acme/1.0.0+3"),
            Some("g/acme/1.0.0+3 (mobile-deploy)".to_string())
        );
    }

    #[test]
    fn test_push_failure_is_git_error() {
        let repo = MockRepository::new().failing_push();
        let tagger = ReleaseTagger::new(&repo, "g", "origin");

        let err = tagger
            .tag_release("acme", &ReleaseVersion::new("1.0.0", 3))
            .unwrap_err();
        assert!(matches!(err, DeployError::Git(_)));
    }
}
