use std::collections::HashMap;
use std::sync::Mutex;

use crate::error::{DeployError, Result};
use crate::git::Repository;

/// Mock repository for testing without actual git operations
#[derive(Default)]
pub struct MockRepository {
    dirty: Vec<String>,
    branch: Option<String>,
    fail_push: bool,
    tags: Mutex<HashMap<String, String>>,
    pushed: Mutex<Vec<(String, String)>>,
}

impl MockRepository {
    /// Create a clean repository on `main`
    pub fn new() -> Self {
        MockRepository {
            branch: Some("main".to_string()),
            ..Default::default()
        }
    }

    /// Mark paths as having uncommitted changes
    pub fn with_dirty_paths(mut self, paths: &[&str]) -> Self {
        self.dirty = paths.iter().map(|p| p.to_string()).collect();
        self
    }

    pub fn with_existing_tag(self, name: impl Into<String>, message: impl Into<String>) -> Self {
        if let Ok(mut tags) = self.tags.lock() {
            tags.insert(name.into(), message.into());
        }
        self
    }

    pub fn failing_push(mut self) -> Self {
        self.fail_push = true;
        self
    }

    /// Annotation message of a tag, if it exists
    pub fn tag_message(&self, name: &str) -> Option<String> {
        self.tags.lock().ok()?.get(name).cloned()
    }

    /// `(remote, tag)` pairs pushed so far
    pub fn pushed(&self) -> Vec<(String, String)> {
        self.pushed
            .lock()
            .map(|pushed| pushed.clone())
            .unwrap_or_default()
    }
}

impl Repository for MockRepository {
    fn dirty_paths(&self) -> Result<Vec<String>> {
        Ok(self.dirty.clone())
    }

    fn current_branch(&self) -> Result<Option<String>> {
        Ok(self.branch.clone())
    }

    fn find_tag(&self, tag_name: &str) -> Result<Option<String>> {
        Ok(self
            .tags
            .lock()
            .ok()
            .and_then(|tags| tags.get(tag_name).map(|_| "0".repeat(40))))
    }

    fn list_tags(&self) -> Result<Vec<String>> {
        Ok(self
            .tags
            .lock()
            .map(|tags| tags.keys().cloned().collect())
            .unwrap_or_default())
    }

    fn create_annotated_tag(&self, name: &str, message: &str, force: bool) -> Result<()> {
        let mut tags = self
            .tags
            .lock()
            .map_err(|_| DeployError::git("mock tag store poisoned"))?;

        if tags.contains_key(name) && !force {
            return Err(DeployError::git(format!("Tag '{}' already exists", name)));
        }

        tags.insert(name.to_string(), message.to_string());
        Ok(())
    }

    fn push_tags(&self, remote: &str, tag_names: &[&str], _force: bool) -> Result<()> {
        if self.fail_push {
            return Err(DeployError::git("Push failed: connection refused"));
        }

        let mut pushed = self
            .pushed
            .lock()
            .map_err(|_| DeployError::git("mock push log poisoned"))?;
        for tag in tag_names {
            pushed.push((remote.to_string(), tag.to_string()));
        }
        Ok(())
    }
}
