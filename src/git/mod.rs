//! Git operations abstraction layer
//!
//! This module provides a trait-based abstraction over the handful of git
//! operations a release needs: a clean-tree check, annotated tags and
//! pushing them.
//!
//! - [repository::Git2Repository]: A real implementation using the `git2` crate
//! - [mock::MockRepository]: A mock implementation for testing
//!
//! Code should depend on the [Repository] trait rather than concrete
//! implementations.

pub mod mock;
pub mod repository;

pub use mock::MockRepository;
pub use repository::Git2Repository;

use crate::error::Result;

/// Common git operation trait for abstraction
///
/// ## Error Handling
///
/// All methods return [crate::error::Result<T>]. Implementations map
/// underlying errors (like `git2::Error`) to [crate::error::DeployError::Git].
pub trait Repository {
    /// Paths with uncommitted changes, untracked files included
    ///
    /// # Returns
    /// * `Ok(vec![])` - The working tree is clean
    /// * `Ok(paths)` - Modified, staged or untracked paths
    fn dirty_paths(&self) -> Result<Vec<String>>;

    /// Short name of the checked out branch, `None` on a detached HEAD
    fn current_branch(&self) -> Result<Option<String>>;

    /// Find a tag by name and return the object it points to
    ///
    /// # Returns
    /// * `Ok(Some(id))` - Hex id of the tagged commit
    /// * `Ok(None)` - If the tag doesn't exist
    fn find_tag(&self, tag_name: &str) -> Result<Option<String>>;

    /// All tag names in the repository
    fn list_tags(&self) -> Result<Vec<String>>;

    /// Create an annotated tag on HEAD
    ///
    /// # Arguments
    /// * `name` - Tag name, may contain slashes
    /// * `message` - Annotation message
    /// * `force` - Replace an existing tag of the same name
    fn create_annotated_tag(&self, name: &str, message: &str, force: bool) -> Result<()>;

    /// Push tags to a remote
    ///
    /// # Arguments
    /// * `remote` - Name of the remote (e.g., "origin")
    /// * `tag_names` - Tags to push
    /// * `force` - Overwrite tags of the same name on the remote
    fn push_tags(&self, remote: &str, tag_names: &[&str], force: bool) -> Result<()>;
}
