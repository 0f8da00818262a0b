use git2::{
    Config, Cred, CredentialType, ErrorCode, ObjectType, PushOptions, RemoteCallbacks,
    Repository as Git2Repo, StatusOptions,
};
use std::cell::RefCell;
use std::path::Path;

use crate::error::{DeployError, Result};

/// Wrapper around git2::Repository with our trait interface
pub struct Git2Repository {
    repo: Git2Repo,
}

impl Git2Repository {
    /// Open or discover a git repository
    pub fn open<P: AsRef<Path>>(path: P) -> Result<Self> {
        let repo = Git2Repo::discover(path.as_ref()).map_err(|e| {
            DeployError::git(format!(
                "Not in a git repository ({}): {}",
                path.as_ref().display(),
                e.message()
            ))
        })?;

        Ok(Git2Repository { repo })
    }

    /// Credentials for push: SSH key files, then the agent, then the
    /// configured git credential helper for HTTPS remotes
    fn credentials_callbacks<'a>(config: Config) -> RemoteCallbacks<'a> {
        let mut helper_tried = false;
        let mut callbacks = RemoteCallbacks::new();
        callbacks.credentials(move |url, username_from_url, allowed_types| {
            let username = username_from_url.unwrap_or("git");

            if allowed_types.contains(CredentialType::SSH_KEY) {
                if let Some(home) = dirs::home_dir() {
                    for name in ["id_ed25519", "id_rsa", "id_ecdsa"] {
                        let key = home.join(".ssh").join(name);
                        if key.exists() {
                            if let Ok(cred) = Cred::ssh_key(username, None, &key, None) {
                                return Ok(cred);
                            }
                        }
                    }
                }

                if let Ok(cred) = Cred::ssh_key_from_agent(username) {
                    return Ok(cred);
                }
            }

            // libgit2 calls back again after a rejected login; ask the helper once
            if allowed_types.contains(CredentialType::USER_PASS_PLAINTEXT) && !helper_tried {
                helper_tried = true;
                match helper_credentials(&config, url, username_from_url) {
                    Ok(cred) => return Ok(cred),
                    Err(e) => log::debug!("No credential helper entry for {}: {}", url, e.message()),
                }
            }

            Cred::default()
        });
        callbacks
    }
}

/// Username and password from `credential.helper`, as `git push` would use
fn helper_credentials(
    config: &Config,
    url: &str,
    username: Option<&str>,
) -> std::result::Result<Cred, git2::Error> {
    Cred::credential_helper(config, url, username)
}

impl super::Repository for Git2Repository {
    fn dirty_paths(&self) -> Result<Vec<String>> {
        let mut options = StatusOptions::new();
        options
            .include_untracked(true)
            .recurse_untracked_dirs(true)
            .include_ignored(false);

        let statuses = self.repo.statuses(Some(&mut options))?;

        Ok(statuses
            .iter()
            .filter(|entry| !entry.status().is_ignored())
            .map(|entry| entry.path().unwrap_or("(non-utf8 path)").to_string())
            .collect())
    }

    fn current_branch(&self) -> Result<Option<String>> {
        let head = match self.repo.head() {
            Ok(head) => head,
            Err(e) if e.code() == ErrorCode::UnbornBranch => return Ok(None),
            Err(e) => return Err(e.into()),
        };

        if !head.is_branch() {
            return Ok(None);
        }

        Ok(head.shorthand().map(str::to_string))
    }

    fn find_tag(&self, tag_name: &str) -> Result<Option<String>> {
        let reference_name = format!("refs/tags/{}", tag_name);

        match self.repo.find_reference(&reference_name) {
            Ok(reference) => {
                let commit = reference
                    .peel(ObjectType::Commit)
                    .map_err(|e| DeployError::git(format!("Cannot peel tag: {}", e)))?;

                Ok(Some(commit.id().to_string()))
            }
            Err(e) if e.code() == ErrorCode::NotFound => Ok(None),
            Err(e) => Err(DeployError::git(format!(
                "Cannot find tag '{}': {}",
                tag_name, e
            ))),
        }
    }

    fn list_tags(&self) -> Result<Vec<String>> {
        let tags = self.repo.tag_names(None)?;

        Ok(tags.iter().flatten().map(|s| s.to_string()).collect())
    }

    fn create_annotated_tag(&self, name: &str, message: &str, force: bool) -> Result<()> {
        let head = self
            .repo
            .head()
            .and_then(|head| head.peel(ObjectType::Commit))
            .map_err(|e| DeployError::git(format!("Cannot resolve HEAD: {}", e)))?;

        let signature = self
            .repo
            .signature()
            .map_err(|e| DeployError::git(format!("No git identity configured: {}", e)))?;

        self.repo
            .tag(name, &head, &signature, message, force)
            .map_err(|e| DeployError::git(format!("Cannot create tag '{}': {}", name, e)))?;

        Ok(())
    }

    fn push_tags(&self, remote: &str, tag_names: &[&str], force: bool) -> Result<()> {
        let mut remote = self
            .repo
            .find_remote(remote)
            .map_err(|e| DeployError::git(format!("Cannot find remote: {}", e)))?;

        let prefix = if force { "+" } else { "" };
        let refspecs: Vec<String> = tag_names
            .iter()
            .map(|tag| format!("{}refs/tags/{}:refs/tags/{}", prefix, tag, tag))
            .collect();

        let refspec_strs: Vec<&str> = refspecs.iter().map(|s| s.as_str()).collect();

        // Per-ref rejections are reported through a callback, not the return value
        let rejected: RefCell<Vec<String>> = RefCell::new(Vec::new());
        let mut callbacks = Self::credentials_callbacks(self.repo.config()?);
        callbacks.push_update_reference(|refname, status| {
            if let Some(reason) = status {
                rejected
                    .borrow_mut()
                    .push(format!("{} ({})", refname, reason));
            }
            Ok(())
        });

        let mut options = PushOptions::new();
        options.remote_callbacks(callbacks);

        remote
            .push(&refspec_strs, Some(&mut options))
            .map_err(|e| DeployError::git(format!("Push failed: {}", e)))?;

        drop(options);
        let rejected = rejected.into_inner();
        if !rejected.is_empty() {
            return Err(DeployError::git(format!(
                "Remote rejected: {}",
                rejected.join(", ")
            )));
        }

        Ok(())
    }
}
