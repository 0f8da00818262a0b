use std::fs;
use std::path::Path;

use git2::{Oid, Repository as Git2Repo, Signature};
use tempfile::TempDir;

use mobile_deploy::domain::{ReleaseTag, ReleaseVersion};
use mobile_deploy::git::{Git2Repository, Repository};
use mobile_deploy::tagger::ReleaseTagger;
use mobile_deploy::DeployError;

fn commit_file(repo: &Git2Repo, root: &Path, name: &str, contents: &str) -> Oid {
    fs::write(root.join(name), contents).unwrap();

    let mut index = repo.index().unwrap();
    index.add_path(Path::new(name)).unwrap();
    index.write().unwrap();
    let tree = repo.find_tree(index.write_tree().unwrap()).unwrap();

    let sig = Signature::now("Test User", "test@example.com").unwrap();
    let parents = match repo.head() {
        Ok(head) => vec![head.peel_to_commit().unwrap()],
        Err(_) => Vec::new(),
    };
    let parents: Vec<&git2::Commit> = parents.iter().collect();

    repo.commit(Some("HEAD"), &sig, &sig, "commit", &tree, &parents)
        .unwrap()
}

/// Repository with one commit, an identity and a bare `origin`
fn setup() -> (TempDir, TempDir, Git2Repo) {
    let dir = TempDir::new().unwrap();
    let repo = Git2Repo::init(dir.path()).unwrap();
    {
        let mut config = repo.config().unwrap();
        config.set_str("user.name", "Test User").unwrap();
        config.set_str("user.email", "test@example.com").unwrap();
    }
    commit_file(&repo, dir.path(), "pubspec.yaml", "version: 1.0.0+1\n");

    let remote_dir = TempDir::new().unwrap();
    Git2Repo::init_bare(remote_dir.path()).unwrap();
    repo.remote("origin", remote_dir.path().to_str().unwrap())
        .unwrap();

    (dir, remote_dir, repo)
}

fn remote_tag_target(remote: &Path, name: &str) -> Option<Oid> {
    let bare = Git2Repo::open_bare(remote).unwrap();
    let target = bare
        .find_reference(&format!("refs/tags/{}", name))
        .ok()
        .and_then(|r| r.peel_to_commit().ok())
        .map(|c| c.id());
    target
}

#[test]
fn test_tag_is_annotated_and_pushed() {
    let (dir, remote, raw) = setup();
    let repo = Git2Repository::open(dir.path()).unwrap();
    let tagger = ReleaseTagger::new(&repo, "fastlane-builds", "origin");

    let tag = tagger
        .tag_release("acme", &ReleaseVersion::new("1.0.0", 2))
        .unwrap();

    let reference = raw
        .find_reference("refs/tags/fastlane-builds/acme/1.0.0+2")
        .unwrap();
    let annotated = reference.peel_to_tag().unwrap();
    assert_eq!(
        annotated.message(),
        Some("fastlane-builds/acme/1.0.0+2 (mobile-deploy)")
    );

    let head = raw.head().unwrap().peel_to_commit().unwrap().id();
    assert_eq!(remote_tag_target(remote.path(), &tag.name()), Some(head));

    let listed = repo.list_tags().unwrap();
    assert_eq!(listed, vec!["fastlane-builds/acme/1.0.0+2".to_string()]);
    assert_eq!(ReleaseTag::parse(&listed[0]).unwrap(), tag);
}

#[test]
fn test_retag_moves_existing_tag() {
    let (dir, remote, raw) = setup();
    let repo = Git2Repository::open(dir.path()).unwrap();
    let tagger = ReleaseTagger::new(&repo, "fastlane-builds", "origin");
    let version = ReleaseVersion::new("1.0.0", 3);

    tagger.tag_release("acme", &version).unwrap();
    let second = commit_file(&raw, dir.path(), "CHANGELOG.md", "fix\n");
    tagger.tag_release("acme", &version).unwrap();

    assert_eq!(
        remote_tag_target(remote.path(), "fastlane-builds/acme/1.0.0+3"),
        Some(second)
    );
}

#[test]
fn test_modified_tracked_file_is_dirty() {
    let (dir, remote, _raw) = setup();
    fs::write(dir.path().join("pubspec.yaml"), "version: 1.0.1+1\n").unwrap();

    let repo = Git2Repository::open(dir.path()).unwrap();
    let tagger = ReleaseTagger::new(&repo, "fastlane-builds", "origin");

    let err = tagger
        .tag_release("acme", &ReleaseVersion::new("1.0.1", 4))
        .unwrap_err();

    assert!(matches!(err, DeployError::DirtyTree(_)));
    assert!(err.to_string().contains("pubspec.yaml"));
    assert!(repo.list_tags().unwrap().is_empty());
    assert_eq!(
        remote_tag_target(remote.path(), "fastlane-builds/acme/1.0.1+4"),
        None
    );
}

#[test]
fn test_unknown_remote_is_git_error() {
    let (dir, _remote, _raw) = setup();
    let repo = Git2Repository::open(dir.path()).unwrap();
    let tagger = ReleaseTagger::new(&repo, "fastlane-builds", "upstream");

    let err = tagger
        .tag_release("acme", &ReleaseVersion::new("1.0.0", 5))
        .unwrap_err();
    assert!(matches!(err, DeployError::Git(_)));
}

#[test]
fn test_current_branch_on_fresh_repository() {
    let (dir, _remote, raw) = setup();
    let repo = Git2Repository::open(dir.path()).unwrap();
    let expected = raw.head().unwrap().shorthand().map(str::to_string);
    assert_eq!(repo.current_branch().unwrap(), expected);
}
