use thiserror::Error;

use crate::domain::Stage;

/// Unified error type for mobile-deploy operations
#[derive(Error, Debug)]
pub enum DeployError {
    #[error("Validation error: {0}")]
    Validation(String),

    #[error("Manifest parse error: {0}")]
    Parse(String),

    #[error("Authentication error: {0}")]
    Auth(String),

    #[error("Remote operation failed: {0}")]
    Remote(String),

    #[error("Build failed: {0}")]
    Build(String),

    #[error("Upload failed: {0}")]
    Upload(String),

    #[error("Working tree is not clean: {0}")]
    DirtyTree(String),

    #[error("Git operation failed: {0}")]
    Git(String),

    #[error("Notification failed: {0}")]
    Notification(String),

    #[error("Configuration error: {0}")]
    Config(String),

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("{stage} failed: {source}")]
    Stage {
        stage: Stage,
        #[source]
        source: Box<DeployError>,
    },
}

/// Convenience type alias for Results in mobile-deploy
pub type Result<T> = std::result::Result<T, DeployError>;

impl From<git2::Error> for DeployError {
    fn from(err: git2::Error) -> Self {
        DeployError::Git(err.message().to_string())
    }
}

impl DeployError {
    pub fn validation(msg: impl Into<String>) -> Self {
        DeployError::Validation(msg.into())
    }

    pub fn parse(msg: impl Into<String>) -> Self {
        DeployError::Parse(msg.into())
    }

    pub fn auth(msg: impl Into<String>) -> Self {
        DeployError::Auth(msg.into())
    }

    pub fn remote(msg: impl Into<String>) -> Self {
        DeployError::Remote(msg.into())
    }

    pub fn build(msg: impl Into<String>) -> Self {
        DeployError::Build(msg.into())
    }

    pub fn upload(msg: impl Into<String>) -> Self {
        DeployError::Upload(msg.into())
    }

    pub fn dirty_tree(msg: impl Into<String>) -> Self {
        DeployError::DirtyTree(msg.into())
    }

    pub fn git(msg: impl Into<String>) -> Self {
        DeployError::Git(msg.into())
    }

    pub fn notification(msg: impl Into<String>) -> Self {
        DeployError::Notification(msg.into())
    }

    pub fn config(msg: impl Into<String>) -> Self {
        DeployError::Config(msg.into())
    }

    /// Attribute this error to a pipeline stage.
    ///
    /// Errors that already carry a stage are returned unchanged so the
    /// innermost stage wins.
    pub fn at_stage(self, stage: Stage) -> Self {
        match self {
            DeployError::Stage { .. } => self,
            other => DeployError::Stage {
                stage,
                source: Box::new(other),
            },
        }
    }

    /// The stage this error was raised in, if it has been attributed to one.
    pub fn stage(&self) -> Option<Stage> {
        match self {
            DeployError::Stage { stage, .. } => Some(*stage),
            _ => None,
        }
    }

    /// The underlying error with any stage wrapper removed.
    pub fn root(&self) -> &DeployError {
        match self {
            DeployError::Stage { source, .. } => source.root(),
            other => other,
        }
    }
}
