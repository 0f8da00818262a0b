//! Artifact distribution
//!
//! Uploads are never retried; a failed upload aborts the lane.

pub mod crashlytics;
pub mod firebase;
pub mod play;
pub mod testflight;

pub use crashlytics::CrashlyticsUploader;
pub use firebase::FirebasePublisher;
pub use play::PlayStorePublisher;
pub use testflight::TestFlightPublisher;

use std::path::Path;

use crate::domain::Artifact;
use crate::error::{DeployError, Result};

/// Uploads a build artifact to a distribution channel
pub trait ArtifactPublisher {
    fn describe(&self) -> String;

    /// Upload `artifact`, whose path is already resolved against the
    /// project root.
    fn publish(&self, artifact: &Artifact) -> Result<()>;
}

/// Uploads debug symbols for crash symbolication
pub trait SymbolUploader {
    /// Upload the symbol archive using the service configuration file
    fn upload(&self, symbols: &Path, config: &Path) -> Result<()>;
}

/// Fail with an upload error when a file to upload is missing
pub(crate) fn ensure_file(path: &Path, what: &str) -> Result<()> {
    if path.is_file() {
        Ok(())
    } else {
        Err(DeployError::upload(format!(
            "{} not found: {}",
            what,
            path.display()
        )))
    }
}
