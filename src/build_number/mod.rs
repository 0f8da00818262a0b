//! Build number allocation
//!
//! A [BuildNumberSource] reports the highest build number already used on a
//! release track. [allocate] turns that into the next number and records it
//! on the [ReleaseVersion]. Sources are read-only; the increment only exists
//! locally until the artifact is uploaded.

pub mod firebase;
pub mod play;
pub mod testflight;

pub use firebase::FirebaseReleaseSource;
pub use play::PlayTrackSource;
pub use testflight::TestFlightSource;

use crate::domain::ReleaseVersion;
use crate::error::{DeployError, Result};

/// Capability to look up the latest published build number
pub trait BuildNumberSource {
    /// Human readable name used in logs
    fn describe(&self) -> String;

    /// Latest build number published for `identifier`.
    ///
    /// `version_name` scopes the lookup for backends that number builds per
    /// marketing version.
    ///
    /// # Returns
    /// * `Ok(Some(n))` - Highest build number in use
    /// * `Ok(None)` - Nothing published yet
    /// * `Err(Auth | Remote)` - Credentials rejected or query failed
    fn latest_build_number(&self, identifier: &str, version_name: &str) -> Result<Option<u64>>;
}

/// The number following `latest`; 1 when nothing was published
pub fn next_build_number(latest: Option<u64>) -> Result<u64> {
    latest.unwrap_or(0).checked_add(1).ok_or_else(|| {
        DeployError::remote(format!(
            "Latest build number {} leaves no room for another build",
            u64::MAX
        ))
    })
}

/// Query `source` and store the next build number on `version`.
///
/// Re-running after a partial failure queries again, so a number consumed
/// by an upload that later failed is skipped rather than reused.
pub fn allocate(
    source: &dyn BuildNumberSource,
    identifier: &str,
    version: &mut ReleaseVersion,
) -> Result<u64> {
    if identifier.trim().is_empty() {
        return Err(DeployError::validation("Missing app identifier"));
    }

    let latest = source.latest_build_number(identifier, &version.name)?;
    let next = next_build_number(latest)?;

    match latest {
        Some(previous) => log::info!("Previous build number ({}): {}", source.describe(), previous),
        None => log::info!("No previous build found on {}", source.describe()),
    }
    log::info!("New build number: {}", next);

    version.set_build_number(next);
    Ok(next)
}
