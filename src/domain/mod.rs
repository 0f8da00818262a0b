//! Domain values shared by every deployment stage

pub mod artifact;
pub mod release;
pub mod stage;
pub mod tag;

pub use artifact::{Artifact, ArtifactKind, BuildMode};
pub use release::ReleaseVersion;
pub use stage::Stage;
pub use tag::ReleaseTag;
