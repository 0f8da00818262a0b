use std::fmt;

/// Version name and build number of the release being deployed.
///
/// Created from the manifest, its build number is overwritten once by the
/// build number allocator and then only read by the remaining stages.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ReleaseVersion {
    pub name: String,
    pub build_number: u64,
}

impl ReleaseVersion {
    pub fn new(name: impl Into<String>, build_number: u64) -> Self {
        ReleaseVersion {
            name: name.into(),
            build_number,
        }
    }

    /// Replace the build number with a freshly allocated one
    pub fn set_build_number(&mut self, build_number: u64) {
        self.build_number = build_number;
    }
}

impl fmt::Display for ReleaseVersion {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}+{}", self.name, self.build_number)
    }
}
