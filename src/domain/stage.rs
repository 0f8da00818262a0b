use std::fmt;

/// A step of the deployment pipeline, in execution order
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Stage {
    ResolveVersion,
    AllocateBuildNumber,
    Build,
    Publish,
    PublishSymbols,
    Notify,
    Tag,
}

impl Stage {
    pub fn name(&self) -> &'static str {
        match self {
            Stage::ResolveVersion => "resolve version",
            Stage::AllocateBuildNumber => "allocate build number",
            Stage::Build => "build artifact",
            Stage::Publish => "publish artifact",
            Stage::PublishSymbols => "publish symbols",
            Stage::Notify => "notify",
            Stage::Tag => "tag release",
        }
    }
}

impl fmt::Display for Stage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_stage_names() {
        assert_eq!(Stage::ResolveVersion.to_string(), "resolve version");
        assert_eq!(Stage::PublishSymbols.to_string(), "publish symbols");
        assert_eq!(Stage::Tag.to_string(), "tag release");
    }
}
