use std::fmt;
use std::path::{Path, PathBuf};

/// A fully described external command
#[derive(Debug, Clone, PartialEq)]
pub struct Invocation {
    pub program: String,
    pub args: Vec<String>,
    /// Working directory; the current directory when `None`
    pub cwd: Option<PathBuf>,
    /// Extra environment variables layered over the inherited environment
    pub env: Vec<(String, String)>,
}

impl Invocation {
    pub fn new(program: impl Into<String>) -> Self {
        Invocation {
            program: program.into(),
            args: Vec::new(),
            cwd: None,
            env: Vec::new(),
        }
    }

    pub fn arg(mut self, arg: impl Into<String>) -> Self {
        self.args.push(arg.into());
        self
    }

    pub fn args<I, S>(mut self, args: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.args.extend(args.into_iter().map(Into::into));
        self
    }

    /// Convenience for path arguments
    pub fn path_arg(self, path: &Path) -> Self {
        self.arg(path.display().to_string())
    }

    pub fn current_dir(mut self, dir: impl Into<PathBuf>) -> Self {
        self.cwd = Some(dir.into());
        self
    }

    pub fn env(mut self, key: impl Into<String>, value: impl Into<String>) -> Self {
        self.env.push((key.into(), value.into()));
        self
    }

    /// True when `flag` is immediately followed by `value` in the arguments
    pub fn has_option(&self, flag: &str, value: &str) -> bool {
        self.args
            .windows(2)
            .any(|pair| pair[0] == flag && pair[1] == value)
    }
}

impl fmt::Display for Invocation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.program)?;
        for arg in &self.args {
            if arg.contains(' ') {
                write!(f, " \"{}\"", arg)?;
            } else {
                write!(f, " {}", arg)?;
            }
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_builder_and_display() {
        let invocation = Invocation::new("flutter")
            .args(["build", "apk"])
            .arg("--flavor")
            .arg("prod")
            .current_dir("/work");

        assert_eq!(invocation.to_string(), "flutter build apk --flavor prod");
        assert_eq!(invocation.cwd, Some(PathBuf::from("/work")));
        assert!(invocation.has_option("--flavor", "prod"));
        assert!(!invocation.has_option("--flavor", "dev"));
    }

    #[test]
    fn test_display_quotes_spaces() {
        let invocation = Invocation::new("xcodebuild").arg("My App");
        assert_eq!(invocation.to_string(), "xcodebuild \"My App\"");
    }

    #[test]
    fn test_env() {
        let invocation = Invocation::new("xcrun").env("API_PRIVATE_KEYS_DIR", "/keys");
        assert_eq!(
            invocation.env,
            vec![("API_PRIVATE_KEYS_DIR".to_string(), "/keys".to_string())]
        );
    }
}
