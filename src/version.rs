use serde::Deserialize;
use std::fs;
use std::path::Path;

use crate::domain::ReleaseVersion;
use crate::error::{DeployError, Result};

/// The part of a Flutter `pubspec.yaml` this tool reads
#[derive(Debug, Deserialize)]
struct Manifest {
    version: Option<String>,
}

/// Splits a manifest version string of the form `<name>[+<build>]`.
///
/// The name must be a valid semantic version. A missing build component
/// yields build number 0.
///
/// # Example
/// ```ignore
/// let version = parse_manifest_version("1.2.3+7")?;
/// assert_eq!(version.name, "1.2.3");
/// assert_eq!(version.build_number, 7);
/// ```
pub fn parse_manifest_version(raw: &str) -> Result<ReleaseVersion> {
    let raw = raw.trim();
    let (name, build) = match raw.split_once('+') {
        Some((name, build)) => (name, Some(build)),
        None => (raw, None),
    };

    if name.is_empty() {
        return Err(DeployError::parse(format!(
            "Version '{}' has an empty name component",
            raw
        )));
    }

    semver::Version::parse(name).map_err(|e| {
        DeployError::parse(format!("Version name '{}' is not semantic: {}", name, e))
    })?;

    let build_number = match build {
        Some(build) => build.parse::<u64>().map_err(|_| {
            DeployError::parse(format!(
                "Build component '{}' of version '{}' is not a number",
                build, raw
            ))
        })?,
        None => 0,
    };

    Ok(ReleaseVersion::new(name, build_number))
}

/// Reads the manifest and returns its full version, build component included.
pub fn resolve_release_version(manifest_path: &Path) -> Result<ReleaseVersion> {
    let contents = fs::read_to_string(manifest_path).map_err(|e| {
        DeployError::parse(format!(
            "Cannot read manifest {}: {}",
            manifest_path.display(),
            e
        ))
    })?;

    let manifest: Manifest = serde_yml::from_str(&contents).map_err(|e| {
        DeployError::parse(format!(
            "Malformed manifest {}: {}",
            manifest_path.display(),
            e
        ))
    })?;

    let raw = manifest.version.ok_or_else(|| {
        DeployError::parse(format!(
            "Manifest {} has no 'version' field",
            manifest_path.display()
        ))
    })?;

    let version = parse_manifest_version(&raw)?;
    log::debug!(
        "Manifest {} declares version {}",
        manifest_path.display(),
        version
    );
    Ok(version)
}

/// Reads the manifest and returns only the version name.
pub fn read_version_name(manifest_path: &Path) -> Result<String> {
    Ok(resolve_release_version(manifest_path)?.name)
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;
    use tempfile::NamedTempFile;

    fn manifest(contents: &str) -> NamedTempFile {
        let mut file = NamedTempFile::new().unwrap();
        file.write_all(contents.as_bytes()).unwrap();
        file.flush().unwrap();
        file
    }

    #[test]
    fn test_parse_name_and_build() {
        let version = parse_manifest_version("1.2.3+7").unwrap();
        assert_eq!(version.name, "1.2.3");
        assert_eq!(version.build_number, 7);
    }

    #[test]
    fn test_parse_without_build() {
        let version = parse_manifest_version("0.9.0").unwrap();
        assert_eq!(version.name, "0.9.0");
        assert_eq!(version.build_number, 0);
    }

    #[test]
    fn test_parse_prerelease_name() {
        let version = parse_manifest_version("2.0.0-rc.1+3").unwrap();
        assert_eq!(version.name, "2.0.0-rc.1");
        assert_eq!(version.build_number, 3);
    }

    #[test]
    fn test_parse_rejects_malformed() {
        assert!(matches!(
            parse_manifest_version("+4"),
            Err(DeployError::Parse(_))
        ));
        assert!(matches!(
            parse_manifest_version("1.2+4"),
            Err(DeployError::Parse(_))
        ));
        assert!(matches!(
            parse_manifest_version("1.2.3+abc"),
            Err(DeployError::Parse(_))
        ));
    }

    #[test]
    fn test_read_version_name_from_pubspec() {
        let file = manifest("name: acme\ndescription: Acme app\nversion: 1.2.3+7\n");
        assert_eq!(read_version_name(file.path()).unwrap(), "1.2.3");
    }

    #[test]
    fn test_resolve_full_version() {
        let file = manifest("name: acme\nversion: 2.0.0+0\ndependencies:\n  flutter:\n    sdk: flutter\n");
        let version = resolve_release_version(file.path()).unwrap();
        assert_eq!(version, ReleaseVersion::new("2.0.0", 0));
    }

    #[test]
    fn test_missing_manifest() {
        let result = read_version_name(Path::new("/nonexistent/pubspec.yaml"));
        assert!(matches!(result, Err(DeployError::Parse(_))));
    }

    #[test]
    fn test_missing_version_field() {
        let file = manifest("name: acme\n");
        let err = read_version_name(file.path()).unwrap_err();
        assert!(err.to_string().contains("no 'version' field"));
    }

    #[test]
    fn test_malformed_yaml() {
        let file = manifest("version: [1.2.3\n");
        assert!(matches!(
            read_version_name(file.path()),
            Err(DeployError::Parse(_))
        ));
    }
}
