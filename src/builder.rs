use std::fs;
use std::path::{Path, PathBuf};

use crate::config::IosConfig;
use crate::domain::artifact::{ios_archive_path, ios_output_dir, ios_symbols_path};
use crate::domain::{Artifact, ReleaseVersion};
use crate::error::{DeployError, Result};
use crate::options::{require, AndroidBuildOptions, IosBuildOptions};
use crate::tools::{CommandRunner, Invocation};

/// Invokes the native build tools for each platform.
///
/// All tools run in the project root (CocoaPods in `ios/`). Artifacts land
/// at the fixed locations described by [`Artifact`].
pub struct PlatformBuilder<'a> {
    runner: &'a dyn CommandRunner,
    root: PathBuf,
    ios: IosConfig,
}

impl<'a> PlatformBuilder<'a> {
    pub fn new(runner: &'a dyn CommandRunner, root: impl Into<PathBuf>, ios: IosConfig) -> Self {
        PlatformBuilder {
            runner,
            root: root.into(),
            ios,
        }
    }

    /// Build an app bundle or APK with `flutter build`.
    ///
    /// The version name and build number are passed on the command line so
    /// no project file is modified.
    ///
    /// # Returns
    /// * `Ok(Artifact)` - Artifact path relative to the project root
    /// * `Err(Validation)` - If flavor or target is missing; nothing is run
    /// * `Err(Build)` - If flutter is missing or exits non-zero
    pub fn build_android(
        &self,
        options: &AndroidBuildOptions,
        version: &ReleaseVersion,
    ) -> Result<Artifact> {
        let flavor = require(&options.flavor, "flavor")?;
        let target = require(&options.target, "target")?;

        log::info!(
            "Building Android {} (flavor: {}, target: {})",
            options.mode,
            flavor,
            target
        );

        let invocation = Invocation::new("flutter")
            .args(["build", options.mode.as_str()])
            .args(["--flavor", flavor])
            .arg("--release")
            .args(["-t", target])
            .arg("--no-tree-shake-icons")
            .args(["--build-name", version.name.as_str()])
            .arg("--build-number")
            .arg(version.build_number.to_string())
            .current_dir(&self.root);

        self.run(&invocation)?;

        Ok(Artifact::android(options.mode, flavor))
    }

    /// Archive and export an IPA, then zip its debug symbols.
    ///
    /// Steps: `pod install`, `xcodebuild archive`, `xcodebuild -exportArchive`,
    /// rename the exported IPA to `<app>.ipa`, `ditto` the dSYMs.
    pub fn build_ios(&self, options: &IosBuildOptions, version: &ReleaseVersion) -> Result<Artifact> {
        let app_name = require(&options.app_name, "app_name")?;
        let scheme = require(&options.scheme, "scheme")?;

        let export_options = self.root.join(&self.ios.export_options);
        if !export_options.is_file() {
            return Err(DeployError::validation(format!(
                "Export options plist not found: {}",
                export_options.display()
            )));
        }

        log::info!("Building iOS app {} (scheme: {})", app_name, scheme);

        self.run(&Invocation::new("pod").arg("install").current_dir(self.root.join("ios")))?;

        let archive = ios_archive_path(app_name);
        let workspace = Path::new("ios").join(&self.ios.workspace);

        self.run(
            &Invocation::new("xcodebuild")
                .arg("-workspace")
                .path_arg(&workspace)
                .args(["-scheme", scheme])
                .args(["-configuration", "Release"])
                .arg("-archivePath")
                .path_arg(&archive)
                .arg("archive")
                .arg(format!("FLUTTER_BUILD_NAME={}", version.name))
                .arg(format!("FLUTTER_BUILD_NUMBER={}", version.build_number))
                .current_dir(&self.root),
        )?;

        self.run(
            &Invocation::new("xcodebuild")
                .arg("-exportArchive")
                .arg("-archivePath")
                .path_arg(&archive)
                .arg("-exportPath")
                .path_arg(&ios_output_dir())
                .arg("-exportOptionsPlist")
                .path_arg(&self.ios.export_options)
                .current_dir(&self.root),
        )?;

        let artifact = Artifact::ios(app_name);
        self.rename_exported_ipa(&artifact)?;

        self.run(
            &Invocation::new("ditto")
                .args(["-c", "-k", "--keepParent"])
                .path_arg(&archive.join("dSYMs"))
                .path_arg(&ios_symbols_path(app_name))
                .current_dir(&self.root),
        )?;

        Ok(artifact)
    }

    /// `xcodebuild` names the IPA after the product; move the newest one to
    /// the app-specific name.
    fn rename_exported_ipa(&self, artifact: &Artifact) -> Result<()> {
        let target = self.root.join(&artifact.path);
        let pattern = self.root.join(ios_output_dir()).join("*.ipa");
        let pattern = pattern.to_string_lossy();

        let exported = glob::glob(&pattern)
            .map_err(|e| DeployError::build(format!("Invalid IPA pattern: {}", e)))?
            .flatten()
            .filter_map(|path| {
                let modified = fs::metadata(&path).and_then(|m| m.modified()).ok()?;
                Some((modified, path))
            })
            .max_by_key(|(modified, _)| *modified)
            .map(|(_, path)| path)
            .ok_or_else(|| {
                DeployError::build(format!(
                    "No IPA exported to {}",
                    self.root.join(ios_output_dir()).display()
                ))
            })?;

        if exported != target {
            log::debug!("Renaming {} to {}", exported.display(), target.display());
            fs::rename(&exported, &target)?;
        }

        Ok(())
    }

    fn run(&self, invocation: &Invocation) -> Result<()> {
        self.runner
            .run(invocation)
            .map_err(|e| DeployError::build(e.to_string()))
    }
}
