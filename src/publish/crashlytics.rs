use std::path::{Path, PathBuf};

use crate::error::{DeployError, Result};
use crate::publish::{ensure_file, SymbolUploader};
use crate::tools::{CommandRunner, Invocation};

/// Runs Crashlytics' `upload-symbols` script
pub struct CrashlyticsUploader<'a> {
    runner: &'a dyn CommandRunner,
    script: PathBuf,
}

impl<'a> CrashlyticsUploader<'a> {
    pub fn new(runner: &'a dyn CommandRunner, script: impl Into<PathBuf>) -> Self {
        CrashlyticsUploader {
            runner,
            script: script.into(),
        }
    }
}

impl SymbolUploader for CrashlyticsUploader<'_> {
    fn upload(&self, symbols: &Path, config: &Path) -> Result<()> {
        ensure_file(symbols, "Symbol archive")?;
        ensure_file(config, "Crashlytics configuration")?;

        let invocation = Invocation::new(self.script.display().to_string())
            .arg("-gsp")
            .path_arg(config)
            .args(["-p", "ios"])
            .path_arg(symbols);

        self.runner
            .run(&invocation)
            .map_err(|e| DeployError::upload(e.to_string()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::tools::MockRunner;

    #[test]
    fn test_upload_symbols_invocation() {
        let symbols = tempfile::NamedTempFile::new().unwrap();
        let plist = tempfile::NamedTempFile::new().unwrap();
        let runner = MockRunner::new();
        let uploader = CrashlyticsUploader::new(&runner, "/app/ios/Pods/FirebaseCrashlytics/upload-symbols");

        uploader.upload(symbols.path(), plist.path()).unwrap();

        let call = &runner.invocations()[0];
        assert_eq!(call.program, "/app/ios/Pods/FirebaseCrashlytics/upload-symbols");
        assert!(call.has_option("-gsp", &plist.path().display().to_string()));
        assert!(call.has_option("-p", "ios"));
        assert_eq!(
            call.args.last().cloned(),
            Some(symbols.path().display().to_string())
        );
    }

    #[test]
    fn test_missing_config_is_upload_error() {
        let symbols = tempfile::NamedTempFile::new().unwrap();
        let runner = MockRunner::new();
        let uploader = CrashlyticsUploader::new(&runner, "upload-symbols");

        let err = uploader
            .upload(symbols.path(), Path::new("/nonexistent/GoogleService-Info.plist"))
            .unwrap_err();
        assert!(matches!(err, DeployError::Upload(_)));
        assert!(runner.invocations().is_empty());
    }
}
