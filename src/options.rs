//! Per-lane options.
//!
//! Required values stay `Option` until a lane starts so that a missing one is
//! reported by name through [`require`] before any external call is made.

use crate::domain::BuildMode;
use crate::error::{DeployError, Result};

/// Return the value of a required option or a validation error naming it
pub fn require<'a>(value: &'a Option<String>, field: &str) -> Result<&'a str> {
    match value.as_deref().map(str::trim) {
        Some(v) if !v.is_empty() => Ok(v),
        _ => Err(DeployError::validation(format!("Missing {}", field))),
    }
}

#[derive(Debug, Clone, Default, PartialEq)]
pub struct AndroidBuildOptions {
    pub flavor: Option<String>,
    pub target: Option<String>,
    pub mode: BuildMode,
}

impl AndroidBuildOptions {
    pub fn validate(&self) -> Result<()> {
        require(&self.flavor, "flavor")?;
        require(&self.target, "target")?;
        Ok(())
    }
}

#[derive(Debug, Clone, Default, PartialEq)]
pub struct IosBuildOptions {
    pub app_name: Option<String>,
    pub scheme: Option<String>,
}

impl IosBuildOptions {
    pub fn validate(&self) -> Result<()> {
        require(&self.app_name, "app_name")?;
        require(&self.scheme, "scheme")?;
        Ok(())
    }
}

/// Play Store deployment
#[derive(Debug, Clone, Default, PartialEq)]
pub struct AndroidStoreOptions {
    pub app_name: Option<String>,
    pub app_identifier: Option<String>,
    pub track: String,
    pub message: String,
    pub build: AndroidBuildOptions,
}

impl AndroidStoreOptions {
    pub fn validate(&self) -> Result<()> {
        require(&self.app_name, "app_name")?;
        require(&self.app_identifier, "app_identifier")?;
        self.build.validate()
    }
}

/// Firebase App Distribution deployment
#[derive(Debug, Clone, Default, PartialEq)]
pub struct AndroidFirebaseOptions {
    pub app_name: Option<String>,
    pub firebase_app_id: Option<String>,
    pub groups: Vec<String>,
    pub message: String,
    pub build: AndroidBuildOptions,
}

impl AndroidFirebaseOptions {
    pub fn validate(&self) -> Result<()> {
        require(&self.app_name, "app_name")?;
        require(&self.firebase_app_id, "firebase_app_id")?;
        self.build.validate()
    }
}

/// TestFlight deployment
#[derive(Debug, Clone, Default, PartialEq)]
pub struct IosOptions {
    pub bundle_id: Option<String>,
    pub message: String,
    pub build: IosBuildOptions,
}

impl IosOptions {
    pub fn validate(&self) -> Result<()> {
        self.build.validate()?;
        require(&self.bundle_id, "bundle_id")?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_require_present() {
        assert_eq!(require(&Some("prod".to_string()), "flavor").unwrap(), "prod");
    }

    #[test]
    fn test_require_missing_or_blank() {
        let err = require(&None, "flavor").unwrap_err();
        assert_eq!(err.to_string(), "Validation error: Missing flavor");
        assert!(require(&Some("  ".to_string()), "target").is_err());
    }

    #[test]
    fn test_android_build_validation_names_field() {
        let options = AndroidBuildOptions {
            flavor: Some("prod".to_string()),
            target: None,
            mode: BuildMode::AppBundle,
        };
        assert!(options.validate().unwrap_err().to_string().contains("target"));
    }

    #[test]
    fn test_store_options_validation_order() {
        let options = AndroidStoreOptions {
            app_name: Some("acme".to_string()),
            ..Default::default()
        };
        let err = options.validate().unwrap_err();
        assert!(err.to_string().contains("app_identifier"));
    }

    #[test]
    fn test_ios_options_validation() {
        let options = IosOptions {
            bundle_id: Some("com.acme.app".to_string()),
            message: String::new(),
            build: IosBuildOptions {
                app_name: Some("Acme".to_string()),
                scheme: None,
            },
        };
        assert!(options.validate().unwrap_err().to_string().contains("scheme"));
    }
}
