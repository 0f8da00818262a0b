//! Command line interface.
//!
//! Required lane values are optional at the clap level so a missing one is
//! reported as a validation error naming the field, the same way it is when
//! the pipelines are driven as a library.

use clap::{Args as ClapArgs, Parser, Subcommand};

pub mod commands;

pub use commands::run;

#[derive(Parser, Debug)]
#[command(
    name = "mobile-deploy",
    version,
    about = "Build, upload and tag Flutter releases for Google Play, Firebase and TestFlight"
)]
pub struct Args {
    #[arg(short, long, global = true, help = "Custom configuration file path")]
    pub config: Option<String>,

    #[arg(
        long,
        global = true,
        help = "Preview what would happen without making changes"
    )]
    pub dry_run: bool,

    #[arg(short, long, global = true, help = "Skip confirmation prompts")]
    pub yes: bool,

    #[command(subcommand)]
    pub command: Command,
}

#[derive(Subcommand, Debug)]
pub enum Command {
    /// Print the version name from the manifest
    Version,

    /// Send a release notification to the chat webhook
    Notify {
        #[arg(short, long)]
        message: Option<String>,

        #[arg(long, help = "Build number to report instead of the manifest's")]
        build_number: Option<u64>,
    },

    /// Create and push the release tag for HEAD
    Tag {
        #[arg(long)]
        app_name: Option<String>,

        #[arg(long)]
        build_number: Option<u64>,
    },

    /// Android lanes
    #[command(subcommand)]
    Android(AndroidCommand),

    /// iOS lanes
    #[command(subcommand)]
    Ios(IosCommand),
}

#[derive(ClapArgs, Debug, Clone, Default)]
pub struct AndroidBuildArgs {
    #[arg(long, help = "Product flavor to build")]
    pub flavor: Option<String>,

    #[arg(short, long, help = "Dart entry point, e.g. lib/main_prod.dart")]
    pub target: Option<String>,

    #[arg(long = "build", value_name = "appbundle|apk")]
    pub mode: Option<String>,
}

#[derive(ClapArgs, Debug, Clone, Default)]
pub struct IosBuildArgs {
    #[arg(long)]
    pub app_name: Option<String>,

    #[arg(long, help = "Xcode scheme, also used to locate GoogleService-Info.plist")]
    pub scheme: Option<String>,
}

#[derive(Subcommand, Debug)]
pub enum AndroidCommand {
    /// Allocate the next build number from a Play track
    Bump {
        #[arg(long)]
        app_identifier: Option<String>,

        #[arg(long)]
        track: Option<String>,
    },

    /// Allocate the next build number from Firebase App Distribution
    BumpFirebase {
        #[arg(long)]
        firebase_app_id: Option<String>,
    },

    /// Build an app bundle or APK
    Build {
        #[command(flatten)]
        build: AndroidBuildArgs,

        #[arg(long)]
        build_number: Option<u64>,
    },

    /// Upload a built app bundle to a Play track
    UploadStore {
        #[arg(long)]
        app_identifier: Option<String>,

        #[arg(long)]
        flavor: Option<String>,

        #[arg(long)]
        track: Option<String>,
    },

    /// Distribute a built APK with Firebase App Distribution
    UploadFirebase {
        #[arg(long)]
        firebase_app_id: Option<String>,

        #[arg(long)]
        flavor: Option<String>,

        #[arg(long, value_delimiter = ',')]
        groups: Vec<String>,
    },

    /// Bump, build, upload to Google Play, notify and tag
    Deploy {
        #[arg(long)]
        app_name: Option<String>,

        #[arg(long)]
        app_identifier: Option<String>,

        #[command(flatten)]
        build: AndroidBuildArgs,

        #[arg(long)]
        track: Option<String>,

        #[arg(short, long)]
        message: Option<String>,
    },

    /// Bump, build an APK, distribute with Firebase, notify and tag
    DeployFirebase {
        #[arg(long)]
        app_name: Option<String>,

        #[arg(long)]
        firebase_app_id: Option<String>,

        #[arg(long)]
        flavor: Option<String>,

        #[arg(short, long)]
        target: Option<String>,

        #[arg(long, value_delimiter = ',')]
        groups: Vec<String>,

        #[arg(short, long)]
        message: Option<String>,
    },
}

#[derive(Subcommand, Debug)]
pub enum IosCommand {
    /// Check the App Store Connect API key
    Connect,

    /// Allocate the next build number from TestFlight
    Bump {
        #[arg(long)]
        bundle_id: Option<String>,
    },

    /// Archive and export an IPA
    Build {
        #[command(flatten)]
        build: IosBuildArgs,

        #[arg(long)]
        build_number: Option<u64>,
    },

    /// Upload a built IPA to TestFlight
    UploadTestflight {
        #[arg(long)]
        app_name: Option<String>,
    },

    /// Upload dSYMs to Crashlytics
    UploadSymbols {
        #[command(flatten)]
        build: IosBuildArgs,
    },

    /// Bump, build, upload to TestFlight and Crashlytics, notify and tag
    Deploy {
        #[command(flatten)]
        build: IosBuildArgs,

        #[arg(long)]
        bundle_id: Option<String>,

        #[arg(short, long)]
        message: Option<String>,
    },
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_android_deploy() {
        let args = Args::try_parse_from([
            "mobile-deploy",
            "--dry-run",
            "android",
            "deploy",
            "--app-name",
            "acme",
            "--app-identifier",
            "com.acme.app",
            "--flavor",
            "prod",
            "-t",
            "lib/main_prod.dart",
            "--build",
            "apk",
        ])
        .unwrap();

        assert!(args.dry_run);
        match args.command {
            Command::Android(AndroidCommand::Deploy {
                app_name, build, ..
            }) => {
                assert_eq!(app_name.as_deref(), Some("acme"));
                assert_eq!(build.flavor.as_deref(), Some("prod"));
                assert_eq!(build.mode.as_deref(), Some("apk"));
            }
            other => panic!("unexpected command: {:?}", other),
        }
    }

    #[test]
    fn test_missing_lane_values_parse() {
        let args = Args::try_parse_from(["mobile-deploy", "ios", "deploy"]).unwrap();
        match args.command {
            Command::Ios(IosCommand::Deploy { build, bundle_id, .. }) => {
                assert!(build.app_name.is_none());
                assert!(bundle_id.is_none());
            }
            other => panic!("unexpected command: {:?}", other),
        }
    }

    #[test]
    fn test_groups_are_comma_separated() {
        let args = Args::try_parse_from([
            "mobile-deploy",
            "android",
            "upload-firebase",
            "--groups",
            "QA,Internal",
        ])
        .unwrap();
        match args.command {
            Command::Android(AndroidCommand::UploadFirebase { groups, .. }) => {
                assert_eq!(groups, vec!["QA".to_string(), "Internal".to_string()]);
            }
            other => panic!("unexpected command: {:?}", other),
        }
    }

    #[test]
    fn test_global_flags_after_subcommand() {
        let args = Args::try_parse_from(["mobile-deploy", "version", "--config", "ci.toml"]).unwrap();
        assert_eq!(args.config.as_deref(), Some("ci.toml"));
        assert!(matches!(args.command, Command::Version));
    }
}
