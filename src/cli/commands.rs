//! Lane handlers: turn parsed arguments into options, build the real
//! collaborators and run a pipeline or a single stage.

use std::path::{Path, PathBuf};

use anyhow::Result;
use reqwest::blocking::Client;

use crate::build_number::{
    self, BuildNumberSource, FirebaseReleaseSource, PlayTrackSource, TestFlightSource,
};
use crate::builder::PlatformBuilder;
use crate::cli::{AndroidBuildArgs, AndroidCommand, Args, Command, IosBuildArgs, IosCommand};
use crate::config::Config;
use crate::credentials::{self, AppStoreCredentials};
use crate::domain::artifact::{crashlytics_config_path, ios_symbols_path};
use crate::domain::{Artifact, BuildMode, ReleaseTag, ReleaseVersion};
use crate::git::{Git2Repository, Repository};
use crate::notify::{HttpWebhook, NotificationDispatcher};
use crate::options::{
    require, AndroidBuildOptions, AndroidFirebaseOptions, AndroidStoreOptions, IosBuildOptions,
    IosOptions,
};
use crate::pipeline::{Pipeline, PipelineKind, PipelineReport};
use crate::publish::{
    ArtifactPublisher, CrashlyticsUploader, FirebasePublisher, PlayStorePublisher, SymbolUploader,
    TestFlightPublisher,
};
use crate::remote::google::{ANDROID_PUBLISHER_SCOPE, CLOUD_PLATFORM_SCOPE};
use crate::remote::{self, AppStoreToken, GoogleAuth};
use crate::tagger::ReleaseTagger;
use crate::tools::SystemRunner;
use crate::ui;
use crate::version;
use crate::warnings::DeployWarning;

const DEFAULT_NOTIFY_MESSAGE: &str = "New build available";
const PLAY_MESSAGE: &str = "New Android build uploaded to Google Play";
const FIREBASE_MESSAGE: &str = "New Android build distributed with Firebase";
const TESTFLIGHT_MESSAGE: &str = "New iOS build uploaded to TestFlight";

/// Shared state of one invocation
struct Context {
    config: Config,
    dry_run: bool,
    yes: bool,
}

impl Context {
    fn root(&self) -> &Path {
        &self.config.project.root
    }

    fn client(&self) -> crate::Result<Client> {
        remote::http_client(self.config.remote.timeout_secs)
    }

    fn google_auth(&self, scope: &str) -> crate::Result<GoogleAuth> {
        let key_file = credentials::google_key_file(&self.config.credentials)?;
        GoogleAuth::from_key_file(&key_file, scope)
    }

    fn app_store_credentials(&self) -> crate::Result<AppStoreCredentials> {
        let key_dir = self.root().join(&self.config.ios.key_dir);
        AppStoreCredentials::from_env(&self.config.credentials, &key_dir)
    }

    fn open_repo(&self) -> crate::Result<Git2Repository> {
        Git2Repository::open(self.root())
    }

    /// Manifest version, optionally with an explicit build number
    fn release_version(&self, build_number: Option<u64>) -> crate::Result<ReleaseVersion> {
        let mut release = version::resolve_release_version(&self.config.project.manifest_path())?;
        if let Some(n) = build_number {
            release.set_build_number(n);
        }
        Ok(release)
    }

    fn track(&self, track: Option<String>) -> String {
        track.unwrap_or_else(|| self.config.android.default_track.clone())
    }

    fn groups(&self, groups: Vec<String>) -> Vec<String> {
        if groups.is_empty() {
            self.config.android.firebase_groups.clone()
        } else {
            groups
        }
    }

    fn build_mode(&self, mode: Option<&str>) -> crate::Result<BuildMode> {
        match mode {
            Some(m) => m.parse(),
            None => Ok(self.config.android.build_mode),
        }
    }

    fn android_build(&self, args: AndroidBuildArgs) -> crate::Result<AndroidBuildOptions> {
        Ok(AndroidBuildOptions {
            mode: self.build_mode(args.mode.as_deref())?,
            flavor: args.flavor,
            target: args.target,
        })
    }

    /// Ask before a deployment unless `--yes` was given
    fn confirm(&self, what: &str) -> Result<bool> {
        if self.yes {
            return Ok(true);
        }
        let confirmed = ui::confirm_action(&format!("Deploy {}?", what))?;
        if !confirmed {
            println!("Deployment cancelled by user.");
        }
        Ok(confirmed)
    }
}

/// Execute the parsed command against a loaded configuration
pub fn run(args: Args, config: Config) -> Result<()> {
    let ctx = Context {
        config,
        dry_run: args.dry_run,
        yes: args.yes,
    };

    match args.command {
        Command::Version => {
            let name = version::read_version_name(&ctx.config.project.manifest_path())?;
            println!("{}", name);
            Ok(())
        }
        Command::Notify {
            message,
            build_number,
        } => notify(&ctx, message, build_number),
        Command::Tag {
            app_name,
            build_number,
        } => tag(&ctx, app_name, build_number),
        Command::Android(command) => android(&ctx, command),
        Command::Ios(command) => ios(&ctx, command),
    }
}

fn notify(ctx: &Context, message: Option<String>, build_number: Option<u64>) -> Result<()> {
    let release = ctx.release_version(build_number)?;
    let message = message.unwrap_or_else(|| DEFAULT_NOTIFY_MESSAGE.to_string());

    if ctx.dry_run {
        let text = NotificationDispatcher::format_text(&message, &release);
        ui::display_status(&format!("Would notify: {}", text));
        return Ok(());
    }

    let branch = ctx
        .open_repo()
        .and_then(|repo| repo.current_branch())
        .unwrap_or_else(|e| {
            log::debug!("Cannot determine current branch: {}", e);
            None
        });

    let webhook = HttpWebhook::new(ctx.client()?);
    let dispatcher =
        NotificationDispatcher::new(&webhook, credentials::webhook_url(&ctx.config.credentials));
    let outcome = dispatcher.dispatch(&message, &release, branch.as_deref());

    match DeployWarning::from_outcome(&outcome, &ctx.config.credentials.webhook_url) {
        Some(warning) => ui::display_warning(&warning),
        None => ui::display_success("Notification sent"),
    }
    Ok(())
}

fn tag(ctx: &Context, app_name: Option<String>, build_number: Option<u64>) -> Result<()> {
    let app_name = require(&app_name, "app_name")?;
    let release = ctx.release_version(build_number)?;

    if ctx.dry_run {
        let tag = ReleaseTag::new(ctx.config.git.tag_group.as_str(), app_name, &release);
        ui::display_status(&format!(
            "Would create and push tag {} to {}",
            tag.name(),
            ctx.config.git.remote
        ));
        return Ok(());
    }

    let repo = ctx.open_repo()?;
    let tagger = ReleaseTagger::new(
        &repo,
        ctx.config.git.tag_group.as_str(),
        ctx.config.git.remote.as_str(),
    );
    let tag = tagger.tag_release(app_name, &release)?;
    ui::display_success(&format!("Tagged {}", tag.name()));
    Ok(())
}

/// Allocate and print the next build number
fn bump(ctx: &Context, source: &dyn BuildNumberSource, identifier: &str) -> Result<()> {
    let mut release = ctx.release_version(None)?;
    let next = build_number::allocate(source, identifier, &mut release)?;
    ui::display_success(&format!("Next build number: {}", next));
    println!("{}", next);
    Ok(())
}

fn publish(ctx: &Context, publisher: &dyn ArtifactPublisher, artifact: Artifact) -> Result<()> {
    let artifact = artifact.resolve(ctx.root());

    if ctx.dry_run {
        ui::display_status(&format!(
            "Would publish {} to {}",
            artifact.path.display(),
            publisher.describe()
        ));
        return Ok(());
    }

    publisher.publish(&artifact)?;
    ui::display_success(&format!(
        "Published {} to {}",
        artifact.path.display(),
        publisher.describe()
    ));
    Ok(())
}

fn finish(report: PipelineReport) -> Result<()> {
    ui::display_report(&report);
    Ok(())
}

fn android(ctx: &Context, command: AndroidCommand) -> Result<()> {
    match command {
        AndroidCommand::Bump {
            app_identifier,
            track,
        } => {
            let identifier = require(&app_identifier, "app_identifier")?;
            let track = ctx.track(track);
            if ctx.dry_run {
                ui::display_status(&format!(
                    "Would read the {} track of {}",
                    track, identifier
                ));
                return Ok(());
            }
            let source =
                PlayTrackSource::new(ctx.client()?, ctx.google_auth(ANDROID_PUBLISHER_SCOPE)?, track);
            bump(ctx, &source, identifier)
        }

        AndroidCommand::BumpFirebase { firebase_app_id } => {
            let app_id = require(&firebase_app_id, "firebase_app_id")?;
            if ctx.dry_run {
                ui::display_status(&format!("Would read the latest release of {}", app_id));
                return Ok(());
            }
            let source =
                FirebaseReleaseSource::new(ctx.client()?, ctx.google_auth(CLOUD_PLATFORM_SCOPE)?);
            bump(ctx, &source, app_id)
        }

        AndroidCommand::Build {
            build,
            build_number,
        } => {
            let options = ctx.android_build(build)?;
            options.validate()?;
            let release = ctx.release_version(build_number)?;

            if ctx.dry_run {
                ui::display_status(&format!(
                    "Would build {} {} for {}",
                    options.mode,
                    release,
                    options.flavor.as_deref().unwrap_or_default()
                ));
                return Ok(());
            }

            let runner = SystemRunner;
            let builder = PlatformBuilder::new(&runner, ctx.root(), ctx.config.ios.clone());
            let artifact = builder.build_android(&options, &release)?;
            ui::display_success(&format!("Built {}", artifact.path.display()));
            Ok(())
        }

        AndroidCommand::UploadStore {
            app_identifier,
            flavor,
            track,
        } => {
            let package = require(&app_identifier, "app_identifier")?;
            let flavor = require(&flavor, "flavor")?;
            let artifact = Artifact::android(BuildMode::AppBundle, flavor);
            let track = ctx.track(track);

            if ctx.dry_run {
                ui::display_status(&format!(
                    "Would upload {} to the {} track of {}",
                    artifact.resolve(ctx.root()).path.display(),
                    track,
                    package
                ));
                return Ok(());
            }

            let publisher = PlayStorePublisher::new(
                ctx.client()?,
                ctx.google_auth(ANDROID_PUBLISHER_SCOPE)?,
                package,
                track,
            );
            publish(ctx, &publisher, artifact)
        }

        AndroidCommand::UploadFirebase {
            firebase_app_id,
            flavor,
            groups,
        } => {
            let app_id = require(&firebase_app_id, "firebase_app_id")?;
            let flavor = require(&flavor, "flavor")?;
            let runner = SystemRunner;
            let publisher = FirebasePublisher::new(
                &runner,
                app_id,
                ctx.groups(groups),
                credentials::google_key_file(&ctx.config.credentials).ok(),
            );
            publish(ctx, &publisher, Artifact::android(BuildMode::Apk, flavor))
        }

        AndroidCommand::Deploy {
            app_name,
            app_identifier,
            build,
            track,
            message,
        } => {
            let options = AndroidStoreOptions {
                app_name,
                app_identifier,
                track: ctx.track(track),
                message: message.unwrap_or_else(|| PLAY_MESSAGE.to_string()),
                build: ctx.android_build(build)?,
            };
            options.validate()?;
            let app = require(&options.app_name, "app_name")?;
            let package = require(&options.app_identifier, "app_identifier")?;

            if ctx.dry_run {
                let release = ctx.release_version(None)?;
                ui::display_plan(PipelineKind::PlayStore, &release.name, app);
                return Ok(());
            }
            if !ctx.confirm(&format!("{} to the {} track", app, options.track))? {
                return Ok(());
            }

            let client = ctx.client()?;
            let source = PlayTrackSource::new(
                client.clone(),
                ctx.google_auth(ANDROID_PUBLISHER_SCOPE)?,
                options.track.as_str(),
            );
            let publisher = PlayStorePublisher::new(
                client.clone(),
                ctx.google_auth(ANDROID_PUBLISHER_SCOPE)?,
                package,
                options.track.as_str(),
            );

            let runner = SystemRunner;
            let repo = ctx.open_repo()?;
            let webhook = HttpWebhook::new(client);
            let pipeline = Pipeline::new(
                &ctx.config,
                &runner,
                &repo,
                &webhook,
                credentials::webhook_url(&ctx.config.credentials),
            );
            finish(pipeline.deploy_play_store(&options, &source, &publisher)?)
        }

        AndroidCommand::DeployFirebase {
            app_name,
            firebase_app_id,
            flavor,
            target,
            groups,
            message,
        } => {
            let options = AndroidFirebaseOptions {
                app_name,
                firebase_app_id,
                groups: ctx.groups(groups),
                message: message.unwrap_or_else(|| FIREBASE_MESSAGE.to_string()),
                build: AndroidBuildOptions {
                    flavor,
                    target,
                    mode: BuildMode::Apk,
                },
            };
            options.validate()?;
            let app = require(&options.app_name, "app_name")?;
            let app_id = require(&options.firebase_app_id, "firebase_app_id")?;

            if ctx.dry_run {
                let release = ctx.release_version(None)?;
                ui::display_plan(PipelineKind::Firebase, &release.name, app);
                return Ok(());
            }
            if !ctx.confirm(&format!("{} to {}", app, options.groups.join(", ")))? {
                return Ok(());
            }

            let client = ctx.client()?;
            let source =
                FirebaseReleaseSource::new(client.clone(), ctx.google_auth(CLOUD_PLATFORM_SCOPE)?);

            let runner = SystemRunner;
            let publisher = FirebasePublisher::new(
                &runner,
                app_id,
                options.groups.clone(),
                credentials::google_key_file(&ctx.config.credentials).ok(),
            );
            let repo = ctx.open_repo()?;
            let webhook = HttpWebhook::new(client);
            let pipeline = Pipeline::new(
                &ctx.config,
                &runner,
                &repo,
                &webhook,
                credentials::webhook_url(&ctx.config.credentials),
            );
            finish(pipeline.deploy_firebase(&options, &source, &publisher)?)
        }
    }
}

fn ios_build_options(args: IosBuildArgs) -> IosBuildOptions {
    IosBuildOptions {
        app_name: args.app_name,
        scheme: args.scheme,
    }
}

fn symbols_uploader<'a>(ctx: &Context, runner: &'a SystemRunner) -> CrashlyticsUploader<'a> {
    CrashlyticsUploader::new(runner, ctx.root().join(&ctx.config.ios.upload_symbols))
}

fn ios(ctx: &Context, command: IosCommand) -> Result<()> {
    match command {
        IosCommand::Connect => {
            let creds = ctx.app_store_credentials()?;
            AppStoreToken::mint(&creds)?;
            ui::display_success(&format!(
                "App Store Connect key {} (issuer {}) at {}",
                creds.key_id,
                creds.issuer_id,
                creds.key_path.display()
            ));
            Ok(())
        }

        IosCommand::Bump { bundle_id } => {
            let bundle_id = require(&bundle_id, "bundle_id")?;
            if ctx.dry_run {
                ui::display_status(&format!("Would read TestFlight builds of {}", bundle_id));
                return Ok(());
            }
            let source = TestFlightSource::new(ctx.client()?, ctx.app_store_credentials()?);
            bump(ctx, &source, bundle_id)
        }

        IosCommand::Build {
            build,
            build_number,
        } => {
            let options = ios_build_options(build);
            options.validate()?;
            let release = ctx.release_version(build_number)?;

            if ctx.dry_run {
                ui::display_status(&format!(
                    "Would archive {} {}",
                    options.scheme.as_deref().unwrap_or_default(),
                    release
                ));
                return Ok(());
            }

            let runner = SystemRunner;
            let builder = PlatformBuilder::new(&runner, ctx.root(), ctx.config.ios.clone());
            let artifact = builder.build_ios(&options, &release)?;
            ui::display_success(&format!("Built {}", artifact.path.display()));
            Ok(())
        }

        IosCommand::UploadTestflight { app_name } => {
            let app_name = require(&app_name, "app_name")?;
            let artifact = Artifact::ios(app_name).resolve(ctx.root());

            if ctx.dry_run {
                ui::display_status(&format!(
                    "Would upload {} to TestFlight",
                    artifact.path.display()
                ));
                return Ok(());
            }

            let runner = SystemRunner;
            let publisher = TestFlightPublisher::new(&runner, ctx.app_store_credentials()?);
            publish(ctx, &publisher, Artifact::ios(app_name))
        }

        IosCommand::UploadSymbols { build } => {
            let options = ios_build_options(build);
            options.validate()?;
            let app_name = require(&options.app_name, "app_name")?;
            let scheme = require(&options.scheme, "scheme")?;
            let symbols: PathBuf = ctx.root().join(ios_symbols_path(app_name));
            let config: PathBuf = ctx.root().join(crashlytics_config_path(scheme));

            if ctx.dry_run {
                ui::display_status(&format!(
                    "Would upload {} with {}",
                    symbols.display(),
                    config.display()
                ));
                return Ok(());
            }

            let runner = SystemRunner;
            symbols_uploader(ctx, &runner).upload(&symbols, &config)?;
            ui::display_success("Uploaded dSYMs to Crashlytics");
            Ok(())
        }

        IosCommand::Deploy {
            build,
            bundle_id,
            message,
        } => {
            let options = IosOptions {
                bundle_id,
                message: message.unwrap_or_else(|| TESTFLIGHT_MESSAGE.to_string()),
                build: ios_build_options(build),
            };
            options.validate()?;
            let app = require(&options.build.app_name, "app_name")?;

            if ctx.dry_run {
                let release = ctx.release_version(None)?;
                ui::display_plan(PipelineKind::TestFlight, &release.name, app);
                return Ok(());
            }
            if !ctx.confirm(&format!("{} to TestFlight", app))? {
                return Ok(());
            }

            let client = ctx.client()?;
            let creds = ctx.app_store_credentials()?;
            let source = TestFlightSource::new(client.clone(), creds.clone());

            let runner = SystemRunner;
            let publisher = TestFlightPublisher::new(&runner, creds);
            let uploader = symbols_uploader(ctx, &runner);
            let repo = ctx.open_repo()?;
            let webhook = HttpWebhook::new(client);
            let pipeline = Pipeline::new(
                &ctx.config,
                &runner,
                &repo,
                &webhook,
                credentials::webhook_url(&ctx.config.credentials),
            );
            finish(pipeline.deploy_testflight(&options, &source, &publisher, &uploader)?)
        }
    }
}
