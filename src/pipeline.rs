//! Deployment pipelines
//!
//! Every lane runs the same fixed sequence:
//!
//! `resolve version → allocate build number → build → publish → [symbols] → notify → tag`
//!
//! The first hard failure aborts the run and is reported with the stage it
//! happened in. Notification is best-effort and never aborts.

use std::path::{Path, PathBuf};

use crate::build_number::{self, BuildNumberSource};
use crate::builder::PlatformBuilder;
use crate::config::Config;
use crate::domain::artifact::{crashlytics_config_path, ios_symbols_path};
use crate::domain::{Artifact, ReleaseTag, ReleaseVersion, Stage};
use crate::error::Result;
use crate::git::Repository;
use crate::notify::{NotificationDispatcher, NotifyOutcome, WebhookPoster};
use crate::options::{require, AndroidFirebaseOptions, AndroidStoreOptions, IosOptions};
use crate::publish::{ArtifactPublisher, SymbolUploader};
use crate::tagger::ReleaseTagger;
use crate::tools::CommandRunner;
use crate::ui;
use crate::version;
use crate::warnings::DeployWarning;

/// Which deployment a pipeline performs
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PipelineKind {
    PlayStore,
    Firebase,
    TestFlight,
}

impl PipelineKind {
    /// Stages in execution order
    pub fn stages(&self) -> Vec<Stage> {
        let mut stages = vec![
            Stage::ResolveVersion,
            Stage::AllocateBuildNumber,
            Stage::Build,
            Stage::Publish,
        ];
        if *self == PipelineKind::TestFlight {
            stages.push(Stage::PublishSymbols);
        }
        stages.extend([Stage::Notify, Stage::Tag]);
        stages
    }

    pub fn target(&self) -> &'static str {
        match self {
            PipelineKind::PlayStore => "Google Play",
            PipelineKind::Firebase => "Firebase App Distribution",
            PipelineKind::TestFlight => "TestFlight",
        }
    }
}

/// Outcome of a successful run
#[derive(Debug, Clone, PartialEq)]
pub struct PipelineReport {
    pub version: ReleaseVersion,
    /// Published artifact, resolved against the project root
    pub artifact: PathBuf,
    pub tag: ReleaseTag,
    pub notification: NotifyOutcome,
    pub warnings: Vec<DeployWarning>,
}

/// Collaborators shared by every lane
pub struct Pipeline<'a> {
    config: &'a Config,
    runner: &'a dyn CommandRunner,
    repo: &'a dyn Repository,
    webhook: &'a dyn WebhookPoster,
    webhook_url: Option<String>,
}

/// Platform-specific pieces of a run
struct Lane<'b> {
    kind: PipelineKind,
    app_name: &'b str,
    identifier: &'b str,
    message: &'b str,
    source: &'b dyn BuildNumberSource,
    publisher: &'b dyn ArtifactPublisher,
    symbols: Option<(&'b dyn SymbolUploader, PathBuf, PathBuf)>,
}

impl<'a> Pipeline<'a> {
    pub fn new(
        config: &'a Config,
        runner: &'a dyn CommandRunner,
        repo: &'a dyn Repository,
        webhook: &'a dyn WebhookPoster,
        webhook_url: Option<String>,
    ) -> Self {
        Pipeline {
            config,
            runner,
            repo,
            webhook,
            webhook_url,
        }
    }

    fn root(&self) -> &Path {
        &self.config.project.root
    }

    fn builder(&self) -> PlatformBuilder<'a> {
        PlatformBuilder::new(self.runner, self.root(), self.config.ios.clone())
    }

    /// Build an app bundle and ship it to a Play Store track
    pub fn deploy_play_store(
        &self,
        options: &AndroidStoreOptions,
        source: &dyn BuildNumberSource,
        publisher: &dyn ArtifactPublisher,
    ) -> Result<PipelineReport> {
        options.validate()?;

        let lane = Lane {
            kind: PipelineKind::PlayStore,
            app_name: require(&options.app_name, "app_name")?,
            identifier: require(&options.app_identifier, "app_identifier")?,
            message: &options.message,
            source,
            publisher,
            symbols: None,
        };

        self.execute(lane, |builder, version| {
            builder.build_android(&options.build, version)
        })
    }

    /// Build an APK and hand it to Firebase App Distribution testers
    pub fn deploy_firebase(
        &self,
        options: &AndroidFirebaseOptions,
        source: &dyn BuildNumberSource,
        publisher: &dyn ArtifactPublisher,
    ) -> Result<PipelineReport> {
        options.validate()?;

        let lane = Lane {
            kind: PipelineKind::Firebase,
            app_name: require(&options.app_name, "app_name")?,
            identifier: require(&options.firebase_app_id, "firebase_app_id")?,
            message: &options.message,
            source,
            publisher,
            symbols: None,
        };

        self.execute(lane, |builder, version| {
            builder.build_android(&options.build, version)
        })
    }

    /// Archive, upload to TestFlight and send dSYMs to Crashlytics
    pub fn deploy_testflight(
        &self,
        options: &IosOptions,
        source: &dyn BuildNumberSource,
        publisher: &dyn ArtifactPublisher,
        symbols: &dyn SymbolUploader,
    ) -> Result<PipelineReport> {
        options.validate()?;

        let app_name = require(&options.build.app_name, "app_name")?;
        let scheme = require(&options.build.scheme, "scheme")?;

        let lane = Lane {
            kind: PipelineKind::TestFlight,
            app_name,
            identifier: require(&options.bundle_id, "bundle_id")?,
            message: &options.message,
            source,
            publisher,
            symbols: Some((
                symbols,
                self.root().join(ios_symbols_path(app_name)),
                self.root().join(crashlytics_config_path(scheme)),
            )),
        };

        self.execute(lane, |builder, version| {
            builder.build_ios(&options.build, version)
        })
    }

    fn execute<F>(&self, lane: Lane<'_>, build: F) -> Result<PipelineReport>
    where
        F: FnOnce(&PlatformBuilder<'a>, &ReleaseVersion) -> Result<Artifact>,
    {
        let stages = lane.kind.stages();
        let total = stages.len();
        let mut step = 0;
        let mut enter = |stage: Stage| {
            step += 1;
            ui::display_stage(step, total, stage);
            stage
        };

        let stage = enter(Stage::ResolveVersion);
        let mut version = version::resolve_release_version(&self.config.project.manifest_path())
            .map_err(|e| e.at_stage(stage))?;
        log::info!("Version from manifest: {}", version.name);

        let mut warnings = Vec::new();

        let stage = enter(Stage::AllocateBuildNumber);
        let manifest_build = version.build_number;
        let allocated = build_number::allocate(lane.source, lane.identifier, &mut version)
            .map_err(|e| e.at_stage(stage))?;
        if allocated < manifest_build {
            warnings.push(DeployWarning::BuildNumberBelowManifest {
                manifest: manifest_build,
                allocated,
            });
        }

        let stage = enter(Stage::Build);
        let builder = self.builder();
        let artifact = build(&builder, &version)
            .map_err(|e| e.at_stage(stage))?
            .resolve(self.root());

        let stage = enter(Stage::Publish);
        log::info!(
            "Publishing {} to {}",
            artifact.path.display(),
            lane.publisher.describe()
        );
        lane.publisher
            .publish(&artifact)
            .map_err(|e| e.at_stage(stage))?;

        if let Some((uploader, symbols, config)) = &lane.symbols {
            let stage = enter(Stage::PublishSymbols);
            uploader
                .upload(symbols, config)
                .map_err(|e| e.at_stage(stage))?;
        }

        enter(Stage::Notify);
        let branch = self.repo.current_branch().unwrap_or_else(|e| {
            log::debug!("Cannot determine current branch: {}", e);
            None
        });
        let dispatcher = NotificationDispatcher::new(self.webhook, self.webhook_url.clone());
        let notification = dispatcher.dispatch(lane.message, &version, branch.as_deref());
        warnings.extend(DeployWarning::from_outcome(
            &notification,
            &self.config.credentials.webhook_url,
        ));

        let stage = enter(Stage::Tag);
        let tagger = ReleaseTagger::new(
            self.repo,
            self.config.git.tag_group.as_str(),
            self.config.git.remote.as_str(),
        );
        let tag = tagger
            .tag_release(lane.app_name, &version)
            .map_err(|e| e.at_stage(stage))?;

        Ok(PipelineReport {
            version,
            artifact: artifact.path,
            tag,
            notification,
            warnings,
        })
    }
}
