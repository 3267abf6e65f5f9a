//! The collection pass: from cluster builds to completed commit-time metrics.
//!
//! A pass walks namespaces, then applications within a namespace, then builds within an
//! application, strictly in sequence. Every build is processed inside its own recovery
//! boundary: whatever goes wrong with one build is logged and that build is dropped, but its
//! siblings are unaffected.

use std::sync::Arc;
use tracing::{debug, debug_span, error, info, warn, Instrument};

use crate::build::{Build, StrategyKind};
use crate::cache::CommitTimeCache;
use crate::cluster::{self, ClusterClient};
use crate::metric::{CommitMetric, Draft};
use crate::nested::MissingPath;
use crate::provider::{self, CommitTimeLookup};
use crate::readiness::{self, Readiness};
use crate::repo_url::{resolve_pipeline_repo_url, with_git_suffix};
use crate::util::{Counted, ErrorChain};

// -------------------------------------------------------------------------------------------------
// CollectError
// -------------------------------------------------------------------------------------------------
/// Why one build did not yield a metric.
#[derive(Clone, Debug, thiserror::Error)]
pub enum CollectError {
    #[error(transparent)]
    MissingPath(#[from] MissingPath),

    #[error("could not resolve commit time for {commit}")]
    UnresolvedCommitTime { commit: String },

    #[error("malformed build: {0}")]
    MalformedBuild(String),

    #[error("commit time lookup failed: {0}")]
    UpstreamFailure(#[source] Arc<provider::Error>),

    #[error("build configuration lookup failed: {0}")]
    Cluster(#[source] Arc<cluster::Error>),

    #[error("metric is incomplete")]
    Incomplete,
}

impl CollectError {
    /// Is this a failure, as opposed to data that is merely missing?
    pub fn is_failure(&self) -> bool {
        matches!(self, Self::MalformedBuild(_) | Self::UpstreamFailure(_) | Self::Cluster(_))
    }
}

impl From<provider::Error> for CollectError {
    fn from(e: provider::Error) -> Self {
        Self::UpstreamFailure(Arc::new(e))
    }
}

impl From<cluster::Error> for CollectError {
    fn from(e: cluster::Error) -> Self {
        Self::Cluster(Arc::new(e))
    }
}

// -------------------------------------------------------------------------------------------------
// Outcome
// -------------------------------------------------------------------------------------------------
/// The terminal state of one build's processing.
#[derive(Debug)]
pub enum Outcome {
    /// Not eligible yet, or never will be; not an error
    Skipped(Readiness),
    Emitted(CommitMetric),
    Rejected(Vec<CollectError>),
}

// -------------------------------------------------------------------------------------------------
// Collector
// -------------------------------------------------------------------------------------------------
pub struct Collector {
    cluster: Box<dyn ClusterClient>,
    lookup: Box<dyn CommitTimeLookup>,
    app_label: String,
    cache: CommitTimeCache,
}

impl Collector {
    pub fn new(
        cluster: Box<dyn ClusterClient>,
        lookup: Box<dyn CommitTimeLookup>,
        app_label: &str,
    ) -> Self {
        Collector {
            cluster,
            lookup,
            app_label: app_label.to_string(),
            cache: CommitTimeCache::new(),
        }
    }

    pub fn cache(&self) -> &CommitTimeCache {
        &self.cache
    }

    /// Run one collection pass over `namespaces`, or over every namespace if `None`.
    ///
    /// Only namespace discovery can fail the pass. A namespace whose builds cannot be listed is
    /// logged and skipped.
    pub async fn collect_all(
        &mut self,
        namespaces: Option<&[String]>,
    ) -> cluster::Result<Vec<CommitMetric>> {
        let namespaces = match namespaces {
            Some(namespaces) => namespaces.to_vec(),
            None => {
                info!("No namespaces specified, watching all namespaces");
                self.cluster.list_namespaces().await?
            }
        };
        debug!("Watching namespaces: {}", namespaces.join(", "));

        let mut metrics = Vec::new();
        for namespace in &namespaces {
            let span = debug_span!("namespace", name = namespace.as_str());
            metrics.extend(self.collect_namespace(namespace).instrument(span).await);
        }
        debug!(
            "Collected {} from {}",
            Counted::regular(metrics.len(), "metric"),
            Counted::regular(namespaces.len(), "namespace")
        );
        Ok(metrics)
    }

    async fn collect_namespace(&mut self, namespace: &str) -> Vec<CommitMetric> {
        debug!("Searching for builds with label {} in namespace {namespace}", self.app_label);
        let builds = match self.cluster.list_builds(namespace, &self.app_label).await {
            Ok(builds) => builds,
            Err(e) => {
                error!("Failed to list builds in namespace {namespace}: {e}");
                return Vec::new();
            }
        };

        let mut metrics = Vec::new();
        for app in app_names(&builds, &self.app_label) {
            let app_builds: Vec<&Build> = builds
                .iter()
                .filter(|b| b.label(&self.app_label).is_ok_and(|a| a == app))
                .collect();
            metrics.extend(self.collect_app(namespace, &app, &app_builds).await);
        }
        metrics
    }

    async fn collect_app(
        &mut self,
        namespace: &str,
        app: &str,
        builds: &[&Build],
    ) -> Vec<CommitMetric> {
        let mut pipeline_builds = Vec::new();
        let mut artifact_builds = Vec::new();
        for build in builds {
            match build.strategy_kind() {
                StrategyKind::Pipeline => pipeline_builds.push((*build).clone()),
                StrategyKind::Artifact => artifact_builds.push(*build),
                StrategyKind::Other => debug!(
                    "Ignoring build {namespace}/{} with strategy {:?}",
                    build.name().unwrap_or("<unnamed>"),
                    build.strategy_type()
                ),
            }
        }

        // assume one repository per app
        let repo_url = resolve_pipeline_repo_url(&pipeline_builds);
        debug!("Repo URL for app {app} is currently {repo_url:?}");

        let mut metrics = Vec::new();
        for build in artifact_builds {
            let build_name = build.name().unwrap_or("<unnamed>");
            match self.process_build(namespace, app, repo_url.as_deref(), build).await {
                Outcome::Emitted(metric) => {
                    debug!("Adding metric for app {app}");
                    metrics.push(metric);
                }
                Outcome::Skipped(_) => {}
                Outcome::Rejected(errors) => report_rejected(namespace, app, build_name, &errors),
            }
        }
        metrics
    }

    /// Process a single artifact-producing build into its terminal state.
    pub async fn process_build(
        &mut self,
        namespace: &str,
        app: &str,
        app_repo_url: Option<&str>,
        build: &Build,
    ) -> Outcome {
        let build_name = build.name().unwrap_or("<unnamed>");
        let readiness = readiness::check(build.phase().as_ref(), build.image_digest().is_ok());
        match &readiness {
            Readiness::Ready => {}
            Readiness::Terminated(phase) => {
                debug!("Build {namespace}/{build_name} had status {phase}, skipping");
                return Outcome::Skipped(readiness);
            }
            Readiness::InProgress(phase) => {
                debug!(
                    "Build {namespace}/{build_name} has status {phase} and doesn't have an \
                     image_hash yet, skipping"
                );
                return Outcome::Skipped(readiness);
            }
        }

        let draft = match Draft::from_build(namespace, app, &self.app_label, build) {
            Ok(draft) => draft,
            Err(e) => return Outcome::Rejected(vec![e]),
        };

        let repo_url = match self.repo_url_for(app_repo_url, build).await {
            Ok(repo_url) => repo_url,
            Err(e) => return Outcome::Rejected(vec![e]),
        };
        let draft = draft.with_repo_url(repo_url);

        let draft = match self.cache.resolve(draft, self.lookup.as_ref()).await {
            Ok(draft) => draft,
            Err(e) => return Outcome::Rejected(vec![e.into()]),
        };

        match draft.finish() {
            Ok(metric) => Outcome::Emitted(metric),
            Err(errors) => Outcome::Rejected(errors),
        }
    }

    /// The repository URL for `build`: the app-wide URL if there is one, then the build's own
    /// source, then its BuildConfig's source with a `.git` suffix.
    async fn repo_url_for(
        &self,
        app_repo_url: Option<&str>,
        build: &Build,
    ) -> Result<Option<String>, CollectError> {
        if let Some(url) = app_repo_url {
            return Ok(Some(url.to_string()));
        }
        if let Some(url) = build.source_git_uri() {
            return Ok(Some(url.to_string()));
        }

        let (namespace, name) = build
            .config_ref()
            .map_err(|e| CollectError::MalformedBuild(e.to_string()))?;
        match self.cluster.get_build_config(namespace, name).await? {
            Some(build_config) => Ok(build_config.source_git_uri().map(with_git_suffix)),
            None => {
                debug!("BuildConfig {namespace}/{name} not found");
                Ok(None)
            }
        }
    }
}

/// The distinct values of the `app_label` label across `builds`, in order of first occurrence.
pub fn app_names(builds: &[Build], app_label: &str) -> Vec<String> {
    let mut apps: Vec<String> = Vec::new();
    for build in builds {
        if let Ok(app) = build.label(app_label) {
            if !apps.iter().any(|a| a == app) {
                apps.push(app.to_string());
            }
        }
    }
    apps
}

/// Log why a build was rejected: failures at error level, missing data as one warning.
fn report_rejected(namespace: &str, app: &str, build_name: &str, errors: &[CollectError]) {
    let (failures, missing): (Vec<&CollectError>, Vec<&CollectError>) =
        errors.iter().partition(|e| e.is_failure());

    for e in failures {
        error!(
            "Cannot collect metrics from build {namespace}/{build_name} in app {app}: {}",
            ErrorChain(e)
        );
    }
    if !missing.is_empty() {
        let reasons: Vec<String> = missing.iter().map(|e| e.to_string()).collect();
        warn!(
            "Missing data for CommitTime metric from Build {namespace}/{build_name} \
             in app {app}: {}",
            reasons.join("; ")
        );
    }
}
