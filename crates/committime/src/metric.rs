use chrono::{DateTime, FixedOffset};
use std::collections::BTreeMap;

use crate::build::Build;
use crate::collector::CollectError;

// -------------------------------------------------------------------------------------------------
// CommitMetric
// -------------------------------------------------------------------------------------------------
/// The commit time of one build of one application, once fully resolved.
#[derive(Clone, Debug, PartialEq)]
pub struct CommitMetric {
    pub namespace: String,
    pub app_name: String,
    pub build_name: String,
    pub build_config_name: Option<String>,
    pub commit_hash: Option<String>,
    pub committer: Option<String>,
    /// Human-readable commit time, as RFC 3339
    pub commit_time: Option<String>,
    /// Commit time in seconds since the Unix epoch
    pub commit_timestamp: Option<f64>,
    pub image_hash: Option<String>,
    pub image_location: Option<String>,
    pub repo_url: Option<String>,
    pub labels: BTreeMap<String, String>,
}

impl CommitMetric {
    pub fn new(namespace: &str, app_name: &str, build_name: &str) -> Self {
        CommitMetric {
            namespace: namespace.to_string(),
            app_name: app_name.to_string(),
            build_name: build_name.to_string(),
            build_config_name: None,
            commit_hash: None,
            committer: None,
            commit_time: None,
            commit_timestamp: None,
            image_hash: None,
            image_location: None,
            repo_url: None,
            labels: BTreeMap::new(),
        }
    }

    /// Record the commit time, setting both its readable form and its timestamp.
    pub fn with_commit_time(mut self, time: DateTime<FixedOffset>) -> Self {
        self.commit_time = Some(time.to_rfc3339());
        self.commit_timestamp = Some(time.timestamp() as f64);
        self
    }

    /// Record a commit time that was resolved earlier.
    pub fn with_cached_commit_time(mut self, commit_time: &str, commit_timestamp: f64) -> Self {
        self.commit_time = Some(commit_time.to_string());
        self.commit_timestamp = Some(commit_timestamp);
        self
    }

    /// Does this metric carry every field needed to emit a sample?
    pub fn is_complete(&self) -> bool {
        self.commit_hash.is_some() && self.image_hash.is_some() && self.commit_timestamp.is_some()
    }
}

// -------------------------------------------------------------------------------------------------
// Draft
// -------------------------------------------------------------------------------------------------
/// A metric in the middle of collection, together with the problems found so far.
///
/// Each stage consumes a `Draft` and returns the next one; problems accumulate instead of
/// aborting, so that one warning can report everything that was wrong with a build.
#[derive(Clone, Debug)]
pub struct Draft {
    pub metric: CommitMetric,
    pub errors: Vec<CollectError>,
}

impl Draft {
    /// Populate a metric from the fields of `build`.
    ///
    /// A missing commit hash, image digest, or app label is recorded as an error; the other
    /// fields are optional.
    pub fn from_build(
        namespace: &str,
        app: &str,
        app_label: &str,
        build: &Build,
    ) -> Result<Self, CollectError> {
        let build_name = build.name().map_err(|e| CollectError::MalformedBuild(e.to_string()))?;
        let mut errors = Vec::new();
        let mut metric = CommitMetric::new(namespace, app, build_name);

        match build.label(app_label) {
            Ok(name) => metric.app_name = name.to_string(),
            Err(e) => errors.push(CollectError::MissingPath(e)),
        }
        match build.commit_hash() {
            Ok(hash) => metric.commit_hash = Some(hash.to_string()),
            Err(e) => errors.push(CollectError::MissingPath(e)),
        }
        match build.image_digest() {
            Ok(digest) => metric.image_hash = Some(digest.to_string()),
            Err(e) => errors.push(CollectError::MissingPath(e)),
        }

        metric.build_config_name = build
            .build_config_label()
            .or_else(|| build.config_ref().ok().map(|(_, name)| name))
            .map(str::to_string);
        metric.committer = build.committer().map(str::to_string);
        metric.image_location = build.image_location().map(str::to_string);
        metric.labels = build.labels();

        Ok(Draft { metric, errors })
    }

    pub fn with_repo_url(mut self, repo_url: Option<String>) -> Self {
        self.metric.repo_url = repo_url;
        self
    }

    pub fn push_error(mut self, error: CollectError) -> Self {
        self.errors.push(error);
        self
    }

    /// Finish the draft: the completed metric, or every reason it cannot be emitted.
    pub fn finish(self) -> Result<CommitMetric, Vec<CollectError>> {
        if self.errors.is_empty() && self.metric.is_complete() {
            Ok(self.metric)
        } else if self.errors.is_empty() {
            Err(vec![CollectError::Incomplete])
        } else {
            Err(self.errors)
        }
    }
}
