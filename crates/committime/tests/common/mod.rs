//! Integration Test Utilities and Common Code

#![allow(dead_code)]

use async_trait::async_trait;
use chrono::DateTime;
use serde_json::{json, Value};
use std::collections::{BTreeMap, HashMap};
use std::io;
use std::sync::{Arc, Mutex};
use tracing_subscriber::fmt::MakeWriter;

use committime::build::{Build, BuildConfig};
use committime::cluster::{self, ClusterClient};
use committime::metric::CommitMetric;
use committime::provider::{self, CommitTimeLookup};

pub const APP_LABEL: &str = "app.kubernetes.io/name";

// -------------------------------------------------------------------------------------------------
// builds
// -------------------------------------------------------------------------------------------------
/// A completed source build of `app` at `commit` that produced `sha256:ff00`.
pub fn artifact_build(name: &str, app: &str, commit: &str) -> Value {
    json!({
        "metadata": {
            "name": name,
            "labels": { APP_LABEL: app, "buildconfig": app },
        },
        "spec": {
            "strategy": { "type": "Source" },
            "revision": { "git": { "commit": commit, "author": { "name": "Jo" } } },
        },
        "status": {
            "phase": "Complete",
            "config": { "namespace": "ns1", "name": app },
            "output": { "to": { "imageDigest": "sha256:ff00" } },
        },
    })
}

pub fn with_phase(mut build: Value, phase: &str) -> Value {
    build["status"]["phase"] = json!(phase);
    build
}

pub fn without_image(mut build: Value) -> Value {
    if let Some(status) = build["status"].as_object_mut() {
        status.remove("output");
    }
    build
}

/// An [`artifact_build`] whose source is `https://example.com/org/repo.git`.
pub fn sourced_build(name: &str, app: &str, commit: &str) -> Value {
    with_source(artifact_build(name, app, commit), "https://example.com/org/repo.git")
}

pub fn with_source(mut build: Value, uri: &str) -> Value {
    build["spec"]["source"] = json!({ "git": { "uri": uri } });
    build
}

pub fn without_config_ref(mut build: Value) -> Value {
    if let Some(status) = build["status"].as_object_mut() {
        status.remove("config");
    }
    build
}

/// A pipeline build of `app` whose strategy declares the given environment.
pub fn pipeline_build(name: &str, app: &str, env: &[(&str, &str)]) -> Value {
    let env: Vec<Value> = env.iter().map(|(k, v)| json!({ "name": k, "value": v })).collect();
    json!({
        "metadata": { "name": name, "labels": { APP_LABEL: app } },
        "spec": {
            "strategy": { "type": "JenkinsPipeline", "jenkinsPipelineStrategy": { "env": env } },
        },
        "status": { "phase": "Complete" },
    })
}

pub fn build_config(uri: &str) -> Value {
    json!({ "spec": { "source": { "git": { "uri": uri } } } })
}

// -------------------------------------------------------------------------------------------------
// FakeCluster
// -------------------------------------------------------------------------------------------------
/// An in-memory cluster.
#[derive(Default)]
pub struct FakeCluster {
    pub builds: BTreeMap<String, Vec<Value>>,
    pub build_configs: HashMap<(String, String), Value>,
    /// Namespaces whose build listing fails
    pub broken_namespaces: Vec<String>,
    /// Make namespace discovery fail
    pub broken_discovery: bool,
    pub list_builds_calls: Arc<Mutex<Vec<String>>>,
}

impl FakeCluster {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn namespace(mut self, namespace: &str, builds: Vec<Value>) -> Self {
        self.builds.insert(namespace.to_string(), builds);
        self
    }

    pub fn build_config(mut self, namespace: &str, name: &str, raw: Value) -> Self {
        self.build_configs.insert((namespace.to_string(), name.to_string()), raw);
        self
    }
}

fn fake_failure(what: &str) -> cluster::Error {
    cluster::Error::Malformed(format!("{what} is unavailable"))
}

#[async_trait]
impl ClusterClient for FakeCluster {
    async fn list_namespaces(&self) -> cluster::Result<Vec<String>> {
        if self.broken_discovery {
            return Err(fake_failure("namespace list"));
        }
        Ok(self.builds.keys().cloned().collect())
    }

    async fn list_builds(
        &self,
        namespace: &str,
        label_selector: &str,
    ) -> cluster::Result<Vec<Build>> {
        self.list_builds_calls.lock().unwrap().push(namespace.to_string());
        if self.broken_namespaces.iter().any(|n| n == namespace) {
            return Err(fake_failure("build list"));
        }
        let builds = self.builds.get(namespace).cloned().unwrap_or_default();
        Ok(builds
            .into_iter()
            .map(Build::new)
            .filter(|b| b.label(label_selector).is_ok())
            .collect())
    }

    async fn get_build_config(
        &self,
        namespace: &str,
        name: &str,
    ) -> cluster::Result<Option<BuildConfig>> {
        Ok(self
            .build_configs
            .get(&(namespace.to_string(), name.to_string()))
            .cloned()
            .map(BuildConfig::new))
    }
}

// -------------------------------------------------------------------------------------------------
// FakeLookup
// -------------------------------------------------------------------------------------------------
/// Resolves commits from a fixed table, recording every request.
#[derive(Clone, Default)]
pub struct FakeLookup {
    pub times: HashMap<String, String>,
    /// Commits whose lookup fails outright
    pub failing: Vec<String>,
    /// `(commit, repo_url)` of every request
    pub requests: Arc<Mutex<Vec<(String, Option<String>)>>>,
}

impl FakeLookup {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn commit(mut self, commit: &str, time: &str) -> Self {
        self.times.insert(commit.to_string(), time.to_string());
        self
    }

    pub fn failing(mut self, commit: &str) -> Self {
        self.failing.push(commit.to_string());
        self
    }

    pub fn request_count(&self) -> usize {
        self.requests.lock().unwrap().len()
    }

    pub fn requested_repo_urls(&self) -> Vec<Option<String>> {
        self.requests.lock().unwrap().iter().map(|(_, url)| url.clone()).collect()
    }
}

#[async_trait]
impl CommitTimeLookup for FakeLookup {
    fn name(&self) -> &'static str {
        "fake"
    }

    async fn resolve(&self, metric: CommitMetric) -> provider::Result<CommitMetric> {
        let commit = metric.commit_hash.clone().unwrap_or_default();
        self.requests.lock().unwrap().push((commit.clone(), metric.repo_url.clone()));

        if self.failing.contains(&commit) {
            return Err(provider::Error::Config("upstream is down".to_string()));
        }
        match self.times.get(&commit) {
            Some(time) => {
                let time =
                    DateTime::parse_from_rfc3339(time).expect("fake commit time should parse");
                Ok(metric.with_commit_time(time))
            }
            None => Ok(metric),
        }
    }
}

// -------------------------------------------------------------------------------------------------
// CapturedLogs
// -------------------------------------------------------------------------------------------------
/// A `tracing` writer that keeps everything written to it.
#[derive(Clone, Default)]
pub struct CapturedLogs(Arc<Mutex<Vec<u8>>>);

impl CapturedLogs {
    /// Install a subscriber writing to a new buffer as the default for the current thread.
    pub fn install() -> (Self, tracing::subscriber::DefaultGuard) {
        let logs = CapturedLogs::default();
        let subscriber = tracing_subscriber::fmt()
            .with_writer(logs.clone())
            .with_max_level(tracing::Level::DEBUG)
            .with_ansi(false)
            .without_time()
            .finish();
        let guard = tracing::subscriber::set_default(subscriber);
        (logs, guard)
    }

    pub fn contents(&self) -> String {
        String::from_utf8_lossy(&self.0.lock().unwrap()).into_owned()
    }

    /// The lines logged at `level`, e.g. `"WARN"`.
    pub fn lines_at(&self, level: &str) -> Vec<String> {
        self.contents()
            .lines()
            .filter(|l| l.trim_start().starts_with(level))
            .map(str::to_string)
            .collect()
    }
}

impl io::Write for CapturedLogs {
    fn write(&mut self, buf: &[u8]) -> io::Result<usize> {
        self.0.lock().unwrap().extend_from_slice(buf);
        Ok(buf.len())
    }

    fn flush(&mut self) -> io::Result<()> {
        Ok(())
    }
}

impl<'a> MakeWriter<'a> for CapturedLogs {
    type Writer = CapturedLogs;

    fn make_writer(&'a self) -> Self::Writer {
        self.clone()
    }
}
