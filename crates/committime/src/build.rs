use serde_json::Value;
use std::collections::BTreeMap;

use crate::nested::{get_nested, get_nested_str, MissingPath, NestedPath};

// -------------------------------------------------------------------------------------------------
// StrategyKind
// -------------------------------------------------------------------------------------------------
/// How a build produces its output, from `spec.strategy.type`.
#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub enum StrategyKind {
    /// Delegates to an external pipeline runner; carries repository context but no image
    Pipeline,

    /// Produces a container image (`Source`, `Binary`, or `Docker`)
    Artifact,

    /// Anything else; ignored by the collector
    Other,
}

impl StrategyKind {
    pub fn from_strategy_type(strategy_type: &str) -> Self {
        match strategy_type {
            "JenkinsPipeline" => Self::Pipeline,
            "Source" | "Binary" | "Docker" => Self::Artifact,
            _ => Self::Other,
        }
    }
}

// -------------------------------------------------------------------------------------------------
// BuildPhase
// -------------------------------------------------------------------------------------------------
/// The lifecycle phase of a build, from `status.phase`.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum BuildPhase {
    New,
    Pending,
    Running,
    Complete,
    Failed,
    Error,
    Cancelled,
    Unknown(String),
}

impl BuildPhase {
    pub fn parse(phase: &str) -> Self {
        match phase {
            "New" => Self::New,
            "Pending" => Self::Pending,
            "Running" => Self::Running,
            "Complete" => Self::Complete,
            "Failed" => Self::Failed,
            "Error" => Self::Error,
            "Cancelled" => Self::Cancelled,
            other => Self::Unknown(other.to_string()),
        }
    }
}

impl std::fmt::Display for BuildPhase {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let s = match self {
            Self::New => "New",
            Self::Pending => "Pending",
            Self::Running => "Running",
            Self::Complete => "Complete",
            Self::Failed => "Failed",
            Self::Error => "Error",
            Self::Cancelled => "Cancelled",
            Self::Unknown(s) => s,
        };
        f.write_str(s)
    }
}

// -------------------------------------------------------------------------------------------------
// EnvVar
// -------------------------------------------------------------------------------------------------
/// One `name`/`value` pair declared on a pipeline strategy.
///
/// The value is optional: entries sourced through `valueFrom` carry no literal value.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct EnvVar<'a> {
    pub name: &'a str,
    pub value: Option<&'a str>,
}

// -------------------------------------------------------------------------------------------------
// Build
// -------------------------------------------------------------------------------------------------
/// A read-only view over a `build.openshift.io/v1` Build object.
#[derive(Clone, Debug, PartialEq)]
pub struct Build(Value);

impl Build {
    pub fn new(raw: Value) -> Self {
        Build(raw)
    }

    fn str_at<P: Into<NestedPath>>(&self, path: P) -> Result<&str, MissingPath> {
        get_nested_str(&self.0, path).map_err(|e| e.named("build"))
    }

    pub fn name(&self) -> Result<&str, MissingPath> {
        self.str_at("metadata.name")
    }

    /// The metadata labels, skipping any with non-string values.
    pub fn labels(&self) -> BTreeMap<String, String> {
        string_map(get_nested(&self.0, "metadata.labels").ok())
    }

    pub fn label(&self, key: &str) -> Result<&str, MissingPath> {
        self.str_at(["metadata", "labels", key])
    }

    pub fn strategy_type(&self) -> Option<&str> {
        self.str_at("spec.strategy.type").ok()
    }

    pub fn strategy_kind(&self) -> StrategyKind {
        self.strategy_type()
            .map_or(StrategyKind::Other, StrategyKind::from_strategy_type)
    }

    pub fn phase(&self) -> Option<BuildPhase> {
        self.str_at("status.phase").ok().map(BuildPhase::parse)
    }

    pub fn commit_hash(&self) -> Result<&str, MissingPath> {
        self.str_at("spec.revision.git.commit")
    }

    pub fn committer(&self) -> Option<&str> {
        self.str_at("spec.revision.git.author.name").ok()
    }

    pub fn image_digest(&self) -> Result<&str, MissingPath> {
        self.str_at("status.output.to.imageDigest")
    }

    pub fn image_location(&self) -> Option<&str> {
        self.str_at("status.outputDockerImageReference").ok()
    }

    pub fn build_config_label(&self) -> Option<&str> {
        self.str_at("metadata.labels.buildconfig").ok()
    }

    pub fn source_git_uri(&self) -> Option<&str> {
        self.str_at("spec.source.git.uri").ok()
    }

    /// The `(namespace, name)` of the BuildConfig that spawned this build.
    pub fn config_ref(&self) -> Result<(&str, &str), MissingPath> {
        let namespace = self.str_at("status.config.namespace")?;
        let name = self.str_at("status.config.name")?;
        Ok((namespace, name))
    }

    /// The environment declared on the pipeline strategy, in declaration order.
    ///
    /// Entries without a string `name` are dropped.
    pub fn pipeline_env(&self) -> Vec<EnvVar<'_>> {
        let env = match get_nested(&self.0, "spec.strategy.jenkinsPipelineStrategy.env") {
            Ok(Value::Array(env)) => env,
            _ => return Vec::new(),
        };
        env.iter()
            .filter_map(|entry| {
                let name = entry.get("name")?.as_str()?;
                let value = entry.get("value").and_then(Value::as_str);
                Some(EnvVar { name, value })
            })
            .collect()
    }
}

// -------------------------------------------------------------------------------------------------
// BuildConfig
// -------------------------------------------------------------------------------------------------
/// A read-only view over a `build.openshift.io/v1` BuildConfig object.
#[derive(Clone, Debug, PartialEq)]
pub struct BuildConfig(Value);

impl BuildConfig {
    pub fn new(raw: Value) -> Self {
        BuildConfig(raw)
    }

    pub fn source_git_uri(&self) -> Option<&str> {
        get_nested_str(&self.0, "spec.source.git.uri").ok()
    }
}

fn string_map(value: Option<&Value>) -> BTreeMap<String, String> {
    match value {
        Some(Value::Object(map)) => map
            .iter()
            .filter_map(|(k, v)| Some((k.clone(), v.as_str()?.to_string())))
            .collect(),
        _ => BTreeMap::new(),
    }
}
