//! Resolving a commit hash to the time it was committed.
//!
//! Each source-code host gets its own [`CommitTimeLookup`] implementation. The collector only
//! sees the trait; which implementation is used is decided once, at configuration time, by
//! [`from_config`].

use async_trait::async_trait;
use chrono::{DateTime, FixedOffset};
use secrecy::SecretString;
use std::path::PathBuf;
use std::str::FromStr;
use tracing::debug;

mod auth;
mod bitbucket;
mod client;
mod client_builder;
mod error;
mod gitea;
mod github;
mod gitlab;
mod local;
mod models;

pub use auth::Auth;
pub use bitbucket::Bitbucket;
pub use client::Client;
pub use client_builder::ClientBuilder;
pub use error::Error;
pub use gitea::Gitea;
pub use github::GitHub;
pub use gitlab::GitLab;
pub use local::LocalGit;

use crate::metric::CommitMetric;
use crate::repo_url::RepoUrl;
use crate::rest::parse_api_url;

pub type Result<T> = std::result::Result<T, Error>;

// -------------------------------------------------------------------------------------------------
// CommitTimeLookup
// -------------------------------------------------------------------------------------------------
/// Looks up when a commit was made.
///
/// Given a metric with `repo_url` and `commit_hash` set, `resolve` returns it with `commit_time`
/// and `commit_timestamp` filled in. An ordinary "not found" is not an error: the metric is
/// returned without a commit time. Errors are reserved for transport and host failures.
#[async_trait]
pub trait CommitTimeLookup: Send + Sync {
    /// A short name for log messages
    fn name(&self) -> &'static str;

    async fn resolve(&self, metric: CommitMetric) -> Result<CommitMetric>;
}

/// The repository and commit to look up for `metric`, if it has enough information.
fn lookup_target(metric: &CommitMetric) -> Option<(RepoUrl, String)> {
    let commit = metric.commit_hash.as_deref()?;
    let Some(repo_url) = metric.repo_url.as_deref() else {
        debug!("Build {} has no repository URL; cannot look up commit {commit}", metric.build_name);
        return None;
    };
    match RepoUrl::from_str(repo_url) {
        Ok(repo) => Some((repo, commit.to_string())),
        Err(e) => {
            debug!("Cannot look up commit {commit} in {repo_url:?}: {e}");
            None
        }
    }
}

fn parse_commit_time(commit: &str, value: &str) -> Result<DateTime<FixedOffset>> {
    DateTime::parse_from_rfc3339(value).map_err(|_| Error::InvalidCommitTime {
        commit: commit.to_string(),
        value: value.to_string(),
    })
}

fn apply_commit_time(metric: CommitMetric, time: Option<DateTime<FixedOffset>>) -> CommitMetric {
    match time {
        Some(time) => metric.with_commit_time(time),
        None => {
            debug!(
                "No commit time found for {} in {}",
                metric.commit_hash.as_deref().unwrap_or_default(),
                metric.repo_url.as_deref().unwrap_or_default()
            );
            metric
        }
    }
}

// -------------------------------------------------------------------------------------------------
// configuration
// -------------------------------------------------------------------------------------------------
#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub enum GitProvider {
    GitHub,
    GitLab,
    Bitbucket,
    Gitea,
    Local,
}

impl FromStr for GitProvider {
    type Err = String;

    fn from_str(s: &str) -> std::result::Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "github" => Ok(Self::GitHub),
            "gitlab" => Ok(Self::GitLab),
            "bitbucket" => Ok(Self::Bitbucket),
            "gitea" => Ok(Self::Gitea),
            "local" => Ok(Self::Local),
            other => Err(format!(
                "unsupported git provider {other:?}; \
                 expected one of github, gitlab, bitbucket, gitea, local"
            )),
        }
    }
}

impl std::fmt::Display for GitProvider {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let s = match self {
            Self::GitHub => "github",
            Self::GitLab => "gitlab",
            Self::Bitbucket => "bitbucket",
            Self::Gitea => "gitea",
            Self::Local => "local",
        };
        f.write_str(s)
    }
}

/// Everything needed to construct a commit-time provider.
pub struct ProviderConfig {
    pub provider: GitProvider,
    pub username: Option<String>,
    pub token: Option<SecretString>,
    /// API host or base URL; each provider has its own default
    pub api: Option<String>,
    pub tls_verify: bool,
    /// Root directory of local clones, for [`GitProvider::Local`]
    pub local_repos_dir: Option<PathBuf>,
}

/// Construct the commit-time provider selected by `config`.
pub fn from_config(config: ProviderConfig) -> Result<Box<dyn CommitTimeLookup>> {
    let ignore_certs = !config.tls_verify;
    let api_url = config.api.as_deref().map(parse_api_url).transpose()?;

    let lookup: Box<dyn CommitTimeLookup> = match config.provider {
        GitProvider::GitHub => {
            let auth = config.token.map_or(Auth::Unauthenticated, Auth::Bearer);
            let client = ClientBuilder::new()
                .auth(auth)
                .accept("application/vnd.github+json")
                .ignore_certs(ignore_certs)
                .build()?;
            let api_url = match api_url {
                Some(url) => url,
                None => parse_api_url(GitHub::DEFAULT_API)?,
            };
            Box::new(GitHub::new(client, api_url))
        }

        GitProvider::GitLab => {
            let auth = config.token.map_or(Auth::Unauthenticated, Auth::PrivateToken);
            let client = ClientBuilder::new().auth(auth).ignore_certs(ignore_certs).build()?;
            Box::new(GitLab::new(client, api_url))
        }

        GitProvider::Bitbucket => {
            let auth = match (config.username, config.token) {
                (Some(username), Some(password)) => Auth::Basic { username, password },
                (None, Some(_)) => {
                    return Err(Error::Config(
                        "Bitbucket requires a username along with the token".to_string(),
                    ))
                }
                (_, None) => Auth::Unauthenticated,
            };
            let client = ClientBuilder::new().auth(auth).ignore_certs(ignore_certs).build()?;
            Box::new(Bitbucket::new(client, api_url))
        }

        GitProvider::Gitea => {
            let auth = config.token.map_or(Auth::Unauthenticated, Auth::Token);
            let client = ClientBuilder::new().auth(auth).ignore_certs(ignore_certs).build()?;
            Box::new(Gitea::new(client, api_url))
        }

        GitProvider::Local => {
            let root = config.local_repos_dir.ok_or_else(|| {
                Error::Config("the local provider requires a repository directory".to_string())
            })?;
            Box::new(LocalGit::new(root))
        }
    };
    Ok(lookup)
}
