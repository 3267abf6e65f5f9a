use async_trait::async_trait;
use chrono::{DateTime, FixedOffset};
use url::Url;

use super::models::{BitbucketCloudCommit, BitbucketServerCommit};
use super::{
    apply_commit_time, lookup_target, parse_commit_time, Client, CommitTimeLookup, Error, Result,
};
use crate::metric::CommitMetric;
use crate::repo_url::RepoUrl;
use crate::rest::{parse_api_url, url_from_path_parts_and_params};

/// Commit times from Bitbucket.
///
/// Repositories on `bitbucket.org` go to the Cloud 2.0 API; any other host is assumed to be a
/// Bitbucket Server, queried through its REST 1.0 API.
pub struct Bitbucket {
    client: Client,
    /// Overrides both the Cloud API base and the Server host
    api: Option<Url>,
}

impl Bitbucket {
    pub const CLOUD_HOST: &'static str = "bitbucket.org";
    pub const CLOUD_API: &'static str = "https://api.bitbucket.org/2.0";

    pub fn new(client: Client, api: Option<Url>) -> Self {
        Bitbucket { client, api }
    }

    async fn commit_time(
        &self,
        repo: &RepoUrl,
        commit: &str,
    ) -> Result<Option<DateTime<FixedOffset>>> {
        if repo.host == Self::CLOUD_HOST {
            self.cloud_commit_time(repo, commit).await
        } else {
            self.server_commit_time(repo, commit).await
        }
    }

    async fn cloud_commit_time(
        &self,
        repo: &RepoUrl,
        commit: &str,
    ) -> Result<Option<DateTime<FixedOffset>>> {
        let api = match &self.api {
            Some(api) => api.clone(),
            None => parse_api_url(Self::CLOUD_API)?,
        };
        let parts = ["repositories", repo.group.as_str(), repo.project.as_str(), "commit", commit];
        let url = url_from_path_parts_and_params(api, &parts, &[])?;

        let Some(response) = self.client.get_json::<BitbucketCloudCommit>(url).await? else {
            return Ok(None);
        };
        response.date.map(|date| parse_commit_time(commit, &date)).transpose()
    }

    async fn server_commit_time(
        &self,
        repo: &RepoUrl,
        commit: &str,
    ) -> Result<Option<DateTime<FixedOffset>>> {
        let server = match &self.api {
            Some(api) => api.clone(),
            None => parse_api_url(&repo.web_base())?,
        };
        // clone URLs on Bitbucket Server look like https://host/scm/PROJECT/repo.git
        let project = repo.group.strip_prefix("scm/").unwrap_or(&repo.group);
        let parts = [
            "rest",
            "api",
            "1.0",
            "projects",
            project,
            "repos",
            repo.project.as_str(),
            "commits",
            commit,
        ];
        let url = url_from_path_parts_and_params(server, &parts, &[])?;

        let Some(response) = self.client.get_json::<BitbucketServerCommit>(url).await? else {
            return Ok(None);
        };
        response
            .committer_timestamp
            .map(|millis| {
                DateTime::from_timestamp_millis(millis)
                    .map(|time| time.fixed_offset())
                    .ok_or_else(|| Error::InvalidCommitTime {
                        commit: commit.to_string(),
                        value: millis.to_string(),
                    })
            })
            .transpose()
    }
}

#[async_trait]
impl CommitTimeLookup for Bitbucket {
    fn name(&self) -> &'static str {
        "Bitbucket"
    }

    async fn resolve(&self, metric: CommitMetric) -> Result<CommitMetric> {
        let Some((repo, commit)) = lookup_target(&metric) else {
            return Ok(metric);
        };
        let time = self.commit_time(&repo, &commit).await?;
        Ok(apply_commit_time(metric, time))
    }
}
