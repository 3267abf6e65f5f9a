use async_trait::async_trait;
use chrono::{DateTime, FixedOffset};
use url::Url;

use super::models::GitLabCommit;
use super::{apply_commit_time, lookup_target, parse_commit_time, Client, CommitTimeLookup, Result};
use crate::metric::CommitMetric;
use crate::repo_url::RepoUrl;
use crate::rest::{parse_api_url, url_from_path_parts_and_params};

/// Commit times from the GitLab v4 API.
///
/// Without a configured server, the host of each repository URL is queried.
pub struct GitLab {
    client: Client,
    server: Option<Url>,
}

impl GitLab {
    pub fn new(client: Client, server: Option<Url>) -> Self {
        GitLab { client, server }
    }

    async fn commit_time(
        &self,
        repo: &RepoUrl,
        commit: &str,
    ) -> Result<Option<DateTime<FixedOffset>>> {
        let server = match &self.server {
            Some(server) => server.clone(),
            None => parse_api_url(&repo.web_base())?,
        };
        // projects are addressed by their URL-encoded full path
        let project = repo.full_name().replace('/', "%2F");
        let parts = ["api", "v4", "projects", project.as_str(), "repository", "commits", commit];
        let url = url_from_path_parts_and_params(server, &parts, &[])?;

        let Some(response) = self.client.get_json::<GitLabCommit>(url).await? else {
            return Ok(None);
        };
        response
            .committed_date
            .map(|date| parse_commit_time(commit, &date))
            .transpose()
    }
}

#[async_trait]
impl CommitTimeLookup for GitLab {
    fn name(&self) -> &'static str {
        "GitLab"
    }

    async fn resolve(&self, metric: CommitMetric) -> Result<CommitMetric> {
        let Some((repo, commit)) = lookup_target(&metric) else {
            return Ok(metric);
        };
        let time = self.commit_time(&repo, &commit).await?;
        Ok(apply_commit_time(metric, time))
    }
}
