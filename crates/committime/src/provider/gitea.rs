use async_trait::async_trait;
use chrono::{DateTime, FixedOffset};
use url::Url;

use super::models::RepoCommit;
use super::{apply_commit_time, lookup_target, parse_commit_time, Client, CommitTimeLookup, Result};
use crate::metric::CommitMetric;
use crate::repo_url::RepoUrl;
use crate::rest::{parse_api_url, url_from_path_parts_and_params};

/// Commit times from the Gitea v1 API.
pub struct Gitea {
    client: Client,
    server: Option<Url>,
}

impl Gitea {
    pub fn new(client: Client, server: Option<Url>) -> Self {
        Gitea { client, server }
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
        let parts = [
            "api",
            "v1",
            "repos",
            repo.group.as_str(),
            repo.project.as_str(),
            "git",
            "commits",
            commit,
        ];
        let url = url_from_path_parts_and_params(server, &parts, &[])?;

        let Some(response) = self.client.get_json::<RepoCommit>(url).await? else {
            return Ok(None);
        };
        response
            .commit
            .committer
            .and_then(|c| c.date)
            .map(|date| parse_commit_time(commit, &date))
            .transpose()
    }
}

#[async_trait]
impl CommitTimeLookup for Gitea {
    fn name(&self) -> &'static str {
        "Gitea"
    }

    async fn resolve(&self, metric: CommitMetric) -> Result<CommitMetric> {
        let Some((repo, commit)) = lookup_target(&metric) else {
            return Ok(metric);
        };
        let time = self.commit_time(&repo, &commit).await?;
        Ok(apply_commit_time(metric, time))
    }
}
