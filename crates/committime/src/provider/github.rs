use async_trait::async_trait;
use chrono::{DateTime, FixedOffset};
use tracing::debug;
use url::Url;

use super::models::RepoCommit;
use super::{apply_commit_time, lookup_target, parse_commit_time, Client, CommitTimeLookup, Result};
use crate::metric::CommitMetric;
use crate::repo_url::RepoUrl;
use crate::rest::url_from_path_parts_and_params;

/// Commit times from the GitHub REST API, or a GitHub Enterprise server given as the API URL.
pub struct GitHub {
    client: Client,
    api_url: Url,
}

impl GitHub {
    pub const DEFAULT_API: &'static str = "https://api.github.com";

    pub fn new(client: Client, api_url: Url) -> Self {
        GitHub { client, api_url }
    }

    async fn commit_time(
        &self,
        repo: &RepoUrl,
        commit: &str,
    ) -> Result<Option<DateTime<FixedOffset>>> {
        let mut parts = vec!["repos"];
        parts.extend(repo.group.split('/'));
        parts.extend([repo.project.as_str(), "commits", commit]);
        let url = url_from_path_parts_and_params(self.api_url.clone(), &parts, &[])?;

        let Some(response) = self.client.get_json::<RepoCommit>(url).await? else {
            if !self.client.is_authenticated() {
                debug!(
                    "Commit {commit} not found in {}; private repositories need a token",
                    repo.full_name()
                );
            }
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
impl CommitTimeLookup for GitHub {
    fn name(&self) -> &'static str {
        "GitHub"
    }

    async fn resolve(&self, metric: CommitMetric) -> Result<CommitMetric> {
        let Some((repo, commit)) = lookup_target(&metric) else {
            return Ok(metric);
        };
        let time = self.commit_time(&repo, &commit).await?;
        Ok(apply_commit_time(metric, time))
    }
}
