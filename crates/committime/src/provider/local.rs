use async_trait::async_trait;
use std::path::PathBuf;
use tracing::debug;

use super::{apply_commit_time, lookup_target, parse_commit_time, CommitTimeLookup, Result};
use crate::git_binary::Git;
use crate::metric::CommitMetric;
use crate::repo_url::RepoUrl;

/// Commit times read from local clones with the `git` binary.
///
/// A repository `https://host/group/project.git` is expected at `<root>/host/group/project`,
/// either as a bare clone with a `.git` suffix or as a working tree without one.
pub struct LocalGit {
    root: PathBuf,
    git: Git,
}

impl LocalGit {
    pub fn new(root: PathBuf) -> Self {
        LocalGit { root, git: Git::new() }
    }

    fn repo_dir(&self, repo: &RepoUrl) -> Option<PathBuf> {
        let mut base = self.root.join(&repo.host);
        base.extend(repo.group.split('/'));
        [base.join(format!("{}.git", repo.project)), base.join(&repo.project)]
            .into_iter()
            .find(|dir| dir.is_dir())
    }
}

#[async_trait]
impl CommitTimeLookup for LocalGit {
    fn name(&self) -> &'static str {
        "local git"
    }

    async fn resolve(&self, metric: CommitMetric) -> Result<CommitMetric> {
        let Some((repo, commit)) = lookup_target(&metric) else {
            return Ok(metric);
        };
        let Some(repo_dir) = self.repo_dir(&repo) else {
            debug!("No local clone of {} under {}", repo.full_name(), self.root.display());
            return Ok(metric);
        };

        let git = self.git.clone();
        let sha = commit.clone();
        let output = tokio::task::spawn_blocking(move || git.commit_time(&repo_dir, &sha)).await??;
        let time = output.map(|time| parse_commit_time(&commit, &time)).transpose()?;
        Ok(apply_commit_time(metric, time))
    }
}

#[cfg(test)]
mod test {
    use super::*;
    use pretty_assertions::assert_eq;

    fn metric(repo_url: &str) -> CommitMetric {
        let mut m = CommitMetric::new("ns1", "demo", "demo-1");
        m.commit_hash = Some("abcd123".into());
        m.repo_url = Some(repo_url.into());
        m
    }

    #[test]
    fn layout_prefers_bare_clone() {
        let root = std::env::temp_dir().join(format!("committime-local-{}", std::process::id()));
        let bare = root.join("github.com/org/app.git");
        let work = root.join("github.com/org/app");
        std::fs::create_dir_all(&bare).unwrap();
        std::fs::create_dir_all(&work).unwrap();

        let local = LocalGit::new(root.clone());
        let repo: RepoUrl = "https://github.com/org/app.git".parse().unwrap();
        assert_eq!(local.repo_dir(&repo), Some(bare.clone()));

        std::fs::remove_dir(&bare).unwrap();
        assert_eq!(local.repo_dir(&repo), Some(work));

        std::fs::remove_dir_all(&root).unwrap();
        assert_eq!(local.repo_dir(&repo), None);
    }

    #[tokio::test]
    async fn missing_clone_leaves_metric_unresolved() {
        let local = LocalGit::new(PathBuf::from("/nonexistent/committime"));
        let m = local.resolve(metric("https://github.com/org/app.git")).await.unwrap();
        assert_eq!(m.commit_timestamp, None);
    }
}
