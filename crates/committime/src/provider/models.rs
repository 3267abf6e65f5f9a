use serde::Deserialize;

// -------------------------------------------------------------------------------------------------
// ClientError
// -------------------------------------------------------------------------------------------------
#[derive(Debug, Deserialize)]
pub struct ClientError {
    #[serde(default)]
    pub message: String,
    pub documentation_url: Option<String>,
}

// -------------------------------------------------------------------------------------------------
// RepoCommit
// -------------------------------------------------------------------------------------------------
/// A commit as returned by the GitHub and Gitea commit endpoints.
#[derive(Debug, Deserialize)]
pub struct RepoCommit {
    pub sha: Option<String>,
    pub commit: CommitDetail,
}

#[derive(Debug, Deserialize)]
pub struct CommitDetail {
    pub committer: Option<Signature>,
    pub author: Option<Signature>,
}

#[derive(Debug, Deserialize)]
pub struct Signature {
    pub name: Option<String>,
    pub date: Option<String>,
}

// -------------------------------------------------------------------------------------------------
// GitLabCommit
// -------------------------------------------------------------------------------------------------
#[derive(Debug, Deserialize)]
pub struct GitLabCommit {
    pub id: Option<String>,
    pub committed_date: Option<String>,
}

// -------------------------------------------------------------------------------------------------
// Bitbucket
// -------------------------------------------------------------------------------------------------
/// A commit from the Bitbucket Cloud 2.0 API.
#[derive(Debug, Deserialize)]
pub struct BitbucketCloudCommit {
    pub hash: Option<String>,
    pub date: Option<String>,
}

/// A commit from the Bitbucket Server / Data Center 1.0 API.
#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct BitbucketServerCommit {
    pub id: Option<String>,
    /// Milliseconds since the Unix epoch
    pub committer_timestamp: Option<i64>,
}
