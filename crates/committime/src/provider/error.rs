use chrono::Duration;

use super::models;
use crate::git_binary::GitError;
use crate::rest::UrlError;

// -------------------------------------------------------------------------------------------------
// Error
// -------------------------------------------------------------------------------------------------
#[derive(Debug, thiserror::Error)]
pub enum Error {
    #[error("request was rate-limited: {}", .client_error.message)]
    RateLimited {
        /// The client error returned by the host
        client_error: models::ClientError,

        /// The duration to wait until trying again
        wait: Option<Duration>,
    },

    #[error(transparent)]
    Url(#[from] UrlError),

    #[error("error making request: {0}")]
    Reqwest(#[from] reqwest::Error),

    #[error("error reading local repository: {0}")]
    Git(#[from] GitError),

    #[error("local git lookup was aborted: {0}")]
    Join(#[from] tokio::task::JoinError),

    #[error("invalid commit time {value:?} for commit {commit}")]
    InvalidCommitTime { commit: String, value: String },

    #[error("invalid configuration: {0}")]
    Config(String),
}
