use std::path::PathBuf;

use crate::rest::UrlError;

// -------------------------------------------------------------------------------------------------
// Error
// -------------------------------------------------------------------------------------------------
#[derive(Debug, thiserror::Error)]
pub enum Error {
    #[error(transparent)]
    Url(#[from] UrlError),

    #[error("error talking to the cluster: {0}")]
    Reqwest(#[from] reqwest::Error),

    #[error("failed to read {}: {source}", .path.display())]
    Io {
        path: PathBuf,
        source: std::io::Error,
    },

    #[error("unexpected response from the cluster: {0}")]
    Malformed(String),

    #[error("invalid cluster configuration: {0}")]
    Config(String),
}
