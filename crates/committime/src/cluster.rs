//! Read access to the cluster's namespaces, builds, and build configurations.

use async_trait::async_trait;

mod client;
mod client_builder;
mod error;

pub use client::Client;
pub use client_builder::ClientBuilder;
pub use error::Error;

use crate::build::{Build, BuildConfig};

pub type Result<T> = std::result::Result<T, Error>;

/// The cluster operations the collector needs.
#[async_trait]
pub trait ClusterClient: Send + Sync {
    /// Names of all namespaces visible to the caller
    async fn list_namespaces(&self) -> Result<Vec<String>>;

    /// Builds in `namespace` that carry the label `label_selector`
    async fn list_builds(&self, namespace: &str, label_selector: &str) -> Result<Vec<Build>>;

    /// The named build configuration, or `None` if it does not exist
    async fn get_build_config(&self, namespace: &str, name: &str) -> Result<Option<BuildConfig>>;
}
