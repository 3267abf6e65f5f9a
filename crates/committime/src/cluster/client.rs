use async_trait::async_trait;
use reqwest::{header, StatusCode, Url};
use secrecy::{ExposeSecret, SecretString};
use serde::Deserialize;
use serde_json::Value;
use tracing::trace;

use super::{ClusterClient, Error, Result};
use crate::build::{Build, BuildConfig};
use crate::nested::get_nested_str;
use crate::rest::url_from_path_parts_and_params;

/// The body of a Kubernetes `List` response.
#[derive(Deserialize)]
struct ObjectList {
    #[serde(default)]
    items: Vec<Value>,
}

// -------------------------------------------------------------------------------------------------
// Client
// -------------------------------------------------------------------------------------------------
/// A client for the Kubernetes and OpenShift build APIs.
pub struct Client {
    pub(super) inner: reqwest::Client,
    pub(super) base_url: Url,
    pub(super) token: Option<SecretString>,
}

const BUILD_API: [&str; 3] = ["apis", "build.openshift.io", "v1"];

impl Client {
    pub fn base_url(&self) -> &Url {
        &self.base_url
    }

    fn make_url(&self, path_parts: &[&str], params: &[(&str, &str)]) -> Result<Url> {
        Ok(url_from_path_parts_and_params(self.base_url.clone(), path_parts, params)?)
    }

    /// Fetch `url` and decode its JSON body. A 404 response yields `Ok(None)`.
    async fn get_json<T: serde::de::DeserializeOwned>(&self, url: Url) -> Result<Option<T>> {
        trace!("GET {url}");

        let request_builder = self.inner.get(url).header(header::ACCEPT, "application/json");
        let request_builder = match &self.token {
            None => request_builder,
            Some(token) => request_builder.bearer_auth(token.expose_secret()),
        };

        let response = request_builder.send().await?;
        if response.status() == StatusCode::NOT_FOUND {
            return Ok(None);
        }
        let response = response.error_for_status()?;
        Ok(Some(response.json().await?))
    }

    async fn get_list(&self, url: Url) -> Result<Vec<Value>> {
        match self.get_json::<ObjectList>(url.clone()).await? {
            Some(list) => Ok(list.items),
            None => Err(Error::Malformed(format!("{url} was not found"))),
        }
    }
}

#[async_trait]
impl ClusterClient for Client {
    async fn list_namespaces(&self) -> Result<Vec<String>> {
        let url = self.make_url(&["api", "v1", "namespaces"], &[])?;
        self.get_list(url)
            .await?
            .iter()
            .map(|ns| {
                get_nested_str(ns, "metadata.name")
                    .map(str::to_string)
                    .map_err(|e| Error::Malformed(e.named("namespace").to_string()))
            })
            .collect()
    }

    async fn list_builds(&self, namespace: &str, label_selector: &str) -> Result<Vec<Build>> {
        let mut parts = BUILD_API.to_vec();
        parts.extend(["namespaces", namespace, "builds"]);
        let url = self.make_url(&parts, &[("labelSelector", label_selector)])?;
        Ok(self.get_list(url).await?.into_iter().map(Build::new).collect())
    }

    async fn get_build_config(&self, namespace: &str, name: &str) -> Result<Option<BuildConfig>> {
        let mut parts = BUILD_API.to_vec();
        parts.extend(["namespaces", namespace, "buildconfigs", name]);
        let url = self.make_url(&parts, &[])?;
        Ok(self.get_json::<Value>(url).await?.map(BuildConfig::new))
    }
}
