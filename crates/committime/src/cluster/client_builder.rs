use secrecy::SecretString;
use std::path::{Path, PathBuf};
use tracing::debug;
use url::Url;

use super::{Client, Error, Result};

// -------------------------------------------------------------------------------------------------
// ClientBuilder
// -------------------------------------------------------------------------------------------------
pub struct ClientBuilder {
    base_url: Url,
    token: Option<SecretString>,
    ca_cert_pem: Option<Vec<u8>>,
    ignore_certs: bool,
}

impl ClientBuilder {
    /// Where a pod's service account credentials are mounted
    pub const SERVICE_ACCOUNT_DIR: &'static str = "/var/run/secrets/kubernetes.io/serviceaccount";

    /// The user agent string sent when accessing the cluster API
    const USER_AGENT: &'static str = concat!("committime-exporter/", env!("CARGO_PKG_VERSION"));

    /// Create a new `ClientBuilder` for the API server at `base_url`, without credentials.
    pub fn new(base_url: Url) -> Self {
        ClientBuilder {
            base_url,
            token: None,
            ca_cert_pem: None,
            ignore_certs: false,
        }
    }

    /// Configure access from inside a pod, using its service account.
    pub fn in_cluster() -> Result<Self> {
        let host = std::env::var("KUBERNETES_SERVICE_HOST").map_err(|_| {
            let msg = "KUBERNETES_SERVICE_HOST is not set; not running inside a cluster?";
            Error::Config(msg.to_string())
        })?;
        let port = std::env::var("KUBERNETES_SERVICE_PORT").unwrap_or_else(|_| "443".to_string());
        Self::in_cluster_from(&host, &port, Path::new(Self::SERVICE_ACCOUNT_DIR))
    }

    fn in_cluster_from(host: &str, port: &str, service_account_dir: &Path) -> Result<Self> {
        let host = if host.contains(':') {
            format!("[{host}]")
        } else {
            host.to_string()
        };
        let base_url = Url::parse(&format!("https://{host}:{port}"))
            .map_err(|e| {
                Error::Config(format!("invalid in-cluster API address {host}:{port}: {e}"))
            })?;

        let token = read_file(&service_account_dir.join("token"))?;
        let token = String::from_utf8_lossy(&token).trim().to_string();

        let ca_path = service_account_dir.join("ca.crt");
        let ca_cert_pem = if ca_path.is_file() {
            Some(read_file(&ca_path)?)
        } else {
            debug!("No service account CA certificate at {}", ca_path.display());
            None
        };

        Ok(ClientBuilder {
            base_url,
            token: Some(SecretString::from(token)),
            ca_cert_pem,
            ignore_certs: false,
        })
    }

    /// Authenticate with the given bearer token.
    pub fn token(mut self, token: SecretString) -> Self {
        self.token = Some(token);
        self
    }

    /// Trust the given PEM-encoded CA certificate in addition to the system roots.
    pub fn ca_cert_pem(mut self, pem: Vec<u8>) -> Self {
        self.ca_cert_pem = Some(pem);
        self
    }

    /// Ignore validation of TLS certs.
    pub fn ignore_certs(mut self, ignore_certs: bool) -> Self {
        self.ignore_certs = ignore_certs;
        self
    }

    /// Build a `Client` from this `ClientBuilder`.
    pub fn build(self) -> Result<Client> {
        let mut builder = reqwest::ClientBuilder::new()
            .user_agent(Self::USER_AGENT)
            .danger_accept_invalid_certs(self.ignore_certs);
        if let Some(pem) = &self.ca_cert_pem {
            builder = builder.add_root_certificate(reqwest::Certificate::from_pem(pem)?);
        }
        Ok(Client {
            inner: builder.build()?,
            base_url: self.base_url,
            token: self.token,
        })
    }
}

fn read_file(path: &Path) -> Result<Vec<u8>> {
    std::fs::read(path).map_err(|source| Error::Io {
        path: PathBuf::from(path),
        source,
    })
}
