use anyhow::{Context, Result};
use secrecy::SecretString;
use tracing::info;

use committime::cluster::{self, ClusterClient};
use committime::collector::Collector;
use committime::provider::{self, ProviderConfig};

use crate::args::{ClusterArgs, CollectorArgs, GitArgs};

/// Build the collector described by the command-line arguments.
pub fn make_collector(args: &CollectorArgs) -> Result<Collector> {
    let cluster =
        make_cluster_client(&args.cluster).context("Failed to configure cluster access")?;
    let lookup = make_lookup(&args.git).context("Failed to configure the git provider")?;
    info!(
        "Using the {} provider; grouping builds by label {}",
        lookup.name(),
        args.app_label
    );
    Ok(Collector::new(cluster, lookup, &args.app_label))
}

fn make_cluster_client(args: &ClusterArgs) -> Result<Box<dyn ClusterClient>> {
    let builder = match &args.cluster_url {
        Some(url) => cluster::ClientBuilder::new(url.clone()),
        None => cluster::ClientBuilder::in_cluster()?,
    };
    let builder = match &args.cluster_token {
        Some(token) => builder.token(SecretString::from(token.clone())),
        None => builder,
    };
    let builder = match &args.cluster_ca_cert {
        Some(path) => {
            let pem = std::fs::read(path)
                .with_context(|| format!("Failed to read CA certificate {}", path.display()))?;
            builder.ca_cert_pem(pem)
        }
        None => builder,
    };
    let client = builder.ignore_certs(args.cluster_insecure).build()?;
    info!("Using cluster API at {}", client.base_url());
    Ok(Box::new(client))
}

fn make_lookup(args: &GitArgs) -> Result<Box<dyn provider::CommitTimeLookup>> {
    if args.git_user.is_none() && args.git_token.is_none() {
        info!("No git user or token given; only public repositories will be reachable");
    }
    let config = ProviderConfig {
        provider: args.git_provider,
        username: args.git_user.clone(),
        token: args.git_token.clone().map(SecretString::from),
        api: args.git_api.clone(),
        tls_verify: args.tls_verify,
        local_repos_dir: args.local_repos_dir.clone(),
    };
    Ok(provider::from_config(config)?)
}

/// Build the async runtime that commands run on.
pub fn runtime() -> Result<tokio::runtime::Runtime> {
    tokio::runtime::Builder::new_multi_thread()
        .enable_all()
        .build()
        .context("Failed to initialize async runtime")
}
