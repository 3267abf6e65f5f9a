use clap::{crate_description, ArgAction, Args, Parser, Subcommand, ValueEnum};
use std::io::IsTerminal;
use std::net::SocketAddr;
use std::path::PathBuf;
use url::Url;

use committime::provider::GitProvider;

const DEFAULT_APP_LABEL: &str = "app.kubernetes.io/name";

// -----------------------------------------------------------------------------
// command-line args
// -----------------------------------------------------------------------------
#[derive(Parser, Debug)]
#[command(
    name("committime-exporter"),
    bin_name("committime-exporter"),

    author,   // retrieved from Cargo.toml `authors`
    version,  // retrieved from Cargo.toml `version`
    about,    // retrieved from Cargo.toml `description`

    long_about = concat!(
        crate_description!(),
        "\n\n",
        "For each application in the watched namespaces, the commit behind every image-producing ",
        "build is looked up on the source-code host, and its commit time is published as the ",
        "`commit_timestamp` gauge.",
    ),
)]
#[deny(missing_docs)]
/// Publish the commit timestamps of cluster builds as Prometheus metrics
pub struct CommandLineArgs {
    #[command(subcommand)]
    pub command: Command,

    #[command(flatten)]
    pub global_args: GlobalArgs,
}

impl CommandLineArgs {
    pub fn parse_args() -> Self {
        let mut args = <Self as Parser>::parse();

        // If `NO_COLOR` is set in the environment, disable colored output
        //
        // https://no-color.org/
        if std::env::var("NO_COLOR").is_ok() {
            args.global_args.color = Mode::Never
        }

        args
    }
}

#[derive(Subcommand, Debug)]
pub enum Command {
    /// Serve commit timestamps for scraping
    ///
    /// Every request to `/metrics` runs one collection pass over the watched namespaces.
    /// Commit times that have been resolved once are remembered for the life of the process.
    #[command(display_order = 1)]
    Serve(ServeArgs),

    /// Run one collection pass and print the metrics
    #[command(display_order = 2)]
    Collect(CollectArgs),
}

// -----------------------------------------------------------------------------
// global options
// -----------------------------------------------------------------------------
#[derive(Args, Debug)]
#[command(next_help_heading = "Global Options")]
pub struct GlobalArgs {
    /// Enable verbose output
    ///
    /// This can be repeated up to 2 times to enable successively more output.
    #[arg(global=true, long, short, action=ArgAction::Count)]
    pub verbose: u8,

    /// Suppress non-error feedback messages
    ///
    /// This silences informational and warning messages.
    /// Error messages are still shown.
    #[arg(global=true, long, short, conflicts_with = "verbose")]
    pub quiet: bool,

    /// Enable or disable colored output
    ///
    /// When this is "auto", colors are enabled when stderr is a tty.
    ///
    /// If the `NO_COLOR` environment variable is set, it takes precedence and is equivalent to
    /// `--color=never`.
    #[arg(global=true, long, default_value_t=Mode::Auto, value_name="MODE")]
    pub color: Mode,
}

impl GlobalArgs {
    pub fn use_color<T: IsTerminal>(&self, out: T) -> bool {
        match self.color {
            Mode::Never => false,
            Mode::Always => true,
            Mode::Auto => out.is_terminal(),
        }
    }
}

/// A generic auto/never/always mode value
#[derive(Copy, Clone, Debug, PartialEq, Eq, PartialOrd, Ord, ValueEnum)]
pub enum Mode {
    Auto,
    Never,
    Always,
}

impl std::fmt::Display for Mode {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let s = match self {
            Mode::Auto => "auto",
            Mode::Never => "never",
            Mode::Always => "always",
        };
        write!(f, "{s}")
    }
}

// -----------------------------------------------------------------------------
// collection options
// -----------------------------------------------------------------------------
#[derive(Args, Debug)]
pub struct CollectorArgs {
    /// Watch only the given namespaces
    ///
    /// This is a comma-separated list.
    /// When not given, every namespace visible to the exporter is watched.
    #[arg(long, env = "NAMESPACES", value_name = "NAMESPACE", value_delimiter = ',')]
    pub namespaces: Vec<String>,

    /// Group builds into applications by the value of this label
    #[arg(long, env = "APP_LABEL", default_value = DEFAULT_APP_LABEL, value_name = "KEY")]
    pub app_label: String,

    #[command(flatten)]
    pub git: GitArgs,

    #[command(flatten)]
    pub cluster: ClusterArgs,
}

impl CollectorArgs {
    /// The namespaces to watch, trimmed, or `None` to watch all of them.
    pub fn namespaces(&self) -> Option<Vec<String>> {
        let namespaces: Vec<String> = self
            .namespaces
            .iter()
            .map(|ns| ns.trim())
            .filter(|ns| !ns.is_empty())
            .map(str::to_string)
            .collect();
        if namespaces.is_empty() {
            None
        } else {
            Some(namespaces)
        }
    }
}

#[derive(Args, Debug)]
#[command(next_help_heading = "Git Provider Options")]
pub struct GitArgs {
    /// Look up commit times with this provider
    ///
    /// One of `github`, `gitlab`, `bitbucket`, `gitea`, or `local`.
    #[arg(long, env = "GIT_PROVIDER", default_value = "github", value_name = "PROVIDER")]
    pub git_provider: GitProvider,

    /// Authenticate to the git provider as this user
    ///
    /// This is required for Bitbucket, which uses basic authentication.
    #[arg(long, env = "GIT_USER", value_name = "USER")]
    pub git_user: Option<String>,

    /// Authenticate to the git provider with this API token
    #[arg(long, env = "GIT_TOKEN", hide_env_values = true, value_name = "TOKEN")]
    pub git_token: Option<String>,

    /// Use this API host or base URL
    ///
    /// GitHub defaults to `api.github.com`.
    /// Other providers default to the host of each repository URL.
    #[arg(long, env = "GIT_API", value_name = "URL")]
    pub git_api: Option<String>,

    /// Verify the TLS certificates of the git provider
    #[arg(
        long,
        env = "TLS_VERIFY",
        default_value_t = true,
        action = ArgAction::Set,
        value_parser = clap::builder::BoolishValueParser::new(),
        value_name = "BOOL",
    )]
    pub tls_verify: bool,

    /// Read commit times from local clones under this directory
    ///
    /// Used by the `local` provider.
    /// A repository `https://HOST/GROUP/PROJECT` is expected at `DIR/HOST/GROUP/PROJECT`.
    #[arg(long, env = "LOCAL_REPOS_DIR", value_name = "DIR")]
    pub local_repos_dir: Option<PathBuf>,
}

#[derive(Args, Debug)]
#[command(next_help_heading = "Cluster Options")]
pub struct ClusterArgs {
    /// Use the cluster API server at this URL
    ///
    /// When not given, the in-cluster service account configuration is used.
    #[arg(long, env = "KUBERNETES_API_URL", value_name = "URL")]
    pub cluster_url: Option<Url>,

    /// Authenticate to the cluster API with this bearer token
    #[arg(long, env = "KUBERNETES_TOKEN", hide_env_values = true, value_name = "TOKEN")]
    pub cluster_token: Option<String>,

    /// Trust the PEM-encoded CA certificate in this file for the cluster API server
    ///
    /// When running inside a cluster, the service account CA certificate is trusted already.
    #[arg(long, env = "KUBERNETES_CA_CERT", value_name = "FILE")]
    pub cluster_ca_cert: Option<PathBuf>,

    /// Ignore validation of the cluster API server's TLS certificate
    #[arg(long)]
    pub cluster_insecure: bool,
}

// -----------------------------------------------------------------------------
// `serve` command
// -----------------------------------------------------------------------------
#[derive(Args, Debug)]
pub struct ServeArgs {
    /// Listen for scrapes on this address
    #[arg(long, env = "LISTEN_ADDRESS", default_value = "0.0.0.0:8080", value_name = "ADDR")]
    pub listen: SocketAddr,

    #[command(flatten)]
    pub collector: CollectorArgs,
}

// -----------------------------------------------------------------------------
// `collect` command
// -----------------------------------------------------------------------------
#[derive(Args, Debug)]
pub struct CollectArgs {
    #[command(flatten)]
    pub collector: CollectorArgs,
}
