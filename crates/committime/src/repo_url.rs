use lazy_static::lazy_static;
use regex::Regex;
use tracing::debug;
use url::Url;

use crate::build::Build;

lazy_static! {
    /// Matches a value that looks like a git remote: either `scheme://host...` or `user@host...`.
    static ref GIT_REPO_PATTERN: Regex =
        Regex::new(r"^((\w+://)|(.+@))([\w\d\.]+)(:[\d]+){0,1}/*(.*)")
            .expect("git repo regex should compile");

    /// An scp-like remote, e.g. `git@github.com:org/repo.git`.
    static ref SCP_LIKE_PATTERN: Regex =
        Regex::new(r"^(?:[^@/]+@)?([^:/]+):(.+)$")
            .expect("scp-like regex should compile");
}

/// Does `value` look like a git remote URL?
pub fn looks_like_git_url(value: &str) -> bool {
    GIT_REPO_PATTERN.is_match(value)
}

/// Append `.git` to `url` unless it already ends that way.
pub fn with_git_suffix(url: &str) -> String {
    if url.ends_with(".git") {
        url.to_string()
    } else {
        format!("{url}.git")
    }
}

/// Determine the repository URL shared by an application's pipeline builds.
///
/// Only the first build is inspected. Its pipeline environment is scanned in declaration order
/// for the first value that looks like a git remote; failing that, its own `spec.source.git.uri`
/// is used. `None` means the caller has to resolve the URL per build.
pub fn resolve_pipeline_repo_url(pipeline_builds: &[Build]) -> Option<String> {
    let build = pipeline_builds.first()?;

    for env in build.pipeline_env() {
        let Some(value) = env.value else {
            continue;
        };
        debug!("Searching {}={} for git urls", env.name, value);
        if looks_like_git_url(value) {
            debug!("Found git url in pipeline parameter {}", env.name);
            return Some(value.to_string());
        }
    }

    match build.source_git_uri() {
        Some(uri) => Some(uri.to_string()),
        None => {
            debug!(
                "Pipeline build {} has no git repo configured in its source or its parameters",
                build.name().unwrap_or("<unnamed>")
            );
            None
        }
    }
}

// -------------------------------------------------------------------------------------------------
// RepoUrl
// -------------------------------------------------------------------------------------------------
/// A repository URL broken into the parts that source-code host APIs are addressed by.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct RepoUrl {
    /// `https`, `http`, `ssh`, `git`, ... (`ssh` for scp-like remotes)
    pub protocol: String,
    pub host: String,
    pub port: Option<u16>,
    /// Everything in the path before the project, e.g. `org` or `org/subgroup`
    pub group: String,
    /// The last path segment, without any `.git` suffix
    pub project: String,
}

const REPO_URL_ERROR_MESSAGE: &str =
    "expected a repository URL of the form scheme://host/group/project or user@host:group/project";

impl RepoUrl {
    fn from_parts(
        protocol: &str,
        host: &str,
        port: Option<u16>,
        path: &str,
    ) -> Result<Self, &'static str> {
        let mut segments: Vec<&str> = path.split('/').filter(|s| !s.is_empty()).collect();
        let project = segments.pop().ok_or(REPO_URL_ERROR_MESSAGE)?;
        let project = project.strip_suffix(".git").unwrap_or(project);
        if segments.is_empty() || project.is_empty() || host.is_empty() {
            return Err(REPO_URL_ERROR_MESSAGE);
        }
        if segments.iter().any(|s| *s == "..") || project == ".." {
            return Err(REPO_URL_ERROR_MESSAGE);
        }
        Ok(RepoUrl {
            protocol: protocol.to_string(),
            host: host.to_string(),
            port,
            group: segments.join("/"),
            project: project.to_string(),
        })
    }

    /// The host, with the port if one was given.
    pub fn authority(&self) -> String {
        match self.port {
            Some(port) => format!("{}:{port}", self.host),
            None => self.host.clone(),
        }
    }

    /// The web origin of the host. Remotes reached over ssh or git are assumed to be served over
    /// https on the default port.
    pub fn web_base(&self) -> String {
        match self.protocol.as_str() {
            "http" | "https" => format!("{}://{}", self.protocol, self.authority()),
            _ => format!("https://{}", self.host),
        }
    }

    /// `group/project`
    pub fn full_name(&self) -> String {
        format!("{}/{}", self.group, self.project)
    }
}

impl std::fmt::Display for RepoUrl {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}://{}/{}/{}.git", self.protocol, self.authority(), self.group, self.project)
    }
}

impl std::str::FromStr for RepoUrl {
    type Err = &'static str;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        if s.contains("://") {
            match Url::parse(s) {
                Err(_e) => Err(REPO_URL_ERROR_MESSAGE),
                Ok(url) => Self::try_from(url),
            }
        } else {
            let caps = SCP_LIKE_PATTERN.captures(s).ok_or(REPO_URL_ERROR_MESSAGE)?;
            Self::from_parts("ssh", &caps[1], None, &caps[2])
        }
    }
}

impl TryFrom<Url> for RepoUrl {
    type Error = &'static str;

    fn try_from(url: Url) -> Result<Self, Self::Error> {
        let host = match url.host() {
            Some(url::Host::Domain(host)) => host.to_owned(),
            Some(url::Host::Ipv4(addr)) => addr.to_string(),
            Some(url::Host::Ipv6(addr)) => addr.to_string(),
            None => return Err(REPO_URL_ERROR_MESSAGE),
        };
        Self::from_parts(url.scheme(), &host, url.port(), url.path())
    }
}
