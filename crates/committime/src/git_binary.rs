use std::path::Path;
use std::process::{Command, ExitStatus, Stdio};
use tracing::{debug, debug_span};

#[derive(Debug)]
pub enum GitError {
    IOError(std::io::Error),
    GitError {
        stdout: Vec<u8>,
        stderr: Vec<u8>,
        status: ExitStatus,
    },
}

impl From<std::io::Error> for GitError {
    fn from(err: std::io::Error) -> GitError {
        GitError::IOError(err)
    }
}

impl std::fmt::Display for GitError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            GitError::IOError(e) => write!(f, "git execution failed: {e}"),
            GitError::GitError {
                stdout,
                stderr,
                status,
            } => write!(
                f,
                "git execution failed\ncode={status}\nstdout=```\n{}```\nstderr=```\n{}```",
                String::from_utf8_lossy(stdout),
                String::from_utf8_lossy(stderr)
            ),
        }
    }
}

impl std::error::Error for GitError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            GitError::IOError(e) => Some(e),
            GitError::GitError { .. } => None,
        }
    }
}

/// Runs the `git` binary with the user's and system's configuration ignored.
#[derive(Clone, Debug, Default)]
pub struct Git {}

impl Git {
    pub fn new() -> Self {
        Self {}
    }

    fn git(&self) -> Command {
        let mut cmd = Command::new("git");
        cmd.env("GIT_CONFIG_GLOBAL", "/dev/null");
        cmd.env("GIT_CONFIG_NOSYSTEM", "1");
        cmd.env("GIT_CONFIG_SYSTEM", "/dev/null");
        cmd.stdin(Stdio::null());
        cmd
    }

    /// Get the committer date of `commit` in the repository at `repo_dir`, in strict ISO 8601
    /// form.
    ///
    /// `Ok(None)` means the repository does not contain the commit.
    pub fn commit_time(&self, repo_dir: &Path, commit: &str) -> Result<Option<String>, GitError> {
        let _span = debug_span!("git_show", "{} {commit}", repo_dir.display()).entered();

        if commit.is_empty() || !commit.chars().all(|c| c.is_ascii_hexdigit()) {
            debug!("Not a commit hash: {commit:?}");
            return Ok(None);
        }

        let mut cmd = self.git();
        cmd.arg("-C")
            .arg(repo_dir)
            .arg("show")
            .arg("-s")
            .arg("--format=%cI")
            .arg(commit);

        debug!("{cmd:#?}");
        let output = cmd.output()?;
        if !output.status.success() {
            let stderr = String::from_utf8_lossy(&output.stderr);
            if is_unknown_commit(&stderr) {
                debug!("Commit {commit} not found in {}", repo_dir.display());
                return Ok(None);
            }
            return Err(GitError::GitError {
                stdout: output.stdout,
                stderr: output.stderr,
                status: output.status,
            });
        }

        let stdout = String::from_utf8_lossy(&output.stdout);
        let time = stdout.trim();
        if time.is_empty() {
            Ok(None)
        } else {
            Ok(Some(time.to_string()))
        }
    }
}

fn is_unknown_commit(stderr: &str) -> bool {
    ["unknown revision", "bad object", "bad revision"]
        .iter()
        .any(|needle| stderr.contains(needle))
}
