//! Integration Test Utilities and Common Code

#![allow(dead_code)]

pub use assert_cmd::prelude::*;
pub use predicates::prelude::*;
pub use predicates::str::{contains, is_empty, RegexPredicate};
pub use std::process::Command;

/// Environment variables that would otherwise leak the test machine's configuration into a run.
const CONFIG_ENV_VARS: &[&str] = &[
    "NAMESPACES",
    "APP_LABEL",
    "GIT_PROVIDER",
    "GIT_USER",
    "GIT_TOKEN",
    "GIT_API",
    "GITHUB_USER",
    "GITHUB_TOKEN",
    "GITHUB_API",
    "TLS_VERIFY",
    "LOCAL_REPOS_DIR",
    "KUBERNETES_API_URL",
    "KUBERNETES_TOKEN",
    "KUBERNETES_CA_CERT",
    "KUBERNETES_SERVICE_HOST",
    "KUBERNETES_SERVICE_PORT",
    "LISTEN_ADDRESS",
    "COMMITTIME_LOG",
];

/// Build a `Command` for the `committime-exporter` binary with variadic command-line arguments.
///
/// The arguments can be anything that is allowed by `Command::arg`.
#[macro_export]
macro_rules! committime {
    ( $( $arg:expr ),* ) => {
        {
            let mut cmd = committime_cmd();
            $(
                cmd.arg($arg);
            )*
            cmd
        }
    }
}

/// Build an `assert_cmd::assert::Assert` by calling `committime!(args).assert().success()`.
#[macro_export]
macro_rules! committime_success {
    ( $( $arg:expr ),* ) => { committime!($( $arg ),*).assert().success() }
}

/// Build an `assert_cmd::assert::Assert` by calling `committime!(args).assert().failure()`.
#[macro_export]
macro_rules! committime_failure {
    ( $( $arg:expr ),* ) => { committime!($( $arg ),*).assert().failure() }
}

/// Get the command for the exporter binary under test.
///
/// By default, this is the binary defined in this crate.
/// However, if the `COMMITTIME_TEST_PROGRAM` environment variable is set, its value is used
/// instead. Its value should be an absolute path to the desired `committime-exporter` program.
///
/// The returned command runs without any of the exporter's configuration environment variables,
/// and with colors disabled.
pub fn committime_cmd() -> Command {
    let mut cmd = if let Ok(program) = std::env::var("COMMITTIME_TEST_PROGRAM") {
        Command::new(program)
    } else {
        Command::cargo_bin("committime-exporter").expect("committime-exporter should be executable")
    };
    for var in CONFIG_ENV_VARS {
        cmd.env_remove(var);
    }
    cmd.env("NO_COLOR", "1");
    cmd
}

/// Create a `RegexPredicate` from the given pattern.
pub fn is_match(pat: &str) -> RegexPredicate {
    predicates::str::is_match(pat).expect("pattern should compile")
}

/// A one-build namespace listing, as returned by the cluster API.
pub fn build_list_json() -> String {
    r#"{
        "kind": "BuildList",
        "items": [
            {
                "metadata": {
                    "name": "demo-1",
                    "labels": { "app.kubernetes.io/name": "demo" }
                },
                "spec": {
                    "strategy": { "type": "Source" },
                    "source": { "git": { "uri": "https://github.com/org/repo.git" } },
                    "revision": { "git": { "commit": "abcd123" } }
                },
                "status": {
                    "phase": "Complete",
                    "output": { "to": { "imageDigest": "sha256:ff00" } }
                }
            }
        ]
    }"#
    .to_string()
}

/// A GitHub commit response whose committer date is 2021-01-01T00:00:00Z.
pub fn github_commit_json() -> String {
    r#"{
        "sha": "abcd123",
        "commit": {
            "author": { "date": "2020-12-31T12:00:00Z" },
            "committer": { "date": "2021-01-01T00:00:00Z" }
        }
    }"#
    .to_string()
}
