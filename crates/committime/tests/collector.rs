use pretty_assertions::assert_eq;

use committime::collector::Collector;
use committime::exposition;
use committime::metric::CommitMetric;
use committime::provider::{self, GitProvider, ProviderConfig};

mod common;
use common::*;

const NEW_YEAR: &str = "2021-01-01T00:00:00Z";

fn collector(cluster: FakeCluster, lookup: &FakeLookup) -> Collector {
    Collector::new(Box::new(cluster), Box::new(lookup.clone()), APP_LABEL)
}

fn namespaces(names: &[&str]) -> Vec<String> {
    names.iter().map(|s| s.to_string()).collect()
}

async fn collect(collector: &mut Collector, names: &[&str]) -> Vec<CommitMetric> {
    collector.collect_all(Some(&namespaces(names))).await.unwrap()
}

#[tokio::test]
async fn end_to_end_pipeline_app() {
    let cluster = FakeCluster::new().namespace(
        "ns1",
        vec![
            pipeline_build(
                "demo-pipeline-1",
                "demo",
                &[("GIT_URL", "https://example.com/org/repo.git")],
            ),
            artifact_build("demo-1", "demo", "abcd123"),
        ],
    );
    let lookup = FakeLookup::new().commit("abcd123", NEW_YEAR);
    let mut collector = collector(cluster, &lookup);

    let metrics = collect(&mut collector, &["ns1"]).await;
    assert_eq!(metrics.len(), 1);
    let m = &metrics[0];
    assert_eq!(m.namespace, "ns1");
    assert_eq!(m.app_name, "demo");
    assert_eq!(m.build_name, "demo-1");
    assert_eq!(m.commit_hash.as_deref(), Some("abcd123"));
    assert_eq!(m.image_hash.as_deref(), Some("sha256:ff00"));
    assert_eq!(m.commit_timestamp, Some(1609459200.0));
    assert_eq!(m.repo_url.as_deref(), Some("https://example.com/org/repo.git"));

    let text = exposition::render(&metrics).unwrap();
    let samples: Vec<&str> = text.lines().filter(|l| !l.starts_with('#')).collect();
    assert_eq!(samples.len(), 1);
    let labels = [
        r#"namespace="ns1""#,
        r#"app="demo""#,
        r#"commit="abcd123""#,
        r#"image_sha="sha256:ff00""#,
    ];
    for label in labels {
        assert!(samples[0].contains(label), "{label} missing from {}", samples[0]);
    }
    assert!(samples[0].ends_with(" 1609459200"));
}

#[tokio::test]
async fn failed_build_is_skipped_quietly() {
    let (logs, _guard) = CapturedLogs::install();
    let cluster = FakeCluster::new().namespace(
        "ns1",
        vec![with_phase(
            sourced_build("demo-1", "demo", "abcd123"),
            "Failed",
        )],
    );
    let lookup = FakeLookup::new().commit("abcd123", NEW_YEAR);
    let mut collector = collector(cluster, &lookup);

    let metrics = collect(&mut collector, &["ns1"]).await;
    assert!(metrics.is_empty());
    assert_eq!(lookup.request_count(), 0);
    assert!(logs.lines_at("ERROR").is_empty());
    assert!(logs.lines_at("WARN").is_empty());
}

#[tokio::test]
async fn failed_build_without_name_is_skipped_quietly() {
    let (logs, _guard) = CapturedLogs::install();
    let mut raw = with_phase(artifact_build("demo-1", "demo", "abcd123"), "Failed");
    if let Some(metadata) = raw["metadata"].as_object_mut() {
        metadata.remove("name");
    }
    let cluster = FakeCluster::new().namespace("ns1", vec![raw]);
    let lookup = FakeLookup::new().commit("abcd123", NEW_YEAR);
    let mut collector = collector(cluster, &lookup);

    assert!(collect(&mut collector, &["ns1"]).await.is_empty());
    assert_eq!(lookup.request_count(), 0);
    assert!(logs.lines_at("ERROR").is_empty());
    assert!(logs.lines_at("WARN").is_empty());
}

#[tokio::test]
async fn terminal_phases_never_emit() {
    for phase in ["Failed", "Error", "Cancelled"] {
        let cluster = FakeCluster::new().namespace(
            "ns1",
            vec![with_phase(artifact_build("demo-1", "demo", "abcd123"), phase)],
        );
        let lookup = FakeLookup::new().commit("abcd123", NEW_YEAR);
        let mut collector = collector(cluster, &lookup);
        assert!(collect(&mut collector, &["ns1"]).await.is_empty(), "{phase} build was emitted");
    }
}

#[tokio::test]
async fn unresolved_commit_warns_once() {
    let (logs, _guard) = CapturedLogs::install();
    let cluster = FakeCluster::new().namespace(
        "ns1",
        vec![sourced_build("demo-7", "demo", "deadbeef")],
    );
    let lookup = FakeLookup::new();
    let mut collector = collector(cluster, &lookup);

    let metrics = collect(&mut collector, &["ns1"]).await;
    assert!(metrics.is_empty());

    let warnings = logs.lines_at("WARN");
    assert_eq!(warnings.len(), 1, "{warnings:#?}");
    assert!(warnings[0].contains("ns1/demo-7"));
    assert!(warnings[0].contains("in app demo"));
    assert!(warnings[0].contains("could not resolve commit time for deadbeef"));
    assert!(logs.lines_at("ERROR").is_empty());
}

#[tokio::test]
async fn in_progress_build_needs_image() {
    let running = with_phase(artifact_build("demo-1", "demo", "abcd123"), "Running");
    let cluster = FakeCluster::new().namespace(
        "ns1",
        vec![without_image(running.clone())],
    );
    let lookup = FakeLookup::new().commit("abcd123", NEW_YEAR);
    let mut c = collector(cluster, &lookup);
    assert!(collect(&mut c, &["ns1"]).await.is_empty());
    assert_eq!(lookup.request_count(), 0);

    let running = with_source(running, "https://example.com/org/repo.git");
    let cluster = FakeCluster::new().namespace("ns1", vec![running]);
    let mut c = collector(cluster, &lookup);
    assert_eq!(collect(&mut c, &["ns1"]).await.len(), 1);
}

#[tokio::test]
async fn commit_time_looked_up_once_per_hash() {
    let cluster = FakeCluster::new().namespace(
        "ns1",
        vec![
            sourced_build("demo-1", "demo", "abcd123"),
            sourced_build("demo-2", "demo", "abcd123"),
            sourced_build("other-1", "other", "abcd123"),
        ],
    );
    let lookup = FakeLookup::new().commit("abcd123", NEW_YEAR);
    let mut collector = collector(cluster, &lookup);

    let first = collect(&mut collector, &["ns1"]).await;
    let second = collect(&mut collector, &["ns1"]).await;
    assert_eq!(first.len(), 3);
    assert_eq!(second.len(), 3);
    assert_eq!(lookup.request_count(), 1);
    assert_eq!(collector.cache().len(), 1);
    assert!(second.iter().all(|m| m.commit_timestamp == Some(1609459200.0)));
    assert!(second.iter().all(|m| m.commit_time == first[0].commit_time));
}

#[tokio::test]
async fn pipeline_url_takes_precedence_over_build_source() {
    let cluster = FakeCluster::new().namespace(
        "ns1",
        vec![
            pipeline_build(
                "demo-pipeline-1",
                "demo",
                &[("BRANCH", "main"), ("REPO", "git@example.com:org/from-pipeline.git")],
            ),
            with_source(
                artifact_build("demo-1", "demo", "abcd123"),
                "https://example.com/org/from-build.git",
            ),
        ],
    );
    let lookup = FakeLookup::new().commit("abcd123", NEW_YEAR);
    let mut collector = collector(cluster, &lookup);

    let metrics = collect(&mut collector, &["ns1"]).await;
    assert_eq!(metrics[0].repo_url.as_deref(), Some("git@example.com:org/from-pipeline.git"));
    assert_eq!(
        lookup.requested_repo_urls(),
        vec![Some("git@example.com:org/from-pipeline.git".to_string())]
    );
}

#[tokio::test]
async fn build_source_used_without_pipeline() {
    let cluster = FakeCluster::new()
        .namespace(
            "ns1",
            vec![with_source(
                artifact_build("demo-1", "demo", "abcd123"),
                "https://example.com/org/from-build",
            )],
        )
        .build_config("ns1", "demo", build_config("https://example.com/org/from-config"));
    let lookup = FakeLookup::new().commit("abcd123", NEW_YEAR);
    let mut collector = collector(cluster, &lookup);

    let metrics = collect(&mut collector, &["ns1"]).await;
    assert_eq!(metrics[0].repo_url.as_deref(), Some("https://example.com/org/from-build"));
}

#[tokio::test]
async fn build_config_url_gets_git_suffix() {
    let cluster = FakeCluster::new()
        .namespace(
            "ns1",
            vec![
                artifact_build("demo-1", "demo", "abcd123"),
                artifact_build("other-1", "other", "beef456"),
            ],
        )
        .build_config("ns1", "demo", build_config("https://example.com/org/demo"))
        .build_config("ns1", "other", build_config("https://example.com/org/other.git"));
    let lookup = FakeLookup::new().commit("abcd123", NEW_YEAR).commit("beef456", NEW_YEAR);
    let mut collector = collector(cluster, &lookup);

    let metrics = collect(&mut collector, &["ns1"]).await;
    let urls: Vec<Option<&str>> = metrics.iter().map(|m| m.repo_url.as_deref()).collect();
    assert_eq!(
        urls,
        vec![Some("https://example.com/org/demo.git"), Some("https://example.com/org/other.git")]
    );
}

#[tokio::test]
async fn missing_build_config_leaves_commit_unresolved() {
    let (logs, _guard) = CapturedLogs::install();
    let cluster =
        FakeCluster::new().namespace("ns1", vec![artifact_build("demo-1", "demo", "abcd123")]);
    let lookup = FakeLookup::new();
    let mut collector = collector(cluster, &lookup);

    assert!(collect(&mut collector, &["ns1"]).await.is_empty());
    assert_eq!(lookup.requested_repo_urls(), vec![None]);
    assert_eq!(logs.lines_at("WARN").len(), 1);
}

#[tokio::test]
async fn apps_are_deduplicated() {
    let cluster = FakeCluster::new().namespace(
        "ns1",
        vec![
            with_source(artifact_build("x-1", "X", "c0ffee1"), "https://example.com/org/x.git"),
            with_source(artifact_build("x-2", "X", "c0ffee2"), "https://example.com/org/x.git"),
            with_source(artifact_build("y-1", "Y", "c0ffee3"), "https://example.com/org/y.git"),
        ],
    );
    let lookup = FakeLookup::new()
        .commit("c0ffee1", NEW_YEAR)
        .commit("c0ffee2", NEW_YEAR)
        .commit("c0ffee3", NEW_YEAR);
    let mut collector = collector(cluster, &lookup);

    let metrics = collect(&mut collector, &["ns1"]).await;
    let builds: Vec<(&str, &str)> = metrics
        .iter()
        .map(|m| (m.app_name.as_str(), m.build_name.as_str()))
        .collect();
    assert_eq!(builds, vec![("X", "x-1"), ("X", "x-2"), ("Y", "y-1")]);
    assert_eq!(lookup.request_count(), 3);
}

#[tokio::test]
async fn one_failing_build_does_not_affect_siblings() {
    let (logs, _guard) = CapturedLogs::install();
    let cluster = FakeCluster::new().namespace(
        "ns1",
        vec![
            sourced_build("demo-1", "demo", "bad0001"),
            without_config_ref(artifact_build("demo-2", "demo", "abcd123")),
            sourced_build("demo-3", "demo", "abcd123"),
        ],
    );
    let lookup = FakeLookup::new().commit("abcd123", NEW_YEAR).failing("bad0001");
    let mut collector = collector(cluster, &lookup);

    let metrics = collect(&mut collector, &["ns1"]).await;
    assert_eq!(metrics.len(), 1);
    assert_eq!(metrics[0].build_name, "demo-3");

    let errors = logs.lines_at("ERROR");
    assert_eq!(errors.len(), 2, "{errors:#?}");
    assert!(errors[0].contains("ns1/demo-1"));
    assert!(errors[1].contains("ns1/demo-2"));
    assert!(logs.lines_at("WARN").is_empty());
}

#[tokio::test]
async fn discovers_namespaces_when_none_given() {
    let cluster = FakeCluster::new()
        .namespace("ns1", vec![sourced_build("a-1", "a", "c0ffee1")])
        .namespace("ns2", vec![sourced_build("b-1", "b", "c0ffee2")]);
    let lookup = FakeLookup::new().commit("c0ffee1", NEW_YEAR).commit("c0ffee2", NEW_YEAR);
    let mut collector = collector(cluster, &lookup);

    let metrics = collector.collect_all(None).await.unwrap();
    let namespaces: Vec<&str> = metrics.iter().map(|m| m.namespace.as_str()).collect();
    assert_eq!(namespaces, vec!["ns1", "ns2"]);
}

#[tokio::test]
async fn discovery_failure_fails_the_pass() {
    let mut cluster = FakeCluster::new().namespace("ns1", vec![]);
    cluster.broken_discovery = true;
    let lookup = FakeLookup::new();
    let mut collector = collector(cluster, &lookup);
    assert!(collector.collect_all(None).await.is_err());
}

#[tokio::test]
async fn broken_namespace_is_skipped() {
    let (logs, _guard) = CapturedLogs::install();
    let mut cluster = FakeCluster::new()
        .namespace("ns1", vec![sourced_build("a-1", "a", "c0ffee1")])
        .namespace("ns2", vec![sourced_build("b-1", "b", "c0ffee2")]);
    cluster.broken_namespaces = namespaces(&["ns1"]);
    let calls = cluster.list_builds_calls.clone();
    let lookup = FakeLookup::new().commit("c0ffee1", NEW_YEAR).commit("c0ffee2", NEW_YEAR);
    let mut collector = collector(cluster, &lookup);

    let metrics = collect(&mut collector, &["ns1", "ns2"]).await;
    assert_eq!(metrics.len(), 1);
    assert_eq!(metrics[0].namespace, "ns2");
    assert_eq!(*calls.lock().unwrap(), namespaces(&["ns1", "ns2"]));

    let errors = logs.lines_at("ERROR");
    assert_eq!(errors.len(), 1);
    assert!(errors[0].contains("namespace ns1"));
}

#[tokio::test]
async fn missing_commit_hash_is_reported() {
    let (logs, _guard) = CapturedLogs::install();
    let mut raw = sourced_build("demo-1", "demo", "abcd123");
    raw["spec"]["revision"] = serde_json::json!({});
    let cluster = FakeCluster::new().namespace("ns1", vec![raw]);
    let lookup = FakeLookup::new();
    let mut collector = collector(cluster, &lookup);

    assert!(collect(&mut collector, &["ns1"]).await.is_empty());
    assert_eq!(lookup.request_count(), 0);
    let warnings = logs.lines_at("WARN");
    assert_eq!(warnings.len(), 1);
    assert!(warnings[0].contains("spec.revision.git.commit"));
}

#[tokio::test]
async fn upstream_failure_logs_its_cause() {
    let (logs, _guard) = CapturedLogs::install();
    let cluster = FakeCluster::new().namespace(
        "ns1",
        vec![with_source(
            artifact_build("demo-1", "demo", "abcd123"),
            "https://github.com/org/repo.git",
        )],
    );
    let lookup = provider::from_config(ProviderConfig {
        provider: GitProvider::GitHub,
        username: None,
        token: None,
        api: Some("http://127.0.0.1:1".to_string()),
        tls_verify: true,
        local_repos_dir: None,
    })
    .unwrap();
    let mut collector = Collector::new(Box::new(cluster), lookup, APP_LABEL);

    assert!(collect(&mut collector, &["ns1"]).await.is_empty());
    let errors = logs.lines_at("ERROR");
    assert_eq!(errors.len(), 1, "{errors:#?}");
    assert!(errors[0].contains("commit time lookup failed"));
    assert!(errors[0].to_lowercase().contains("refused"), "{}", errors[0]);
}
