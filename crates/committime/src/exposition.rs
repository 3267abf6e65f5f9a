//! Prometheus text exposition of collected metrics.

use prometheus::{Encoder, GaugeVec, Opts, Registry, TextEncoder};
use tracing::info;

use crate::metric::CommitMetric;

pub const METRIC_NAME: &str = "commit_timestamp";
pub const METRIC_HELP: &str = "Commit timestamp";
pub const LABELS: [&str; 4] = ["namespace", "app", "commit", "image_sha"];

/// Render one sample per metric in the Prometheus text format.
///
/// A fresh registry is used for every call, so series for builds that have disappeared since
/// the previous pass are not exported again. Metrics without a commit hash, image hash, or
/// timestamp are skipped. Metrics that share all four label values, such as two builds of one
/// commit that produced the same image, form a single series; the last one rendered wins.
pub fn render(metrics: &[CommitMetric]) -> prometheus::Result<String> {
    let registry = Registry::new();
    let gauge = GaugeVec::new(Opts::new(METRIC_NAME, METRIC_HELP), &LABELS)?;
    registry.register(Box::new(gauge.clone()))?;

    for metric in metrics {
        let (Some(commit), Some(image_sha), Some(timestamp)) =
            (&metric.commit_hash, &metric.image_hash, metric.commit_timestamp)
        else {
            continue;
        };
        info!(
            "Collected {METRIC_NAME}{{ namespace={}, app={}, commit={commit}, \
             image_sha={image_sha} }} {timestamp}",
            metric.namespace, metric.app_name
        );
        gauge
            .with_label_values(&[
                metric.namespace.as_str(),
                metric.app_name.as_str(),
                commit.as_str(),
                image_sha.as_str(),
            ])
            .set(timestamp);
    }

    let mut buffer = Vec::new();
    TextEncoder::new().encode(&registry.gather(), &mut buffer)?;
    String::from_utf8(buffer).map_err(|e| prometheus::Error::Msg(e.to_string()))
}

#[cfg(test)]
mod test {
    use super::*;
    use pretty_assertions::assert_eq;

    fn metric(app: &str, commit: &str, timestamp: Option<f64>) -> CommitMetric {
        let mut m = CommitMetric::new("ns1", app, &format!("{app}-1"));
        m.commit_hash = Some(commit.into());
        m.image_hash = Some("sha256:ff00".into());
        m.commit_timestamp = timestamp;
        m
    }

    fn sample_lines(text: &str) -> Vec<&str> {
        text.lines().filter(|l| !l.starts_with('#')).collect()
    }

    #[test]
    fn one_sample_per_metric() {
        let text = render(&[metric("demo", "abcd123", Some(1609459200.0))]).unwrap();
        assert!(text.contains("# HELP commit_timestamp Commit timestamp"));
        assert!(text.contains("# TYPE commit_timestamp gauge"));

        let lines = sample_lines(&text);
        assert_eq!(lines.len(), 1);
        let line = lines[0];
        assert!(line.starts_with("commit_timestamp{"));
        assert!(line.contains(r#"namespace="ns1""#));
        assert!(line.contains(r#"app="demo""#));
        assert!(line.contains(r#"commit="abcd123""#));
        assert!(line.contains(r#"image_sha="sha256:ff00""#));
        assert!(line.ends_with("} 1609459200"));
    }

    #[test]
    fn incomplete_metrics_are_not_rendered() {
        let metrics = [metric("demo", "abcd123", None), metric("other", "beef", Some(1.0))];
        let text = render(&metrics).unwrap();
        let lines = sample_lines(&text);
        assert_eq!(lines.len(), 1);
        assert!(lines[0].contains(r#"app="other""#));
    }

    #[test]
    fn identical_label_sets_share_a_series() {
        let first = metric("demo", "abcd123", Some(1609459200.0));
        let mut rebuilt = metric("demo", "abcd123", Some(1609459200.0));
        rebuilt.build_name = "demo-2".into();
        let text = render(&[first, rebuilt]).unwrap();
        assert_eq!(sample_lines(&text).len(), 1);
    }

    #[test]
    fn empty_pass() {
        let text = render(&[]).unwrap();
        assert!(sample_lines(&text).is_empty());
    }
}
