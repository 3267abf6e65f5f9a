use std::collections::HashMap;
use tracing::trace;

use crate::collector::CollectError;
use crate::metric::Draft;
use crate::provider::{self, CommitTimeLookup};

/// Commit times already resolved, keyed by commit hash.
///
/// Lives as long as the collector, so a commit is looked up at most once across passes. A
/// commit time never changes, so entries are never invalidated. Only successful lookups are
/// remembered: an unresolved commit is tried again on the next pass.
#[derive(Debug, Default)]
pub struct CommitTimeCache {
    entries: HashMap<String, (String, f64)>,
}

impl CommitTimeCache {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// The cached commit time and timestamp for `commit`, if any.
    pub fn get(&self, commit: &str) -> Option<(&str, f64)> {
        self.entries.get(commit).map(|(time, ts)| (time.as_str(), *ts))
    }

    /// Fill in the commit time of `draft`, from the cache if possible, otherwise via `lookup`.
    ///
    /// A draft without a commit hash is returned unchanged. A lookup that finds nothing records
    /// an `UnresolvedCommitTime` error on the draft; a failing lookup is returned as an error.
    pub async fn resolve(
        &mut self,
        draft: Draft,
        lookup: &dyn CommitTimeLookup,
    ) -> Result<Draft, provider::Error> {
        let Some(commit) = draft.metric.commit_hash.clone() else {
            return Ok(draft);
        };

        if let Some((time, timestamp)) = self.get(&commit) {
            trace!("Using cached commit time for {commit}");
            let metric = draft.metric.with_cached_commit_time(time, timestamp);
            return Ok(Draft { metric, ..draft });
        }

        let Draft { metric, errors } = draft;
        let metric = lookup.resolve(metric).await?;
        let draft = Draft { metric, errors };

        match (&draft.metric.commit_time, draft.metric.commit_timestamp) {
            (Some(time), Some(timestamp)) => {
                self.entries.insert(commit, (time.clone(), timestamp));
                Ok(draft)
            }
            _ => Ok(draft.push_error(CollectError::UnresolvedCommitTime { commit })),
        }
    }
}
