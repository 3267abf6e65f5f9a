//! Deciding whether a build is worth examining yet.
//!
//! A build that failed, errored, or was cancelled will never produce an image, and one that is
//! still new, pending, or running usually has not produced one yet. Both are expected
//! conditions: they are skipped quietly rather than reported.

use crate::build::BuildPhase;

#[derive(Clone, Debug, PartialEq, Eq)]
pub enum Readiness {
    Ready,
    /// The build ended without success
    Terminated(BuildPhase),
    /// The build is still in progress and has no image yet
    InProgress(BuildPhase),
}

impl Readiness {
    pub fn is_ready(&self) -> bool {
        matches!(self, Readiness::Ready)
    }
}

/// Classify a build by its phase and whether an image digest is already known.
///
/// A build without a phase, or with one not listed here, is treated as finished and ready.
pub fn check(phase: Option<&BuildPhase>, has_image: bool) -> Readiness {
    match phase {
        Some(p @ (BuildPhase::Failed | BuildPhase::Error | BuildPhase::Cancelled)) => {
            Readiness::Terminated(p.clone())
        }
        Some(p @ (BuildPhase::New | BuildPhase::Pending | BuildPhase::Running)) => {
            if has_image {
                Readiness::Ready
            } else {
                Readiness::InProgress(p.clone())
            }
        }
        _ => Readiness::Ready,
    }
}
