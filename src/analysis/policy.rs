//! Decision policy: maps the heuristic and classifier signals to a recovery action

use std::fmt;

use serde::Serialize;

/// Recovery action chosen for an item
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum Outcome {
    /// Thumbnail is black: regenerate it
    Analyze,
    /// Thumbnail looks fine but the item is flagged: advance `updatedAt` cheaply
    Refresh,
    NoOp,
}

impl fmt::Display for Outcome {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Outcome::Analyze => write!(f, "analyze"),
            Outcome::Refresh => write!(f, "refresh"),
            Outcome::NoOp => write!(f, "noop"),
        }
    }
}

/// Whether the classifier may run for an item.
///
/// Classification costs a full thumbnail download, so it only runs for
/// suspicious items unless forced.
pub fn should_classify(suspicious: bool, force_black_check: bool) -> bool {
    suspicious || force_black_check
}

/// Choose the outcome. `is_black` is `None` when blackness was not evaluated.
///
/// A black thumbnail is always re-analyzed. A suspicious item without a
/// confirmed black thumbnail (including one that could not be evaluated) is
/// refreshed. Everything else is left alone.
pub fn decide(suspicious: bool, is_black: Option<bool>) -> Outcome {
    match (suspicious, is_black) {
        (_, Some(true)) => Outcome::Analyze,
        (true, Some(false)) | (true, None) => Outcome::Refresh,
        (false, _) => Outcome::NoOp,
    }
}
