//! Per-item analysis facts, produced for structured logging

use serde::Serialize;

use super::policy::Outcome;

/// Result of running the image classifier on a thumbnail.
///
/// `is_black` only exists alongside a measured ratio.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct BlackCheck {
    pub ratio: f64,
    pub is_black: bool,
}

impl BlackCheck {
    pub fn new(ratio: f64, blackness_threshold: f64) -> Self {
        Self {
            ratio,
            is_black: ratio >= blackness_threshold,
        }
    }
}

/// Combined heuristic and classifier signals for one item
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct ClassificationResult {
    pub suspicious: bool,
    /// `None` when the classifier did not run
    pub black: Option<BlackCheck>,
}

impl ClassificationResult {
    pub fn black_ratio(&self) -> Option<f64> {
        self.black.map(|b| b.ratio)
    }

    pub fn is_black(&self) -> Option<bool> {
        self.black.map(|b| b.is_black)
    }
}

/// What happened when the outcome was dispatched
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "status", content = "detail", rename_all = "snake_case")]
pub enum ActionResult {
    /// Outcome was NoOp, nothing sent
    NotRequired,
    Accepted,
    Rejected(String),
}

/// Everything known about one item after it went through the pipeline
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct DecisionRecord {
    pub item_id: String,
    pub title: String,
    pub library_section_id: String,
    pub update_lag_secs: Option<i64>,
    pub suspicious: bool,
    pub black_ratio: Option<f64>,
    pub is_black: Option<bool>,
    pub outcome: Outcome,
    pub action: ActionResult,
    /// Fetch or decode failure that forced the outcome to NoOp
    #[serde(skip_serializing_if = "Option::is_none")]
    pub failure: Option<String>,
}

impl DecisionRecord {
    /// True when the item hit a fetch, decode or dispatch failure
    pub fn failed(&self) -> bool {
        self.failure.is_some() || matches!(self.action, ActionResult::Rejected(_))
    }
}
