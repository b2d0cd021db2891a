//! Temporal heuristic for thumbnails captured mid-recording
//!
//! A recording whose metadata was last touched only moments after it was added
//! most likely still carries the thumbnail grabbed while it was in progress.

use chrono::{DateTime, Utc};

/// True when `updated_at - added_at` is below `threshold_secs`.
///
/// The raw difference is used, so a negative lag (clock skew) below the
/// threshold is suspicious too. A threshold of 0 turns the heuristic off for
/// every consistent item.
pub fn is_suspicious(added_at: DateTime<Utc>, updated_at: DateTime<Utc>, threshold_secs: f64) -> bool {
    let diff = (updated_at - added_at).num_seconds() as f64;
    diff < threshold_secs
}

/// Heuristic over possibly-missing timestamps; unknown timestamps are never suspicious.
pub fn is_suspicious_opt(
    added_at: Option<DateTime<Utc>>,
    updated_at: Option<DateTime<Utc>>,
    threshold_secs: f64,
) -> bool {
    match (added_at, updated_at) {
        (Some(added), Some(updated)) => is_suspicious(added, updated, threshold_secs),
        _ => false,
    }
}

#[cfg(test)]
mod tests {
    use chrono::TimeDelta;

    use super::*;

    fn at(secs: i64) -> DateTime<Utc> {
        DateTime::from_timestamp(1_700_000_000 + secs, 0).unwrap()
    }

    #[test]
    fn test_below_threshold_is_suspicious() {
        assert!(is_suspicious(at(0), at(60), 180.0));
        assert!(is_suspicious(at(0), at(179), 180.0));
    }

    #[test]
    fn test_threshold_is_exclusive() {
        assert!(!is_suspicious(at(0), at(180), 180.0));
        assert!(!is_suspicious(at(0), at(600), 180.0));
    }

    #[test]
    fn test_zero_threshold_disables() {
        for lag in [0, 1, 60, 86_400] {
            assert!(!is_suspicious(at(0), at(lag), 0.0), "lag {lag}");
        }
    }

    #[test]
    fn test_negative_lag_uses_raw_difference() {
        assert!(is_suspicious(at(100), at(0), 180.0));
        assert!(is_suspicious(at(100), at(0), 0.0));
    }

    #[test]
    fn test_fractional_threshold() {
        let added = at(0);
        assert!(is_suspicious(added, added + TimeDelta::seconds(90), 90.5));
        assert!(!is_suspicious(added, added + TimeDelta::seconds(91), 90.5));
    }

    #[test]
    fn test_missing_timestamps_not_suspicious() {
        assert!(!is_suspicious_opt(None, Some(at(0)), 180.0));
        assert!(!is_suspicious_opt(Some(at(0)), None, 180.0));
        assert!(is_suspicious_opt(Some(at(0)), Some(at(1)), 180.0));
    }

    #[test]
    fn test_property_matches_definition() {
        for threshold in [0.0, 1.0, 59.5, 180.0, 3600.0] {
            for lag in (0..4000).step_by(37) {
                let expected = (lag as f64) < threshold;
                assert_eq!(is_suspicious(at(0), at(lag), threshold), expected);
            }
        }
    }
}
