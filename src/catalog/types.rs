//! Catalog entry model

use chrono::{DateTime, Utc};

/// A library entry as reported by the catalog listing.
///
/// Built fresh from every listing response and never mutated afterwards.
#[derive(Debug, Clone, PartialEq)]
pub struct ItemRecord {
    /// Stable identifier used in recovery-action URLs (Plex `ratingKey`)
    pub id: String,
    /// Display title, for diagnostics only
    pub title: String,
    /// `None` when the catalog omitted the timestamp or sent something non-numeric
    pub added_at: Option<DateTime<Utc>>,
    pub updated_at: Option<DateTime<Utc>>,
    /// Absolute or server-relative locator of the current thumbnail
    pub thumbnail_ref: Option<String>,
    pub library_section_id: String,
}

impl ItemRecord {
    /// Thumbnail locator, if the item has a usable one.
    ///
    /// Plex points items without artwork at a `none` placeholder resource
    /// (e.g. `/:/resources/none.png`).
    pub fn thumbnail(&self) -> Option<&str> {
        self.thumbnail_ref
            .as_deref()
            .map(str::trim)
            .filter(|thumb| !thumb.is_empty() && !is_placeholder(thumb))
    }

    /// Seconds between the two catalog timestamps, when both are known
    pub fn update_lag_secs(&self) -> Option<i64> {
        match (self.added_at, self.updated_at) {
            (Some(added), Some(updated)) => Some((updated - added).num_seconds()),
            _ => None,
        }
    }
}

/// True when the last path segment of the locator is named `none`, any extension
fn is_placeholder(thumb: &str) -> bool {
    let path = thumb.split(['?', '#']).next().unwrap_or_default();
    let name = path.rsplit('/').next().unwrap_or_default();
    let stem = name.split('.').next().unwrap_or_default();
    stem.eq_ignore_ascii_case("none")
}

/// Parse a unix-seconds string into an instant
pub fn parse_unix_seconds(raw: &str) -> Option<DateTime<Utc>> {
    let raw = raw.trim();
    if raw.is_empty() || !raw.bytes().all(|b| b.is_ascii_digit()) {
        return None;
    }
    raw.parse::<i64>()
        .ok()
        .and_then(|secs| DateTime::from_timestamp(secs, 0))
}
