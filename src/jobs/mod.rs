//! Batch jobs run against the media catalog

pub mod thumbnail_audit;

pub use thumbnail_audit::{AuditReport, ThumbnailAuditor};
