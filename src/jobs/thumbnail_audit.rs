//! Black thumbnail audit job
//!
//! Lists a library section once, then walks the items strictly in listing
//! order. Only the listing can fail the run; every per-item failure is folded
//! into that item's [DecisionRecord].

use std::sync::Arc;

use tokio_util::sync::CancellationToken;
use tracing::{debug, error, info, warn};

use crate::analysis::{
    decide, dispatch, heuristic, should_classify, ActionResult, BlackCheck, BlackFrameClassifier,
    ClassificationResult, DecisionRecord, Outcome,
};
use crate::catalog::{CatalogError, ItemRecord, MediaCatalog};
use crate::config::AnalyzerSettings;

/// Summary of one audit run
#[derive(Debug, Clone, Default)]
pub struct AuditReport {
    pub items_listed: usize,
    pub records: Vec<DecisionRecord>,
    /// Set when the run stopped before reaching the end of the listing
    pub cancelled: bool,
}

impl AuditReport {
    pub fn count(&self, outcome: Outcome) -> usize {
        self.records.iter().filter(|r| r.outcome == outcome).count()
    }

    pub fn failures(&self) -> usize {
        self.records.iter().filter(|r| r.failed()).count()
    }
}

/// Runs the detection pipeline against a catalog
pub struct ThumbnailAuditor {
    catalog: Arc<dyn MediaCatalog>,
    classifier: BlackFrameClassifier,
    settings: AnalyzerSettings,
}

impl ThumbnailAuditor {
    pub fn new(catalog: Arc<dyn MediaCatalog>, settings: AnalyzerSettings) -> Self {
        Self::with_classifier(catalog, settings, BlackFrameClassifier::default())
    }

    pub fn with_classifier(
        catalog: Arc<dyn MediaCatalog>,
        settings: AnalyzerSettings,
        classifier: BlackFrameClassifier,
    ) -> Self {
        Self {
            catalog,
            classifier,
            settings,
        }
    }

    /// Audit every item of `library_section_id`.
    ///
    /// Cancellation is checked between items; items already dispatched are unaffected.
    pub async fn run(
        &self,
        library_section_id: &str,
        cancel: &CancellationToken,
    ) -> Result<AuditReport, CatalogError> {
        let items = self.catalog.list_items(library_section_id).await?;
        info!(library_id = %library_section_id, count = items.len(), "Fetched library items");

        let mut report = AuditReport {
            items_listed: items.len(),
            ..Default::default()
        };

        for item in &items {
            if cancel.is_cancelled() {
                warn!(
                    processed = report.records.len(),
                    remaining = items.len() - report.records.len(),
                    "Audit cancelled"
                );
                report.cancelled = true;
                break;
            }

            let record = self.process_item(item).await;
            log_record(&record);
            report.records.push(record);
        }

        info!(
            analyzed = report.count(Outcome::Analyze),
            refreshed = report.count(Outcome::Refresh),
            untouched = report.count(Outcome::NoOp),
            failures = report.failures(),
            "Audit finished"
        );

        Ok(report)
    }

    /// Run one item through heuristic, gated classification, policy and dispatch
    pub async fn process_item(&self, item: &ItemRecord) -> DecisionRecord {
        let suspicious = heuristic::is_suspicious_opt(
            item.added_at,
            item.updated_at,
            self.settings.time_diff_threshold_secs,
        );

        debug!(
            item_id = %item.id,
            title = %item.title,
            lag_secs = ?item.update_lag_secs(),
            threshold_secs = self.settings.time_diff_threshold_secs,
            suspicious,
            "Checked update lag"
        );

        let mut classification = ClassificationResult {
            suspicious,
            black: None,
        };
        let mut failure = None;

        if should_classify(suspicious, self.settings.force_black_check) {
            match item.thumbnail() {
                Some(thumb) => match self.check_thumbnail(thumb).await {
                    Ok(check) => classification.black = Some(check),
                    Err(e) => failure = Some(e),
                },
                None => debug!(item_id = %item.id, "No thumbnail to classify"),
            }
        }

        let outcome = if failure.is_some() {
            Outcome::NoOp
        } else {
            decide(classification.suspicious, classification.is_black())
        };

        let action = match dispatch(self.catalog.as_ref(), &item.id, outcome).await {
            Ok(()) if outcome == Outcome::NoOp => ActionResult::NotRequired,
            Ok(()) => ActionResult::Accepted,
            Err(e) => ActionResult::Rejected(e.to_string()),
        };

        DecisionRecord {
            item_id: item.id.clone(),
            title: item.title.clone(),
            library_section_id: item.library_section_id.clone(),
            update_lag_secs: item.update_lag_secs(),
            suspicious,
            black_ratio: classification.black_ratio(),
            is_black: classification.is_black(),
            outcome,
            action,
            failure,
        }
    }

    async fn check_thumbnail(&self, thumb: &str) -> Result<BlackCheck, String> {
        let bytes = self
            .catalog
            .fetch_thumbnail(thumb)
            .await
            .map_err(|e| e.to_string())?;

        self.classifier
            .classify(&bytes, self.settings.blackness_threshold)
            .map_err(|e| e.to_string())
    }
}

fn log_record(record: &DecisionRecord) {
    let fields = serde_json::to_string(record).unwrap_or_default();

    if let Some(reason) = &record.failure {
        warn!(item_id = %record.item_id, title = %record.title, reason = %reason, record = %fields, "Item skipped");
        return;
    }

    match &record.action {
        ActionResult::Rejected(reason) => error!(
            item_id = %record.item_id,
            outcome = %record.outcome,
            reason = %reason,
            record = %fields,
            "Recovery action failed"
        ),
        ActionResult::Accepted => info!(
            item_id = %record.item_id,
            title = %record.title,
            outcome = %record.outcome,
            record = %fields,
            "Recovery action sent"
        ),
        ActionResult::NotRequired => info!(
            item_id = %record.item_id,
            outcome = %record.outcome,
            record = %fields,
            "Item left unchanged"
        ),
    }
}

#[cfg(test)]
mod tests {
    use std::sync::Mutex;
    use std::sync::atomic::{AtomicUsize, Ordering};

    use async_trait::async_trait;
    use chrono::DateTime;

    use super::*;

    struct ListingOnly {
        items: Vec<ItemRecord>,
        fetches: AtomicUsize,
        triggers: Mutex<Vec<String>>,
    }

    #[async_trait]
    impl MediaCatalog for ListingOnly {
        async fn list_items(&self, _section: &str) -> Result<Vec<ItemRecord>, CatalogError> {
            Ok(self.items.clone())
        }

        async fn fetch_thumbnail(&self, _thumb: &str) -> Result<Vec<u8>, CatalogError> {
            self.fetches.fetch_add(1, Ordering::SeqCst);
            Err(CatalogError::Fetch("404 Not Found".into()))
        }

        async fn trigger_analyze(&self, item_id: &str) -> Result<(), CatalogError> {
            self.triggers.lock().unwrap().push(format!("analyze:{item_id}"));
            Ok(())
        }

        async fn trigger_refresh(&self, item_id: &str) -> Result<(), CatalogError> {
            self.triggers.lock().unwrap().push(format!("refresh:{item_id}"));
            Ok(())
        }
    }

    /// Cancels the shared token as soon as the first refresh is sent
    struct CancelOnRefresh {
        items: Vec<ItemRecord>,
        token: CancellationToken,
        triggers: Mutex<Vec<String>>,
    }

    #[async_trait]
    impl MediaCatalog for CancelOnRefresh {
        async fn list_items(&self, _section: &str) -> Result<Vec<ItemRecord>, CatalogError> {
            Ok(self.items.clone())
        }

        async fn fetch_thumbnail(&self, _thumb: &str) -> Result<Vec<u8>, CatalogError> {
            Err(CatalogError::Fetch("unexpected fetch".into()))
        }

        async fn trigger_analyze(&self, item_id: &str) -> Result<(), CatalogError> {
            self.triggers.lock().unwrap().push(format!("analyze:{item_id}"));
            Ok(())
        }

        async fn trigger_refresh(&self, item_id: &str) -> Result<(), CatalogError> {
            self.triggers.lock().unwrap().push(format!("refresh:{item_id}"));
            self.token.cancel();
            Ok(())
        }
    }

    fn item(id: &str, lag: i64, thumb: Option<&str>) -> ItemRecord {
        ItemRecord {
            id: id.into(),
            title: format!("Recording {id}"),
            added_at: DateTime::from_timestamp(1_700_000_000, 0),
            updated_at: DateTime::from_timestamp(1_700_000_000 + lag, 0),
            thumbnail_ref: thumb.map(String::from),
            library_section_id: "5".into(),
        }
    }

    fn stub_catalog(items: Vec<ItemRecord>) -> Arc<ListingOnly> {
        Arc::new(ListingOnly {
            items,
            fetches: AtomicUsize::new(0),
            triggers: Mutex::new(Vec::new()),
        })
    }

    #[tokio::test]
    async fn test_suspicious_without_thumbnail_falls_back_to_refresh() {
        let catalog = stub_catalog(vec![item("1", 30, Some(""))]);
        let auditor = ThumbnailAuditor::new(catalog.clone(), AnalyzerSettings::default());

        let report = auditor.run("5", &CancellationToken::new()).await.unwrap();

        let record = &report.records[0];
        assert!(record.suspicious);
        assert_eq!(record.black_ratio, None);
        assert_eq!(record.outcome, Outcome::Refresh);
        assert_eq!(record.action, ActionResult::Accepted);
        assert_eq!(catalog.fetches.load(Ordering::SeqCst), 0);
        assert_eq!(*catalog.triggers.lock().unwrap(), vec!["refresh:1"]);
    }

    #[tokio::test]
    async fn test_missing_timestamps_not_suspicious() {
        let mut unknown = item("2", 0, Some("/thumb/2"));
        unknown.added_at = None;
        let catalog = stub_catalog(vec![unknown]);
        let auditor = ThumbnailAuditor::new(catalog.clone(), AnalyzerSettings::default());

        let record = auditor.process_item(&catalog.items[0]).await;

        assert!(!record.suspicious);
        assert_eq!(record.update_lag_secs, None);
        assert_eq!(record.outcome, Outcome::NoOp);
        assert_eq!(record.action, ActionResult::NotRequired);
        assert_eq!(catalog.fetches.load(Ordering::SeqCst), 0);
    }

    #[tokio::test]
    async fn test_cancelled_before_start_processes_nothing() {
        let catalog = stub_catalog(vec![item("1", 30, None), item("2", 30, None)]);
        let auditor = ThumbnailAuditor::new(catalog.clone(), AnalyzerSettings::default());
        let cancel = CancellationToken::new();
        cancel.cancel();

        let report = auditor.run("5", &cancel).await.unwrap();

        assert!(report.cancelled);
        assert_eq!(report.items_listed, 2);
        assert!(report.records.is_empty());
        assert!(catalog.triggers.lock().unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_report_tallies() {
        let catalog = stub_catalog(vec![
            item("1", 30, None),
            item("2", 900, None),
            item("3", 30, Some("/thumb/3")),
        ]);
        let auditor = ThumbnailAuditor::new(catalog.clone(), AnalyzerSettings::default());

        let report = auditor.run("5", &CancellationToken::new()).await.unwrap();

        assert_eq!(report.count(Outcome::Refresh), 1);
        assert_eq!(report.count(Outcome::NoOp), 2);
        assert_eq!(report.failures(), 1);
        assert!(!report.cancelled);
    }

    #[tokio::test]
    async fn test_cancel_during_item_stops_before_next() {
        let cancel = CancellationToken::new();
        let catalog = Arc::new(CancelOnRefresh {
            items: vec![item("1", 30, None), item("2", 30, None)],
            token: cancel.clone(),
            triggers: Mutex::new(Vec::new()),
        });
        let auditor = ThumbnailAuditor::new(catalog.clone(), AnalyzerSettings::default());

        let report = auditor.run("5", &cancel).await.unwrap();

        assert!(report.cancelled);
        assert_eq!(report.items_listed, 2);
        assert_eq!(report.records.len(), 1);
        assert_eq!(report.records[0].item_id, "1");
        assert_eq!(report.records[0].action, ActionResult::Accepted);
        assert_eq!(*catalog.triggers.lock().unwrap(), vec!["refresh:1"]);
    }
}
