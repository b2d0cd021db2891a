//! Action dispatcher: one remote trigger per non-NoOp outcome

use tracing::debug;

use super::policy::Outcome;
use crate::catalog::{CatalogError, MediaCatalog};

/// Send the trigger matching `outcome` for `item_id`.
///
/// Every call goes to the catalog; nothing is remembered between calls, so
/// repeating a dispatch repeats the request.
pub async fn dispatch(
    catalog: &dyn MediaCatalog,
    item_id: &str,
    outcome: Outcome,
) -> Result<(), CatalogError> {
    match outcome {
        Outcome::Analyze => catalog.trigger_analyze(item_id).await,
        Outcome::Refresh => catalog.trigger_refresh(item_id).await,
        Outcome::NoOp => {
            debug!(item_id = %item_id, "No action required");
            Ok(())
        }
    }
}

#[cfg(test)]
mod tests {
    use std::sync::Mutex;

    use assert_matches::assert_matches;
    use async_trait::async_trait;

    use super::*;
    use crate::catalog::ItemRecord;

    #[derive(Default)]
    struct RecordingCatalog {
        calls: Mutex<Vec<(String, String)>>,
        reject_analyze: bool,
    }

    impl RecordingCatalog {
        fn calls(&self) -> Vec<(String, String)> {
            self.calls.lock().unwrap().clone()
        }

        fn record(&self, action: &str, item_id: &str) {
            self.calls
                .lock()
                .unwrap()
                .push((action.to_string(), item_id.to_string()));
        }
    }

    #[async_trait]
    impl MediaCatalog for RecordingCatalog {
        async fn list_items(&self, _section: &str) -> Result<Vec<ItemRecord>, CatalogError> {
            Ok(vec![])
        }

        async fn fetch_thumbnail(&self, _thumb: &str) -> Result<Vec<u8>, CatalogError> {
            unreachable!("dispatcher never fetches thumbnails")
        }

        async fn trigger_analyze(&self, item_id: &str) -> Result<(), CatalogError> {
            self.record("analyze", item_id);
            if self.reject_analyze {
                return Err(CatalogError::ActionRejected("404 Not Found".into()));
            }
            Ok(())
        }

        async fn trigger_refresh(&self, item_id: &str) -> Result<(), CatalogError> {
            self.record("refresh", item_id);
            Ok(())
        }
    }

    #[tokio::test]
    async fn test_outcome_routing() {
        let catalog = RecordingCatalog::default();

        dispatch(&catalog, "1", Outcome::Analyze).await.unwrap();
        dispatch(&catalog, "2", Outcome::Refresh).await.unwrap();
        dispatch(&catalog, "3", Outcome::NoOp).await.unwrap();

        assert_eq!(
            catalog.calls(),
            vec![
                ("analyze".to_string(), "1".to_string()),
                ("refresh".to_string(), "2".to_string()),
            ]
        );
    }

    #[tokio::test]
    async fn test_repeat_dispatch_is_not_memoized() {
        let catalog = RecordingCatalog::default();

        dispatch(&catalog, "9", Outcome::Refresh).await.unwrap();
        dispatch(&catalog, "9", Outcome::Refresh).await.unwrap();

        assert_eq!(catalog.calls().len(), 2);
    }

    #[tokio::test]
    async fn test_rejection_is_returned() {
        let catalog = RecordingCatalog {
            reject_analyze: true,
            ..Default::default()
        };

        let result = dispatch(&catalog, "4", Outcome::Analyze).await;
        assert_matches!(result, Err(CatalogError::ActionRejected(_)));
    }
}
