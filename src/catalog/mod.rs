//! Remote media catalog
//!
//! The engine only talks to the catalog through [MediaCatalog], so the HTTP
//! client in [plex] can be swapped for an in-memory stub in tests.

pub mod plex;
pub mod types;

use async_trait::async_trait;
use thiserror::Error;

pub use plex::PlexClient;
pub use types::ItemRecord;

/// Failures reported by a catalog collaborator
#[derive(Debug, Error)]
pub enum CatalogError {
    /// Listing failed (transport, auth, malformed response). Fatal to a run.
    #[error("catalog unavailable: {0}")]
    Unavailable(String),

    /// Thumbnail download failed. Affects a single item.
    #[error("thumbnail fetch failed: {0}")]
    Fetch(String),

    /// The server refused a recovery trigger. Affects a single item.
    #[error("action rejected: {0}")]
    ActionRejected(String),

    #[error("invalid url: {0}")]
    InvalidUrl(String),
}

/// Operations the engine consumes from the remote catalog.
///
/// Trigger calls must be safe to repeat; implementations keep no memo of
/// previous calls.
#[async_trait]
pub trait MediaCatalog: Send + Sync {
    /// List every item of a library section, in server order
    async fn list_items(&self, library_section_id: &str) -> Result<Vec<ItemRecord>, CatalogError>;

    /// Download the raw encoded bytes of a thumbnail
    async fn fetch_thumbnail(&self, thumbnail_ref: &str) -> Result<Vec<u8>, CatalogError>;

    /// Ask the server to re-analyze an item (regenerates thumbnail and media info)
    async fn trigger_analyze(&self, item_id: &str) -> Result<(), CatalogError>;

    /// Ask the server to refresh an item's metadata (advances `updatedAt`)
    async fn trigger_refresh(&self, item_id: &str) -> Result<(), CatalogError>;
}
