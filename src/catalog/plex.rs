//! Plex Media Server client
//!
//! Lists library sections as XML (`/library/sections/{id}/all`), downloads
//! thumbnails and issues the `analyze` / `refresh` PUT triggers. Every request
//! carries the auth token as the `X-Plex-Token` query parameter.

use std::time::Duration;

use async_trait::async_trait;
use quick_xml::events::{BytesStart, Event};
use quick_xml::Reader;
use reqwest::{Client, Request, Response, StatusCode};
use tracing::{debug, info};
use url::Url;

use super::types::{parse_unix_seconds, ItemRecord};
use super::{CatalogError, MediaCatalog};

const TOKEN_PARAM: &str = "X-Plex-Token";

/// Largest thumbnail body accepted before the download is abandoned
pub const MAX_THUMBNAIL_BYTES: u64 = 16 * 1024 * 1024;

/// Plex HTTP API client
pub struct PlexClient {
    client: Client,
    base_url: Url,
    token: String,
}

impl PlexClient {
    /// Create a client for `base_url` (e.g. `http://192.168.10.20:32400`)
    pub fn new(base_url: &str, token: String, timeout: Duration) -> Result<Self, CatalogError> {
        let base_url =
            Url::parse(base_url).map_err(|e| CatalogError::InvalidUrl(format!("{base_url}: {e}")))?;

        let client = Client::builder()
            .user_agent("thumbwatch/0.1")
            .timeout(timeout)
            .build()
            .map_err(|e| CatalogError::Unavailable(format!("failed to create HTTP client: {e}")))?;

        Ok(Self {
            client,
            base_url,
            token,
        })
    }

    /// Resolve a thumbnail locator against the server: `/`-prefixed paths are
    /// server-relative, anything else must already be an absolute URL.
    pub fn resolve_thumbnail_url(&self, thumbnail_ref: &str) -> Result<Url, CatalogError> {
        let result = if thumbnail_ref.starts_with('/') {
            self.base_url.join(thumbnail_ref)
        } else {
            Url::parse(thumbnail_ref)
        };
        result.map_err(|e| CatalogError::InvalidUrl(format!("{thumbnail_ref}: {e}")))
    }

    fn endpoint(&self, path: &str) -> Result<Url, CatalogError> {
        self.base_url
            .join(path)
            .map_err(|e| CatalogError::InvalidUrl(format!("{path}: {e}")))
    }

    /// Build the PUT request for a recovery trigger
    pub fn trigger_request(
        &self,
        item_id: &str,
        trigger: Trigger,
    ) -> Result<Request, CatalogError> {
        let action = trigger.as_str();
        let url = self.endpoint(&format!("/library/metadata/{item_id}/{action}"))?;
        self.client
            .put(url)
            .query(&[(TOKEN_PARAM, self.token.as_str())])
            .query(trigger.extra_query())
            .build()
            .map_err(|e| CatalogError::ActionRejected(format!("{action} {item_id}: {e}")))
    }

    async fn put_trigger(&self, item_id: &str, trigger: Trigger) -> Result<(), CatalogError> {
        let action = trigger.as_str();
        let request = self.trigger_request(item_id, trigger)?;
        let response = self
            .client
            .execute(request)
            .await
            .map_err(|e| CatalogError::ActionRejected(format!("{action} {item_id}: {e}")))?;

        let status = response.status();
        check_status(status, &format!("{action} {item_id}"), CatalogError::ActionRejected)?;

        info!(item_id = %item_id, action = %action, status = %status, "Trigger accepted");
        Ok(())
    }
}

/// Remote recovery actions
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Trigger {
    Analyze,
    Refresh,
}

impl Trigger {
    pub fn as_str(&self) -> &'static str {
        match self {
            Trigger::Analyze => "analyze",
            Trigger::Refresh => "refresh",
        }
    }

    fn extra_query(&self) -> &'static [(&'static str, &'static str)] {
        match self {
            Trigger::Analyze => &[],
            // Without force Plex skips items it considers up to date.
            Trigger::Refresh => &[("force", "1")],
        }
    }
}

/// Map a non-success status to the error kind of the calling operation
fn check_status<F>(status: StatusCode, context: &str, kind: F) -> Result<(), CatalogError>
where
    F: FnOnce(String) -> CatalogError,
{
    if status.is_success() {
        Ok(())
    } else {
        Err(kind(format!("{context}: server returned {status}")))
    }
}

fn check_thumbnail_size(thumbnail_ref: &str, size: u64) -> Result<(), CatalogError> {
    if size > MAX_THUMBNAIL_BYTES {
        return Err(CatalogError::Fetch(format!(
            "{thumbnail_ref}: thumbnail exceeds {MAX_THUMBNAIL_BYTES} bytes"
        )));
    }
    Ok(())
}

#[async_trait]
impl MediaCatalog for PlexClient {
    async fn list_items(&self, library_section_id: &str) -> Result<Vec<ItemRecord>, CatalogError> {
        let url = self.endpoint(&format!("/library/sections/{library_section_id}/all"))?;
        debug!(library_id = %library_section_id, "Listing library section");

        let response = self
            .client
            .get(url)
            .query(&[(TOKEN_PARAM, self.token.as_str())])
            .header(reqwest::header::ACCEPT, "application/xml")
            .send()
            .await
            .map_err(|e| CatalogError::Unavailable(e.to_string()))?;

        let body = success_body(response).await?;

        parse_section_listing(&body, library_section_id)
    }

    async fn fetch_thumbnail(&self, thumbnail_ref: &str) -> Result<Vec<u8>, CatalogError> {
        let url = self.resolve_thumbnail_url(thumbnail_ref)?;

        let mut response = self
            .client
            .get(url)
            .query(&[(TOKEN_PARAM, self.token.as_str())])
            .send()
            .await
            .map_err(|e| CatalogError::Fetch(format!("{thumbnail_ref}: {e}")))?;

        check_status(response.status(), thumbnail_ref, CatalogError::Fetch)?;

        if let Some(declared) = response.content_length() {
            check_thumbnail_size(thumbnail_ref, declared)?;
        }

        let mut bytes = Vec::new();
        while let Some(chunk) = response
            .chunk()
            .await
            .map_err(|e| CatalogError::Fetch(format!("{thumbnail_ref}: {e}")))?
        {
            bytes.extend_from_slice(&chunk);
            check_thumbnail_size(thumbnail_ref, bytes.len() as u64)?;
        }

        debug!(thumb = %thumbnail_ref, size = bytes.len(), "Downloaded thumbnail");
        Ok(bytes)
    }

    async fn trigger_analyze(&self, item_id: &str) -> Result<(), CatalogError> {
        self.put_trigger(item_id, Trigger::Analyze).await
    }

    async fn trigger_refresh(&self, item_id: &str) -> Result<(), CatalogError> {
        self.put_trigger(item_id, Trigger::Refresh).await
    }
}

async fn success_body(response: Response) -> Result<String, CatalogError> {
    check_status(response.status(), "listing", CatalogError::Unavailable)?;
    response
        .text()
        .await
        .map_err(|e| CatalogError::Unavailable(format!("failed to read response body: {e}")))
}

/// Parse a `MediaContainer` listing into item records, keeping server order.
///
/// Only `<Video>` elements are items; nested `<Media>`/`<Part>` children are ignored.
pub fn parse_section_listing(
    xml: &str,
    library_section_id: &str,
) -> Result<Vec<ItemRecord>, CatalogError> {
    let mut reader = Reader::from_str(xml);
    reader.config_mut().trim_text(true);

    let mut items = Vec::new();
    let mut saw_container = false;

    loop {
        match reader.read_event() {
            Ok(Event::Start(ref e)) | Ok(Event::Empty(ref e)) => match e.name().as_ref() {
                b"MediaContainer" => saw_container = true,
                b"Video" => {
                    if let Some(item) = video_to_item(e, library_section_id)? {
                        items.push(item);
                    }
                }
                _ => {}
            },
            Ok(Event::Eof) => break,
            Err(e) => {
                return Err(CatalogError::Unavailable(format!(
                    "malformed listing at byte {}: {e}",
                    reader.buffer_position()
                )));
            }
            _ => {}
        }
    }

    if !saw_container {
        return Err(CatalogError::Unavailable(
            "listing has no MediaContainer element".to_string(),
        ));
    }

    Ok(items)
}

fn video_to_item(
    element: &BytesStart<'_>,
    library_section_id: &str,
) -> Result<Option<ItemRecord>, CatalogError> {
    let mut rating_key = None;
    let mut title = None;
    let mut added_at = None;
    let mut updated_at = None;
    let mut thumb = None;

    for attr in element.attributes() {
        let attr = attr.map_err(|e| CatalogError::Unavailable(format!("bad attribute: {e}")))?;
        let value = attr
            .unescape_value()
            .map_err(|e| CatalogError::Unavailable(format!("bad attribute value: {e}")))?
            .into_owned();

        match attr.key.as_ref() {
            b"ratingKey" => rating_key = Some(value),
            b"title" => title = Some(value),
            b"addedAt" => added_at = parse_unix_seconds(&value),
            b"updatedAt" => updated_at = parse_unix_seconds(&value),
            b"thumb" => thumb = Some(value),
            _ => {}
        }
    }

    // Without a ratingKey no trigger can be addressed at the item.
    let Some(id) = rating_key.filter(|key| !key.is_empty()) else {
        debug!("Skipping Video element without ratingKey");
        return Ok(None);
    };

    Ok(Some(ItemRecord {
        id,
        title: title.unwrap_or_else(|| "Unknown".to_string()),
        added_at,
        updated_at,
        thumbnail_ref: thumb,
        library_section_id: library_section_id.to_string(),
    }))
}
