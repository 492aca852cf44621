//! Short-lived URLs for in-memory binaries.
//!
//! An `ObjectUrl` is the only owner of its registry entry: the URL resolves
//! through `/objects/:token` for as long as the handle is alive and is
//! revoked when the handle is dropped. Each fetch is timestamped so the
//! page holding the handle counts as in use while its links are followed.

use std::collections::HashMap;
use std::sync::{Arc, Mutex, Weak};

use bytes::Bytes;
use tokio::time::Instant;
use tracing::debug;
use uuid::Uuid;

use super::lock;

pub const PDF_CONTENT_TYPE: &str = "application/pdf";

#[derive(Debug, Clone)]
pub struct StoredObject {
    pub content_type: &'static str,
    pub data: Bytes,
}

struct Entry {
    object: StoredObject,
    last_fetched: Option<Instant>,
}

type Table = Mutex<HashMap<Uuid, Entry>>;

#[derive(Clone)]
pub struct ObjectUrls {
    table: Arc<Table>,
    base_url: Arc<str>,
}

impl ObjectUrls {
    /// `base_url` is prepended to `/objects/<token>`; pass "" for host-relative URLs.
    pub fn new(base_url: &str) -> Self {
        Self {
            table: Arc::default(),
            base_url: Arc::from(base_url),
        }
    }

    pub fn create(&self, data: Bytes, content_type: &'static str) -> ObjectUrl {
        let token = Uuid::new_v4();
        let size = data.len();
        lock(&self.table).insert(
            token,
            Entry {
                object: StoredObject { content_type, data },
                last_fetched: None,
            },
        );
        debug!(%token, content_type, size, "Object URL created");
        ObjectUrl {
            token,
            href: format!("{}/objects/{token}", self.base_url),
            table: Arc::downgrade(&self.table),
        }
    }

    pub fn fetch(&self, token: &Uuid) -> Option<StoredObject> {
        let mut table = lock(&self.table);
        let entry = table.get_mut(token)?;
        entry.last_fetched = Some(Instant::now());
        Some(entry.object.clone())
    }

    pub fn live_count(&self) -> usize {
        lock(&self.table).len()
    }
}

#[derive(Debug)]
pub struct ObjectUrl {
    token: Uuid,
    href: String,
    table: Weak<Table>,
}

impl ObjectUrl {
    pub fn href(&self) -> &str {
        &self.href
    }

    pub fn token(&self) -> Uuid {
        self.token
    }

    /// When the URL was last served, if ever.
    pub fn last_fetched(&self) -> Option<Instant> {
        let table = self.table.upgrade()?;
        let entries = lock(&table);
        entries.get(&self.token).and_then(|entry| entry.last_fetched)
    }
}

impl Drop for ObjectUrl {
    fn drop(&mut self) {
        if let Some(table) = self.table.upgrade() {
            lock(&table).remove(&self.token);
            debug!(token = %self.token, "Object URL revoked");
        }
    }
}

/// Best-effort image type from magic bytes.
pub fn sniff_image_type(data: &[u8]) -> &'static str {
    if data.starts_with(b"\x89PNG\r\n\x1a\n") {
        "image/png"
    } else if data.starts_with(&[0xFF, 0xD8, 0xFF]) {
        "image/jpeg"
    } else if data.starts_with(b"GIF87a") || data.starts_with(b"GIF89a") {
        "image/gif"
    } else if data.len() >= 12 && &data[0..4] == b"RIFF" && &data[8..12] == b"WEBP" {
        "image/webp"
    } else {
        "application/octet-stream"
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_url_resolves_until_dropped() {
        let urls = ObjectUrls::new("");
        let url = urls.create(Bytes::from_static(b"%PDF"), PDF_CONTENT_TYPE);
        assert_eq!(url.href(), format!("/objects/{}", url.token()));

        let stored = urls.fetch(&url.token()).unwrap();
        assert_eq!(stored.content_type, "application/pdf");
        assert_eq!(&stored.data[..], b"%PDF");

        let token = url.token();
        drop(url);
        assert!(urls.fetch(&token).is_none());
        assert_eq!(urls.live_count(), 0);
    }

    #[test]
    fn test_fetch_records_last_use() {
        let urls = ObjectUrls::new("");
        let url = urls.create(Bytes::from_static(b"%PDF"), PDF_CONTENT_TYPE);
        assert!(url.last_fetched().is_none());

        let before = Instant::now();
        urls.fetch(&url.token()).unwrap();
        assert!(url.last_fetched().is_some_and(|at| at >= before));
    }

    #[test]
    fn test_base_url_prefix() {
        let urls = ObjectUrls::new("https://review.example.com");
        let url = urls.create(Bytes::new(), PDF_CONTENT_TYPE);
        assert!(url
            .href()
            .starts_with("https://review.example.com/objects/"));
    }

    #[test]
    fn test_handle_outliving_registry_is_harmless() {
        let urls = ObjectUrls::new("");
        let url = urls.create(Bytes::new(), PDF_CONTENT_TYPE);
        drop(urls);
        drop(url);
    }

    #[test]
    fn test_sniff_image_type() {
        assert_eq!(sniff_image_type(b"\x89PNG\r\n\x1a\nrest"), "image/png");
        assert_eq!(sniff_image_type(&[0xFF, 0xD8, 0xFF, 0xE0]), "image/jpeg");
        assert_eq!(sniff_image_type(b"GIF89a..."), "image/gif");
        assert_eq!(sniff_image_type(b"RIFF\0\0\0\0WEBPVP8 "), "image/webp");
        assert_eq!(sniff_image_type(b"hello"), "application/octet-stream");
    }
}
