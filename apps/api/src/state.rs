use std::sync::Arc;

use crate::auth::SessionResolver;
use crate::config::Config;
use crate::review::{ObjectUrls, ViewerPages};
use crate::storage::{BlobStore, KvStore};

/// Shared application state injected into all route handlers via Axum extractors.
#[derive(Clone)]
pub struct AppState {
    /// Analysis records, keyed `resume:<id>`.
    pub kv: Arc<dyn KvStore>,
    /// Uploaded resumes and preview images.
    pub blobs: Arc<dyn BlobStore>,
    pub sessions: Arc<dyn SessionResolver>,
    pub object_urls: ObjectUrls,
    pub viewers: ViewerPages,
    pub config: Config,
}

impl AppState {
    pub fn new(
        config: Config,
        kv: Arc<dyn KvStore>,
        blobs: Arc<dyn BlobStore>,
        sessions: Arc<dyn SessionResolver>,
    ) -> Self {
        AppState {
            object_urls: ObjectUrls::new(&config.public_base_url),
            viewers: ViewerPages::default(),
            kv,
            blobs,
            sessions,
            config,
        }
    }
}
