use std::collections::HashMap;
use std::sync::{Arc, Mutex};
use std::time::Duration;

use tokio::task::JoinHandle;
use tokio::time::Instant;
use tracing::{debug, info};
use uuid::Uuid;

use super::lock;
use super::page::ReviewPage;

type PageHandle = Arc<Mutex<ReviewPage>>;

/// Open review pages, keyed by viewer session and view id. A viewer may
/// have several pages open at once; each keeps its own object URLs.
/// Removing a page tears it down and revokes whatever URLs it still holds.
#[derive(Clone, Default)]
pub struct ViewerPages {
    pages: Arc<Mutex<HashMap<(String, Uuid), PageHandle>>>,
}

impl ViewerPages {
    /// The viewer's page `view`, or a newly opened page when `view` is
    /// absent or has already been torn down.
    pub fn page(&self, viewer: &str, view: Option<Uuid>) -> PageHandle {
        let mut pages = lock(&self.pages);
        if let Some(page) = view.and_then(|v| pages.get(&(viewer.to_string(), v))) {
            return page.clone();
        }
        let page = ReviewPage::new();
        let view_id = page.view_id();
        debug!(%view_id, "Opening review page");
        let handle = Arc::new(Mutex::new(page));
        pages.insert((viewer.to_string(), view_id), handle.clone());
        handle
    }

    /// Tears down every page of `viewer`. Returns whether there were any.
    pub fn close(&self, viewer: &str) -> bool {
        let mut pages = lock(&self.pages);
        let before = pages.len();
        pages.retain(|(owner, _), _| owner != viewer);
        pages.len() < before
    }

    pub fn len(&self) -> usize {
        lock(&self.pages).len()
    }

    /// Tears down every page idle for at least `max_idle`. Returns how many went.
    pub fn evict_idle(&self, max_idle: Duration) -> usize {
        let now = Instant::now();
        let mut pages = lock(&self.pages);
        let before = pages.len();
        pages.retain(|_, page| lock(page).idle_for(now) < max_idle);
        before - pages.len()
    }

    /// Runs `evict_idle` on a fixed period until the runtime shuts down.
    pub fn spawn_sweeper(self, max_idle: Duration) -> JoinHandle<()> {
        let period = (max_idle / 4).max(Duration::from_secs(1));
        tokio::spawn(async move {
            let mut ticker = tokio::time::interval(period);
            ticker.set_missed_tick_behavior(tokio::time::MissedTickBehavior::Delay);
            loop {
                ticker.tick().await;
                let evicted = self.evict_idle(max_idle);
                if evicted > 0 {
                    info!("Evicted {evicted} idle review pages");
                }
            }
        })
    }
}
