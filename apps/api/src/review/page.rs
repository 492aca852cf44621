//! Display state of one rendered review page.
//!
//! Loads run outside the page lock. Each load carries the generation it was
//! started under, and only a completion from the current generation may
//! change what the page shows.

use std::time::Duration;

use serde::Serialize;
use tokio::time::Instant;
use tracing::debug;
use uuid::Uuid;

use super::loader::{LoadOutcome, LoadedReview, MissingStage};
use crate::models::Feedback;

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "state", rename_all = "snake_case")]
pub enum PageStatus {
    Idle,
    Loading,
    Loaded,
    NotFound { missing: MissingStage },
    Unavailable { reason: String },
    Faulted,
}

#[derive(Debug)]
#[must_use = "a load ticket must be completed or the page stays loading"]
pub struct LoadTicket {
    generation: u64,
    id: String,
}

#[derive(Debug)]
pub struct ReviewPage {
    view_id: Uuid,
    generation: u64,
    active_id: Option<String>,
    status: PageStatus,
    review: Option<LoadedReview>,
    last_touched: Instant,
}

impl Default for ReviewPage {
    fn default() -> Self {
        Self::new()
    }
}

impl ReviewPage {
    pub fn new() -> Self {
        Self {
            view_id: Uuid::new_v4(),
            generation: 0,
            active_id: None,
            status: PageStatus::Idle,
            review: None,
            last_touched: Instant::now(),
        }
    }

    /// Starts a load for `id`, superseding any load still in flight.
    /// Switching to a different record drops the old review (and its URLs)
    /// right away; reloading the same record keeps it visible until the new
    /// load lands.
    pub fn begin(&mut self, id: &str) -> LoadTicket {
        self.generation += 1;
        self.last_touched = Instant::now();
        if self.active_id.as_deref() != Some(id) {
            self.review = None;
            self.active_id = Some(id.to_string());
        }
        if self.review.is_none() {
            self.status = PageStatus::Loading;
        }
        LoadTicket {
            generation: self.generation,
            id: id.to_string(),
        }
    }

    fn is_current(&self, ticket: &LoadTicket) -> bool {
        ticket.generation == self.generation
    }

    /// Applies a finished load. Returns false, dropping the outcome, when a
    /// newer load has started since `ticket` was issued.
    pub fn complete(&mut self, ticket: LoadTicket, outcome: LoadOutcome) -> bool {
        if !self.is_current(&ticket) {
            debug!(
                id = %ticket.id,
                generation = ticket.generation,
                current = self.generation,
                "Discarding stale load"
            );
            return false;
        }
        self.last_touched = Instant::now();
        match outcome {
            LoadOutcome::Loaded(review) => {
                self.review = Some(review);
                self.status = PageStatus::Loaded;
            }
            LoadOutcome::NotFound(missing) => {
                self.review = None;
                self.status = PageStatus::NotFound { missing };
            }
            LoadOutcome::TransientError(reason) => {
                self.review = None;
                self.status = PageStatus::Unavailable { reason };
            }
        }
        true
    }

    /// Records that the load behind `ticket` faulted. Returns whether the
    /// fault belongs to the current load.
    pub fn fail(&mut self, ticket: LoadTicket) -> bool {
        if !self.is_current(&ticket) {
            return false;
        }
        self.review = None;
        self.status = PageStatus::Faulted;
        true
    }

    pub fn view_id(&self) -> Uuid {
        self.view_id
    }

    /// Time since the page was last loaded or one of its links was served.
    pub fn idle_for(&self, now: Instant) -> Duration {
        let last_used = self
            .review
            .iter()
            .flat_map(|r| [r.resume_url.last_fetched(), r.image_url.last_fetched()])
            .flatten()
            .fold(self.last_touched, Instant::max);
        now.saturating_duration_since(last_used)
    }

    pub fn view(&self) -> PageView<'_> {
        let review = self.review.as_ref();
        PageView {
            view_id: Some(self.view_id),
            record_id: self.active_id.as_deref().unwrap_or_default(),
            status: &self.status,
            resume_url: review.map(|r| r.resume_url.href()),
            image_url: review.map(|r| r.image_url.href()),
            feedback: review.map(|r| &r.feedback),
            company_name: review.and_then(|r| r.company_name.as_deref()),
            job_title: review.and_then(|r| r.job_title.as_deref()),
        }
    }

    pub fn review(&self) -> Option<&LoadedReview> {
        self.review.as_ref()
    }
}

/// What the renderer sees.
#[derive(Debug, Clone, Copy)]
pub struct PageView<'a> {
    /// Absent for the placeholder served before a page exists.
    pub view_id: Option<Uuid>,
    pub record_id: &'a str,
    pub status: &'a PageStatus,
    pub resume_url: Option<&'a str>,
    pub image_url: Option<&'a str>,
    pub feedback: Option<&'a Feedback>,
    pub company_name: Option<&'a str>,
    pub job_title: Option<&'a str>,
}

impl PageView<'_> {
    /// Both URLs and the feedback are present.
    pub fn is_ready(&self) -> bool {
        self.resume_url.is_some() && self.image_url.is_some() && self.feedback.is_some()
    }
}
