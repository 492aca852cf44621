use std::sync::Mutex;

use axum::{
    extract::{Path, Query, State},
    http::{
        header::{CACHE_CONTROL, CONTENT_TYPE, RETRY_AFTER},
        HeaderMap, StatusCode,
    },
    response::{Html, IntoResponse, Redirect, Response},
    Json,
};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use tracing::{debug, info};
use uuid::Uuid;

use super::loader::{load_review, LoadFault};
use super::page::{PageStatus, ReviewPage};
use super::lock;
use crate::auth::{guard, session_token, GuardDecision};
use crate::errors::{AppError, HtmlError};
use crate::models::{Feedback, SectionView};
use crate::render;
use crate::state::AppState;

/// Runs one load of `id` into `page`. A fault is returned only when it
/// belongs to the page's current load.
async fn refresh(state: &AppState, page: &Mutex<ReviewPage>, id: &str) -> Result<(), LoadFault> {
    let ticket = lock(page).begin(id);
    let result = load_review(
        state.kv.as_ref(),
        state.blobs.as_ref(),
        &state.object_urls,
        id,
    )
    .await;

    let mut page = lock(page);
    match result {
        Ok(outcome) => {
            page.complete(ticket, outcome);
            Ok(())
        }
        Err(fault) => {
            if page.fail(ticket) {
                Err(fault)
            } else {
                debug!("Ignoring fault from superseded load: {fault}");
                Ok(())
            }
        }
    }
}

/// A token that no longer authenticates has ended its session; tear down
/// the page it left behind.
fn end_viewer(state: &AppState, token: Option<&str>) {
    if let Some(token) = token {
        if state.viewers.close(token) {
            debug!("Closed review page of a signed-out viewer");
        }
    }
}

fn status_code(status: &PageStatus) -> StatusCode {
    match status {
        PageStatus::Idle | PageStatus::Loading | PageStatus::Loaded => StatusCode::OK,
        PageStatus::NotFound { .. } => StatusCode::NOT_FOUND,
        PageStatus::Unavailable { .. } => StatusCode::SERVICE_UNAVAILABLE,
        PageStatus::Faulted => StatusCode::INTERNAL_SERVER_ERROR,
    }
}

/// Which open page a request drives. Without one, the request opens a new
/// page; with one, it navigates that page to the requested record.
#[derive(Debug, Default, Deserialize)]
pub struct ViewQuery {
    pub view: Option<Uuid>,
}

/// GET /resume/:id
pub async fn handle_review_page(
    State(state): State<AppState>,
    Path(id): Path<String>,
    Query(query): Query<ViewQuery>,
    headers: HeaderMap,
) -> Result<Response, HtmlError> {
    let token = session_token(&headers, &state.config.session_cookie);
    let session = state.sessions.resolve(token.as_deref()).await;

    let viewer = match guard(session, &id, &state.config.auth_path) {
        GuardDecision::Wait => {
            let html = render::render_waiting(&id).map_err(AppError::from)?;
            return Ok(([(RETRY_AFTER, "3")], Html(html)).into_response());
        }
        GuardDecision::Redirect(to) => {
            info!("Unauthenticated request for resume {id}, redirecting to sign-in");
            end_viewer(&state, token.as_deref());
            return Ok(Redirect::to(&to).into_response());
        }
        GuardDecision::Proceed => token.ok_or(AppError::Unauthorized)?,
    };

    let handle = state.viewers.page(&viewer, query.view);
    refresh(&state, &handle, &id).await?;

    let page = lock(&handle);
    let view = page.view();
    let html = render::render_page(&view).map_err(AppError::from)?;
    Ok((status_code(view.status), Html(html)).into_response())
}

#[derive(Debug, Serialize)]
pub struct ReviewResponse {
    pub id: String,
    /// Pass back as `?view=` to keep driving the same page.
    pub view: Uuid,
    #[serde(flatten)]
    pub status: PageStatus,
    pub resume_url: Option<String>,
    pub image_url: Option<String>,
    /// ATS section with defaults applied; present whenever feedback is.
    pub ats: Option<SectionView>,
    pub feedback: Option<Feedback>,
    pub loaded_at: Option<DateTime<Utc>>,
}

/// GET /api/v1/resumes/:id
pub async fn handle_review_json(
    State(state): State<AppState>,
    Path(id): Path<String>,
    Query(query): Query<ViewQuery>,
    headers: HeaderMap,
) -> Result<(StatusCode, Json<ReviewResponse>), AppError> {
    let token = session_token(&headers, &state.config.session_cookie);
    let session = state.sessions.resolve(token.as_deref()).await;

    let viewer = match guard(session, &id, &state.config.auth_path) {
        GuardDecision::Wait => return Err(AppError::SessionPending),
        GuardDecision::Redirect(_) => {
            end_viewer(&state, token.as_deref());
            return Err(AppError::Unauthorized);
        }
        GuardDecision::Proceed => token.ok_or(AppError::Unauthorized)?,
    };

    let handle = state.viewers.page(&viewer, query.view);
    refresh(&state, &handle, &id).await?;

    let page = lock(&handle);
    let view = page.view();
    let response = ReviewResponse {
        id: view.record_id.to_string(),
        view: page.view_id(),
        status: view.status.clone(),
        resume_url: view.resume_url.map(str::to_string),
        image_url: view.image_url.map(str::to_string),
        ats: view.feedback.map(Feedback::ats_view),
        feedback: view.feedback.cloned(),
        loaded_at: page.review().map(|r| r.loaded_at),
    };
    Ok((status_code(view.status), Json(response)))
}

/// GET /objects/:token
pub async fn handle_object(
    State(state): State<AppState>,
    Path(token): Path<Uuid>,
) -> Result<Response, AppError> {
    let object = state.object_urls.fetch(&token).ok_or_else(|| {
        AppError::NotFound("This link has expired or never existed".to_string())
    })?;
    Ok((
        [
            (CONTENT_TYPE, object.content_type),
            (CACHE_CONTROL, "private, no-store"),
        ],
        object.data,
    )
        .into_response())
}
