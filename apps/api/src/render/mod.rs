// HTML for the review page. Pure functions of the page view; no I/O.

pub mod sections;

use askama::Template;
use axum::http::StatusCode;

use crate::review::{PageStatus, PageView};
use sections::{AtsTemplate, DetailsTemplate, SummaryTemplate};

pub const PAGE_TITLE: &str = "Resumind | Review";

struct Notice {
    class: &'static str,
    message: String,
    scanning: bool,
}

impl Notice {
    fn for_status(status: &PageStatus) -> Self {
        match status {
            PageStatus::Idle | PageStatus::Loading | PageStatus::Loaded => Notice {
                class: "notice-loading",
                message: "Analyzing your resume. Please wait...".to_string(),
                scanning: true,
            },
            PageStatus::NotFound { missing } => Notice {
                class: "notice-missing",
                message: missing.describe().to_string(),
                scanning: false,
            },
            PageStatus::Unavailable { .. } => Notice {
                class: "notice-error",
                message: "We couldn't reach storage right now. Refresh to try again.".to_string(),
                scanning: false,
            },
            PageStatus::Faulted => Notice {
                class: "notice-error",
                message: "The stored review for this resume is corrupt.".to_string(),
                scanning: false,
            },
        }
    }
}

#[derive(Template)]
#[template(path = "review.html")]
struct ReviewTemplate<'a> {
    title: &'a str,
    /// Empty when no page exists yet.
    view_id: String,
    record_id: &'a str,
    heading: String,
    has_preview: bool,
    resume_url: &'a str,
    image_url: &'a str,
    summary_html: String,
    ats_html: String,
    details_html: String,
    ready: bool,
    notice: Notice,
}

#[derive(Template)]
#[template(path = "fault.html")]
struct FaultTemplate<'a> {
    title: &'a str,
    status: u16,
    code: &'a str,
    message: &'a str,
}

fn heading(view: &PageView<'_>) -> Option<String> {
    match (view.company_name, view.job_title) {
        (Some(company), Some(job)) => Some(format!("{job} at {company}")),
        (Some(only), None) | (None, Some(only)) => Some(only.to_string()),
        (None, None) => None,
    }
}

/// Review page for `view`. Shows the placeholder or status notice until both
/// URLs and the feedback are present.
pub fn render_page(view: &PageView<'_>) -> askama::Result<String> {
    let (has_preview, resume_url, image_url) = match (view.resume_url, view.image_url) {
        (Some(resume_url), Some(image_url)) => (true, resume_url, image_url),
        _ => (false, "", ""),
    };

    let (summary_html, ats_html, details_html) = match view.feedback.filter(|_| view.is_ready()) {
        Some(feedback) => {
            let ats = feedback.ats_view();
            (
                SummaryTemplate::new(feedback).render()?,
                AtsTemplate::new(ats.score, &ats.tips).render()?,
                DetailsTemplate::new(feedback).render()?,
            )
        }
        None => Default::default(),
    };

    ReviewTemplate {
        title: PAGE_TITLE,
        view_id: view.view_id.map(|v| v.to_string()).unwrap_or_default(),
        record_id: view.record_id,
        heading: heading(view).unwrap_or_default(),
        has_preview,
        resume_url,
        image_url,
        summary_html,
        ats_html,
        details_html,
        ready: view.is_ready(),
        notice: Notice::for_status(view.status),
    }
    .render()
}

/// Placeholder shown while the viewer's session is still resolving.
pub fn render_waiting(record_id: &str) -> askama::Result<String> {
    let status = PageStatus::Loading;
    render_page(&PageView {
        view_id: None,
        record_id,
        status: &status,
        resume_url: None,
        image_url: None,
        feedback: None,
        company_name: None,
        job_title: None,
    })
}

pub fn render_fault(status: StatusCode, code: &str, message: &str) -> askama::Result<String> {
    FaultTemplate {
        title: PAGE_TITLE,
        status: status.as_u16(),
        code,
        message,
    }
    .render()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::{Feedback, Section, Tip, TipKind};
    use crate::review::loader::MissingStage;

    fn view<'a>(status: &'a PageStatus, feedback: Option<&'a Feedback>) -> PageView<'a> {
        PageView {
            view_id: None,
            record_id: "42",
            status,
            resume_url: feedback.map(|_| "/objects/pdf"),
            image_url: feedback.map(|_| "/objects/png"),
            feedback,
            company_name: None,
            job_title: None,
        }
    }

    fn sample_feedback() -> Feedback {
        Feedback {
            overall_score: Some(74.0),
            ats: Some(Section {
                score: Some(80.0),
                tips: Some(vec![Tip::Plain("Add a skills section".to_string())]),
            }),
            content: Some(Section {
                score: Some(45.0),
                tips: Some(vec![Tip::Detailed {
                    kind: Some(TipKind::Improve),
                    tip: "Quantify <results>".to_string(),
                    explanation: Some("Numbers stand out".to_string()),
                }]),
            }),
            ..Feedback::default()
        }
    }

    #[test]
    fn test_loading_placeholder() {
        let html = render_page(&view(&PageStatus::Loading, None)).unwrap();
        assert!(html.contains("Analyzing your resume. Please wait..."));
        assert!(html.contains("resume-scan"));
        assert!(!html.contains("ats-score"));
        assert!(html.contains("Resumind | Review"));
    }

    #[test]
    fn test_placeholder_refresh_keeps_view() {
        let view_id = uuid::Uuid::new_v4();
        let mut v = view(&PageStatus::Loading, None);
        v.view_id = Some(view_id);
        let html = render_page(&v).unwrap();
        assert!(html.contains(&format!(r#"content="3; url=?view={view_id}""#)));
        assert!(html.contains(&format!(r#"data-view-id="{view_id}""#)));
    }

    #[test]
    fn test_loaded_page_has_preview_and_sections() {
        let feedback = sample_feedback();
        let html = render_page(&view(&PageStatus::Loaded, Some(&feedback))).unwrap();
        assert!(html.contains(r#"href="/objects/pdf""#));
        assert!(html.contains(r#"src="/objects/png""#));
        assert!(html.contains(r#"data-ats-score="80""#));
        assert!(html.contains("Add a skills section"));
        assert!(html.contains("Numbers stand out"));
        assert!(!html.contains("Analyzing your resume"));
    }

    #[test]
    fn test_tip_text_is_escaped() {
        let feedback = sample_feedback();
        let html = render_page(&view(&PageStatus::Loaded, Some(&feedback))).unwrap();
        assert!(html.contains("Quantify &lt;results&gt;"));
        assert!(!html.contains("Quantify <results>"));
    }

    #[test]
    fn test_missing_ats_renders_zero_score() {
        let feedback = Feedback::default();
        let html = render_page(&view(&PageStatus::Loaded, Some(&feedback))).unwrap();
        assert!(html.contains(r#"data-ats-score="0""#));
        assert!(html.contains(r#"data-ats-tips="0""#));
    }

    #[test]
    fn test_not_found_notice() {
        let status = PageStatus::NotFound {
            missing: MissingStage::Record,
        };
        let html = render_page(&view(&status, None)).unwrap();
        assert!(html.contains("No review exists for this resume."));
        assert!(!html.contains("Analyzing your resume"));
    }

    #[test]
    fn test_heading_combines_job_and_company() {
        let status = PageStatus::Loading;
        let mut v = view(&status, None);
        v.company_name = Some("Acme");
        v.job_title = Some("Engineer");
        assert_eq!(heading(&v).as_deref(), Some("Engineer at Acme"));
    }

    #[test]
    fn test_fault_page() {
        let html = render_fault(StatusCode::INTERNAL_SERVER_ERROR, "MALFORMED_RECORD", "corrupt")
            .unwrap();
        assert!(html.contains("500"));
        assert!(html.contains("MALFORMED_RECORD"));
    }
}
