use askama::Template;

use crate::models::{Feedback, ScoreBand, SectionView, Tip, TipKind};

pub struct TipView {
    pub text: String,
    pub class: &'static str,
    /// Empty when the tip has none.
    pub explanation: String,
}

impl From<&Tip> for TipView {
    fn from(tip: &Tip) -> Self {
        TipView {
            text: tip.text().to_string(),
            class: match tip.kind() {
                Some(TipKind::Good) => "tip-good",
                Some(TipKind::Improve) => "tip-improve",
                Some(TipKind::Other) | None => "tip-neutral",
            },
            explanation: tip.explanation().unwrap_or_default().to_string(),
        }
    }
}

pub struct CategoryView {
    pub title: &'static str,
    pub score: u32,
    pub band: ScoreBand,
    pub tips: Vec<TipView>,
}

impl From<SectionView> for CategoryView {
    fn from(section: SectionView) -> Self {
        CategoryView {
            title: section.title,
            score: section.score,
            band: section.band,
            tips: section.tips.iter().map(TipView::from).collect(),
        }
    }
}

/// Overall score plus one bar per category.
#[derive(Template)]
#[template(path = "summary.html")]
pub struct SummaryTemplate {
    pub overall: u32,
    pub band: ScoreBand,
    pub categories: Vec<CategoryView>,
}

impl SummaryTemplate {
    pub fn new(feedback: &Feedback) -> Self {
        let overall = feedback.overall();
        SummaryTemplate {
            overall,
            band: ScoreBand::for_score(overall),
            categories: feedback
                .categories()
                .into_iter()
                .map(CategoryView::from)
                .collect(),
        }
    }
}

#[derive(Template)]
#[template(path = "ats.html")]
pub struct AtsTemplate {
    pub score: u32,
    pub band: ScoreBand,
    pub suggestions: Vec<TipView>,
}

impl AtsTemplate {
    pub fn new(score: u32, suggestions: &[Tip]) -> Self {
        AtsTemplate {
            score,
            band: ScoreBand::for_score(score),
            suggestions: suggestions.iter().map(TipView::from).collect(),
        }
    }
}

/// Per-category tips with explanations.
#[derive(Template)]
#[template(path = "details.html")]
pub struct DetailsTemplate {
    pub categories: Vec<CategoryView>,
}

impl DetailsTemplate {
    pub fn new(feedback: &Feedback) -> Self {
        DetailsTemplate {
            categories: feedback
                .categories()
                .into_iter()
                .map(CategoryView::from)
                .collect(),
        }
    }
}
