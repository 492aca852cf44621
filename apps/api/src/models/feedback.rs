use serde::{Deserialize, Serialize};

/// Stored analysis record, as written by the upload/analysis flow under
/// `resume:<id>`. Unknown fields are ignored.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct FeedbackRecord {
    #[serde(default)]
    pub id: Option<String>,
    pub resume_path: String,
    pub image_path: String,
    #[serde(default)]
    pub company_name: Option<String>,
    #[serde(default)]
    pub job_title: Option<String>,
    /// Written once analysis finishes; absent while it is still running.
    #[serde(default)]
    pub feedback: Option<Feedback>,
}

/// Output of the upstream resume analysis. Every section is optional on read;
/// the view helpers fill in zero scores and empty tip lists.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Feedback {
    #[serde(default)]
    pub overall_score: Option<f64>,
    #[serde(rename = "ATS", default)]
    pub ats: Option<Section>,
    #[serde(default)]
    pub tone_and_style: Option<Section>,
    #[serde(default)]
    pub content: Option<Section>,
    #[serde(default)]
    pub structure: Option<Section>,
    #[serde(default)]
    pub skills: Option<Section>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Section {
    #[serde(default)]
    pub score: Option<f64>,
    #[serde(default)]
    pub tips: Option<Vec<Tip>>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum TipKind {
    Good,
    Improve,
    /// Any other `type` the analysis emits. Rendered as a neutral tip.
    #[serde(other)]
    Other,
}

/// Tips arrive either as bare strings or as `{type, tip, explanation}` objects.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum Tip {
    Plain(String),
    Detailed {
        #[serde(rename = "type", default)]
        kind: Option<TipKind>,
        tip: String,
        #[serde(default)]
        explanation: Option<String>,
    },
}

impl Tip {
    pub fn text(&self) -> &str {
        match self {
            Tip::Plain(text) => text,
            Tip::Detailed { tip, .. } => tip,
        }
    }

    pub fn kind(&self) -> Option<TipKind> {
        match self {
            Tip::Plain(_) => None,
            Tip::Detailed { kind, .. } => *kind,
        }
    }

    pub fn explanation(&self) -> Option<&str> {
        match self {
            Tip::Plain(_) => None,
            Tip::Detailed { explanation, .. } => explanation.as_deref(),
        }
    }
}

/// Scores are shown as whole numbers; missing, negative and NaN become 0.
pub fn display_score(score: Option<f64>) -> u32 {
    match score {
        Some(s) if s.is_finite() && s > 0.0 => s.round() as u32,
        _ => 0,
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum ScoreBand {
    Strong,
    GoodStart,
    NeedsWork,
}

impl ScoreBand {
    pub fn for_score(score: u32) -> Self {
        if score > 69 {
            ScoreBand::Strong
        } else if score > 49 {
            ScoreBand::GoodStart
        } else {
            ScoreBand::NeedsWork
        }
    }

    pub fn label(self) -> &'static str {
        match self {
            ScoreBand::Strong => "Strong",
            ScoreBand::GoodStart => "Good Start",
            ScoreBand::NeedsWork => "Needs Work",
        }
    }

    pub fn css_class(self) -> &'static str {
        match self {
            ScoreBand::Strong => "score-good",
            ScoreBand::GoodStart => "score-fair",
            ScoreBand::NeedsWork => "score-poor",
        }
    }
}

/// A section with defaults applied.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct SectionView {
    pub title: &'static str,
    pub score: u32,
    pub band: ScoreBand,
    pub tips: Vec<Tip>,
}

impl SectionView {
    fn from_section(title: &'static str, section: Option<&Section>) -> Self {
        let score = display_score(section.and_then(|s| s.score));
        SectionView {
            title,
            score,
            band: ScoreBand::for_score(score),
            tips: section.and_then(|s| s.tips.clone()).unwrap_or_default(),
        }
    }
}

impl Feedback {
    pub fn overall(&self) -> u32 {
        display_score(self.overall_score)
    }

    pub fn ats_view(&self) -> SectionView {
        SectionView::from_section("ATS", self.ats.as_ref())
    }

    /// Category breakdown in display order.
    pub fn categories(&self) -> Vec<SectionView> {
        vec![
            SectionView::from_section("Tone & Style", self.tone_and_style.as_ref()),
            SectionView::from_section("Content", self.content.as_ref()),
            SectionView::from_section("Structure", self.structure.as_ref()),
            SectionView::from_section("Skills", self.skills.as_ref()),
        ]
    }
}
