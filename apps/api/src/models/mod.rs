pub mod feedback;

pub use feedback::{Feedback, FeedbackRecord, ScoreBand, Section, SectionView, Tip, TipKind};
