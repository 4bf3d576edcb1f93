//! quizdesk report generation
//!
//! Renders completed trainings the way the Stats Viewer shows them: a summary
//! card (score, answer breakdown, duration) followed by every question with
//! the student's answer, the reference answer, and an outcome badge. A
//! student's work history renders as a table.
//!
//! # Types
//!
//! - [`WorkReport`] - One completed work, built from a [`WorkDetail`]
//! - [`HistoryReport`] - A student's list of works, built from [`WorkStat`] rows
//!
//! # Generators
//!
//! - [`json::JsonGenerator`] - JSON output, compact or pretty
//! - [`MarkdownGenerator`] and [`HistoryMarkdown`] - Human-readable Markdown
//!
//! # Example
//!
//! ```rust
//! use quizdesk_core::{WorkDetail, WorkDetailGeneral};
//! use quizdesk_report::{MarkdownGenerator, WorkReport};
//!
//! let detail = WorkDetail {
//!     general: WorkDetailGeneral {
//!         telegram_id: None,
//!         user_name: None,
//!         name: "Соли".to_string(),
//!         start: None,
//!         end: None,
//!         final_mark: 0,
//!         max_mark: 0,
//!         fully: 0,
//!         semi: 0,
//!         zero: 0,
//!     },
//!     questions: vec![],
//! };
//!
//! let report = WorkReport::builder(&detail).build().unwrap();
//! let markdown = MarkdownGenerator::new(&report).generate();
//! assert!(markdown.contains("# Соли"));
//! ```

pub mod json;
mod markdown;

pub use markdown::{HistoryMarkdown, MarkdownGenerator};

use quizdesk_core::{
    format_duration, format_timestamp, image_url, work_type_label, ImageKind, Outcome, WorkDetail,
    WorkDetailQuestion, WorkStat,
};
use serde::Serialize;
use thiserror::Error;
use tracing::warn;

// ============================================================================
// Error Types
// ============================================================================

/// Errors that can occur during report generation.
#[derive(Debug, Error)]
pub enum ReportError {
    /// Failed to serialize the report to JSON.
    #[error("failed to serialize report: {0}")]
    Serialization(#[from] serde_json::Error),

    /// Failed to write the report file.
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// The backend returned inconsistent data.
    #[error("invalid report data: {0}")]
    InvalidData(String),
}

/// Result type for report operations.
pub type Result<T> = std::result::Result<T, ReportError>;

// ============================================================================
// Work Report
// ============================================================================

/// Score block of the summary card.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ScoreSummary {
    /// Scored points.
    pub final_mark: u32,
    /// Maximum points.
    pub max_mark: u32,
    /// Fully correct answers.
    pub fully: u32,
    /// Partially correct answers.
    pub semi: u32,
    /// Wrong answers.
    pub zero: u32,
}

impl ScoreSummary {
    /// Number of answered questions.
    #[must_use]
    pub const fn answered(&self) -> u32 {
        self.fully + self.semi + self.zero
    }

    /// Share of each outcome in whole percent, `(fully, semi, zero)`.
    ///
    /// All zeros when nothing was answered.
    #[must_use]
    pub fn shares(&self) -> (u32, u32, u32) {
        let total = self.answered();
        if total == 0 {
            return (0, 0, 0);
        }
        let pct = |n: u32| u32::try_from(u64::from(n) * 100 / u64::from(total)).unwrap_or(100);
        (pct(self.fully), pct(self.semi), pct(self.zero))
    }
}

/// One question row of a work report.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct QuestionRow {
    /// 1-based position in the work.
    pub index: u32,
    /// Pool question id.
    pub question_id: u64,
    /// Question text.
    pub text: String,
    /// Reference answer.
    pub answer: String,
    /// The student's answer.
    pub user_answer: String,
    /// Points received.
    pub user_mark: u32,
    /// Points possible.
    pub full_mark: u32,
    /// Correctness badge.
    pub outcome: Outcome,
    /// Question illustration URL, when there is one.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub question_image: Option<String>,
    /// Answer illustration URL, when there is one.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub answer_image: Option<String>,
}

/// A completed work rendered for reading.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct WorkReport {
    /// Training name.
    pub title: String,
    /// Student name, when known.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub student: Option<String>,
    /// Student avatar URL, when the student is known.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub avatar: Option<String>,
    /// Score block.
    pub score: ScoreSummary,
    /// Formatted start time.
    pub started_at: String,
    /// Formatted end time.
    pub finished_at: String,
    /// Formatted elapsed time.
    pub duration: String,
    /// Questions ordered by position.
    pub questions: Vec<QuestionRow>,
}

impl WorkReport {
    /// Creates a builder over a fetched work detail.
    #[must_use]
    pub const fn builder(detail: &WorkDetail) -> WorkReportBuilder<'_> {
        WorkReportBuilder {
            detail,
            api_base_url: None,
            utc_offset_hours: 0,
        }
    }

    /// Convenience for `builder(detail)` with image links and an offset.
    ///
    /// # Errors
    ///
    /// See [`WorkReportBuilder::build`].
    pub fn from_detail(
        detail: &WorkDetail,
        api_base_url: &str,
        utc_offset_hours: i32,
    ) -> Result<Self> {
        Self::builder(detail)
            .api_base_url(api_base_url)
            .utc_offset_hours(utc_offset_hours)
            .build()
    }

    /// Serializes the report to pretty JSON.
    ///
    /// # Errors
    ///
    /// Returns [`ReportError::Serialization`] if serialization fails.
    pub fn to_json(&self) -> Result<String> {
        json::JsonGenerator::new(self).generate_pretty()
    }
}

/// Builder for [`WorkReport`].
#[derive(Debug)]
pub struct WorkReportBuilder<'a> {
    detail: &'a WorkDetail,
    api_base_url: Option<String>,
    utc_offset_hours: i32,
}

impl WorkReportBuilder<'_> {
    /// Links images under this API base. Without it images are omitted.
    #[must_use]
    pub fn api_base_url(mut self, url: impl Into<String>) -> Self {
        self.api_base_url = Some(url.into());
        self
    }

    /// Offset used to display the start and end times.
    #[must_use]
    pub const fn utc_offset_hours(mut self, hours: i32) -> Self {
        self.utc_offset_hours = hours;
        self
    }

    /// Builds the report.
    ///
    /// # Errors
    ///
    /// Returns [`ReportError::InvalidData`] if two questions share a position.
    pub fn build(self) -> Result<WorkReport> {
        let general = &self.detail.general;
        let mut questions = self
            .detail
            .questions
            .iter()
            .map(|q| self.row(q))
            .collect::<Vec<_>>();
        questions.sort_by_key(|row| row.index);
        if let Some(pair) = questions.windows(2).find(|w| w[0].index == w[1].index) {
            return Err(ReportError::InvalidData(format!(
                "duplicate question position {}",
                pair[0].index
            )));
        }

        let avatar = match (&self.api_base_url, general.telegram_id) {
            (Some(base), Some(id)) => Some(image_url(base, ImageKind::User, id)),
            _ => None,
        };

        Ok(WorkReport {
            title: general.name.clone(),
            student: general.user_name.clone(),
            avatar,
            score: ScoreSummary {
                final_mark: general.final_mark,
                max_mark: general.max_mark,
                fully: general.fully,
                semi: general.semi,
                zero: general.zero,
            },
            started_at: format_timestamp(general.start.as_deref(), self.utc_offset_hours),
            finished_at: format_timestamp(general.end.as_deref(), self.utc_offset_hours),
            duration: format_duration(general.start.as_deref(), general.end.as_deref()),
            questions,
        })
    }

    fn row(&self, question: &WorkDetailQuestion) -> QuestionRow {
        if question.user_mark > question.full_mark {
            warn!(
                index = question.index,
                user_mark = question.user_mark,
                full_mark = question.full_mark,
                "Question scored above its full mark"
            );
        }
        let image = |present: bool, kind: ImageKind| {
            let base = self.api_base_url.as_deref().filter(|_| present)?;
            let id = i64::try_from(question.question_id).ok()?;
            Some(image_url(base, kind, id))
        };
        QuestionRow {
            index: question.index,
            question_id: question.question_id,
            text: question.text.clone(),
            answer: question.answer.clone(),
            user_answer: question.user_answer.clone(),
            user_mark: question.user_mark,
            full_mark: question.full_mark,
            outcome: Outcome::classify(question.user_mark, question.full_mark),
            question_image: image(question.question_image, ImageKind::Question),
            answer_image: image(question.answer_image, ImageKind::Answer),
        }
    }
}

// ============================================================================
// History Report
// ============================================================================

/// One row of a student's work history.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct HistoryRow {
    /// Work id.
    pub work_id: u64,
    /// Training name.
    pub name: String,
    /// Work kind label.
    pub kind: String,
    /// Formatted start time.
    pub started_at: String,
    /// Formatted elapsed time.
    pub duration: String,
    /// Score block.
    pub score: ScoreSummary,
    /// Token for the public detail view.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub share_token: Option<String>,
}

/// A student's completed works, in backend order.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct HistoryReport {
    /// Student name, when known.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub student: Option<String>,
    /// Works.
    pub works: Vec<HistoryRow>,
}

impl HistoryReport {
    /// Builds the history from the backend rows.
    #[must_use]
    pub fn from_stats(student: Option<&str>, stats: &[WorkStat], utc_offset_hours: i32) -> Self {
        let works = stats
            .iter()
            .map(|stat| HistoryRow {
                work_id: stat.work_id,
                name: stat.name.clone(),
                kind: work_type_label(&stat.work_type).to_string(),
                started_at: format_timestamp(stat.start.as_deref(), utc_offset_hours),
                duration: format_duration(stat.start.as_deref(), stat.end.as_deref()),
                score: ScoreSummary {
                    final_mark: stat.final_mark,
                    max_mark: stat.max_mark,
                    fully: stat.fully,
                    semi: stat.semi,
                    zero: stat.zero,
                },
                share_token: stat.share_token.clone(),
            })
            .collect();
        Self {
            student: student.map(str::to_string),
            works,
        }
    }

    /// Returns `true` if the student has no works.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.works.is_empty()
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
pub(crate) mod tests {
    use quizdesk_core::WorkDetailGeneral;

    use super::*;

    pub(crate) fn sample_detail() -> WorkDetail {
        WorkDetail {
            general: WorkDetailGeneral {
                telegram_id: Some(77),
                user_name: Some("Анна".to_string()),
                name: "Соли и оксиды".to_string(),
                start: Some("2024-05-01 10:00:00".to_string()),
                end: Some("2024-05-01 10:12:30".to_string()),
                final_mark: 3,
                max_mark: 5,
                fully: 1,
                semi: 1,
                zero: 1,
            },
            questions: vec![
                question(2, 11, 1, 2, false, true),
                question(1, 10, 2, 2, true, false),
                question(3, 12, 0, 1, false, false),
            ],
        }
    }

    pub(crate) fn question(
        index: u32,
        id: u64,
        mark: u32,
        full: u32,
        question_image: bool,
        answer_image: bool,
    ) -> WorkDetailQuestion {
        WorkDetailQuestion {
            index,
            question_id: id,
            text: format!("Вопрос {index}"),
            answer: "NaCl".to_string(),
            user_answer: "NaCl".to_string(),
            user_mark: mark,
            full_mark: full,
            question_image,
            answer_image,
        }
    }

    #[test]
    fn test_rows_ordered_and_classified() {
        let report = WorkReport::from_detail(&sample_detail(), "http://h/api", 3).unwrap();
        let outcomes: Vec<_> = report.questions.iter().map(|q| (q.index, q.outcome)).collect();
        assert_eq!(
            outcomes,
            vec![
                (1, Outcome::Full),
                (2, Outcome::Partial),
                (3, Outcome::Zero)
            ]
        );
        assert_eq!(report.duration, "12м 30с");
        assert_eq!(report.started_at, "01.05.2024, 13:00");
        assert_eq!(report.avatar.as_deref(), Some("http://h/api/images/user/77"));
    }

    #[test]
    fn test_missing_images_are_omitted() {
        let report = WorkReport::from_detail(&sample_detail(), "http://h/api", 0).unwrap();
        let first = &report.questions[0];
        assert_eq!(
            first.question_image.as_deref(),
            Some("http://h/api/images/question/10")
        );
        assert_eq!(first.answer_image, None);
        assert_eq!(
            report.questions[1].answer_image.as_deref(),
            Some("http://h/api/images/answer/11")
        );
        assert!(report.questions[2].question_image.is_none());
    }

    #[test]
    fn test_without_base_url_no_links() {
        let report = WorkReport::builder(&sample_detail()).build().unwrap();
        assert!(report.avatar.is_none());
        assert!(report
            .questions
            .iter()
            .all(|q| q.question_image.is_none() && q.answer_image.is_none()));
    }

    #[test]
    fn test_missing_bounds_render_placeholder() {
        let mut detail = sample_detail();
        detail.general.end = None;
        let report = WorkReport::builder(&detail).build().unwrap();
        assert_eq!(report.duration, "—");
        assert_eq!(report.finished_at, "—");
    }

    #[test]
    fn test_mark_above_full_still_rendered() {
        let mut detail = sample_detail();
        detail.questions.push(question(4, 13, 3, 2, false, false));
        let report = WorkReport::builder(&detail).build().unwrap();
        let row = report.questions.last().unwrap();
        assert_eq!((row.index, row.user_mark, row.full_mark), (4, 3, 2));
        assert_eq!(row.outcome, Outcome::Partial);
    }

    #[test]
    fn test_duplicate_position_rejected() {
        let mut detail = sample_detail();
        detail.questions.push(question(1, 14, 0, 1, false, false));
        let err = WorkReport::builder(&detail).build().unwrap_err();
        assert!(matches!(err, ReportError::InvalidData(_)));
    }

    #[test]
    fn test_score_shares() {
        let score = ScoreSummary {
            final_mark: 3,
            max_mark: 5,
            fully: 2,
            semi: 1,
            zero: 1,
        };
        assert_eq!(score.answered(), 4);
        assert_eq!(score.shares(), (50, 25, 25));

        let empty = ScoreSummary {
            final_mark: 0,
            max_mark: 0,
            fully: 0,
            semi: 0,
            zero: 0,
        };
        assert_eq!(empty.shares(), (0, 0, 0));
    }

    #[test]
    fn test_history_labels() {
        let stats: Vec<WorkStat> = serde_json::from_str(
            r#"[
                {"work_id": 1, "name": "Вариант 1", "type": "ege", "start": "2024-05-01T10:00:00Z",
                 "end": "2024-05-01T11:02:03Z", "final_mark": 40, "max_mark": 60,
                 "share_token": "abc"},
                {"work_id": 2, "name": "Соли", "type": "hand_work"}
            ]"#,
        )
        .unwrap();
        let history = HistoryReport::from_stats(Some("Анна"), &stats, 0);
        assert!(!history.is_empty());
        assert_eq!(history.works[0].kind, "ЕГЭ");
        assert_eq!(history.works[0].duration, "1ч 2м 3с");
        assert_eq!(history.works[1].kind, "Тренировка");
        assert_eq!(history.works[1].started_at, "—");
    }
}
