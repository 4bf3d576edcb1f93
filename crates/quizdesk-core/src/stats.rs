//! Completed-work statistics: wire types and presentation helpers.

use chrono::{DateTime, FixedOffset, NaiveDateTime, TimeZone, Utc};
use serde::{Deserialize, Serialize};

/// Placeholder for a missing timestamp or duration.
pub const MISSING: &str = "—";

/// One attempt in a student's history.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct WorkStat {
    /// Work id.
    pub work_id: u64,
    /// Opaque token for the public detail view.
    #[serde(default)]
    pub share_token: Option<String>,
    /// Training name.
    pub name: String,
    /// Work kind (`ege`, `topic`, or anything else for trainings).
    #[serde(rename = "type", default)]
    pub work_type: String,
    /// Start timestamp (UTC, offset may be omitted).
    #[serde(default)]
    pub start: Option<String>,
    /// End timestamp.
    #[serde(default)]
    pub end: Option<String>,
    /// Scored points.
    #[serde(default)]
    pub final_mark: u32,
    /// Maximum points.
    #[serde(default)]
    pub max_mark: u32,
    /// Fully correct answers.
    #[serde(default)]
    pub fully: u32,
    /// Partially correct answers.
    #[serde(default)]
    pub semi: u32,
    /// Wrong answers.
    #[serde(default)]
    pub zero: u32,
    /// Questions in the work.
    #[serde(default)]
    pub questions_amount: u32,
}

/// Summary part of a work detail.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct WorkDetailGeneral {
    /// Student telegram id.
    #[serde(default)]
    pub telegram_id: Option<i64>,
    /// Student name.
    #[serde(default)]
    pub user_name: Option<String>,
    /// Training name.
    pub name: String,
    /// Start timestamp.
    #[serde(default)]
    pub start: Option<String>,
    /// End timestamp.
    #[serde(default)]
    pub end: Option<String>,
    /// Scored points.
    #[serde(default)]
    pub final_mark: u32,
    /// Maximum points.
    #[serde(default)]
    pub max_mark: u32,
    /// Fully correct answers.
    #[serde(default)]
    pub fully: u32,
    /// Partially correct answers.
    #[serde(default)]
    pub semi: u32,
    /// Wrong answers.
    #[serde(default)]
    pub zero: u32,
}

/// One answered question of a work.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct WorkDetailQuestion {
    /// 1-based position in the work.
    pub index: u32,
    /// Pool question id.
    pub question_id: u64,
    /// Question text.
    pub text: String,
    /// Reference answer.
    #[serde(default)]
    pub answer: String,
    /// What the student answered.
    #[serde(default)]
    pub user_answer: String,
    /// Points received.
    #[serde(default)]
    pub user_mark: u32,
    /// Points possible.
    #[serde(default)]
    pub full_mark: u32,
    /// Question image present.
    #[serde(default)]
    pub question_image: bool,
    /// Answer image present.
    #[serde(default)]
    pub answer_image: bool,
}

/// Full detail returned for a share token.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct WorkDetail {
    /// Summary.
    pub general: WorkDetailGeneral,
    /// Ordered per-question results.
    #[serde(default)]
    pub questions: Vec<WorkDetailQuestion>,
}

/// Correctness of one answer.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Outcome {
    /// Full points.
    Full,
    /// Some points.
    Partial,
    /// No points.
    Zero,
}

impl Outcome {
    /// Classifies a mark.
    ///
    /// # Examples
    ///
    /// ```
    /// use quizdesk_core::Outcome;
    ///
    /// assert_eq!(Outcome::classify(2, 2), Outcome::Full);
    /// assert_eq!(Outcome::classify(1, 2), Outcome::Partial);
    /// assert_eq!(Outcome::classify(0, 2), Outcome::Zero);
    /// ```
    #[must_use]
    pub const fn classify(mark: u32, full_mark: u32) -> Self {
        if mark == full_mark {
            Self::Full
        } else if mark > 0 {
            Self::Partial
        } else {
            Self::Zero
        }
    }

    /// Russian badge label.
    #[must_use]
    pub const fn label(self) -> &'static str {
        match self {
            Self::Full => "Верно",
            Self::Partial => "Частично",
            Self::Zero => "Неверно",
        }
    }
}

/// Russian label of a work kind.
#[must_use]
pub fn work_type_label(work_type: &str) -> &'static str {
    match work_type {
        "ege" => "ЕГЭ",
        "topic" => "Тема",
        _ => "Тренировка",
    }
}

/// Parses a backend timestamp. Values without an explicit offset are UTC.
#[must_use]
pub fn parse_timestamp(raw: &str) -> Option<DateTime<Utc>> {
    let raw = raw.trim();
    if raw.is_empty() {
        return None;
    }
    if let Ok(dt) = DateTime::parse_from_rfc3339(raw) {
        return Some(dt.with_timezone(&Utc));
    }
    let normalized = raw.replacen(' ', "T", 1);
    if let Ok(dt) = DateTime::parse_from_rfc3339(&normalized) {
        return Some(dt.with_timezone(&Utc));
    }
    ["%Y-%m-%dT%H:%M:%S%.f", "%Y-%m-%dT%H:%M:%S", "%Y-%m-%dT%H:%M"]
        .iter()
        .find_map(|fmt| NaiveDateTime::parse_from_str(&normalized, fmt).ok())
        .map(|naive| Utc.from_utc_datetime(&naive))
}

/// Formats the elapsed time between two timestamps, e.g. `1ч 2м 3с`.
#[must_use]
pub fn format_duration(start: Option<&str>, end: Option<&str>) -> String {
    let (Some(start), Some(end)) = (start.and_then(parse_timestamp), end.and_then(parse_timestamp))
    else {
        return MISSING.to_string();
    };
    let secs = end.signed_duration_since(start).num_seconds().max(0);
    let h = secs / 3600;
    let m = (secs % 3600) / 60;
    let s = secs % 60;
    if h > 0 {
        format!("{h}ч {m}м {s}с")
    } else if m > 0 {
        format!("{m}м {s}с")
    } else {
        format!("{s}с")
    }
}

/// Formats a timestamp as `dd.mm.yyyy, HH:MM` at a fixed offset.
#[must_use]
pub fn format_timestamp(raw: Option<&str>, offset_hours: i32) -> String {
    let Some(dt) = raw.and_then(parse_timestamp) else {
        return MISSING.to_string();
    };
    match FixedOffset::east_opt(offset_hours * 3600) {
        Some(offset) => dt.with_timezone(&offset).format("%d.%m.%Y, %H:%M").to_string(),
        None => dt.format("%d.%m.%Y, %H:%M").to_string(),
    }
}

/// Public image kinds served under `/images/`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ImageKind {
    /// Question illustration.
    Question,
    /// Answer illustration.
    Answer,
    /// Student avatar, keyed by telegram id.
    User,
}

impl ImageKind {
    /// Path segment.
    #[must_use]
    pub const fn segment(self) -> &'static str {
        match self {
            Self::Question => "question",
            Self::Answer => "answer",
            Self::User => "user",
        }
    }
}

/// Builds an image URL under the API base.
#[must_use]
pub fn image_url(api_base_url: &str, kind: ImageKind, id: i64) -> String {
    let base = api_base_url.trim().trim_end_matches('/');
    format!("{base}/images/{}/{id}", kind.segment())
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_timestamp_assumes_utc() {
        let a = parse_timestamp("2024-05-01 10:00:00").unwrap();
        let b = parse_timestamp("2024-05-01T10:00:00Z").unwrap();
        let c = parse_timestamp("2024-05-01T13:00:00+03:00").unwrap();
        assert_eq!(a, b);
        assert_eq!(b, c);
        assert!(parse_timestamp("2024-05-01T10:00:00.123456").is_some());
        assert!(parse_timestamp("вчера").is_none());
        assert!(parse_timestamp("").is_none());
    }

    #[test]
    fn test_format_duration() {
        let start = Some("2024-05-01 10:00:00");
        assert_eq!(format_duration(start, Some("2024-05-01 11:02:03")), "1ч 2м 3с");
        assert_eq!(format_duration(start, Some("2024-05-01 10:02:03")), "2м 3с");
        assert_eq!(format_duration(start, Some("2024-05-01 10:00:03")), "3с");
        assert_eq!(format_duration(start, None), MISSING);
    }

    #[test]
    fn test_format_timestamp_at_offset() {
        assert_eq!(
            format_timestamp(Some("2024-05-01 22:30:00"), 3),
            "02.05.2024, 01:30"
        );
        assert_eq!(format_timestamp(None, 3), MISSING);
    }

    #[test]
    fn test_outcome_labels() {
        assert_eq!(Outcome::classify(0, 0), Outcome::Full);
        assert_eq!(Outcome::classify(3, 5).label(), "Частично");
        assert_eq!(Outcome::classify(0, 5).label(), "Неверно");
    }

    #[test]
    fn test_work_type_label() {
        assert_eq!(work_type_label("ege"), "ЕГЭ");
        assert_eq!(work_type_label("topic"), "Тема");
        assert_eq!(work_type_label("hand_work"), "Тренировка");
    }

    #[test]
    fn test_image_url() {
        assert_eq!(
            image_url("https://x.org/api/", ImageKind::Answer, 7),
            "https://x.org/api/images/answer/7"
        );
        assert_eq!(
            image_url("http://localhost:8000", ImageKind::User, 42),
            "http://localhost:8000/images/user/42"
        );
    }

    #[test]
    fn test_work_detail_deserializes() {
        let json = r#"{
            "general": {"telegram_id": 5, "user_name": "Анна", "name": "T",
                        "start": "2024-05-01 10:00:00", "end": null,
                        "final_mark": 3, "max_mark": 4, "fully": 1, "semi": 1, "zero": 0},
            "questions": [{"index": 1, "question_id": 9, "text": "q", "answer": "a",
                           "user_answer": "b", "user_mark": 1, "full_mark": 2,
                           "question_image": false, "answer_image": true}]
        }"#;
        let detail: WorkDetail = serde_json::from_str(json).unwrap();
        assert_eq!(detail.general.end, None);
        assert_eq!(detail.questions[0].user_mark, 1);
    }
}
