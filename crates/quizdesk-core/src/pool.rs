//! Question pool search and the per-question edit draft.
//!
//! The whole pool is fetched up front as lightweight rows; search is a
//! client-side substring filter with a display cap. Editing works on a
//! committed/draft pair with an explicit dirty set, and the merged record is
//! sent only on an explicit save.

use std::collections::BTreeSet;

use serde::{Deserialize, Serialize};

use crate::error::{CoreError, Result};
use crate::tags::{normalize_tag, normalize_tags, parse_tag_lines};

/// Allowed range for difficulty level and max score.
pub const MARK_RANGE: std::ops::RangeInclusive<u8> = 1..=5;

// ============================================================================
// Wire types
// ============================================================================

/// Question kind.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum QuestionType {
    /// Exam-style question.
    #[default]
    Ege,
    /// Topic question.
    Topic,
}

impl QuestionType {
    /// Russian display label.
    #[must_use]
    pub const fn label(self) -> &'static str {
        match self {
            Self::Ege => "ЕГЭ",
            Self::Topic => "Тема",
        }
    }
}

/// A row of the pool list.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct QuestionSummary {
    /// Question id.
    pub id: u64,
    /// Question text.
    pub text: String,
    /// Tags.
    #[serde(default)]
    pub tags_list: Vec<String>,
}

/// A full question record.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Question {
    /// Question id.
    pub id: u64,
    /// Question text.
    pub text: String,
    /// Reference answer.
    #[serde(default)]
    pub answer: String,
    /// Difficulty level, 1..=5.
    pub level: u8,
    /// Max score, 1..=5.
    pub full_mark: u8,
    /// Tags.
    #[serde(default)]
    pub tags_list: Vec<String>,
    /// Whether the question rotates (0 or 1).
    #[serde(default)]
    pub is_rotate: u8,
    /// Whether the student grades themselves (0 or 1).
    #[serde(default)]
    pub is_selfcheck: u8,
    /// Question image present.
    #[serde(default)]
    pub question_image: bool,
    /// Answer image present.
    #[serde(default)]
    pub answer_image: bool,
    /// Kind.
    #[serde(rename = "type", default)]
    pub question_type: QuestionType,
}

impl Question {
    /// The list row for this record.
    #[must_use]
    pub fn summary(&self) -> QuestionSummary {
        QuestionSummary {
            id: self.id,
            text: self.text.clone(),
            tags_list: self.tags_list.clone(),
        }
    }
}

/// Body of the question update endpoint.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct QuestionUpdate {
    /// Text.
    pub text: String,
    /// Answer.
    pub answer: String,
    /// Level.
    pub level: u8,
    /// Max score.
    pub full_mark: u8,
    /// Normalized tags.
    pub tags_list: Vec<String>,
    /// Rotation flag as 0/1.
    pub is_rotate: u8,
    /// Self-check flag as 0/1.
    pub is_selfcheck: u8,
}

/// Body of the question creation endpoint.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct NewQuestion {
    /// Text.
    pub text: String,
    /// Answer.
    pub answer: String,
    /// Kind.
    #[serde(rename = "type")]
    pub question_type: QuestionType,
    /// Level.
    pub level: u8,
    /// Max score.
    pub full_mark: u8,
    /// Normalized tags.
    pub tags_list: Vec<String>,
    /// Rotation flag.
    pub is_rotate: bool,
    /// Self-check flag.
    pub is_selfcheck: bool,
}

/// Response of the question creation endpoint.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct CreatedQuestion {
    /// New question id.
    pub id: u64,
    /// Acknowledgement.
    #[serde(default)]
    pub ok: bool,
}

/// Which image of a question an upload or delete targets.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ImageSlot {
    /// Image shown with the question.
    Question,
    /// Image shown with the answer.
    Answer,
}

impl ImageSlot {
    /// Endpoint suffix under `/admin/pool/{id}/`.
    #[must_use]
    pub const fn endpoint(self) -> &'static str {
        match self {
            Self::Question => "question-image",
            Self::Answer => "answer-image",
        }
    }
}

// ============================================================================
// Search
// ============================================================================

/// One page of search results.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SearchPage<'a> {
    /// Matches to display.
    pub items: Vec<&'a QuestionSummary>,
    /// Number of matches in total.
    pub total: usize,
    /// Whether `items` was cut at the display cap.
    pub truncated: bool,
}

impl SearchPage<'_> {
    /// Prompt shown when the display cap hides matches.
    #[must_use]
    pub fn narrow_hint(&self) -> Option<String> {
        self.truncated.then(|| {
            format!(
                "Первые {} из {}. Уточните поиск.",
                self.items.len(),
                self.total
            )
        })
    }
}

/// All pool rows held client-side.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct PoolIndex {
    rows: Vec<QuestionSummary>,
}

impl PoolIndex {
    /// Wraps the fetched rows.
    #[must_use]
    pub const fn new(rows: Vec<QuestionSummary>) -> Self {
        Self { rows }
    }

    /// Number of rows.
    #[must_use]
    pub fn len(&self) -> usize {
        self.rows.len()
    }

    /// Returns `true` for an empty pool.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }

    /// Looks up a row.
    #[must_use]
    pub fn get(&self, id: u64) -> Option<&QuestionSummary> {
        self.rows.iter().find(|r| r.id == id)
    }

    /// Case-insensitive substring search over id, text and tags.
    ///
    /// The query is matched as typed; surrounding spaces are significant.
    #[must_use]
    pub fn search(&self, query: &str, limit: usize) -> SearchPage<'_> {
        let needle = query.to_lowercase();
        let matches: Vec<&QuestionSummary> = self
            .rows
            .iter()
            .filter(|row| needle.is_empty() || row_matches(row, &needle))
            .collect();
        let total = matches.len();
        let items: Vec<&QuestionSummary> = matches.into_iter().take(limit).collect();
        SearchPage {
            truncated: total > items.len(),
            items,
            total,
        }
    }

    /// Drops a deleted question.
    pub fn remove(&mut self, id: u64) -> bool {
        let before = self.rows.len();
        self.rows.retain(|r| r.id != id);
        self.rows.len() != before
    }

    /// Syncs a row after a successful save.
    pub fn apply_saved(&mut self, id: u64, text: &str, tags: &[String]) {
        if let Some(row) = self.rows.iter_mut().find(|r| r.id == id) {
            row.text = text.to_string();
            row.tags_list = tags.to_vec();
        }
    }

    /// Adds a newly created question, replacing a row with the same id.
    pub fn insert(&mut self, summary: QuestionSummary) {
        self.rows.retain(|r| r.id != summary.id);
        self.rows.push(summary);
    }
}

fn row_matches(row: &QuestionSummary, needle: &str) -> bool {
    row.id.to_string().contains(needle)
        || row.text.to_lowercase().contains(needle)
        || row.tags_list.iter().any(|t| t.to_lowercase().contains(needle))
}

// ============================================================================
// Draft
// ============================================================================

/// An editable field of a question.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum DraftField {
    /// Question text.
    Text,
    /// Answer.
    Answer,
    /// Difficulty level.
    Level,
    /// Max score.
    FullMark,
    /// Tag list.
    Tags,
    /// Rotation flag.
    Rotate,
    /// Self-check flag.
    SelfCheck,
}

/// Committed question plus pending edits.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct QuestionDraft {
    committed: Question,
    working: Question,
    dirty: BTreeSet<DraftField>,
}

fn check_mark(field: &str, value: u8) -> Result<()> {
    if MARK_RANGE.contains(&value) {
        Ok(())
    } else {
        Err(CoreError::validation(field, "Значение должно быть от 1 до 5"))
    }
}

impl QuestionDraft {
    /// Starts editing a freshly fetched record.
    #[must_use]
    pub fn new(question: Question) -> Self {
        Self {
            working: question.clone(),
            committed: question,
            dirty: BTreeSet::new(),
        }
    }

    /// Id of the edited question.
    #[must_use]
    pub const fn id(&self) -> u64 {
        self.committed.id
    }

    /// Last saved record.
    #[must_use]
    pub const fn committed(&self) -> &Question {
        &self.committed
    }

    /// Merged view of committed values and pending edits.
    #[must_use]
    pub const fn current(&self) -> &Question {
        &self.working
    }

    /// Fields that differ from the committed record.
    #[must_use]
    pub const fn dirty_fields(&self) -> &BTreeSet<DraftField> {
        &self.dirty
    }

    /// Returns `true` when anything would be saved.
    #[must_use]
    pub fn is_dirty(&self) -> bool {
        !self.dirty.is_empty()
    }

    fn mark(&mut self, field: DraftField) {
        let c = &self.committed;
        let w = &self.working;
        let differs = match field {
            DraftField::Text => c.text != w.text,
            DraftField::Answer => c.answer != w.answer,
            DraftField::Level => c.level != w.level,
            DraftField::FullMark => c.full_mark != w.full_mark,
            DraftField::Tags => c.tags_list != w.tags_list,
            DraftField::Rotate => c.is_rotate != w.is_rotate,
            DraftField::SelfCheck => c.is_selfcheck != w.is_selfcheck,
        };
        if differs {
            self.dirty.insert(field);
        } else {
            self.dirty.remove(&field);
        }
    }

    /// Edits the question text.
    pub fn set_text(&mut self, text: &str) {
        self.working.text = text.to_string();
        self.mark(DraftField::Text);
    }

    /// Edits the answer.
    pub fn set_answer(&mut self, answer: &str) {
        self.working.answer = answer.to_string();
        self.mark(DraftField::Answer);
    }

    /// Edits the difficulty level.
    pub fn set_level(&mut self, level: u8) -> Result<()> {
        check_mark("level", level)?;
        self.working.level = level;
        self.mark(DraftField::Level);
        Ok(())
    }

    /// Edits the max score.
    pub fn set_full_mark(&mut self, full_mark: u8) -> Result<()> {
        check_mark("full_mark", full_mark)?;
        self.working.full_mark = full_mark;
        self.mark(DraftField::FullMark);
        Ok(())
    }

    /// Toggles rotation.
    pub fn set_rotate(&mut self, rotate: bool) {
        self.working.is_rotate = u8::from(rotate);
        self.mark(DraftField::Rotate);
    }

    /// Toggles self-check.
    pub fn set_selfcheck(&mut self, selfcheck: bool) {
        self.working.is_selfcheck = u8::from(selfcheck);
        self.mark(DraftField::SelfCheck);
    }

    /// Adds a normalized tag.
    pub fn add_tag(&mut self, raw: &str) -> Result<()> {
        let tag = normalize_tag(raw);
        if tag.is_empty() {
            return Err(CoreError::validation("tag", "Введите тег"));
        }
        if self.working.tags_list.contains(&tag) {
            return Err(CoreError::validation("tag", "Такой тег уже есть"));
        }
        self.working.tags_list.push(tag);
        self.mark(DraftField::Tags);
        Ok(())
    }

    /// Removes a tag; returns `false` if it was not present.
    pub fn remove_tag(&mut self, tag: &str) -> bool {
        let before = self.working.tags_list.len();
        self.working.tags_list.retain(|t| t != tag);
        let removed = self.working.tags_list.len() != before;
        self.mark(DraftField::Tags);
        removed
    }

    /// The full merged payload sent on save.
    #[must_use]
    pub fn to_update(&self) -> QuestionUpdate {
        let w = &self.working;
        QuestionUpdate {
            text: w.text.clone(),
            answer: w.answer.clone(),
            level: w.level,
            full_mark: w.full_mark,
            tags_list: normalize_tags(&w.tags_list),
            is_rotate: w.is_rotate,
            is_selfcheck: w.is_selfcheck,
        }
    }

    /// Makes the merged view the committed record after a successful save.
    pub fn commit(&mut self) {
        self.working.tags_list = normalize_tags(&self.working.tags_list);
        self.committed = self.working.clone();
        self.dirty.clear();
    }

    /// Replaces the record after a refetch, discarding pending edits.
    pub fn reset_from(&mut self, question: Question) {
        *self = Self::new(question);
    }
}

// ============================================================================
// Selection guard
// ============================================================================

/// Tracks which question the editor shows so late responses for a
/// previously selected question are ignored.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct Selection {
    current: Option<u64>,
}

impl Selection {
    /// Creates an empty selection.
    #[must_use]
    pub const fn new() -> Self {
        Self { current: None }
    }

    /// Selected question id.
    #[must_use]
    pub const fn current(&self) -> Option<u64> {
        self.current
    }

    /// Selects a question. Returns `false` when it is already selected and
    /// no fetch is needed.
    pub fn begin(&mut self, id: u64) -> bool {
        if self.current == Some(id) {
            return false;
        }
        self.current = Some(id);
        true
    }

    /// Whether a response for `id` may still be applied.
    #[must_use]
    pub fn accept(&self, id: u64) -> bool {
        self.current == Some(id)
    }

    /// Forgets `id` after its fetch failed so the next attempt fetches again.
    /// A newer selection is left alone.
    pub fn abandon(&mut self, id: u64) {
        if self.current == Some(id) {
            self.current = None;
        }
    }

    /// Clears the selection, e.g. after the selected question was deleted.
    pub fn clear(&mut self) {
        self.current = None;
    }
}

// ============================================================================
// New question form
// ============================================================================

/// Input of the add-question form.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NewQuestionForm {
    /// Text.
    pub text: String,
    /// Answer.
    pub answer: String,
    /// Kind.
    pub question_type: QuestionType,
    /// Level.
    pub level: u8,
    /// Max score.
    pub full_mark: u8,
    /// Newline-separated tags.
    pub tag_lines: String,
    /// Rotation flag.
    pub rotate: bool,
    /// Self-check flag.
    pub selfcheck: bool,
}

impl Default for NewQuestionForm {
    fn default() -> Self {
        Self {
            text: String::new(),
            answer: String::new(),
            question_type: QuestionType::Ege,
            level: 1,
            full_mark: 1,
            tag_lines: String::new(),
            rotate: false,
            selfcheck: false,
        }
    }
}

impl NewQuestionForm {
    /// Validates the form and builds the creation body.
    pub fn validate(&self) -> Result<NewQuestion> {
        let text = self.text.trim();
        if text.is_empty() {
            return Err(CoreError::validation("text", "Введите текст вопроса"));
        }
        let answer = self.answer.trim();
        if answer.is_empty() {
            return Err(CoreError::validation("answer", "Введите ответ"));
        }
        let tags = parse_tag_lines(&self.tag_lines);
        if tags.is_empty() {
            return Err(CoreError::validation("tags", "Добавьте хотя бы один тег"));
        }
        check_mark("level", self.level)?;
        check_mark("full_mark", self.full_mark)?;
        Ok(NewQuestion {
            text: text.to_string(),
            answer: answer.to_string(),
            question_type: self.question_type,
            level: self.level,
            full_mark: self.full_mark,
            tags_list: tags,
            is_rotate: self.rotate,
            is_selfcheck: self.selfcheck,
        })
    }
}
