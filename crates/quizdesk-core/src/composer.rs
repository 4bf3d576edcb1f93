//! Training composer state for both selection modes.
//!
//! The composer only captures the administrator's intent. Picking the actual
//! questions happens on the backend; the client enforces the per-tag bounds
//! and the hard filter tag floor and nothing else.

use std::collections::{BTreeMap, BTreeSet};

use chrono::{Local, NaiveDateTime};

use crate::catalog::{available_count, Catalog};
use crate::error::{CoreError, Result};
use crate::model::{CreateTrainingRequest, TrainingMode};
use crate::tags::{normalize_tag, normalize_tags};

/// Minimum number of tags (and tag slots) in hard filter mode.
pub const MIN_HARD_TAGS: usize = 2;

/// Default total question count in hard filter mode.
pub const DEFAULT_HARD_COUNT: i64 = 10;

/// Default number of autocomplete suggestions per slot.
pub const DEFAULT_SUGGESTION_LIMIT: usize = 8;

/// Builds the name used when the administrator leaves the name blank,
/// e.g. `Тренировка по темам (19.10.2026, 14:03:05)`.
#[must_use]
pub fn default_training_name(prefix: &str, at: NaiveDateTime) -> String {
    format!("{prefix} ({})", at.format("%d.%m.%Y, %H:%M:%S"))
}

fn resolve_name(name: &str, prefix: &str) -> String {
    let name = name.trim();
    if name.is_empty() {
        default_training_name(prefix, Local::now().naive_local())
    } else {
        name.to_string()
    }
}

// ============================================================================
// By topics
// ============================================================================

/// Sparse tag to requested count mapping. Absence means zero.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct TopicSelection {
    counts: BTreeMap<String, u32>,
}

impl TopicSelection {
    /// Creates an empty selection.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Sets the requested count for a tag, clamped into `[0, available]`.
    ///
    /// The tag is normalized first, so spelling variants share one entry.
    /// A clamped value of zero removes the tag. Returns the stored value.
    ///
    /// # Examples
    ///
    /// ```
    /// use quizdesk_core::TopicSelection;
    ///
    /// let mut selection = TopicSelection::new();
    /// assert_eq!(selection.set_count("кислоты", 9999, 5), 5);
    /// assert_eq!(selection.set_count("кислоты", 0, 5), 0);
    /// assert!(selection.is_empty());
    /// ```
    pub fn set_count(&mut self, tag: &str, requested: i64, available: u32) -> u32 {
        let tag = normalize_tag(tag);
        let clamped = u32::try_from(requested.clamp(0, i64::from(available))).unwrap_or(0);
        if clamped == 0 {
            self.counts.remove(&tag);
        } else {
            self.counts.insert(tag, clamped);
        }
        clamped
    }

    /// Sets a count using the tag's available count from the catalog.
    /// A tag the catalog does not know has nothing available.
    pub fn set_count_from_catalog(&mut self, catalog: &Catalog, tag: &str, requested: i64) -> u32 {
        let available = available_count(catalog, &normalize_tag(tag)).unwrap_or(0);
        self.set_count(tag, requested, available)
    }

    /// Requested count for a tag.
    #[must_use]
    pub fn count(&self, tag: &str) -> u32 {
        self.counts.get(&normalize_tag(tag)).copied().unwrap_or(0)
    }

    /// Live sum of every requested count.
    #[must_use]
    pub fn total(&self) -> u32 {
        self.counts.values().sum()
    }

    /// Returns `true` when nothing is selected.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.counts.is_empty()
    }

    /// Drops the whole selection.
    pub fn clear(&mut self) {
        self.counts.clear();
    }

    /// Iterates over selected tags and counts.
    pub fn iter(&self) -> impl Iterator<Item = (&str, u32)> {
        self.counts.iter().map(|(k, v)| (k.as_str(), *v))
    }

    /// Builds the creation payload.
    pub fn build_request(&self, name: &str) -> Result<CreateTrainingRequest> {
        if self.total() == 0 {
            return Err(CoreError::validation(
                "questions",
                "Добавьте хотя бы один вопрос",
            ));
        }
        Ok(CreateTrainingRequest {
            name: resolve_name(name, "Тренировка по темам"),
            questions: self.counts.clone(),
            mode: TrainingMode::Tags,
            hard_tags: None,
            questions_count: None,
        })
    }
}

// ============================================================================
// Hard filter
// ============================================================================

/// Tag input slots plus the total count for hard filter mode.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct HardFilter {
    slots: Vec<String>,
    count: i64,
}

impl Default for HardFilter {
    fn default() -> Self {
        Self {
            slots: vec![String::new(); MIN_HARD_TAGS],
            count: DEFAULT_HARD_COUNT,
        }
    }
}

impl HardFilter {
    /// Creates a filter with two empty slots and count 10.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Current slot texts.
    #[must_use]
    pub fn slots(&self) -> &[String] {
        &self.slots
    }

    /// Requested total count.
    #[must_use]
    pub const fn count(&self) -> i64 {
        self.count
    }

    /// Sets the requested total count. No range is enforced.
    pub fn set_count(&mut self, count: i64) {
        self.count = count;
    }

    /// Appends an empty slot.
    pub fn add_slot(&mut self) {
        self.slots.push(String::new());
    }

    /// Removes a slot unless that would leave fewer than two.
    pub fn remove_slot(&mut self, index: usize) -> bool {
        if self.slots.len() <= MIN_HARD_TAGS || index >= self.slots.len() {
            return false;
        }
        self.slots.remove(index);
        true
    }

    /// Replaces a slot's text. Out-of-range indices are ignored.
    pub fn set_slot(&mut self, index: usize, text: &str) {
        if let Some(slot) = self.slots.get_mut(index) {
            *slot = text.to_string();
        }
    }

    /// Non-empty slots, normalized and de-duplicated.
    #[must_use]
    pub fn chosen_tags(&self) -> Vec<String> {
        normalize_tags(&self.slots)
    }

    /// Autocomplete candidates for one slot.
    #[must_use]
    pub fn suggestions<'v>(
        &self,
        index: usize,
        vocabulary: &'v TagVocabulary,
        limit: usize,
    ) -> Vec<&'v str> {
        let Some(text) = self.slots.get(index) else {
            return Vec::new();
        };
        let needle = text.trim().to_lowercase();
        if needle.is_empty() {
            return Vec::new();
        }
        let taken: BTreeSet<String> = self
            .slots
            .iter()
            .enumerate()
            .filter(|(i, _)| *i != index)
            .map(|(_, s)| normalize_tag(s))
            .filter(|s| !s.is_empty())
            .collect();
        vocabulary
            .iter()
            .filter(|tag| tag.to_lowercase().contains(&needle))
            .filter(|tag| !taken.contains(*tag))
            .take(limit)
            .collect()
    }

    /// Builds the creation payload.
    pub fn build_request(&self, name: &str) -> Result<CreateTrainingRequest> {
        let tags = self.chosen_tags();
        if tags.len() < MIN_HARD_TAGS {
            return Err(CoreError::validation("hard_tags", "Введите минимум 2 тега"));
        }
        Ok(CreateTrainingRequest {
            name: resolve_name(name, "Тренировка по тегам"),
            questions: BTreeMap::new(),
            mode: TrainingMode::HardFilter,
            hard_tags: Some(tags),
            questions_count: Some(self.count),
        })
    }
}

// ============================================================================
// Vocabulary
// ============================================================================

/// Sorted distinct tags of a catalog.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct TagVocabulary {
    tags: Vec<String>,
}

impl TagVocabulary {
    /// Derives the vocabulary from every topic of the catalog.
    #[must_use]
    pub fn from_catalog(catalog: &Catalog) -> Self {
        let tags: BTreeSet<String> = catalog
            .values()
            .flat_map(|topics| topics.iter())
            .flat_map(|topic| topic.tags.iter())
            .map(|t| t.tag.clone())
            .collect();
        Self {
            tags: tags.into_iter().collect(),
        }
    }

    /// Iterates in sorted order.
    pub fn iter(&self) -> impl Iterator<Item = &str> {
        self.tags.iter().map(String::as_str)
    }

    /// Number of distinct tags.
    #[must_use]
    pub fn len(&self) -> usize {
        self.tags.len()
    }

    /// Returns `true` for an empty catalog.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.tags.is_empty()
    }
}
