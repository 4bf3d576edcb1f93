//! Topic/tag catalog and its client-side volume tree.
//!
//! Volumes have no backend identity: they are grouping keys implied by topic
//! membership. A volume created in the console exists only locally (it is
//! "pending") until the first topic referencing its name is created.
//! Deleting a volume means deleting every topic grouped under it, one
//! request per topic.
//!
//! Tag edits on a topic always send the complete new tag list. Two sessions
//! editing the same topic overwrite each other (last write wins).

use indexmap::IndexMap;
use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::error::{CoreError, Result};
use crate::tags::normalize_tag;

/// A tag attached to a topic together with the number of pool questions
/// that carry it.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TopicTag {
    /// Normalized tag text.
    pub tag: String,
    /// Number of pool questions carrying this tag.
    pub count: u32,
}

impl TopicTag {
    /// Creates a new topic tag.
    #[must_use]
    pub fn new(tag: impl Into<String>, count: u32) -> Self {
        Self {
            tag: tag.into(),
            count,
        }
    }
}

/// A named collection of tags belonging to one volume.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Topic {
    /// Backend identifier.
    pub id: u64,
    /// Display name.
    pub name: String,
    /// Tags with their available question counts.
    #[serde(default)]
    pub tags: Vec<TopicTag>,
}

/// The catalog as returned by the backend: volume name to ordered topics.
pub type Catalog = IndexMap<String, Vec<Topic>>;

/// Response of the topic creation endpoint.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CreatedTopic {
    /// New topic id.
    pub id: u64,
    /// Topic name as stored.
    pub name: String,
    /// Volume the topic was created under.
    pub volume: String,
}

impl From<CreatedTopic> for Topic {
    fn from(created: CreatedTopic) -> Self {
        Self {
            id: created.id,
            name: created.name,
            tags: Vec::new(),
        }
    }
}

/// Request body for topic creation.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct NewTopic {
    /// Trimmed topic name.
    pub name: String,
    /// Volume the topic belongs to.
    pub volume: String,
}

/// Fetched catalog plus volumes that so far exist only in this session.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct CatalogTree {
    catalog: Catalog,
    pending: Vec<String>,
}

impl CatalogTree {
    /// Wraps a freshly fetched catalog.
    #[must_use]
    pub const fn new(catalog: Catalog) -> Self {
        Self {
            catalog,
            pending: Vec::new(),
        }
    }

    /// Returns the underlying catalog.
    #[must_use]
    pub const fn catalog(&self) -> &Catalog {
        &self.catalog
    }

    /// Lists fetched volumes followed by pending ones not yet in the data.
    #[must_use]
    pub fn volumes(&self) -> Vec<&str> {
        let mut out: Vec<&str> = self.catalog.keys().map(String::as_str).collect();
        out.extend(
            self.pending
                .iter()
                .filter(|v| !self.catalog.contains_key(v.as_str()))
                .map(String::as_str),
        );
        out
    }

    /// Returns `true` if the volume exists only client-side.
    #[must_use]
    pub fn is_pending(&self, volume: &str) -> bool {
        !self.catalog.contains_key(volume) && self.pending.iter().any(|v| v == volume)
    }

    /// Returns `true` if the volume is fetched or pending.
    #[must_use]
    pub fn has_volume(&self, volume: &str) -> bool {
        self.catalog.contains_key(volume) || self.pending.iter().any(|v| v == volume)
    }

    /// Topics grouped under a volume (empty for pending volumes).
    #[must_use]
    pub fn topics(&self, volume: &str) -> &[Topic] {
        self.catalog.get(volume).map_or(&[], Vec::as_slice)
    }

    /// Adds a client-only volume and returns its trimmed name.
    pub fn add_pending_volume(&mut self, name: &str) -> Result<String> {
        let name = name.trim();
        if name.is_empty() {
            return Err(CoreError::validation("volume", "Введите название раздела"));
        }
        if self.has_volume(name) {
            return Err(CoreError::validation(
                "volume",
                "Раздел с таким именем уже существует",
            ));
        }
        self.pending.push(name.to_string());
        Ok(name.to_string())
    }

    /// Ids of every topic that must be deleted to remove a volume.
    pub fn topics_to_delete(&self, volume: &str) -> Result<Vec<u64>> {
        if !self.has_volume(volume) {
            return Err(CoreError::VolumeNotFound {
                name: volume.to_string(),
            });
        }
        Ok(self.topics(volume).iter().map(|t| t.id).collect())
    }

    /// Drops a volume after all of its topics were deleted.
    pub fn apply_volume_deleted(&mut self, volume: &str) {
        self.catalog.shift_remove(volume);
        self.pending.retain(|v| v != volume);
    }

    /// Checks a new topic request and returns the trimmed body to send.
    pub fn validate_new_topic(&self, name: &str, volume: &str) -> Result<NewTopic> {
        let name = name.trim();
        if name.is_empty() {
            return Err(CoreError::validation("topic", "Введите название темы"));
        }
        if !self.has_volume(volume) {
            return Err(CoreError::VolumeNotFound {
                name: volume.to_string(),
            });
        }
        Ok(NewTopic {
            name: name.to_string(),
            volume: volume.to_string(),
        })
    }

    /// Records a created topic; this promotes a pending volume.
    pub fn apply_topic_created(&mut self, volume: &str, topic: Topic) {
        debug!(volume, topic_id = topic.id, "Topic added to catalog");
        self.catalog.entry(volume.to_string()).or_default().push(topic);
        self.pending.retain(|v| v != volume);
    }

    /// Removes a deleted topic. A volume left without topics disappears.
    pub fn apply_topic_deleted(&mut self, topic_id: u64) {
        for topics in self.catalog.values_mut() {
            topics.retain(|t| t.id != topic_id);
        }
        self.catalog.retain(|_, topics| !topics.is_empty());
    }

    /// Finds a topic by id.
    #[must_use]
    pub fn find_topic(&self, topic_id: u64) -> Option<&Topic> {
        self.catalog
            .values()
            .flat_map(|topics| topics.iter())
            .find(|t| t.id == topic_id)
    }

    /// Name of the volume containing the topic.
    #[must_use]
    pub fn volume_of(&self, topic_id: u64) -> Option<&str> {
        self.catalog
            .iter()
            .find(|(_, topics)| topics.iter().any(|t| t.id == topic_id))
            .map(|(volume, _)| volume.as_str())
    }

    fn topic_or_err(&self, topic_id: u64) -> Result<&Topic> {
        self.find_topic(topic_id)
            .ok_or(CoreError::TopicNotFound { id: topic_id })
    }

    /// Builds the full replacement tag list with one tag added.
    pub fn tags_with_added(&self, topic_id: u64, raw_tag: &str) -> Result<Vec<String>> {
        let topic = self.topic_or_err(topic_id)?;
        let tag = normalize_tag(raw_tag);
        if tag.is_empty() {
            return Err(CoreError::validation("tag", "Введите тег"));
        }
        if topic.tags.iter().any(|t| t.tag == tag) {
            return Err(CoreError::validation("tag", "Такой тег уже есть"));
        }
        let mut tags: Vec<String> = topic.tags.iter().map(|t| t.tag.clone()).collect();
        tags.push(tag);
        Ok(tags)
    }

    /// Builds the full replacement tag list with one tag removed.
    pub fn tags_without(&self, topic_id: u64, tag: &str) -> Result<Vec<String>> {
        let topic = self.topic_or_err(topic_id)?;
        Ok(topic
            .tags
            .iter()
            .filter(|t| t.tag != tag)
            .map(|t| t.tag.clone())
            .collect())
    }

    /// Applies a confirmed tag list replacement. Surviving tags keep their
    /// counts; new tags start at zero until the catalog is refetched.
    pub fn apply_tags_replaced(&mut self, topic_id: u64, tags: &[String]) {
        for topic in self.catalog.values_mut().flat_map(|t| t.iter_mut()) {
            if topic.id != topic_id {
                continue;
            }
            let replaced = tags
                .iter()
                .map(|tag| {
                    let count = topic
                        .tags
                        .iter()
                        .find(|t| &t.tag == tag)
                        .map_or(0, |t| t.count);
                    TopicTag::new(tag.clone(), count)
                })
                .collect();
            topic.tags = replaced;
        }
    }

    /// Number of questions available for a tag (largest count reported by
    /// any topic carrying it), or `None` if no topic has the tag.
    #[must_use]
    pub fn available_count(&self, tag: &str) -> Option<u32> {
        available_count(&self.catalog, tag)
    }
}

/// Number of questions available for a tag in a catalog.
#[must_use]
pub fn available_count(catalog: &Catalog, tag: &str) -> Option<u32> {
    catalog
        .values()
        .flat_map(|topics| topics.iter())
        .flat_map(|topic| topic.tags.iter())
        .filter(|t| t.tag == tag)
        .map(|t| t.count)
        .max()
}
