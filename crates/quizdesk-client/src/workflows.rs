//! Multi-step admin operations.
//!
//! Each operation validates its input, calls the backend, and mutates local
//! state only after the backend confirmed the change. A failed request leaves
//! local state untouched. Mutations of users or topics invalidate the
//! matching cache entry.

use std::time::Duration;

use chrono::Utc;
use futures::future::try_join_all;
use quizdesk_core::{
    BackupSettings, BackupSettingsForm, CacheKey, CacheStore, Catalog, CatalogTree, Config,
    CreatedTraining, EgeTable, HardFilter, ImageSlot, NewQuestionForm, PoolIndex, ProgressSink,
    MessageResponse, QuestionDraft, Selection, TopicSelection, UploadFile, User,
};
use tracing::{debug, info, instrument};

use crate::{ApiClient, Result};

/// An authenticated console session: the client plus its caches.
#[derive(Debug)]
pub struct Console {
    client: ApiClient,
    cache: CacheStore,
    backup_offset_hours: i32,
    crawl_interval: Duration,
}

impl Console {
    /// Creates a session from a client and the loaded configuration.
    #[must_use]
    pub fn new(client: ApiClient, config: &Config) -> Self {
        Self {
            client,
            cache: CacheStore::new(config.cache_ttl_secs),
            backup_offset_hours: config.backup_utc_offset_hours,
            crawl_interval: Duration::from_millis(config.restore_crawl_interval_ms),
        }
    }

    /// Underlying client.
    #[must_use]
    pub const fn client(&self) -> &ApiClient {
        &self.client
    }

    /// Display offset for backup times.
    #[must_use]
    pub const fn backup_offset_hours(&self) -> i32 {
        self.backup_offset_hours
    }

    // ========================================================================
    // Cached lists
    // ========================================================================

    /// Student list, served from cache while fresh.
    pub async fn users(&mut self) -> Result<Vec<User>> {
        if let Some(users) = self.cache.users(Utc::now()) {
            debug!("User list served from cache");
            return Ok(users.to_vec());
        }
        let users = self.client.users().await?;
        self.cache.put_users(users.clone(), Utc::now());
        Ok(users)
    }

    /// Topic tree, served from cache while fresh.
    pub async fn catalog(&mut self) -> Result<Catalog> {
        if let Some(catalog) = self.cache.catalog(Utc::now()) {
            debug!("Catalog served from cache");
            return Ok(catalog.clone());
        }
        let catalog = self.client.topics().await?;
        self.cache.put_catalog(catalog.clone(), Utc::now());
        Ok(catalog)
    }

    /// Catalog wrapped for editing.
    pub async fn catalog_tree(&mut self) -> Result<CatalogTree> {
        Ok(CatalogTree::new(self.catalog().await?))
    }

    // ========================================================================
    // Users
    // ========================================================================

    /// Renames a student.
    pub async fn rename_user(&mut self, telegram_id: i64, name: &str) -> Result<()> {
        self.client.rename_user(telegram_id, name).await?;
        self.cache.invalidate(CacheKey::Users);
        Ok(())
    }

    /// Deletes a student.
    pub async fn delete_user(&mut self, telegram_id: i64) -> Result<()> {
        self.client.delete_user(telegram_id).await?;
        self.cache.invalidate(CacheKey::Users);
        Ok(())
    }

    // ========================================================================
    // Training composer
    // ========================================================================

    /// Creates a training from per-tag counts and clears the selection.
    #[instrument(skip(self, selection), fields(total = selection.total()))]
    pub async fn create_training_by_topics(
        &self,
        selection: &mut TopicSelection,
        name: &str,
    ) -> Result<CreatedTraining> {
        let request = selection.build_request(name)?;
        let created = self.client.create_hand_work(&request).await?;
        selection.clear();
        info!(training_id = created.id, "Training created by topics");
        Ok(created)
    }

    /// Creates a hard filter training. The slots are kept.
    #[instrument(skip(self, filter), fields(count = filter.count()))]
    pub async fn create_training_hard_filter(
        &self,
        filter: &HardFilter,
        name: &str,
    ) -> Result<CreatedTraining> {
        let request = filter.build_request(name)?;
        let created = self.client.create_hand_work(&request).await?;
        info!(training_id = created.id, "Training created by hard filter");
        Ok(created)
    }

    // ========================================================================
    // Catalog
    // ========================================================================

    /// Deletes every topic of a volume, then the volume itself.
    ///
    /// The per-topic deletes run concurrently and are not atomic: if one
    /// fails, topics deleted before it stay deleted and the local tree is
    /// left as it was until the next fetch.
    #[instrument(skip(self, tree))]
    pub async fn delete_volume(&mut self, tree: &mut CatalogTree, volume: &str) -> Result<usize> {
        let ids = tree.topics_to_delete(volume)?;
        if !ids.is_empty() {
            let result =
                try_join_all(ids.iter().map(|id| self.client.delete_topic(*id))).await;
            self.cache.invalidate(CacheKey::Catalog);
            result?;
        }
        tree.apply_volume_deleted(volume);
        info!(volume, topics = ids.len(), "Volume deleted");
        Ok(ids.len())
    }

    /// Creates a topic, promoting a pending volume.
    #[instrument(skip(self, tree))]
    pub async fn create_topic(
        &mut self,
        tree: &mut CatalogTree,
        name: &str,
        volume: &str,
    ) -> Result<u64> {
        let body = tree.validate_new_topic(name, volume)?;
        let created = self.client.create_topic(&body).await?;
        let id = created.id;
        tree.apply_topic_created(volume, created.into());
        self.cache.invalidate(CacheKey::Catalog);
        Ok(id)
    }

    /// Deletes a single topic.
    #[instrument(skip(self, tree))]
    pub async fn delete_topic(&mut self, tree: &mut CatalogTree, topic_id: u64) -> Result<()> {
        self.client.delete_topic(topic_id).await?;
        tree.apply_topic_deleted(topic_id);
        self.cache.invalidate(CacheKey::Catalog);
        Ok(())
    }

    /// Adds a tag to a topic by replacing its whole tag list.
    #[instrument(skip(self, tree))]
    pub async fn add_topic_tag(
        &mut self,
        tree: &mut CatalogTree,
        topic_id: u64,
        raw_tag: &str,
    ) -> Result<()> {
        let tags = tree.tags_with_added(topic_id, raw_tag)?;
        self.client.update_topic_tags(topic_id, &tags).await?;
        tree.apply_tags_replaced(topic_id, &tags);
        self.cache.invalidate(CacheKey::Catalog);
        Ok(())
    }

    /// Removes a tag from a topic by replacing its whole tag list.
    #[instrument(skip(self, tree))]
    pub async fn remove_topic_tag(
        &mut self,
        tree: &mut CatalogTree,
        topic_id: u64,
        tag: &str,
    ) -> Result<()> {
        let tags = tree.tags_without(topic_id, tag)?;
        self.client.update_topic_tags(topic_id, &tags).await?;
        tree.apply_tags_replaced(topic_id, &tags);
        self.cache.invalidate(CacheKey::Catalog);
        Ok(())
    }

    /// Replaces the topic table from a workbook.
    pub async fn import_topics(&mut self, file: &UploadFile) -> Result<MessageResponse> {
        let response = self.client.import_topics(file).await?;
        self.cache.invalidate(CacheKey::Catalog);
        Ok(response)
    }

    // ========================================================================
    // Pool
    // ========================================================================

    /// Fetches the whole pool for client-side search.
    pub async fn pool_index(&self) -> Result<PoolIndex> {
        Ok(PoolIndex::new(self.client.pool().await?))
    }

    /// Loads a question into the editor.
    ///
    /// Returns `None` when the question is already selected, or when the
    /// selection moved on while the request was in flight.
    pub async fn load_question(
        &self,
        selection: &mut Selection,
        id: u64,
    ) -> Result<Option<QuestionDraft>> {
        if !selection.begin(id) {
            return Ok(None);
        }
        let question = match self.client.question(id).await {
            Ok(question) => question,
            Err(e) => {
                selection.abandon(id);
                return Err(e);
            }
        };
        if !selection.accept(id) {
            debug!(question_id = id, "Dropping stale question response");
            return Ok(None);
        }
        Ok(Some(QuestionDraft::new(question)))
    }

    /// Deactivates a question and drops it from the index.
    #[instrument(skip(self, pool, selection))]
    pub async fn delete_question(
        &self,
        pool: &mut PoolIndex,
        selection: &mut Selection,
        id: u64,
    ) -> Result<()> {
        self.client.delete_question(id).await?;
        pool.remove(id);
        if selection.current() == Some(id) {
            selection.clear();
        }
        Ok(())
    }

    /// Saves pending edits. Returns `false` when there was nothing to save.
    #[instrument(skip(self, pool, draft), fields(question_id = draft.id()))]
    pub async fn save_question(&self, pool: &mut PoolIndex, draft: &mut QuestionDraft) -> Result<bool> {
        if !draft.is_dirty() {
            return Ok(false);
        }
        let update = draft.to_update();
        self.client.update_question(draft.id(), &update).await?;
        draft.commit();
        pool.apply_saved(draft.id(), &update.text, &update.tags_list);
        info!(question_id = draft.id(), "Question saved");
        Ok(true)
    }

    /// Uploads an image, then refetches the record to resync image flags.
    pub async fn replace_image(
        &self,
        draft: &mut QuestionDraft,
        slot: ImageSlot,
        file: &UploadFile,
    ) -> Result<()> {
        self.client.upload_image(draft.id(), slot, file).await?;
        let fresh = self.client.question(draft.id()).await?;
        draft.reset_from(fresh);
        Ok(())
    }

    /// Deletes an image, then refetches the record.
    pub async fn remove_image(&self, draft: &mut QuestionDraft, slot: ImageSlot) -> Result<()> {
        self.client.delete_image(draft.id(), slot).await?;
        let fresh = self.client.question(draft.id()).await?;
        draft.reset_from(fresh);
        Ok(())
    }

    /// Creates a question, uploads optional images, and adds it to the index.
    #[instrument(skip_all)]
    pub async fn create_question(
        &self,
        pool: &mut PoolIndex,
        form: &NewQuestionForm,
        question_image: Option<&UploadFile>,
        answer_image: Option<&UploadFile>,
    ) -> Result<u64> {
        let body = form.validate()?;
        let created = self.client.create_question(&body).await?;
        if let Some(file) = question_image {
            self.client
                .upload_image(created.id, ImageSlot::Question, file)
                .await?;
        }
        if let Some(file) = answer_image {
            self.client
                .upload_image(created.id, ImageSlot::Answer, file)
                .await?;
        }
        pool.insert(quizdesk_core::QuestionSummary {
            id: created.id,
            text: body.text,
            tags_list: body.tags_list,
        });
        Ok(created.id)
    }

    // ========================================================================
    // EGE and backups
    // ========================================================================

    /// Saves the conversion table when it has no errors.
    pub async fn save_ege_table(&self, table: &EgeTable) -> Result<()> {
        let payload = table.payload()?;
        self.client.update_ege_table(&payload).await
    }

    /// Loads the backup form with the time shown at the display offset.
    pub async fn backup_form(&self) -> Result<BackupSettingsForm> {
        let settings = self.client.backup_settings().await?;
        Ok(BackupSettingsForm::from_settings(
            &settings,
            self.backup_offset_hours,
        )?)
    }

    /// Converts the form back to UTC and saves it.
    pub async fn save_backup_settings(&self, form: &BackupSettingsForm) -> Result<BackupSettings> {
        let settings = form.to_settings(self.backup_offset_hours)?;
        self.client.save_backup_settings(&settings).await?;
        Ok(settings)
    }

    /// Restores from an uploaded archive with the configured crawl interval.
    /// Every cached list may be stale afterwards.
    pub async fn restore_from_archive(
        &mut self,
        file: &UploadFile,
        sink: &mut dyn ProgressSink,
    ) -> Result<MessageResponse> {
        let response = self
            .client
            .restore_from_archive(file, self.crawl_interval, sink)
            .await?;
        self.cache.clear();
        Ok(response)
    }

    /// Restores from a remote archive.
    pub async fn restore_from_remote(&mut self, path: &str) -> Result<MessageResponse> {
        let response = self.client.restore_from_remote(path).await?;
        self.cache.clear();
        Ok(response)
    }
}
