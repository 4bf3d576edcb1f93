//! Users, topics, trainings and the EGE table.

use quizdesk_core::{
    Catalog, CoreError, CreateTrainingRequest, CreatedTopic, CreatedTraining, EgeRow, EgeUpdate,
    HandWork, MessageResponse, NewTopic, OkResponse, RenameUser, SendTrainingRequest, UploadFile,
    UploadKind, User, WorkStat,
};
use reqwest::{multipart, Method};
use serde::Serialize;
use tracing::{info, instrument};

use crate::{ApiClient, ClientError, Result};

#[derive(Serialize)]
struct TagsBody<'a> {
    tags_list: &'a [String],
}

/// Builds the single-file multipart form used by every upload endpoint.
pub(crate) fn file_form(file: &UploadFile) -> Result<multipart::Form> {
    let part = multipart::Part::bytes(file.data.clone())
        .file_name(file.file_name.clone())
        .mime_str(file.kind.mime())
        .map_err(ClientError::Network)?;
    Ok(multipart::Form::new().part("file", part))
}

pub(crate) fn expect_kind(file: &UploadFile, kind: UploadKind) -> Result<()> {
    if file.kind == kind {
        Ok(())
    } else {
        Err(CoreError::unsupported_upload(&file.path, kind.extension()).into())
    }
}

impl ApiClient {
    // ========================================================================
    // Users
    // ========================================================================

    /// Lists students.
    #[instrument(skip(self))]
    pub async fn users(&self) -> Result<Vec<User>> {
        let builder = self.authed(Method::GET, "/admin/users")?;
        Self::send_json(builder, true).await
    }

    /// Renames a student. Blank names are rejected locally.
    #[instrument(skip(self))]
    pub async fn rename_user(&self, telegram_id: i64, name: &str) -> Result<()> {
        let name = name.trim();
        if name.is_empty() {
            return Err(CoreError::validation("name", "Введите имя").into());
        }
        let builder = self
            .authed(Method::PUT, &format!("/admin/users/{telegram_id}"))?
            .json(&RenameUser {
                name: name.to_string(),
            });
        let _: OkResponse = Self::send_json(builder, true).await?;
        info!(telegram_id, "User renamed");
        Ok(())
    }

    /// Deletes a student and, server-side, their work history.
    #[instrument(skip(self))]
    pub async fn delete_user(&self, telegram_id: i64) -> Result<()> {
        let builder = self.authed(Method::DELETE, &format!("/admin/users/{telegram_id}"))?;
        let _: OkResponse = Self::send_json(builder, true).await?;
        info!(telegram_id, "User deleted");
        Ok(())
    }

    /// Lists a student's completed works.
    #[instrument(skip(self))]
    pub async fn user_stats(&self, telegram_id: i64) -> Result<Vec<WorkStat>> {
        let builder = self.authed(Method::GET, &format!("/admin/users/{telegram_id}/stats"))?;
        Self::send_json(builder, true).await
    }

    // ========================================================================
    // Topics
    // ========================================================================

    /// Fetches the volume/topic tree.
    #[instrument(skip(self))]
    pub async fn topics(&self) -> Result<Catalog> {
        let builder = self.authed(Method::GET, "/admin/topics")?;
        Self::send_json(builder, true).await
    }

    /// Creates a topic under a volume.
    #[instrument(skip(self))]
    pub async fn create_topic(&self, topic: &NewTopic) -> Result<CreatedTopic> {
        let builder = self.authed(Method::POST, "/admin/topics")?.json(topic);
        Self::send_json(builder, true).await
    }

    /// Deletes a topic.
    #[instrument(skip(self))]
    pub async fn delete_topic(&self, topic_id: u64) -> Result<()> {
        let builder = self.authed(Method::DELETE, &format!("/admin/topics/{topic_id}"))?;
        let _: OkResponse = Self::send_json(builder, true).await?;
        Ok(())
    }

    /// Replaces a topic's whole tag list.
    #[instrument(skip(self))]
    pub async fn update_topic_tags(&self, topic_id: u64, tags: &[String]) -> Result<()> {
        let builder = self
            .authed(Method::PUT, &format!("/admin/topics/{topic_id}"))?
            .json(&TagsBody { tags_list: tags });
        let _: OkResponse = Self::send_json(builder, true).await?;
        Ok(())
    }

    /// Downloads the topic table as an Excel workbook.
    #[instrument(skip(self))]
    pub async fn export_topics(&self) -> Result<Vec<u8>> {
        let builder = self.authed(Method::GET, "/admin/topics/export")?;
        Self::send_bytes(builder).await
    }

    /// Replaces the topic table from an Excel workbook.
    #[instrument(skip(self, file), fields(file = %file.file_name))]
    pub async fn import_topics(&self, file: &UploadFile) -> Result<MessageResponse> {
        expect_kind(file, UploadKind::Xlsx)?;
        let builder = self
            .authed(Method::POST, "/admin/topics/import")?
            .multipart(file_form(file)?);
        Self::send_json(builder, true).await
    }

    // ========================================================================
    // Trainings
    // ========================================================================

    /// Creates a training.
    #[instrument(skip(self, request), fields(mode = ?request.mode))]
    pub async fn create_hand_work(&self, request: &CreateTrainingRequest) -> Result<CreatedTraining> {
        let builder = self.authed(Method::POST, "/admin/hand-works")?.json(request);
        Self::send_json(builder, true).await
    }

    /// Lists trainings.
    #[instrument(skip(self))]
    pub async fn hand_works(&self) -> Result<Vec<HandWork>> {
        let builder = self.authed(Method::GET, "/admin/hand-works")?;
        Self::send_json(builder, true).await
    }

    /// Deletes a training.
    #[instrument(skip(self))]
    pub async fn delete_hand_work(&self, id: u64) -> Result<()> {
        let builder = self.authed(Method::DELETE, &format!("/admin/hand-works/{id}"))?;
        let _: OkResponse = Self::send_json(builder, true).await?;
        Ok(())
    }

    /// Sends a training link to a student through the bot.
    #[instrument(skip(self, request), fields(telegram_id = request.telegram_id))]
    pub async fn send_training(&self, request: &SendTrainingRequest) -> Result<()> {
        let builder = self.authed(Method::POST, "/admin/send-training")?.json(request);
        let _: OkResponse = Self::send_json(builder, true).await?;
        info!(telegram_id = request.telegram_id, "Training sent");
        Ok(())
    }

    // ========================================================================
    // EGE conversion
    // ========================================================================

    /// Fetches the conversion table.
    #[instrument(skip(self))]
    pub async fn ege_table(&self) -> Result<Vec<EgeRow>> {
        let builder = self.authed(Method::GET, "/admin/ege-converting")?;
        Self::send_json(builder, true).await
    }

    /// Replaces the conversion table.
    #[instrument(skip(self, update))]
    pub async fn update_ege_table(&self, update: &EgeUpdate) -> Result<()> {
        let builder = self.authed(Method::PUT, "/admin/ege-converting")?.json(update);
        let _: OkResponse = Self::send_json(builder, true).await?;
        Ok(())
    }
}
