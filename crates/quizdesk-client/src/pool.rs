//! Question pool endpoints.

use quizdesk_core::{
    CreatedQuestion, ImageSlot, ImportResult, NewQuestion, OkResponse, Question, QuestionSummary,
    QuestionUpdate, UploadFile, UploadKind,
};
use reqwest::Method;
use tracing::{info, instrument};

use crate::resources::{expect_kind, file_form};
use crate::{ApiClient, Result};

impl ApiClient {
    /// Lists every pool question as a lightweight row.
    #[instrument(skip(self))]
    pub async fn pool(&self) -> Result<Vec<QuestionSummary>> {
        let builder = self.authed(Method::GET, "/admin/pool")?;
        Self::send_json(builder, true).await
    }

    /// Fetches one full question.
    #[instrument(skip(self))]
    pub async fn question(&self, id: u64) -> Result<Question> {
        let builder = self.authed(Method::GET, &format!("/admin/pool/{id}"))?;
        Self::send_json(builder, true).await
    }

    /// Adds a question.
    #[instrument(skip(self, question))]
    pub async fn create_question(&self, question: &NewQuestion) -> Result<CreatedQuestion> {
        let builder = self.authed(Method::POST, "/admin/pool")?.json(question);
        let created: CreatedQuestion = Self::send_json(builder, true).await?;
        info!(question_id = created.id, "Question created");
        Ok(created)
    }

    /// Saves the merged edit of a question.
    #[instrument(skip(self, update))]
    pub async fn update_question(&self, id: u64, update: &QuestionUpdate) -> Result<()> {
        let builder = self
            .authed(Method::PUT, &format!("/admin/pool/{id}"))?
            .json(update);
        let _: OkResponse = Self::send_json(builder, true).await?;
        Ok(())
    }

    /// Deactivates a question.
    #[instrument(skip(self))]
    pub async fn delete_question(&self, id: u64) -> Result<()> {
        let builder = self.authed(Method::DELETE, &format!("/admin/pool/{id}"))?;
        let _: OkResponse = Self::send_json(builder, true).await?;
        info!(question_id = id, "Question deactivated");
        Ok(())
    }

    /// Uploads a PNG into one image slot.
    #[instrument(skip(self, file), fields(file = %file.file_name))]
    pub async fn upload_image(&self, id: u64, slot: ImageSlot, file: &UploadFile) -> Result<()> {
        expect_kind(file, UploadKind::Png)?;
        let builder = self
            .authed(Method::POST, &format!("/admin/pool/{id}/{}", slot.endpoint()))?
            .multipart(file_form(file)?);
        let _: OkResponse = Self::send_json(builder, true).await?;
        Ok(())
    }

    /// Removes the image from one slot.
    #[instrument(skip(self))]
    pub async fn delete_image(&self, id: u64, slot: ImageSlot) -> Result<()> {
        let builder = self.authed(Method::DELETE, &format!("/admin/pool/{id}/{}", slot.endpoint()))?;
        let _: OkResponse = Self::send_json(builder, true).await?;
        Ok(())
    }

    /// Downloads the Excel import template.
    #[instrument(skip(self))]
    pub async fn pool_template(&self) -> Result<Vec<u8>> {
        let builder = self.authed(Method::GET, "/admin/pool/template")?;
        Self::send_bytes(builder).await
    }

    /// Bulk-imports questions from an Excel workbook.
    #[instrument(skip(self, file), fields(file = %file.file_name))]
    pub async fn import_pool(&self, file: &UploadFile) -> Result<ImportResult> {
        expect_kind(file, UploadKind::Xlsx)?;
        let builder = self
            .authed(Method::POST, "/admin/pool/import")?
            .multipart(file_form(file)?);
        let result: ImportResult = Self::send_json(builder, true).await?;
        info!(imported = result.imported_count, "Pool import finished");
        Ok(result)
    }
}
