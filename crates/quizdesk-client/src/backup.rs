//! Backup schedule, remote backups and archive restore.

use std::time::Duration;

use futures::stream;
use quizdesk_core::{
    BackupSettings, MessageResponse, OkResponse, ProgressSink, RemoteBackup, RemoteRestoreRequest,
    RestorePhase, RestoreProgress, UploadFile, UploadKind,
};
use reqwest::{multipart, Body, Method};
use tokio::sync::watch;
use tokio::time::MissedTickBehavior;
use tracing::{debug, info, instrument};

use crate::resources::expect_kind;
use crate::{ApiClient, ClientError, Result};

/// Size of the chunks the archive is streamed in.
const UPLOAD_CHUNK_SIZE: usize = 64 * 1024;

impl ApiClient {
    /// Fetches the stored schedule (time in UTC).
    #[instrument(skip(self))]
    pub async fn backup_settings(&self) -> Result<BackupSettings> {
        let builder = self.authed(Method::GET, "/admin/backup-settings")?;
        Self::send_json(builder, true).await
    }

    /// Stores the schedule.
    #[instrument(skip(self, settings), fields(time = %settings.time))]
    pub async fn save_backup_settings(&self, settings: &BackupSettings) -> Result<()> {
        let builder = self
            .authed(Method::POST, "/admin/backup-settings")?
            .json(settings);
        let _: OkResponse = Self::send_json(builder, true).await?;
        Ok(())
    }

    /// Runs a backup immediately.
    #[instrument(skip(self))]
    pub async fn run_backup_now(&self) -> Result<MessageResponse> {
        let builder = self.authed(Method::POST, "/admin/backup-now")?;
        Self::send_json(builder, true).await
    }

    /// Lists archives on the remote disk.
    #[instrument(skip(self))]
    pub async fn remote_backups(&self) -> Result<Vec<RemoteBackup>> {
        let builder = self.authed(Method::GET, "/admin/yadisk-backups")?;
        Self::send_json(builder, true).await
    }

    /// Restores the database from a remote archive.
    #[instrument(skip(self))]
    pub async fn restore_from_remote(&self, path: &str) -> Result<MessageResponse> {
        let builder = self
            .authed(Method::POST, "/admin/yadisk-restore")?
            .json(&RemoteRestoreRequest {
                path: path.to_string(),
            });
        let response: MessageResponse = Self::send_json(builder, true).await?;
        info!(path, "Remote restore finished");
        Ok(response)
    }

    /// Uploads an archive and restores the database from it.
    ///
    /// Progress goes to `sink`: real byte progress during the upload, then a
    /// crawl every `crawl_interval` while the backend processes the archive,
    /// then 100 when the response arrives. A failed request leaves progress
    /// where it was.
    #[instrument(skip(self, file, sink), fields(file = %file.file_name, size = file.len()))]
    pub async fn restore_from_archive(
        &self,
        file: &UploadFile,
        crawl_interval: Duration,
        sink: &mut dyn ProgressSink,
    ) -> Result<MessageResponse> {
        expect_kind(file, UploadKind::ZipArchive)?;
        let total = file.len();
        let (sent_tx, mut sent_rx) = watch::channel(0_u64);

        let chunks: Vec<Vec<u8>> = file
            .data
            .chunks(UPLOAD_CHUNK_SIZE)
            .map(<[u8]>::to_vec)
            .collect();
        let mut sent = 0_u64;
        let body = stream::iter(chunks.into_iter().map(move |chunk| {
            sent += chunk.len() as u64;
            // receiver may already be gone if the request failed
            let _ = sent_tx.send(sent);
            Ok::<_, std::io::Error>(chunk)
        }));

        let part = multipart::Part::stream_with_length(Body::wrap_stream(body), total)
            .file_name(file.file_name.clone())
            .mime_str(file.kind.mime())
            .map_err(ClientError::Network)?;
        let builder = self
            .authed(Method::POST, "/admin/restore")?
            .multipart(multipart::Form::new().part("file", part));

        let response = Self::send_json::<MessageResponse>(builder, true);
        tokio::pin!(response);

        let mut progress = RestoreProgress::new();
        progress.upload(0, total);
        progress.report(sink);

        let mut crawl = tokio::time::interval(crawl_interval);
        crawl.set_missed_tick_behavior(MissedTickBehavior::Delay);
        let mut uploading = true;

        loop {
            tokio::select! {
                result = &mut response => {
                    let message = result?;
                    if progress.finish() {
                        progress.report(sink);
                    }
                    info!(message = %message.message, "Archive restore finished");
                    return Ok(message);
                }
                changed = sent_rx.changed(), if uploading => {
                    let done = match changed {
                        Ok(()) => {
                            let sent = *sent_rx.borrow_and_update();
                            if progress.upload(sent, total) {
                                progress.report(sink);
                            }
                            sent >= total
                        }
                        Err(_) => true,
                    };
                    if done {
                        uploading = false;
                        debug!("Upload complete, waiting for backend");
                        if progress.begin_processing() {
                            progress.report(sink);
                        }
                        crawl.reset();
                    }
                }
                _ = crawl.tick(), if progress.phase() == RestorePhase::Processing => {
                    if progress.tick() {
                        progress.report(sink);
                    }
                }
            }
        }
    }
}
