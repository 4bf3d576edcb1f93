//! Local files chosen for upload.
//!
//! Every upload is checked before a request is built: question and answer
//! images must be PNG, restore archives `.zip`, Excel imports `.xlsx`.

use std::path::{Path, PathBuf};

use crate::error::{CoreError, Result};

const PNG_MAGIC: [u8; 8] = [0x89, 0x50, 0x4E, 0x47, 0x0D, 0x0A, 0x1A, 0x0A];
const ZIP_MAGIC: [u8; 4] = [0x50, 0x4B, 0x03, 0x04];

/// What a file is being uploaded as.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum UploadKind {
    /// Question or answer image.
    Png,
    /// Database backup archive.
    ZipArchive,
    /// Excel workbook.
    Xlsx,
}

impl UploadKind {
    /// Expected file extension.
    #[must_use]
    pub const fn extension(self) -> &'static str {
        match self {
            Self::Png => "png",
            Self::ZipArchive => "zip",
            Self::Xlsx => "xlsx",
        }
    }

    /// MIME type sent with the multipart part.
    #[must_use]
    pub const fn mime(self) -> &'static str {
        match self {
            Self::Png => "image/png",
            Self::ZipArchive => "application/zip",
            Self::Xlsx => "application/vnd.openxmlformats-officedocument.spreadsheetml.sheet",
        }
    }

    fn label(self) -> &'static str {
        match self {
            Self::Png => "PNG",
            Self::ZipArchive => ".zip",
            Self::Xlsx => ".xlsx",
        }
    }

    /// Whether the path carries the expected extension (case-insensitive).
    #[must_use]
    pub fn matches_path(self, path: &Path) -> bool {
        path.extension()
            .and_then(|ext| ext.to_str())
            .is_some_and(|ext| ext.eq_ignore_ascii_case(self.extension()))
    }

    fn matches_content(self, data: &[u8]) -> bool {
        match self {
            Self::Png => data.starts_with(&PNG_MAGIC),
            // xlsx is a zip container
            Self::ZipArchive | Self::Xlsx => data.starts_with(&ZIP_MAGIC),
        }
    }
}

/// A validated file ready to be sent.
#[derive(Clone, PartialEq, Eq)]
pub struct UploadFile {
    /// Source path.
    pub path: PathBuf,
    /// File name sent in the multipart header.
    pub file_name: String,
    /// Upload kind.
    pub kind: UploadKind,
    /// File contents.
    pub data: Vec<u8>,
}

impl std::fmt::Debug for UploadFile {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("UploadFile")
            .field("path", &self.path)
            .field("file_name", &self.file_name)
            .field("kind", &self.kind)
            .field("len", &self.data.len())
            .finish()
    }
}

impl UploadFile {
    /// Reads and validates a file.
    ///
    /// # Errors
    ///
    /// Returns `CoreError::UnsupportedUpload` if the extension or the leading
    /// bytes do not match the kind, and `CoreError::Io` if reading fails.
    pub fn load(path: impl AsRef<Path>, kind: UploadKind) -> Result<Self> {
        let path = path.as_ref();
        if !kind.matches_path(path) {
            return Err(CoreError::unsupported_upload(path, kind.label()));
        }
        let data = std::fs::read(path)?;
        Self::from_bytes(path, kind, data)
    }

    /// Validates in-memory contents.
    pub fn from_bytes(path: impl AsRef<Path>, kind: UploadKind, data: Vec<u8>) -> Result<Self> {
        let path = path.as_ref();
        if !kind.matches_content(&data) {
            return Err(CoreError::unsupported_upload(path, kind.label()));
        }
        let file_name = path
            .file_name()
            .and_then(|n| n.to_str())
            .map_or_else(|| format!("upload.{}", kind.extension()), ToString::to_string);
        Ok(Self {
            path: path.to_path_buf(),
            file_name,
            kind,
            data,
        })
    }

    /// Size in bytes.
    #[must_use]
    pub fn len(&self) -> u64 {
        self.data.len() as u64
    }

    /// Returns `true` for an empty file.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.data.is_empty()
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    fn png_bytes() -> Vec<u8> {
        let mut data = PNG_MAGIC.to_vec();
        data.extend_from_slice(&[0, 0, 0, 13]);
        data
    }

    #[test]
    fn test_extension_check_is_case_insensitive() {
        assert!(UploadKind::Png.matches_path(Path::new("a/b/IMG.PNG")));
        assert!(UploadKind::ZipArchive.matches_path(Path::new("backup.zip")));
        assert!(!UploadKind::Xlsx.matches_path(Path::new("table.xls")));
        assert!(!UploadKind::Png.matches_path(Path::new("noext")));
    }

    #[test]
    fn test_from_bytes_checks_magic() {
        let file = UploadFile::from_bytes("q.png", UploadKind::Png, png_bytes()).unwrap();
        assert_eq!(file.file_name, "q.png");
        assert_eq!(file.len(), 12);

        let err = UploadFile::from_bytes("q.png", UploadKind::Png, b"GIF89a".to_vec()).unwrap_err();
        assert!(err.is_validation());
        assert!(err.to_string().contains("PNG"));
    }

    #[test]
    fn test_load_rejects_wrong_extension_before_reading() {
        let err = UploadFile::load("/nonexistent/photo.jpg", UploadKind::Png).unwrap_err();
        assert!(matches!(err, CoreError::UnsupportedUpload { .. }));
    }

    #[test]
    fn test_load_reads_file() {
        let path = std::env::temp_dir().join("test_quizdesk_upload.zip");
        std::fs::write(&path, [0x50, 0x4B, 0x03, 0x04, 1, 2, 3]).unwrap();

        let file = UploadFile::load(&path, UploadKind::ZipArchive).unwrap();
        assert_eq!(file.kind.mime(), "application/zip");
        assert_eq!(file.data.len(), 7);

        std::fs::remove_file(&path).ok();
    }

    #[test]
    fn test_load_missing_file_is_io_error() {
        let err = UploadFile::load("/nonexistent/backup.zip", UploadKind::ZipArchive).unwrap_err();
        assert!(matches!(err, CoreError::Io(_)));
    }
}
