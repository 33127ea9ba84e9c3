//! Upload module
//!
//! State, intents and errors for a single direct-to-storage PUT transfer.

use bytes::Bytes;
use serde::Serialize;
use std::io;
use std::path::{Path, PathBuf};
use thiserror::Error;

pub mod controller;
pub mod drop_zone;
pub mod format;

pub use controller::UploadController;
pub use drop_zone::DropZone;

/// Upload errors
///
/// The `Display` text of each variant is the message shown to the user.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum UploadError {
    #[error("Please provide both a file and a presigned URL")]
    MissingInput,

    #[error("Invalid presigned URL format")]
    InvalidUrl,

    #[error("Upload failed with status: {status}")]
    HttpFailure { status: u16 },

    #[error("Upload failed. Please check your presigned URL and try again.")]
    TransportError,

    #[error("Upload was cancelled")]
    Aborted,
}

impl UploadError {
    /// Short label used for metrics and structured logs
    pub fn kind(&self) -> &'static str {
        match self {
            UploadError::MissingInput => "missing_input",
            UploadError::InvalidUrl => "invalid_url",
            UploadError::HttpFailure { .. } => "http_failure",
            UploadError::TransportError => "transport_error",
            UploadError::Aborted => "aborted",
        }
    }
}

/// Coarse-grained stage of a transfer attempt
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum Phase {
    #[default]
    Idle,
    Uploading,
    Succeeded,
    Failed,
}

/// Transfer state
///
/// `error` is `Some` exactly when `phase` is [`Phase::Failed`].
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct TransferState {
    pub phase: Phase,
    pub progress: u8,
    pub error: Option<String>,
}

impl TransferState {
    pub fn is_uploading(&self) -> bool {
        self.phase == Phase::Uploading
    }
}

/// Raw bytes of a selected file
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Payload {
    /// Payload already held in memory
    InMemory(Bytes),
    /// Payload streamed from disk when the transfer starts
    OnDisk(PathBuf),
}

/// A file chosen through the picker or dropped on the drop zone
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SelectedFile {
    pub name: String,
    pub size: u64,
    /// MIME type, empty when unknown
    pub mime_type: String,
    pub payload: Payload,
}

impl SelectedFile {
    /// Create a selected file from in-memory bytes
    pub fn from_bytes(name: impl Into<String>, mime_type: impl Into<String>, data: Bytes) -> Self {
        Self {
            name: name.into(),
            size: data.len() as u64,
            mime_type: mime_type.into(),
            payload: Payload::InMemory(data),
        }
    }

    /// Create a selected file backed by a file on disk
    ///
    /// The MIME type is guessed from the extension and left empty when the
    /// extension is unknown. The payload itself is not read until upload.
    pub async fn from_path<P: AsRef<Path>>(path: P) -> io::Result<Self> {
        let path = path.as_ref();
        let metadata = tokio::fs::metadata(path).await?;
        if !metadata.is_file() {
            return Err(io::Error::new(
                io::ErrorKind::InvalidInput,
                format!("{} is not a regular file", path.display()),
            ));
        }

        let name = path
            .file_name()
            .map(|n| n.to_string_lossy().into_owned())
            .unwrap_or_default();
        let mime_type = mime_guess::from_path(path)
            .first()
            .map(|m| m.essence_str().to_string())
            .unwrap_or_default();

        Ok(Self {
            name,
            size: metadata.len(),
            mime_type,
            payload: Payload::OnDisk(path.to_path_buf()),
        })
    }
}

/// Selected file as exposed to the presentation layer
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct FileSummary {
    pub name: String,
    pub size: u64,
    pub formatted_size: String,
    pub mime_type: String,
}

impl From<&SelectedFile> for FileSummary {
    fn from(file: &SelectedFile) -> Self {
        Self {
            name: file.name.clone(),
            size: file.size,
            formatted_size: format::format_file_size(file.size),
            mime_type: file.mime_type.clone(),
        }
    }
}

/// Everything a renderer needs, captured at one instant
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Snapshot {
    #[serde(flatten)]
    pub state: TransferState,
    pub file: Option<FileSummary>,
    pub target: String,
    /// Last progress event of the current transfer had no usable total
    pub indeterminate: bool,
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    #[test]
    fn test_error_messages() {
        assert_eq!(
            UploadError::MissingInput.to_string(),
            "Please provide both a file and a presigned URL"
        );
        assert_eq!(
            UploadError::InvalidUrl.to_string(),
            "Invalid presigned URL format"
        );
        assert_eq!(
            UploadError::HttpFailure { status: 403 }.to_string(),
            "Upload failed with status: 403"
        );
        assert_eq!(UploadError::Aborted.to_string(), "Upload was cancelled");
    }

    #[test]
    fn test_default_state_is_idle() {
        let state = TransferState::default();
        assert_eq!(state.phase, Phase::Idle);
        assert_eq!(state.progress, 0);
        assert!(state.error.is_none());
    }

    #[test]
    fn test_from_bytes() {
        let file = SelectedFile::from_bytes("a.txt", "text/plain", Bytes::from("hello"));
        assert_eq!(file.size, 5);
        assert_eq!(file.payload, Payload::InMemory(Bytes::from("hello")));
    }

    #[tokio::test]
    async fn test_from_path_guesses_mime_type() {
        let mut temp = tempfile::Builder::new().suffix(".json").tempfile().unwrap();
        temp.write_all(b"{\"k\": 1}").unwrap();
        temp.flush().unwrap();

        let file = SelectedFile::from_path(temp.path()).await.unwrap();
        assert_eq!(file.size, 8);
        assert_eq!(file.mime_type, "application/json");
        assert!(file.name.ends_with(".json"));
        assert_eq!(file.payload, Payload::OnDisk(temp.path().to_path_buf()));
    }

    #[tokio::test]
    async fn test_from_path_unknown_extension_has_empty_mime() {
        let temp = tempfile::Builder::new()
            .suffix(".zzunknown")
            .tempfile()
            .unwrap();
        let file = SelectedFile::from_path(temp.path()).await.unwrap();
        assert_eq!(file.mime_type, "");
        assert_eq!(file.size, 0);
    }

    #[tokio::test]
    async fn test_from_path_rejects_directory() {
        let dir = tempfile::tempdir().unwrap();
        let err = SelectedFile::from_path(dir.path()).await.unwrap_err();
        assert_eq!(err.kind(), io::ErrorKind::InvalidInput);
    }
}
