//! File uploads.
//!
//! The current Slack upload protocol has three remote steps:
//!
//! 1. `files.getUploadURLExternal` returns a one-time upload URL and a
//!    provisional file id for a given filename and length;
//! 2. the raw bytes are posted to that URL (multipart, no bearer token);
//! 3. `files.completeUploadExternal` shares the file id into channels.
//!
//! Local checks (existence, size ceiling, filename, MIME type) run before any
//! of them.
//! The legacy single-request `files.upload` path is kept for workspaces that
//! still allow it.

use super::SlackGateway;
use crate::client::endpoints;
use crate::client::TokenKind;
use crate::envelope::{Envelope, Failure};
use crate::limits::{check_file_size, LimitError};
use base64::engine::general_purpose::STANDARD;
use base64::Engine as _;
use reqwest::StatusCode;
use serde::{Deserialize, Serialize};
use serde_json::{json, Map, Value};
use std::ffi::OsStr;
use std::io::ErrorKind;
use std::path::{Path, PathBuf};
use tempfile::TempDir;
use thiserror::Error;
use tracing::{debug, info, instrument, warn};

/// Error code for undecodable base64 payloads.
pub const BASE64_UPLOAD_FAILED: &str = "base64_upload_failed";

/// Local upload errors, detected before any request is made.
#[derive(Debug, Error)]
pub enum UploadError {
    /// The path does not exist.
    #[error("File not found: {}", .0.display())]
    NotFound(PathBuf),

    /// The path exists but is not a regular file.
    #[error("Not a regular file: {}", .0.display())]
    NotAFile(PathBuf),

    /// Reading the file failed.
    #[error("Failed to read {}: {source}", .path.display())]
    Io {
        /// File path.
        path: PathBuf,
        /// Underlying error.
        source: std::io::Error,
    },

    /// The file exceeds the upload ceiling.
    #[error(transparent)]
    Limit(#[from] LimitError),

    /// The base64 payload could not be decoded.
    #[error("Invalid base64 payload: {0}")]
    InvalidBase64(#[from] base64::DecodeError),

    /// The filename is empty or contains path components.
    #[error("Invalid filename: {0:?}")]
    InvalidFilename(String),

    /// The explicit MIME type does not parse.
    #[error("Invalid MIME type {value:?}: {reason}")]
    InvalidMimeType {
        /// Rejected value.
        value: String,
        /// Parser message.
        reason: String,
    },

    /// The temporary copy could not be written.
    #[error("Failed to stage temporary file: {0}")]
    Staging(#[source] std::io::Error),
}

impl From<UploadError> for Failure {
    fn from(err: UploadError) -> Self {
        match err {
            UploadError::InvalidBase64(e) => {
                Failure::new(BASE64_UPLOAD_FAILED).with_details(e.to_string())
            }
            other => Failure::new(other.to_string()),
        }
    }
}

/// Optional upload metadata.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct UploadOptions {
    /// File title; Slack falls back to the filename when empty.
    pub title: String,
    /// Message posted alongside the file.
    pub initial_comment: String,
    /// MIME type of the uploaded part; detected from the extension when
    /// `None`. Must parse as `type/subtype`.
    pub mime_type: Option<String>,
    /// Slack file type identifier (e.g. `python`), sent only by the legacy
    /// `files.upload` method.
    pub filetype: Option<String>,
}

/// A file uploaded through the two-phase protocol.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct FileUploaded {
    pub message: String,
    pub file_id: String,
    pub channels: String,
    pub filename: String,
    pub file_size: u64,
}

/// A file uploaded through `files.upload`.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct LegacyFileUploaded {
    pub message: String,
    pub file_id: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub file_url: Option<String>,
    pub channels: String,
}

/// A file uploaded from a base64 payload.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Base64Uploaded {
    #[serde(flatten)]
    pub upload: FileUploaded,
    pub upload_method: String,
    pub original_filename: String,
}

/// File contents ready to send.
#[derive(Debug)]
struct LocalFile {
    filename: String,
    mime_type: String,
    bytes: Vec<u8>,
}

/// Provisional upload created by `files.getUploadURLExternal`. Lives for one
/// upload call only.
#[derive(Debug)]
struct UploadSession {
    filename: String,
    byte_length: u64,
    mime_type: String,
    upload_url: String,
    file_id: String,
}

/// A decoded base64 payload on disk, removed with its directory.
struct StagedFile {
    dir: TempDir,
    path: PathBuf,
}

impl StagedFile {
    fn cleanup(self) {
        let dir = self.dir.path().to_path_buf();
        if let Err(e) = self.dir.close() {
            warn!("Failed to remove staging directory {}: {}", dir.display(), e);
        }
    }
}

#[derive(Debug, Deserialize)]
struct RawUploadTicket {
    #[serde(default)]
    upload_url: String,
    #[serde(default)]
    file_id: String,
}

#[derive(Debug, Default, Deserialize)]
struct RawLegacyFile {
    #[serde(default)]
    id: String,
    #[serde(default)]
    url_private: Option<String>,
}

#[derive(Debug, Deserialize)]
struct RawLegacyUpload {
    #[serde(default)]
    file: RawLegacyFile,
}

impl SlackGateway {
    /// Upload a file from disk with the two-phase protocol.
    ///
    /// `channels` is a comma-separated list of channel ids; empty uploads
    /// the file without sharing it.
    #[instrument(skip(self, path, options), fields(path = %path.display()))]
    pub async fn upload_file(
        &self,
        channels: &str,
        path: &Path,
        options: &UploadOptions,
    ) -> Envelope<FileUploaded> {
        let file = match read_local_file(path, options.mime_type.as_deref()).await {
            Ok(file) => file,
            Err(e) => {
                warn!("Rejected upload of {}: {}", path.display(), e);
                return Envelope::Fail(e.into());
            }
        };

        self.upload_external(channels, file, options).await.into()
    }

    /// Upload in-memory bytes with the two-phase protocol.
    #[instrument(skip(self, bytes, options), fields(size = bytes.len()))]
    pub async fn upload_bytes(
        &self,
        channels: &str,
        filename: &str,
        bytes: Vec<u8>,
        options: &UploadOptions,
    ) -> Envelope<FileUploaded> {
        let file = match in_memory_file(filename, bytes, options.mime_type.as_deref()) {
            Ok(file) => file,
            Err(e) => {
                warn!("Rejected upload of {}: {}", filename, e);
                return Envelope::Fail(e.into());
            }
        };

        self.upload_external(channels, file, options).await.into()
    }

    /// Decode a base64 payload to a temporary file named `filename`, upload it,
    /// and remove it again.
    ///
    /// The temporary directory is removed on every path out of this function:
    /// explicitly after the upload, and by `TempDir`'s drop on early returns
    /// and unwinding.
    #[instrument(skip(self, encoded, options), fields(encoded_len = encoded.len()))]
    pub async fn upload_file_base64(
        &self,
        channels: &str,
        encoded: &str,
        filename: &str,
        options: &UploadOptions,
    ) -> Envelope<Base64Uploaded> {
        let staged = match self.stage_base64(encoded, filename).await {
            Ok(staged) => staged,
            Err(e) => {
                warn!("Rejected base64 upload of {}: {}", filename, e);
                return Envelope::Fail(e.into());
            }
        };

        let result = self.upload_file(channels, &staged.path, options).await;
        staged.cleanup();

        match result.into_result() {
            Ok(upload) => Envelope::Ok(Base64Uploaded {
                upload,
                upload_method: "base64".to_string(),
                original_filename: filename.to_string(),
            }),
            Err(failure) => Envelope::Fail(tag_base64_failure(failure, filename)),
        }
    }

    /// Upload a file from disk through the legacy `files.upload` method.
    #[instrument(skip(self, path, options), fields(path = %path.display()))]
    pub async fn upload_file_legacy(
        &self,
        channels: &str,
        path: &Path,
        options: &UploadOptions,
    ) -> Envelope<LegacyFileUploaded> {
        let file = match read_local_file(path, options.mime_type.as_deref()).await {
            Ok(file) => file,
            Err(e) => {
                warn!("Rejected upload of {}: {}", path.display(), e);
                return Envelope::Fail(e.into());
            }
        };

        let LocalFile {
            filename,
            mime_type,
            bytes,
        } = file;

        let mut fields = vec![
            ("channels", channels),
            ("title", options.title.as_str()),
            ("initial_comment", options.initial_comment.as_str()),
        ];
        if let Some(filetype) = options.filetype.as_deref().filter(|t| !t.is_empty()) {
            fields.push(("filetype", filetype));
        }

        let result = self
            .client
            .upload_legacy(&fields, &filename, &mime_type, bytes)
            .await
            .into_payload("File upload failed")
            .and_then(|payload| payload.decode::<RawLegacyUpload>())
            .map(|uploaded| LegacyFileUploaded {
                message: "File uploaded successfully (legacy API)".to_string(),
                file_id: uploaded.file.id,
                file_url: uploaded.file.url_private,
                channels: channels.to_string(),
            });

        if let Ok(uploaded) = &result {
            info!("Uploaded {} as {} (legacy)", filename, uploaded.file_id);
        }

        result.into()
    }

    async fn upload_external(
        &self,
        channels: &str,
        file: LocalFile,
        options: &UploadOptions,
    ) -> Result<FileUploaded, Failure> {
        let session = self.open_upload_session(&file).await?;
        self.send_upload_bytes(&session, file.bytes).await?;
        self.complete_upload(channels, &session, options).await?;

        info!(
            "Uploaded {} ({} bytes) as {}",
            session.filename, session.byte_length, session.file_id
        );

        Ok(FileUploaded {
            message: "File uploaded successfully".to_string(),
            file_id: session.file_id,
            channels: channels.to_string(),
            filename: session.filename,
            file_size: session.byte_length,
        })
    }

    async fn open_upload_session(&self, file: &LocalFile) -> Result<UploadSession, Failure> {
        let byte_length = file.bytes.len() as u64;

        let payload = self
            .client
            .dispatch(
                endpoints::FILES_GET_UPLOAD_URL_EXTERNAL,
                endpoints::GET_UPLOAD_URL_METHOD,
                Some(&json!({ "filename": file.filename, "length": byte_length })),
                TokenKind::Bot,
            )
            .await
            .into_payload("Could not obtain upload URL")?;

        let ticket: RawUploadTicket = payload.decode()?;
        if ticket.upload_url.is_empty() || ticket.file_id.is_empty() {
            return Err(
                Failure::new("Upload URL response missing upload_url or file_id")
                    .with_details(payload.into_value()),
            );
        }

        debug!("Upload session {} opened", ticket.file_id);

        Ok(UploadSession {
            filename: file.filename.clone(),
            byte_length,
            mime_type: file.mime_type.clone(),
            upload_url: ticket.upload_url,
            file_id: ticket.file_id,
        })
    }

    async fn send_upload_bytes(&self, session: &UploadSession, bytes: Vec<u8>) -> Result<(), Failure> {
        match self
            .client
            .upload_to_url(&session.upload_url, &session.filename, &session.mime_type, bytes)
            .await
        {
            Ok(status) if status == StatusCode::OK => Ok(()),
            Ok(status) => Err(Failure::new(format!(
                "File upload failed: HTTP {}",
                status.as_u16()
            ))),
            Err(e) => Err(Failure::new(format!("File upload failed: {}", e))),
        }
    }

    async fn complete_upload(
        &self,
        channels: &str,
        session: &UploadSession,
        options: &UploadOptions,
    ) -> Result<(), Failure> {
        let mut entry = json!({ "id": session.file_id });
        if !options.title.is_empty() {
            entry["title"] = json!(options.title);
        }

        let mut body = json!({ "files": [entry] });
        if !channels.is_empty() {
            body["channels"] = json!(channels);
        }
        if !options.initial_comment.is_empty() {
            body["initial_comment"] = json!(options.initial_comment);
        }

        self.client
            .dispatch(
                endpoints::FILES_COMPLETE_UPLOAD_EXTERNAL,
                endpoints::COMPLETE_UPLOAD_METHOD,
                Some(&body),
                TokenKind::Bot,
            )
            .await
            .into_payload("Failed to complete file upload")?;

        Ok(())
    }

    async fn stage_base64(&self, encoded: &str, filename: &str) -> Result<StagedFile, UploadError> {
        let name = bare_filename(filename)?;

        let compact: String = encoded.chars().filter(|c| !c.is_whitespace()).collect();
        let bytes = STANDARD.decode(compact)?;
        check_file_size(bytes.len() as u64)?;

        let mut builder = tempfile::Builder::new();
        builder.prefix("slack-upload-");
        let dir = match &self.scratch_dir {
            Some(parent) => builder.tempdir_in(parent),
            None => builder.tempdir(),
        }
        .map_err(UploadError::Staging)?;

        let path = dir.path().join(name);
        tokio::fs::write(&path, &bytes)
            .await
            .map_err(UploadError::Staging)?;

        debug!("Staged {} bytes at {}", bytes.len(), path.display());
        Ok(StagedFile { dir, path })
    }
}

async fn read_local_file(path: &Path, mime_type: Option<&str>) -> Result<LocalFile, UploadError> {
    let metadata = match tokio::fs::metadata(path).await {
        Ok(metadata) => metadata,
        Err(e) if e.kind() == ErrorKind::NotFound => {
            return Err(UploadError::NotFound(path.to_path_buf()))
        }
        Err(source) => {
            return Err(UploadError::Io {
                path: path.to_path_buf(),
                source,
            })
        }
    };

    if !metadata.is_file() {
        return Err(UploadError::NotAFile(path.to_path_buf()));
    }
    check_file_size(metadata.len())?;

    let bytes = tokio::fs::read(path).await.map_err(|source| UploadError::Io {
        path: path.to_path_buf(),
        source,
    })?;

    let filename = path
        .file_name()
        .map(|name| name.to_string_lossy().into_owned())
        .unwrap_or_else(|| "upload".to_string());

    Ok(LocalFile {
        mime_type: detect_mime_type(&filename, mime_type)?,
        filename,
        bytes,
    })
}

fn in_memory_file(
    filename: &str,
    bytes: Vec<u8>,
    mime_type: Option<&str>,
) -> Result<LocalFile, UploadError> {
    let filename = bare_filename(filename)?;
    check_file_size(bytes.len() as u64)?;

    Ok(LocalFile {
        mime_type: detect_mime_type(filename, mime_type)?,
        filename: filename.to_string(),
        bytes,
    })
}

/// Accept only a plain file name: no directories, no `.`/`..`.
fn bare_filename(filename: &str) -> Result<&str, UploadError> {
    let trimmed = filename.trim();
    match Path::new(trimmed).file_name() {
        Some(name) if !trimmed.is_empty() && name == OsStr::new(trimmed) => Ok(trimmed),
        _ => Err(UploadError::InvalidFilename(filename.to_string())),
    }
}

/// Explicit MIME type if given, otherwise guessed from the extension.
///
/// The explicit value must parse as `type/subtype`; it becomes the content
/// type of the uploaded part.
pub fn detect_mime_type(filename: &str, explicit: Option<&str>) -> Result<String, UploadError> {
    match explicit.map(str::trim).filter(|mime| !mime.is_empty()) {
        Some(value) => value
            .parse::<mime_guess::mime::Mime>()
            .map(|mime| mime.to_string())
            .map_err(|e| UploadError::InvalidMimeType {
                value: value.to_string(),
                reason: e.to_string(),
            }),
        None => Ok(mime_guess::from_path(filename)
            .first_or_octet_stream()
            .to_string()),
    }
}

/// Keep the base64 context on a failed upload: `upload_method` and
/// `original_filename` are merged into the failure details.
fn tag_base64_failure(mut failure: Failure, filename: &str) -> Failure {
    let mut details = match failure.details.take() {
        Some(Value::Object(map)) => map,
        Some(other) => {
            let mut map = Map::new();
            map.insert("response".to_string(), other);
            map
        }
        None => Map::new(),
    };
    details.insert("upload_method".to_string(), json!("base64"));
    details.insert("original_filename".to_string(), json!(filename));

    failure.details = Some(Value::Object(details));
    failure
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::limits::MAX_FILE_SIZE;

    #[test]
    fn test_detect_mime_type() {
        assert_eq!(detect_mime_type("notes.txt", None).unwrap(), "text/plain");
        assert_eq!(detect_mime_type("chart.png", None).unwrap(), "image/png");
        assert_eq!(
            detect_mime_type("blob", None).unwrap(),
            "application/octet-stream"
        );
        assert_eq!(
            detect_mime_type("notes.txt", Some("text/markdown")).unwrap(),
            "text/markdown"
        );
        assert_eq!(
            detect_mime_type("chart.png", Some("  ")).unwrap(),
            "image/png"
        );
    }

    #[test]
    fn test_detect_mime_type_rejects_bare_words() {
        let err = detect_mime_type("a.py", Some("python")).unwrap_err();
        assert!(matches!(err, UploadError::InvalidMimeType { ref value, .. } if value == "python"));
        assert!(err.to_string().starts_with("Invalid MIME type"));
    }

    #[test]
    fn test_in_memory_file_rejects_invalid_mime() {
        let err = in_memory_file("a.txt", b"a".to_vec(), Some("txt")).unwrap_err();
        assert!(matches!(err, UploadError::InvalidMimeType { .. }));
    }

    #[test]
    fn test_base64_failure_keeps_context() {
        let failure = tag_base64_failure(
            Failure::new("not_authed").with_details(json!({ "ok": false, "error": "not_authed" })),
            "x.txt",
        );
        let details = failure.details.unwrap();
        assert_eq!(details["upload_method"], "base64");
        assert_eq!(details["original_filename"], "x.txt");
        assert_eq!(details["error"], "not_authed");

        let failure = tag_base64_failure(Failure::new("File upload failed: HTTP 500"), "x.txt");
        assert_eq!(failure.details.unwrap()["upload_method"], "base64");
    }

    #[test]
    fn test_bare_filename() {
        assert_eq!(bare_filename("x.txt").unwrap(), "x.txt");
        assert_eq!(bare_filename(" x.txt ").unwrap(), "x.txt");
        assert!(bare_filename("").is_err());
        assert!(bare_filename("..").is_err());
        assert!(bare_filename("../etc/passwd").is_err());
        assert!(bare_filename("dir/x.txt").is_err());
    }

    #[test]
    fn test_in_memory_file_zero_bytes() {
        let file = in_memory_file("empty.txt", Vec::new(), None).unwrap();
        assert_eq!(file.filename, "empty.txt");
        assert!(file.bytes.is_empty());
        assert_eq!(file.mime_type, "text/plain");
    }

    #[tokio::test]
    async fn test_read_local_file_missing() {
        let err = read_local_file(Path::new("/definitely/not/here.txt"), None)
            .await
            .unwrap_err();
        assert!(matches!(err, UploadError::NotFound(_)));
    }

    #[tokio::test]
    async fn test_read_local_file_directory() {
        let dir = tempfile::tempdir().unwrap();
        let err = read_local_file(dir.path(), None).await.unwrap_err();
        assert!(matches!(err, UploadError::NotAFile(_)));
    }

    #[tokio::test]
    async fn test_read_local_file_oversized_sparse() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("huge.bin");
        let file = std::fs::File::create(&path).unwrap();
        file.set_len(MAX_FILE_SIZE + 1).unwrap();

        let err = read_local_file(&path, None).await.unwrap_err();
        assert!(matches!(err, UploadError::Limit(LimitError::FileTooLarge { .. })));
    }

    #[test]
    fn test_base64_error_maps_to_code() {
        let decode_err = STANDARD.decode("***").unwrap_err();
        let failure: Failure = UploadError::from(decode_err).into();
        assert_eq!(failure.error, BASE64_UPLOAD_FAILED);
        assert!(failure.details.is_some());
    }

    #[test]
    fn test_base64_uploaded_flattens() {
        let uploaded = Base64Uploaded {
            upload: FileUploaded {
                message: "File uploaded successfully".to_string(),
                file_id: "F1".to_string(),
                channels: "C1".to_string(),
                filename: "x.txt".to_string(),
                file_size: 11,
            },
            upload_method: "base64".to_string(),
            original_filename: "x.txt".to_string(),
        };

        let value = serde_json::to_value(Envelope::Ok(uploaded)).unwrap();
        assert_eq!(value["success"], true);
        assert_eq!(value["file_id"], "F1");
        assert_eq!(value["upload_method"], "base64");
    }
}
