//! Resume storage. The application ledger hands over the uploaded bytes and
//! keeps only the reference returned here.
//!
//! `LocalResumeStorage` writes under the upload directory (served statically
//! at `/uploads`); `S3ResumeStorage` writes to a bucket and references objects
//! by key.

use std::path::{Path, PathBuf};

use async_trait::async_trait;
use aws_sdk_s3::primitives::ByteStream;
use bytes::Bytes;
use chrono::Utc;
use tracing::info;
use uuid::Uuid;

use crate::errors::AppError;

pub const ALLOWED_EXTENSIONS: &[&str] = &["pdf", "doc", "docx"];

/// Public URL prefix the local upload directory is mounted at.
pub const PUBLIC_PREFIX: &str = "uploads";

/// A file received in the `resume` multipart field.
#[derive(Debug, Clone)]
pub struct ResumeUpload {
    pub file_name: String,
    pub content_type: Option<String>,
    pub bytes: Bytes,
}

impl ResumeUpload {
    /// Lowercased extension of the client-side file name.
    pub fn extension(&self) -> Option<String> {
        Path::new(&self.file_name)
            .extension()
            .and_then(|e| e.to_str())
            .map(|e| e.to_ascii_lowercase())
    }

    /// Rejects unsupported formats, empty files and files over `max_bytes`.
    pub fn validate(&self, max_bytes: usize) -> Result<(), AppError> {
        match self.extension() {
            Some(ext) if ALLOWED_EXTENSIONS.contains(&ext.as_str()) => {}
            _ => {
                return Err(AppError::Validation(
                    "Only PDF, DOC and DOCX resumes are allowed".to_string(),
                ))
            }
        }
        if self.bytes.is_empty() {
            return Err(AppError::Validation("Resume file is empty".to_string()));
        }
        if self.bytes.len() > max_bytes {
            return Err(AppError::Validation(format!(
                "Resume file must be at most {} bytes",
                max_bytes
            )));
        }
        Ok(())
    }

    /// `resume-<millis>-<uuid>.<ext>`, never derived from the client's name.
    fn storage_name(&self) -> String {
        format!(
            "resume-{}-{}.{}",
            Utc::now().timestamp_millis(),
            Uuid::new_v4(),
            self.extension().unwrap_or_else(|| "bin".to_string())
        )
    }
}

#[async_trait]
pub trait ResumeStorage: Send + Sync {
    /// Persists the file and returns its storage reference.
    async fn store(&self, upload: &ResumeUpload) -> Result<String, AppError>;

    /// Removes a previously stored file. Used to undo a write whose
    /// application insert lost a uniqueness race.
    async fn remove(&self, reference: &str) -> Result<(), AppError>;
}

pub struct LocalResumeStorage {
    root: PathBuf,
}

impl LocalResumeStorage {
    /// Creates `<root>/resumes` if needed.
    pub async fn new(root: impl Into<PathBuf>) -> Result<Self, AppError> {
        let root = root.into();
        tokio::fs::create_dir_all(root.join("resumes"))
            .await
            .map_err(|e| AppError::Storage(format!("cannot create upload directory: {e}")))?;
        Ok(LocalResumeStorage { root })
    }

    fn path_for(&self, reference: &str) -> Option<PathBuf> {
        let relative = reference.strip_prefix(PUBLIC_PREFIX)?.trim_start_matches('/');
        if relative.split('/').any(|part| part == "..") {
            return None;
        }
        Some(self.root.join(relative))
    }
}

#[async_trait]
impl ResumeStorage for LocalResumeStorage {
    async fn store(&self, upload: &ResumeUpload) -> Result<String, AppError> {
        let name = upload.storage_name();
        let path = self.root.join("resumes").join(&name);
        tokio::fs::write(&path, &upload.bytes)
            .await
            .map_err(|e| AppError::Storage(format!("write {}: {e}", path.display())))?;
        info!("Stored resume at {}", path.display());
        Ok(format!("{PUBLIC_PREFIX}/resumes/{name}"))
    }

    async fn remove(&self, reference: &str) -> Result<(), AppError> {
        let path = self
            .path_for(reference)
            .ok_or_else(|| AppError::Storage(format!("not a local resume: {reference}")))?;
        tokio::fs::remove_file(&path)
            .await
            .map_err(|e| AppError::Storage(format!("remove {}: {e}", path.display())))
    }
}

pub struct S3ResumeStorage {
    client: aws_sdk_s3::Client,
    bucket: String,
}

impl S3ResumeStorage {
    pub fn new(client: aws_sdk_s3::Client, bucket: String) -> Self {
        S3ResumeStorage { client, bucket }
    }
}

#[async_trait]
impl ResumeStorage for S3ResumeStorage {
    async fn store(&self, upload: &ResumeUpload) -> Result<String, AppError> {
        let key = format!("resumes/{}", upload.storage_name());
        self.client
            .put_object()
            .bucket(&self.bucket)
            .key(&key)
            .body(ByteStream::from(upload.bytes.to_vec()))
            .content_type(
                upload
                    .content_type
                    .clone()
                    .unwrap_or_else(|| "application/octet-stream".to_string()),
            )
            .send()
            .await
            .map_err(|e| AppError::Storage(format!("S3 upload failed: {e}")))?;
        info!("Uploaded resume to s3://{}/{}", self.bucket, key);
        Ok(key)
    }

    async fn remove(&self, reference: &str) -> Result<(), AppError> {
        self.client
            .delete_object()
            .bucket(&self.bucket)
            .key(reference)
            .send()
            .await
            .map_err(|e| AppError::Storage(format!("S3 delete failed: {e}")))?;
        Ok(())
    }
}
