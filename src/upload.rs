//! Upload widget: one file selection, validated locally, posted as multipart.
//!
//! Validation happens at selection time so a rejected file never reaches
//! the network. A failed upload keeps the selection so the user can simply
//! submit again; there is no automatic retry.

use std::path::Path;

use anyhow::{Context, Result};
use tracing::{info, warn};

use crate::client::{Backend, FileUpload};
use crate::config::UploadConfig;
use crate::error::ValidationError;
use crate::i18n::Language;

/// A document the backend accepted.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct UploadedDocument {
    pub id: String,
    pub name: String,
    pub size_bytes: u64,
}

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum UploadError {
    /// Rejected locally; nothing was sent.
    #[error(transparent)]
    Rejected(#[from] ValidationError),
    /// Sent and failed. Holds the user-facing message.
    #[error("{0}")]
    Failed(String),
}

#[derive(Debug, Clone)]
pub struct UploadWidget {
    allowed_extensions: Vec<String>,
    max_size_bytes: u64,
    language: Language,
    selected: Option<FileUpload>,
    uploading: bool,
    error: Option<String>,
}

impl UploadWidget {
    pub fn new(config: &UploadConfig, language: Language) -> Self {
        Self {
            allowed_extensions: config
                .allowed_extensions
                .iter()
                .map(|e| e.trim_start_matches('.').to_ascii_lowercase())
                .collect(),
            max_size_bytes: config.max_size_bytes,
            language,
            selected: None,
            uploading: false,
            error: None,
        }
    }

    pub fn set_language(&mut self, language: Language) {
        self.language = language;
    }

    pub fn selected(&self) -> Option<&FileUpload> {
        self.selected.as_ref()
    }

    pub fn is_uploading(&self) -> bool {
        self.uploading
    }

    pub fn error(&self) -> Option<&str> {
        self.error.as_deref()
    }

    pub fn clear(&mut self) {
        self.selected = None;
        self.error = None;
    }

    /// Comma-separated accepted extensions, e.g. `.pdf, .doc, .docx`.
    pub fn accepted(&self) -> String {
        self.allowed_extensions
            .iter()
            .map(|e| format!(".{}", e))
            .collect::<Vec<_>>()
            .join(", ")
    }

    /// Check a file name and size against the allow-list and size limit.
    pub fn validate(&self, file_name: &str, size: u64) -> Result<(), ValidationError> {
        let ext = Path::new(file_name)
            .extension()
            .and_then(|e| e.to_str())
            .map(|e| e.to_ascii_lowercase())
            .unwrap_or_default();

        if !self.allowed_extensions.iter().any(|a| *a == ext) {
            return Err(ValidationError::UnsupportedFileType {
                found: if ext.is_empty() {
                    file_name.to_string()
                } else {
                    format!(".{}", ext)
                },
                accepted: self.accepted(),
            });
        }

        if size > self.max_size_bytes {
            return Err(ValidationError::FileTooLarge {
                size,
                limit: self.max_size_bytes,
            });
        }

        Ok(())
    }

    /// Select an in-memory file. A rejected file leaves any previous
    /// selection in place and sets `error()`.
    pub fn select(&mut self, file: FileUpload) -> Result<(), ValidationError> {
        match self.validate(&file.file_name, file.len()) {
            Ok(()) => {
                self.selected = Some(file);
                self.error = None;
                Ok(())
            }
            Err(e) => {
                self.error = Some(self.rejection_message(&e));
                Err(e)
            }
        }
    }

    /// Select a file from disk. Type and size are checked before the
    /// contents are read.
    pub fn select_path(&mut self, path: &Path) -> Result<(), UploadError> {
        let file_name = path
            .file_name()
            .and_then(|n| n.to_str())
            .unwrap_or_default()
            .to_string();
        let size = std::fs::metadata(path).map(|m| m.len()).unwrap_or(0);

        if let Err(e) = self.validate(&file_name, size) {
            self.error = Some(self.rejection_message(&e));
            return Err(e.into());
        }

        let bytes = std::fs::read(path).map_err(|e| {
            let msg = format!("{}: {}", path.display(), e);
            self.error = Some(msg.clone());
            UploadError::Failed(msg)
        })?;
        self.select(FileUpload::new(file_name, bytes))?;
        Ok(())
    }

    /// Post the selected file. Without a selection nothing is sent.
    pub async fn submit(&mut self, backend: &dyn Backend) -> Result<UploadedDocument, UploadError> {
        let file = self
            .selected
            .clone()
            .ok_or(UploadError::Rejected(ValidationError::NoFileSelected))?;

        self.uploading = true;
        self.error = None;
        let name = file.file_name.clone();
        let size_bytes = file.len();
        let result = backend.upload_document(file).await;
        self.uploading = false;

        match result {
            Ok(resp) => {
                info!(document_id = %resp.document_id, file = %name, "document uploaded");
                self.selected = None;
                Ok(UploadedDocument {
                    id: resp.document_id,
                    name,
                    size_bytes,
                })
            }
            Err(e) => {
                warn!(error = %e, file = %name, "upload failed");
                let msg = e.user_message(self.language.strings().upload_failed);
                self.error = Some(msg.clone());
                Err(UploadError::Failed(msg))
            }
        }
    }

    fn rejection_message(&self, err: &ValidationError) -> String {
        let s = self.language.strings();
        match err {
            ValidationError::UnsupportedFileType { accepted, .. } => {
                format!("{} ({})", s.unsupported_file_type, accepted)
            }
            ValidationError::FileTooLarge { .. } => {
                format!("{} ({})", s.file_too_large, err)
            }
            other => other.to_string(),
        }
    }
}

/// CLI entry point for `studyflow upload <file>`.
pub async fn run_upload(
    backend: &dyn Backend,
    config: &UploadConfig,
    language: Language,
    path: &Path,
) -> Result<UploadedDocument> {
    let mut widget = UploadWidget::new(config, language);
    if let Err(e) = widget.select_path(path) {
        anyhow::bail!(widget.error().map(str::to_string).unwrap_or_else(|| e.to_string()));
    }
    let doc = widget
        .submit(backend)
        .await
        .with_context(|| format!("uploading {}", path.display()))?;
    println!("document_id: {}", doc.id);
    Ok(doc)
}
