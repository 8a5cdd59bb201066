//! Knowledge base page: list, search, upload and delete documents.
//!
//! The listing is held in memory and searched locally. Uploads go through
//! the same [`UploadWidget`] validation as the chat screen, and a new
//! document is prepended from the local file's name and size.

use std::path::Path;

use anyhow::Result;
use chrono::{NaiveDate, Utc};
use tracing::{info, warn};

use crate::client::{Backend, FileUpload};
use crate::config::{LibraryConfig, UploadConfig};
use crate::i18n::Language;
use crate::models::DocumentSummary;
use crate::upload::{UploadError, UploadWidget};

/// Where the current listing came from.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ListingSource {
    /// Returned by the backend.
    Live,
    /// Built-in sample data shown because the backend was unreachable.
    Offline,
}

/// Sample listing used in offline mode.
pub fn placeholder_documents() -> Vec<DocumentSummary> {
    let sample = |id: &str, name: &str, bytes: u64, label: &str, date: (i32, u32, u32)| {
        DocumentSummary {
            id: id.to_string(),
            name: name.to_string(),
            size_bytes: bytes,
            size_label: label.to_string(),
            upload_date: NaiveDate::from_ymd_opt(date.0, date.1, date.2).unwrap_or(NaiveDate::MIN),
        }
    };
    vec![
        sample("1", "高中数学必修一.docx", 2_411_724, "2.3 MB", (2024, 3, 1)),
        sample("2", "函数练习题.docx", 1_153_434, "1.1 MB", (2024, 2, 28)),
        sample("3", "集合与逻辑.docx", 876_544, "856 KB", (2024, 2, 25)),
    ]
}

pub struct KnowledgeBase {
    language: Language,
    offline_fallback: bool,
    documents: Vec<DocumentSummary>,
    source: ListingSource,
    loading: bool,
    error: Option<String>,
    uploader: UploadWidget,
}

impl KnowledgeBase {
    pub fn new(library: &LibraryConfig, upload: &UploadConfig, language: Language) -> Self {
        Self {
            language,
            offline_fallback: library.offline_fallback,
            documents: Vec::new(),
            source: ListingSource::Live,
            loading: false,
            error: None,
            uploader: UploadWidget::new(upload, language),
        }
    }

    pub fn set_language(&mut self, language: Language) {
        self.language = language;
        self.uploader.set_language(language);
    }

    pub fn documents(&self) -> &[DocumentSummary] {
        &self.documents
    }

    pub fn source(&self) -> ListingSource {
        self.source
    }

    pub fn is_loading(&self) -> bool {
        self.loading
    }

    pub fn error(&self) -> Option<&str> {
        self.error.as_deref()
    }

    /// Replace the listing with the backend's.
    ///
    /// On failure the listing is empty and `error()` is set, unless offline
    /// fallback is enabled, in which case the sample listing is shown and
    /// flagged [`ListingSource::Offline`].
    pub async fn load(&mut self, backend: &dyn Backend) {
        self.loading = true;
        self.error = None;
        let result = backend.list_documents().await;
        self.loading = false;

        match result {
            Ok(records) => {
                let today = today();
                self.documents = records
                    .into_iter()
                    .map(|r| DocumentSummary::from_record(r, today))
                    .collect();
                self.source = ListingSource::Live;
            }
            Err(e) => {
                warn!(error = %e, offline_fallback = self.offline_fallback, "failed to load documents");
                self.error = Some(e.user_message(self.language.strings().load_documents_failed));
                if self.offline_fallback {
                    self.documents = placeholder_documents();
                    self.source = ListingSource::Offline;
                } else {
                    self.documents.clear();
                    self.source = ListingSource::Live;
                }
            }
        }
    }

    /// Case-insensitive substring match on the name. The query is used as
    /// typed, whitespace included. An empty query matches everything.
    pub fn search(&self, query: &str) -> Vec<&DocumentSummary> {
        let needle = query.to_lowercase();
        self.documents
            .iter()
            .filter(|d| needle.is_empty() || d.name.to_lowercase().contains(&needle))
            .collect()
    }

    /// Validate and upload `file`; on success the new document is listed first.
    pub async fn upload(
        &mut self,
        backend: &dyn Backend,
        file: FileUpload,
    ) -> Result<&DocumentSummary, UploadError> {
        self.uploader.select(file)?;
        self.submit_selected(backend).await
    }

    pub async fn upload_path(
        &mut self,
        backend: &dyn Backend,
        path: &Path,
    ) -> Result<&DocumentSummary, UploadError> {
        self.uploader.select_path(path)?;
        self.submit_selected(backend).await
    }

    async fn submit_selected(
        &mut self,
        backend: &dyn Backend,
    ) -> Result<&DocumentSummary, UploadError> {
        let doc = match self.uploader.submit(backend).await {
            Ok(doc) => doc,
            Err(e) => {
                self.error = Some(e.to_string());
                return Err(e);
            }
        };
        self.error = None;
        self.documents.insert(
            0,
            DocumentSummary::from_local(doc.id, doc.name, doc.size_bytes, today()),
        );
        Ok(&self.documents[0])
    }

    /// Delete on the backend, then drop the item locally. On failure the
    /// item stays and the message is returned.
    pub async fn delete(&mut self, backend: &dyn Backend, id: &str) -> Result<(), String> {
        match backend.delete_document(id).await {
            Ok(()) => {
                info!(document_id = id, "document deleted");
                self.documents.retain(|d| d.id != id);
                self.error = None;
                Ok(())
            }
            Err(e) => {
                warn!(error = %e, document_id = id, "delete failed");
                let msg = e.user_message(self.language.strings().delete_failed);
                self.error = Some(msg.clone());
                Err(msg)
            }
        }
    }
}

fn today() -> NaiveDate {
    Utc::now().date_naive()
}

/// CLI entry point for `studyflow docs list`.
pub async fn run_docs_list(
    backend: &dyn Backend,
    library: &LibraryConfig,
    upload: &UploadConfig,
    language: Language,
    search: Option<&str>,
) -> Result<()> {
    let s = language.strings();
    let mut kb = KnowledgeBase::new(library, upload, language);
    kb.load(backend).await;

    if let Some(err) = kb.error() {
        if kb.source() == ListingSource::Offline {
            eprintln!("{} ({})", s.offline_notice, err);
        } else {
            anyhow::bail!(err.to_string());
        }
    }

    let docs = kb.search(search.unwrap_or(""));
    println!("{} {}", s.documents_heading, s.file_count(docs.len()));
    if docs.is_empty() {
        println!("{}", s.no_documents);
        return Ok(());
    }
    println!();
    println!("{:<38} {:>9}  {:<10}  NAME", "ID", "SIZE", "DATE");
    for d in docs {
        println!(
            "{:<38} {:>9}  {:<10}  {}",
            d.id, d.size_label, d.upload_date, d.name
        );
    }
    Ok(())
}

/// CLI entry point for `studyflow docs delete <id>`.
pub async fn run_docs_delete(backend: &dyn Backend, language: Language, id: &str) -> Result<()> {
    let mut kb = KnowledgeBase::new(&LibraryConfig::default(), &UploadConfig::default(), language);
    match kb.delete(backend, id).await {
        Ok(()) => {
            println!("deleted {}", id);
            Ok(())
        }
        Err(msg) => anyhow::bail!(msg),
    }
}
