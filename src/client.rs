//! HTTP client for the StudyFlow backend.
//!
//! [`Backend`] is the seam every view talks through. [`ApiClient`] is the
//! real implementation: one `reqwest::Client` with the configured base URL
//! and timeout, JSON in and out, multipart for file uploads.
//!
//! # Endpoints
//!
//! | Method | Path | Used by |
//! |--------|------|---------|
//! | `GET`    | `/knowledge/provider` | [`provider`](crate::provider) |
//! | `POST`   | `/knowledge/provider/switch` | [`provider`](crate::provider) |
//! | `POST`   | `/documents/upload` | [`upload`](crate::upload), [`library`](crate::library) |
//! | `GET`    | `/documents` | [`library`](crate::library) |
//! | `DELETE` | `/documents/{id}` | [`library`](crate::library) |
//! | `POST`   | `/documents/ocr` | [`chat`](crate::chat) |
//! | `GET`    | `/knowledge/map?document_id=` | [`knowledge_map`](crate::knowledge_map) |
//! | `POST`   | `/knowledge/extract` | [`knowledge_map`](crate::knowledge_map) |
//! | `POST`   | `/qa/ask` | [`chat`](crate::chat) |
//!
//! Non-2xx responses become [`ApiError::Backend`] with the body's `detail`
//! extracted. Timeouts and connection failures are [`ApiError::Network`].
//! There is no retry.

use async_trait::async_trait;
use reqwest::multipart;
use serde::de::DeserializeOwned;
use tracing::{debug, warn};

use crate::config::ApiConfig;
use crate::error::ApiError;
use crate::models::{
    AskRequest, AskResponse, DocumentRecord, ExtractRequest, ExtractResponse,
    KnowledgeMapResponse, OcrResponse, ProviderInfo, SwitchProviderRequest,
    SwitchProviderResponse, UploadResponse,
};

/// A file ready to be sent as the multipart `file` field.
#[derive(Debug, Clone)]
pub struct FileUpload {
    pub file_name: String,
    pub mime: String,
    pub bytes: Vec<u8>,
}

impl FileUpload {
    /// Wrap raw bytes, guessing the content type from the file name.
    pub fn new(file_name: impl Into<String>, bytes: Vec<u8>) -> Self {
        let file_name = file_name.into();
        let mime = mime_guess::from_path(&file_name)
            .first_or_octet_stream()
            .essence_str()
            .to_string();
        Self {
            file_name,
            mime,
            bytes,
        }
    }

    pub fn len(&self) -> u64 {
        self.bytes.len() as u64
    }

    pub fn is_empty(&self) -> bool {
        self.bytes.is_empty()
    }
}

/// Every backend operation the views need.
///
/// Implemented by [`ApiClient`] for the real service. Tests implement it
/// with an in-memory fake to drive views without a network.
#[async_trait]
pub trait Backend: Send + Sync {
    async fn get_provider(&self) -> Result<ProviderInfo, ApiError>;

    async fn switch_provider(&self, provider: &str) -> Result<SwitchProviderResponse, ApiError>;

    async fn upload_document(&self, file: FileUpload) -> Result<UploadResponse, ApiError>;

    async fn list_documents(&self) -> Result<Vec<DocumentRecord>, ApiError>;

    async fn delete_document(&self, id: &str) -> Result<(), ApiError>;

    async fn knowledge_map(&self, document_id: &str) -> Result<KnowledgeMapResponse, ApiError>;

    async fn extract_knowledge(
        &self,
        document_id: &str,
        level: &str,
    ) -> Result<ExtractResponse, ApiError>;

    async fn ask(&self, request: &AskRequest<'_>) -> Result<AskResponse, ApiError>;

    async fn ocr_image(&self, file: FileUpload) -> Result<OcrResponse, ApiError>;
}

/// REST client bound to one backend base URL.
#[derive(Debug, Clone)]
pub struct ApiClient {
    http: reqwest::Client,
    base_url: String,
}

impl ApiClient {
    pub fn new(config: &ApiConfig) -> Result<Self, ApiError> {
        let http = reqwest::Client::builder()
            .timeout(config.timeout())
            .build()?;
        Ok(Self {
            http,
            base_url: config.base_url.trim_end_matches('/').to_string(),
        })
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    fn url(&self, path: &str) -> String {
        format!("{}{}", self.base_url, path)
    }

    fn file_part(file: FileUpload) -> Result<multipart::Part, ApiError> {
        Ok(multipart::Part::bytes(file.bytes)
            .file_name(file.file_name)
            .mime_str(&file.mime)?)
    }
}

/// Turn a response into `T`, or into a [`ApiError::Backend`] carrying the
/// body's `detail` when the status is not 2xx.
async fn decode<T: DeserializeOwned>(
    path: &str,
    resp: reqwest::Response,
) -> Result<T, ApiError> {
    let status = resp.status();
    let body = resp.text().await?;

    if !status.is_success() {
        warn!(%status, path, "backend request failed");
        return Err(ApiError::from_body(status.as_u16(), &body));
    }

    serde_json::from_str(&body).map_err(|e| {
        warn!(path, error = %e, "undecodable backend response");
        ApiError::Decode(format!("{}: {}", path, e))
    })
}

#[async_trait]
impl Backend for ApiClient {
    async fn get_provider(&self) -> Result<ProviderInfo, ApiError> {
        let path = "/knowledge/provider";
        debug!(method = "GET", path);
        let resp = self.http.get(self.url(path)).send().await?;
        decode(path, resp).await
    }

    async fn switch_provider(&self, provider: &str) -> Result<SwitchProviderResponse, ApiError> {
        let path = "/knowledge/provider/switch";
        debug!(method = "POST", path, provider);
        let resp = self
            .http
            .post(self.url(path))
            .json(&SwitchProviderRequest { provider })
            .send()
            .await?;
        decode(path, resp).await
    }

    async fn upload_document(&self, file: FileUpload) -> Result<UploadResponse, ApiError> {
        let path = "/documents/upload";
        debug!(method = "POST", path, file = %file.file_name, bytes = file.len());
        let form = multipart::Form::new().part("file", Self::file_part(file)?);
        let resp = self
            .http
            .post(self.url(path))
            .multipart(form)
            .send()
            .await?;
        decode(path, resp).await
    }

    async fn list_documents(&self) -> Result<Vec<DocumentRecord>, ApiError> {
        let path = "/documents";
        debug!(method = "GET", path);
        let resp = self.http.get(self.url(path)).send().await?;
        decode(path, resp).await
    }

    async fn delete_document(&self, id: &str) -> Result<(), ApiError> {
        let path = format!("/documents/{}", id);
        debug!(method = "DELETE", path = %path);
        let resp = self.http.delete(self.url(&path)).send().await?;
        let status = resp.status();
        if status.is_success() {
            return Ok(());
        }
        let body = resp.text().await.unwrap_or_default();
        warn!(%status, path = %path, "delete failed");
        Err(ApiError::from_body(status.as_u16(), &body))
    }

    async fn knowledge_map(&self, document_id: &str) -> Result<KnowledgeMapResponse, ApiError> {
        let path = "/knowledge/map";
        debug!(method = "GET", path, document_id);
        let resp = self
            .http
            .get(self.url(path))
            .query(&[("document_id", document_id)])
            .send()
            .await?;
        decode(path, resp).await
    }

    async fn extract_knowledge(
        &self,
        document_id: &str,
        level: &str,
    ) -> Result<ExtractResponse, ApiError> {
        let path = "/knowledge/extract";
        debug!(method = "POST", path, document_id, level);
        let resp = self
            .http
            .post(self.url(path))
            .json(&ExtractRequest {
                document_id,
                extraction_level: level,
            })
            .send()
            .await?;
        decode(path, resp).await
    }

    async fn ask(&self, request: &AskRequest<'_>) -> Result<AskResponse, ApiError> {
        let path = "/qa/ask";
        debug!(method = "POST", path, document_id = request.document_id);
        let resp = self
            .http
            .post(self.url(path))
            .json(request)
            .send()
            .await?;
        decode(path, resp).await
    }

    async fn ocr_image(&self, file: FileUpload) -> Result<OcrResponse, ApiError> {
        let path = "/documents/ocr";
        debug!(method = "POST", path, file = %file.file_name);
        let form = multipart::Form::new().part("file", Self::file_part(file)?);
        let resp = self
            .http
            .post(self.url(path))
            .multipart(form)
            .send()
            .await?;
        decode(path, resp).await
    }
}
