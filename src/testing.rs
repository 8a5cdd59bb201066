//! In-memory [`Backend`] for unit tests.

use async_trait::async_trait;
use std::sync::Mutex;

use crate::client::{Backend, FileUpload};
use crate::error::ApiError;
use crate::models::{
    AskRequest, AskResponse, DocumentRecord, ExtractResponse, KnowledgeMapResponse, OcrResponse,
    ProviderInfo, SwitchProviderResponse, UploadResponse,
};

/// Canned reply: a value, or `(status, detail)` turned into [`ApiError::Backend`].
pub(crate) type Reply<T> = Result<T, (u16, Option<&'static str>)>;

pub(crate) struct FakeBackend {
    calls: Mutex<Vec<String>>,
    provider: Mutex<Reply<ProviderInfo>>,
    switch: Mutex<Option<Reply<String>>>,
    upload: Mutex<Reply<String>>,
    documents: Mutex<Reply<Vec<DocumentRecord>>>,
    delete: Mutex<Reply<()>>,
    map: Mutex<Reply<KnowledgeMapResponse>>,
    extract: Mutex<Reply<usize>>,
    ask: Mutex<Reply<AskResponse>>,
    ocr: Mutex<Reply<String>>,
}

fn reply<T: Clone>(slot: &Mutex<Reply<T>>) -> Result<T, ApiError> {
    match slot.lock().unwrap().clone() {
        Ok(v) => Ok(v),
        Err((status, detail)) => Err(ApiError::Backend {
            status,
            detail: detail.map(str::to_string),
        }),
    }
}

impl FakeBackend {
    pub fn new() -> Self {
        Self {
            calls: Mutex::new(Vec::new()),
            provider: Mutex::new(Ok(ProviderInfo {
                provider: "deepseek".into(),
                available_providers: vec!["deepseek".into(), "minimax".into()],
            })),
            switch: Mutex::new(None),
            upload: Mutex::new(Ok("doc-42".into())),
            documents: Mutex::new(Ok(Vec::new())),
            delete: Mutex::new(Ok(())),
            map: Mutex::new(Ok(KnowledgeMapResponse {
                nodes: Vec::new(),
                edges: Vec::new(),
            })),
            extract: Mutex::new(Ok(1)),
            ask: Mutex::new(Ok(AskResponse {
                answer: "answer".into(),
                provider: Some("deepseek".into()),
                sources: Vec::new(),
                related_topics: Vec::new(),
            })),
            ocr: Mutex::new(Ok("x + 1 = 2".into())),
        }
    }

    pub fn calls(&self) -> Vec<String> {
        self.calls.lock().unwrap().clone()
    }

    fn record(&self, call: String) {
        self.calls.lock().unwrap().push(call);
    }

    pub fn set_provider(&self, r: Reply<ProviderInfo>) {
        *self.provider.lock().unwrap() = r;
    }
    /// `None` echoes the requested provider back.
    pub fn set_switch(&self, r: Option<Reply<String>>) {
        *self.switch.lock().unwrap() = r;
    }
    pub fn set_upload(&self, r: Reply<String>) {
        *self.upload.lock().unwrap() = r;
    }
    pub fn set_documents(&self, r: Reply<Vec<DocumentRecord>>) {
        *self.documents.lock().unwrap() = r;
    }
    pub fn set_delete(&self, r: Reply<()>) {
        *self.delete.lock().unwrap() = r;
    }
    pub fn set_map(&self, r: Reply<KnowledgeMapResponse>) {
        *self.map.lock().unwrap() = r;
    }
    pub fn set_extract(&self, r: Reply<usize>) {
        *self.extract.lock().unwrap() = r;
    }
    pub fn set_ask(&self, r: Reply<AskResponse>) {
        *self.ask.lock().unwrap() = r;
    }
    pub fn set_ocr(&self, r: Reply<String>) {
        *self.ocr.lock().unwrap() = r;
    }
}

#[async_trait]
impl Backend for FakeBackend {
    async fn get_provider(&self) -> Result<ProviderInfo, ApiError> {
        self.record("GET /knowledge/provider".into());
        reply(&self.provider)
    }

    async fn switch_provider(&self, provider: &str) -> Result<SwitchProviderResponse, ApiError> {
        self.record(format!("POST /knowledge/provider/switch {}", provider));
        let canned = self.switch.lock().unwrap().clone();
        match canned {
            None => Ok(SwitchProviderResponse {
                provider: provider.to_string(),
                message: None,
            }),
            Some(r) => reply(&Mutex::new(r)).map(|provider| SwitchProviderResponse {
                provider,
                message: None,
            }),
        }
    }

    async fn upload_document(&self, file: FileUpload) -> Result<UploadResponse, ApiError> {
        self.record(format!("POST /documents/upload {}", file.file_name));
        reply(&self.upload).map(|document_id| UploadResponse {
            document_id,
            title: None,
            page_count: None,
        })
    }

    async fn list_documents(&self) -> Result<Vec<DocumentRecord>, ApiError> {
        self.record("GET /documents".into());
        reply(&self.documents)
    }

    async fn delete_document(&self, id: &str) -> Result<(), ApiError> {
        self.record(format!("DELETE /documents/{}", id));
        reply(&self.delete)
    }

    async fn knowledge_map(&self, document_id: &str) -> Result<KnowledgeMapResponse, ApiError> {
        self.record(format!("GET /knowledge/map?document_id={}", document_id));
        reply(&self.map)
    }

    async fn extract_knowledge(
        &self,
        document_id: &str,
        level: &str,
    ) -> Result<ExtractResponse, ApiError> {
        self.record(format!("POST /knowledge/extract {} {}", document_id, level));
        reply(&self.extract).map(|n| ExtractResponse {
            knowledge_id: "k-1".into(),
            document_id: document_id.to_string(),
            chapters: vec![serde_json::json!({}); n],
            status: Some("completed".into()),
        })
    }

    async fn ask(&self, request: &AskRequest<'_>) -> Result<AskResponse, ApiError> {
        self.record(format!(
            "POST /qa/ask {} top_k={:?} {}",
            request.document_id, request.top_k, request.question
        ));
        reply(&self.ask)
    }

    async fn ocr_image(&self, file: FileUpload) -> Result<OcrResponse, ApiError> {
        self.record(format!("POST /documents/ocr {}", file.file_name));
        reply(&self.ocr).map(|text| OcrResponse {
            text,
            provider: Some("minimax".into()),
        })
    }
}
