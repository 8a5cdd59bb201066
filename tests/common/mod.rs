//! In-process fake of the StudyFlow REST API.
//!
//! Runs an axum server on `127.0.0.1:0` in a background thread with its own
//! runtime, so both async tests and tests that spawn the CLI binary can use
//! it.

#![allow(dead_code)]

use axum::extract::{Multipart, Path, Query, State};
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::routing::{delete, get, post};
use axum::{Json, Router};
use serde::Deserialize;
use serde_json::{json, Value};
use std::collections::HashMap;
use std::sync::{Arc, Mutex};
use std::time::Duration;
use tower_http::cors::{Any, CorsLayer};

#[derive(Default)]
pub struct ServerState {
    pub provider: String,
    pub documents: Vec<Value>,
    pub requests: Vec<String>,
    next_id: u32,
}

type Shared = Arc<Mutex<ServerState>>;

pub struct FakeServer {
    pub base_url: String,
    pub state: Shared,
}

impl FakeServer {
    /// Start with two documents, `doc-1` and `doc-2`, and `deepseek` as provider.
    pub fn start() -> Self {
        let state: Shared = Arc::new(Mutex::new(ServerState {
            provider: "deepseek".into(),
            documents: vec![
                json!({
                    "document_id": "doc-1",
                    "title": "高中数学必修一.pdf",
                    "file_size": 2411724,
                    "upload_date": "2024-03-01T08:30:00Z"
                }),
                json!({
                    "document_id": "doc-2",
                    "title": "函数练习题.docx",
                    "file_size": 1153434,
                    "upload_date": "2024-02-28"
                }),
            ],
            requests: Vec::new(),
            next_id: 100,
        }));

        let listener = std::net::TcpListener::bind("127.0.0.1:0").unwrap();
        listener.set_nonblocking(true).unwrap();
        let addr = listener.local_addr().unwrap();

        let app_state = state.clone();
        std::thread::spawn(move || {
            let rt = tokio::runtime::Builder::new_current_thread()
                .enable_all()
                .build()
                .unwrap();
            rt.block_on(async move {
                let listener = tokio::net::TcpListener::from_std(listener).unwrap();
                axum::serve(listener, router(app_state)).await.unwrap();
            });
        });

        FakeServer {
            base_url: format!("http://{}/api", addr),
            state,
        }
    }

    pub fn requests(&self) -> Vec<String> {
        self.state.lock().unwrap().requests.clone()
    }

    pub fn document_ids(&self) -> Vec<String> {
        self.state
            .lock()
            .unwrap()
            .documents
            .iter()
            .map(|d| d["document_id"].as_str().unwrap_or_default().to_string())
            .collect()
    }
}

fn router(state: Shared) -> Router {
    let cors = CorsLayer::new()
        .allow_origin(Any)
        .allow_methods(Any)
        .allow_headers(Any);

    Router::new()
        .route("/api/knowledge/provider", get(get_provider))
        .route("/api/knowledge/provider/switch", post(switch_provider))
        .route("/api/documents", get(list_documents))
        .route("/api/documents/upload", post(upload_document))
        .route("/api/documents/ocr", post(ocr_image))
        .route("/api/documents/{id}", delete(delete_document))
        .route("/api/knowledge/map", get(knowledge_map))
        .route("/api/knowledge/extract", post(extract_knowledge))
        .route("/api/qa/ask", post(ask))
        .layer(cors)
        .with_state(state)
}

fn detail(status: StatusCode, msg: &str) -> Response {
    (status, Json(json!({ "detail": msg }))).into_response()
}

fn has_document(state: &ServerState, id: &str) -> bool {
    state.documents.iter().any(|d| d["document_id"] == id)
}

async fn get_provider(State(state): State<Shared>) -> Json<Value> {
    let mut s = state.lock().unwrap();
    s.requests.push("GET /knowledge/provider".into());
    Json(json!({
        "provider": s.provider,
        "available_providers": ["deepseek", "minimax"]
    }))
}

#[derive(Deserialize)]
struct SwitchBody {
    provider: String,
}

async fn switch_provider(State(state): State<Shared>, Json(body): Json<SwitchBody>) -> Response {
    let mut s = state.lock().unwrap();
    s.requests
        .push(format!("POST /knowledge/provider/switch {}", body.provider));
    if body.provider != "deepseek" && body.provider != "minimax" {
        return detail(StatusCode::BAD_REQUEST, "Invalid provider");
    }
    s.provider = body.provider.clone();
    Json(json!({
        "provider": body.provider,
        "message": format!("Switched to {}", body.provider)
    }))
    .into_response()
}

async fn list_documents(State(state): State<Shared>) -> Json<Value> {
    let mut s = state.lock().unwrap();
    s.requests.push("GET /documents".into());
    Json(Value::Array(s.documents.clone()))
}

/// Returns the `file` field's name and size.
async fn read_file_field(mut multipart: Multipart) -> Option<(String, String, usize)> {
    while let Ok(Some(field)) = multipart.next_field().await {
        if field.name() != Some("file") {
            continue;
        }
        let name = field.file_name().unwrap_or_default().to_string();
        let mime = field.content_type().unwrap_or_default().to_string();
        let bytes = field.bytes().await.ok()?;
        return Some((name, mime, bytes.len()));
    }
    None
}

async fn upload_document(State(state): State<Shared>, multipart: Multipart) -> Response {
    let Some((name, _mime, size)) = read_file_field(multipart).await else {
        return detail(StatusCode::UNPROCESSABLE_ENTITY, "file required");
    };

    let mut s = state.lock().unwrap();
    s.requests.push(format!("POST /documents/upload {}", name));
    s.next_id += 1;
    let id = format!("doc-{}", s.next_id);
    s.documents.push(json!({
        "document_id": id,
        "title": name,
        "file_size": size,
        "upload_date": "2026-10-18T09:00:00Z"
    }));
    Json(json!({ "document_id": id, "title": name, "page_count": 1 })).into_response()
}

async fn ocr_image(State(state): State<Shared>, multipart: Multipart) -> Response {
    let Some((name, mime, _)) = read_file_field(multipart).await else {
        return detail(StatusCode::UNPROCESSABLE_ENTITY, "file required");
    };
    state
        .lock()
        .unwrap()
        .requests
        .push(format!("POST /documents/ocr {}", name));
    if mime != "image/png" && mime != "image/jpeg" {
        return detail(StatusCode::BAD_REQUEST, "Only PNG and JPEG images are supported");
    }
    Json(json!({ "text": "x + 1 = 2", "provider": "minimax" })).into_response()
}

async fn delete_document(State(state): State<Shared>, Path(id): Path<String>) -> Response {
    let mut s = state.lock().unwrap();
    s.requests.push(format!("DELETE /documents/{}", id));
    if !has_document(&s, &id) {
        return detail(StatusCode::NOT_FOUND, "Document not found");
    }
    s.documents.retain(|d| d["document_id"] != id.as_str());
    Json(json!({ "message": "Document deleted" })).into_response()
}

async fn knowledge_map(
    State(state): State<Shared>,
    Query(params): Query<HashMap<String, String>>,
) -> Response {
    let id = params.get("document_id").cloned().unwrap_or_default();
    let mut s = state.lock().unwrap();
    s.requests.push(format!("GET /knowledge/map?document_id={}", id));
    if !has_document(&s, &id) {
        return detail(StatusCode::NOT_FOUND, "Document not found");
    }
    Json(json!({
        "nodes": [
            { "id": "c1", "label": "第一章 集合与函数", "type": "chapter" },
            { "id": "t1", "label": "函数的定义域", "type": "topic" },
            { "id": "f1", "label": "f(x) = √(x-1)", "type": "formula" }
        ],
        "edges": [
            { "source": "c1", "target": "t1", "label": "包含" },
            { "source": "t1", "target": "f1" }
        ]
    }))
    .into_response()
}

#[derive(Deserialize)]
struct ExtractBody {
    document_id: String,
    extraction_level: String,
}

async fn extract_knowledge(State(state): State<Shared>, Json(body): Json<ExtractBody>) -> Response {
    let mut s = state.lock().unwrap();
    s.requests.push(format!(
        "POST /knowledge/extract {} {}",
        body.document_id, body.extraction_level
    ));
    if !has_document(&s, &body.document_id) {
        return detail(StatusCode::NOT_FOUND, "Document not found");
    }
    Json(json!({
        "knowledge_id": "k-1",
        "document_id": body.document_id,
        "chapters": [{ "title": "第一章" }, { "title": "第二章" }],
        "status": "completed"
    }))
    .into_response()
}

/// Questions about this document are answered only after `SLOW_REPLY`.
pub const SLOW_DOCUMENT: &str = "slow";
const SLOW_REPLY: Duration = Duration::from_secs(3);

#[derive(Deserialize)]
struct AskBody {
    question: String,
    document_id: String,
    top_k: Option<u32>,
}

async fn ask(State(state): State<Shared>, Json(body): Json<AskBody>) -> Response {
    if body.document_id == SLOW_DOCUMENT {
        tokio::time::sleep(SLOW_REPLY).await;
    }
    let mut s = state.lock().unwrap();
    s.requests.push(format!(
        "POST /qa/ask {} top_k={:?}",
        body.document_id, body.top_k
    ));
    if !has_document(&s, &body.document_id) {
        return detail(StatusCode::NOT_FOUND, "Document not found");
    }
    Json(json!({
        "answer": format!("关于「{}」：定义域为 x ≥ 1", body.question),
        "provider": s.provider,
        "sources": [],
        "related_topics": ["定义域"]
    }))
    .into_response()
}
