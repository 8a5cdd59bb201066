//! Data types exchanged with the backend and held in view state.
//!
//! Wire types (`*Record`, `*Request`, `*Response`) mirror the JSON the
//! backend speaks and are deliberately lenient: optional fields default,
//! alternate field names are aliased. Domain types ([`DocumentSummary`],
//! [`KnowledgeMap`], [`Message`]) are what the views store and render.

use chrono::{DateTime, NaiveDate, NaiveDateTime, Utc};
use serde::{Deserialize, Serialize};

// ============ Provider ============

#[derive(Debug, Clone, Deserialize)]
pub struct ProviderInfo {
    pub provider: String,
    #[serde(default)]
    pub available_providers: Vec<String>,
}

#[derive(Debug, Clone, Serialize)]
pub struct SwitchProviderRequest<'a> {
    pub provider: &'a str,
}

#[derive(Debug, Clone, Deserialize)]
pub struct SwitchProviderResponse {
    pub provider: String,
    #[serde(default)]
    pub message: Option<String>,
}

// ============ Documents ============

#[derive(Debug, Clone, Deserialize)]
pub struct UploadResponse {
    pub document_id: String,
    #[serde(default)]
    pub title: Option<String>,
    #[serde(default)]
    pub page_count: Option<u32>,
}

/// One entry of `GET /documents`. Every field is optional on the wire.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct DocumentRecord {
    #[serde(default, alias = "document_id")]
    pub id: String,
    #[serde(default)]
    pub title: Option<String>,
    #[serde(default)]
    pub file_name: Option<String>,
    #[serde(default)]
    pub size: Option<f64>,
    #[serde(default)]
    pub file_size: Option<f64>,
    #[serde(default)]
    pub upload_date: Option<String>,
}

/// A document as the knowledge base page shows it.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct DocumentSummary {
    pub id: String,
    pub name: String,
    pub size_bytes: u64,
    pub size_label: String,
    pub upload_date: NaiveDate,
}

impl DocumentSummary {
    /// Project a backend record, defaulting missing fields.
    ///
    /// Name: `title`, then `file_name`, then `"Unknown"`. Size: `size`, then
    /// `file_size`, then 0. Date: parsed `upload_date`, else `today`.
    pub fn from_record(record: DocumentRecord, today: NaiveDate) -> Self {
        let name = record
            .title
            .filter(|t| !t.is_empty())
            .or(record.file_name.filter(|f| !f.is_empty()))
            .unwrap_or_else(|| "Unknown".to_string());
        let size_bytes = record
            .size
            .or(record.file_size)
            .filter(|s| s.is_finite() && *s > 0.0)
            .map(|s| s as u64)
            .unwrap_or(0);
        let upload_date = record
            .upload_date
            .as_deref()
            .and_then(parse_upload_date)
            .unwrap_or(today);

        let size_label = if size_bytes == 0 {
            "0 MB".to_string()
        } else {
            format_size_mb(size_bytes)
        };

        Self {
            id: record.id,
            name,
            size_label,
            size_bytes,
            upload_date,
        }
    }

    /// Summary for a file the user just uploaded from disk.
    pub fn from_local(id: String, name: String, size_bytes: u64, today: NaiveDate) -> Self {
        Self {
            id,
            name,
            size_label: format_size_mb(size_bytes),
            size_bytes,
            upload_date: today,
        }
    }
}

/// `"{:.1} MB"`, the only unit the listing uses.
pub fn format_size_mb(bytes: u64) -> String {
    format!("{:.1} MB", bytes as f64 / 1024.0 / 1024.0)
}

fn parse_upload_date(raw: &str) -> Option<NaiveDate> {
    if let Ok(dt) = DateTime::parse_from_rfc3339(raw) {
        return Some(dt.with_timezone(&Utc).date_naive());
    }
    if let Ok(dt) = NaiveDateTime::parse_from_str(raw, "%Y-%m-%dT%H:%M:%S%.f") {
        return Some(dt.date());
    }
    if let Ok(dt) = NaiveDateTime::parse_from_str(raw, "%Y-%m-%d %H:%M:%S") {
        return Some(dt.date());
    }
    NaiveDate::parse_from_str(raw, "%Y-%m-%d").ok()
}

// ============ Knowledge map ============

#[derive(Debug, Clone, Deserialize)]
pub struct NodeRecord {
    pub id: String,
    #[serde(default)]
    pub label: Option<String>,
    #[serde(rename = "type", default)]
    pub kind: String,
}

#[derive(Debug, Clone, Deserialize)]
pub struct EdgeRecord {
    pub source: String,
    pub target: String,
    #[serde(default)]
    pub label: Option<String>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct KnowledgeMapResponse {
    #[serde(default)]
    pub nodes: Vec<NodeRecord>,
    #[serde(default)]
    pub edges: Vec<EdgeRecord>,
}

/// Node category. Anything the backend sends outside the known set is
/// [`NodeKind::Unclassified`] and gets the base style.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum NodeKind {
    Chapter,
    Topic,
    Formula,
    Example,
    Unclassified,
}

impl NodeKind {
    pub fn from_type(raw: &str) -> Self {
        match raw {
            "chapter" => NodeKind::Chapter,
            "topic" => NodeKind::Topic,
            "formula" => NodeKind::Formula,
            "example" => NodeKind::Example,
            _ => NodeKind::Unclassified,
        }
    }

    pub fn as_str(self) -> &'static str {
        match self {
            NodeKind::Chapter => "chapter",
            NodeKind::Topic => "topic",
            NodeKind::Formula => "formula",
            NodeKind::Example => "example",
            NodeKind::Unclassified => "unclassified",
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct KnowledgeNode {
    pub id: String,
    pub label: String,
    pub kind: NodeKind,
    /// The `type` string exactly as the backend sent it.
    pub raw_type: String,
}

#[derive(Debug, Clone, PartialEq)]
pub struct KnowledgeEdge {
    pub source: String,
    pub target: String,
    pub label: Option<String>,
}

#[derive(Debug, Clone, Default, PartialEq)]
pub struct KnowledgeMap {
    pub nodes: Vec<KnowledgeNode>,
    pub edges: Vec<KnowledgeEdge>,
}

impl From<KnowledgeMapResponse> for KnowledgeMap {
    fn from(resp: KnowledgeMapResponse) -> Self {
        let nodes = resp
            .nodes
            .into_iter()
            .map(|n| KnowledgeNode {
                label: n.label.unwrap_or_else(|| n.id.clone()),
                kind: NodeKind::from_type(&n.kind),
                raw_type: n.kind,
                id: n.id,
            })
            .collect();
        let edges = resp
            .edges
            .into_iter()
            .map(|e| KnowledgeEdge {
                source: e.source,
                target: e.target,
                label: e.label.filter(|l| !l.is_empty()),
            })
            .collect();
        Self { nodes, edges }
    }
}

#[derive(Debug, Clone, Serialize)]
pub struct ExtractRequest<'a> {
    pub document_id: &'a str,
    pub extraction_level: &'a str,
}

#[derive(Debug, Clone, Deserialize)]
pub struct ExtractResponse {
    pub knowledge_id: String,
    pub document_id: String,
    #[serde(default)]
    pub chapters: Vec<serde_json::Value>,
    #[serde(default)]
    pub status: Option<String>,
}

// ============ Q&A ============

#[derive(Debug, Clone, Serialize)]
pub struct AskRequest<'a> {
    pub question: &'a str,
    pub document_id: &'a str,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub top_k: Option<u32>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct AskResponse {
    #[serde(default)]
    pub answer: String,
    #[serde(default)]
    pub provider: Option<String>,
    #[serde(default)]
    pub sources: Vec<serde_json::Value>,
    #[serde(default)]
    pub related_topics: Vec<String>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct OcrResponse {
    #[serde(default)]
    pub text: String,
    #[serde(default)]
    pub provider: Option<String>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum Role {
    User,
    Assistant,
}

/// One transcript entry.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Message {
    pub id: String,
    pub role: Role,
    pub content: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub source: Option<String>,
    /// Inline image as a `data:` URL.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub image: Option<String>,
}

impl Message {
    pub fn user(content: impl Into<String>, image: Option<String>) -> Self {
        Self {
            id: uuid::Uuid::new_v4().to_string(),
            role: Role::User,
            content: content.into(),
            source: None,
            image,
        }
    }

    pub fn assistant(content: impl Into<String>, source: Option<String>) -> Self {
        Self {
            id: uuid::Uuid::new_v4().to_string(),
            role: Role::Assistant,
            content: content.into(),
            source,
            image: None,
        }
    }
}
