//! # StudyFlow
//!
//! Client for the StudyFlow study-assistant backend: upload course material,
//! browse the knowledge map extracted from it, and ask questions answered
//! from the document by a selectable LLM provider.
//!
//! The backend does all the heavy lifting (parsing, extraction, retrieval,
//! generation). This crate holds the view state around it: what is selected,
//! what is loading, what failed and what to show instead.
//!
//! ## Architecture
//!
//! ```text
//! ┌──────────────────────── Session ─────────────────────────┐
//! │ provider  upload  knowledge_map  chat  library   router  │
//! └────┬────────┬───────────┬─────────┬──────┬───────────────┘
//!      └────────┴───────────┴────┬────┴──────┘
//!                                ▼
//!                       ┌─────────────────┐      ┌──────────────┐
//!                       │ Backend (trait) │─────▶│  REST API    │
//!                       │   ApiClient     │ HTTP │ /api/...     │
//!                       └─────────────────┘      └──────────────┘
//! ```
//!
//! ## Quick Start
//!
//! ```bash
//! studyflow upload 高中数学必修一.pdf
//! studyflow map <document_id>
//! studyflow ask "函数 f(x) = √(x-1) 的定义域是什么？" --document <document_id>
//! studyflow provider switch minimax
//! ```
//!
//! ## Modules
//!
//! | Module | Purpose |
//! |--------|---------|
//! | [`config`] | TOML configuration parsing |
//! | [`client`] | `Backend` trait and the reqwest implementation |
//! | [`error`] | Backend and validation errors |
//! | [`models`] | Wire types and view-side records |
//! | [`i18n`] | Chinese and English string tables |
//! | [`provider`] | LLM provider selector |
//! | [`upload`] | File selection, validation, multipart upload |
//! | [`knowledge_map`] | Graph elements, stylesheet, node selection |
//! | [`chat`] | Q&A transcript, image attachments, OCR |
//! | [`library`] | Document listing, search, delete |
//! | [`router`] | Path to screen mapping |
//! | [`session`] | Active document and language shared across views |

pub mod chat;
pub mod client;
pub mod config;
pub mod error;
pub mod i18n;
pub mod knowledge_map;
pub mod library;
pub mod models;
pub mod provider;
pub mod router;
pub mod session;
pub mod upload;

#[cfg(test)]
mod testing;
