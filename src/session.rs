//! Shared state for one user session.
//!
//! Owns every view plus the two things they share: the active document id
//! and the display language. Uploading a document makes it active, which
//! rebinds the chat panel and retargets the next map load.

use anyhow::Result;

use crate::chat::ChatPanel;
use crate::client::Backend;
use crate::config::Config;
use crate::i18n::Language;
use crate::knowledge_map::{MapState, MapViewer};
use crate::library::KnowledgeBase;
use crate::provider::ProviderSelector;
use crate::router::{resolve, Resolution, Route};
use crate::upload::{UploadError, UploadWidget, UploadedDocument};

pub struct Session {
    language: Language,
    active_document: Option<String>,
    route: Route,
    pub provider: ProviderSelector,
    pub upload: UploadWidget,
    pub map: MapViewer,
    pub chat: ChatPanel,
    pub library: KnowledgeBase,
}

impl Session {
    pub fn new(config: &Config) -> Self {
        let language = config.ui.language;
        Self {
            language,
            active_document: None,
            route: Route::Chat,
            provider: ProviderSelector::new(language),
            upload: UploadWidget::new(&config.upload, language),
            map: MapViewer::new(language),
            chat: ChatPanel::new(&config.chat, language),
            library: KnowledgeBase::new(&config.library, &config.upload, language),
        }
    }

    pub fn language(&self) -> Language {
        self.language
    }

    /// Change language everywhere. The chat transcript restarts.
    pub fn set_language(&mut self, language: Language) {
        if language == self.language {
            return;
        }
        self.language = language;
        self.upload.set_language(language);
        self.map.set_language(language);
        self.chat.set_language(language);
        self.library.set_language(language);
    }

    pub fn toggle_language(&mut self) {
        self.set_language(self.language.toggled());
    }

    pub fn active_document(&self) -> Option<&str> {
        self.active_document.as_deref()
    }

    /// Make `document_id` active. When it differs from the current one, the
    /// map is cleared and any reply still pending for the old document is
    /// dropped.
    pub fn set_active_document(&mut self, document_id: impl Into<String>) {
        let id = document_id.into();
        if self.active_document.as_deref() != Some(id.as_str()) {
            self.map.invalidate();
        }
        self.chat.set_document(id.clone());
        self.active_document = Some(id);
    }

    pub fn route(&self) -> Route {
        self.route
    }

    pub fn navigate(&mut self, path: &str) -> Resolution {
        let resolution = resolve(path);
        self.route = resolution.route();
        resolution
    }

    /// Submit the upload widget's selection. On success the new document
    /// becomes active.
    pub async fn upload(&mut self, backend: &dyn Backend) -> Result<UploadedDocument, UploadError> {
        let doc = self.upload.submit(backend).await?;
        self.set_active_document(doc.id.clone());
        Ok(doc)
    }

    /// Load the knowledge map for the active document. Without one, the
    /// viewer stays as it is and nothing is fetched.
    pub async fn load_map(&mut self, backend: &dyn Backend) -> &MapState {
        let id = self.active_document.clone().unwrap_or_default();
        self.map.load(backend, &id).await
    }

    /// Fetch provider state and the document listing.
    pub async fn refresh(&mut self, backend: &dyn Backend) {
        self.provider.refresh(backend).await;
        self.library.load(backend).await;
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::client::FileUpload;
    use crate::models::{AskResponse, KnowledgeMapResponse, NodeRecord};
    use crate::testing::FakeBackend;

    #[tokio::test]
    async fn test_upload_retargets_map_and_chat() {
        let backend = FakeBackend::new();
        let mut session = Session::new(&Config::minimal());

        session
            .upload
            .select(FileUpload::new("必修一.pdf", vec![1, 2, 3]))
            .unwrap();
        let doc = session.upload(&backend).await.unwrap();
        assert_eq!(doc.id, "doc-42");
        assert_eq!(session.active_document(), Some("doc-42"));
        assert_eq!(session.chat.document_id(), Some("doc-42"));

        session.load_map(&backend).await;
        assert_eq!(
            backend.calls(),
            vec![
                "POST /documents/upload 必修一.pdf",
                "GET /knowledge/map?document_id=doc-42",
            ]
        );
    }

    #[tokio::test]
    async fn test_map_load_for_old_document_is_discarded() {
        let mut session = Session::new(&Config::minimal());
        session.set_active_document("doc-1");
        let ticket = session.map.begin_load("doc-1").unwrap();

        session.set_active_document("doc-2");
        let applied = session.map.finish_load(
            &ticket,
            Ok(KnowledgeMapResponse {
                nodes: vec![NodeRecord {
                    id: "c1".into(),
                    label: Some("第一章".into()),
                    kind: "chapter".into(),
                }],
                edges: vec![],
            }),
        );
        assert!(!applied);
        assert_eq!(session.map.state(), &MapState::Idle);
        assert!(session.map.elements().is_empty());
    }

    #[tokio::test]
    async fn test_upload_clears_previous_map() {
        let backend = FakeBackend::new();
        backend.set_map(Ok(KnowledgeMapResponse {
            nodes: vec![NodeRecord {
                id: "c1".into(),
                label: Some("第一章".into()),
                kind: "chapter".into(),
            }],
            edges: vec![],
        }));
        let mut session = Session::new(&Config::minimal());
        session.set_active_document("doc-1");
        assert_eq!(session.load_map(&backend).await, &MapState::Ready);

        session.upload.select(FileUpload::new("a.pdf", vec![1])).unwrap();
        session.upload(&backend).await.unwrap();
        assert_eq!(session.active_document(), Some("doc-42"));
        assert_eq!(session.map.state(), &MapState::Idle);
        assert!(session.map.map().nodes.is_empty());
        assert_eq!(session.map.document_id(), None);
    }

    #[test]
    fn test_chat_reply_for_old_document_is_dropped() {
        let mut session = Session::new(&Config::minimal());
        session.set_active_document("doc-1");
        session.chat.set_input("什么是集合？");
        let pending = session.chat.submit().unwrap();

        session.set_active_document("doc-2");
        let late = AskResponse {
            answer: "late".into(),
            provider: Some("deepseek".into()),
            sources: Vec::new(),
            related_topics: Vec::new(),
        };
        assert!(!session.chat.complete(&pending, Ok(late)));
        assert!(!session.chat.is_awaiting());
        assert_eq!(session.chat.document_id(), Some("doc-2"));
    }

    #[test]
    fn test_reselecting_same_document_keeps_map() {
        let mut session = Session::new(&Config::minimal());
        session.set_active_document("doc-1");
        let ticket = session.map.begin_load("doc-1").unwrap();
        session.set_active_document("doc-1");
        assert!(session.map.finish_load(
            &ticket,
            Ok(KnowledgeMapResponse {
                nodes: vec![],
                edges: vec![],
            }),
        ));
        assert_eq!(session.map.state(), &MapState::Ready);
    }

    #[tokio::test]
    async fn test_failed_upload_keeps_active_document() {
        let backend = FakeBackend::new();
        backend.set_upload(Err((500, None)));
        let mut session = Session::new(&Config::minimal());
        session.set_active_document("doc-1");

        session.upload.select(FileUpload::new("a.pdf", vec![1])).unwrap();
        assert!(session.upload(&backend).await.is_err());
        assert_eq!(session.active_document(), Some("doc-1"));
    }

    #[tokio::test]
    async fn test_map_without_active_document_does_not_fetch() {
        let backend = FakeBackend::new();
        let mut session = Session::new(&Config::minimal());
        assert_eq!(session.load_map(&backend).await, &MapState::Idle);
        assert!(backend.calls().is_empty());
    }

    #[test]
    fn test_language_propagates() {
        let mut session = Session::new(&Config::minimal());
        assert_eq!(session.language(), Language::Cn);

        session.toggle_language();
        assert_eq!(session.language(), Language::En);
        assert_eq!(session.chat.language(), Language::En);
        assert!(session.chat.last().unwrap().content.starts_with("Hello"));
    }

    #[test]
    fn test_navigation() {
        let mut session = Session::new(&Config::minimal());
        session.navigate("/knowledge-base");
        assert_eq!(session.route(), Route::KnowledgeBase);
        assert_eq!(session.navigate("/nope"), Resolution::Redirect(Route::Chat));
        assert_eq!(session.route(), Route::Chat);
    }
}
