//! Q&A chat panel.
//!
//! A linear transcript bound to one document. Asking is split in two so the
//! caller owns the network call:
//!
//! 1. [`ChatPanel::submit`] validates input, appends the user message and
//!    returns a [`PendingQuestion`].
//! 2. [`ChatPanel::complete`] appends the assistant reply (or an inline
//!    error reply) for that question.
//!
//! [`ChatPanel::send`] does both against a [`Backend`]. Only one question
//! may be pending at a time. Resetting the transcript starts a new epoch,
//! and replies from an older epoch are dropped.

use std::collections::VecDeque;
use std::path::Path;

use anyhow::{Context, Result};
use base64::{engine::general_purpose::STANDARD, Engine as _};
use tokio::io::{AsyncBufReadExt, BufReader};
use tracing::{debug, warn};

use crate::client::{Backend, FileUpload};
use crate::config::ChatConfig;
use crate::error::{ApiError, ValidationError};
use crate::i18n::Language;
use crate::models::{AskRequest, AskResponse, Message};

/// A question that has been appended to the transcript and awaits a reply.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PendingQuestion {
    pub question: String,
    pub document_id: String,
    pub top_k: u32,
    epoch: u64,
}

impl PendingQuestion {
    pub fn request(&self) -> AskRequest<'_> {
        AskRequest {
            question: &self.question,
            document_id: &self.document_id,
            top_k: Some(self.top_k),
        }
    }
}

/// An image attached to the next question.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Attachment {
    pub file_name: String,
    /// `data:{mime};base64,...`
    pub data_url: String,
}

#[derive(Debug, Clone)]
pub struct ChatPanel {
    language: Language,
    document_id: Option<String>,
    top_k: u32,
    max_messages: usize,
    messages: VecDeque<Message>,
    input: String,
    attachment: Option<Attachment>,
    awaiting: bool,
    epoch: u64,
}

impl ChatPanel {
    pub fn new(config: &ChatConfig, language: Language) -> Self {
        let mut panel = Self {
            language,
            document_id: None,
            top_k: config.top_k,
            max_messages: config.max_messages.max(1),
            messages: VecDeque::new(),
            input: String::new(),
            attachment: None,
            awaiting: false,
            epoch: 0,
        };
        panel.reset();
        panel
    }

    pub fn language(&self) -> Language {
        self.language
    }

    pub fn messages(&self) -> impl Iterator<Item = &Message> {
        self.messages.iter()
    }

    pub fn len(&self) -> usize {
        self.messages.len()
    }

    pub fn is_empty(&self) -> bool {
        self.messages.is_empty()
    }

    pub fn last(&self) -> Option<&Message> {
        self.messages.back()
    }

    pub fn is_awaiting(&self) -> bool {
        self.awaiting
    }

    pub fn input(&self) -> &str {
        &self.input
    }

    pub fn set_input(&mut self, text: impl Into<String>) {
        self.input = text.into();
    }

    pub fn attachment(&self) -> Option<&Attachment> {
        self.attachment.as_ref()
    }

    pub fn document_id(&self) -> Option<&str> {
        self.document_id.as_deref()
    }

    /// Bind the panel to a document. Changing the id abandons any pending
    /// reply; the transcript is kept.
    pub fn set_document(&mut self, document_id: impl Into<String>) {
        let id = document_id.into();
        if self.document_id.as_deref() == Some(id.as_str()) {
            return;
        }
        self.epoch += 1;
        self.awaiting = false;
        self.document_id = Some(id);
    }

    /// Switch language. The transcript restarts with the new greeting.
    pub fn set_language(&mut self, language: Language) {
        self.language = language;
        self.reset();
    }

    /// Clear the transcript back to the greeting. Any pending reply is
    /// abandoned.
    pub fn reset(&mut self) {
        self.epoch += 1;
        self.awaiting = false;
        self.messages.clear();
        self.messages
            .push_back(Message::assistant(self.language.strings().greeting, None));
    }

    /// Attach an in-memory image. Non-image types are rejected.
    pub fn attach(&mut self, file: &FileUpload) -> Result<(), ValidationError> {
        if !file.mime.starts_with("image/") {
            return Err(ValidationError::NotAnImage(file.file_name.clone()));
        }
        self.attachment = Some(Attachment {
            file_name: file.file_name.clone(),
            data_url: format!("data:{};base64,{}", file.mime, STANDARD.encode(&file.bytes)),
        });
        Ok(())
    }

    /// Read an image from disk and attach it.
    pub fn attach_image(&mut self, path: &Path) -> Result<()> {
        let file = read_image(path)?;
        self.attach(&file)?;
        Ok(())
    }

    pub fn clear_attachment(&mut self) {
        self.attachment = None;
    }

    /// Append the user message for the current input and return the
    /// question to send.
    ///
    /// Rejected, with nothing appended, when input is blank and nothing is
    /// attached, when a reply is still pending, or when no document is set.
    pub fn submit(&mut self) -> Result<PendingQuestion, ValidationError> {
        if self.input.trim().is_empty() && self.attachment.is_none() {
            return Err(ValidationError::EmptyQuestion);
        }
        if self.awaiting {
            return Err(ValidationError::ChatBusy);
        }
        let document_id = self
            .document_id
            .clone()
            .ok_or(ValidationError::NoDocument)?;

        let question = std::mem::take(&mut self.input);
        let image = self.attachment.take().map(|a| a.data_url);
        self.push(Message::user(question.clone(), image));
        self.awaiting = true;

        Ok(PendingQuestion {
            question,
            document_id,
            top_k: self.top_k,
            epoch: self.epoch,
        })
    }

    /// Append the reply for `pending`. Returns `false` if the question
    /// belongs to an earlier epoch and the reply was dropped.
    pub fn complete(
        &mut self,
        pending: &PendingQuestion,
        result: Result<AskResponse, ApiError>,
    ) -> bool {
        if pending.epoch != self.epoch {
            debug!(document_id = %pending.document_id, "discarding stale answer");
            return false;
        }
        self.awaiting = false;

        let s = self.language.strings();
        let reply = match result {
            Ok(resp) => {
                let content = if resp.answer.is_empty() {
                    s.no_answer.to_string()
                } else {
                    resp.answer
                };
                Message::assistant(content, Some(s.answer_source(resp.provider.as_deref())))
            }
            Err(e) => {
                warn!(error = %e, document_id = %pending.document_id, "question failed");
                let detail = e.user_message(s.service_unavailable);
                Message::assistant(s.answer_error(&detail), Some(s.error_source.to_string()))
            }
        };
        self.push(reply);
        true
    }

    /// Submit the current input and wait for the backend's answer.
    pub async fn send(&mut self, backend: &dyn Backend) -> Result<&Message, ValidationError> {
        let pending = self.submit()?;
        let result = backend.ask(&pending.request()).await;
        self.complete(&pending, result);
        // complete() always appends for the current epoch.
        self.messages.back().ok_or(ValidationError::EmptyQuestion)
    }

    fn push(&mut self, message: Message) {
        self.messages.push_back(message);
        while self.messages.len() > self.max_messages {
            self.messages.pop_front();
        }
    }
}

/// Read a file and require an `image/*` content type.
pub fn read_image(path: &Path) -> Result<FileUpload> {
    let bytes = std::fs::read(path).with_context(|| format!("reading {}", path.display()))?;
    let file_name = path
        .file_name()
        .and_then(|n| n.to_str())
        .unwrap_or("image")
        .to_string();
    let file = FileUpload::new(file_name, bytes);
    if !file.mime.starts_with("image/") {
        return Err(ValidationError::NotAnImage(file.file_name).into());
    }
    Ok(file)
}

/// Run OCR on an image. Returns the recognized text or the user-facing
/// failure message.
pub async fn recognize(
    backend: &dyn Backend,
    language: Language,
    file: FileUpload,
) -> Result<String, String> {
    let s = language.strings();
    if !file.mime.starts_with("image/") {
        return Err(s.unsupported_image_type.to_string());
    }
    match backend.ocr_image(file).await {
        Ok(resp) => Ok(resp.text),
        Err(e) => {
            warn!(error = %e, "ocr failed");
            Err(e.user_message(s.ocr_failed))
        }
    }
}

fn print_reply(message: &Message) {
    println!("{}", message.content);
    if let Some(source) = &message.source {
        println!("  [{}]", source);
    }
}

/// CLI entry point for `studyflow ask`.
pub async fn run_ask(
    backend: &dyn Backend,
    config: &ChatConfig,
    language: Language,
    document_id: &str,
    question: &str,
    image: Option<&Path>,
) -> Result<()> {
    let mut panel = ChatPanel::new(config, language);
    panel.set_document(document_id);
    if let Some(path) = image {
        panel.attach_image(path)?;
    }
    panel.set_input(question);
    let reply = panel.send(backend).await?;
    print_reply(reply);
    Ok(())
}

/// CLI entry point for `studyflow chat`: one question per stdin line.
///
/// `/image PATH` attaches an image to the next question, `/clear` resets the
/// transcript, `/quit` exits.
pub async fn run_chat(
    backend: &dyn Backend,
    config: &ChatConfig,
    language: Language,
    document_id: &str,
) -> Result<()> {
    let mut panel = ChatPanel::new(config, language);
    panel.set_document(document_id);
    let interactive = atty::is(atty::Stream::Stdin);

    if interactive {
        if let Some(greeting) = panel.last() {
            print_reply(greeting);
        }
        eprintln!("{}", language.strings().chat_placeholder);
        eprint!("> ");
    }

    let mut lines = BufReader::new(tokio::io::stdin()).lines();
    while let Some(line) = lines.next_line().await? {
        let line = line.trim();
        match line.split_once(' ').unwrap_or((line, "")) {
            ("/quit", _) | ("/exit", _) => break,
            ("/clear", _) => panel.reset(),
            ("/image", path) => match panel.attach_image(Path::new(path.trim())) {
                Ok(()) => eprintln!("attached {}", path.trim()),
                Err(e) => eprintln!("{:#}", e),
            },
            _ => {
                panel.set_input(line);
                if interactive && !line.is_empty() {
                    eprintln!("{}", language.strings().thinking);
                }
                match panel.send(backend).await {
                    Ok(reply) => print_reply(reply),
                    Err(ValidationError::EmptyQuestion) => {}
                    Err(e) => eprintln!("{}", e),
                }
            }
        }
        if interactive {
            eprint!("> ");
        }
    }
    Ok(())
}

/// CLI entry point for `studyflow ocr <image>`.
pub async fn run_ocr(backend: &dyn Backend, language: Language, path: &Path) -> Result<()> {
    let file = read_image(path)?;
    match recognize(backend, language, file).await {
        Ok(text) => {
            println!("{}", text);
            Ok(())
        }
        Err(msg) => anyhow::bail!(msg),
    }
}
