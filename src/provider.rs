//! Provider selector: which LLM backend answers questions.

use anyhow::Result;
use tracing::warn;

use crate::client::Backend;
use crate::i18n::Language;

/// Display name for a provider id. Unknown ids are shown verbatim.
pub fn provider_label(id: &str) -> &str {
    match id {
        "deepseek" => "DeepSeek",
        "minimax" => "MiniMax",
        other => other,
    }
}

/// Outcome of [`ProviderSelector::switch`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SwitchOutcome {
    /// Requested provider was already current; nothing was sent.
    Unchanged,
    /// Backend confirmed; holds the provider it reports as current.
    Switched(String),
}

/// Mirror of the backend's provider state.
#[derive(Debug, Clone)]
pub struct ProviderSelector {
    current: String,
    available: Vec<String>,
    busy: bool,
    error: Option<String>,
    language: Language,
}

impl ProviderSelector {
    pub fn new(language: Language) -> Self {
        Self {
            current: "deepseek".to_string(),
            available: vec!["deepseek".to_string(), "minimax".to_string()],
            busy: false,
            error: None,
            language,
        }
    }

    pub fn current(&self) -> &str {
        &self.current
    }

    pub fn available(&self) -> &[String] {
        &self.available
    }

    pub fn is_busy(&self) -> bool {
        self.busy
    }

    pub fn error(&self) -> Option<&str> {
        self.error.as_deref()
    }

    /// Fetch current and selectable providers. On failure the previous
    /// state is kept and the error is only logged.
    pub async fn refresh(&mut self, backend: &dyn Backend) {
        match backend.get_provider().await {
            Ok(info) => {
                self.current = info.provider;
                if !info.available_providers.is_empty() {
                    self.available = info.available_providers;
                }
            }
            Err(e) => warn!(error = %e, "failed to fetch provider"),
        }
    }

    /// Switch to `target`. The backend's reply, not `target`, becomes current.
    ///
    /// On failure the current provider is unchanged, `error()` holds the
    /// backend detail or the localized fallback, and the same text is
    /// returned as the error.
    pub async fn switch(
        &mut self,
        backend: &dyn Backend,
        target: &str,
    ) -> Result<SwitchOutcome, String> {
        if target == self.current {
            return Ok(SwitchOutcome::Unchanged);
        }

        self.busy = true;
        self.error = None;
        let result = backend.switch_provider(target).await;
        self.busy = false;

        match result {
            Ok(resp) => {
                self.current = resp.provider.clone();
                Ok(SwitchOutcome::Switched(resp.provider))
            }
            Err(e) => {
                let msg = e.user_message(self.language.strings().switch_failed);
                self.error = Some(msg.clone());
                Err(msg)
            }
        }
    }
}

/// CLI entry point for `studyflow provider show`.
pub async fn run_show(backend: &dyn Backend, language: Language) -> Result<()> {
    let mut selector = ProviderSelector::new(language);
    selector.refresh(backend).await;

    println!("{:<12} {:<12} CURRENT", "PROVIDER", "LABEL");
    for p in selector.available() {
        let mark = if p == selector.current() { "*" } else { "" };
        println!("{:<12} {:<12} {}", p, provider_label(p), mark);
    }
    Ok(())
}

/// CLI entry point for `studyflow provider switch <name>`.
pub async fn run_switch(backend: &dyn Backend, language: Language, target: &str) -> Result<()> {
    let mut selector = ProviderSelector::new(language);
    selector.refresh(backend).await;

    match selector.switch(backend, target).await {
        Ok(SwitchOutcome::Unchanged) => {
            println!("Already using {}.", provider_label(selector.current()));
            Ok(())
        }
        Ok(SwitchOutcome::Switched(p)) => {
            println!("Switched to {}.", provider_label(&p));
            Ok(())
        }
        Err(msg) => anyhow::bail!(msg),
    }
}
