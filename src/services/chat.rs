use async_trait::async_trait;
use thiserror::Error;

use crate::domain::Language;

/// Every assistant failure is shown to the user the same way.
#[derive(Debug, Clone, Error, PartialEq)]
#[error("Failed to get an answer from the assistant")]
pub struct ChatError;

#[async_trait]
pub trait ChatService: Send + Sync {
    async fn ask(&self, question: &str, language: Language) -> Result<String, ChatError>;
}

/// Rejects blank questions before they reach the service.
pub async fn ask_assistant(
    service: &dyn ChatService,
    question: &str,
    language: Language,
) -> Result<String, ChatError> {
    let question = question.trim();
    if question.is_empty() {
        return Err(ChatError);
    }
    tracing::debug!(language = language.code(), "Asking assistant");
    service.ask(question, language).await
}
