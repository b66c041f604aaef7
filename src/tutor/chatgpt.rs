use std::time::Duration;

use async_trait::async_trait;
use chatgpt::client::ChatGPT;
use chatgpt::config::{ChatGPTEngine, ModelConfiguration};
use chatgpt::types::CompletionResponse;

use super::{CompletionBackend, CompletionError};

/// OpenAI chat completions through `chatgpt_rs`.
pub struct ChatGptBackend {
    chat_gpt: Option<ChatGPT>,
}

impl ChatGptBackend {
    pub fn new(api_key: Option<String>, timeout: Duration) -> Result<Self, chatgpt::err::Error> {
        let chat_gpt = match api_key.filter(|k| !k.trim().is_empty()) {
            Some(key) => {
                // The timeout is baked into the HTTP client, so it has to be
                // part of the initial configuration.
                let config = ModelConfiguration {
                    engine: ChatGPTEngine::Gpt35Turbo,
                    timeout,
                    ..Default::default()
                };
                Some(ChatGPT::new_with_config(key, config)?)
            }
            None => None,
        };
        Ok(Self { chat_gpt })
    }
}

#[async_trait]
impl CompletionBackend for ChatGptBackend {
    fn name(&self) -> &'static str {
        "chatgpt"
    }

    async fn complete(&self, prompt: &str) -> Result<String, CompletionError> {
        let chat_gpt = self
            .chat_gpt
            .as_ref()
            .ok_or(CompletionError::MissingCredential)?;

        let response: CompletionResponse = chat_gpt
            .send_message(prompt)
            .await
            .map_err(classify_error)?;
        let content = response.message().clone().content;

        Ok(content)
    }
}

fn classify_error(err: chatgpt::err::Error) -> CompletionError {
    match err {
        chatgpt::err::Error::BackendError {
            message,
            error_type,
        } => classify_backend_error(&error_type, message),
        other => CompletionError::Network(other.to_string()),
    }
}

fn classify_backend_error(error_type: &str, message: String) -> CompletionError {
    match error_type {
        "insufficient_quota" | "rate_limit_exceeded" | "requests" | "tokens" => {
            CompletionError::QuotaExceeded(message)
        }
        "invalid_api_key" | "authentication_error" => CompletionError::MissingCredential,
        _ if message.contains("content management policy") || message.contains("safety") => {
            CompletionError::Blocked(message)
        }
        _ => CompletionError::Backend(format!("{}: {}", error_type, message)),
    }
}
